//! Document Gateway Port (Driven Port)
//!
//! The capabilities the cart store needs from a document store: a readiness
//! check, upsert-by-filter, delete-by-filter and a filtered scan.

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;

use crate::domain::cart::{Collection, Document, Filter, GatewayError};

/// Port for a document store client.
///
/// Implementations must make a single `upsert` atomic with respect to its
/// filter match: two concurrent upserts with the same filter leave exactly
/// one document behind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentGatewayPort: Send + Sync {
    /// Whether the gateway holds a live, pinged connection. Performs no I/O.
    fn is_connected(&self) -> bool;

    /// Round-trip readiness check against the store.
    async fn ping(&self) -> Result<(), GatewayError>;

    /// Replace the document matching `filter` with `document`, inserting it
    /// when nothing matches.
    async fn upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        document: Document,
    ) -> Result<(), GatewayError>;

    /// Delete the document matching `filter`. Returns how many were removed.
    async fn delete_one(&self, collection: Collection, filter: &Filter)
    -> Result<u64, GatewayError>;

    /// Open a cursor over every document matching `filter`.
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Box<dyn DocumentCursor>, GatewayError>;
}

/// Sequential reader over the result of [`DocumentGatewayPort::find_many`].
///
/// Callers close the cursor when done; dropping an unclosed cursor also
/// releases it.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Next document, or `None` once the scan is exhausted.
    async fn next(&mut self) -> Result<Option<Document>, GatewayError>;

    /// Release the cursor. Further `next` calls return `None`.
    async fn close(&mut self);
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Cursor over documents already fetched from the store.
///
/// Entries that failed to decode are kept in place and surface as errors
/// when the scan reaches them.
pub struct VecCursor {
    pending: VecDeque<Result<Document, GatewayError>>,
    on_release: Option<ReleaseHook>,
}

impl VecCursor {
    /// Cursor over `entries` in order.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = Result<Document, GatewayError>>) -> Self {
        Self {
            pending: entries.into_iter().collect(),
            on_release: None,
        }
    }

    /// Run `hook` exactly once when the cursor is closed or dropped.
    #[must_use]
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    fn release(&mut self) {
        self.pending.clear();
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl fmt::Debug for VecCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecCursor")
            .field("pending", &self.pending.len())
            .field("released", &self.on_release.is_none())
            .finish()
    }
}

#[async_trait]
impl DocumentCursor for VecCursor {
    async fn next(&mut self) -> Result<Option<Document>, GatewayError> {
        self.pending.pop_front().transpose()
    }

    async fn close(&mut self) {
        self.release();
    }
}

impl Drop for VecCursor {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(product: &str) -> Document {
        let mut doc = Document::new();
        doc.insert("product_id".to_string(), product.into());
        doc
    }

    #[tokio::test]
    async fn yields_in_order_then_none() {
        let mut cursor = VecCursor::new([Ok(doc("a")), Ok(doc("b"))]);
        assert_eq!(cursor.next().await.unwrap(), Some(doc("a")));
        assert_eq!(cursor.next().await.unwrap(), Some(doc("b")));
        assert_eq!(cursor.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn surfaces_deferred_error() {
        let mut cursor = VecCursor::new([
            Ok(doc("a")),
            Err(GatewayError::Decode("bad".to_string())),
        ]);
        assert!(cursor.next().await.unwrap().is_some());
        assert_eq!(
            cursor.next().await,
            Err(GatewayError::Decode("bad".to_string()))
        );
    }

    #[tokio::test]
    async fn release_hook_runs_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let mut cursor = VecCursor::new([Ok(doc("a"))])
            .on_release(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        cursor.close().await;
        assert_eq!(cursor.next().await.unwrap(), None);
        drop(cursor);

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_unclosed_cursor() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let cursor = VecCursor::new([Ok(doc("a"))]).on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(cursor);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}

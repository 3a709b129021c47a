//! In-memory document gateway.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{
    Collection, Document, DocumentCursor, DocumentGatewayPort, Filter, GatewayError, VecCursor,
};

/// In-memory implementation of `DocumentGatewayPort`.
///
/// Documents live in insertion order per collection. Each upsert or delete
/// runs under one write lock, so it is atomic with respect to its filter.
/// Suitable for testing and development. Not durable.
#[derive(Debug)]
pub struct InMemoryDocumentGateway {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    connected: AtomicBool,
    open_cursors: Arc<AtomicUsize>,
}

impl Default for InMemoryDocumentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentGateway {
    /// Create an empty, connected gateway.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create an empty gateway that has not connected yet.
    #[must_use]
    pub fn disconnected() -> Self {
        let gateway = Self::new();
        gateway.disconnect();
        gateway
    }

    /// Mark the gateway ready.
    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Drop readiness. Stored documents are kept.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Store `document` verbatim, bypassing filter semantics.
    ///
    /// Simulates a writer that does not go through the cart store.
    pub fn insert_raw(&self, collection: Collection, document: Document) {
        self.collections
            .write()
            .entry(collection)
            .or_default()
            .push(document);
    }

    /// Number of documents stored in `collection`.
    #[must_use]
    pub fn document_count(&self, collection: Collection) -> usize {
        self.collections.read().get(&collection).map_or(0, Vec::len)
    }

    /// Cursors opened by `find_many` and not yet released.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<(), GatewayError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(GatewayError::NotConnected)
        }
    }
}

#[async_trait]
impl DocumentGatewayPort for InMemoryDocumentGateway {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        self.ensure_connected()
    }

    async fn upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        document: Document,
    ) -> Result<(), GatewayError> {
        self.ensure_connected()?;
        let mut collections = self.collections.write();
        let documents = collections.entry(collection).or_default();
        match documents.iter_mut().find(|existing| filter.matches(existing)) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
        Ok(())
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, GatewayError> {
        self.ensure_connected()?;
        let mut collections = self.collections.write();
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        match documents.iter().position(|existing| filter.matches(existing)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Box<dyn DocumentCursor>, GatewayError> {
        self.ensure_connected()?;
        let matching: Vec<Document> = self
            .collections
            .read()
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        let open_cursors = Arc::clone(&self.open_cursors);
        let cursor = VecCursor::new(matching.into_iter().map(Ok)).on_release(move || {
            open_cursors.fetch_sub(1, Ordering::SeqCst);
        });
        Ok(Box::new(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{CartFilter, CartItem, CartKey, UserId};

    fn key_filter(user: &str, product: &str) -> Filter {
        Filter::from(CartFilter::ByKey(CartKey::new(user, product).unwrap()))
    }

    fn doc(user: &str, product: &str, quantity: i64) -> Document {
        CartItem::new(CartKey::new(user, product).unwrap(), quantity.into())
            .to_document()
            .unwrap()
    }

    async fn drain(mut cursor: Box<dyn DocumentCursor>) -> Vec<Document> {
        let mut out = Vec::new();
        while let Some(document) = cursor.next().await.unwrap() {
            out.push(document);
        }
        cursor.close().await;
        out
    }

    #[tokio::test]
    async fn upsert_inserts_then_replaces() {
        let gateway = InMemoryDocumentGateway::new();
        let filter = key_filter("u1", "p1");

        gateway
            .upsert(Collection::Carts, &filter, doc("u1", "p1", 1))
            .await
            .unwrap();
        gateway
            .upsert(Collection::Carts, &filter, doc("u1", "p1", 7))
            .await
            .unwrap();

        assert_eq!(gateway.document_count(Collection::Carts), 1);
        let found = drain(gateway.find_many(Collection::Carts, &filter).await.unwrap()).await;
        assert_eq!(found, vec![doc("u1", "p1", 7)]);
    }

    #[tokio::test]
    async fn delete_one_reports_count() {
        let gateway = InMemoryDocumentGateway::new();
        let filter = key_filter("u1", "p1");
        gateway
            .upsert(Collection::Carts, &filter, doc("u1", "p1", 1))
            .await
            .unwrap();

        assert_eq!(gateway.delete_one(Collection::Carts, &filter).await.unwrap(), 1);
        assert_eq!(gateway.delete_one(Collection::Carts, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let gateway = InMemoryDocumentGateway::new();
        gateway.insert_raw(Collection::Users, doc("u1", "p1", 1));

        let filter = Filter::from(CartFilter::ByUser(UserId::new("u1")));
        let found = drain(gateway.find_many(Collection::Carts, &filter).await.unwrap()).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn cursors_are_tracked_until_released() {
        let gateway = InMemoryDocumentGateway::new();
        let filter = Filter::from(CartFilter::ByUser(UserId::new("u1")));

        let cursor = gateway.find_many(Collection::Carts, &filter).await.unwrap();
        assert_eq!(gateway.open_cursors(), 1);
        drop(cursor);
        assert_eq!(gateway.open_cursors(), 0);
    }

    #[tokio::test]
    async fn disconnected_gateway_refuses_calls() {
        let gateway = InMemoryDocumentGateway::disconnected();
        assert!(!gateway.is_connected());
        assert_eq!(gateway.ping().await, Err(GatewayError::NotConnected));

        gateway.connect();
        assert!(gateway.ping().await.is_ok());
    }
}

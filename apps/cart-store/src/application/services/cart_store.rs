//! Cart Store Service
//!
//! Applies per-call cart mutations and builds the aggregated cart view,
//! purely through [`DocumentGatewayPort`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::context::OperationContext;
use crate::application::ports::{DocumentCursor, DocumentGatewayPort};
use crate::domain::cart::{
    CartContents, CartError, CartFilter, CartItem, CartKey, Collection, Filter, ProductId,
    Quantity, QuantityDecision, QuantityPolicy, UserId,
};

/// Behavior knobs for the cart store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartPolicy {
    /// Treatment of zero and negative quantities.
    pub quantity_policy: QuantityPolicy,
    /// Deadline applied when the caller's context has none.
    pub operation_timeout: Option<Duration>,
}

/// Per-user shopping cart over a document store.
///
/// Holds no state between calls besides the injected gateway; share it
/// behind an `Arc` across tasks.
pub struct CartStore<G>
where
    G: DocumentGatewayPort + ?Sized,
{
    gateway: Arc<G>,
    policy: CartPolicy,
}

impl<G> CartStore<G>
where
    G: DocumentGatewayPort + ?Sized,
{
    /// Create a cart store with the default policy.
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_policy(gateway, CartPolicy::default())
    }

    /// Create a cart store with an explicit policy.
    pub const fn with_policy(gateway: Arc<G>, policy: CartPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Active policy.
    pub const fn policy(&self) -> &CartPolicy {
        &self.policy
    }

    /// Underlying gateway.
    pub const fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Add a line item, or replace the quantity of an existing one.
    ///
    /// The stored document for `(user_id, product_id)` is overwritten as a
    /// whole; quantities are never summed.
    pub async fn add_item(
        &self,
        ctx: &OperationContext,
        user_id: impl Into<UserId>,
        product_id: impl Into<ProductId>,
        quantity: i64,
    ) -> Result<(), CartError> {
        self.ensure_connected()?;
        let key = CartKey::new(user_id, product_id)?;
        let quantity = Quantity::new(quantity);

        match self.policy.quantity_policy.evaluate(quantity) {
            QuantityDecision::Store => {}
            QuantityDecision::Reject => {
                warn!(
                    user_id = %key.user_id(),
                    product_id = %key.product_id(),
                    quantity = quantity.value(),
                    "Rejected non-positive cart quantity"
                );
                return Err(CartError::InvalidQuantity {
                    quantity: quantity.value(),
                });
            }
            QuantityDecision::Remove => {
                debug!(
                    user_id = %key.user_id(),
                    product_id = %key.product_id(),
                    quantity = quantity.value(),
                    "Non-positive quantity, removing cart item"
                );
                return self.delete_key(ctx, &key).await;
            }
        }

        let document = CartItem::new(key.clone(), quantity).to_document()?;
        let filter = Filter::from(CartFilter::ByKey(key.clone()));

        self.run(ctx, async {
            self.gateway
                .upsert(Collection::Carts, &filter, document)
                .await
                .map_err(CartError::from)
        })
        .await?;

        debug!(
            user_id = %key.user_id(),
            product_id = %key.product_id(),
            quantity = quantity.value(),
            "Cart item upserted"
        );
        Ok(())
    }

    /// Remove a line item. Removing an absent item succeeds.
    pub async fn remove_item(
        &self,
        ctx: &OperationContext,
        user_id: impl Into<UserId>,
        product_id: impl Into<ProductId>,
    ) -> Result<(), CartError> {
        self.ensure_connected()?;
        let key = CartKey::new(user_id, product_id)?;
        self.delete_key(ctx, &key).await
    }

    /// All line items of `user_id` as a product → quantity view.
    ///
    /// Fails as a whole on any read or decode error; nothing partial is
    /// returned.
    pub async fn list_items(
        &self,
        ctx: &OperationContext,
        user_id: impl Into<UserId>,
    ) -> Result<CartContents, CartError> {
        self.ensure_connected()?;
        let user_id = user_id.into();
        if user_id.is_blank() {
            return Err(CartError::InvalidKey { field: "user_id" });
        }

        let filter = Filter::from(CartFilter::ByUser(user_id.clone()));
        let contents = self.run(ctx, self.scan(&filter)).await?;

        debug!(user_id = %user_id, items = contents.len(), "Cart listed");
        Ok(contents)
    }

    fn ensure_connected(&self) -> Result<(), CartError> {
        if self.gateway.is_connected() {
            Ok(())
        } else {
            Err(CartError::NotConnected)
        }
    }

    async fn delete_key(&self, ctx: &OperationContext, key: &CartKey) -> Result<(), CartError> {
        let filter = Filter::from(CartFilter::ByKey(key.clone()));

        let removed = self
            .run(ctx, async {
                self.gateway
                    .delete_one(Collection::Carts, &filter)
                    .await
                    .map_err(CartError::from)
            })
            .await?;

        debug!(
            user_id = %key.user_id(),
            product_id = %key.product_id(),
            removed,
            "Cart item removed"
        );
        Ok(())
    }

    async fn scan(&self, filter: &Filter) -> Result<CartContents, CartError> {
        let mut cursor = self.gateway.find_many(Collection::Carts, filter).await?;
        let scanned = collect_contents(cursor.as_mut()).await;
        cursor.close().await;
        scanned
    }

    /// Race `operation` against the context's cancellation and deadline.
    async fn run<T, F>(&self, ctx: &OperationContext, operation: F) -> Result<T, CartError>
    where
        F: Future<Output = Result<T, CartError>>,
    {
        if ctx.is_cancelled() {
            return Err(CartError::Cancelled);
        }

        let deadline = ctx
            .deadline()
            .or_else(|| self.policy.operation_timeout.map(|t| Instant::now() + t));

        let bounded = async move {
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, operation)
                    .await
                    .map_err(|_| CartError::DeadlineExceeded)?,
                None => operation.await,
            }
        };

        tokio::select! {
            biased;
            () = ctx.cancel_token().cancelled() => Err(CartError::Cancelled),
            result = bounded => result,
        }
    }
}

async fn collect_contents(cursor: &mut dyn DocumentCursor) -> Result<CartContents, CartError> {
    let mut contents = CartContents::new();
    while let Some(document) = cursor.next().await? {
        let item = CartItem::from_document(document)?;
        if let Err(err) = contents.insert(item) {
            warn!(error = %err, "Cart scan found more than one document per cart key");
            return Err(err);
        }
    }
    Ok(contents)
}

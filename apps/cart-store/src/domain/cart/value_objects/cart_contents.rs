//! Aggregated view of a user's cart.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::cart_item::CartItem;
use super::identifiers::ProductId;
use super::quantity::Quantity;
use crate::domain::cart::errors::CartError;

/// Product → quantity mapping for one user. Unordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartContents {
    items: HashMap<ProductId, Quantity>,
}

impl CartContents {
    /// Empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decoded line item.
    ///
    /// A second item for the same product is rejected: the stored
    /// collection holds at most one document per cart key, so a repeat means
    /// the store was written outside the cart store.
    pub fn insert(&mut self, item: CartItem) -> Result<(), CartError> {
        match self.items.entry(item.product_id) {
            Entry::Occupied(entry) => Err(CartError::DuplicateItem {
                user_id: item.user_id.into_inner(),
                product_id: entry.key().as_str().to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(item.quantity);
                Ok(())
            }
        }
    }

    /// Quantity stored for `product_id`.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<Quantity> {
        self.items.get(product_id).copied()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the cart holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate `(product, quantity)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, Quantity)> {
        self.items.iter().map(|(product, quantity)| (product, *quantity))
    }

    /// Plain `product_id → quantity` map.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, i64> {
        self.items
            .into_iter()
            .map(|(product, quantity)| (product.into_inner(), quantity.value()))
            .collect()
    }
}

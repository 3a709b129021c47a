//! Cart line items and their key.

use serde::{Deserialize, Serialize};

use super::identifiers::{ProductId, UserId};
use super::quantity::Quantity;
use crate::domain::cart::document::Document;
use crate::domain::cart::errors::{CartError, GatewayError};

/// Identity of a line item: one product in one user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    user_id: UserId,
    product_id: ProductId,
}

impl CartKey {
    /// Build a key, rejecting blank identifiers.
    pub fn new(
        user_id: impl Into<UserId>,
        product_id: impl Into<ProductId>,
    ) -> Result<Self, CartError> {
        let user_id = user_id.into();
        let product_id = product_id.into();
        if user_id.is_blank() {
            return Err(CartError::InvalidKey { field: "user_id" });
        }
        if product_id.is_blank() {
            return Err(CartError::InvalidKey {
                field: "product_id",
            });
        }
        Ok(Self {
            user_id,
            product_id,
        })
    }

    /// Cart owner.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Product.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }
}

/// A persisted cart line item.
///
/// Serialized field names must stay in sync with
/// [`CartField`](crate::domain::cart::CartField).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart owner.
    pub user_id: UserId,
    /// Product.
    pub product_id: ProductId,
    /// Units of the product.
    pub quantity: Quantity,
}

impl CartItem {
    /// Create a line item for `key`.
    #[must_use]
    pub fn new(key: CartKey, quantity: Quantity) -> Self {
        Self {
            user_id: key.user_id,
            product_id: key.product_id,
            quantity,
        }
    }

    /// Encode as a stored document.
    pub fn to_document(&self) -> Result<Document, GatewayError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(GatewayError::Serialization(format!(
                "cart item encoded as non-object: {other}"
            ))),
        }
    }

    /// Decode a stored document.
    pub fn from_document(document: Document) -> Result<Self, GatewayError> {
        serde_json::from_value(serde_json::Value::Object(document))
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

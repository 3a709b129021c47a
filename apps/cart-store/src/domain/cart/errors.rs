//! Cart errors.

use thiserror::Error;

/// Failure reported by a document gateway.
///
/// The cart store never recovers from these; they reach the caller wrapped
/// in [`CartError::OperationFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Opening or pinging the store failed.
    #[error("Document store connection error: {0}")]
    Connection(String),

    /// A statement or query failed.
    #[error("Document store query error: {0}")]
    Query(String),

    /// A document could not be encoded.
    #[error("Document serialization error: {0}")]
    Serialization(String),

    /// A stored document could not be decoded.
    #[error("Document decode error: {0}")]
    Decode(String),

    /// The gateway has no live connection.
    #[error("Document store is not connected")]
    NotConnected,
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors returned by cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The gateway was not connected when the operation was invoked.
    #[error("Cart store is not connected to the document store")]
    NotConnected,

    /// The gateway failed while the operation was in flight.
    #[error("Cart operation failed: {0}")]
    OperationFailed(#[from] GatewayError),

    /// A cart key component was empty.
    #[error("Invalid cart key: {field} must not be empty")]
    InvalidKey {
        /// Name of the empty field.
        field: &'static str,
    },

    /// The quantity policy rejected the quantity.
    #[error("Invalid quantity {quantity}: must be positive")]
    InvalidQuantity {
        /// Rejected quantity.
        quantity: i64,
    },

    /// More than one stored document was found for the same cart key.
    #[error("Duplicate cart item for user {user_id}, product {product_id}")]
    DuplicateItem {
        /// Cart owner.
        user_id: String,
        /// Product that appeared more than once.
        product_id: String,
    },

    /// The caller cancelled the operation.
    #[error("Cart operation cancelled")]
    Cancelled,

    /// The operation did not finish before its deadline.
    #[error("Cart operation deadline exceeded")]
    DeadlineExceeded,
}

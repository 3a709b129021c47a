//! Cart Bounded Context
//!
//! A cart is the set of line items stored for one user. Each line item is
//! identified by its cart key `(user_id, product_id)`; at most one stored
//! document exists per key.

pub mod collection;
pub mod document;
pub mod errors;
pub mod filter;
pub mod policy;
pub mod value_objects;

pub use collection::Collection;
pub use document::Document;
pub use errors::{CartError, GatewayError};
pub use filter::{CartField, CartFilter, FieldMatch, Filter};
pub use policy::{QuantityDecision, QuantityPolicy};
pub use value_objects::{CartContents, CartItem, CartKey, ProductId, Quantity, UserId};

//! Application Services
//!
//! Long-lived services that orchestrate domain logic over ports.

mod cart_store;

pub use cart_store::{CartPolicy, CartStore};

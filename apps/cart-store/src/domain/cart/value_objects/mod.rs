//! Cart value objects.

mod cart_contents;
mod cart_item;
mod identifiers;
mod quantity;

pub use cart_contents::CartContents;
pub use cart_item::{CartItem, CartKey};
pub use identifiers::{ProductId, UserId};
pub use quantity::Quantity;

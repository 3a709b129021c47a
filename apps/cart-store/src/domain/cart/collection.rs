//! Document collections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named collections in the shopping cart database.
///
/// Only `Carts` is read or written by the cart store; `Users` and
/// `Products` belong to the wider schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Cart line items.
    Carts,
    /// Registered users.
    Users,
    /// Product catalogue.
    Products,
}

impl Collection {
    /// Collection name as stored.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Carts => "carts",
            Self::Users => "users",
            Self::Products => "products",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Typed document filters.
//!
//! Field names are spelled in exactly one place, [`CartField::as_str`], so
//! the write path (upsert/delete) and the read path (find) cannot drift
//! apart.

use std::fmt;

use serde_json::Value;

use super::document::Document;
use super::value_objects::{CartKey, UserId};

/// Fields of a stored cart item document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartField {
    /// Owner of the line item.
    UserId,
    /// Product of the line item.
    ProductId,
    /// Number of units.
    Quantity,
}

impl CartField {
    /// Document field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::ProductId => "product_id",
            Self::Quantity => "quantity",
        }
    }
}

impl fmt::Display for CartField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single field-equality condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    /// Field compared.
    pub field: CartField,
    /// Required string value.
    pub value: String,
}

/// Conjunction of field-equality conditions, as consumed by gateways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<FieldMatch>,
}

impl Filter {
    /// Conditions in evaluation order.
    #[must_use]
    pub fn conditions(&self) -> &[FieldMatch] {
        &self.conditions
    }

    /// True when every condition holds for `document`.
    ///
    /// A missing field or a non-string value never matches.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|condition| {
            matches!(
                document.get(condition.field.as_str()),
                Some(Value::String(value)) if *value == condition.value
            )
        })
    }

    /// Canonical, unambiguous encoding of the conditions.
    ///
    /// Two filters with the same conditions in the same order produce the
    /// same key; used by stores that index documents by their upsert filter.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        let pairs: Vec<Value> = self
            .conditions
            .iter()
            .map(|c| {
                Value::Array(vec![
                    Value::from(c.field.as_str()),
                    Value::from(c.value.as_str()),
                ])
            })
            .collect();
        Value::Array(pairs).to_string()
    }
}

/// Filters the cart store is allowed to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartFilter {
    /// Every line item of one user.
    ByUser(UserId),
    /// The single line item identified by a cart key.
    ByKey(CartKey),
}

impl From<&CartFilter> for Filter {
    fn from(filter: &CartFilter) -> Self {
        let conditions = match filter {
            CartFilter::ByUser(user_id) => vec![FieldMatch {
                field: CartField::UserId,
                value: user_id.as_str().to_string(),
            }],
            CartFilter::ByKey(key) => vec![
                FieldMatch {
                    field: CartField::UserId,
                    value: key.user_id().as_str().to_string(),
                },
                FieldMatch {
                    field: CartField::ProductId,
                    value: key.product_id().as_str().to_string(),
                },
            ],
        };
        Self { conditions }
    }
}

impl From<CartFilter> for Filter {
    fn from(filter: CartFilter) -> Self {
        Self::from(&filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{CartItem, Quantity};

    fn key(user: &str, product: &str) -> CartKey {
        CartKey::new(user, product).unwrap()
    }

    #[test]
    fn by_key_uses_user_and_product_fields() {
        let filter = Filter::from(CartFilter::ByKey(key("u1", "p1")));
        let fields: Vec<&str> = filter.conditions().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["user_id", "product_id"]);
    }

    #[test]
    fn field_names_match_item_encoding() {
        let doc = CartItem::new(key("u1", "p1"), Quantity::new(2))
            .to_document()
            .unwrap();
        for field in [CartField::UserId, CartField::ProductId, CartField::Quantity] {
            assert!(doc.contains_key(field.as_str()), "missing {field}");
        }
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn matches_only_same_user() {
        let doc = CartItem::new(key("u1", "p1"), Quantity::new(2))
            .to_document()
            .unwrap();
        assert!(Filter::from(CartFilter::ByUser(UserId::new("u1"))).matches(&doc));
        assert!(!Filter::from(CartFilter::ByUser(UserId::new("u2"))).matches(&doc));
        assert!(Filter::from(CartFilter::ByKey(key("u1", "p1"))).matches(&doc));
        assert!(!Filter::from(CartFilter::ByKey(key("u1", "p2"))).matches(&doc));
    }

    #[test]
    fn non_string_value_never_matches() {
        let mut doc = Document::new();
        doc.insert("user_id".to_string(), Value::from(7));
        assert!(!Filter::from(CartFilter::ByUser(UserId::new("7"))).matches(&doc));
    }

    #[test]
    fn canonical_key_is_unambiguous() {
        let a = Filter::from(CartFilter::ByKey(key("u=1", "p")));
        let b = Filter::from(CartFilter::ByKey(key("u", "=1p")));
        assert_ne!(a.canonical_key(), b.canonical_key());
        assert_eq!(
            a.canonical_key(),
            Filter::from(CartFilter::ByKey(key("u=1", "p"))).canonical_key()
        );
    }
}

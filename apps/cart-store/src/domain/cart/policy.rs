//! Quantity validation policy.

use serde::{Deserialize, Serialize};

use super::value_objects::Quantity;

/// How `add_item` treats zero and negative quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityPolicy {
    /// Store any quantity as given.
    #[default]
    PassThrough,
    /// Reject zero and negative quantities.
    RejectNonPositive,
    /// Treat zero and negative quantities as a removal of the line item.
    RemoveNonPositive,
}

/// What `add_item` should do with a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityDecision {
    /// Upsert the line item.
    Store,
    /// Delete the line item instead.
    Remove,
    /// Fail with `InvalidQuantity`.
    Reject,
}

impl QuantityPolicy {
    /// Decide how to handle `quantity`.
    #[must_use]
    pub const fn evaluate(self, quantity: Quantity) -> QuantityDecision {
        if quantity.is_positive() {
            return QuantityDecision::Store;
        }
        match self {
            Self::PassThrough => QuantityDecision::Store,
            Self::RejectNonPositive => QuantityDecision::Reject,
            Self::RemoveNonPositive => QuantityDecision::Remove,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(QuantityPolicy::PassThrough, 2, QuantityDecision::Store)]
    #[test_case(QuantityPolicy::PassThrough, 0, QuantityDecision::Store)]
    #[test_case(QuantityPolicy::PassThrough, -1, QuantityDecision::Store)]
    #[test_case(QuantityPolicy::RejectNonPositive, 2, QuantityDecision::Store)]
    #[test_case(QuantityPolicy::RejectNonPositive, 0, QuantityDecision::Reject)]
    #[test_case(QuantityPolicy::RemoveNonPositive, -5, QuantityDecision::Remove)]
    #[test_case(QuantityPolicy::RemoveNonPositive, 1, QuantityDecision::Store)]
    fn evaluate(policy: QuantityPolicy, quantity: i64, expected: QuantityDecision) {
        assert_eq!(policy.evaluate(Quantity::new(quantity)), expected);
    }

    #[test]
    fn deserializes_snake_case() {
        let policy: QuantityPolicy = serde_json::from_str("\"remove_non_positive\"").unwrap();
        assert_eq!(policy, QuantityPolicy::RemoveNonPositive);
    }
}

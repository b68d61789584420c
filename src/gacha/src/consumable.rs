//! Consumable items: XP crystals and crown bundles.
//!
//! Only items whose name carries "Crystal" or "Crowns" can be used. The
//! leading number of the name (`"10,000 Crowns"`) is the per-unit value.

use serde::{Deserialize, Serialize};

/// What using an item grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableKind {
    Experience,
    Currency,
}

impl ConsumableKind {
    /// Classify an item by name
    pub fn of(item: &str) -> Option<Self> {
        if item.contains("Crystal") {
            Some(Self::Experience)
        } else if item.contains("Crowns") {
            Some(Self::Currency)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ConsumableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Experience => write!(f, "experience"),
            Self::Currency => write!(f, "Crowns currency"),
        }
    }
}

/// Value of one unit, parsed from the first word of the item name
pub fn unit_value(item: &str) -> Option<u64> {
    let first = item.split_whitespace().next()?;
    first.replace(',', "").parse().ok()
}

/// Outcome of using items from the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUse {
    pub item: String,
    pub amount: u64,
    pub kind: ConsumableKind,
    /// `None` when the name carries no readable value; the items are still spent
    pub total_value: Option<u64>,
}

impl ItemUse {
    pub fn new(item: &str, amount: u64, kind: ConsumableKind) -> Self {
        Self {
            item: item.to_string(),
            amount,
            kind,
            total_value: unit_value(item).and_then(|v| v.checked_mul(amount)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_by_name() {
        assert_eq!(
            ConsumableKind::of("500 XP Crystal"),
            Some(ConsumableKind::Experience)
        );
        assert_eq!(
            ConsumableKind::of("50,000 Crowns"),
            Some(ConsumableKind::Currency)
        );
        assert_eq!(ConsumableKind::of("Legendary Warhorn"), None);
    }

    #[test]
    fn test_parses_leading_value() {
        assert_eq!(unit_value("10,000 Crowns"), Some(10_000));
        assert_eq!(unit_value("250 XP Crystal"), Some(250));
        assert_eq!(unit_value("Shiny Crystal"), None);
        assert_eq!(unit_value(""), None);
    }

    #[test]
    fn test_totals_scale_with_amount() {
        let used = ItemUse::new("1,000 Crowns", 3, ConsumableKind::Currency);
        assert_eq!(used.total_value, Some(3_000));

        let unknown = ItemUse::new("Odd Crystal", 2, ConsumableKind::Experience);
        assert_eq!(unknown.total_value, None);
    }
}

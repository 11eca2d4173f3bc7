//! The narrow view of the ledger shared with the widget.

use serde::{Deserialize, Serialize};

use super::ledger::{DEFAULT_MONTHLY_BUDGET, budget_percentage};
use super::tier::Tier;

/// Total and budget copied out of the ledger after every mutation.
///
/// The widget never sees the undo history; this pair is all it needs to
/// draw the ring and the amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnapshot {
    /// Sum of all active entries.
    pub total_spent: f64,
    /// Configured monthly ceiling.
    pub monthly_budget: f64,
}

impl WidgetSnapshot {
    /// Creates a snapshot from a total and a budget.
    #[inline]
    #[must_use]
    pub const fn new(total_spent: f64, monthly_budget: f64) -> Self {
        Self {
            total_spent,
            monthly_budget,
        }
    }

    /// Percentage of the budget spent; `0` when the budget is not positive.
    #[inline]
    #[must_use]
    pub fn budget_percentage(&self) -> f64 {
        budget_percentage(self.total_spent, self.monthly_budget)
    }

    /// Status tier for this snapshot.
    #[inline]
    #[must_use]
    pub fn tier(&self) -> Tier {
        Tier::from_percentage(self.budget_percentage())
    }
}

impl Default for WidgetSnapshot {
    #[inline]
    fn default() -> Self {
        Self::new(0.0, DEFAULT_MONTHLY_BUDGET)
    }
}

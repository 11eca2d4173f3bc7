//! The expense ledger: running total, monthly budget and undo stack.

use crate::error::{ExpenseError, Result};

use super::color::{Rgb, progress_color};
use super::snapshot::WidgetSnapshot;
use super::tier::Tier;

/// Budget used when none has been configured yet.
pub const DEFAULT_MONTHLY_BUDGET: f64 = 10_000.0;

/// Percentage of `budget` consumed by `total`, or `0` for a non-positive
/// budget.
#[inline]
#[must_use]
pub fn budget_percentage(total: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        total / budget * 100.0
    } else {
        0.0
    }
}

/// Sum of `entries`, `+0.0` when empty.
fn total_of(entries: &[f64]) -> f64 {
    // `Iterator::sum` for floats starts at -0.0, which would print as "-0.00".
    entries.iter().fold(0.0, |total, amount| total + amount)
}

/// Returns `true` for amounts the ledger accepts as entries.
fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

/// In-memory record of this month's spending.
///
/// `total_spent` always equals the sum of `history`: every mutation keeps
/// the two in lockstep, and [`LedgerState::restore`] repairs persisted
/// values that disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerState {
    /// Sum of all active entries.
    total_spent: f64,
    /// User-configured ceiling, always positive.
    monthly_budget: f64,
    /// Entry amounts in chronological order.
    history: Vec<f64>,
}

impl Default for LedgerState {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_MONTHLY_BUDGET)
    }
}

impl LedgerState {
    /// Creates an empty ledger with the given budget.
    ///
    /// A non-positive or non-finite budget falls back to
    /// [`DEFAULT_MONTHLY_BUDGET`].
    #[inline]
    #[must_use]
    pub fn new(monthly_budget: f64) -> Self {
        Self {
            total_spent: 0.0,
            monthly_budget: if is_valid_amount(monthly_budget) {
                monthly_budget
            } else {
                DEFAULT_MONTHLY_BUDGET
            },
            history: Vec::new(),
        }
    }

    /// Rebuilds a ledger from persisted parts, defaulting anything missing
    /// or corrupt.
    ///
    /// * Budget: kept if positive, otherwise the default.
    /// * History: non-positive and non-finite amounts are dropped, as are
    ///   entries that would push the total past the largest finite value.
    /// * Total: recomputed from history when history is present. A legacy
    ///   positive total with no history becomes a single entry so that it
    ///   can still be undone.
    #[must_use]
    pub fn restore(total: Option<f64>, budget: Option<f64>, history: Option<Vec<f64>>) -> Self {
        let mut ledger = Self::new(budget.unwrap_or(DEFAULT_MONTHLY_BUDGET));
        let mut entries: Vec<f64> = history.unwrap_or_default();
        let before = entries.len();
        let mut running = 0.0_f64;
        entries.retain(|&amount| {
            let next = running + amount;
            let keep = is_valid_amount(amount) && next.is_finite();
            if keep {
                running = next;
            }
            keep
        });
        if entries.len() != before {
            tracing::warn!(
                dropped = before - entries.len(),
                "discarded invalid history entries"
            );
        }

        if entries.is_empty()
            && let Some(legacy) = total.filter(|&amount| is_valid_amount(amount))
        {
            tracing::debug!(total = legacy, "seeding history from legacy total");
            entries.push(legacy);
        }

        ledger.total_spent = total_of(&entries);
        if let Some(saved) = total
            && (saved - ledger.total_spent).abs() > f64::EPSILON * ledger.total_spent.max(1.0)
        {
            tracing::warn!(
                saved,
                recomputed = ledger.total_spent,
                "saved total disagrees with history, using history"
            );
        }
        ledger.history = entries;
        ledger
    }

    /// Sum of all active entries.
    #[inline]
    #[must_use]
    pub const fn total_spent(&self) -> f64 {
        self.total_spent
    }

    /// Configured monthly ceiling.
    #[inline]
    #[must_use]
    pub const fn monthly_budget(&self) -> f64 {
        self.monthly_budget
    }

    /// Entry amounts in the order they were added.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Whether there is an entry to undo.
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Records an expense.
    ///
    /// Returns `false` and leaves the ledger untouched when `amount` is not
    /// a positive, finite number, or when the new total would overflow to
    /// infinity.
    #[inline]
    pub fn add_entry(&mut self, amount: f64) -> bool {
        if !is_valid_amount(amount) {
            return false;
        }
        let total = self.total_spent + amount;
        if !total.is_finite() {
            tracing::warn!(amount, total = self.total_spent, "entry would overflow the total");
            return false;
        }
        self.history.push(amount);
        self.total_spent = total;
        true
    }

    /// Removes the most recent entry and returns its amount.
    ///
    /// Returns `None` when the history is empty.
    #[inline]
    pub fn undo_last(&mut self) -> Option<f64> {
        let amount = self.history.pop()?;
        self.total_spent = total_of(&self.history);
        Some(amount)
    }

    /// Starts a new month: clears the total and history, keeps the budget.
    #[inline]
    pub fn reset_month(&mut self) {
        self.total_spent = 0.0;
        self.history.clear();
    }

    /// Replaces the monthly budget.
    ///
    /// # Errors
    ///
    /// Returns [`ExpenseError::InvalidBudget`] (with the ledger unchanged)
    /// unless `new_budget` is a positive, finite number.
    #[inline]
    pub fn set_budget(&mut self, new_budget: f64) -> Result<()> {
        if !is_valid_amount(new_budget) {
            return Err(ExpenseError::InvalidBudget(new_budget));
        }
        self.monthly_budget = new_budget;
        Ok(())
    }

    /// `total_spent / monthly_budget * 100`.
    #[inline]
    #[must_use]
    pub fn budget_percentage(&self) -> f64 {
        budget_percentage(self.total_spent, self.monthly_budget)
    }

    /// Status tier for the current percentage.
    #[inline]
    #[must_use]
    pub fn tier(&self) -> Tier {
        Tier::from_percentage(self.budget_percentage())
    }

    /// Warning text, present only above 75%.
    #[inline]
    #[must_use]
    pub fn status_text(&self) -> Option<&'static str> {
        self.tier().status_text()
    }

    /// Blended progress bar color for the current percentage.
    #[inline]
    #[must_use]
    pub fn progress_color(&self) -> Rgb {
        progress_color(self.budget_percentage())
    }

    /// Copies out the pair the widget displays.
    #[inline]
    #[must_use]
    pub const fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot::new(self.total_spent, self.monthly_budget)
    }
}

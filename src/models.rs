//! Data models for the expense ledger.
//!
//! The [`LedgerState`] is the only entity with behavior; everything else
//! here is derived from it: the status [`Tier`], the blended progress
//! [`Rgb`] color, and the [`WidgetSnapshot`] handed to the widget.

mod color;
mod ledger;
mod snapshot;
mod tier;

pub use color::{Rgb, progress_color};
pub use ledger::{DEFAULT_MONTHLY_BUDGET, LedgerState, budget_percentage};
pub use snapshot::WidgetSnapshot;
pub use tier::{APPROACHING_LIMIT, OVER_BUDGET, Tier};

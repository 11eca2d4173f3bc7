//! Monthly expense tracking with budget feedback and a widget snapshot.
//!
//! The [`models::LedgerState`] keeps a running total, a monthly budget and
//! an undo stack. [`tracker::ExpenseTracker`] drives it for the main
//! surface, persisting every change and mirroring a
//! [`models::WidgetSnapshot`] into a store the [`widget`] surface reads.

#[cfg(feature = "storage-file")]
pub mod config;
pub mod deep_link;
pub mod error;
pub mod format;
pub mod input;
pub mod models;
pub mod storage;
pub mod tracker;
pub mod view;
pub mod widget;

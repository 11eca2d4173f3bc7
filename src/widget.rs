//! Widget surface: snapshot loading, timeline and per-family layouts.
//!
//! The widget never touches the ledger. It reads the two shared keys,
//! builds a [`WidgetEntry`], and [`render`]s it as a pure function of that
//! entry and the requested [`WidgetFamily`]. When to render is up to the
//! host; [`timeline`] only suggests the next refresh.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::deep_link::DeepLink;
use crate::format::{compact_amount, whole_percentage, with_currency};
use crate::models::{DEFAULT_MONTHLY_BUDGET, Tier, WidgetSnapshot, budget_percentage};
use crate::storage::{KeyValueStore, keys};
use crate::view::{Element, TextRole, fill_fraction};

/// Widget kind used when asking the host to reload.
pub const WIDGET_KIND: &str = "ExpenseWidget";

/// How long a timeline stays valid before the host should refresh it.
pub const REFRESH_INTERVAL_HOURS: i64 = 1;

/// Size and placement variants of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetFamily {
    /// Home-screen square.
    #[default]
    SystemSmall,
    /// Home-screen wide.
    SystemMedium,
    /// Lock-screen circle.
    AccessoryCircular,
    /// Lock-screen inline rectangle.
    AccessoryRectangular,
}

impl WidgetFamily {
    /// Every supported family.
    pub const ALL: [Self; 4] = [
        Self::SystemSmall,
        Self::SystemMedium,
        Self::AccessoryCircular,
        Self::AccessoryRectangular,
    ];
}

/// One point-in-time state of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetEntry {
    /// When this entry was produced.
    pub date: DateTime<Utc>,
    /// Total spent this month.
    pub total_expenses: f64,
    /// Monthly budget.
    pub monthly_budget: f64,
    /// `total_expenses / monthly_budget * 100`, or `0`.
    pub budget_percentage: f64,
}

impl WidgetEntry {
    /// Builds an entry from a snapshot, computing the percentage.
    #[inline]
    #[must_use]
    pub fn from_snapshot(snapshot: WidgetSnapshot, date: DateTime<Utc>) -> Self {
        Self {
            date,
            total_expenses: snapshot.total_spent,
            monthly_budget: snapshot.monthly_budget,
            budget_percentage: budget_percentage(snapshot.total_spent, snapshot.monthly_budget),
        }
    }

    /// Entry shown while real data is loading.
    #[inline]
    #[must_use]
    pub fn placeholder(date: DateTime<Utc>) -> Self {
        Self::from_snapshot(WidgetSnapshot::new(0.0, DEFAULT_MONTHLY_BUDGET), date)
    }

    /// Status tier for the entry.
    #[inline]
    #[must_use]
    pub fn tier(&self) -> Tier {
        Tier::from_percentage(self.budget_percentage)
    }
}

/// Entries to display and when to ask for new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Entries in display order.
    pub entries: Vec<WidgetEntry>,
    /// Earliest time the host should request a fresh timeline.
    pub refresh_after: DateTime<Utc>,
}

/// Reads the widget-visible snapshot.
///
/// Missing keys, mismatched types and unreadable storage all fall back to
/// `total = 0`, `budget = 10000`.
#[must_use]
pub fn read_snapshot<S: KeyValueStore + ?Sized>(store: &S) -> WidgetSnapshot {
    let defaults = WidgetSnapshot::default();
    let total = read_or_default(store, keys::WIDGET_TOTAL_EXPENSES, defaults.total_spent);
    let budget = read_or_default(store, keys::WIDGET_MONTHLY_BUDGET, defaults.monthly_budget);
    WidgetSnapshot::new(total, budget)
}

/// Reads a scalar, logging and defaulting on failure.
fn read_or_default<S: KeyValueStore + ?Sized>(store: &S, key: &str, default: f64) -> f64 {
    match store.number(key) {
        Ok(Some(value)) if value.is_finite() => value,
        Ok(_) => default,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read widget value, using default");
            default
        }
    }
}

/// Loads the current entry from the shared store.
#[must_use]
pub fn current_entry<S: KeyValueStore + ?Sized>(store: &S, now: DateTime<Utc>) -> WidgetEntry {
    WidgetEntry::from_snapshot(read_snapshot(store), now)
}

/// Builds a single-entry timeline that expires one hour after `now`.
#[must_use]
pub fn timeline<S: KeyValueStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Timeline {
    let entry = current_entry(store, now);
    let refresh_after = now
        .checked_add_signed(Duration::hours(REFRESH_INTERVAL_HOURS))
        .unwrap_or(now);
    tracing::debug!(
        total = entry.total_expenses,
        budget = entry.monthly_budget,
        %refresh_after,
        "built widget timeline"
    );
    Timeline {
        entries: vec![entry],
        refresh_after,
    }
}

/// Renders `entry` for `family`.
///
/// Pure: the same entry and family always produce the same tree.
#[must_use]
pub fn render(entry: &WidgetEntry, family: WidgetFamily) -> Element {
    let layout = match family {
        WidgetFamily::SystemSmall => small(entry),
        WidgetFamily::SystemMedium => medium(entry),
        WidgetFamily::AccessoryCircular => circular(entry),
        WidgetFamily::AccessoryRectangular => rectangular(entry),
    };
    layout.linked(DeepLink::Open)
}

/// Progress ring for an entry.
fn ring(entry: &WidgetEntry, line_width: u8) -> Element {
    Element::Ring {
        progress: fill_fraction(entry.budget_percentage),
        color: entry.tier().step_color(),
        line_width,
    }
}

/// Truncated percentage with a `%` sign, in the tier color.
fn percent_text(entry: &WidgetEntry, role: TextRole) -> Element {
    Element::colored_text(
        format!("{}%", whole_percentage(entry.budget_percentage)),
        role,
        entry.tier().step_color(),
    )
}

/// `₹` plus compact amount.
fn amount(value: f64) -> String {
    with_currency(&compact_amount(value))
}

/// Home-screen square: label and a ring with the percentage inside.
fn small(entry: &WidgetEntry) -> Element {
    Element::vstack(vec![
        Element::hstack(vec![
            Element::text("EXPENSES", TextRole::Header),
            Element::Spacer,
        ]),
        Element::zstack(vec![ring(entry, 12), percent_text(entry, TextRole::Title)]),
        Element::Spacer,
    ])
}

/// Home-screen wide: amounts on the left, ring on the right.
fn medium(entry: &WidgetEntry) -> Element {
    let details = Element::vstack(vec![
        Element::hstack(vec![
            Element::text("MONTHLY EXPENSES", TextRole::Header),
            Element::Spacer,
            percent_text(entry, TextRole::Body),
        ]),
        Element::vstack(vec![
            Element::text(amount(entry.total_expenses), TextRole::Title),
            Element::text(
                format!("of {} budget", amount(entry.monthly_budget)),
                TextRole::Caption,
            ),
        ]),
        Element::Spacer,
    ]);
    let gauge = Element::vstack(vec![
        Element::Spacer,
        Element::zstack(vec![
            ring(entry, 8),
            Element::colored_text(
                whole_percentage(entry.budget_percentage),
                TextRole::Body,
                entry.tier().step_color(),
            ),
        ]),
        Element::Spacer,
    ]);
    Element::hstack(vec![details, gauge])
}

/// Lock-screen circle: thin ring around the percentage.
fn circular(entry: &WidgetEntry) -> Element {
    Element::zstack(vec![ring(entry, 4), percent_text(entry, TextRole::Body)])
}

/// Lock-screen rectangle: ring plus total, percentage and budget.
fn rectangular(entry: &WidgetEntry) -> Element {
    Element::hstack(vec![
        ring(entry, 3),
        Element::vstack(vec![
            Element::hstack(vec![
                Element::text(amount(entry.total_expenses), TextRole::Body),
                percent_text(entry, TextRole::Caption),
            ]),
            Element::text(
                format!("of {}", amount(entry.monthly_budget)),
                TextRole::Caption,
            ),
        ]),
        Element::Spacer,
    ])
}

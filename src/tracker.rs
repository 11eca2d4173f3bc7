//! The main surface's controller: owns the ledger, persists it, mirrors
//! the snapshot for the widget, and notifies subscribers.
//!
//! Every successful mutation runs the same sync sequence:
//!
//! 1. write total, budget and history to the private store;
//! 2. write total and budget to the shared store under the widget keys;
//! 3. ask the [`WidgetReloader`] to re-render the widget;
//! 4. call every subscriber with the new state.
//!
//! Rejected operations (non-positive amount, empty undo, invalid budget)
//! skip all four steps.

use crate::error::Result;
use crate::models::LedgerState;
use crate::storage::{KeyValueStore, StoredValue, keys};
use crate::widget::WIDGET_KIND;

/// Asks the widget host to redraw at its next opportunity.
pub trait WidgetReloader: core::fmt::Debug {
    /// Requests a reload of every widget of `kind`.
    fn reload(&self, kind: &str);
}

/// Reloader for hosts that poll on their own schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReloader;

impl WidgetReloader for NoopReloader {
    #[inline]
    fn reload(&self, _kind: &str) {}
}

/// Reloader that records the request as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReloader;

impl WidgetReloader for LoggingReloader {
    #[inline]
    fn reload(&self, kind: &str) {
        tracing::info!(kind, "widget reload requested");
    }
}

/// Handle returned by [`ExpenseTracker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Callback invoked after each mutation.
type Subscriber = Box<dyn FnMut(&LedgerState) + Send>;

/// Ledger plus its persistence and change notifications.
pub struct ExpenseTracker<P, S, R = NoopReloader>
where
    P: KeyValueStore,
    S: KeyValueStore,
    R: WidgetReloader,
{
    /// In-memory state.
    ledger: LedgerState,
    /// Private store, including the undo history.
    private: P,
    /// Region shared with the widget.
    shared: S,
    /// Widget host signal.
    reloader: R,
    /// Registered callbacks in subscription order.
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    /// Next subscription identifier.
    next_subscription: u64,
}

impl<P, S, R> core::fmt::Debug for ExpenseTracker<P, S, R>
where
    P: KeyValueStore,
    S: KeyValueStore,
    R: WidgetReloader,
{
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExpenseTracker")
            .field("ledger", &self.ledger)
            .field("private", &self.private)
            .field("shared", &self.shared)
            .field("reloader", &self.reloader)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<P, S, R> ExpenseTracker<P, S, R>
where
    P: KeyValueStore,
    S: KeyValueStore,
    R: WidgetReloader,
{
    /// Loads the ledger from `private`.
    ///
    /// Missing or unreadable values are replaced by defaults and logged;
    /// loading never fails.
    #[tracing::instrument(skip_all)]
    pub fn load(private: P, shared: S, reloader: R) -> Self {
        let total = read_logged(&private, keys::SAVED_EXPENSES, P::number);
        let budget = read_logged(&private, keys::MONTHLY_BUDGET, P::number);
        let history = read_logged(&private, keys::EXPENSE_HISTORY, P::numbers);
        let ledger = LedgerState::restore(total, budget, history);
        tracing::debug!(
            total = ledger.total_spent(),
            budget = ledger.monthly_budget(),
            entries = ledger.history().len(),
            "loaded ledger"
        );
        Self::with_ledger(ledger, private, shared, reloader)
    }

    /// Wraps an existing ledger without reading storage.
    #[inline]
    pub const fn with_ledger(ledger: LedgerState, private: P, shared: S, reloader: R) -> Self {
        Self {
            ledger,
            private,
            shared,
            reloader,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    /// The private store.
    #[inline]
    #[must_use]
    pub const fn private_store(&self) -> &P {
        &self.private
    }

    /// The store shared with the widget.
    #[inline]
    #[must_use]
    pub const fn shared_store(&self) -> &S {
        &self.shared
    }

    /// Registers `callback` to run after every successful mutation.
    #[inline]
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&LedgerState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscription. Returns `false` if it was not registered.
    #[inline]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|&(existing, _)| existing != id);
        self.subscribers.len() != before
    }

    /// Records an expense and syncs.
    ///
    /// Returns `Ok(false)` without touching storage when the ledger rejects
    /// `amount` (not positive, or the total would overflow).
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails. The in-memory
    /// ledger keeps the entry.
    #[tracing::instrument(skip(self))]
    pub fn add_entry(&mut self, amount: f64) -> Result<bool> {
        if !self.ledger.add_entry(amount) {
            tracing::debug!("rejected entry");
            return Ok(false);
        }
        self.commit()?;
        Ok(true)
    }

    /// Removes the most recent entry and syncs.
    ///
    /// Returns `Ok(None)` without touching storage when there is nothing
    /// to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails.
    #[tracing::instrument(skip(self))]
    pub fn undo_last(&mut self) -> Result<Option<f64>> {
        let Some(amount) = self.ledger.undo_last() else {
            tracing::debug!("nothing to undo");
            return Ok(None);
        };
        self.commit()?;
        Ok(Some(amount))
    }

    /// Clears the month's total and history, keeps the budget, and syncs.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails.
    #[tracing::instrument(skip(self))]
    pub fn reset_month(&mut self) -> Result<()> {
        self.ledger.reset_month();
        self.commit()
    }

    /// Replaces the monthly budget and syncs.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ExpenseError::InvalidBudget`] (nothing is
    /// written) unless `new_budget` is positive, or a storage error if
    /// persisting fails.
    #[tracing::instrument(skip(self))]
    pub fn set_budget(&mut self, new_budget: f64) -> Result<()> {
        self.ledger.set_budget(new_budget)?;
        self.commit()
    }

    /// Persists, mirrors, signals and notifies.
    fn commit(&mut self) -> Result<()> {
        self.persist_private()?;
        self.persist_shared()?;
        self.reloader.reload(WIDGET_KIND);
        self.notify();
        Ok(())
    }

    /// Writes the full ledger to the private store.
    fn persist_private(&self) -> Result<()> {
        self.private.set_values(vec![
            (
                keys::SAVED_EXPENSES.to_owned(),
                StoredValue::Number(self.ledger.total_spent()),
            ),
            (
                keys::MONTHLY_BUDGET.to_owned(),
                StoredValue::Number(self.ledger.monthly_budget()),
            ),
            (
                keys::EXPENSE_HISTORY.to_owned(),
                StoredValue::List(self.ledger.history().to_vec()),
            ),
        ])
    }

    /// Writes the widget snapshot to the shared store.
    fn persist_shared(&self) -> Result<()> {
        let snapshot = self.ledger.snapshot();
        self.shared.set_values(vec![
            (
                keys::WIDGET_TOTAL_EXPENSES.to_owned(),
                StoredValue::Number(snapshot.total_spent),
            ),
            (
                keys::WIDGET_MONTHLY_BUDGET.to_owned(),
                StoredValue::Number(snapshot.monthly_budget),
            ),
        ])
    }

    /// Calls every subscriber with the current state.
    fn notify(&mut self) {
        for (_, callback) in &mut self.subscribers {
            callback(&self.ledger);
        }
    }
}

/// Reads one value, turning failures into `None` with a warning.
fn read_logged<P, T>(store: &P, key: &str, read: fn(&P, &str) -> Result<Option<T>>) -> Option<T>
where
    P: KeyValueStore,
{
    match read(store, key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read persisted value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::ExpenseError;
    use crate::storage::InMemoryStore;
    use crate::widget::read_snapshot;

    /// Counts reload requests.
    #[derive(Debug, Default)]
    struct CountingReloader {
        /// Kinds requested so far.
        requests: Mutex<Vec<String>>,
    }

    impl WidgetReloader for CountingReloader {
        fn reload(&self, kind: &str) {
            self.requests.lock().unwrap().push(kind.to_owned());
        }
    }

    impl CountingReloader {
        fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    /// Store whose reads always fail.
    #[derive(Debug, Default)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn value(&self, _key: &str) -> Result<Option<StoredValue>> {
            Err(ExpenseError::Storage("disk on fire".into()))
        }

        fn set_values(&self, _entries: Vec<(String, StoredValue)>) -> Result<()> {
            Err(ExpenseError::Storage("disk on fire".into()))
        }
    }

    type TestTracker = ExpenseTracker<InMemoryStore, InMemoryStore, CountingReloader>;

    fn fresh() -> TestTracker {
        ExpenseTracker::load(
            InMemoryStore::new(),
            InMemoryStore::new(),
            CountingReloader::default(),
        )
    }

    #[test]
    fn load_from_empty_store_uses_defaults() {
        let tracker = fresh();
        assert_eq!(tracker.ledger(), &LedgerState::default());
    }

    #[test]
    fn load_restores_persisted_state() {
        let private = InMemoryStore::new();
        private
            .set_values(vec![
                (keys::SAVED_EXPENSES.to_owned(), StoredValue::Number(350.0)),
                (keys::MONTHLY_BUDGET.to_owned(), StoredValue::Number(4_000.0)),
                (
                    keys::EXPENSE_HISTORY.to_owned(),
                    StoredValue::List(vec![100.0, 250.0]),
                ),
            ])
            .unwrap();
        let tracker = ExpenseTracker::load(private, InMemoryStore::new(), NoopReloader);
        assert!((tracker.ledger().total_spent() - 350.0).abs() < f64::EPSILON);
        assert!((tracker.ledger().monthly_budget() - 4_000.0).abs() < f64::EPSILON);
        assert_eq!(tracker.ledger().history(), &[100.0, 250.0]);
    }

    #[test]
    fn load_survives_unreadable_store() {
        let tracker = ExpenseTracker::load(BrokenStore, InMemoryStore::new(), NoopReloader);
        assert_eq!(tracker.ledger(), &LedgerState::default());
    }

    #[test]
    fn add_persists_privately_and_mirrors_for_widget() {
        let mut tracker = fresh();
        assert!(tracker.add_entry(1_200.0).unwrap());
        assert!(tracker.add_entry(300.0).unwrap());

        let private = tracker.private_store();
        assert_eq!(private.number(keys::SAVED_EXPENSES).unwrap(), Some(1_500.0));
        assert_eq!(private.number(keys::MONTHLY_BUDGET).unwrap(), Some(10_000.0));
        assert_eq!(
            private.numbers(keys::EXPENSE_HISTORY).unwrap(),
            Some(vec![1_200.0, 300.0])
        );

        let shared = tracker.shared_store();
        assert_eq!(shared.len().unwrap(), 2);
        assert_eq!(shared.number(keys::WIDGET_TOTAL_EXPENSES).unwrap(), Some(1_500.0));
        assert_eq!(shared.number(keys::WIDGET_MONTHLY_BUDGET).unwrap(), Some(10_000.0));
        assert!(shared.value(keys::EXPENSE_HISTORY).unwrap().is_none());

        assert_eq!(tracker.reloader.count(), 2);
    }

    #[test]
    fn rejected_add_touches_nothing() {
        let mut tracker = fresh();
        assert!(!tracker.add_entry(0.0).unwrap());
        assert!(!tracker.add_entry(-5.0).unwrap());
        assert!(tracker.private_store().is_empty().unwrap());
        assert!(tracker.shared_store().is_empty().unwrap());
        assert_eq!(tracker.reloader.count(), 0);
    }

    #[test]
    fn overflowing_add_is_rejected_without_sync() {
        let mut tracker = fresh();
        assert!(tracker.add_entry(1e308).unwrap());
        assert!(!tracker.add_entry(1e308).unwrap());
        assert_eq!(tracker.reloader.count(), 1);
        assert_eq!(
            tracker.private_store().number(keys::SAVED_EXPENSES).unwrap(),
            Some(1e308)
        );
        assert_eq!(
            tracker
                .shared_store()
                .number(keys::WIDGET_TOTAL_EXPENSES)
                .unwrap(),
            Some(1e308)
        );
    }

    #[test]
    fn undo_syncs_only_when_something_was_undone() {
        let mut tracker = fresh();
        assert_eq!(tracker.undo_last().unwrap(), None);
        assert_eq!(tracker.reloader.count(), 0);

        assert!(tracker.add_entry(80.0).unwrap());
        assert!(tracker.add_entry(20.0).unwrap());
        assert_eq!(tracker.undo_last().unwrap(), Some(20.0));
        assert_eq!(
            tracker
                .shared_store()
                .number(keys::WIDGET_TOTAL_EXPENSES)
                .unwrap(),
            Some(80.0)
        );
        assert_eq!(tracker.reloader.count(), 3);
    }

    #[test]
    fn reset_keeps_budget_everywhere() {
        let mut tracker = fresh();
        tracker.set_budget(6_000.0).unwrap();
        assert!(tracker.add_entry(5_000.0).unwrap());
        tracker.reset_month().unwrap();

        assert!(tracker.ledger().total_spent().abs() < f64::EPSILON);
        assert_eq!(
            tracker.private_store().numbers(keys::EXPENSE_HISTORY).unwrap(),
            Some(Vec::new())
        );
        assert_eq!(
            read_snapshot(tracker.shared_store()),
            crate::models::WidgetSnapshot::new(0.0, 6_000.0)
        );
    }

    #[test]
    fn invalid_budget_is_rejected_without_sync() {
        let mut tracker = fresh();
        assert!(matches!(
            tracker.set_budget(0.0),
            Err(ExpenseError::InvalidBudget(_))
        ));
        assert!(tracker.set_budget(-100.0).is_err());
        assert!(tracker.private_store().is_empty().unwrap());
        assert_eq!(tracker.reloader.count(), 0);

        tracker.set_budget(5_000.0).unwrap();
        assert!((tracker.ledger().monthly_budget() - 5_000.0).abs() < f64::EPSILON);
        assert_eq!(
            tracker
                .shared_store()
                .number(keys::WIDGET_MONTHLY_BUDGET)
                .unwrap(),
            Some(5_000.0)
        );
    }

    #[test]
    fn subscribers_see_each_mutation() {
        let mut tracker = fresh();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = tracker.subscribe(move |ledger| {
            sink.lock().unwrap().push(ledger.total_spent());
        });

        assert!(tracker.add_entry(10.0).unwrap());
        assert!(!tracker.add_entry(0.0).unwrap());
        assert!(tracker.add_entry(5.0).unwrap());
        assert_eq!(tracker.undo_last().unwrap(), Some(5.0));
        tracker.reset_month().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![10.0, 15.0, 10.0, 0.0]);

        assert!(tracker.unsubscribe(id));
        assert!(!tracker.unsubscribe(id));
        assert!(tracker.add_entry(1.0).unwrap());
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[test]
    fn subscription_ids_are_unique() {
        let mut tracker = fresh();
        let first = tracker.subscribe(|_| {});
        let second = tracker.subscribe(|_| {});
        assert_ne!(first, second);
    }

    #[test]
    fn write_failure_is_reported() {
        let mut tracker = ExpenseTracker::with_ledger(
            LedgerState::default(),
            BrokenStore,
            InMemoryStore::new(),
            NoopReloader,
        );
        assert!(matches!(
            tracker.add_entry(10.0),
            Err(ExpenseError::Storage(_))
        ));
        assert!((tracker.ledger().total_spent() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn debug_hides_callbacks() {
        let mut tracker = fresh();
        let _id = tracker.subscribe(|_| {});
        let rendered = format!("{tracker:?}");
        assert!(rendered.contains("ExpenseTracker"));
        assert!(rendered.contains("subscribers: 1"));
    }
}

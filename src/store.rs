//! Time-series storage for per-species population history, with change
//! notification to registered observers.
//!
//! All series share one `start_year..=end_year` window and always have the
//! same length; advancing the year extends every series. The store is
//! single-threaded by design (observer handles are `Rc`), matching the
//! synchronous tick model of the engine.

use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

/// Payload delivered to year-change subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearWindow {
    pub start_year: i32,
    pub end_year: i32,
}

/// Payload delivered to series subscribers after a successful write: the
/// full snapshot of the series, indexed by year offset from `start_year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesUpdate {
    pub start_year: i32,
    pub end_year: i32,
    pub series_id: String,
    pub values: Vec<u64>,
}

pub trait YearObserver {
    fn year_changed(&self, window: &YearWindow);
}

pub trait SeriesObserver {
    fn series_changed(&self, update: &SeriesUpdate);
}

pub struct TimeSeriesStore {
    start_year: i32,
    end_year: i32,
    order: Vec<String>,
    series: HashMap<String, Vec<u64>>,
    series_subscribers: HashMap<String, Vec<Rc<dyn SeriesObserver>>>,
    year_subscribers: Vec<Rc<dyn YearObserver>>,
}

impl TimeSeriesStore {
    pub fn new(start_year: i32) -> Self {
        Self {
            start_year,
            end_year: start_year,
            order: Vec::new(),
            series: HashMap::new(),
            series_subscribers: HashMap::new(),
            year_subscribers: Vec::new(),
        }
    }

    /// Drops every series and every subscription, collapsing the window to
    /// `start_year`.
    pub fn reset(&mut self, start_year: i32) {
        self.start_year = start_year;
        self.end_year = start_year;
        self.order.clear();
        self.series.clear();
        self.series_subscribers.clear();
        self.year_subscribers.clear();
    }

    /// Registers a series of zeros sized to the current window, with a fresh
    /// subscriber list. Re-adding an existing id overwrites its history.
    pub fn add_time_series(&mut self, id: &str) {
        if !self.series.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.series.insert(id.to_string(), vec![0; self.window_len()]);
        self.series_subscribers.insert(id.to_string(), Vec::new());
    }

    /// Series ids in registration order.
    pub fn series_ids(&self) -> &[String] {
        &self.order
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// Most recent year in the window.
    pub fn current_year(&self) -> i32 {
        self.end_year
    }

    /// Full history of one series.
    pub fn series_values(&self, id: &str) -> Option<&[u64]> {
        self.series.get(id).map(|values| values.as_slice())
    }

    /// Extends the window by one year. Every series repeats its last value
    /// (0 when empty) into the new slot, then year-subscribers are notified.
    pub fn advance_year(&mut self) {
        self.end_year += 1;
        let window_len = self.window_len();
        for values in self.series.values_mut() {
            let carry = values.last().copied().unwrap_or(0);
            while values.len() < window_len {
                values.push(carry);
            }
        }
        self.notify_year_change();
    }

    /// Reads one point; `None` year means the latest. Unknown ids and years
    /// outside the window read as `None`.
    pub fn get_series_value(&self, id: &str, year: Option<i32>) -> Option<u64> {
        let year = year.unwrap_or(self.end_year);
        if year < self.start_year {
            return None;
        }
        self.series
            .get(id)?
            .get((year - self.start_year) as usize)
            .copied()
    }

    /// Writes one point; `None` year means the latest. Writes outside the
    /// window or to unknown ids are silent no-ops. A successful write sends
    /// the full series snapshot to that series' subscribers.
    pub fn set_series_value(&mut self, id: &str, value: u64, year: Option<i32>) {
        let year = year.unwrap_or(self.end_year);
        if year < self.start_year || year > self.end_year {
            return;
        }
        let index = (year - self.start_year) as usize;
        match self.series.get_mut(id) {
            Some(values) if index < values.len() => values[index] = value,
            _ => return,
        }
        self.notify_series(id);
    }

    /// Latest value of every series.
    pub fn current_values(&self) -> HashMap<String, u64> {
        self.order
            .iter()
            .filter_map(|id| self.get_series_value(id, None).map(|value| (id.clone(), value)))
            .collect()
    }

    /// Bulk write of the latest year, defined as repeated single writes in
    /// sorted id order; fires one per-series notification per written id.
    pub fn set_current_values(&mut self, values: &HashMap<String, u64>) {
        let mut ids: Vec<&String> = values.keys().collect();
        ids.sort();
        for id in ids {
            self.set_series_value(id, values[id], None);
        }
    }

    /// Collapses the window to a single year (`None` = the current end year)
    /// and resets every series to `[0]`. Subscriptions survive;
    /// year-subscribers are notified once, then each series' subscribers.
    pub fn erase(&mut self, start_year: Option<i32>) {
        let year = start_year.unwrap_or(self.end_year);
        self.start_year = year;
        self.end_year = year;
        for values in self.series.values_mut() {
            values.clear();
            values.push(0);
        }
        self.notify_year_change();
        for id in &self.order {
            self.notify_series(id);
        }
    }

    pub fn subscribe_to_series(&mut self, id: &str, observer: Rc<dyn SeriesObserver>) {
        if let Some(subscribers) = self.series_subscribers.get_mut(id) {
            subscribers.push(observer);
        }
    }

    /// Registers the observer on every currently-known series. Series added
    /// later are not covered.
    pub fn subscribe_to_all_series(&mut self, observer: Rc<dyn SeriesObserver>) {
        for subscribers in self.series_subscribers.values_mut() {
            subscribers.push(Rc::clone(&observer));
        }
    }

    pub fn subscribe_to_year_change(&mut self, observer: Rc<dyn YearObserver>) {
        self.year_subscribers.push(observer);
    }

    fn window_len(&self) -> usize {
        (self.end_year - self.start_year + 1) as usize
    }

    fn notify_year_change(&self) {
        let window = YearWindow {
            start_year: self.start_year,
            end_year: self.end_year,
        };
        for subscriber in &self.year_subscribers {
            subscriber.year_changed(&window);
        }
    }

    fn notify_series(&self, id: &str) {
        let subscribers = match self.series_subscribers.get(id) {
            Some(subscribers) if !subscribers.is_empty() => subscribers,
            _ => return,
        };
        let values = match self.series.get(id) {
            Some(values) => values.clone(),
            None => return,
        };
        let update = SeriesUpdate {
            start_year: self.start_year,
            end_year: self.end_year,
            series_id: id.to_string(),
            values,
        };
        for subscriber in subscribers {
            subscriber.series_changed(&update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct SeriesRecorder {
        updates: RefCell<Vec<SeriesUpdate>>,
    }

    impl SeriesObserver for SeriesRecorder {
        fn series_changed(&self, update: &SeriesUpdate) {
            self.updates.borrow_mut().push(update.clone());
        }
    }

    #[derive(Default)]
    struct YearRecorder {
        windows: RefCell<Vec<YearWindow>>,
    }

    impl YearObserver for YearRecorder {
        fn year_changed(&self, window: &YearWindow) {
            self.windows.borrow_mut().push(*window);
        }
    }

    #[test]
    fn round_trip_preserves_history_and_carries_forward() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        store.set_series_value("X", 7, None);
        assert_eq!(store.get_series_value("X", None), Some(7));

        store.advance_year();
        assert_eq!(store.get_series_value("X", Some(2024)), Some(7));
        assert_eq!(store.get_series_value("X", None), Some(7));
    }

    #[test]
    fn window_stays_synchronized_across_series() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("a");
        store.add_time_series("b");
        for _ in 0..3 {
            store.advance_year();
        }
        store.add_time_series("late");
        for id in ["a", "b", "late"] {
            assert_eq!(store.series_values(id).unwrap().len(), 4, "series {id}");
        }
        assert_eq!(store.current_year(), 2027);
    }

    #[test]
    fn out_of_window_access_is_a_no_op() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        store.set_series_value("X", 9, Some(2023));
        store.set_series_value("X", 9, Some(2025));
        store.set_series_value("ghost", 9, None);
        assert_eq!(store.get_series_value("X", None), Some(0));
        assert_eq!(store.get_series_value("X", Some(2030)), None);
        assert_eq!(store.get_series_value("ghost", None), None);
    }

    #[test]
    fn erase_is_idempotent_and_keeps_subscriptions() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        let recorder = Rc::new(SeriesRecorder::default());
        store.subscribe_to_series("X", recorder.clone());

        store.advance_year();
        store.set_series_value("X", 5, None);
        recorder.updates.borrow_mut().clear();

        store.erase(Some(2030));
        assert_eq!(store.start_year(), 2030);
        assert_eq!(store.current_year(), 2030);
        assert_eq!(store.series_values("X").unwrap(), [0]);
        assert_eq!(recorder.updates.borrow().len(), 1);

        store.erase(Some(2030));
        assert_eq!(store.start_year(), 2030);
        assert_eq!(store.current_year(), 2030);
        assert_eq!(store.series_values("X").unwrap(), [0]);
        assert_eq!(recorder.updates.borrow().len(), 2);
    }

    #[test]
    fn erase_defaults_to_the_current_year() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        store.advance_year();
        store.advance_year();
        store.erase(None);
        assert_eq!(store.start_year(), 2026);
        assert_eq!(store.current_year(), 2026);
    }

    #[test]
    fn advance_year_notifies_year_subscribers_only() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        let years = Rc::new(YearRecorder::default());
        let series = Rc::new(SeriesRecorder::default());
        store.subscribe_to_year_change(years.clone());
        store.subscribe_to_series("X", series.clone());

        store.advance_year();
        assert_eq!(
            years.windows.borrow().as_slice(),
            [YearWindow {
                start_year: 2024,
                end_year: 2025
            }]
        );
        assert!(series.updates.borrow().is_empty());
    }

    #[test]
    fn writes_notify_with_the_full_snapshot() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        let recorder = Rc::new(SeriesRecorder::default());
        store.subscribe_to_series("X", recorder.clone());

        store.set_series_value("X", 3, None);
        store.advance_year();
        store.set_series_value("X", 8, None);

        let updates = recorder.updates.borrow();
        assert_eq!(updates.len(), 2);
        assert_eq!(
            updates[1],
            SeriesUpdate {
                start_year: 2024,
                end_year: 2025,
                series_id: "X".to_string(),
                values: vec![3, 8],
            }
        );
    }

    #[test]
    fn subscribe_to_all_series_is_not_retroactive() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("a");
        let recorder = Rc::new(SeriesRecorder::default());
        store.subscribe_to_all_series(recorder.clone());
        store.add_time_series("b");

        store.set_series_value("a", 1, None);
        store.set_series_value("b", 2, None);
        let updates = recorder.updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].series_id, "a");
    }

    #[test]
    fn readding_a_series_clears_history_and_subscribers() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        let recorder = Rc::new(SeriesRecorder::default());
        store.subscribe_to_series("X", recorder.clone());
        store.set_series_value("X", 4, None);

        store.add_time_series("X");
        assert_eq!(store.series_values("X").unwrap(), [0]);
        store.set_series_value("X", 6, None);
        assert_eq!(recorder.updates.borrow().len(), 1);
        assert_eq!(store.series_ids(), ["X"]);
    }

    #[test]
    fn reset_clears_series_and_subscriptions() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("X");
        let years = Rc::new(YearRecorder::default());
        store.subscribe_to_year_change(years.clone());

        store.reset(2030);
        assert_eq!(store.start_year(), 2030);
        assert_eq!(store.current_year(), 2030);
        assert!(store.series_ids().is_empty());

        store.advance_year();
        assert!(years.windows.borrow().is_empty());
    }

    #[test]
    fn bulk_write_fires_one_notification_per_series() {
        let mut store = TimeSeriesStore::new(2024);
        store.add_time_series("a");
        store.add_time_series("b");
        let recorder = Rc::new(SeriesRecorder::default());
        store.subscribe_to_all_series(recorder.clone());

        let mut values = HashMap::new();
        values.insert("a".to_string(), 10);
        values.insert("b".to_string(), 20);
        values.insert("ghost".to_string(), 30);
        store.set_current_values(&values);

        let updates = recorder.updates.borrow();
        assert_eq!(updates.len(), 2);
        assert_eq!(store.get_series_value("a", None), Some(10));
        assert_eq!(store.get_series_value("b", None), Some(20));
    }
}

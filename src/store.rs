//! Running tallies and bounded detection history.
//!
//! The store is the only shared mutable state in the pipeline. Counts and
//! history move together under a single lock guard, so a reader can never
//! observe the total out of step with the per-category counts.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::detect::{Detection, VehicleCategory};

/// Default cap on retained detections. Oldest entries are evicted first.
pub const DEFAULT_HISTORY_CAP: usize = 1000;

/// Per-category tallies plus their sum.
///
/// Invariant: `total` always equals the sum of the per-category fields.
/// Only `increment` mutates it, and readers get copies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSnapshot {
    pub car: u64,
    pub bus: u64,
    pub truck: u64,
    pub motorcycle: u64,
    pub bicycle: u64,
    pub van: u64,
    pub unknown: u64,
    pub total: u64,
}

impl CountSnapshot {
    pub fn count(&self, category: VehicleCategory) -> u64 {
        match category {
            VehicleCategory::Car => self.car,
            VehicleCategory::Bus => self.bus,
            VehicleCategory::Truck => self.truck,
            VehicleCategory::Motorcycle => self.motorcycle,
            VehicleCategory::Bicycle => self.bicycle,
            VehicleCategory::Van => self.van,
            VehicleCategory::Unknown => self.unknown,
        }
    }

    fn increment(&mut self, category: VehicleCategory) {
        let slot = match category {
            VehicleCategory::Car => &mut self.car,
            VehicleCategory::Bus => &mut self.bus,
            VehicleCategory::Truck => &mut self.truck,
            VehicleCategory::Motorcycle => &mut self.motorcycle,
            VehicleCategory::Bicycle => &mut self.bicycle,
            VehicleCategory::Van => &mut self.van,
            VehicleCategory::Unknown => &mut self.unknown,
        };
        *slot += 1;
        self.total += 1;
    }

    /// Sum of the per-category fields, for invariant checks.
    pub fn category_sum(&self) -> u64 {
        VehicleCategory::ALL
            .iter()
            .map(|c| self.count(*c))
            .sum()
    }
}

/// Session-scoped mutable state: tallies plus ordered history.
#[derive(Debug, Default)]
struct SessionState {
    counts: CountSnapshot,
    history: VecDeque<Detection>,
}

/// Owns the running counts and the bounded detection history.
pub struct AggregationStore {
    state: Mutex<SessionState>,
    history_cap: usize,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::with_history_cap(DEFAULT_HISTORY_CAP)
    }

    pub fn with_history_cap(history_cap: usize) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            history_cap: history_cap.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Counts and history are updated under one guard, so even a poisoned
        // lock holds consistent state; recover the guard.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append detections to history and bump the matching counters.
    ///
    /// Both updates happen under one guard: no reader can see a total
    /// without its per-category increment. History past the cap evicts
    /// oldest-first.
    pub fn record<I>(&self, detections: I)
    where
        I: IntoIterator<Item = Detection>,
    {
        let mut state = self.lock();
        for detection in detections {
            state.counts.increment(detection.category);
            state.history.push_back(detection);
            while state.history.len() > self.history_cap {
                state.history.pop_front();
            }
        }
    }

    /// Copy of the current tallies. Never a live reference.
    pub fn snapshot(&self) -> CountSnapshot {
        self.lock().counts.clone()
    }

    /// Retained detections in insertion order (most recent last), optionally
    /// truncated to the last `limit`.
    pub fn history(&self, limit: Option<usize>) -> Vec<Detection> {
        let state = self.lock();
        let len = state.history.len();
        let skip = match limit {
            Some(limit) => len.saturating_sub(limit),
            None => 0,
        };
        state.history.iter().skip(skip).cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Clear all counts and history. Holds unconditionally: afterwards the
    /// snapshot is all-zero and the history is empty.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.counts = CountSnapshot::default();
        state.history.clear();
    }
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use std::sync::Arc;

    fn detection(category: VehicleCategory) -> Detection {
        Detection::new(
            category,
            0.9,
            BoundingBox {
                x: 10.0,
                y: 10.0,
                width: 50.0,
                height: 40.0,
            },
        )
    }

    #[test]
    fn total_always_matches_category_sum() {
        let store = AggregationStore::new();
        let batches = [
            vec![detection(VehicleCategory::Car)],
            vec![
                detection(VehicleCategory::Bus),
                detection(VehicleCategory::Car),
                detection(VehicleCategory::Van),
            ],
            vec![],
            vec![detection(VehicleCategory::Truck)],
        ];

        for batch in batches {
            store.record(batch);
            let snapshot = store.snapshot();
            assert_eq!(snapshot.total, snapshot.category_sum());
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.car, 2);
        assert_eq!(snapshot.total, 5);
    }

    #[test]
    fn reset_is_unconditional() {
        let store = AggregationStore::new();
        store.record(vec![
            detection(VehicleCategory::Car),
            detection(VehicleCategory::Bus),
        ]);

        store.reset();
        assert_eq!(store.snapshot(), CountSnapshot::default());
        assert!(store.history(None).is_empty());

        // Resetting an already-empty store holds too.
        store.reset();
        assert_eq!(store.snapshot().total, 0);
    }

    #[test]
    fn history_is_bounded_and_ordered() {
        let store = AggregationStore::with_history_cap(3);
        for _ in 0..5 {
            store.record(vec![detection(VehicleCategory::Car)]);
        }
        store.record(vec![detection(VehicleCategory::Bus)]);

        let history = store.history(None);
        assert_eq!(history.len(), 3);
        // Most recent last.
        assert_eq!(history[2].category, VehicleCategory::Bus);

        // Counts keep the full tally even after eviction.
        assert_eq!(store.snapshot().total, 6);
    }

    #[test]
    fn history_limit_returns_most_recent() {
        let store = AggregationStore::new();
        store.record(vec![
            detection(VehicleCategory::Car),
            detection(VehicleCategory::Bus),
            detection(VehicleCategory::Truck),
        ]);

        let last_two = store.history(Some(2));
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].category, VehicleCategory::Bus);
        assert_eq!(last_two[1].category, VehicleCategory::Truck);

        assert_eq!(store.history(Some(0)).len(), 0);
        assert_eq!(store.history(Some(100)).len(), 3);
    }

    #[test]
    fn concurrent_records_lose_no_updates() {
        let store = Arc::new(AggregationStore::new());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..250 {
                    store.record(vec![
                        detection(VehicleCategory::Car),
                        detection(VehicleCategory::Truck),
                    ]);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("recorder thread");
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.car, 1000);
        assert_eq!(snapshot.truck, 1000);
        assert_eq!(snapshot.total, 2000);
        assert_eq!(snapshot.total, snapshot.category_sum());
    }
}

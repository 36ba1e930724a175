//! The shared observable result record.

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

/// The authoritative local view of one resource query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResult {
    /// Records for the current page, or the accumulated pages in
    /// infinite mode.
    pub data: Vec<Value>,
    /// Server-reported total number of records matching the current
    /// filter.
    pub record_count: u64,
    /// Total page count: server-supplied, or derived as
    /// `ceil(record_count / limit)`.
    pub pages: u64,
    /// 1-based current page.
    pub page: u64,
    /// Page size; the server may override it.
    pub limit: u64,
    /// True while a query is in flight.
    pub loading: bool,
    /// Error from the last query-type operation.
    pub error: Option<String>,
}

impl Default for StoreResult {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            record_count: 0,
            pages: 0,
            page: 1,
            limit: 25,
            loading: false,
            error: None,
        }
    }
}

/// A memoized, observable [`StoreResult`] cell.
///
/// Every `use_store` call with the same memo key shares one instance for
/// the process lifetime; independent UI bindings observe the same
/// synchronized copy. The cell also carries the two sync gates, kept as
/// separate flags: `insync` (has a sync ever completed) and `in_flight`
/// (is a request currently outstanding).
pub struct SharedResult {
    record: RwLock<StoreResult>,
    subscribers: RwLock<Vec<Sender<StoreResult>>>,
    insync: AtomicBool,
    in_flight: AtomicBool,
}

impl SharedResult {
    pub(crate) fn new(initial: StoreResult) -> Self {
        let insync = !initial.data.is_empty();
        Self {
            record: RwLock::new(initial),
            subscribers: RwLock::new(Vec::new()),
            insync: AtomicBool::new(insync),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current record.
    pub fn snapshot(&self) -> StoreResult {
        self.record.read().clone()
    }

    /// Subscribes to record assignments; a snapshot is delivered after
    /// every commit. Disconnected receivers are pruned lazily.
    pub fn subscribe(&self) -> Receiver<StoreResult> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// True once a sync has completed for this record.
    pub fn insync(&self) -> bool {
        self.insync.load(Ordering::SeqCst)
    }

    pub(crate) fn set_insync(&self, insync: bool) {
        self.insync.store(insync, Ordering::SeqCst);
    }

    /// Claims the in-flight gate; false when a request is already
    /// outstanding.
    pub(crate) fn begin_request(&self) -> bool {
        !self.in_flight.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn end_request(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// Mutates the record and notifies subscribers with the committed
    /// snapshot.
    pub(crate) fn update<R>(&self, mutate: impl FnOnce(&mut StoreResult) -> R) -> R {
        let (out, snapshot) = {
            let mut record = self.record.write();
            let out = mutate(&mut record);
            (out, record.clone())
        };
        self.subscribers
            .write()
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_contract() {
        let record = StoreResult::default();
        assert!(record.data.is_empty());
        assert_eq!(record.record_count, 0);
        assert_eq!(record.page, 1);
        assert_eq!(record.limit, 25);
        assert!(!record.loading);
        assert!(record.error.is_none());
    }

    #[test]
    fn empty_initial_data_means_not_in_sync() {
        assert!(!SharedResult::new(StoreResult::default()).insync());
        let seeded = StoreResult {
            data: vec![json!({ "id": 1 })],
            ..StoreResult::default()
        };
        assert!(SharedResult::new(seeded).insync());
    }

    #[test]
    fn subscribers_see_every_commit() {
        let shared = SharedResult::new(StoreResult::default());
        let rx = shared.subscribe();

        shared.update(|r| r.page = 2);
        shared.update(|r| r.page = 3);

        assert_eq!(rx.recv().unwrap().page, 2);
        assert_eq!(rx.recv().unwrap().page, 3);
    }

    #[test]
    fn in_flight_gate_is_exclusive() {
        let shared = SharedResult::new(StoreResult::default());
        assert!(shared.begin_request());
        assert!(!shared.begin_request());
        shared.end_request();
        assert!(shared.begin_request());
    }
}

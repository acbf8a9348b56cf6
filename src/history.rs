//! Optimization history store
//!
//! Append-only record of invocations keyed by process identifier. The store
//! is the only cross-call shared resource in the engine: appends from
//! independent operations run concurrently against a sharded map, so
//! unrelated process ids never contend on one global lock. Records for a
//! single process id keep invocation order; once appended they are never
//! mutated.

use crate::outcome::{OptimizationRecord, ProcessId};
use dashmap::DashMap;
use indexmap::IndexMap;

/// In-memory history store
///
/// Constructed and owned by whoever assembles the engine; swap in a wrapper
/// over persistent storage by feeding History snapshots to a persistence
/// collaborator outside the engine.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: DashMap<ProcessId, Vec<OptimizationRecord>>,
}

impl HistoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record under its process id
    ///
    /// Atomic per record: readers never observe a partially written entry.
    pub fn append(&self, record: OptimizationRecord) {
        self.records
            .entry(record.process_id.clone())
            .or_default()
            .push(record);
    }

    /// Records for one process id, in invocation order
    ///
    /// Unknown ids yield an empty list, not an error.
    pub fn records_for(&self, process_id: &ProcessId) -> Vec<OptimizationRecord> {
        self.records
            .get(process_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Read-only snapshot of every known process id and its records
    ///
    /// Sorted by process id so snapshots are stable for callers.
    pub fn snapshot(&self) -> IndexMap<ProcessId, Vec<OptimizationRecord>> {
        let mut all: Vec<(ProcessId, Vec<OptimizationRecord>)> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all.into_iter().collect()
    }

    /// Number of known process ids
    pub fn process_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{
        OptimizationKind, OptimizationResult, OptimizationStatus,
    };
    use chrono::Utc;

    fn record(pid: &ProcessId, algorithm: &str) -> OptimizationRecord {
        OptimizationRecord {
            process_id: pid.clone(),
            kind: OptimizationKind::Placement,
            algorithm: algorithm.to_string(),
            timestamp: Utc::now(),
            result: OptimizationResult {
                status: OptimizationStatus::Success,
                kind: OptimizationKind::Placement,
                algorithm: algorithm.to_string(),
                payload: None,
                message: None,
            },
        }
    }

    #[test]
    fn unknown_process_id_yields_empty_list() {
        let store = HistoryStore::new();
        let records = store.records_for(&ProcessId::from("unknown-id"));
        assert!(records.is_empty());
    }

    #[test]
    fn records_keep_invocation_order() {
        let store = HistoryStore::new();
        let pid = ProcessId::from("opt-000001");
        store.append(record(&pid, "first"));
        store.append(record(&pid, "second"));
        store.append(record(&pid, "third"));

        let records = store.records_for(&pid);
        let algorithms: Vec<_> = records.iter().map(|r| r.algorithm.as_str()).collect();
        assert_eq!(algorithms, ["first", "second", "third"]);
    }

    #[test]
    fn snapshot_covers_all_process_ids() {
        let store = HistoryStore::new();
        store.append(record(&ProcessId::from("opt-b"), "x"));
        store.append(record(&ProcessId::from("opt-a"), "y"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.process_count(), 2);
        let keys: Vec<_> = snapshot.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["opt-a", "opt-b"]);
    }

    #[test]
    fn concurrent_appends_do_not_interfere() {
        use std::sync::Arc;

        let store = Arc::new(HistoryStore::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let pid = ProcessId::from(format!("opt-{t}").as_str());
                for _ in 0..100 {
                    store.append(record(&pid, "concurrent"));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for t in 0..4 {
            let pid = ProcessId::from(format!("opt-{t}").as_str());
            assert_eq!(store.records_for(&pid).len(), 100);
        }
    }
}

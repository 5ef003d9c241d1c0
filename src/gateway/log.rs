//! Bounded decision log

use std::collections::VecDeque;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{NxdError, Result};
use crate::types::{AdminOverride, DecisionLogEntry, OperationType};

pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug)]
struct LogState {
    entries: VecDeque<DecisionLogEntry>,
    next_id: u64,
}

/// Fixed-capacity FIFO log of gateway decisions.
///
/// Appends are serialized behind one lock; the oldest entry is evicted once
/// the log is full. Ids are assigned at append time and never reused.
#[derive(Debug)]
pub struct DecisionLog {
    capacity: usize,
    state: Mutex<LogState>,
}

impl DecisionLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(LogState {
                entries: VecDeque::with_capacity(capacity),
                next_id: 1,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store `entry` under a fresh id and return that id
    pub fn append(&self, mut entry: DecisionLogEntry) -> u64 {
        let mut state = self.state.lock();

        let id = state.next_id;
        state.next_id += 1;
        entry.id = id;

        if state.entries.len() == self.capacity {
            if let Some(evicted) = state.entries.pop_front() {
                tracing::debug!(id = %evicted.id, "Evicted oldest decision log entry");
            }
        }
        state.entries.push_back(entry);

        id
    }

    /// Up to `limit` most recent entries, oldest first
    pub fn recent(&self, operation: Option<OperationType>, limit: usize) -> Vec<DecisionLogEntry> {
        let state = self.state.lock();

        let mut entries: Vec<DecisionLogEntry> = state
            .entries
            .iter()
            .rev()
            .filter(|e| operation.map_or(true, |op| e.operation == op))
            .take(limit)
            .cloned()
            .collect();
        entries.reverse();
        entries
    }

    pub fn get(&self, id: u64) -> Option<DecisionLogEntry> {
        self.state.lock().entries.iter().find(|e| e.id == id).cloned()
    }

    /// Attach an admin override, replacing any earlier one
    pub fn override_entry(
        &self,
        id: u64,
        decision: Value,
        justification: impl Into<String>,
    ) -> Result<DecisionLogEntry> {
        let mut state = self.state.lock();
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| NxdError::log_entry_not_found(id))?;

        entry.admin_override = Some(AdminOverride {
            timestamp: Utc::now(),
            decision,
            justification: justification.into(),
        });

        Ok(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecisionOutcome, OperationContext, ProviderId};
    use serde_json::json;
    use std::sync::Arc;

    fn entry(operation: OperationType) -> DecisionLogEntry {
        DecisionLogEntry {
            id: 0,
            timestamp: Utc::now(),
            operation,
            provider: Some(ProviderId::Grok),
            outcome: DecisionOutcome::Served,
            context: OperationContext::new(),
            response: "{}".to_string(),
            approval_required: false,
            admin_override: None,
        }
    }

    #[test]
    fn test_ids_are_monotonic() {
        let log = DecisionLog::new(10);
        let a = log.append(entry(OperationType::DomainApproval));
        let b = log.append(entry(OperationType::DomainApproval));
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_fifo_eviction() {
        let log = DecisionLog::new(3);
        for _ in 0..5 {
            log.append(entry(OperationType::FeeAdjustment));
        }
        let ids: Vec<u64> = log.recent(None, 10).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(log.get(2).is_none());
    }

    #[test]
    fn test_recent_filters_and_limits() {
        let log = DecisionLog::new(10);
        log.append(entry(OperationType::UserSupport));
        log.append(entry(OperationType::MarketAnalysis));
        log.append(entry(OperationType::UserSupport));
        log.append(entry(OperationType::UserSupport));

        let support = log.recent(Some(OperationType::UserSupport), 2);
        let ids: Vec<u64> = support.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4]);

        assert!(log.recent(Some(OperationType::AnomalyDetection), 5).is_empty());
        assert!(log.recent(None, 0).is_empty());
    }

    #[test]
    fn test_override() {
        let log = DecisionLog::new(10);
        let id = log.append(entry(OperationType::DomainApproval));

        let updated = log
            .override_entry(id, json!({"approved": false}), "trademark conflict")
            .unwrap();
        let record = updated.admin_override.unwrap();
        assert_eq!(record.justification, "trademark conflict");
        assert_eq!(record.decision["approved"], json!(false));

        let err = log.override_entry(99, json!({}), "nope").unwrap_err();
        assert!(matches!(err, NxdError::LogEntryNotFound { id: 99 }));
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let log = Arc::new(DecisionLog::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        log.append(entry(OperationType::AnomalyDetection));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 400);
        let mut ids: Vec<u64> = log.recent(None, 1000).iter().map(|e| e.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 400);
    }
}

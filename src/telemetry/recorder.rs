//! Call-site instrumentation for guarded external calls.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "kind")]
pub enum CallOutcome {
    Success,
    /// The call ran and failed; carries the error kind.
    Failure(String),
    /// The circuit breaker refused the call.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub operation: String,
    pub duration: Duration,
    pub outcome: CallOutcome,
}

impl CallRecord {
    pub fn new(operation: impl Into<String>, duration: Duration, outcome: CallOutcome) -> Self {
        Self {
            operation: operation.into(),
            duration,
            outcome,
        }
    }
}

/// Receives one record per breaker-guarded call.
pub trait CallRecorder: Send + Sync {
    fn record(&self, record: CallRecord);
}

/// Default recorder (no collection).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl CallRecorder for NoopRecorder {
    fn record(&self, _record: CallRecord) {}
}

/// Keeps the most recent `max_records` records; mainly for tests.
pub struct InMemoryRecorder {
    records: Mutex<VecDeque<CallRecord>>,
    max_records: usize,
}

impl InMemoryRecorder {
    pub fn new(max: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            max_records: max.max(1),
        }
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn records_for(&self, operation: &str) -> Vec<CallRecord> {
        self.lock()
            .iter()
            .filter(|r| r.operation == operation)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<CallRecord>> {
        match self.records.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CallRecorder for InMemoryRecorder {
    fn record(&self, record: CallRecord) {
        let mut records = self.lock();
        records.push_back(record);
        while records.len() > self.max_records {
            records.pop_front();
        }
    }
}

/// Emits each record as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl CallRecorder for TracingRecorder {
    fn record(&self, record: CallRecord) {
        let duration_ms = record.duration.as_secs_f64() * 1000.0;
        match &record.outcome {
            CallOutcome::Success => {
                debug!(operation = %record.operation, duration_ms, "call succeeded")
            }
            CallOutcome::Failure(kind) => {
                warn!(operation = %record.operation, duration_ms, error = %kind, "call failed")
            }
            CallOutcome::Rejected => {
                debug!(operation = %record.operation, "call rejected by open circuit")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_recorder_is_bounded() {
        let rec = InMemoryRecorder::new(2);
        for op in ["a", "b", "c"] {
            rec.record(CallRecord::new(op, Duration::from_millis(1), CallOutcome::Success));
        }
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.records()[0].operation, "b");
        assert_eq!(rec.records_for("c").len(), 1);
        rec.clear();
        assert!(rec.is_empty());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(CallOutcome::Failure("retrieval".into())).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "retrieval");
    }
}

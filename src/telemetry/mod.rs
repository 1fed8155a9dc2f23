//! Telemetry: per-call records and aggregate query metrics.
//!
//! Recording is application-controlled. The service defaults to
//! [`NoopRecorder`]; [`QueryMetrics`] is always kept because `get_stats`
//! reports it.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CallRecorder`] | Receives one [`CallRecord`] per guarded call |
//! | [`NoopRecorder`] | Default, collects nothing |
//! | [`InMemoryRecorder`] | Bounded in-memory buffer for tests |
//! | [`TracingRecorder`] | Emits records as `tracing` events |
//! | [`QueryMetrics`] | Query counts, errors by type, latency avg/p95 |

mod metrics;
mod recorder;

pub use metrics::{MetricsSummary, QueryMetrics};
pub use recorder::{
    CallOutcome, CallRecord, CallRecorder, InMemoryRecorder, NoopRecorder, TracingRecorder,
};

//! Aggregate query metrics reported by `get_stats`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const LATENCY_WINDOW: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub queries_total: u64,
    pub errors_total: u64,
    pub errors_by_type: BTreeMap<String, u64>,
    /// Over the most recent latency window.
    pub latency_avg_ms: f64,
    pub latency_p95_ms: f64,
    pub uptime_secs: u64,
}

#[derive(Default)]
struct Window {
    latencies_ms: VecDeque<f64>,
    errors_by_type: BTreeMap<String, u64>,
}

pub struct QueryMetrics {
    queries_total: AtomicU64,
    errors_total: AtomicU64,
    window: Mutex<Window>,
    started: Instant,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self {
            queries_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            window: Mutex::new(Window::default()),
            started: Instant::now(),
        }
    }

    /// A completed query (including cache hits).
    pub fn record_query(&self, latency: Duration) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        let mut w = self.lock();
        w.latencies_ms.push_back(latency.as_secs_f64() * 1000.0);
        if w.latencies_ms.len() > LATENCY_WINDOW {
            w.latencies_ms.pop_front();
        }
    }

    pub fn record_error(&self, kind: &str) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
        *self.lock().errors_by_type.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        let w = self.lock();
        let n = w.latencies_ms.len();
        let (avg, p95) = if n == 0 {
            (0.0, 0.0)
        } else {
            let mut sorted: Vec<f64> = w.latencies_ms.iter().copied().collect();
            sorted.sort_by(|a, b| a.total_cmp(b));
            // nearest rank
            let idx = ((n as f64 * 0.95).ceil() as usize).clamp(1, n) - 1;
            (sorted.iter().sum::<f64>() / n as f64, sorted[idx])
        };
        MetricsSummary {
            queries_total: self.queries_total.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            errors_by_type: w.errors_by_type.clone(),
            latency_avg_ms: avg,
            latency_p95_ms: p95,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Window> {
        match self.window.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let s = QueryMetrics::new().summary();
        assert_eq!(s.queries_total, 0);
        assert_eq!(s.latency_avg_ms, 0.0);
        assert_eq!(s.latency_p95_ms, 0.0);
    }

    #[test]
    fn test_latency_avg_and_p95() {
        let m = QueryMetrics::new();
        for ms in 1..=100 {
            m.record_query(Duration::from_millis(ms));
        }
        let s = m.summary();
        assert_eq!(s.queries_total, 100);
        assert!((s.latency_avg_ms - 50.5).abs() < 1e-6);
        assert!((s.latency_p95_ms - 95.0).abs() < 1e-6);
    }

    #[test]
    fn test_errors_by_type() {
        let m = QueryMetrics::new();
        m.record_error("circuit_open");
        m.record_error("circuit_open");
        m.record_error("embedding");
        let s = m.summary();
        assert_eq!(s.errors_total, 3);
        assert_eq!(s.errors_by_type["circuit_open"], 2);
        assert_eq!(s.errors_by_type["embedding"], 1);
    }

    #[test]
    fn test_latency_window_is_bounded() {
        let m = QueryMetrics::new();
        for _ in 0..(LATENCY_WINDOW + 10) {
            m.record_query(Duration::from_millis(1));
        }
        assert_eq!(m.lock().latencies_ms.len(), LATENCY_WINDOW);
        assert_eq!(m.summary().queries_total, (LATENCY_WINDOW + 10) as u64);
    }
}

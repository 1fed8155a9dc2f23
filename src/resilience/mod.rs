//! Fault isolation for calls into the document store and search backends.
//!
//! # Resilience Module
//!
//! The vector index and the document store are the slow, failure-prone edge of
//! the pipeline. The [`circuit_breaker`] keeps a persistently failing
//! dependency from turning every query into a timeout:
//!
//! - **Closed**: normal operation, calls pass through
//! - **Open**: failures reached the threshold, calls fail fast
//! - **Half-Open**: cooldown elapsed, a single trial call probes recovery
//!
//! ```rust
//! use rag_retrieval::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let breaker = CircuitBreaker::new(
//!     CircuitBreakerConfig::new()
//!         .with_failure_threshold(3)
//!         .with_cooldown(Duration::from_secs(30)),
//! );
//! let hits: rag_retrieval::Result<usize> = breaker.call(|| async { Ok(42) }).await;
//! assert_eq!(hits.unwrap(), 42);
//! # });
//! ```

pub mod circuit_breaker;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState, CircuitStats,
};

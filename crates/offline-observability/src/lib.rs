//! Observability for the offline request router.
//!
//! This crate provides:
//! - `StructuredLogger` / `LoggingObserver` - Structured log lines for router events
//! - `RouterMetrics` / `MetricsSnapshot` - Per-strategy counters
//! - `init_tracing` - Global `tracing` subscriber for binaries

mod error;
mod logging;
mod metrics;
mod subscriber;

pub use error::*;
pub use logging::*;
pub use metrics::*;
pub use subscriber::*;

pub use offline_core::{RouterEvent, RouterObserver};

//! Telemetry and logging infrastructure
//!
//! Provides structured logging with tracing and tick timing.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, ConsoleFormat, LogConfig, LogError, LogGuard};
pub use metrics::{Summary, TickPhase, TickProfiler, TickStats};

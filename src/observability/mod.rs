//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher produces:
//!     → logging.rs (structured log events, one span per dispatch)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Every dispatch carries a UUID so log lines can be correlated
//! - The library never installs a metrics recorder itself

pub mod logging;
pub mod metrics;

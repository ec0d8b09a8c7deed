//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Submissions, polls and retries produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → Whatever subscriber / recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics exporter
//! - Log verbosity is configuration threaded through constructors, not a global flag

pub mod logging;
pub mod metrics;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, filtered by EnvFilter)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Call traffic:
//!     → rpc::ObserverRegistry
//!         → logging.rs LoggingObserver ("logger")
//!         → metrics.rs MetricsObserver ("metrics")
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Call logging and call metrics are ordinary observers, removable by name
//! - Metric updates are cheap; no exporter installed means they are no-ops

pub mod logging;
pub mod metrics;

pub use logging::LoggingObserver;
pub use metrics::MetricsObserver;

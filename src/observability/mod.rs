//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch pipeline:
//!     → logging.rs (one structured record per request)
//!     → metrics.rs (request counters, latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every dispatch record
//! - Metrics are optional and off by default

pub mod logging;
pub mod metrics;

pub use logging::init_logging;

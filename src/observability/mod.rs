//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding engine and server produce:
//!     → hooks (per-exchange events, session ID)
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Session ID flows through hooks, logs and the upstream request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

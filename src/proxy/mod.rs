//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP server (one task per request)
//!     → engine.rs (authorize, relay, decode for hooks)
//!     → hooks.rs (error / request body / response body observers)
//!     → error.rs (error taxonomy → wire envelope)
//! ```

pub mod engine;
pub mod error;
pub mod hooks;

pub use engine::{build_client, EngineBuilder, ForwardingEngine, UpstreamClient};
pub use error::{ProxyError, UpstreamError};
pub use hooks::{BodyHook, ErrorHook, Hooks};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (exchange context: session ID, deadline)
//!     → [forwarding engine authorizes and relays]
//!     → sink.rs (status/header commit, body buffer)
//!     → response.rs (JSON error envelopes)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod sink;

pub use request::{ExchangeContext, SessionId, X_REQUEST_ID};
pub use response::{ErrorBody, ResponseWriter, WriteError};
pub use server::HttpServer;
pub use sink::{BufferedResponse, ResponseSink};

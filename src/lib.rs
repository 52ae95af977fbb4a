//! Gated single-upstream reverse proxy library.
//!
//! Every inbound request is checked against a route table, relayed to one
//! fixed upstream with fully buffered bodies, and reported to optional hooks
//! under a per-exchange session ID.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{ForwardingEngine, Hooks, ProxyError};
pub use routing::RouteTable;

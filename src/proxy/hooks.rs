//! Observer callbacks for forwarded exchanges.
//!
//! All hooks are optional. They run inline on the request task, so a hook that
//! blocks stalls its exchange.

use std::fmt;
use std::sync::Arc;

use crate::http::request::ExchangeContext;
use crate::proxy::error::ProxyError;

/// Receives every error of an exchange, including ones answered gracefully.
pub type ErrorHook = Arc<dyn Fn(&ExchangeContext, &ProxyError) + Send + Sync>;

/// Receives a captured body.
pub type BodyHook = Arc<dyn Fn(&ExchangeContext, &[u8]) + Send + Sync>;

/// The three optional hooks of a forwarding engine.
#[derive(Clone, Default)]
pub struct Hooks {
    on_error: Option<ErrorHook>,
    on_request_body: Option<BodyHook>,
    on_response_body: Option<BodyHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExchangeContext, &ProxyError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn on_request_body<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExchangeContext, &[u8]) + Send + Sync + 'static,
    {
        self.on_request_body = Some(Arc::new(hook));
        self
    }

    pub fn on_response_body<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExchangeContext, &[u8]) + Send + Sync + 'static,
    {
        self.on_response_body = Some(Arc::new(hook));
        self
    }

    pub(crate) fn error(&self, ctx: &ExchangeContext, error: &ProxyError) {
        if let Some(hook) = &self.on_error {
            hook(ctx, error);
        }
    }

    pub(crate) fn request_body(&self, ctx: &ExchangeContext, body: &[u8]) {
        if let Some(hook) = &self.on_request_body {
            hook(ctx, body);
        }
    }

    pub(crate) fn response_body(&self, ctx: &ExchangeContext, body: &[u8]) {
        if let Some(hook) = &self.on_response_body {
            hook(ctx, body);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_error", &self.on_error.is_some())
            .field("on_request_body", &self.on_request_body.is_some())
            .field("on_response_body", &self.on_response_body.is_some())
            .finish()
    }
}

//! JSON response writing.
//!
//! # Responsibilities
//! - Serialize a value and write it as an `application/json` response
//! - Hand the exact written bytes back so they can be reported to hooks
//!
//! # Design Decisions
//! - Serialization happens before anything touches the sink, so a value that
//!   cannot be encoded leaves the response untouched
//! - A failed body write is final: status and headers are already committed

use std::io;

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
};
use serde::Serialize;
use thiserror::Error;

use crate::http::sink::ResponseSink;

/// Errors raised while writing a JSON response.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The value could not be represented as JSON. Nothing was written.
    #[error("unable to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport rejected the body after the status was committed.
    #[error("unable to write response body: {0}")]
    Write(#[from] io::Error),
}

/// Body shape of every error the proxy answers with itself.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody<'a> {
    pub message: &'a str,
}

/// Writes JSON payloads onto a [`ResponseSink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseWriter;

impl ResponseWriter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize `value`, then commit `status` with a JSON content type and
    /// write the bytes. Returns exactly what was written.
    pub fn write_json<T>(
        &self,
        sink: &mut dyn ResponseSink,
        status: StatusCode,
        value: &T,
    ) -> Result<Bytes, WriteError>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(value)?;

        sink.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        sink.write_status(status);
        sink.write(&payload)?;

        Ok(Bytes::from(payload))
    }
}

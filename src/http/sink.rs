//! The response channel the forwarding engine writes into.
//!
//! # Responsibilities
//! - Hold response headers until the status line is committed
//! - Commit status exactly once (explicitly, or implicitly on first body write)
//! - Accept body writes, which may fail on a broken transport
//!
//! # Design Decisions
//! - Header edits after commit are silently dropped, like a real connection
//! - A second status write is a logged no-op, never an error
//! - `BufferedResponse` collects everything and hands axum a finished response

use std::io;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, StatusCode},
    response::Response,
};

/// Destination for one exchange's response.
pub trait ResponseSink: Send {
    /// Mutable access to the pending response headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and the current headers.
    fn write_status(&mut self, status: StatusCode);

    /// Append body bytes, committing `200 OK` first if nothing was committed.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Whether status and headers have already been sent.
    fn is_committed(&self) -> bool;
}

/// An in-memory sink that turns into an axum [`Response`].
#[derive(Debug, Default)]
pub struct BufferedResponse {
    headers: HeaderMap,
    head: Option<(StatusCode, HeaderMap)>,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.head.as_ref().map(|(status, _)| *status)
    }

    /// Headers as they were at commit time.
    pub fn committed_headers(&self) -> Option<&HeaderMap> {
        self.head.as_ref().map(|(_, headers)| headers)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into the response handed back to the client.
    ///
    /// An exchange that never committed anything is answered with an empty `200 OK`.
    pub fn into_response(self) -> Response {
        let (status, headers) = self
            .head
            .unwrap_or((StatusCode::OK, self.headers));

        let mut response = Response::new(Body::from(Bytes::from(self.body)));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    fn commit(&mut self, status: StatusCode) {
        self.head = Some((status, self.headers.clone()));
    }
}

impl ResponseSink for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        if let Some((committed, _)) = &self.head {
            tracing::warn!(
                committed = %committed,
                requested = %status,
                "Superfluous status write ignored"
            );
            return;
        }
        self.commit(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.head.is_none() {
            self.commit(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn is_committed(&self) -> bool {
        self.head.is_some()
    }
}

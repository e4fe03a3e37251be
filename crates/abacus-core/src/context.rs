//! Request context types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique, time-ordered request identifier (UUID v7).
///
/// # Example
///
/// ```
/// use abacus_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(RequestId::parse(&id.to_string()), Some(id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a request ID supplied by a client, e.g. from `x-request-id`.
    ///
    /// Returns `None` unless the value is a valid UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-request state handed to handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    operation_id: Option<String>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            operation_id: None,
            started_at: Instant::now(),
        }
    }

    /// Sets the operation ID of the matched route.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the operation ID, if a route was matched.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Returns the time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let first = RequestId::new();
        let second = RequestId::new();
        assert_ne!(first, second);
        assert_eq!(first.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_request_id_parse() {
        assert!(RequestId::parse("not-a-uuid").is_none());
        assert!(RequestId::parse(" 0190b5d4-7d6c-7b6e-8a4f-3c2d1e0f9a8b ").is_some());
    }

    #[test]
    fn test_context_operation_id() {
        let ctx = RequestContext::new();
        assert!(ctx.operation_id().is_none());

        let ctx = ctx.with_operation_id("calculate");
        assert_eq!(ctx.operation_id(), Some("calculate"));
    }

    #[test]
    fn test_context_keeps_request_id() {
        let id = RequestId::new();
        let ctx = RequestContext::with_request_id(id);
        assert_eq!(ctx.request_id(), id);
    }
}

//! Request context for the stock pipeline.
//!
//! [`RequestContext`] is the context type the handlers in
//! [`stages`](crate::stages) operate on. The dispatcher itself is generic and
//! does not require it; any `Send + 'static` type can serve as a context.

use http::{Method, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use strata_core::RequestId;

/// Mutable state for one request flowing through the stock pipeline.
///
/// Header names are stored lowercased, so lookups are case-insensitive.
///
/// # Example
///
/// ```
/// use http::Method;
/// use serde_json::json;
/// use strata_middleware::RequestContext;
///
/// let ctx = RequestContext::new(Method::POST, "/api/users")
///     .with_header("Authorization", "Bearer valid-token-123")
///     .with_body(json!({ "name": "John Doe" }));
///
/// assert_eq!(ctx.header("authorization"), Some("Bearer valid-token-123"));
/// assert_eq!(ctx.body_str("name"), Some("John Doe"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
    query: BTreeMap<String, String>,
    request_id: RequestId,
    started_at: Instant,
    user_id: Option<u64>,
    user_role: Option<String>,
    request_count: u32,
    logs: Vec<String>,
    status: Option<StatusCode>,
    response: Option<Value>,
}

impl RequestContext {
    /// Creates a context for `method` and `path` with a fresh request ID.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            query: BTreeMap::new(),
            request_id: RequestId::new(),
            started_at: Instant::now(),
            user_id: None,
            user_role: None,
            request_count: 0,
            logs: Vec::new(),
            status: None,
            response: None,
        }
    }

    /// Adds a header. The name is lowercased.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Sets the JSON request body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Seeds the request counter, e.g. from a per-client store.
    #[must_use]
    pub fn with_request_count(mut self, count: u32) -> Self {
        self.request_count = count;
        self
    }

    /// Uses an upstream-assigned request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a header by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns all headers, keyed by lowercased name.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Inserts or replaces a header.
    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Returns the request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns a top-level field of the body.
    #[must_use]
    pub fn body_field(&self, field: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get(field))
    }

    /// Returns a top-level body field if it is a string.
    #[must_use]
    pub fn body_str(&self, field: &str) -> Option<&str> {
        self.body_field(field).and_then(Value::as_str)
    }

    /// Returns a query parameter.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Resets the start instant to now.
    pub fn mark_started(&mut self) {
        self.started_at = Instant::now();
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the authenticated user ID, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Returns the authenticated user's role, if any.
    #[must_use]
    pub fn user_role(&self) -> Option<&str> {
        self.user_role.as_deref()
    }

    /// Records the authenticated principal.
    pub fn set_user(&mut self, user_id: u64, role: impl Into<String>) {
        self.user_id = Some(user_id);
        self.user_role = Some(role.into());
    }

    /// Returns the number of requests counted so far.
    #[must_use]
    pub fn request_count(&self) -> u32 {
        self.request_count
    }

    /// Counts this request and returns the new total.
    pub fn increment_request_count(&mut self) -> u32 {
        self.request_count = self.request_count.saturating_add(1);
        self.request_count
    }

    /// Appends a log line.
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// Returns the log lines recorded so far, oldest first.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Returns the response status, if one was set.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Sets the response status without touching the payload.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Returns the response payload, if one was set.
    #[must_use]
    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    /// Sets both the response status and payload.
    pub fn respond(&mut self, status: StatusCode, payload: Value) {
        self.status = Some(status);
        self.response = Some(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut ctx = RequestContext::new(Method::GET, "/").with_header("X-Client", "a");
        assert_eq!(ctx.header("x-client"), Some("a"));
        assert_eq!(ctx.header("X-CLIENT"), Some("a"));

        ctx.insert_header("x-CLIENT", "b");
        assert_eq!(ctx.headers().len(), 1);
        assert_eq!(ctx.header("X-Client"), Some("b"));
    }

    #[test]
    fn test_body_access() {
        let ctx = RequestContext::new(Method::POST, "/api/users")
            .with_body(json!({ "name": "Ada", "age": 36 }));

        assert_eq!(ctx.body_str("name"), Some("Ada"));
        assert_eq!(ctx.body_field("age"), Some(&json!(36)));
        assert_eq!(ctx.body_str("age"), None);
        assert_eq!(ctx.body_field("missing"), None);
    }

    #[test]
    fn test_fresh_context_has_no_outcome() {
        let ctx = RequestContext::new(Method::GET, "/");
        assert_eq!(ctx.status(), None);
        assert!(ctx.response().is_none());
        assert!(ctx.logs().is_empty());
        assert_eq!(ctx.user_id(), None);
        assert_eq!(ctx.request_count(), 0);
    }

    #[test]
    fn test_request_counter_and_user() {
        let mut ctx = RequestContext::new(Method::GET, "/").with_request_count(9);
        assert_eq!(ctx.increment_request_count(), 10);

        ctx.set_user(42, "admin");
        assert_eq!(ctx.user_id(), Some(42));
        assert_eq!(ctx.user_role(), Some("admin"));
    }

    #[test]
    fn test_respond_sets_status_and_payload() {
        let mut ctx = RequestContext::new(Method::GET, "/");
        ctx.respond(StatusCode::OK, json!({ "ok": true }));
        assert_eq!(ctx.status(), Some(StatusCode::OK));
        assert_eq!(ctx.response(), Some(&json!({ "ok": true })));
    }

    #[test]
    fn test_query_and_request_id() {
        let id = RequestId::new();
        let ctx = RequestContext::new(Method::GET, "/search")
            .with_query("q", "rust")
            .with_request_id(id);
        assert_eq!(ctx.query("q"), Some("rust"));
        assert_eq!(ctx.query("page"), None);
        assert_eq!(ctx.request_id(), id);
    }
}

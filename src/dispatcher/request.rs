use std::sync::Arc;

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

use crate::context::strip_port;
use crate::ids::RequestId;
use crate::pattern::ParamVec;
use crate::router::HandlerId;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage; names are `Arc<str>` because the same few names repeat.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A request as seen by middleware and controllers.
///
/// The dispatcher fills `path_params`, `route_name` and `handler` once a
/// route has matched; before that they are empty.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Correlation id for log lines of this request
    pub request_id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Raw query string (without `?`)
    pub query: Option<String>,
    /// `Host` of the request, without port
    pub host: Option<String>,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Parsed JSON body, if any
    pub body: Option<Value>,
    /// Parameters extracted by the matched route, in declaration order
    pub path_params: ParamVec,
    /// Name of the matched route
    pub route_name: Option<String>,
    /// Target of the matched route
    pub handler: Option<HandlerId>,
}

impl HandlerRequest {
    /// Build a request from a method and a request target (`/path?query`).
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let target = target.split_once('#').map_or(target, |(before, _)| before);
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query,
            host: None,
            headers: HeaderVec::new(),
            body: None,
            path_params: ParamVec::new(),
            route_name: None,
            handler: None,
        }
    }

    /// Set the host; a `:port` suffix is dropped.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(strip_port(host).to_ascii_lowercase());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics if a name was extracted twice
    /// (domain and path declaring the same placeholder).
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response produced by a controller or by a short-circuiting middleware.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body; `Value::Null` means no body
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response without body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_null()
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

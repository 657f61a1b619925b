//! Request-scoped context passed explicitly into dispatch and URL generation.

use std::collections::HashSet;

use crate::config::RouterConfig;
use crate::dispatcher::HandlerRequest;
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Everything the routing core needs to know about the current request that
/// is not part of the request line itself.
///
/// There is no ambient or global context; callers build one per request and
/// pass it by reference.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    scheme: String,
    host: Option<String>,
    grants: HashSet<String>,
    debug: bool,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            request_id: RequestId::new(),
            scheme: "http".to_string(),
            host: None,
            grants: HashSet::new(),
            debug: false,
        }
    }
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed scheme and host from the router configuration.
    #[must_use]
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            scheme: config.default_scheme.clone(),
            host: config.default_host.clone(),
            ..Self::default()
        }
    }

    /// Context for an incoming request.
    ///
    /// Reuses the caller's `x-request-id` when it holds a valid id and takes
    /// the request's host, falling back to the configured default host.
    #[must_use]
    pub fn for_request(config: &RouterConfig, req: &HandlerRequest) -> Self {
        let mut ctx = Self::from_config(config)
            .with_request_id(RequestId::from_header_or_new(req.get_header(REQUEST_ID_HEADER)));
        if let Some(host) = &req.host {
            ctx.host = Some(host.clone());
        }
        ctx
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_ascii_lowercase();
        self
    }

    /// Current host, lowercased and without a port.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(strip_port(host).to_ascii_lowercase());
        self
    }

    /// Add a permission granted to the current caller.
    #[must_use]
    pub fn grant(mut self, permission: &str) -> Self {
        self.grants.insert(permission.to_string());
        self
    }

    /// Attach `x-route-*` debug headers to dispatched responses.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn has_grant(&self, permission: &str) -> bool {
        self.grants.contains(permission)
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }
}

/// Drop a numeric `:port` suffix; IPv6 literals without a port are left alone.
pub(crate) fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    }
}

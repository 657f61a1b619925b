//! Dispatcher core: route lookup, pipeline assembly and handler invocation.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, warn};

use super::{
    Authorization, Authorizer, HandlerRequest, HandlerResolver, HandlerResponse, ResponseSink,
};
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::middleware::Pipeline;
use crate::router::{Route, RouteTable};

/// Debug header naming the matched route template.
pub const ROUTE_DEBUG_HEADER: &str = "x-route-pattern";
/// Debug header naming the invoked handler.
pub const HANDLER_DEBUG_HEADER: &str = "x-route-handler";

/// Runs requests against a sealed [`RouteTable`].
///
/// The dispatcher holds no per-request state; everything request-scoped comes
/// in through the [`RequestContext`] argument. Cloning is cheap (the table is
/// shared).
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    authorizer: Option<Arc<dyn Authorizer>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            authorizer: None,
        }
    }

    /// Consult `authorizer` before every controller invocation.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Dispatch one request and send exactly one response through `sink`.
    ///
    /// 1. The first route (registration order) matching method, host and path wins.
    /// 2. The route's middleware is folded around the terminal handler, which
    ///    resolves the controller, runs the authorizer and calls the action with
    ///    the matched parameters in declaration order.
    /// 3. The resulting response is sent and also returned.
    ///
    /// Errors from middleware, controllers, the resolver, the authorizer or the
    /// sink come back unchanged as [`DispatchError::Downstream`].
    pub fn dispatch(
        &self,
        mut req: HandlerRequest,
        ctx: &RequestContext,
        resolver: &dyn HandlerResolver,
        sink: &mut dyn ResponseSink,
    ) -> Result<HandlerResponse, DispatchError> {
        let uri = normalize_uri(&req.path);
        let method = req.method.as_str().to_string();
        let host = req.host.clone().or_else(|| ctx.host().map(str::to_string));

        let Some(matched) = self.table.find(&uri, &method, host.as_deref()) else {
            warn!(
                request_id = %ctx.request_id(),
                method = %method,
                path = %uri,
                host = ?host,
                "Route not found"
            );
            return Err(DispatchError::RouteNotFound { uri, method });
        };
        let route = matched.route;

        if !resolver.exists(route.target().controller()) {
            warn!(
                request_id = %ctx.request_id(),
                handler = %route.target(),
                "Handler not registered"
            );
            return Err(DispatchError::HandlerNotFound {
                handler: route.target().controller().to_string(),
            });
        }

        req.request_id = ctx.request_id();
        req.path = uri;
        req.path_params = matched.params;
        req.route_name = route.name().map(str::to_string);
        req.handler = Some(route.target().clone());

        let terminal = |req: HandlerRequest| self.invoke(route, req, ctx, resolver);
        let start = Instant::now();
        let mut response = if route.middleware().is_empty() {
            terminal(req)?
        } else {
            debug!(
                request_id = %ctx.request_id(),
                middleware_count = route.middleware().len(),
                "Running middleware pipeline"
            );
            Pipeline::new(route.middleware()).run(req, terminal)?
        };

        if ctx.debug() {
            response.set_header(ROUTE_DEBUG_HEADER, route.pattern().raw().to_string());
            response.set_header(HANDLER_DEBUG_HEADER, route.target().to_string());
        }

        info!(
            request_id = %ctx.request_id(),
            handler = %route.target(),
            status = response.status,
            latency_us = start.elapsed().as_micros() as u64,
            "Request dispatched"
        );

        sink.send(&response)?;
        Ok(response)
    }

    fn invoke(
        &self,
        route: &Route,
        req: HandlerRequest,
        ctx: &RequestContext,
        resolver: &dyn HandlerResolver,
    ) -> Result<HandlerResponse> {
        let target = route.target();
        let controller = resolver.resolve(target.controller())?;

        if let Some(authorizer) = &self.authorizer {
            if let Authorization::Denied(resp) = authorizer.authorize(target, &req.path_params, ctx)? {
                warn!(
                    request_id = %ctx.request_id(),
                    handler = %target,
                    status = resp.status,
                    "Authorization denied"
                );
                return Ok(resp);
            }
        }

        let args: Vec<&str> = req.path_params.iter().map(|(_, v)| v.as_str()).collect();
        debug!(
            request_id = %ctx.request_id(),
            handler = %target,
            args = ?args,
            "Invoking handler"
        );
        let output = controller.call(target.action(), &req, &args)?;
        Ok(output.into_response())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.len())
            .field("authorizer", &self.authorizer.is_some())
            .finish()
    }
}

/// Drop query/fragment and a trailing `/` (except for the root).
#[must_use]
pub fn normalize_uri(uri: &str) -> String {
    let path = uri
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

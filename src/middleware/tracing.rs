use std::time::Instant;

use anyhow::Result;
use tracing::{field, info_span, warn};

use super::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Opens a `request` span around the remainder of the chain and records the
/// final status and latency on it.
///
/// Place it first in a route's middleware list so the span also covers the
/// other layers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, req: HandlerRequest, next: Next<'_>) -> Result<HandlerResponse> {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            handler = req.handler.as_ref().map(ToString::to_string).as_deref().unwrap_or("-"),
            status = field::Empty,
            latency_us = field::Empty,
        );
        let _entered = span.enter();
        let start = Instant::now();

        let result = next.run(req);

        span.record("latency_us", start.elapsed().as_micros() as u64);
        match &result {
            Ok(resp) => {
                span.record("status", resp.status);
            }
            Err(err) => {
                warn!(error = %err, "Request failed downstream");
            }
        }
        result
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

use std::collections::HashMap;

use anyhow::Result;
use serde_json::json;

use super::HandlerResponse;
use crate::context::RequestContext;
use crate::pattern::ParamVec;
use crate::router::HandlerId;

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    Allowed,
    /// Refused; the response is sent instead of invoking the handler
    Denied(HandlerResponse),
}

/// Hook consulted right before a controller action runs.
pub trait Authorizer: Send + Sync {
    fn authorize(
        &self,
        handler: &HandlerId,
        params: &ParamVec,
        ctx: &RequestContext,
    ) -> Result<Authorization>;
}

/// Permission side-table keyed by handler id, filled during bootstrap.
///
/// Requirements can target a whole controller (`"UserController"`) or one
/// action (`"UserController@destroy"`); both apply. A request is allowed when
/// its context holds every required permission.
#[derive(Debug, Clone)]
pub struct GrantTable {
    required: HashMap<String, Vec<String>>,
    deny_status: u16,
}

impl Default for GrantTable {
    fn default() -> Self {
        Self {
            required: HashMap::new(),
            deny_status: 403,
        }
    }
}

impl GrantTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Status used for denial responses (default 403).
    #[must_use]
    pub fn deny_status(mut self, status: u16) -> Self {
        self.deny_status = status;
        self
    }

    /// Require `permission` for `target` (controller or `Controller@action`).
    #[must_use]
    pub fn require(mut self, target: &str, permission: &str) -> Self {
        self.required
            .entry(target.to_string())
            .or_default()
            .push(permission.to_string());
        self
    }

    /// All permissions `handler` needs.
    #[must_use]
    pub fn requirements(&self, handler: &HandlerId) -> Vec<&str> {
        let controller_wide = self.required.get(handler.controller());
        let action = self.required.get(&handler.to_string());
        controller_wide
            .into_iter()
            .chain(action)
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

impl Authorizer for GrantTable {
    fn authorize(
        &self,
        handler: &HandlerId,
        _params: &ParamVec,
        ctx: &RequestContext,
    ) -> Result<Authorization> {
        let missing: Vec<&str> = self
            .requirements(handler)
            .into_iter()
            .filter(|perm| !ctx.has_grant(perm))
            .collect();
        if missing.is_empty() {
            return Ok(Authorization::Allowed);
        }
        Ok(Authorization::Denied(HandlerResponse::json(
            self.deny_status,
            json!({ "error": "Forbidden", "missing": missing }),
        )))
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::Value;

use super::{HandlerRequest, HandlerResponse};

/// What a controller action may return.
///
/// Anything other than a full response is turned into an empty `200`.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    Response(HandlerResponse),
    Value(Value),
    Empty,
}

impl HandlerOutput {
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        match self {
            HandlerOutput::Response(resp) => resp,
            HandlerOutput::Value(_) | HandlerOutput::Empty => HandlerResponse::empty(200),
        }
    }
}

impl From<HandlerResponse> for HandlerOutput {
    fn from(resp: HandlerResponse) -> Self {
        HandlerOutput::Response(resp)
    }
}

impl From<Value> for HandlerOutput {
    fn from(value: Value) -> Self {
        HandlerOutput::Value(value)
    }
}

impl From<()> for HandlerOutput {
    fn from((): ()) -> Self {
        HandlerOutput::Empty
    }
}

/// A controller instance whose actions are invoked by name.
///
/// `args` holds the matched route parameters in declaration order, the
/// positional equivalent of the parameter list on the request.
pub trait Controller: Send + Sync {
    fn call(&self, action: &str, req: &HandlerRequest, args: &[&str]) -> Result<HandlerOutput>;
}

/// Supplies controller instances by name (typically backed by a DI container).
pub trait HandlerResolver {
    fn resolve(&self, controller: &str) -> Result<Arc<dyn Controller>>;
    fn exists(&self, controller: &str) -> bool;
}

type Action = Box<dyn Fn(&HandlerRequest, &[&str]) -> Result<HandlerOutput> + Send + Sync>;

/// A controller assembled from closures, one per action.
#[derive(Default)]
pub struct ActionController {
    actions: HashMap<String, Action>,
}

impl ActionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an action.
    #[must_use]
    pub fn action<F, O>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&HandlerRequest, &[&str]) -> Result<O> + Send + Sync + 'static,
        O: Into<HandlerOutput>,
    {
        let action: Action = Box::new(move |req: &HandlerRequest, args: &[&str]| {
            f(req, args).map(Into::<HandlerOutput>::into)
        });
        self.actions.insert(name.to_string(), action);
        self
    }
}

impl Controller for ActionController {
    fn call(&self, action: &str, req: &HandlerRequest, args: &[&str]) -> Result<HandlerOutput> {
        let f = self
            .actions
            .get(action)
            .ok_or_else(|| anyhow!("action '{action}' is not defined"))?;
        f(req, args)
    }
}

/// In-memory [`HandlerResolver`] keyed by controller name.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller under `name`; replaces any previous entry.
    pub fn register(&mut self, name: &str, controller: Arc<dyn Controller>) {
        if self
            .controllers
            .insert(name.to_string(), controller)
            .is_some()
        {
            tracing::warn!(controller = %name, "Replaced existing controller");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl HandlerResolver for ControllerRegistry {
    fn resolve(&self, controller: &str) -> Result<Arc<dyn Controller>> {
        self.controllers
            .get(controller)
            .cloned()
            .ok_or_else(|| anyhow!("controller '{controller}' is not registered"))
    }

    fn exists(&self, controller: &str) -> bool {
        self.controllers.contains_key(controller)
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use super::{Middleware, Next, TracingMiddleware};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::RouteError;

/// Alias table used when routes reference middleware by name (route manifests).
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, Arc<dyn Middleware>>,
    lenient: bool,
}

impl MiddlewareRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the bundled middleware (`trace`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("trace", Arc::new(TracingMiddleware));
        registry
    }

    /// Resolve unknown aliases to a pass-through layer instead of failing.
    ///
    /// Meant for tooling that inspects a manifest without the application's
    /// middleware implementations at hand.
    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn register(&mut self, alias: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.entries.insert(alias.into(), middleware);
    }

    #[must_use]
    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn resolve(&self, alias: &str) -> Result<Arc<dyn Middleware>, RouteError> {
        match self.entries.get(alias) {
            Some(mw) => Ok(Arc::clone(mw)),
            None if self.lenient => Ok(Arc::new(AliasOnly {
                alias: alias.to_string(),
            })),
            None => Err(RouteError::UnknownMiddleware {
                alias: alias.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut aliases: Vec<&String> = self.entries.keys().collect();
        aliases.sort();
        f.debug_struct("MiddlewareRegistry")
            .field("aliases", &aliases)
            .field("lenient", &self.lenient)
            .finish()
    }
}

/// Stand-in for an alias with no implementation; forwards to `next`.
struct AliasOnly {
    alias: String,
}

impl Middleware for AliasOnly {
    fn handle(&self, req: HandlerRequest, next: Next<'_>) -> Result<HandlerResponse> {
        next.run(req)
    }

    fn name(&self) -> &str {
        &self.alias
    }
}

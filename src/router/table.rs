use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use http::Method;
use tracing::{debug, info, warn};

use super::group::{join_path, RouteGroup};
use super::route::{compile_constraints, parse_methods, HandlerId, Route, RouteDefinition};
use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::pattern::{CompiledPattern, ParamVec};

/// Result of a successful lookup: the winning route and its parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch<'t> {
    pub route: &'t Route,
    /// Domain parameters first, then path parameters, in declaration order
    pub params: ParamVec,
}

impl RouteMatch<'_> {
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Bootstrap-time route registry.
///
/// Routes are added against the group currently on top of the stack and
/// validated as they arrive, so a bad template or a duplicate name fails at
/// the `add` call that introduced it. [`RouteCollector::seal`] hands the
/// routes over to an immutable [`RouteTable`].
#[derive(Default)]
pub struct RouteCollector {
    routes: Vec<Route>,
    names: HashMap<String, usize>,
    groups: Vec<RouteGroup>,
}

impl RouteCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group currently applied to new routes (the merge of every open group).
    #[must_use]
    pub fn current_group(&self) -> Option<&RouteGroup> {
        self.groups.last()
    }

    /// Register routes inside `attrs`, merged with any enclosing group.
    ///
    /// The group is popped again when `body` returns, including on error.
    pub fn group<F>(&mut self, attrs: RouteGroup, body: F) -> Result<(), RouteError>
    where
        F: FnOnce(&mut RouteCollector) -> Result<(), RouteError>,
    {
        let merged = match self.groups.last() {
            Some(parent) => attrs.merge_with(parent),
            None => attrs,
        };
        debug!(
            prefix = %merged.get_prefix(),
            namespace = ?merged.get_namespace(),
            domain = ?merged.get_domain(),
            depth = self.groups.len() + 1,
            "Entering route group"
        );
        self.groups.push(merged);
        let result = body(self);
        self.groups.pop();
        result
    }

    /// Compile `def` under the active group and append it.
    pub fn add(&mut self, def: RouteDefinition) -> Result<&Route, RouteError> {
        let group = self.groups.last();
        let template = match group {
            Some(g) => join_path(g.get_prefix(), &def.path),
            None => join_path("", &def.path),
        };

        if let Some(name) = &def.name {
            if let Some(&existing) = self.names.get(name) {
                return Err(RouteError::DuplicateName {
                    name: name.clone(),
                    existing: self.routes[existing].pattern.raw().to_string(),
                });
            }
        }

        let methods = parse_methods(&def.methods, &template)?;
        let pattern =
            CompiledPattern::path(&template).map_err(|e| RouteError::pattern(&template, e))?;

        let domain_template = def
            .domain
            .as_deref()
            .or_else(|| group.and_then(RouteGroup::get_domain));
        let domain = domain_template
            .map(|d| CompiledPattern::domain(d).map_err(|e| RouteError::pattern(d, e)))
            .transpose()?;

        let extra_constraints = compile_constraints(&def.constraints, &template)?;

        let mut middleware = group
            .map(|g| g.get_middleware().to_vec())
            .unwrap_or_default();
        middleware.extend(def.middleware);

        let target = HandlerId::qualified(&def.target, group.and_then(RouteGroup::get_namespace));

        let route = Route {
            pattern,
            methods,
            target,
            name: def.name,
            domain,
            middleware,
            extra_constraints,
        };
        debug!(
            pattern = %route.pattern.raw(),
            handler = %route.target,
            name = ?route.name,
            "Route registered"
        );

        let index = self.routes.len();
        if let Some(name) = &route.name {
            self.names.insert(name.clone(), index);
        }
        self.routes.push(route);
        Ok(&self.routes[index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freeze the routes with default settings.
    #[must_use]
    pub fn seal(self) -> RouteTable {
        self.seal_with(&RouterConfig::default())
    }

    /// Freeze the routes, taking matching thresholds from `config`.
    #[must_use]
    pub fn seal_with(self, config: &RouterConfig) -> RouteTable {
        let table = RouteTable {
            routes: self.routes,
            names: self.names,
            slow_match: config.slow_match_threshold(),
        };

        let routes_summary: Vec<String> = table
            .routes
            .iter()
            .take(10)
            .map(|r| {
                let methods: Vec<&str> = r.methods.iter().map(Method::as_str).collect();
                format!("{} {}", methods.join("|"), r.pattern.raw())
            })
            .collect();
        info!(
            routes_count = table.routes.len(),
            named_routes = table.names.len(),
            routes_summary = ?routes_summary,
            "Routing table sealed"
        );
        if config.log_route_table {
            for route in &table.routes {
                info!(route = %route, "Route");
            }
        }
        table
    }
}

impl fmt::Debug for RouteCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCollector")
            .field("routes", &self.routes.len())
            .field("group_depth", &self.groups.len())
            .finish()
    }
}

/// Immutable, shareable routing table.
///
/// Lookup is a linear scan in registration order; the first route whose
/// method, domain, path and constraints all fit wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    names: HashMap<String, usize>,
    slow_match: Duration,
}

impl RouteTable {
    /// Find the route for a request.
    #[must_use]
    pub fn find(&self, uri: &str, method: &str, host: Option<&str>) -> Option<RouteMatch<'_>> {
        debug!(method = %method, path = %uri, host = ?host, "Route match attempt");
        let start = Instant::now();

        let found = self
            .routes
            .iter()
            .find_map(|route| route.matches(uri, method, host).map(|params| (route, params)));

        let elapsed = start.elapsed();
        match found {
            Some((route, params)) => {
                if elapsed > self.slow_match {
                    warn!(
                        method = %method,
                        path = %uri,
                        route_pattern = %route.pattern.raw(),
                        handler = %route.target,
                        duration_us = elapsed.as_micros() as u64,
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        method = %method,
                        path = %uri,
                        route_pattern = %route.pattern.raw(),
                        handler = %route.target,
                        path_params = ?params,
                        duration_us = elapsed.as_micros() as u64,
                        "Route matched"
                    );
                }
                Some(RouteMatch { route, params })
            }
            None => {
                debug!(
                    method = %method,
                    path = %uri,
                    duration_us = elapsed.as_micros() as u64,
                    "No route matched"
                );
                None
            }
        }
    }

    /// Methods of every route whose domain and path fit, in first-seen order.
    ///
    /// Empty when nothing matches the location at all; callers use a
    /// non-empty result to answer `405` instead of `404`.
    #[must_use]
    pub fn allowed_methods(&self, uri: &str, host: Option<&str>) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.matches_location(uri, host).is_some() {
                for m in route.methods() {
                    if !methods.contains(m) {
                        methods.push(m.clone());
                    }
                }
            }
        }
        methods
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.names.get(name).map(|&idx| &self.routes[idx])
    }

    #[must_use]
    pub fn has_route(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[routes] count={}", self.routes.len())?;
        for route in &self.routes {
            writeln!(f, "{route}")?;
        }
        Ok(())
    }
}

use std::fmt;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use smallvec::SmallVec;

use crate::error::{PatternError, RouteError};
use crate::middleware::Middleware;
use crate::pattern::{CompiledPattern, ParamVec};

/// Action invoked when a target names only a controller.
pub const DEFAULT_ACTION: &str = "__invoke";

/// Typed route target: a controller name plus the action to call on it.
///
/// Written as `"Controller@action"`. A controller starting with `::` is fully
/// qualified and never receives a group namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId {
    controller: String,
    action: String,
}

impl HandlerId {
    #[must_use]
    pub fn new(controller: &str, action: &str) -> Self {
        Self {
            controller: controller.to_string(),
            action: action.to_string(),
        }
    }

    /// Parse `"Controller@action"` (or `"Controller"`) without namespace handling.
    #[must_use]
    pub fn parse(target: &str) -> Self {
        Self::qualified(target, None)
    }

    /// Parse a target and apply `namespace` unless the target is fully qualified.
    #[must_use]
    pub fn qualified(target: &str, namespace: Option<&str>) -> Self {
        let (controller, action) = target
            .split_once('@')
            .unwrap_or((target, DEFAULT_ACTION));
        let action = if action.is_empty() { DEFAULT_ACTION } else { action };

        let controller = match controller.strip_prefix("::") {
            Some(absolute) => absolute.to_string(),
            None => match namespace.filter(|ns| !ns.is_empty()) {
                Some(ns) => format!("{ns}::{controller}"),
                None => controller.to_string(),
            },
        };
        Self {
            controller,
            action: action.to_string(),
        }
    }

    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// Methods a route answers to, stored uppercased.
pub type MethodSet = SmallVec<[Method; 4]>;

/// One registered route.
///
/// Built by [`super::RouteCollector::add`]; immutable once the table is sealed.
#[derive(Clone)]
pub struct Route {
    pub(crate) pattern: CompiledPattern,
    pub(crate) methods: MethodSet,
    pub(crate) target: HandlerId,
    pub(crate) name: Option<String>,
    pub(crate) domain: Option<CompiledPattern>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) extra_constraints: Vec<(Arc<str>, Regex)>,
}

impl Route {
    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn target(&self) -> &HandlerId {
        &self.target
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn domain(&self) -> Option<&CompiledPattern> {
        self.domain.as_ref()
    }

    /// Middleware in execution order (group layers first).
    #[must_use]
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    /// Case-insensitive method membership.
    #[must_use]
    pub fn allows_method(&self, method: &str) -> bool {
        self.methods
            .iter()
            .any(|m| m.as_str().eq_ignore_ascii_case(method))
    }

    /// Try to match a request.
    ///
    /// Returns the parameters (domain parameters first, then path parameters,
    /// each in declaration order) or `None` when the method, host, path or any
    /// constraint does not fit.
    #[must_use]
    pub fn matches(&self, uri: &str, method: &str, host: Option<&str>) -> Option<ParamVec> {
        if !self.allows_method(method) {
            return None;
        }
        self.matches_location(uri, host)
    }

    /// Domain + path + constraints, ignoring the method.
    pub(crate) fn matches_location(&self, uri: &str, host: Option<&str>) -> Option<ParamVec> {
        let mut params = match &self.domain {
            None => ParamVec::new(),
            Some(domain) => {
                let host = host?;
                if domain.has_placeholders() {
                    domain.captures(host)?
                } else if domain.raw().eq_ignore_ascii_case(host) {
                    ParamVec::new()
                } else {
                    return None;
                }
            }
        };

        params.extend(self.pattern.captures(uri)?);

        for (name, validator) in &self.extra_constraints {
            let value = params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str());
            if let Some(value) = value {
                if !validator.is_match(value) {
                    return None;
                }
            }
        }
        Some(params)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.raw())
            .field("methods", &self.methods)
            .field("target", &self.target.to_string())
            .field("name", &self.name)
            .field("domain", &self.domain.as_ref().map(CompiledPattern::raw))
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        write!(f, "{:<12} ", methods.join("|"))?;
        if let Some(domain) = &self.domain {
            write!(f, "{}", domain.raw())?;
        }
        write!(f, "{} -> {}", self.pattern.raw(), self.target)?;
        if let Some(name) = &self.name {
            write!(f, " [{name}]")?;
        }
        if !self.middleware.is_empty() {
            let names: Vec<&str> = self.middleware.iter().map(|m| m.name()).collect();
            write!(f, " ({})", names.join(", "))?;
        }
        Ok(())
    }
}

const ANY_METHODS: [&str; 7] = ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Declarative description of a route, applied to the active group by
/// [`super::RouteCollector::add`].
///
/// ```rust
/// use routekit::router::RouteDefinition;
///
/// let def = RouteDefinition::get("/posts/{slug}", "PostController@show")
///     .name("post_show")
///     .where_param("slug", "[a-z-]+");
/// ```
#[derive(Clone)]
pub struct RouteDefinition {
    pub(crate) methods: Vec<String>,
    pub(crate) path: String,
    pub(crate) target: String,
    pub(crate) name: Option<String>,
    pub(crate) domain: Option<String>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) constraints: Vec<(String, String)>,
}

impl RouteDefinition {
    pub fn new<I, S>(methods: I, path: &str, target: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            methods: methods.into_iter().map(|m| m.as_ref().to_string()).collect(),
            path: path.to_string(),
            target: target.to_string(),
            name: None,
            domain: None,
            middleware: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// `GET` route; `HEAD` is accepted as well.
    #[must_use]
    pub fn get(path: &str, target: &str) -> Self {
        Self::new(["GET", "HEAD"], path, target)
    }

    #[must_use]
    pub fn post(path: &str, target: &str) -> Self {
        Self::new(["POST"], path, target)
    }

    #[must_use]
    pub fn put(path: &str, target: &str) -> Self {
        Self::new(["PUT"], path, target)
    }

    #[must_use]
    pub fn patch(path: &str, target: &str) -> Self {
        Self::new(["PATCH"], path, target)
    }

    #[must_use]
    pub fn delete(path: &str, target: &str) -> Self {
        Self::new(["DELETE"], path, target)
    }

    #[must_use]
    pub fn options(path: &str, target: &str) -> Self {
        Self::new(["OPTIONS"], path, target)
    }

    /// Every common method.
    #[must_use]
    pub fn any(path: &str, target: &str) -> Self {
        Self::new(ANY_METHODS, path, target)
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Host template for this route; overrides the group's domain.
    #[must_use]
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Append a middleware layer after the group's layers.
    #[must_use]
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Extra regex a parameter must fully match, checked after the path match.
    #[must_use]
    pub fn where_param(mut self, name: &str, regex: &str) -> Self {
        self.constraints.push((name.to_string(), regex.to_string()));
        self
    }
}

pub(crate) fn parse_methods(methods: &[String], template: &str) -> Result<MethodSet, RouteError> {
    if methods.is_empty() {
        return Err(RouteError::NoMethods {
            template: template.to_string(),
        });
    }
    let mut set = MethodSet::new();
    for raw in methods {
        let upper = raw.trim().to_ascii_uppercase();
        let method = Method::from_bytes(upper.as_bytes()).map_err(|_| RouteError::InvalidMethod {
            method: raw.clone(),
        })?;
        if !set.contains(&method) {
            set.push(method);
        }
    }
    Ok(set)
}

pub(crate) fn compile_constraints(
    constraints: &[(String, String)],
    template: &str,
) -> Result<Vec<(Arc<str>, Regex)>, RouteError> {
    constraints
        .iter()
        .map(|(name, regex)| {
            Regex::new(&format!("^(?:{regex})$"))
                .map(|re| (Arc::from(name.as_str()), re))
                .map_err(|e| {
                    RouteError::pattern(
                        template,
                        PatternError::InvalidConstraint {
                            name: name.clone(),
                            message: e.to_string(),
                        },
                    )
                })
        })
        .collect()
}

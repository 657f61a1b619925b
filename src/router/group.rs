use std::fmt;
use std::sync::Arc;

use crate::middleware::Middleware;

/// Attributes shared by every route registered inside a group.
///
/// Groups nest; [`RouteGroup::merge_with`] folds a child into its parent and is
/// associative, so `a.merge(b).merge(c)` and `a.merge(b.merge(c))` yield the
/// same prefix, middleware, namespace and domain.
#[derive(Clone, Default)]
pub struct RouteGroup {
    prefix: String,
    middleware: Vec<Arc<dyn Middleware>>,
    namespace: Option<String>,
    domain: Option<String>,
}

impl RouteGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    #[must_use]
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        let ns = namespace.trim_matches(':');
        self.namespace = (!ns.is_empty()).then(|| ns.to_string());
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = (!domain.is_empty()).then(|| domain.to_string());
        self
    }

    /// Normalized prefix; empty for the root.
    #[must_use]
    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn get_middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    #[must_use]
    pub fn get_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn get_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Combine `self` (the child) with `parent`.
    ///
    /// Parent middleware runs outermost. The child's domain wins when set.
    #[must_use]
    pub fn merge_with(&self, parent: &RouteGroup) -> RouteGroup {
        let mut middleware = Vec::with_capacity(parent.middleware.len() + self.middleware.len());
        middleware.extend(parent.middleware.iter().cloned());
        middleware.extend(self.middleware.iter().cloned());

        let namespace = match (&parent.namespace, &self.namespace) {
            (Some(p), Some(c)) => Some(format!("{p}::{c}")),
            (p, c) => c.clone().or_else(|| p.clone()),
        };

        RouteGroup {
            prefix: normalize_prefix(&format!("{}/{}", parent.prefix, self.prefix)),
            middleware,
            namespace,
            domain: self.domain.clone().or_else(|| parent.domain.clone()),
        }
    }
}

impl fmt::Debug for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("prefix", &self.prefix)
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("namespace", &self.namespace)
            .field("domain", &self.domain)
            .finish()
    }
}

/// Collapse repeated `/` and drop the trailing one; the root prefix is `""`.
///
/// Slashes inside a `{...}` placeholder belong to its constraint and are kept.
#[must_use]
pub fn normalize_prefix(prefix: &str) -> String {
    let path = normalize_path(prefix);
    if path == "/" {
        String::new()
    } else {
        path
    }
}

/// Same as [`normalize_prefix`] but the root is `"/"`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 && (out.is_empty() || out.ends_with('/')) => {
                if out.is_empty() {
                    out.push('/');
                }
                continue;
            }
            _ => {}
        }
        if out.is_empty() {
            out.push('/');
        }
        out.push(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Join a group prefix and a route path.
#[must_use]
pub fn join_path(prefix: &str, path: &str) -> String {
    normalize_path(&format!("{prefix}/{path}"))
}

//! # Route Manifest
//!
//! Declarative route tables in TOML, loaded into a [`RouteCollector`].
//!
//! ```toml
//! [[routes]]
//! methods = ["GET"]
//! path = "/users/{id}"
//! handler = "UserController@show"
//! name = "user_show"
//!
//! [[groups]]
//! prefix = "/admin"
//! namespace = "Admin"
//! middleware = ["trace"]
//!
//! [[groups.routes]]
//! methods = ["GET"]
//! path = "/reports/{page?}"
//! handler = "ReportController@index"
//! ```
//!
//! Top-level routes are registered first, then each group in file order; inside
//! a group its own routes come before its nested `[[groups.groups]]`. Middleware
//! is referenced by alias and resolved through a [`MiddlewareRegistry`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RouteError;
use crate::middleware::MiddlewareRegistry;
use crate::router::{RouteCollector, RouteDefinition, RouteGroup};

/// A whole manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteManifest {
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

/// One `[[routes]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    pub path: String,
    pub handler: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Extra per-parameter regex constraints
    #[serde(default, rename = "where")]
    pub constraints: BTreeMap<String, String>,
}

/// One `[[groups]]` table; groups nest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string(), "HEAD".to_string()]
}

impl RouteManifest {
    pub fn from_toml_str(text: &str) -> Result<Self, RouteError> {
        toml::from_str(text).map_err(|e| RouteError::Manifest(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, RouteError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RouteError::Manifest(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Register every route of the manifest; returns how many were added.
    pub fn apply(
        &self,
        collector: &mut RouteCollector,
        registry: &MiddlewareRegistry,
    ) -> Result<usize, RouteError> {
        let before = collector.len();
        for entry in &self.routes {
            add_entry(collector, entry, registry)?;
        }
        for group in &self.groups {
            apply_group(collector, group, registry)?;
        }
        let added = collector.len() - before;
        info!(routes_added = added, groups = self.groups.len(), "Route manifest applied");
        Ok(added)
    }

    /// Fresh collector holding the manifest's routes.
    pub fn build_collector(&self, registry: &MiddlewareRegistry) -> Result<RouteCollector, RouteError> {
        let mut collector = RouteCollector::new();
        self.apply(&mut collector, registry)?;
        Ok(collector)
    }
}

fn apply_group(
    collector: &mut RouteCollector,
    group: &GroupEntry,
    registry: &MiddlewareRegistry,
) -> Result<(), RouteError> {
    let mut attrs = RouteGroup::new().prefix(&group.prefix);
    if let Some(ns) = &group.namespace {
        attrs = attrs.namespace(ns);
    }
    if let Some(domain) = &group.domain {
        attrs = attrs.domain(domain);
    }
    for alias in &group.middleware {
        attrs = attrs.middleware(registry.resolve(alias)?);
    }

    collector.group(attrs, |c| {
        for entry in &group.routes {
            add_entry(c, entry, registry)?;
        }
        for nested in &group.groups {
            apply_group(c, nested, registry)?;
        }
        Ok(())
    })
}

fn add_entry(
    collector: &mut RouteCollector,
    entry: &RouteEntry,
    registry: &MiddlewareRegistry,
) -> Result<(), RouteError> {
    let mut def = RouteDefinition::new(&entry.methods, &entry.path, &entry.handler);
    if let Some(name) = &entry.name {
        def = def.name(name);
    }
    if let Some(domain) = &entry.domain {
        def = def.domain(domain);
    }
    for alias in &entry.middleware {
        def = def.middleware(registry.resolve(alias)?);
    }
    for (param, regex) in &entry.constraints {
        def = def.where_param(param, regex);
    }
    collector.add(def)?;
    Ok(())
}

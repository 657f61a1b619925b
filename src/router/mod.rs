//! # Router Module
//!
//! Route registration, group composition and request matching.
//!
//! ## Overview
//!
//! Routing happens in two phases:
//!
//! 1. **Bootstrap**: routes are added to a [`RouteCollector`], optionally inside
//!    nested [`RouteGroup`]s that contribute a prefix, middleware, a controller
//!    namespace and a host pattern. Every template is compiled on `add`, so
//!    malformed templates and duplicate route names fail early.
//!
//! 2. **Matching**: [`RouteCollector::seal`] produces an immutable
//!    [`RouteTable`]. [`RouteTable::find`] scans it in registration order and
//!    returns the first route whose method, domain, path and constraints all
//!    fit, together with the extracted parameters.
//!
//! ## Example
//!
//! ```rust
//! use routekit::router::{RouteCollector, RouteDefinition, RouteGroup};
//!
//! let mut routes = RouteCollector::new();
//! routes.add(RouteDefinition::get("/users/{id}", "UserController@show").name("user_show"))?;
//! routes.group(RouteGroup::new().prefix("/admin").namespace("Admin"), |r| {
//!     r.add(RouteDefinition::get("/reports/{page?}", "ReportController@index"))?;
//!     Ok(())
//! })?;
//! let table = routes.seal();
//!
//! let m = table.find("/users/42", "GET", None).unwrap();
//! assert_eq!(m.get_param("id"), Some("42"));
//!
//! let m = table.find("/admin/reports", "GET", None).unwrap();
//! assert_eq!(m.route.target().controller(), "Admin::ReportController");
//! assert!(table.find("/users/abc", "GET", None).is_none());
//! # Ok::<(), routekit::error::RouteError>(())
//! ```
//!
//! ## Performance
//!
//! Matching is O(n) in the number of routes. Parameter lists are stored
//! inline for up to eight parameters.

mod group;
mod route;
mod table;
#[cfg(test)]
mod tests;

pub use group::{join_path, normalize_path, normalize_prefix, RouteGroup};
pub use route::{HandlerId, MethodSet, Route, RouteDefinition, DEFAULT_ACTION};
pub use table::{RouteCollector, RouteMatch, RouteTable};

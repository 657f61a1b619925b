//! # routekit
//!
//! **routekit** is the routing and request-dispatch core of an MVC web
//! framework: declarative path templates, nestable route groups, onion-style
//! middleware and reverse URL generation that is the exact inverse of matching.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - Template tokenizer and compiler (`/users/{id}` to an anchored regex)
//! - **[`router`]** - Route registration, groups and first-match lookup
//! - **[`middleware`]** - `Middleware` trait, `Next` continuation and the pipeline fold
//! - **[`dispatcher`]** - Request dispatch through middleware to a controller action
//! - **[`url`]** - URL generation for named routes
//! - **[`context`]** - Request-scoped context passed into dispatch and generation
//! - **[`manifest`]** - Route tables declared in TOML
//! - **[`config`]** / **[`logging`]** - Runtime settings and tracing setup
//!
//! ### Request Flow
//!
//! ```text
//! HandlerRequest ─▶ Dispatcher::dispatch ─▶ RouteTable::find (first match wins)
//!                                         │
//!                                         ▼
//!                     Pipeline: mw1 ─▶ mw2 ─▶ … ─▶ authorizer ─▶ Controller::call
//!                                         │
//!                                         ▼
//!                                ResponseSink::send (exactly once)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use routekit::context::RequestContext;
//! use routekit::router::{RouteCollector, RouteDefinition, RouteGroup};
//! use routekit::url::{ReferenceType, UrlGenerator};
//!
//! let mut routes = RouteCollector::new();
//! routes.group(RouteGroup::new().prefix("/api").namespace("Api"), |r| {
//!     r.add(RouteDefinition::get("/posts/{slug}", "PostController@show").name("post_show"))?;
//!     Ok(())
//! })?;
//! let table = Arc::new(routes.seal());
//!
//! let m = table.find("/api/posts/hello-world", "GET", None).unwrap();
//! assert_eq!(m.route.target().to_string(), "Api::PostController@show");
//!
//! let ctx = RequestContext::new();
//! let url = UrlGenerator::new(&table, &ctx)
//!     .generate("post_show", [("slug", "hello-world")], ReferenceType::AbsolutePath)?;
//! assert_eq!(url, "/api/posts/hello-world");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//!
//! Every component logs through `tracing` with structured fields. Install a
//! subscriber with [`logging::init_logging`] or your own.

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod middleware;
pub mod pattern;
pub mod router;
pub mod url;

pub use context::RequestContext;
pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
pub use error::{DispatchError, PatternError, RouteError, UrlGenerationError};
pub use router::{RouteCollector, RouteDefinition, RouteGroup, RouteTable};
pub use self::url::{ReferenceType, UrlGenerator};

//! # URL Generation
//!
//! Reverse routing: build the URL of a named route from parameter values.
//!
//! Generation walks the same compiled tokens the matcher was built from, so
//! for parameters that satisfy the route's constraints a generated URL always
//! matches its own route again and yields the same path parameters.
//!
//! ```rust
//! use routekit::context::RequestContext;
//! use routekit::router::{RouteCollector, RouteDefinition};
//! use routekit::url::{ReferenceType, UrlGenerator};
//!
//! let mut routes = RouteCollector::new();
//! routes.add(RouteDefinition::get("/users/{id}", "UserController@show").name("user_show"))?;
//! routes.add(RouteDefinition::get("/users/{page?}", "UserController@index").name("users_list"))?;
//! let table = routes.seal();
//! let ctx = RequestContext::new().with_host("example.com");
//! let urls = UrlGenerator::new(&table, &ctx);
//!
//! assert_eq!(urls.generate("user_show", [("id", 42)], ReferenceType::AbsolutePath)?, "/users/42");
//! assert_eq!(
//!     urls.generate("users_list", [("page", 2), ("limit", 10)], ReferenceType::AbsolutePath)?,
//!     "/users/2?limit=10"
//! );
//! assert_eq!(
//!     urls.generate("user_show", [("id", 7)], ReferenceType::AbsoluteUrl)?,
//!     "http://example.com/users/7"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod generator;

pub use generator::{ReferenceType, UrlGenerator, NO_PARAMS};

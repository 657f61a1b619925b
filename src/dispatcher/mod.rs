//! # Dispatcher Module
//!
//! Turns a request into exactly one response.
//!
//! ## Request Flow
//!
//! 1. [`RouteTable::find`](crate::router::RouteTable::find) scans the routes in
//!    registration order; the first one whose method, domain, path and
//!    constraints all match wins. No match is [`DispatchError::RouteNotFound`](crate::error::DispatchError).
//! 2. The terminal handler is built: resolve the controller through the
//!    [`HandlerResolver`], ask the optional [`Authorizer`], then call the action
//!    with the matched values in declaration order. Outputs that are not a
//!    [`HandlerResponse`] become an empty `200`.
//! 3. The route's middleware is folded around the terminal handler
//!    ([`Pipeline`](crate::middleware::Pipeline)) and executed.
//! 4. The response is sent through the [`ResponseSink`] once.
//!
//! ## Collaborators
//!
//! Controller construction, authorization storage and the transport are not
//! part of this crate; they come in through traits. [`ControllerRegistry`],
//! [`GrantTable`], [`RecordingSink`] and [`WriterSink`] are ready-made
//! implementations for small applications and tests.
//!
//! ```rust
//! use std::sync::Arc;
//! use routekit::context::RequestContext;
//! use routekit::dispatcher::{
//!     ActionController, ControllerRegistry, Dispatcher, HandlerRequest, HandlerResponse,
//!     RecordingSink,
//! };
//! use routekit::router::{RouteCollector, RouteDefinition};
//!
//! let mut routes = RouteCollector::new();
//! routes.add(RouteDefinition::get("/users/{id}", "UserController@show")).unwrap();
//! let dispatcher = Dispatcher::new(Arc::new(routes.seal()));
//!
//! let mut controllers = ControllerRegistry::new();
//! controllers.register(
//!     "UserController",
//!     Arc::new(ActionController::new().action("show", |_req, args| {
//!         Ok(HandlerResponse::json(200, serde_json::json!({ "id": args[0] })))
//!     })),
//! );
//!
//! let mut sink = RecordingSink::new();
//! let resp = dispatcher
//!     .dispatch(
//!         HandlerRequest::new(http::Method::GET, "/users/7"),
//!         &RequestContext::new(),
//!         &controllers,
//!         &mut sink,
//!     )
//!     .unwrap();
//! assert_eq!(resp.body["id"], "7");
//! assert_eq!(sink.sent.len(), 1);
//! ```

mod authorize;
mod controller;
mod core;
mod request;
mod sink;

pub use authorize::{Authorization, Authorizer, GrantTable};
pub use controller::{
    ActionController, Controller, ControllerRegistry, HandlerOutput, HandlerResolver,
};
pub use self::core::{normalize_uri, Dispatcher, HANDLER_DEBUG_HEADER, ROUTE_DEBUG_HEADER};
pub use request::{HandlerRequest, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS};
pub use sink::{RecordingSink, ResponseSink, WriterSink};

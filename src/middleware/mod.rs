//! # Middleware Module
//!
//! Continuation-style middleware ("onion" pipeline).
//!
//! Every [`Middleware`] receives the request together with a [`Next`]
//! continuation. A [`Pipeline`] folds an ordered list around a terminal
//! handler:
//!
//! ```text
//!  A.before -> B.before -> C.before -> handler -> C.after -> B.after -> A.after
//! ```
//!
//! A middleware that returns without calling `next.run(req)` short-circuits:
//! later layers and the handler never run, and the response travels back
//! through the after-phases of the layers that already ran.
//!
//! ```rust
//! use std::sync::Arc;
//! use routekit::dispatcher::{HandlerRequest, HandlerResponse};
//! use routekit::middleware::{from_fn, Middleware, Pipeline};
//!
//! let stack: Vec<Arc<dyn Middleware>> = vec![Arc::new(from_fn("deny", |_req, _next| {
//!     Ok(HandlerResponse::error(403, "Forbidden"))
//! }))];
//!
//! let resp = Pipeline::new(&stack)
//!     .run(HandlerRequest::new(http::Method::GET, "/"), |_req| {
//!         Ok(HandlerResponse::empty(200))
//!     })
//!     .unwrap();
//! assert_eq!(resp.status, 403);
//! ```

mod core;
mod pipeline;
mod registry;
mod tracing;

pub use self::core::{from_fn, Continuation, FnMiddleware, Middleware, Next};
pub use pipeline::Pipeline;
pub use registry::MiddlewareRegistry;
pub use self::tracing::TracingMiddleware;

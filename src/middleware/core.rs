use anyhow::Result;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Boxed remainder of a pipeline: the next middleware, or the terminal handler.
pub type Continuation<'a> = Box<dyn FnOnce(HandlerRequest) -> Result<HandlerResponse> + 'a>;

/// The continuation handed to [`Middleware::handle`].
///
/// `run` consumes it, so downstream code (and the terminal handler) runs at
/// most once per dispatch. Dropping it without calling `run` short-circuits
/// the chain.
pub struct Next<'a> {
    inner: Continuation<'a>,
}

impl<'a> Next<'a> {
    /// Wrap a closure as a continuation.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(HandlerRequest) -> Result<HandlerResponse> + 'a,
    {
        Self { inner: Box::new(f) }
    }

    /// Invoke the rest of the chain.
    pub fn run(self, req: HandlerRequest) -> Result<HandlerResponse> {
        (self.inner)(req)
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Next")
    }
}

/// An interceptor around route handlers.
///
/// Code before `next.run(req)` is the before-phase, code after it is the
/// after-phase. Returning without calling `next` skips every remaining
/// middleware and the handler. Errors are returned as-is; the dispatcher does
/// not catch or retry them.
pub trait Middleware: Send + Sync {
    fn handle(&self, req: HandlerRequest, next: Next<'_>) -> Result<HandlerResponse>;

    /// Name used in log fields and route listings.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl std::fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware").field("name", &self.name()).finish()
    }
}

/// Middleware built from a closure.
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(HandlerRequest, Next<'a>) -> Result<HandlerResponse> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(HandlerRequest, Next<'a>) -> Result<HandlerResponse> + Send + Sync,
{
    fn handle(&self, req: HandlerRequest, next: Next<'_>) -> Result<HandlerResponse> {
        (self.f)(req, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Shorthand for [`FnMiddleware::new`].
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(HandlerRequest, Next<'a>) -> Result<HandlerResponse> + Send + Sync,
{
    FnMiddleware::new(name, f)
}

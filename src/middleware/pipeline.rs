use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// An ordered middleware list ready to be wrapped around a terminal handler.
///
/// The list is folded from last to first: the accumulator starts as the
/// terminal handler and each step wraps it in a continuation that calls
/// `middleware.handle(req, next)`. Running the result enters the first
/// middleware, so before-phases run in list order and after-phases in reverse.
#[derive(Clone, Copy)]
pub struct Pipeline<'m> {
    middleware: &'m [Arc<dyn Middleware>],
}

impl<'m> Pipeline<'m> {
    #[must_use]
    pub fn new(middleware: &'m [Arc<dyn Middleware>]) -> Self {
        Self { middleware }
    }

    /// Number of middleware layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Compose the layers around `terminal` into a single continuation.
    pub fn then<'a, F>(&self, terminal: F) -> Next<'a>
    where
        'm: 'a,
        F: FnOnce(HandlerRequest) -> Result<HandlerResponse> + 'a,
    {
        let depth = self.middleware.len();
        self.middleware
            .iter()
            .enumerate()
            .rev()
            .fold(Next::new(terminal), |next, (idx, mw)| {
                Next::new(move |req: HandlerRequest| {
                    debug!(
                        request_id = %req.request_id,
                        middleware_idx = idx,
                        middleware_count = depth,
                        middleware_name = mw.name(),
                        "Middleware enter"
                    );
                    mw.handle(req, next)
                })
            })
    }

    /// Compose and run in one step.
    pub fn run<'a, F>(&self, req: HandlerRequest, terminal: F) -> Result<HandlerResponse>
    where
        'm: 'a,
        F: FnOnce(HandlerRequest) -> Result<HandlerResponse> + 'a,
    {
        self.then(terminal).run(req)
    }
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.middleware.iter().map(|mw| mw.name()))
            .finish()
    }
}

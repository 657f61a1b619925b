//! Error types for route registration, dispatch and URL generation.
//!
//! Registration problems ([`RouteError`]) are raised while the route table is
//! being built and are meant to abort startup. [`DispatchError`] and
//! [`UrlGenerationError`] are per-call failures. Failures raised by middleware,
//! controllers or other collaborators travel through [`DispatchError::Downstream`]
//! untouched.

use thiserror::Error;

/// Errors produced while tokenizing or compiling a path/domain template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `{` was opened and never closed.
    #[error("unterminated placeholder starting at byte {position}")]
    UnterminatedPlaceholder {
        /// Byte offset of the opening brace
        position: usize,
    },
    /// The placeholder name is empty or not an identifier.
    #[error("invalid parameter name '{name}'")]
    InvalidParameterName {
        /// The offending name as written in the template
        name: String,
    },
    /// The same parameter name appears twice in one template.
    #[error("parameter '{name}' is declared more than once")]
    DuplicateParameter {
        /// The repeated name
        name: String,
    },
    /// The constraint (or the assembled expression) is not a valid regex.
    #[error("invalid constraint for '{name}': {message}")]
    InvalidConstraint {
        /// Parameter the constraint belongs to (empty for the whole template)
        name: String,
        /// Message reported by the regex compiler
        message: String,
    },
}

/// Bootstrap-time configuration errors.
///
/// None of these can happen once the table is sealed.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Two routes were registered under the same name.
    #[error("route name '{name}' is already registered (existing: {existing})")]
    DuplicateName {
        /// The duplicated route name
        name: String,
        /// Template of the route that owns the name
        existing: String,
    },
    /// A path or domain template could not be compiled.
    #[error("cannot compile template '{template}': {source}")]
    Pattern {
        /// The template text
        template: String,
        /// Underlying compiler error
        #[source]
        source: PatternError,
    },
    /// An HTTP method token was not valid.
    #[error("invalid HTTP method '{method}'")]
    InvalidMethod {
        /// The method as supplied
        method: String,
    },
    /// A route was declared without any HTTP method.
    #[error("route '{template}' declares no HTTP methods")]
    NoMethods {
        /// The route template
        template: String,
    },
    /// A middleware alias in a manifest has no registered implementation.
    #[error("unknown middleware alias '{alias}'")]
    UnknownMiddleware {
        /// The alias as written in the manifest
        alias: String,
    },
    /// The route manifest could not be read or parsed.
    #[error("route manifest error: {0}")]
    Manifest(String),
}

impl RouteError {
    pub(crate) fn pattern(template: &str, source: PatternError) -> Self {
        RouteError::Pattern {
            template: template.to_string(),
            source,
        }
    }
}

/// Failures surfaced by [`crate::dispatcher::Dispatcher::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No route accepted the request's method, host and path.
    #[error("no route matches {method} {uri}")]
    RouteNotFound {
        /// Requested path (after normalization)
        uri: String,
        /// Requested method
        method: String,
    },
    /// The matched route targets a controller the resolver does not know.
    #[error("handler '{handler}' is not registered")]
    HandlerNotFound {
        /// Controller part of the route target
        handler: String,
    },
    /// Error raised by a middleware, controller, resolver, authorizer or sink.
    #[error(transparent)]
    Downstream(#[from] anyhow::Error),
}

impl DispatchError {
    /// HTTP status a caller would typically render for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::RouteNotFound { .. } => 404,
            DispatchError::HandlerNotFound { .. } | DispatchError::Downstream(_) => 500,
        }
    }
}

/// Failures surfaced by [`crate::url::UrlGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlGenerationError {
    /// No route carries the requested name.
    #[error("no route named '{name}'")]
    RouteNameNotFound {
        /// The requested name
        name: String,
    },
    /// A required path or domain parameter was not supplied.
    #[error("route '{route}' requires parameter '{parameter}'")]
    MissingParameter {
        /// Route name
        route: String,
        /// Name of the missing parameter
        parameter: String,
    },
}

//! # Pattern Module
//!
//! Compiles route templates into anchored regular expressions.
//!
//! ## Template language
//!
//! A template is literal text mixed with placeholders:
//!
//! | Token | Meaning |
//! |---|---|
//! | `{name}` | required parameter |
//! | `{name:constraint}` | required parameter with an inline regex constraint |
//! | `{name?}` | optional parameter |
//! | `{name:constraint?}` | optional parameter with an inline constraint |
//!
//! Parameters without an inline constraint pick one from the built-in table
//! (`id`, `num`, `page` are digits, `slug` is lowercase alphanumerics and
//! hyphens, `uuid` is the canonical UUID shape) or fall back to "anything but
//! the separator". The names `query`, `search` and `filter` are optional even
//! without a `?`; this mirrors long-standing framework behaviour and can
//! surprise people reading a template for the first time.
//!
//! An optional parameter takes the separator in front of it into its optional
//! group, so `/search/{query?}` matches both `/search` and `/search/rust`.
//!
//! ```rust
//! use routekit::pattern::CompiledPattern;
//!
//! let pattern = CompiledPattern::path("/users/{id}").unwrap();
//! let params = pattern.captures("/users/42").unwrap();
//! assert_eq!(&*params[0].0, "id");
//! assert_eq!(params[0].1, "42");
//! assert!(pattern.captures("/users/abc").is_none());
//! ```

mod compiler;
mod tokenizer;

pub use compiler::{
    auto_constraint, is_auto_optional, CompiledPattern, Constraint, ConstraintSource,
    ParamDescriptor, ParamVec, PatternKind, AUTO_OPTIONAL_PARAMS, MAX_INLINE_PARAMS,
};
pub use tokenizer::{tokenize, Placeholder, Token};

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use smallvec::SmallVec;

use super::tokenizer::{tokenize, Placeholder, Token};
use crate::error::PatternError;

/// Maximum number of parameters kept inline before the list spills to the heap.
/// Most templates carry fewer than four placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered `(name, value)` pairs extracted by a match.
///
/// Names are `Arc<str>` cloned out of the compiled descriptor table, so a
/// match only allocates for the captured values.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Parameter names that are optional even without a trailing `?`.
pub const AUTO_OPTIONAL_PARAMS: [&str; 3] = ["query", "search", "filter"];

const DIGITS: &str = r"\d+";
const SLUG: &str = "[a-z0-9-]+";
const UUID: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Constraint applied to a parameter by name when the template gives none.
#[must_use]
pub fn auto_constraint(name: &str) -> Option<&'static str> {
    match name {
        "id" | "num" | "page" => Some(DIGITS),
        "slug" => Some(SLUG),
        "uuid" => Some(UUID),
        _ => None,
    }
}

/// Whether a parameter named `name` is optional by convention.
#[must_use]
pub fn is_auto_optional(name: &str) -> bool {
    AUTO_OPTIONAL_PARAMS.contains(&name)
}

/// What a template is matched against. Decides the separator and the
/// fallback constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Request path, segments separated by `/`
    Path,
    /// Host name, labels separated by `.`; matched case-insensitively
    Domain,
}

impl PatternKind {
    /// Segment separator.
    #[must_use]
    pub fn separator(self) -> char {
        match self {
            PatternKind::Path => '/',
            PatternKind::Domain => '.',
        }
    }

    fn default_constraint(self) -> &'static str {
        match self {
            PatternKind::Path => "[^/]+",
            PatternKind::Domain => r"[^.]+",
        }
    }
}

/// Where a parameter's constraint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSource {
    /// Written in the template after `:`
    Inline,
    /// Looked up in the built-in name table
    Auto,
    /// Nothing specific; any run without the separator
    Default,
}

/// Regex fragment a parameter must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Regex source, unanchored
    pub pattern: String,
    /// Origin of the fragment
    pub source: ConstraintSource,
}

/// Compiled metadata for one placeholder.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    /// Parameter name, shared with every match result
    pub name: Arc<str>,
    /// `true` for an explicit `?` or an auto-optional name
    pub optional: bool,
    /// Constraint applied inside the capture group
    pub constraint: Constraint,
    /// Anchored validator, present only for inline constraints
    validator: Option<Regex>,
}

impl ParamDescriptor {
    /// Re-check a decoded value against the explicit constraint.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.validator.as_ref().is_none_or(|v| v.is_match(value))
    }
}

/// A template compiled into an anchored expression plus its descriptor table.
///
/// Matching ([`CompiledPattern::captures`]) and URL generation both walk the
/// same `tokens` and `params`, so the two directions cannot disagree about
/// which parameters exist, which are optional, or where separators go.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    kind: PatternKind,
    regex: Regex,
    tokens: Vec<Token>,
    params: Vec<ParamDescriptor>,
}

impl CompiledPattern {
    /// Compile a request path template such as `/users/{id}/posts/{slug?}`.
    pub fn path(template: &str) -> Result<Self, PatternError> {
        Self::compile(template, PatternKind::Path)
    }

    /// Compile a host template such as `{tenant}.example.com`.
    pub fn domain(template: &str) -> Result<Self, PatternError> {
        Self::compile(template, PatternKind::Domain)
    }

    /// Single pass over the tokens, registering each parameter in order and
    /// emitting the matching fragment for it.
    ///
    /// An optional placeholder takes one adjacent separator into its optional
    /// group: the one in front of it for paths (`/search/{query?}`), the one
    /// after it for domains (`{sub?}.example.com`), so that dropping the value
    /// leaves no dangling separator.
    pub fn compile(template: &str, kind: PatternKind) -> Result<Self, PatternError> {
        let tokens = tokenize(template)?;
        let sep = kind.separator();
        let escaped_sep = regex::escape(&sep.to_string());
        let mut expr = String::with_capacity(template.len() + 16);
        let mut params: Vec<ParamDescriptor> = Vec::with_capacity(tokens.len());

        for (idx, token) in tokens.iter().enumerate() {
            match token {
                Token::Literal(text) => {
                    let mut text = text.as_str();
                    if idx + 1 < tokens.len() && owned_separator(&tokens, idx + 1, kind) == Some(Side::Before) {
                        text = text.strip_suffix(sep).unwrap_or(text);
                    }
                    if idx > 0 && owned_separator(&tokens, idx - 1, kind) == Some(Side::After) {
                        text = text.strip_prefix(sep).unwrap_or(text);
                    }
                    expr.push_str(&regex::escape(text));
                }
                Token::Placeholder(placeholder) => {
                    if params.iter().any(|p| *p.name == *placeholder.name) {
                        return Err(PatternError::DuplicateParameter {
                            name: placeholder.name.clone(),
                        });
                    }
                    let descriptor = describe(placeholder, kind)?;
                    let group = format!(
                        "(?P<{}>{})",
                        descriptor.name,
                        capture_pattern(&descriptor, kind)
                    );
                    match owned_separator(&tokens, idx, kind) {
                        Some(Side::Before) => {
                            expr.push_str("(?:");
                            expr.push_str(&escaped_sep);
                            expr.push_str(&group);
                            expr.push_str(")?");
                        }
                        Some(Side::After) => {
                            expr.push_str("(?:");
                            expr.push_str(&group);
                            expr.push_str(&escaped_sep);
                            expr.push_str(")?");
                        }
                        None if descriptor.optional => {
                            expr.push_str(&group);
                            expr.push('?');
                        }
                        None => expr.push_str(&group),
                    }
                    params.push(descriptor);
                }
            }
        }

        // `/{page?}` collapses to the empty string without its value; the bare
        // root has to match as well
        let expr = if kind == PatternKind::Path && reduces_to_root(&tokens, sep) {
            format!("^(?:{escaped_sep}|{expr})$")
        } else {
            format!("^{expr}$")
        };

        let regex = RegexBuilder::new(&expr)
            .case_insensitive(kind == PatternKind::Domain)
            .build()
            .map_err(|e| PatternError::InvalidConstraint {
                name: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            raw: template.to_string(),
            kind,
            regex,
            tokens,
            params,
        })
    }

    /// The template as registered.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Path or domain.
    #[must_use]
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// The anchored expression.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Tokens of the parsed template.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parameter descriptors in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Look up a descriptor by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamDescriptor> {
        self.params.iter().find(|p| &*p.name == name)
    }

    /// `false` for purely literal templates.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        !self.params.is_empty()
    }

    /// Match `subject` and extract parameters in declaration order.
    ///
    /// Optional parameters that did not participate (or captured nothing) are
    /// left out. A required parameter that is missing, or any value rejected
    /// by its inline constraint, fails the whole match.
    #[must_use]
    pub fn captures(&self, subject: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(subject)?;
        let mut out = ParamVec::new();
        for param in &self.params {
            match caps.name(&param.name).map(|m| m.as_str()) {
                Some(value) if !value.is_empty() => {
                    let value = self.decode(value);
                    if !param.accepts(&value) {
                        return None;
                    }
                    out.push((Arc::clone(&param.name), value));
                }
                _ if param.optional => {}
                _ => return None,
            }
        }
        Some(out)
    }

    /// Path values are percent-decoded; malformed escapes are kept as written.
    fn decode(&self, value: &str) -> String {
        match self.kind {
            PatternKind::Path if value.contains('%') => urlencoding::decode(value)
                .map_or_else(|_| value.to_string(), |decoded| decoded.into_owned()),
            _ => value.to_string(),
        }
    }
}

/// Which separator an optional placeholder absorbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

fn is_optional(placeholder: &Placeholder) -> bool {
    placeholder.explicit_optional || is_auto_optional(&placeholder.name)
}

/// Separator owned by the optional placeholder at `idx`, if any.
fn owned_separator(tokens: &[Token], idx: usize, kind: PatternKind) -> Option<Side> {
    let Some(Token::Placeholder(p)) = tokens.get(idx) else {
        return None;
    };
    if !is_optional(p) {
        return None;
    }
    let sep = kind.separator();
    let before = idx > 0 && matches!(&tokens[idx - 1], Token::Literal(t) if t.ends_with(sep));
    let after = matches!(tokens.get(idx + 1), Some(Token::Literal(t)) if t.starts_with(sep));
    match kind {
        PatternKind::Path if before => Some(Side::Before),
        PatternKind::Domain if after => Some(Side::After),
        // A lone `.` already taken by the optional label in front stays with it
        PatternKind::Domain if before && !separator_taken(tokens, idx - 1, sep) => {
            Some(Side::Before)
        }
        _ => None,
    }
}

fn separator_taken(tokens: &[Token], literal_idx: usize, sep: char) -> bool {
    let lone = matches!(&tokens[literal_idx], Token::Literal(t) if t.len() == sep.len_utf8() && t.starts_with(sep));
    lone && literal_idx > 0
        && matches!(&tokens[literal_idx - 1], Token::Placeholder(p) if is_optional(p))
}

/// `true` when every literal is made of separators only and every
/// placeholder is optional, as in `/{page?}`.
fn reduces_to_root(tokens: &[Token], sep: char) -> bool {
    let mut has_placeholder = false;
    let all_optional = tokens.iter().all(|token| match token {
        Token::Literal(text) => text.chars().all(|c| c == sep),
        Token::Placeholder(p) => {
            has_placeholder = true;
            is_optional(p)
        }
    });
    all_optional && has_placeholder
}

/// Fragment placed inside the capture group.
///
/// Inline path constraints also admit percent-encoded segments; those are
/// checked against the decoded value by the descriptor's validator.
fn capture_pattern(descriptor: &ParamDescriptor, kind: PatternKind) -> String {
    let constraint = &descriptor.constraint;
    match (kind, constraint.source) {
        (PatternKind::Path, ConstraintSource::Inline) => {
            format!("(?:{})|[^/]*%[0-9A-Fa-f]{{2}}[^/]*", constraint.pattern)
        }
        _ => constraint.pattern.clone(),
    }
}

fn describe(placeholder: &Placeholder, kind: PatternKind) -> Result<ParamDescriptor, PatternError> {
    let optional = is_optional(placeholder);

    let (constraint, validator) = match &placeholder.constraint {
        Some(inline) => {
            let validator = Regex::new(&format!("^(?:{inline})$")).map_err(|e| {
                PatternError::InvalidConstraint {
                    name: placeholder.name.clone(),
                    message: e.to_string(),
                }
            })?;
            (
                Constraint {
                    pattern: inline.clone(),
                    source: ConstraintSource::Inline,
                },
                Some(validator),
            )
        }
        None => match auto_constraint(&placeholder.name) {
            Some(auto) => (
                Constraint {
                    pattern: auto.to_string(),
                    source: ConstraintSource::Auto,
                },
                None,
            ),
            None => (
                Constraint {
                    pattern: kind.default_constraint().to_string(),
                    source: ConstraintSource::Default,
                },
                None,
            ),
        },
    };

    Ok(ParamDescriptor {
        name: Arc::from(placeholder.name.as_str()),
        optional,
        constraint,
        validator,
    })
}

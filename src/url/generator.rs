use url::form_urlencoded;

use crate::context::RequestContext;
use crate::error::UrlGenerationError;
use crate::pattern::{CompiledPattern, Token};
use crate::router::{Route, RouteTable};

/// Shape of a generated reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceType {
    /// `/path?query`, or `scheme://host/path` when the route lives on another host
    #[default]
    AbsolutePath,
    /// Always `scheme://host/path?query`
    AbsoluteUrl,
}

/// Empty parameter list for routes without placeholders.
pub const NO_PARAMS: [(&str, &str); 0] = [];

/// Builds URLs for named routes; the inverse of [`RouteTable::find`].
#[derive(Debug, Clone, Copy)]
pub struct UrlGenerator<'a> {
    table: &'a RouteTable,
    ctx: &'a RequestContext,
}

impl<'a> UrlGenerator<'a> {
    #[must_use]
    pub fn new(table: &'a RouteTable, ctx: &'a RequestContext) -> Self {
        Self { table, ctx }
    }

    /// Generate the URL of route `name`.
    ///
    /// Parameters named by the route's path or domain template are
    /// substituted (empty values count as absent); the rest become the query
    /// string in the order given.
    pub fn generate<I, K, V>(
        &self,
        name: &str,
        params: I,
        reference: ReferenceType,
    ) -> Result<String, UrlGenerationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let route = self
            .table
            .by_name(name)
            .ok_or_else(|| UrlGenerationError::RouteNameNotFound {
                name: name.to_string(),
            })?;

        let mut remaining: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();

        let raw_path = substitute(route.pattern(), name, &mut remaining, encode_segment)?;
        let mut url = collapse_path(&raw_path);

        if let Some(host) = self.host_for(route, name, &mut remaining, reference)? {
            url = format!("{}://{}{}", self.ctx.scheme(), host, url);
        }

        if !remaining.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(remaining.iter())
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    /// Shorthand for an [`ReferenceType::AbsolutePath`] reference.
    pub fn path<I, K, V>(&self, name: &str, params: I) -> Result<String, UrlGenerationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.generate(name, params, ReferenceType::AbsolutePath)
    }

    /// Host to prefix, if any.
    fn host_for(
        &self,
        route: &Route,
        name: &str,
        remaining: &mut Vec<(String, String)>,
        reference: ReferenceType,
    ) -> Result<Option<String>, UrlGenerationError> {
        let current = self.ctx.host();
        match route.domain() {
            Some(domain) => {
                let raw = substitute(domain, name, remaining, |v| v.to_string())?;
                let host = collapse_domain(&raw);
                let differs = current.is_none_or(|c| !c.eq_ignore_ascii_case(&host));
                Ok((differs || reference == ReferenceType::AbsoluteUrl).then_some(host))
            }
            None if reference == ReferenceType::AbsoluteUrl => {
                Ok(current.map(str::to_string))
            }
            None => Ok(None),
        }
    }
}

/// Walk the template tokens, consuming matching entries from `remaining`.
fn substitute(
    pattern: &CompiledPattern,
    route: &str,
    remaining: &mut Vec<(String, String)>,
    encode: impl Fn(&str) -> String,
) -> Result<String, UrlGenerationError> {
    let mut out = String::with_capacity(pattern.raw().len());
    for token in pattern.tokens() {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Placeholder(placeholder) => {
                let value = take(remaining, &placeholder.name);
                match value {
                    Some(v) => out.push_str(&encode(&v)),
                    None if pattern.param(&placeholder.name).is_some_and(|p| p.optional) => {}
                    None => {
                        return Err(UrlGenerationError::MissingParameter {
                            route: route.to_string(),
                            parameter: placeholder.name.clone(),
                        })
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Remove every entry named `name`; the last non-empty value wins.
fn take(remaining: &mut Vec<(String, String)>, name: &str) -> Option<String> {
    let mut found = None;
    remaining.retain(|(k, v)| {
        if k == name {
            if !v.is_empty() {
                found = Some(v.clone());
            }
            false
        } else {
            true
        }
    });
    found
}

fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Collapse repeated `/` and trim the trailing one; the root stays `/`.
pub(crate) fn collapse_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

fn collapse_domain(domain: &str) -> String {
    domain
        .split('.')
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(".")
        .to_ascii_lowercase()
}

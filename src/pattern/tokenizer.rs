//! Splits a template into literal text and `{placeholder}` tokens.

use crate::error::PatternError;

/// One lexical element of a path or domain template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text that must appear verbatim
    Literal(String),
    /// A `{name}`, `{name:constraint}`, `{name?}` or `{name:constraint?}` token
    Placeholder(Placeholder),
}

/// A placeholder as written in the template, before any table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Parameter name
    pub name: String,
    /// Inline constraint, if one was written after `:`
    pub constraint: Option<String>,
    /// `true` when the token ends with `?`
    pub explicit_optional: bool,
}

/// Tokenize a template.
///
/// Braces inside a placeholder are balanced so constraints such as
/// `{year:\d{4}}` are read as a single token. A `}` outside any
/// placeholder is kept as literal text.
pub fn tokenize(template: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let bytes = template.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'{' {
            // Copy the whole run up to the next brace in one go
            let end = template[pos..]
                .find('{')
                .map_or(template.len(), |offset| pos + offset);
            literal.push_str(&template[pos..end]);
            pos = end;
            continue;
        }

        let close = find_closing_brace(bytes, pos)
            .ok_or(PatternError::UnterminatedPlaceholder { position: pos })?;
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(Token::Placeholder(parse_placeholder(
            &template[pos + 1..close],
        )?));
        pos = close + 1;
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn find_closing_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_placeholder(body: &str) -> Result<Placeholder, PatternError> {
    let (body, explicit_optional) = match body.strip_suffix('?') {
        Some(rest) => (rest, true),
        None => (body, false),
    };

    let (name, constraint) = match body.split_once(':') {
        Some((name, constraint)) => (name.trim(), Some(constraint)),
        None => (body.trim(), None),
    };

    if !is_identifier(name) {
        return Err(PatternError::InvalidParameterName {
            name: name.to_string(),
        });
    }

    Ok(Placeholder {
        name: name.to_string(),
        constraint: constraint
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        explicit_optional,
    })
}

/// Names end up as regex group names, so they follow the same rules.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! URI handling: template compilation plus the path and query helpers used
//! while matching a request.

mod template;

#[cfg(test)]
mod tests;

pub use template::{normalize, TemplateError, UriMatch, UriTemplate, DEFAULT_VARIABLE_REGEX};

use std::borrow::Cow;

/// Percent-decode a path or parameter value.
///
/// Values that do not decode to valid UTF-8 are returned unchanged.
#[must_use]
pub fn decode(value: &str) -> Cow<'_, str> {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(value),
    }
}

/// Remove matrix parameters (`;k=v`) from every segment of an encoded path.
#[must_use]
pub fn strip_matrix(path: &str) -> Cow<'_, str> {
    if !path.contains(';') {
        return Cow::Borrowed(path);
    }
    let stripped: Vec<&str> = path
        .split('/')
        .map(|segment| segment.split(';').next().unwrap_or(""))
        .collect();
    Cow::Owned(stripped.join("/"))
}

/// One path segment with its matrix parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub path: String,
    pub matrix: Vec<(String, String)>,
}

impl PathSegment {
    /// First matrix parameter value with the given name.
    #[must_use]
    pub fn matrix_param(&self, name: &str) -> Option<&str> {
        self.matrix
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn matrix_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.matrix
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Split an encoded path into segments; the leading empty segment of an
/// absolute path is dropped, inner empty segments are kept.
#[must_use]
pub fn path_segments(path: &str, decode_values: bool) -> Vec<PathSegment> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let convert = |s: &str| {
        if decode_values {
            decode(s).into_owned()
        } else {
            s.to_string()
        }
    };
    path.split('/')
        .map(|raw| {
            let mut parts = raw.split(';');
            let segment = convert(parts.next().unwrap_or(""));
            let matrix = parts
                .filter(|p| !p.is_empty())
                .map(|p| match p.split_once('=') {
                    Some((k, v)) => (convert(k), convert(v)),
                    None => (convert(p), String::new()),
                })
                .collect();
            PathSegment {
                path: segment,
                matrix,
            }
        })
        .collect()
}

/// Parse a query string into ordered `(name, value)` pairs.
///
/// With `decode_values` the pairs are form-decoded (`+` is a space),
/// otherwise the raw percent-encoded text is kept.
#[must_use]
pub fn parse_query(query: &str, decode_values: bool) -> Vec<(String, String)> {
    if decode_values {
        return url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
    }
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

use super::response::{find_header, HeaderVec};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use http::Method;
use std::sync::Arc;

/// An incoming request as seen by the router.
///
/// `path` is kept percent-encoded (including matrix parameters); decoding
/// happens per parameter so that encoded values stay available.
#[derive(Debug, Clone)]
pub struct Request {
    request_id: RequestId,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl Request {
    /// Build a request for `target`, a path with an optional `?query`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (target, None),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            request_id: RequestId::new(),
            method,
            path,
            query,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    #[must_use]
    pub fn put(target: &str) -> Self {
        Self::new(Method::PUT, target)
    }

    #[must_use]
    pub fn delete(target: &str) -> Self {
        Self::new(Method::DELETE, target)
    }

    #[must_use]
    pub fn head(target: &str) -> Self {
        Self::new(Method::HEAD, target)
    }

    #[must_use]
    pub fn options(target: &str) -> Self {
        Self::new(Method::OPTIONS, target)
    }

    /// Append a header. An `X-Request-Id` holding a valid ULID becomes the
    /// request id.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            self.request_id = RequestId::from_header_or_new(Some(value));
        }
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The encoded request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, without `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// First value of a header, case-insensitive.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_value("Content-Type")
    }

    /// All `Accept` values joined into one list; `None` when absent.
    #[must_use]
    pub fn accept(&self) -> Option<String> {
        let values: Vec<&str> = self.header_values("Accept").collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }

    #[must_use]
    pub fn entity(&self) -> &[u8] {
        &self.body
    }

    /// Cookies from every `Cookie` header, in order.
    #[must_use]
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.header_values("Cookie")
            .flat_map(|c| c.split(';'))
            .filter_map(|pair| {
                let mut parts = pair.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                if name.is_empty() {
                    return None;
                }
                let value = parts.next().unwrap_or("").trim();
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_split() {
        let req = Request::get("a/b?x=1&y=2");
        assert_eq!(req.path(), "/a/b");
        assert_eq!(req.query(), Some("x=1&y=2"));
        assert_eq!(Request::get("/").query(), None);
    }

    #[test]
    fn test_parse_cookies() {
        let req = Request::get("/")
            .header("Cookie", "session=abc123; user=john")
            .header("cookie", "theme=dark");
        assert_eq!(req.cookie("user").as_deref(), Some("john"));
        assert_eq!(req.cookie("theme").as_deref(), Some("dark"));
        assert_eq!(req.cookies().len(), 3);
    }

    #[test]
    fn test_accept_values_are_joined() {
        let req = Request::get("/")
            .header("Accept", "text/plain")
            .header("accept", "application/json;q=0.5");
        assert_eq!(
            req.accept().as_deref(),
            Some("text/plain,application/json;q=0.5")
        );
        assert_eq!(Request::get("/").accept(), None);
    }

    #[test]
    fn test_request_id_from_header() {
        let id = RequestId::new();
        let req = Request::get("/").header("X-Request-Id", &id.to_string());
        assert_eq!(req.request_id(), id);
    }
}

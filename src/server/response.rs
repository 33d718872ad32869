use serde::Serialize;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage shared by requests and responses; names keep their
/// original case and compare case-insensitively.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

pub(crate) fn find_header<'a>(headers: &'a HeaderVec, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Reason phrase for a status code.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// An outgoing response: status, headers and the serialized entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

impl Response {
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::with_status(204)
    }

    /// 200 with a text entity. The Content-Type is left to negotiation.
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok().body(body.into().into_bytes())
    }

    /// 200 with a JSON-serialized entity. The Content-Type is left to negotiation.
    #[must_use]
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::ok().body(body),
            Err(e) => Self::with_status(500)
                .content_type("text/plain")
                .body(e.to_string().into_bytes()),
        }
    }

    #[must_use]
    pub fn status_code(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Set the Content-Type explicitly; negotiation will not override it.
    #[must_use]
    pub fn content_type(mut self, value: &str) -> Self {
        self.set_header("Content-Type", value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Replace every header called `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.remove_header(name);
        self.headers.push((Arc::from(name), value.to_string()));
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header_value(name).is_some()
    }

    #[must_use]
    pub fn get_content_type(&self) -> Option<&str> {
        self.header_value("Content-Type")
    }

    #[must_use]
    pub fn entity(&self) -> &[u8] {
        &self.body
    }

    /// The entity as text, lossy for non-UTF-8 bodies.
    #[must_use]
    pub fn text_body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The entity parsed as JSON.
    #[must_use]
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(599), "Unknown");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut response = Response::ok().header("X-Thing", "a").content_type("text/plain");
        assert_eq!(response.header_value("x-thing"), Some("a"));
        response.set_header("content-type", "application/json");
        assert_eq!(response.get_content_type(), Some("application/json"));
        assert_eq!(response.headers().len(), 2);
    }

    #[test]
    fn test_json_body() {
        let response = Response::json(&serde_json::json!({"a": 1}));
        assert_eq!(response.status(), 200);
        assert_eq!(response.json_body(), Some(serde_json::json!({"a": 1})));
        assert!(response.get_content_type().is_none());
    }
}

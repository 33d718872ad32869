//! Handler errors, their class hierarchy and the exception mapper registry.
//!
//! Error classes form a single-inheritance tree rooted at [`THROWABLE`].
//! A mapper registered for a class also handles its descendants; the
//! registry picks the mapper whose class is closest to the raised one, then
//! the smaller priority number, then the earliest registration.

use crate::model::ConversionError;
use crate::server::Response;
use http::{Method, StatusCode};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default priority of a user-registered mapper.
pub const USER_PRIORITY: u32 = 5000;

/// A node of the error class hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct ErrorClass {
    name: &'static str,
    parent: Option<&'static ErrorClass>,
    status: Option<u16>,
}

impl ErrorClass {
    #[must_use]
    pub const fn new(
        name: &'static str,
        parent: Option<&'static ErrorClass>,
        status: Option<u16>,
    ) -> Self {
        Self {
            name,
            parent,
            status,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&'static ErrorClass> {
        self.parent
    }

    /// Status of the nearest class in the ancestry that declares one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.status.is_some() {
                return class.status;
            }
            current = class.parent;
        }
        None
    }

    /// Number of inheritance steps from `self` up to `ancestor`.
    #[must_use]
    pub fn distance_to(&self, ancestor: &ErrorClass) -> Option<usize> {
        let mut current = Some(self);
        let mut distance = 0;
        while let Some(class) = current {
            if class == ancestor {
                return Some(distance);
            }
            distance += 1;
            current = class.parent;
        }
        None
    }

    #[must_use]
    pub fn is_subclass_of(&self, ancestor: &ErrorClass) -> bool {
        self.distance_to(ancestor).is_some()
    }
}

impl PartialEq for ErrorClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ErrorClass {}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub static THROWABLE: ErrorClass = ErrorClass::new("Throwable", None, None);
pub static RUNTIME: ErrorClass = ErrorClass::new("RuntimeException", Some(&THROWABLE), None);
pub static WEB_APPLICATION: ErrorClass =
    ErrorClass::new("WebApplicationException", Some(&RUNTIME), None);
pub static NOT_FOUND: ErrorClass =
    ErrorClass::new("NotFoundException", Some(&WEB_APPLICATION), Some(404));
pub static NOT_ALLOWED: ErrorClass =
    ErrorClass::new("NotAllowedException", Some(&WEB_APPLICATION), Some(405));
pub static NOT_ACCEPTABLE: ErrorClass =
    ErrorClass::new("NotAcceptableException", Some(&WEB_APPLICATION), Some(406));
pub static NOT_SUPPORTED: ErrorClass =
    ErrorClass::new("NotSupportedException", Some(&WEB_APPLICATION), Some(415));
pub static BAD_REQUEST: ErrorClass =
    ErrorClass::new("BadRequestException", Some(&WEB_APPLICATION), Some(400));
pub static PARAM: ErrorClass = ErrorClass::new("ParamException", Some(&WEB_APPLICATION), Some(400));
pub static INTERNAL_SERVER_ERROR: ErrorClass =
    ErrorClass::new("InternalServerErrorException", Some(&WEB_APPLICATION), Some(500));
pub static SERVICE_UNAVAILABLE: ErrorClass =
    ErrorClass::new("ServiceUnavailableException", Some(&WEB_APPLICATION), Some(503));

/// Error raised by a handler, a locator or the routing pipeline.
pub struct HandlerError {
    class: &'static ErrorClass,
    message: String,
    status: Option<u16>,
    response: Option<Box<Response>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HandlerError {
    pub fn new(class: &'static ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
            status: None,
            response: None,
            source: None,
        }
    }

    /// A [`WEB_APPLICATION`] error carrying a ready response.
    #[must_use]
    pub fn from_response(response: Response) -> Self {
        let message = StatusCode::from_u16(response.status())
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("web application error")
            .to_string();
        Self::new(&WEB_APPLICATION, message).with_response(response)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(&NOT_FOUND, message)
    }

    /// 405 with an `Allow` header listing `allow`.
    #[must_use]
    pub fn method_not_allowed(allow: &[Method]) -> Self {
        let allow_header = allow
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let response = Response::with_status(405).header("Allow", &allow_header);
        Self::new(&NOT_ALLOWED, "HTTP method not allowed").with_response(response)
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::new(&NOT_ACCEPTABLE, message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(&NOT_SUPPORTED, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(&BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(&INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(&SERVICE_UNAVAILABLE, message)
    }

    /// A parameter value could not be converted.
    #[must_use]
    pub fn param(name: &str, error: ConversionError) -> Self {
        Self::new(&PARAM, format!("parameter `{name}`: {error}")).with_source(error)
    }

    /// A plain application error outside the web hierarchy.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(&RUNTIME, message)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(Box::new(response));
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn class(&self) -> &'static ErrorClass {
        self.class
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    /// Explicit status, then the embedded response, then the class, then 500.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
            .or_else(|| self.response.as_ref().map(|r| r.status()))
            .or_else(|| self.class.status())
            .unwrap_or(500)
    }

    /// Response used when no mapper handles this error.
    #[must_use]
    pub fn into_response(self) -> Response {
        let status = self.status();
        match self.response {
            Some(response) => {
                let mut response = *response;
                response.set_status(status);
                response
            }
            None => Response::with_status(status)
                .content_type("text/plain")
                .body(self.message.into_bytes()),
        }
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("class", &self.class.name())
            .field("message", &self.message)
            .field("status", &self.status())
            .finish()
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}

impl StdError for HandlerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

pub type MapperFn = Arc<dyn Fn(&HandlerError) -> Response + Send + Sync>;

#[derive(Clone)]
struct MapperEntry {
    class: &'static ErrorClass,
    priority: u32,
    mapper: MapperFn,
}

/// Registry of exception mappers.
#[derive(Clone)]
pub struct ExceptionMappers {
    entries: Vec<MapperEntry>,
    default_priority: u32,
}

impl Default for ExceptionMappers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExceptionMappers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.class.name(), e.priority)))
            .finish()
    }
}

impl ExceptionMappers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            default_priority: USER_PRIORITY,
        }
    }

    /// Priority given to mappers registered without an explicit one.
    #[must_use]
    pub fn with_default_priority(mut self, priority: u32) -> Self {
        self.default_priority = priority;
        self
    }

    #[must_use]
    pub fn register<F>(self, class: &'static ErrorClass, mapper: F) -> Self
    where
        F: Fn(&HandlerError) -> Response + Send + Sync + 'static,
    {
        let priority = self.default_priority;
        self.register_with_priority(class, priority, mapper)
    }

    /// Register with an explicit priority; smaller numbers win among
    /// mappers at the same hierarchy distance.
    #[must_use]
    pub fn register_with_priority<F>(
        mut self,
        class: &'static ErrorClass,
        priority: u32,
        mapper: F,
    ) -> Self
    where
        F: Fn(&HandlerError) -> Response + Send + Sync + 'static,
    {
        self.entries.push(MapperEntry {
            class,
            priority,
            mapper: Arc::new(mapper),
        });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The mapper chosen for `class`, if any applies.
    #[must_use]
    pub fn find(&self, class: &ErrorClass) -> Option<&MapperFn> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                class
                    .distance_to(entry.class)
                    .map(|distance| ((distance, entry.priority, index), entry))
            })
            .min_by_key(|(key, _)| *key)
            .map(|(_, entry)| &entry.mapper)
    }

    /// Turn an error into a response through the best mapper, or the
    /// error's own response when none applies.
    #[must_use]
    pub fn map(&self, error: HandlerError) -> Response {
        match self.find(error.class()) {
            Some(mapper) => {
                debug!(class = error.class().name(), "exception mapped");
                mapper(&error)
            }
            None => error.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static APP_ERROR: ErrorClass = ErrorClass::new("AppError", Some(&RUNTIME), None);
    static DEEP_ERROR: ErrorClass = ErrorClass::new("DeepError", Some(&APP_ERROR), Some(409));

    fn tagged(tag: &'static str) -> impl Fn(&HandlerError) -> Response + Send + Sync {
        move |_| Response::with_status(418).body(tag.as_bytes().to_vec())
    }

    #[test]
    fn test_distance_walks_parents() {
        assert_eq!(DEEP_ERROR.distance_to(&DEEP_ERROR), Some(0));
        assert_eq!(DEEP_ERROR.distance_to(&APP_ERROR), Some(1));
        assert_eq!(DEEP_ERROR.distance_to(&THROWABLE), Some(3));
        assert_eq!(APP_ERROR.distance_to(&DEEP_ERROR), None);
        assert!(NOT_FOUND.is_subclass_of(&WEB_APPLICATION));
    }

    #[test]
    fn test_status_inherited_from_nearest_ancestor() {
        assert_eq!(DEEP_ERROR.status(), Some(409));
        assert_eq!(APP_ERROR.status(), None);
        assert_eq!(HandlerError::runtime("boom").status(), 500);
        assert_eq!(HandlerError::not_found("x").status(), 404);
        assert_eq!(HandlerError::not_found("x").with_status(410).status(), 410);
    }

    #[test]
    fn test_closest_mapper_wins_over_priority() {
        let mappers = ExceptionMappers::new()
            .register_with_priority(&RUNTIME, 1, tagged("runtime"))
            .register_with_priority(&APP_ERROR, 9000, tagged("app"));
        let response = mappers.map(HandlerError::new(&DEEP_ERROR, "deep"));
        assert_eq!(response.entity(), b"app");
    }

    #[test]
    fn test_priority_breaks_equal_distance() {
        let mappers = ExceptionMappers::new()
            .register_with_priority(&APP_ERROR, 200, tagged("low"))
            .register_with_priority(&APP_ERROR, 100, tagged("high"));
        let response = mappers.map(HandlerError::new(&APP_ERROR, "x"));
        assert_eq!(response.entity(), b"high");
    }

    #[test]
    fn test_registration_order_breaks_full_tie() {
        let mappers = ExceptionMappers::new()
            .register(&APP_ERROR, tagged("first"))
            .register(&APP_ERROR, tagged("second"));
        let response = mappers.map(HandlerError::new(&APP_ERROR, "x"));
        assert_eq!(response.entity(), b"first");
    }

    #[test]
    fn test_unmapped_uses_embedded_response() {
        let mappers = ExceptionMappers::new().register(&APP_ERROR, tagged("app"));
        let response = mappers.map(HandlerError::method_not_allowed(&[Method::GET, Method::PUT]));
        assert_eq!(response.status(), 405);
        assert_eq!(response.header_value("allow"), Some("GET, PUT"));

        let response = mappers.map(HandlerError::bad_request("nope"));
        assert_eq!(response.status(), 400);
        assert_eq!(response.entity(), b"nope");
    }
}

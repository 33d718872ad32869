use super::core::MatchResult;
use super::select::Selected;
use crate::exception::HandlerError;
use crate::media::MediaType;
use crate::model::{Instance, ParamValue, ResourceMethod};
use crate::runtime::{RequestInstances, RuntimeResource};
use crate::server::{AsyncResponse, Request, Response};
use crate::uri::{self, PathSegment, UriTemplate};
use http::Method;
use may::sync::mpsc;
use std::any::Any;
use std::sync::Arc;

/// Request-scoped state handed to handlers and locators.
pub struct RequestContext {
    pub(crate) request: Request,
    pub(crate) matched: MatchResult,
    pub(crate) params: Vec<(Arc<str>, ParamValue)>,
    pub(crate) instances: RequestInstances,
    pub(crate) current_instance: Option<Instance>,
    pub(crate) selected: Option<Selected>,
    pub(crate) suspended: Option<mpsc::Receiver<Result<Response, HandlerError>>>,
    pub(crate) suspend_timeout_ms: u64,
    query_decoded: Vec<(String, String)>,
    query_encoded: Vec<(String, String)>,
}

impl RequestContext {
    #[must_use]
    pub fn new(request: Request) -> Self {
        let query = request.query().unwrap_or("");
        let query_decoded = uri::parse_query(query, true);
        let query_encoded = uri::parse_query(query, false);
        Self {
            request,
            matched: MatchResult::default(),
            params: Vec::new(),
            instances: RequestInstances::new(),
            current_instance: None,
            selected: None,
            suspended: None,
            suspend_timeout_ms: 0,
            query_decoded,
            query_encoded,
        }
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Everything the matcher accumulated so far.
    #[must_use]
    pub fn match_result(&self) -> &MatchResult {
        &self.matched
    }

    /// Matched URIs, most specific first, still percent-encoded.
    #[must_use]
    pub fn matched_uris(&self) -> Vec<&str> {
        self.matched.matched_uris.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn matched_uris_decoded(&self) -> Vec<String> {
        self.matched
            .matched_uris
            .iter()
            .map(|u| uri::decode(u).into_owned())
            .collect()
    }

    /// Matched resource nodes, most specific first.
    #[must_use]
    pub fn matched_resources(&self) -> Vec<&Arc<RuntimeResource>> {
        self.matched.matched_resources.iter().collect()
    }

    /// Matched templates, most specific first.
    #[must_use]
    pub fn matched_templates(&self) -> Vec<&UriTemplate> {
        self.matched.matched_templates.iter().collect()
    }

    /// Last decoded value bound to a path parameter.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.matched.path_param(name)
    }

    /// Every decoded value bound to `name`, in binding order.
    #[must_use]
    pub fn path_param_values(&self, name: &str) -> Vec<&str> {
        self.matched.path_param_values(name)
    }

    #[must_use]
    pub fn encoded_path_param(&self, name: &str) -> Option<&str> {
        self.matched.encoded_path_param(name)
    }

    /// Last decoded query value for `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_decoded
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_param_values(&self, name: &str, decoded: bool) -> Vec<&str> {
        let source = if decoded {
            &self.query_decoded
        } else {
            &self.query_encoded
        };
        source
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header_value(name)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.request.cookie(name)
    }

    /// Path segments of the request with their matrix parameters.
    #[must_use]
    pub fn path_segments(&self, decoded: bool) -> Vec<PathSegment> {
        uri::path_segments(self.request.path(), decoded)
    }

    /// Resolved value of a declared parameter of the running method.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ParamValue::as_str)
    }

    /// The instance of the class owning the running method.
    #[must_use]
    pub fn instance<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let instance = self.current_instance.as_ref()?;
        Arc::clone(instance).downcast::<T>().ok()
    }

    /// Negotiated response type, once a method is selected.
    #[must_use]
    pub fn response_type(&self) -> Option<&MediaType> {
        self.selected.as_ref().map(|s| &s.response_type)
    }

    #[must_use]
    pub fn selected_method(&self) -> Option<&ResourceMethod> {
        self.selected.as_ref().map(|s| &s.method)
    }

    /// Suspend the response. The value returned by the running handler is
    /// discarded; the response is whatever is later passed to
    /// [`AsyncResponse::resume`].
    pub fn suspend(&mut self) -> AsyncResponse {
        let (tx, rx) = mpsc::channel();
        self.suspended = Some(rx);
        AsyncResponse::new(tx, self.suspend_timeout_ms)
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }
}

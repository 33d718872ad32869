use super::introspect::ClassModel;
use super::parameter::Parameter;
use super::resource::Resource;
use crate::exception::HandlerError;
use crate::media::{self, MediaType, WILDCARD_TYPE};
use crate::router::RequestContext;
use crate::server::Response;
use http::Method;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque resource instance supplied by the lifecycle manager.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A resource method body.
pub type HandlerFn = Arc<dyn Fn(&mut RequestContext) -> Result<Response, HandlerError> + Send + Sync>;

/// A sub-resource locator body. `Ok(None)` means "no such resource".
pub type LocatorFn =
    Arc<dyn Fn(&mut RequestContext) -> Result<Option<SubResource>, HandlerError> + Send + Sync>;

/// What a locator hands back for the rest of the match.
pub enum SubResource {
    /// Instantiate the class according to its scope.
    Class(Arc<ClassModel>),
    /// Use this instance of the class.
    Instance(Arc<ClassModel>, Instance),
    /// A programmatically built resource.
    Resource(Resource),
}

impl SubResource {
    /// Wrap a concrete value as an instance of `class`.
    pub fn instance<T: Any + Send + Sync>(class: Arc<ClassModel>, value: T) -> Self {
        SubResource::Instance(class, Arc::new(value))
    }
}

impl fmt::Debug for SubResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubResource::Class(c) => write!(f, "Class({})", c.name()),
            SubResource::Instance(c, _) => write!(f, "Instance({})", c.name()),
            SubResource::Resource(r) => write!(f, "Resource({:?})", r.path()),
        }
    }
}

#[derive(Clone)]
pub enum Invocable {
    Handler(HandlerFn),
    Locator(LocatorFn),
}

/// An HTTP-method-bound handler or a sub-resource locator.
#[derive(Clone)]
pub struct ResourceMethod {
    pub(crate) http_method: Option<Method>,
    pub(crate) name: Arc<str>,
    pub(crate) consumes: Vec<MediaType>,
    pub(crate) produces: Vec<MediaType>,
    pub(crate) invalid_media: Vec<String>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) invocable: Invocable,
    pub(crate) owner: Option<Arc<ClassModel>>,
}

impl ResourceMethod {
    /// Start building a resource method for `method`.
    pub fn handler<F>(method: Method, f: F) -> ResourceMethodBuilder
    where
        F: Fn(&mut RequestContext) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        ResourceMethodBuilder::new(Some(method), Invocable::Handler(Arc::new(f)))
    }

    /// Start building a sub-resource locator.
    pub fn locator<F>(f: F) -> ResourceMethodBuilder
    where
        F: Fn(&mut RequestContext) -> Result<Option<SubResource>, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        ResourceMethodBuilder::new(None, Invocable::Locator(Arc::new(f)))
    }

    /// `None` for locators.
    #[must_use]
    pub fn http_method(&self) -> Option<&Method> {
        self.http_method.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    #[must_use]
    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    /// Declared consumes, or `*/*` when none.
    #[must_use]
    pub fn effective_consumes(&self) -> Vec<MediaType> {
        if self.consumes.is_empty() {
            vec![WILDCARD_TYPE.clone()]
        } else {
            self.consumes.clone()
        }
    }

    /// Declared produces, or `*/*` when none.
    #[must_use]
    pub fn effective_produces(&self) -> Vec<MediaType> {
        if self.produces.is_empty() {
            vec![WILDCARD_TYPE.clone()]
        } else {
            self.produces.clone()
        }
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn owner(&self) -> Option<&Arc<ClassModel>> {
        self.owner.as_ref()
    }

    #[must_use]
    pub fn is_locator(&self) -> bool {
        matches!(self.invocable, Invocable::Locator(_))
    }

    #[must_use]
    pub fn invocable(&self) -> &Invocable {
        &self.invocable
    }

    /// Inherit class-level media types when the method declares none.
    pub(crate) fn inherit_media(&mut self, consumes: &[MediaType], produces: &[MediaType]) {
        if self.consumes.is_empty() {
            self.consumes = consumes.to_vec();
        }
        if self.produces.is_empty() {
            self.produces = produces.to_vec();
        }
    }

    /// Diagnostic label, `Owner::name` when the owner is known.
    #[must_use]
    pub fn location(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}::{}", owner.name(), self.name),
            None => self.name.to_string(),
        }
    }
}

impl fmt::Debug for ResourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceMethod")
            .field("http_method", &self.http_method)
            .field("name", &self.name)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("parameters", &self.parameters)
            .field("locator", &self.is_locator())
            .finish()
    }
}

/// Builder for [`ResourceMethod`].
pub struct ResourceMethodBuilder {
    inner: ResourceMethod,
}

impl ResourceMethodBuilder {
    pub(crate) fn new(http_method: Option<Method>, invocable: Invocable) -> Self {
        let name = match &http_method {
            Some(m) => m.as_str().to_ascii_lowercase(),
            None => "locator".to_string(),
        };
        Self {
            inner: ResourceMethod {
                http_method,
                name: Arc::from(name),
                consumes: Vec::new(),
                produces: Vec::new(),
                invalid_media: Vec::new(),
                parameters: Vec::new(),
                invocable,
                owner: None,
            },
        }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.inner.name = Arc::from(name);
        self
    }

    fn parse_into(&mut self, types: &[&str], consumes: bool) {
        for t in types {
            match media::parse_list(&[t]) {
                Ok(list) if consumes => self.inner.consumes.extend(list),
                Ok(list) => self.inner.produces.extend(list),
                Err(e) => self.inner.invalid_media.push(e.to_string()),
            }
        }
    }

    /// Add consumed media types; malformed entries surface as model issues.
    #[must_use]
    pub fn consumes(mut self, types: &[&str]) -> Self {
        self.parse_into(types, true);
        self
    }

    /// Add produced media types; malformed entries surface as model issues.
    #[must_use]
    pub fn produces(mut self, types: &[&str]) -> Self {
        self.parse_into(types, false);
        self
    }

    #[must_use]
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.inner.parameters.push(parameter);
        self
    }

    #[must_use]
    pub(crate) fn owner(mut self, owner: Arc<ClassModel>) -> Self {
        self.inner.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn build(self) -> ResourceMethod {
        self.inner
    }
}

//! Class and method models standing in for annotated resource classes.
//!
//! A [`ClassModel`] carries the annotation equivalents that influence routing
//! (`Path`, HTTP method designators, `Produces`, `Consumes`), a lifecycle
//! scope and an instance factory. [`resource_from_class`] classifies its
//! methods into resource methods, sub-resource methods and sub-resource
//! locators and assembles the static [`Resource`] node.

use super::method::{
    HandlerFn, Instance, Invocable, LocatorFn, ResourceMethod, ResourceMethodBuilder, SubResource,
};
use super::parameter::Parameter;
use super::resource::Resource;
use super::validate::ResourceModelIssue;
use crate::exception::HandlerError;
use crate::media::{self, MediaType};
use crate::router::RequestContext;
use crate::server::Response;
use http::Method;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Path(String),
    HttpMethod(Method),
    Produces(Vec<String>),
    Consumes(Vec<String>),
}

/// Lifecycle scope of a resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    PerRequest,
    Singleton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

pub type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

#[derive(Clone)]
pub enum MethodBody {
    Handler(HandlerFn),
    Locator(LocatorFn),
}

/// One method of a resource class.
#[derive(Clone)]
pub struct MethodModel {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub parameters: Vec<Parameter>,
    pub visibility: Visibility,
    pub synthetic: bool,
    pub bridge: bool,
    pub body: MethodBody,
}

impl MethodModel {
    pub fn handler<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        Self::with_body(name, MethodBody::Handler(Arc::new(f)))
    }

    pub fn locator<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<Option<SubResource>, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        Self::with_body(name, MethodBody::Locator(Arc::new(f)))
    }

    fn with_body(name: &str, body: MethodBody) -> Self {
        Self {
            name: name.to_string(),
            annotations: Vec::new(),
            parameters: Vec::new(),
            visibility: Visibility::Public,
            synthetic: false,
            bridge: false,
            body,
        }
    }

    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn http(self, method: Method) -> Self {
        self.annotate(Annotation::HttpMethod(method))
    }

    #[must_use]
    pub fn get(self) -> Self {
        self.http(Method::GET)
    }

    #[must_use]
    pub fn path(self, path: &str) -> Self {
        self.annotate(Annotation::Path(path.to_string()))
    }

    #[must_use]
    pub fn produces(self, types: &[&str]) -> Self {
        self.annotate(Annotation::Produces(
            types.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[must_use]
    pub fn consumes(self, types: &[&str]) -> Self {
        self.annotate(Annotation::Consumes(
            types.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[must_use]
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    #[must_use]
    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    #[must_use]
    pub fn bridge(mut self) -> Self {
        self.bridge = true;
        self
    }

    #[must_use]
    pub fn http_methods(&self) -> Vec<&Method> {
        self.annotations
            .iter()
            .filter_map(|a| match a {
                Annotation::HttpMethod(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn path_annotation(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Path(p) => Some(p.as_str()),
            _ => None,
        })
    }
}

impl fmt::Debug for MethodModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodModel")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// A resource class.
#[derive(Clone)]
pub struct ClassModel {
    name: Arc<str>,
    annotations: Vec<Annotation>,
    methods: Vec<MethodModel>,
    scope: Scope,
    factory: Option<Factory>,
}

impl ClassModel {
    pub fn builder(name: &str) -> ClassModelBuilder {
        ClassModelBuilder {
            class: ClassModel {
                name: Arc::from(name),
                annotations: Vec::new(),
                methods: Vec::new(),
                scope: Scope::PerRequest,
                factory: None,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodModel] {
        &self.methods
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Create a new instance, if the class has a factory.
    #[must_use]
    pub fn instantiate(&self) -> Option<Instance> {
        self.factory.as_ref().map(|f| f())
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Path(p) => Some(p.as_str()),
            _ => None,
        })
    }

    fn media(&self, consumes: bool) -> Vec<&String> {
        self.annotations
            .iter()
            .filter_map(|a| match (a, consumes) {
                (Annotation::Consumes(v), true) | (Annotation::Produces(v), false) => Some(v),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl fmt::Debug for ClassModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassModel")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .field("methods", &self.methods)
            .field("scope", &self.scope)
            .finish()
    }
}

pub struct ClassModelBuilder {
    class: ClassModel,
}

impl ClassModelBuilder {
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.class.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn path(self, path: &str) -> Self {
        self.annotate(Annotation::Path(path.to_string()))
    }

    #[must_use]
    pub fn produces(self, types: &[&str]) -> Self {
        self.annotate(Annotation::Produces(
            types.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[must_use]
    pub fn consumes(self, types: &[&str]) -> Self {
        self.annotate(Annotation::Consumes(
            types.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.class.scope = scope;
        self
    }

    #[must_use]
    pub fn factory<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.class.factory = Some(Arc::new(move || Arc::new(f()) as Instance));
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodModel) -> Self {
        self.class.methods.push(method);
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<ClassModel> {
        Arc::new(self.class)
    }
}

/// Public, non-synthetic, non-bridge methods of a class, with filters.
pub struct MethodList<'a> {
    methods: Vec<&'a MethodModel>,
}

impl<'a> MethodList<'a> {
    #[must_use]
    pub fn new(class: &'a ClassModel) -> Self {
        Self {
            methods: class
                .methods
                .iter()
                .filter(|m| m.visibility == Visibility::Public && !m.synthetic && !m.bridge)
                .collect(),
        }
    }

    fn filter(self, keep: impl Fn(&MethodModel) -> bool) -> Self {
        Self {
            methods: self.methods.into_iter().filter(|m| keep(m)).collect(),
        }
    }

    #[must_use]
    pub fn with_http_method(self) -> Self {
        self.filter(|m| !m.http_methods().is_empty())
    }

    #[must_use]
    pub fn without_http_method(self) -> Self {
        self.filter(|m| m.http_methods().is_empty())
    }

    #[must_use]
    pub fn with_path(self) -> Self {
        self.filter(|m| m.path_annotation().is_some())
    }

    #[must_use]
    pub fn without_path(self) -> Self {
        self.filter(|m| m.path_annotation().is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a MethodModel> + '_ {
        self.methods.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

fn parse_media(values: &[&String], issues: &mut Vec<ResourceModelIssue>, location: &str) -> Vec<MediaType> {
    match media::parse_list(values) {
        Ok(list) => list,
        Err(e) => {
            issues.push(ResourceModelIssue::fatal(location, format!("invalid media type: {e}")));
            Vec::new()
        }
    }
}

/// Build the static resource node for a class.
///
/// The class `Path` becomes the node path (absent for classes only reached
/// through locators). Issues found while classifying are stored on the node
/// and reported by the model builder.
#[must_use]
pub fn resource_from_class(class: &Arc<ClassModel>) -> Resource {
    let mut resource = Resource {
        path: class.path().map(str::to_string),
        names: vec![class.name_arc()],
        ..Resource::default()
    };
    let class_consumes = parse_media(&class.media(true), &mut resource.issues, class.name());
    let class_produces = parse_media(&class.media(false), &mut resource.issues, class.name());

    for model in MethodList::new(class).iter() {
        let location = format!("{}::{}", class.name(), model.name);
        let designators = model.http_methods();
        if designators.len() > 1 {
            resource.issues.push(ResourceModelIssue::fatal(
                &location,
                format!("method declares {} HTTP method designators", designators.len()),
            ));
            continue;
        }
        let sub_path = model.path_annotation();
        if designators.is_empty() && sub_path.is_none() {
            continue;
        }

        let builder = match (&model.body, designators.first()) {
            (MethodBody::Handler(f), Some(m)) => {
                ResourceMethodBuilder::new(Some((*m).clone()), Invocable::Handler(Arc::clone(f)))
            }
            (MethodBody::Locator(f), None) => {
                ResourceMethodBuilder::new(None, Invocable::Locator(Arc::clone(f)))
            }
            (MethodBody::Locator(_), Some(_)) => {
                resource.issues.push(ResourceModelIssue::fatal(
                    &location,
                    "resource method body returns a sub-resource",
                ));
                continue;
            }
            (MethodBody::Handler(_), None) => {
                resource.issues.push(ResourceModelIssue::fatal(
                    &location,
                    "sub-resource locator body returns a response",
                ));
                continue;
            }
        };
        let mut method = apply_method_annotations(builder, model)
            .owner(Arc::clone(class))
            .build();
        method.inherit_media(&class_consumes, &class_produces);

        match sub_path {
            Some(p) if !p.trim().trim_matches('/').is_empty() => {
                let mut child = Resource {
                    path: Some(p.to_string()),
                    names: vec![class.name_arc()],
                    ..Resource::default()
                };
                if method.is_locator() {
                    child.locators.push(method);
                } else {
                    child.methods.push(method);
                }
                resource.add_child(child);
            }
            Some(_) => {
                resource.issues.push(ResourceModelIssue::warning(
                    &location,
                    "empty sub-resource path; method attached to the enclosing resource",
                ));
                push_method(&mut resource, method);
            }
            None => push_method(&mut resource, method),
        }
    }
    resource
}

fn push_method(resource: &mut Resource, method: ResourceMethod) {
    if method.is_locator() {
        resource.locators.push(method);
    } else {
        resource.methods.push(method);
    }
}

fn apply_method_annotations(mut builder: ResourceMethodBuilder, model: &MethodModel) -> ResourceMethodBuilder {
    builder = builder.named(&model.name);
    for annotation in &model.annotations {
        builder = match annotation {
            Annotation::Produces(v) => {
                let v: Vec<&str> = v.iter().map(String::as_str).collect();
                builder.produces(&v)
            }
            Annotation::Consumes(v) => {
                let v: Vec<&str> = v.iter().map(String::as_str).collect();
                builder.consumes(&v)
            }
            _ => builder,
        };
    }
    for parameter in &model.parameters {
        builder = builder.param(parameter.clone());
    }
    builder
}

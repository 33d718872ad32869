//! Declarative resource descriptors.
//!
//! A descriptor file (YAML, JSON or TOML) declares named classes with their
//! paths, media types, methods and locators. Methods answer with a static
//! response whose body may reference path parameters as `{name}`; without
//! a body they echo what was matched as JSON. Locators name the class they
//! return, so descriptors can describe recursive resource graphs.
//!
//! ```yaml
//! classes:
//!   - name: Parent
//!     path: parent
//!     methods:
//!       - method: GET
//!         response: { body: "parent" }
//!       - name: child
//!         path: "child/{id}"
//!         locator: Child
//!   - name: Child
//!     produces: [text/plain]
//!     methods:
//!       - method: GET
//!         response: { body: "child {id}" }
//!       - name: next
//!         path: "{id}"
//!         locator: Child
//! ```

use crate::exception::HandlerError;
use crate::model::{
    ClassModel, MethodModel, ParamType, Parameter, ResourceModelBuilder, Scope, Source,
    SubResource,
};
use crate::router::RequestContext;
use crate::server::Response;
use anyhow::{bail, Context, Result};
use http::Method;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeDescriptor {
    #[default]
    PerRequest,
    Singleton,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub scope: ScopeDescriptor,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    /// HTTP verb; absent for locators.
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    #[serde(default)]
    pub response: Option<StaticResponse>,
    /// Name of the class this locator returns.
    #[serde(default)]
    pub locator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub source: Source,
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: ParamType,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub encoded: bool,
    #[serde(default)]
    pub multi: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_status() -> u16 {
    200
}

impl Default for StaticResponse {
    fn default() -> Self {
        Self {
            status: default_status(),
            body: None,
            content_type: None,
            headers: BTreeMap::new(),
        }
    }
}

type ClassRegistry = Arc<OnceCell<HashMap<String, Arc<ClassModel>>>>;

/// Replace `{name}` with the bound path parameter, or the resolved
/// parameter of the same name. Unknown names and braces around anything
/// other than a parameter name are left as written.
fn substitute(template: &str, ctx: &RequestContext) -> String {
    let is_name = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let len = after.find(|c: char| !is_name(c)).unwrap_or(after.len());
        let name = &after[..len];
        let value = if !name.is_empty() && after[len..].starts_with('}') {
            ctx.path_param(name).or_else(|| ctx.param_str(name))
        } else {
            None
        };
        match value {
            Some(value) => {
                out.push_str(value);
                rest = &after[len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn echo(ctx: &RequestContext, class: &str, method: &str) -> Response {
    let mut params = serde_json::Map::new();
    for (name, value) in &ctx.match_result().path_params {
        params.insert(name.to_string(), json!(value));
    }
    Response::json(&json!({
        "resource": class,
        "method": method,
        "matched_uris": ctx.matched_uris(),
        "path_params": params,
        "query": ctx.request().query(),
    }))
}

fn static_handler(
    response: Option<StaticResponse>,
    class: String,
    method: String,
) -> impl Fn(&mut RequestContext) -> Result<Response, HandlerError> + Send + Sync + 'static {
    move |ctx| {
        let canned = response.clone().unwrap_or_default();
        let mut out = match &canned.body {
            Some(body) => Response::text(substitute(body, ctx)),
            None => echo(ctx, &class, &method),
        };
        out.set_status(canned.status);
        if let Some(content_type) = &canned.content_type {
            out = out.content_type(content_type);
        }
        for (name, value) in &canned.headers {
            out = out.header(name, &substitute(value, ctx));
        }
        Ok(out)
    }
}

fn locator_handler(
    target: String,
    registry: ClassRegistry,
) -> impl Fn(&mut RequestContext) -> Result<Option<SubResource>, HandlerError> + Send + Sync + 'static
{
    move |_ctx| {
        let class = registry
            .get()
            .and_then(|classes| classes.get(&target))
            .ok_or_else(|| HandlerError::internal(format!("locator target `{target}` is not declared")))?;
        Ok(Some(SubResource::Class(Arc::clone(class))))
    }
}

fn parameter(p: &ParamDescriptor) -> Parameter {
    let mut parameter = if p.source == Source::Entity {
        Parameter::entity(p.ty)
    } else {
        Parameter::new(p.source, &p.name).of_type(p.ty)
    };
    if let Some(default) = &p.default {
        parameter = parameter.with_default(default);
    }
    if p.encoded {
        parameter = parameter.encoded();
    }
    if p.multi {
        parameter = parameter.multi();
    }
    parameter
}

fn method_model(
    class: &ClassDescriptor,
    index: usize,
    m: &MethodDescriptor,
    registry: &ClassRegistry,
) -> Result<MethodModel> {
    let name = m.name.clone().unwrap_or_else(|| match &m.method {
        Some(verb) => verb.to_ascii_lowercase(),
        None => format!("method{index}"),
    });
    let mut model = match (&m.locator, &m.method) {
        (Some(_), Some(verb)) => bail!(
            "{}::{name}: a method cannot declare both `method: {verb}` and a locator",
            class.name
        ),
        (Some(target), None) => {
            MethodModel::locator(&name, locator_handler(target.clone(), Arc::clone(registry)))
        }
        (None, Some(verb)) => {
            let verb = Method::from_bytes(verb.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("{}::{name}: invalid HTTP method `{verb}`", class.name))?;
            MethodModel::handler(
                &name,
                static_handler(m.response.clone(), class.name.clone(), name.clone()),
            )
            .http(verb)
        }
        (None, None) => bail!(
            "{}::{name}: a method needs either `method` or `locator`",
            class.name
        ),
    };
    if let Some(path) = &m.path {
        model = model.path(path);
    }
    if !m.produces.is_empty() {
        let produces: Vec<&str> = m.produces.iter().map(String::as_str).collect();
        model = model.produces(&produces);
    }
    if !m.consumes.is_empty() {
        let consumes: Vec<&str> = m.consumes.iter().map(String::as_str).collect();
        model = model.consumes(&consumes);
    }
    for p in &m.params {
        model = model.param(parameter(p));
    }
    Ok(model)
}

impl Descriptor {
    /// Parse descriptor text in the format implied by `extension`.
    ///
    /// # Errors
    ///
    /// Unsupported extensions and parse failures.
    pub fn parse(text: &str, extension: &str) -> Result<Self> {
        match extension {
            "yaml" | "yml" => serde_yaml::from_str(text).context("invalid YAML descriptor"),
            "json" => serde_json::from_str(text).context("invalid JSON descriptor"),
            "toml" => toml::from_str(text).context("invalid TOML descriptor"),
            other => bail!("unsupported descriptor format `{other}` (expected yaml, json or toml)"),
        }
    }

    /// # Errors
    ///
    /// Unreadable files, unsupported extensions and parse failures.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read descriptor {}", path.display()))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::parse(&text, extension).with_context(|| format!("in {}", path.display()))
    }

    /// Class models for every declared class, keyed by name.
    ///
    /// # Errors
    ///
    /// Duplicate class names, invalid verbs and methods that are neither
    /// handlers nor locators.
    pub fn classes(&self) -> Result<HashMap<String, Arc<ClassModel>>> {
        let registry: ClassRegistry = Arc::new(OnceCell::new());
        let mut classes = HashMap::new();
        for class in &self.classes {
            let mut builder = ClassModel::builder(&class.name).scope(match class.scope {
                ScopeDescriptor::PerRequest => Scope::PerRequest,
                ScopeDescriptor::Singleton => Scope::Singleton,
            });
            if let Some(path) = &class.path {
                builder = builder.path(path);
            }
            if !class.produces.is_empty() {
                let produces: Vec<&str> = class.produces.iter().map(String::as_str).collect();
                builder = builder.produces(&produces);
            }
            if !class.consumes.is_empty() {
                let consumes: Vec<&str> = class.consumes.iter().map(String::as_str).collect();
                builder = builder.consumes(&consumes);
            }
            for (index, m) in class.methods.iter().enumerate() {
                builder = builder.method(method_model(class, index, m, &registry)?);
            }
            if classes.insert(class.name.clone(), builder.build()).is_some() {
                bail!("class `{}` is declared twice", class.name);
            }
        }
        for (class, target) in self.classes.iter().flat_map(|c| {
            c.methods
                .iter()
                .filter_map(move |m| m.locator.as_ref().map(|t| (&c.name, t)))
        }) {
            if !classes.contains_key(target) {
                bail!("class `{class}` has a locator returning undeclared class `{target}`");
            }
        }
        if registry.set(classes.clone()).is_err() {
            bail!("descriptor class registry initialized twice");
        }
        Ok(classes)
    }

    /// Number of classes that declare a path and so become roots.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.classes.iter().filter(|c| c.path.is_some()).count()
    }

    /// A model builder with every class that declares a path as a root.
    ///
    /// # Errors
    ///
    /// See [`classes`](Self::classes).
    pub fn to_builder(&self) -> Result<ResourceModelBuilder> {
        let classes = self.classes()?;
        let mut builder = ResourceModelBuilder::new();
        for class in &self.classes {
            if class.path.is_some() {
                if let Some(model) = classes.get(&class.name) {
                    builder.add_class(Arc::clone(model));
                }
            }
        }
        Ok(builder)
    }
}

/// Load a descriptor file straight into a model builder.
///
/// # Errors
///
/// See [`Descriptor::from_file`] and [`Descriptor::to_builder`].
pub fn load_builder(path: &Path) -> Result<ResourceModelBuilder> {
    Descriptor::from_file(path)?.to_builder()
}

use crate::model::ResourceMethod;
use crate::uri::UriTemplate;
use http::Method;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// A matching-time node: one compiled regex shared by every static
/// resource grouped into it.
pub struct RuntimeResource {
    pub(crate) template: UriTemplate,
    pub(crate) templates: Vec<UriTemplate>,
    pub(crate) bindings: Vec<(Arc<str>, usize)>,
    pub(crate) names: Vec<Arc<str>>,
    pub(crate) methods: Vec<ResourceMethod>,
    pub(crate) locator: Option<ResourceMethod>,
    pub(crate) children: Vec<Arc<RuntimeResource>>,
    pub(crate) dynamic: bool,
}

impl RuntimeResource {
    /// The representative template, highest priority of the group.
    #[must_use]
    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    /// Every constituent template, in declaration order.
    #[must_use]
    pub fn templates(&self) -> &[UriTemplate] {
        &self.templates
    }

    /// `(name, group)` pairs of all constituent templates, deduplicated.
    #[must_use]
    pub fn bindings(&self) -> &[(Arc<str>, usize)] {
        &self.bindings
    }

    /// Names of the contributing classes or programmatic resources.
    #[must_use]
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    #[must_use]
    pub fn methods(&self) -> &[ResourceMethod] {
        &self.methods
    }

    #[must_use]
    pub fn locator(&self) -> Option<&ResourceMethod> {
        self.locator.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<RuntimeResource>] {
        &self.children
    }

    /// Built at request time from a locator result.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    #[must_use]
    pub fn has_method(&self, method: &Method) -> bool {
        self.methods
            .iter()
            .any(|m| m.http_method() == Some(method))
    }

    /// Declared verbs in declaration order, without duplicates.
    #[must_use]
    pub fn http_methods(&self) -> Vec<Method> {
        let mut out: Vec<Method> = Vec::new();
        for m in self.methods.iter().filter_map(ResourceMethod::http_method) {
            if !out.contains(m) {
                out.push(m.clone());
            }
        }
        out
    }

    /// JSON description used for OPTIONS and the `routes` listing.
    #[must_use]
    pub fn describe(&self) -> Value {
        let methods: Vec<Value> = self
            .methods
            .iter()
            .map(|m| {
                json!({
                    "method": m.http_method().map(Method::as_str),
                    "name": m.name(),
                    "consumes": m.effective_consumes().iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "produces": m.effective_produces().iter().map(ToString::to_string).collect::<Vec<_>>(),
                })
            })
            .collect();
        json!({
            "template": self.template.to_string(),
            "resources": self.names.iter().map(|n| n.as_ref()).collect::<Vec<_>>(),
            "methods": methods,
            "locator": self.locator.is_some(),
            "children": self.children.iter().map(|c| c.template.to_string()).collect::<Vec<_>>(),
        })
    }
}

impl fmt::Debug for RuntimeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeResource")
            .field("template", &self.template.template())
            .field("names", &self.names)
            .field("methods", &self.http_methods())
            .field("locator", &self.locator.is_some())
            .field("children", &self.children.len())
            .finish()
    }
}

/// The compiled, immutable routing model.
#[derive(Debug, Default)]
pub struct RuntimeResourceModel {
    pub(crate) roots: Vec<Arc<RuntimeResource>>,
}

impl RuntimeResourceModel {
    /// Root nodes in matching order.
    #[must_use]
    pub fn roots(&self) -> &[Arc<RuntimeResource>] {
        &self.roots
    }

    /// One line per method and locator, depth first, as `VERB /full/template`.
    #[must_use]
    pub fn route_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut stack: Vec<(String, &Arc<RuntimeResource>)> = self
            .roots
            .iter()
            .rev()
            .map(|r| (String::new(), r))
            .collect();
        while let Some((prefix, node)) = stack.pop() {
            let full = format!("{prefix}{}", node.template.template());
            let shown = if full.is_empty() { "/" } else { full.as_str() };
            for m in &node.methods {
                let verb = m.http_method().map_or("?", Method::as_str);
                let produces: Vec<String> =
                    m.effective_produces().iter().map(ToString::to_string).collect();
                lines.push(format!(
                    "{verb:<8} {shown}  -> {} [{}]",
                    m.location(),
                    produces.join(", ")
                ));
            }
            if let Some(locator) = &node.locator {
                lines.push(format!("{:<8} {shown}  -> {}", "LOCATOR", locator.location()));
            }
            for child in node.children.iter().rev() {
                stack.push((full.clone(), child));
            }
        }
        lines
    }
}

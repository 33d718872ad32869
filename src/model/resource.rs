use super::method::{ResourceMethod, SubResource};
use super::validate::ResourceModelIssue;
use crate::exception::HandlerError;
use crate::router::RequestContext;
use crate::server::Response;
use crate::uri::normalize;
use http::Method;
use std::sync::Arc;

/// A node of the static resource tree.
#[derive(Clone, Debug, Default)]
pub struct Resource {
    pub(crate) path: Option<String>,
    pub(crate) names: Vec<Arc<str>>,
    pub(crate) methods: Vec<ResourceMethod>,
    pub(crate) locators: Vec<ResourceMethod>,
    pub(crate) children: Vec<Resource>,
    pub(crate) issues: Vec<ResourceModelIssue>,
}

impl Resource {
    /// Builder for a resource at `path`.
    pub fn builder(path: &str) -> ResourceBuilder {
        ResourceBuilder {
            resource: Resource {
                path: Some(path.to_string()),
                ..Resource::default()
            },
        }
    }

    /// Builder for a resource without a path, e.g. one returned by a locator.
    pub fn builder_unpathed() -> ResourceBuilder {
        ResourceBuilder {
            resource: Resource::default(),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Normalized path, empty when absent.
    #[must_use]
    pub fn normalized_path(&self) -> String {
        self.path.as_deref().map(normalize).unwrap_or_default()
    }

    /// Names of the classes (or programmatic names) merged into this node.
    #[must_use]
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.names.first().map_or("", |n| n.as_ref())
    }

    #[must_use]
    pub fn methods(&self) -> &[ResourceMethod] {
        &self.methods
    }

    #[must_use]
    pub fn locator(&self) -> Option<&ResourceMethod> {
        self.locators.first()
    }

    #[must_use]
    pub fn children(&self) -> &[Resource] {
        &self.children
    }

    /// Issues recorded while introspecting the contributing classes.
    #[must_use]
    pub fn issues(&self) -> &[ResourceModelIssue] {
        &self.issues
    }

    /// Fold `other` into this node: names, methods, locators and issues are
    /// appended and same-path children are merged recursively.
    pub fn merge(&mut self, other: Resource) {
        for name in other.names {
            if !self.names.contains(&name) {
                self.names.push(name);
            }
        }
        self.methods.extend(other.methods);
        self.locators.extend(other.locators);
        self.issues.extend(other.issues);
        for child in other.children {
            self.add_child(child);
        }
    }

    pub(crate) fn add_child(&mut self, child: Resource) {
        let path = child.normalized_path();
        match self
            .children
            .iter_mut()
            .find(|c| c.normalized_path() == path)
        {
            Some(existing) => existing.merge(child),
            None => self.children.push(child),
        }
    }
}

/// Programmatic builder for [`Resource`].
pub struct ResourceBuilder {
    resource: Resource,
}

impl ResourceBuilder {
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.resource.names.push(Arc::from(name));
        self
    }

    #[must_use]
    pub fn method(mut self, method: ResourceMethod) -> Self {
        if method.is_locator() {
            self.resource.locators.push(method);
        } else {
            self.resource.methods.push(method);
        }
        self
    }

    /// Shortcut for a handler without media constraints or parameters.
    #[must_use]
    pub fn handle<F>(self, method: Method, f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.method(ResourceMethod::handler(method, f).build())
    }

    /// Shortcut for a locator on this node.
    #[must_use]
    pub fn locator<F>(self, f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<Option<SubResource>, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.method(ResourceMethod::locator(f).build())
    }

    /// Add a static child; same-path children merge.
    #[must_use]
    pub fn child(mut self, child: Resource) -> Self {
        self.resource.add_child(child);
        self
    }

    #[must_use]
    pub fn build(self) -> Resource {
        self.resource
    }
}

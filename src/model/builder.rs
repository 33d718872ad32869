use super::introspect::{resource_from_class, ClassModel};
use super::resource::Resource;
use super::validate::{has_fatal, validate_resource, ModelValidationError, ResourceModelIssue};
use std::sync::Arc;
use tracing::{info, warn};

/// The validated static resource model: merged root resources plus the
/// non-fatal issues found while building it.
#[derive(Debug, Clone, Default)]
pub struct ResourceModel {
    resources: Vec<Resource>,
    issues: Vec<ResourceModelIssue>,
}

impl ResourceModel {
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Warnings collected during the build.
    #[must_use]
    pub fn issues(&self) -> &[ResourceModelIssue] {
        &self.issues
    }
}

/// Collects class models and programmatic resources into a [`ResourceModel`].
#[derive(Debug, Clone, Default)]
pub struct ResourceModelBuilder {
    classes: Vec<Arc<ClassModel>>,
    resources: Vec<Resource>,
}

impl ResourceModelBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn class(mut self, class: Arc<ClassModel>) -> Self {
        self.add_class(class);
        self
    }

    #[must_use]
    pub fn resource(mut self, resource: Resource) -> Self {
        self.add_resource(resource);
        self
    }

    pub fn add_class(&mut self, class: Arc<ClassModel>) -> &mut Self {
        self.classes.push(class);
        self
    }

    pub fn add_resource(&mut self, resource: Resource) -> &mut Self {
        self.resources.push(resource);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.resources.is_empty()
    }

    /// Introspect, merge and validate everything registered so far.
    ///
    /// The builder is left untouched, so calling `build` twice yields
    /// equivalent models.
    ///
    /// # Errors
    ///
    /// [`ModelValidationError`] with every issue when any of them is fatal.
    pub fn build(&self) -> Result<ResourceModel, ModelValidationError> {
        let mut issues = Vec::new();
        let mut roots: Vec<Resource> = Vec::new();

        let candidates = self
            .classes
            .iter()
            .map(resource_from_class)
            .chain(self.resources.iter().cloned());
        for resource in candidates {
            if resource.path().is_none() {
                issues.push(ResourceModelIssue::warning(
                    resource.name(),
                    "resource has no path and is not registered as a root resource",
                ));
                continue;
            }
            let path = resource.normalized_path();
            match roots.iter_mut().find(|r| r.normalized_path() == path) {
                Some(existing) => existing.merge(resource),
                None => roots.push(resource),
            }
        }

        for root in &roots {
            validate_resource(root, Some(<&[Arc<str>]>::default()), &mut issues);
        }

        if has_fatal(&issues) {
            return Err(ModelValidationError { issues });
        }
        for issue in &issues {
            warn!(location = %issue.location, message = %issue.message, "resource model warning");
        }
        info!(
            roots = roots.len(),
            warnings = issues.len(),
            "resource model built"
        );
        Ok(ResourceModel {
            resources: roots,
            issues,
        })
    }
}

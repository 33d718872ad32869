use super::builder::compile_dynamic;
use super::resource::RuntimeResource;
use crate::model::{resource_from_class, ClassModel, ModelValidationError};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Compiled nodes for classes returned by locators, keyed by class name.
///
/// Lookups never hold a shard lock across compilation; two requests racing
/// on the same class may both compile it and the last insert wins.
#[derive(Debug)]
pub struct LocatorCache {
    entries: DashMap<Arc<str>, Arc<RuntimeResource>>,
    enabled: bool,
}

impl Default for LocatorCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LocatorCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            enabled,
        }
    }

    /// The compiled node for `class`, introspecting it on first use.
    ///
    /// # Errors
    ///
    /// [`ModelValidationError`] when the class yields fatal issues. Failures
    /// are not cached.
    pub fn resolve(&self, class: &Arc<ClassModel>) -> Result<Arc<RuntimeResource>, ModelValidationError> {
        if self.enabled {
            if let Some(hit) = self.entries.get(class.name()) {
                return Ok(Arc::clone(hit.value()));
            }
        }
        let node = compile_dynamic(&resource_from_class(class))?;
        if self.enabled {
            debug!(class = class.name(), "locator class cached");
            self.entries.insert(class.name_arc(), Arc::clone(&node));
        }
        Ok(node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

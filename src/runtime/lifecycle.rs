use crate::model::{ClassModel, Instance, Scope};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-request instances keyed by class name.
pub type RequestInstances = HashMap<Arc<str>, Instance>;

/// Owns singleton instances and creates per-request ones.
#[derive(Default)]
pub struct Lifecycle {
    singletons: DashMap<Arc<str>, Instance>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("singletons", &self.singletons.len())
            .finish()
    }
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance serving `class` for this request, created on first use.
    /// `None` when the class has no factory.
    pub fn instance(&self, class: &ClassModel, request: &mut RequestInstances) -> Option<Instance> {
        if let Some(existing) = request.get(class.name()) {
            return Some(Arc::clone(existing));
        }
        let instance = match class.scope() {
            Scope::Singleton => self.singleton(class)?,
            Scope::PerRequest => class.instantiate()?,
        };
        request.insert(class.name_arc(), Arc::clone(&instance));
        Some(instance)
    }

    /// A fresh instance per scope: a new one for per-request classes, the
    /// shared one for singletons. Replaces any instance already bound to the
    /// class for this request.
    pub fn create(&self, class: &ClassModel, request: &mut RequestInstances) -> Option<Instance> {
        let instance = match class.scope() {
            Scope::Singleton => self.singleton(class)?,
            Scope::PerRequest => class.instantiate()?,
        };
        request.insert(class.name_arc(), Arc::clone(&instance));
        Some(instance)
    }

    fn singleton(&self, class: &ClassModel) -> Option<Instance> {
        if let Some(existing) = self.singletons.get(class.name()) {
            return Some(Arc::clone(existing.value()));
        }
        // The entry lock is held while the factory runs, so it runs once.
        let entry = self
            .singletons
            .entry(class.name_arc())
            .or_try_insert_with(|| class.instantiate().ok_or(()))
            .ok()?;
        Some(Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }
}

//! Runtime resource model: the compiled matching tree, dynamic nodes for
//! locator results, the locator class cache and instance lifecycle.

mod builder;
mod lifecycle;
mod locator;
mod resource;


pub use builder::compile_dynamic;
pub use lifecycle::{Lifecycle, RequestInstances};
pub use locator::LocatorCache;
pub use resource::{RuntimeResource, RuntimeResourceModel};

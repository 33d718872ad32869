//! Static resource model: parameters, methods, resource nodes, class
//! introspection and build-time validation.

mod builder;
mod introspect;
mod method;
mod parameter;
mod resource;
mod validate;

#[cfg(test)]
mod tests;

pub use builder::{ResourceModel, ResourceModelBuilder};
pub use introspect::{
    resource_from_class, Annotation, ClassModel, ClassModelBuilder, Factory, MethodBody,
    MethodList, MethodModel, Scope, Visibility,
};
pub use method::{
    HandlerFn, Instance, Invocable, LocatorFn, ResourceMethod, ResourceMethodBuilder, SubResource,
};
pub use parameter::{ConversionError, ParamType, ParamValue, Parameter, Source};
pub use resource::{Resource, ResourceBuilder};
pub use validate::{
    check_ambiguity, has_fatal, print_issues, validate_method, validate_resource,
    ModelValidationError, ResourceModelIssue, Severity,
};

use super::*;
use crate::server::Response;
use http::Method;
use std::sync::Arc;

const ROOT: &[Arc<str>] = &[];

fn ok(_: &mut crate::RequestContext) -> Result<Response, crate::HandlerError> {
    Ok(Response::text("ok"))
}

fn fatal_count(issues: &[ResourceModelIssue]) -> usize {
    issues.iter().filter(|i| i.is_fatal()).count()
}

#[test]
fn test_classification() {
    let class = ClassModel::builder("Pets")
        .path("pets")
        .produces(&["application/json"])
        .method(MethodModel::handler("list", ok).get())
        .method(MethodModel::handler("one", ok).get().path("{id}"))
        .method(MethodModel::locator("owner", |_| Ok(None)).path("{id}/owner"))
        .method(MethodModel::handler("helper", ok))
        .build();
    let resource = resource_from_class(&class);

    assert_eq!(resource.path(), Some("pets"));
    assert_eq!(resource.methods().len(), 1);
    assert_eq!(resource.methods()[0].name(), "list");
    assert!(resource.locator().is_none());
    assert_eq!(resource.children().len(), 2);

    let one = &resource.children()[0];
    assert_eq!(one.path(), Some("{id}"));
    assert_eq!(one.methods()[0].name(), "one");
    let owner = &resource.children()[1];
    assert!(owner.methods().is_empty());
    assert_eq!(owner.locator().map(ResourceMethod::name), Some("owner"));
    assert!(resource.issues().is_empty());
}

#[test]
fn test_class_media_inherited() {
    let class = ClassModel::builder("Docs")
        .path("docs")
        .produces(&["text/html"])
        .consumes(&["text/plain"])
        .method(MethodModel::handler("get", ok).get())
        .method(MethodModel::handler("json", ok).get().path("j").produces(&["application/json"]))
        .build();
    let resource = resource_from_class(&class);
    let get = &resource.methods()[0];
    assert_eq!(get.produces()[0].essence(), "text/html");
    assert_eq!(get.consumes()[0].essence(), "text/plain");
    let json = &resource.children()[0].methods()[0];
    assert_eq!(json.produces()[0].essence(), "application/json");
}

#[test]
fn test_method_list_filters_hidden_methods() {
    let class = ClassModel::builder("Hidden")
        .path("h")
        .method(MethodModel::handler("a", ok).get())
        .method(MethodModel::handler("b", ok).get().private())
        .method(MethodModel::handler("c", ok).get().synthetic())
        .method(MethodModel::handler("d", ok).get().bridge())
        .method(MethodModel::handler("e", ok).path("x"))
        .build();
    let list = MethodList::new(&class);
    assert_eq!(list.len(), 2);
    assert_eq!(MethodList::new(&class).with_http_method().len(), 1);
    assert_eq!(MethodList::new(&class).with_path().without_http_method().len(), 1);
    assert_eq!(resource_from_class(&class).methods().len(), 1);
}

#[test]
fn test_two_designators_are_fatal() {
    let class = ClassModel::builder("Both")
        .path("both")
        .method(MethodModel::handler("x", ok).get().http(Method::POST))
        .build();
    let err = ResourceModelBuilder::new().class(class).build().expect_err("fatal");
    assert_eq!(err.fatal_count(), 1);
}

#[test]
fn test_same_path_roots_merge() {
    let a = ClassModel::builder("A")
        .path("/shared/")
        .method(MethodModel::handler("get", ok).get())
        .build();
    let b = ClassModel::builder("B")
        .path("shared")
        .method(MethodModel::handler("put", ok).http(Method::PUT))
        .build();
    let model = ResourceModelBuilder::new().class(a).class(b).build().expect("model");
    assert_eq!(model.resources().len(), 1);
    let root = &model.resources()[0];
    assert_eq!(root.names().len(), 2);
    assert_eq!(root.methods().len(), 2);
}

#[test]
fn test_same_path_children_merge() {
    let resource = Resource::builder("outer")
        .child(Resource::builder("inner").handle(Method::GET, ok).build())
        .child(Resource::builder("/inner").handle(Method::DELETE, ok).build())
        .build();
    assert_eq!(resource.children().len(), 1);
    assert_eq!(resource.children()[0].methods().len(), 2);
}

#[test]
fn test_identical_gets_report_every_pair() {
    let resource = Resource::builder("dup")
        .handle(Method::GET, ok)
        .handle(Method::GET, ok)
        .handle(Method::GET, ok)
        .build();
    let err = ResourceModelBuilder::new()
        .resource(resource)
        .build()
        .expect_err("ambiguous");
    assert_eq!(err.issues.len(), 3);
    assert_eq!(err.fatal_count(), 3);
}

#[test]
fn test_overlapping_media_is_a_warning() {
    let resource = Resource::builder("media")
        .method(ResourceMethod::handler(Method::GET, ok).produces(&["text/*"]).build())
        .method(ResourceMethod::handler(Method::GET, ok).produces(&["text/plain"]).build())
        .build();
    let model = ResourceModelBuilder::new().resource(resource).build().expect("model");
    assert_eq!(model.issues().len(), 1);
    assert!(!model.issues()[0].is_fatal());
}

#[test]
fn test_distinct_media_is_clean() {
    let resource = Resource::builder("media")
        .method(ResourceMethod::handler(Method::GET, ok).produces(&["text/plain"]).build())
        .method(ResourceMethod::handler(Method::GET, ok).produces(&["application/json"]).build())
        .build();
    let model = ResourceModelBuilder::new().resource(resource).build().expect("model");
    assert!(model.issues().is_empty());
}

#[test]
fn test_two_locators_are_fatal() {
    let resource = Resource::builder("loc")
        .locator(|_| Ok(None))
        .locator(|_| Ok(None))
        .build();
    let mut issues = Vec::new();
    validate_resource(&resource, Some(ROOT), &mut issues);
    assert_eq!(fatal_count(&issues), 1);
}

#[test]
fn test_locator_beside_methods_warns() {
    let resource = Resource::builder("mixed")
        .handle(Method::GET, ok)
        .locator(|_| Ok(None))
        .build();
    let mut issues = Vec::new();
    validate_resource(&resource, Some(ROOT), &mut issues);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Warning);
}

#[test]
fn test_entity_rules() {
    let two = ResourceMethod::handler(Method::POST, ok)
        .param(Parameter::entity(ParamType::String))
        .param(Parameter::entity(ParamType::Json))
        .build();
    let get_entity = ResourceMethod::handler(Method::GET, ok)
        .param(Parameter::entity(ParamType::String))
        .build();
    let get_form = ResourceMethod::handler(Method::GET, ok)
        .param(Parameter::form("f"))
        .build();
    let locator = ResourceMethod::locator(|_| Ok(None))
        .param(Parameter::entity(ParamType::Bytes))
        .build();

    let mut issues = Vec::new();
    validate_method(&two, None, &mut issues);
    assert_eq!(fatal_count(&issues), 1);

    issues.clear();
    validate_method(&get_entity, None, &mut issues);
    assert_eq!((issues.len(), fatal_count(&issues)), (1, 0));

    issues.clear();
    validate_method(&get_form, None, &mut issues);
    assert_eq!(fatal_count(&issues), 1);

    issues.clear();
    validate_method(&locator, None, &mut issues);
    assert_eq!(fatal_count(&issues), 1);
}

#[test]
fn test_unbound_path_param_warns() {
    let resource = Resource::builder("users/{id}")
        .child(
            Resource::builder("posts/{post}")
                .method(
                    ResourceMethod::handler(Method::GET, ok)
                        .param(Parameter::path("id"))
                        .param(Parameter::path("post"))
                        .param(Parameter::path("missing"))
                        .build(),
                )
                .build(),
        )
        .build();
    let model = ResourceModelBuilder::new().resource(resource).build().expect("model");
    assert_eq!(model.issues().len(), 1);
    assert!(model.issues()[0].message.contains("missing"));
}

#[test]
fn test_unknown_ancestry_skips_path_param_check() {
    let method = ResourceMethod::handler(Method::GET, ok)
        .param(Parameter::path("anything"))
        .build();
    let mut issues = Vec::new();
    validate_method(&method, None, &mut issues);
    assert!(issues.is_empty());
}

#[test]
fn test_invalid_template_and_media_are_fatal() {
    let bad_template = Resource::builder("a/{unclosed").handle(Method::GET, ok).build();
    assert!(ResourceModelBuilder::new().resource(bad_template).build().is_err());

    let bad_media = Resource::builder("m")
        .method(ResourceMethod::handler(Method::GET, ok).produces(&["not a type"]).build())
        .build();
    let err = ResourceModelBuilder::new().resource(bad_media).build().expect_err("fatal");
    assert_eq!(err.fatal_count(), 1);

    let bad_qs = Resource::builder("q")
        .method(ResourceMethod::handler(Method::GET, ok).produces(&["text/plain;qs=2"]).build())
        .build();
    assert!(ResourceModelBuilder::new().resource(bad_qs).build().is_err());
}

#[test]
fn test_pathless_resource_skipped_with_warning() {
    let model = ResourceModelBuilder::new()
        .resource(Resource::builder_unpathed().name("Orphan").handle(Method::GET, ok).build())
        .resource(Resource::builder("kept").handle(Method::GET, ok).build())
        .build()
        .expect("model");
    assert_eq!(model.resources().len(), 1);
    assert_eq!(model.issues().len(), 1);
    assert_eq!(model.issues()[0].location, "Orphan");
}

#[test]
fn test_build_is_repeatable() {
    let builder = ResourceModelBuilder::new()
        .resource(Resource::builder("a").handle(Method::GET, ok).build())
        .resource(Resource::builder("b/{x}").handle(Method::GET, ok).build());
    let first = builder.build().expect("model");
    let second = builder.build().expect("model");
    let paths = |m: &ResourceModel| -> Vec<String> {
        m.resources().iter().map(Resource::normalized_path).collect()
    };
    assert_eq!(paths(&first), paths(&second));
}

#[test]
fn test_issue_display() {
    let issue = ResourceModelIssue::fatal("Pets::get", "boom");
    assert_eq!(issue.to_string(), "[FATAL] Pets::get: boom");
}

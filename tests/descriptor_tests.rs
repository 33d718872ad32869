use jaxrouter::descriptor::{load_builder, Descriptor};
use jaxrouter::{ApplicationHandler, Request, RouterConfig};

mod common;
use common::temp_files;

const PETS: &str = r#"
classes:
  - name: Pets
    path: pets
    produces: [application/json]
    methods:
      - method: GET
        response: { body: "[]" }
      - name: create
        method: POST
        consumes: [application/json]
        response: { status: 201, body: "", headers: { Location: "/pets/1" } }
      - name: byId
        method: GET
        path: "{id: [0-9]+}"
        response: { body: "{\"id\": {id}}" }
      - name: owner
        path: "{id}/owner"
        locator: Owner
  - name: Owner
    produces: [text/plain]
    scope: singleton
    methods:
      - method: GET
        response: { body: "owner of {id}" }
      - name: echo
        method: GET
        path: echo
"#;

fn pets_app() -> ApplicationHandler {
    let path = temp_files::create_temp_yaml(PETS);
    let builder = load_builder(&path).expect("descriptor");
    temp_files::cleanup_temp_files(&[path]);
    ApplicationHandler::new(builder, RouterConfig::default()).expect("model")
}

#[test]
fn test_static_responses() {
    let app = pets_app();
    let list = app.handle(Request::get("/pets"));
    assert_eq!(list.status(), 200);
    assert_eq!(list.text_body(), "[]");
    assert_eq!(list.get_content_type(), Some("application/json"));

    let one = app.handle(Request::get("/pets/42"));
    assert_eq!(one.json_body(), Some(serde_json::json!({"id": 42})));

    let created = app.handle(Request::post("/pets").header("Content-Type", "application/json").body("{}"));
    assert_eq!(created.status(), 201);
    assert_eq!(created.header_value("Location"), Some("/pets/1"));
}

#[test]
fn test_regex_template_rejects_non_digits() {
    let app = pets_app();
    assert_eq!(app.handle(Request::get("/pets/abc")).status(), 404);
}

#[test]
fn test_locator_to_named_class() {
    let app = pets_app();
    let owner = app.handle(Request::get("/pets/7/owner"));
    assert_eq!(owner.status(), 200);
    assert_eq!(owner.text_body(), "owner of 7");
    assert_eq!(app.locator_cache().len(), 1);

    let echo = app.handle(Request::get("/pets/7/owner/echo?x=1").header("Accept", "*/*"));
    let body = echo.json_body().expect("echo json");
    assert_eq!(body["resource"], "Owner");
    assert_eq!(body["path_params"]["id"], "7");
    assert_eq!(body["query"], "x=1");
    assert_eq!(body["matched_uris"][0], "pets/7/owner/echo");
}

#[test]
fn test_descriptor_formats_agree() {
    let json = r#"{"classes":[{"name":"A","path":"a","methods":[{"method":"GET","response":{"body":"a"}}]}]}"#;
    let toml = "[[classes]]\nname = \"A\"\npath = \"a\"\n[[classes.methods]]\nmethod = \"GET\"\nresponse = { body = \"a\" }\n";
    let yaml = "classes:\n  - name: A\n    path: a\n    methods:\n      - method: GET\n        response: { body: a }\n";
    let from_json = Descriptor::parse(json, "json").expect("json");
    assert_eq!(from_json, Descriptor::parse(toml, "toml").expect("toml"));
    assert_eq!(from_json, Descriptor::parse(yaml, "yml").expect("yaml"));
}

#[test]
fn test_invalid_descriptor_reports_path() {
    let path = temp_files::create_temp_file("classes: [", "yaml");
    let err = load_builder(&path).expect_err("invalid");
    assert!(format!("{err:#}").contains(&path.display().to_string()));
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_ambiguous_descriptor_fails_validation() {
    let text = "classes:\n  - name: A\n    path: a\n    methods:\n      - { name: x, method: GET }\n      - { name: y, method: GET }\n";
    let builder = Descriptor::parse(text, "yaml").expect("parse").to_builder().expect("builder");
    let err = builder.build().expect_err("ambiguous");
    assert_eq!(err.fatal_count(), 1);
}

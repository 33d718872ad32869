use jaxrouter::descriptor::load_builder;
use jaxrouter::hot_reload::{reload_descriptor, watch, watch_descriptor};
use jaxrouter::{ApplicationHandler, Request, RouterConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;
use common::temp_files;

const V1: &str = "classes:\n  - name: Greeting\n    path: hello\n    methods:\n      - method: GET\n        response: { body: v1 }\n";
const V2: &str = "classes:\n  - name: Greeting\n    path: hello\n    methods:\n      - method: GET\n        response: { body: v2 }\n  - name: Extra\n    path: extra\n    methods:\n      - method: GET\n        response: { body: extra }\n";
const AMBIGUOUS: &str = "classes:\n  - name: Greeting\n    path: hello\n    methods:\n      - { name: a, method: GET }\n      - { name: b, method: GET }\n";

fn app_from(path: &std::path::Path) -> ApplicationHandler {
    ApplicationHandler::new(load_builder(path).expect("descriptor"), RouterConfig::default())
        .expect("model")
}

fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn test_reload_descriptor_swaps_model() {
    let path = temp_files::create_temp_yaml(V1);
    let app = app_from(&path);
    assert_eq!(app.handle(Request::get("/hello")).text_body(), "v1");

    std::fs::write(&path, V2).expect("write v2");
    reload_descriptor(&path, &app).expect("reload");
    assert_eq!(app.handle(Request::get("/hello")).text_body(), "v2");
    assert_eq!(app.handle(Request::get("/extra")).text_body(), "extra");
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_failed_reload_keeps_previous_model() {
    let path = temp_files::create_temp_yaml(V1);
    let app = app_from(&path);

    std::fs::write(&path, AMBIGUOUS).expect("write");
    assert!(reload_descriptor(&path, &app).is_err());
    std::fs::write(&path, "classes: [").expect("write");
    assert!(reload_descriptor(&path, &app).is_err());
    assert_eq!(app.handle(Request::get("/hello")).text_body(), "v1");
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_empty_descriptor_is_rejected() {
    let path = temp_files::create_temp_yaml(V1);
    let app = app_from(&path);

    std::fs::write(&path, "").expect("truncate");
    assert!(reload_descriptor(&path, &app).is_err());
    std::fs::write(&path, "classes:\n  - name: Orphan\n").expect("write");
    let err = reload_descriptor(&path, &app).expect_err("no roots");
    assert!(err.to_string().contains("no root resources"));
    assert_eq!(app.handle(Request::get("/hello")).text_body(), "v1");
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_in_flight_snapshot_survives_swap() {
    let path = temp_files::create_temp_yaml(V1);
    let app = app_from(&path);
    let snapshot = app.router();
    std::fs::write(&path, V2).expect("write v2");
    reload_descriptor(&path, &app).expect("reload");
    assert_eq!(snapshot.model().route_lines().len(), 1);
    assert!(app.router().model().route_lines().len() > 1);
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_watch_descriptor_applies_changes() {
    let path = temp_files::create_temp_yaml(V1);
    let app = Arc::new(app_from(&path));
    let _watcher = watch_descriptor(&path, Arc::clone(&app), 50).expect("watcher");

    std::thread::sleep(Duration::from_millis(100));
    std::fs::write(&path, V2).expect("write v2");
    assert!(wait_for(|| app.handle(Request::get("/hello")).text_body() == "v2"));

    std::fs::write(&path, AMBIGUOUS).expect("write invalid");
    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(app.handle(Request::get("/extra")).text_body(), "extra");
    assert_eq!(app.handle(Request::get("/hello")).text_body(), "v2");
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_watch_uses_configured_debounce() {
    let path = temp_files::create_temp_yaml(V1);
    let config = RouterConfig {
        reload_debounce_ms: 10,
        ..RouterConfig::default()
    };
    let app = Arc::new(
        ApplicationHandler::new(load_builder(&path).expect("descriptor"), config).expect("model"),
    );
    let _watcher = watch(&path, Arc::clone(&app)).expect("watcher");

    std::thread::sleep(Duration::from_millis(100));
    std::fs::write(&path, V2).expect("write v2");
    assert!(wait_for(|| app.handle(Request::get("/extra")).status() == 200));
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_burst_of_writes_applies_final_contents() {
    let path = temp_files::create_temp_yaml(V1);
    let app = Arc::new(app_from(&path));
    let _watcher = watch_descriptor(&path, Arc::clone(&app), 100).expect("watcher");

    std::thread::sleep(Duration::from_millis(100));
    std::fs::write(&path, "").expect("truncate");
    std::fs::write(&path, AMBIGUOUS).expect("write invalid");
    std::fs::write(&path, V2).expect("write v2");
    assert!(wait_for(|| app.handle(Request::get("/extra")).status() == 200));
    assert_eq!(app.handle(Request::get("/hello")).text_body(), "v2");
    temp_files::cleanup_temp_files(&[path]);
}

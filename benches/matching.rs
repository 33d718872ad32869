use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jaxrouter::descriptor::Descriptor;
use jaxrouter::router::{RequestContext, RouteEnv};
use jaxrouter::{ApplicationHandler, Request, RouterConfig};

fn zoo_descriptor() -> &'static str {
    r#"
classes:
  - name: Animals
    path: zoo/animals
    produces: [application/json]
    methods:
      - { method: GET, response: { body: "[]" } }
      - { name: create, method: POST, consumes: [application/json], response: { status: 201 } }
      - { name: one, method: GET, path: "{id}", response: { body: "{}" } }
      - { name: update, method: PUT, path: "{id}", response: { body: "{}" } }
      - { name: remove, method: DELETE, path: "{id}", response: { status: 204 } }
      - { name: toys, path: "{id}/toys", locator: Toys }
  - name: Toys
    produces: [application/json, text/plain;qs=0.5]
    methods:
      - { method: GET, response: { body: "[]" } }
      - { name: toy, method: GET, path: "{toy_id}", response: { body: "{}" } }
  - name: Habitats
    path: "zoo/{category}/animals/{id}/habitats/{habitat_id: [0-9]+}"
    methods:
      - { method: GET, response: { body: ok } }
  - name: Health
    path: health
    methods:
      - { method: GET, response: { body: ok } }
"#
}

fn zoo_app() -> ApplicationHandler {
    let builder = Descriptor::parse(zoo_descriptor(), "yaml")
        .and_then(|d| d.to_builder())
        .expect("descriptor");
    ApplicationHandler::new(builder, RouterConfig::default()).expect("model")
}

const TARGETS: &[&str] = &[
    "/health",
    "/zoo/animals",
    "/zoo/animals/42",
    "/zoo/animals/42/toys/7",
    "/zoo/mammals/animals/42/habitats/3",
];

fn bench_route(c: &mut Criterion) {
    let app = zoo_app();
    let router = app.router();
    let mut group = c.benchmark_group("route");
    for target in TARGETS {
        group.bench_with_input(BenchmarkId::from_parameter(target), target, |b, target| {
            b.iter(|| {
                let mut ctx = RequestContext::new(Request::get(target));
                let env = RouteEnv {
                    lifecycle: app.lifecycle(),
                    cache: app.locator_cache(),
                    max_locator_depth: app.config().max_locator_depth,
                };
                black_box(router.route(&mut ctx, env).is_ok())
            });
        });
    }
    group.finish();
}

fn bench_handle(c: &mut Criterion) {
    let app = zoo_app();
    c.bench_function("handle_get_with_accept", |b| {
        b.iter(|| {
            let request = Request::get("/zoo/animals/42/toys")
                .header("Accept", "text/plain;q=0.9, application/json;q=0.8");
            black_box(app.handle(request).status())
        });
    });
    c.bench_function("handle_not_found", |b| {
        b.iter(|| black_box(app.handle(Request::get("/zoo/nowhere/at/all")).status()));
    });
}

criterion_group!(benches, bench_route, bench_handle);
criterion_main!(benches);

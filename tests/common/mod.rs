#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// A uniquely named file in the system temp dir.
    pub fn create_temp_file(content: &str, ext: &str) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "jaxr_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            nanos,
            ext
        ));
        std::fs::write(&path, content).expect("write temp file");
        path
    }

    pub fn create_temp_yaml(content: &str) -> PathBuf {
        create_temp_file(content, "yaml")
    }

    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod fixtures {
    use jaxrouter::model::{ClassModel, MethodModel, Parameter, ResourceModelBuilder, SubResource};
    use jaxrouter::{ApplicationHandler, Response, RouterConfig};
    use once_cell::sync::OnceCell;
    use std::sync::Arc;

    /// State carried by each locator hop.
    #[derive(Debug)]
    pub struct Hop {
        pub chain: String,
    }

    static CHILD: OnceCell<Arc<ClassModel>> = OnceCell::new();

    fn chain(ctx: &jaxrouter::RequestContext) -> String {
        ctx.instance::<Hop>().map(|h| h.chain.clone()).unwrap_or_default()
    }

    /// A class whose locator returns another instance of itself.
    pub fn child_class() -> Arc<ClassModel> {
        Arc::clone(CHILD.get_or_init(|| {
            ClassModel::builder("Child")
                .produces(&["text/plain"])
                .method(
                    MethodModel::handler("me", |ctx| {
                        let id = ctx.path_param("id").unwrap_or_default();
                        Ok(Response::text(format!("{} -> me() : {id}", chain(ctx))))
                    })
                    .get(),
                )
                .method(
                    MethodModel::locator("next", |ctx| {
                        let id = ctx.param_str("id").unwrap_or_default();
                        let hop = Hop {
                            chain: format!("{} -> {id}", chain(ctx)),
                        };
                        Ok(Some(SubResource::instance(child_class(), hop)))
                    })
                    .path("{id}")
                    .param(Parameter::path("id")),
                )
                .build()
        }))
    }

    pub fn parent_class() -> Arc<ClassModel> {
        ClassModel::builder("Parent")
            .path("parent")
            .method(
                MethodModel::locator("child", |ctx| {
                    let id = ctx.param_str("id").unwrap_or_default();
                    let hop = Hop {
                        chain: format!("parent -> {id}"),
                    };
                    Ok(Some(SubResource::instance(child_class(), hop)))
                })
                .path("child/{id}")
                .param(Parameter::path("id")),
            )
            .build()
    }

    pub fn app(builder: ResourceModelBuilder) -> ApplicationHandler {
        ApplicationHandler::new(builder, RouterConfig::default()).expect("valid model")
    }

    pub fn app_with(builder: ResourceModelBuilder, config: RouterConfig) -> ApplicationHandler {
        ApplicationHandler::new(builder, config).expect("valid model")
    }
}

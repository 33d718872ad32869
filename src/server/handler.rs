use super::options::options_response;
use super::request::Request;
use super::response::Response;
use crate::ids::REQUEST_ID_HEADER;
use crate::config::RouterConfig;
use crate::exception::{ExceptionMappers, HandlerError};
use crate::model::{ModelValidationError, ResourceModelBuilder};
use crate::router::{invoke_handler, Outcome, RequestContext, RouteEnv, Router};
use crate::runtime::{Lifecycle, LocatorCache, RuntimeResourceModel};
use arc_swap::ArcSwap;
use http::Method;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

fn build_router(builder: &ResourceModelBuilder) -> Result<Router, ModelValidationError> {
    let model = builder.build()?;
    Ok(Router::new(RuntimeResourceModel::compile(&model)?))
}

/// Runs requests through routing, invocation and response finalization.
///
/// The router is read through a lock-free snapshot; registering resources
/// rebuilds the model from every registration so far and swaps it in.
pub struct ApplicationHandler {
    router: ArcSwap<Router>,
    registrations: Mutex<ResourceModelBuilder>,
    mappers: ExceptionMappers,
    config: RouterConfig,
    lifecycle: Lifecycle,
    cache: LocatorCache,
}

impl std::fmt::Debug for ApplicationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationHandler")
            .field("config", &self.config)
            .field("mappers", &self.mappers)
            .field("cache", &self.cache)
            .finish()
    }
}

impl ApplicationHandler {
    /// Build and validate the model, then compile the router.
    ///
    /// # Errors
    ///
    /// [`ModelValidationError`] when the model has fatal issues.
    pub fn new(
        builder: ResourceModelBuilder,
        config: RouterConfig,
    ) -> Result<Self, ModelValidationError> {
        let router = build_router(&builder)?;
        info!(
            routes = router.model().route_lines().len(),
            max_locator_depth = config.max_locator_depth,
            "application handler ready"
        );
        Ok(Self {
            router: ArcSwap::from_pointee(router),
            registrations: Mutex::new(builder),
            mappers: ExceptionMappers::new().with_default_priority(config.default_mapper_priority),
            cache: LocatorCache::new(config.locator_cache),
            lifecycle: Lifecycle::new(),
            config,
        })
    }

    #[must_use]
    pub fn with_exception_mappers(mut self, mappers: ExceptionMappers) -> Self {
        self.mappers = mappers;
        self
    }

    /// Current routing snapshot.
    #[must_use]
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    #[must_use]
    pub fn mappers(&self) -> &ExceptionMappers {
        &self.mappers
    }

    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    #[must_use]
    pub fn locator_cache(&self) -> &LocatorCache {
        &self.cache
    }

    /// Add registrations and swap in the rebuilt model.
    ///
    /// # Errors
    ///
    /// [`ModelValidationError`] when the combined model is invalid; the
    /// running model and the registrations stay as they were.
    pub fn register<F>(&self, f: F) -> Result<(), ModelValidationError>
    where
        F: FnOnce(&mut ResourceModelBuilder),
    {
        let mut registrations = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = registrations.clone();
        f(&mut next);
        let router = build_router(&next)?;
        self.install(router);
        *registrations = next;
        Ok(())
    }

    /// Replace every registration with `builder`.
    ///
    /// # Errors
    ///
    /// [`ModelValidationError`] when `builder` is invalid; the running model stays.
    pub fn replace_model(&self, builder: ResourceModelBuilder) -> Result<(), ModelValidationError> {
        let mut registrations = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let router = build_router(&builder)?;
        self.install(router);
        *registrations = builder;
        Ok(())
    }

    fn install(&self, router: Router) {
        let routes = router.model().route_lines().len();
        self.router.store(Arc::new(router));
        self.cache.clear();
        info!(routes, "runtime model swapped");
    }

    /// Handle one request end to end. Never fails: errors become responses
    /// through the exception mappers.
    #[must_use]
    pub fn handle(&self, request: Request) -> Response {
        let request_id = request.request_id();
        let method = request.method().clone();
        let path = request.path().to_string();
        let router = self.router.load_full();

        let mut ctx = RequestContext::new(request);
        ctx.suspend_timeout_ms = self.config.async_timeout_ms;

        let result = catch_unwind(AssertUnwindSafe(|| self.dispatch(&router, &mut ctx)))
            .unwrap_or_else(|_| {
                error!(request_id = %request_id, "handler panicked");
                Err(HandlerError::internal("handler panicked"))
            });

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                let status = e.status();
                if status >= 500 {
                    error!(request_id = %request_id, method = %method, path = %path, status, error = %e, "request failed");
                } else {
                    warn!(request_id = %request_id, method = %method, path = %path, status, error = %e, "request rejected");
                }
                self.mappers.map(e)
            }
        };

        finalize(&mut response, &method, &request_id.to_string());
        debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = response.status(),
            "request complete"
        );
        response
    }

    fn dispatch(&self, router: &Router, ctx: &mut RequestContext) -> Result<Response, HandlerError> {
        let env = RouteEnv {
            lifecycle: &self.lifecycle,
            cache: &self.cache,
            max_locator_depth: self.config.max_locator_depth,
        };
        match router.route(ctx, env)? {
            Outcome::Options { node, allow } => {
                let accept = ctx.request.accept();
                options_response(
                    &node,
                    &allow,
                    accept.as_deref(),
                    self.config.options_description,
                )
            }
            Outcome::Method(selected) => {
                let method = selected.method.clone();
                let response_type = selected.response_type.to_string();
                ctx.selected = Some(selected);

                let returned = invoke_handler(ctx, &method, &self.lifecycle);
                let result = match ctx.suspended.take() {
                    Some(rx) => {
                        if let Err(e) = returned {
                            debug!(error = %e, "suspended handler returned an error; awaiting resume");
                        }
                        rx.recv().unwrap_or_else(|_| {
                            Err(HandlerError::internal("suspended response abandoned"))
                        })
                    }
                    None => returned,
                };

                let mut response = result?;
                if !response.has_header("Content-Type") && !matches!(response.status(), 204 | 304) {
                    response.set_header("Content-Type", &response_type);
                }
                Ok(response)
            }
        }
    }
}

/// Content-Length of the real entity unless the handler set one, HEAD body
/// stripping and request id echo.
fn finalize(response: &mut Response, method: &Method, request_id: &str) {
    if !matches!(response.status(), 204 | 304) && !response.has_header("Content-Length") {
        let length = response.entity().len().to_string();
        response.set_header("Content-Length", &length);
    }
    if *method == Method::HEAD {
        response.clear_body();
    }
    if !response.has_header(REQUEST_ID_HEADER) {
        response.set_header(REQUEST_ID_HEADER, request_id);
    }
}

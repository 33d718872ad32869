//! Request matcher: walks the runtime model for one request.
//!
//! Matching runs as an explicit state machine over
//! `MatchingRoot → MatchingResource → {ResolvingLocator, MethodSelected, NotFound}`.
//! Locator results become new dynamic nodes that the loop keeps matching
//! against, so arbitrarily deep locator graphs never grow the call stack;
//! the number of locator invocations is capped instead.

use super::context::RequestContext;
use super::invoke::{invoke_locator, resolve_sub_resource};
use super::select::{select_method, Outcome};
use crate::exception::HandlerError;
use crate::runtime::{Lifecycle, LocatorCache, RuntimeResource, RuntimeResourceModel};
use crate::uri::{self, UriTemplate};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Append-only path parameter storage; names come from the model.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Default cap on locator invocations per request.
pub const DEFAULT_MAX_LOCATOR_DEPTH: usize = 64;

/// Request-local accumulator filled while matching.
#[derive(Debug, Default, Clone)]
pub struct MatchResult {
    pub matched_uris: VecDeque<String>,
    pub matched_resources: VecDeque<Arc<RuntimeResource>>,
    pub matched_templates: VecDeque<UriTemplate>,
    pub path_params: ParamVec,
    pub encoded_path_params: ParamVec,
    /// Remaining unmatched path, empty once a method is selected.
    pub remainder: String,
    pub locator_invocations: usize,
}

impl MatchResult {
    /// Last decoded value bound to `name`.
    ///
    /// Repeated names across nested templates or recursive locators keep
    /// every value; the most recently bound one wins here.
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn encoded_path_param(&self, name: &str) -> Option<&str> {
        self.encoded_path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn path_param_values(&self, name: &str) -> Vec<&str> {
        self.path_params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn record(&mut self, node: &Arc<RuntimeResource>, full_path: &str, m: &uri::UriMatch<'_>) {
        let consumed = &full_path[..full_path.len() - m.remainder.len()];
        self.matched_uris
            .push_front(consumed.trim_matches('/').to_string());
        self.matched_resources.push_front(Arc::clone(node));
        self.matched_templates.push_front(node.template().clone());
        for (name, group) in node.bindings() {
            if let Some(value) = m.group(*group) {
                self.encoded_path_params
                    .push((Arc::clone(name), value.to_string()));
                self.path_params
                    .push((Arc::clone(name), uri::decode(value).into_owned()));
            }
        }
        self.remainder = m.remainder.to_string();
    }
}

/// Collaborators the matcher needs for locator results.
#[derive(Clone, Copy)]
pub struct RouteEnv<'a> {
    pub lifecycle: &'a Lifecycle,
    pub cache: &'a LocatorCache,
    pub max_locator_depth: usize,
}

enum State {
    MatchingRoot,
    MatchingResource(Arc<RuntimeResource>),
    ResolvingLocator(Arc<RuntimeResource>),
    MethodSelected(Arc<RuntimeResource>),
    NotFound,
}

/// Matches requests against an immutable runtime model.
#[derive(Debug, Clone)]
pub struct Router {
    model: Arc<RuntimeResourceModel>,
}

impl Router {
    #[must_use]
    pub fn new(model: RuntimeResourceModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    #[must_use]
    pub fn model(&self) -> &RuntimeResourceModel {
        &self.model
    }

    /// Match the request in `ctx` down to a selected method or a
    /// synthesized OPTIONS response, invoking locators on the way.
    ///
    /// # Errors
    ///
    /// 404 when nothing matches or a locator returns nothing, the selection
    /// errors of [`select_method`], 500 when the locator depth is exceeded
    /// or a dynamic resource is invalid, and any error raised by a locator.
    pub fn route(&self, ctx: &mut RequestContext, env: RouteEnv<'_>) -> Result<Outcome, HandlerError> {
        let full_path = uri::strip_matrix(ctx.request.path()).into_owned();
        ctx.matched.remainder.clone_from(&full_path);
        let mut state = State::MatchingRoot;

        loop {
            state = match state {
                State::MatchingRoot => {
                    match self.match_children(self.model.roots(), ctx, &full_path) {
                        Some(node) => State::MatchingResource(node),
                        None => State::NotFound,
                    }
                }
                State::MatchingResource(node) => {
                    let remainder = ctx.matched.remainder.as_str();
                    if remainder.is_empty() || remainder == "/" {
                        if !node.methods().is_empty() {
                            State::MethodSelected(node)
                        } else if node.locator().is_some() {
                            State::ResolvingLocator(node)
                        } else {
                            State::NotFound
                        }
                    } else {
                        match self.match_children(node.children(), ctx, &full_path) {
                            Some(child) => State::MatchingResource(child),
                            None if node.locator().is_some() => State::ResolvingLocator(node),
                            None => State::NotFound,
                        }
                    }
                }
                State::ResolvingLocator(node) => {
                    if ctx.matched.locator_invocations >= env.max_locator_depth {
                        error!(
                            depth = env.max_locator_depth,
                            path = %ctx.request.path(),
                            "sub-resource locator depth exceeded"
                        );
                        return Err(HandlerError::internal(format!(
                            "sub-resource locator depth {} exceeded",
                            env.max_locator_depth
                        )));
                    }
                    let Some(locator) = node.locator().cloned() else {
                        return Err(HandlerError::internal("node has no sub-resource locator"));
                    };
                    ctx.matched.locator_invocations += 1;
                    match invoke_locator(ctx, &locator, env.lifecycle)? {
                        Some(sub) => {
                            let dynamic = resolve_sub_resource(ctx, sub, env)?;
                            ctx.matched
                                .matched_resources
                                .push_front(Arc::clone(&dynamic));
                            State::MatchingResource(dynamic)
                        }
                        None => {
                            debug!(locator = %locator.location(), "locator returned no resource");
                            State::NotFound
                        }
                    }
                }
                State::MethodSelected(node) => {
                    ctx.matched.remainder.clear();
                    let accept = ctx.request.accept();
                    return select_method(
                        &node,
                        ctx.request.method(),
                        ctx.request.content_type(),
                        accept.as_deref(),
                    );
                }
                State::NotFound => {
                    debug!(path = %ctx.request.path(), "no resource matched");
                    return Err(HandlerError::not_found(format!(
                        "no resource matches {}",
                        ctx.request.path()
                    )));
                }
            };
        }
    }

    /// First child, in priority order, whose template matches the remainder.
    fn match_children(
        &self,
        children: &[Arc<RuntimeResource>],
        ctx: &mut RequestContext,
        full_path: &str,
    ) -> Option<Arc<RuntimeResource>> {
        let remainder = ctx.matched.remainder.clone();
        for child in children {
            debug!(template = %child.template(), remainder = %remainder, "match attempt");
            if let Some(m) = child.template().matches(&remainder) {
                ctx.matched.record(child, full_path, &m);
                return Some(Arc::clone(child));
            }
        }
        None
    }
}

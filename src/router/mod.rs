//! # Router Module
//!
//! Request matching and method selection over the compiled
//! [`RuntimeResourceModel`](crate::runtime::RuntimeResourceModel).
//!
//! ## Overview
//!
//! For each request the router:
//! - walks the runtime tree, trying sibling templates in priority order and
//!   committing to the first structural match
//! - records matched URIs, resources, templates and path parameters into the
//!   request's [`MatchResult`]
//! - invokes sub-resource locators when the static tree runs out, continuing
//!   against the returned resource
//! - selects one method of the final node by verb, Content-Type and Accept
//!
//! ## Example
//!
//! ```rust,ignore
//! use jaxrouter::model::{Resource, ResourceModelBuilder};
//! use jaxrouter::runtime::RuntimeResourceModel;
//! use jaxrouter::router::{Router, RequestContext};
//!
//! let model = ResourceModelBuilder::new()
//!     .resource(Resource::builder("pets/{id}").handle(Method::GET, |ctx| {
//!         Ok(Response::text(ctx.path_param("id").unwrap_or_default()))
//!     }).build())
//!     .build()?;
//! let router = Router::new(RuntimeResourceModel::compile(&model)?);
//! ```

mod context;
mod core;
mod invoke;
mod select;

pub use context::RequestContext;
pub use core::{MatchResult, ParamVec, RouteEnv, Router, DEFAULT_MAX_LOCATOR_DEPTH, MAX_INLINE_PARAMS};
pub(crate) use invoke::invoke_handler;
pub use select::{allowed_methods, select_method, Outcome, Selected};

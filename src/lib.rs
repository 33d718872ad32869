//! # jaxrouter
//!
//! **jaxrouter** is a JAX-RS compatible resource model, request matcher and
//! content negotiation engine for Rust.
//!
//! ## Overview
//!
//! Resource declarations (URI templates, HTTP methods, media type
//! constraints, parameter bindings and handlers) are compiled once into an
//! immutable matching model. For every request the engine selects exactly
//! one resource method, extracts its parameters, negotiates the response
//! media type, invokes the handler and finalizes the response. Sub-resource
//! locators extend the tree at request time, including self-referential
//! resource graphs.
//!
//! ## Architecture
//!
//! - **[`uri`]** - URI template compilation, path segments, query parsing
//! - **[`media`]** - Media types, `Accept` parsing, combined types for negotiation
//! - **[`model`]** - Static resource model, class introspection and validation
//! - **[`runtime`]** - Compiled matching tree, locator cache, instance lifecycle
//! - **[`router`]** - Matcher state machine and method selection
//! - **[`server`]** - Request/response types and the [`ApplicationHandler`]
//! - **[`exception`]** - Error classes and exception mappers
//! - **[`descriptor`]** - Declarative YAML/JSON/TOML resource descriptors
//! - **[`hot_reload`]** - Descriptor watching with copy-on-write model swaps
//! - **[`config`]** - Router properties from file and environment
//! - **[`logging`]** - `tracing-subscriber` setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Handler as ApplicationHandler
//!     participant Router as router::Router
//!     participant Select as router::select
//!     participant Method as Resource method
//!     participant Mappers as ExceptionMappers
//!
//!     Client->>Handler: Request
//!     Handler->>Router: route(ctx)
//!     loop templates, children, locators
//!         Router->>Router: match remainder, record URIs and params
//!     end
//!     Router->>Select: verb, Content-Type, Accept
//!     Select-->>Handler: selected method + response type
//!     Handler->>Method: invoke(ctx)
//!     Method-->>Handler: Response or HandlerError
//!     Handler->>Mappers: map error
//!     Handler-->>Client: finalized Response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jaxrouter::model::{Resource, ResourceModelBuilder};
//! use jaxrouter::{ApplicationHandler, Request, Response, RouterConfig};
//! use http::Method;
//!
//! let builder = ResourceModelBuilder::new().resource(
//!     Resource::builder("hello/{name}")
//!         .handle(Method::GET, |ctx| {
//!             Ok(Response::text(format!("hello {}", ctx.path_param("name").unwrap_or("?"))))
//!         })
//!         .build(),
//! );
//! let app = ApplicationHandler::new(builder, RouterConfig::default())?;
//! let response = app.handle(Request::get("/hello/world"));
//! assert_eq!(response.text_body(), "hello world");
//! ```

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod exception;
pub mod hot_reload;
pub mod ids;
pub mod logging;
pub mod media;
pub mod model;
pub mod router;
pub mod runtime;
pub mod server;
pub mod uri;

pub use config::{ConfigError, RouterConfig};
pub use exception::{ErrorClass, ExceptionMappers, HandlerError};
pub use router::RequestContext;
pub use server::{ApplicationHandler, AsyncResponse, Request, Response};

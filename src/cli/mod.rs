//! # CLI Module
//!
//! Command-line access to descriptor-defined resource models, shipped as the
//! `jaxrouter` binary.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the compiled runtime tree, one line per method or locator:
//!
//! ```bash
//! jaxrouter routes --descriptor resources.yaml
//! ```
//!
//! ### `match`
//!
//! Run one request through matching, negotiation, invocation and
//! finalization, then print the matched URIs and the response:
//!
//! ```bash
//! jaxrouter match --descriptor resources.yaml --method GET \
//!     --path /parent/child/a/b -H "Accept: text/plain"
//! ```
//!
//! ### `validate`
//!
//! Print every model issue; exits non-zero when any is FATAL:
//!
//! ```bash
//! jaxrouter validate --descriptor resources.yaml
//! ```
//!
//! All commands accept `--config <FILE>` (TOML or YAML router properties)
//! and honor `JAXR_*` environment overrides.

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};

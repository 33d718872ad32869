use crate::config::RouterConfig;
use crate::descriptor::load_builder;
use crate::logging::init_logging_with_config;
use crate::router::{Outcome, RequestContext, RouteEnv};
use crate::runtime::RuntimeResourceModel;
use crate::server::{ApplicationHandler, Request};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Inspect and exercise JAX-RS style resource descriptors
#[derive(Parser, Debug)]
#[command(name = "jaxrouter")]
#[command(about = "jaxrouter CLI", long_about = None)]
pub struct Cli {
    /// Router properties file (TOML or YAML)
    #[arg(long, global = true, env = "JAXR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the compiled route tree
    Routes {
        /// Resource descriptor (YAML, JSON or TOML)
        #[arg(short, long)]
        descriptor: PathBuf,
    },
    /// Dispatch one request and print the outcome
    Match {
        #[arg(short, long)]
        descriptor: PathBuf,

        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target, path plus optional query
        #[arg(short, long)]
        path: String,

        /// Request header as `Name: value`; repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Validate a descriptor; exits non-zero on FATAL issues
    Validate {
        #[arg(short, long)]
        descriptor: PathBuf,
    },
}

/// Parse the process arguments, set up logging and run the command.
///
/// # Errors
///
/// Configuration, logging and descriptor failures.
pub fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = RouterConfig::load(cli.config.as_deref())?;
    init_logging_with_config(&config.log.to_log_config())?;
    execute(&cli, config, &mut std::io::stdout().lock())
}

/// Run a parsed command, writing its report to `out`.
///
/// # Errors
///
/// Descriptor failures, invalid models for `routes`/`match`, malformed
/// headers and write errors.
pub fn execute<W: Write>(cli: &Cli, config: RouterConfig, out: &mut W) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Routes { descriptor } => routes(descriptor, out),
        Commands::Match {
            descriptor,
            method,
            path,
            headers,
            body,
        } => {
            let request = build_request(method, path, headers, body.as_deref())?;
            dispatch(descriptor, config, request, out)
        }
        Commands::Validate { descriptor } => validate(descriptor, out),
    }
}

fn routes<W: Write>(descriptor: &Path, out: &mut W) -> anyhow::Result<ExitCode> {
    let model = load_builder(descriptor)?
        .build()
        .with_context(|| format!("invalid resource model in {}", descriptor.display()))?;
    let runtime = RuntimeResourceModel::compile(&model)?;
    for line in runtime.route_lines() {
        writeln!(out, "{line}")?;
    }
    Ok(ExitCode::SUCCESS)
}

fn build_request(
    method: &str,
    path: &str,
    headers: &[String],
    body: Option<&str>,
) -> anyhow::Result<Request> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method `{method}`"))?;
    let target = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let mut request = Request::new(method, &target);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow!("header `{header}` must look like `Name: value`"))?;
        request = request.header(name.trim(), value.trim());
    }
    if let Some(body) = body {
        request = request.body(body.as_bytes().to_vec());
    }
    Ok(request)
}

fn dispatch<W: Write>(
    descriptor: &Path,
    config: RouterConfig,
    request: Request,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    let app = ApplicationHandler::new(load_builder(descriptor)?, config)
        .with_context(|| format!("invalid resource model in {}", descriptor.display()))?;

    // Matching report on a throwaway context; handle() owns its own.
    let router = app.router();
    let mut ctx = RequestContext::new(request.clone());
    let env = RouteEnv {
        lifecycle: app.lifecycle(),
        cache: app.locator_cache(),
        max_locator_depth: app.config().max_locator_depth,
    };
    match router.route(&mut ctx, env) {
        Ok(Outcome::Method(selected)) => {
            writeln!(out, "selected: {} ({})", selected.method.location(), selected.response_type)?;
        }
        Ok(Outcome::Options { allow, .. }) => {
            let allow: Vec<&str> = allow.iter().map(Method::as_str).collect();
            writeln!(out, "selected: OPTIONS [{}]", allow.join(", "))?;
        }
        Err(e) => writeln!(out, "selected: none ({e})")?,
    }
    for uri in ctx.matched_uris() {
        writeln!(out, "matched: {uri}")?;
    }

    let response = app.handle(request);
    writeln!(out, "{} {}", response.status(), response.reason())?;
    for (name, value) in response.headers() {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    writeln!(out, "{}", response.text_body())?;
    Ok(ExitCode::SUCCESS)
}

fn validate<W: Write>(descriptor: &Path, out: &mut W) -> anyhow::Result<ExitCode> {
    let builder = load_builder(descriptor)?;
    let (issues, failed) = match builder.build() {
        Ok(model) => match RuntimeResourceModel::compile(&model) {
            Ok(_) => (model.issues().to_vec(), false),
            Err(e) => (e.issues, true),
        },
        Err(e) => (e.issues, true),
    };
    if issues.is_empty() {
        writeln!(out, "{}: no issues", descriptor.display())?;
    }
    for issue in &issues {
        writeln!(out, "{issue}")?;
    }
    if failed {
        let fatal = issues.iter().filter(|i| i.is_fatal()).count();
        writeln!(out, "{fatal} fatal issue(s)")?;
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::RouterConfig;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::manifest::RouteManifest;
use crate::middleware::MiddlewareRegistry;
use crate::router::RouteTable;
use crate::url::{ReferenceType, UrlGenerator};

/// Command-line interface for routekit
///
/// Inspects a TOML route manifest: lists its routes, resolves a request
/// against it and generates URLs for named routes.
#[derive(Parser, Debug)]
#[command(name = "routekit")]
#[command(about = "Route table inspection tool", long_about = None)]
pub struct Cli {
    /// Route manifest (TOML)
    #[arg(short, long, env = "ROUTEKIT_ROUTES")]
    pub routes: PathBuf,

    /// Router configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, env = "ROUTEKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print every route in registration order
    List,
    /// Resolve a request against the table
    Match {
        /// HTTP method
        method: String,
        /// Request target, e.g. `/users/42?tab=posts`
        uri: String,
        /// Host header value
        #[arg(long)]
        host: Option<String>,
    },
    /// Generate the URL of a named route
    Url {
        /// Route name
        name: String,
        /// Parameters as `key=value`
        params: Vec<String>,
        /// Always include scheme and host
        #[arg(long, default_value_t = false)]
        absolute: bool,
        /// Host of the current request
        #[arg(long)]
        host: Option<String>,
    },
}

/// Execute `cli`, writing results to `out`.
pub fn run_cli(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = match &cli.config {
        Some(path) => RouterConfig::from_file(path)?,
        None => RouterConfig::from_env(),
    };
    let table = load_table(&cli, &config)?;

    match cli.command {
        Commands::List => {
            write!(out, "{table}")?;
        }
        Commands::Match { method, uri, host } => {
            run_match(&table, &method, &uri, host.as_deref(), out)?;
        }
        Commands::Url {
            name,
            params,
            absolute,
            host,
        } => {
            let mut ctx = RequestContext::from_config(&config);
            if let Some(host) = &host {
                ctx = ctx.with_host(host);
            }
            let params = parse_params(&params)?;
            let reference = if absolute {
                ReferenceType::AbsoluteUrl
            } else {
                ReferenceType::AbsolutePath
            };
            let url = UrlGenerator::new(&table, &ctx).generate(&name, params, reference)?;
            writeln!(out, "{url}")?;
        }
    }
    Ok(())
}

fn load_table(cli: &Cli, config: &RouterConfig) -> Result<RouteTable> {
    let manifest = RouteManifest::from_file(&cli.routes)?;
    // The CLI has no application middleware; aliases only need to be listed
    let registry = MiddlewareRegistry::with_defaults().lenient();
    let collector = manifest
        .build_collector(&registry)
        .with_context(|| format!("Failed to load routes from {}", cli.routes.display()))?;
    debug!(routes = collector.len(), "Manifest loaded");
    Ok(collector.seal_with(config))
}

fn run_match(
    table: &RouteTable,
    method: &str,
    uri: &str,
    host: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let path = crate::dispatcher::normalize_uri(uri);
    let method = method.to_ascii_uppercase();
    match table.find(&path, &method, host) {
        Some(m) => {
            write!(out, "{method} {path} -> {}", m.route.target())?;
            if let Some(name) = m.route.name() {
                write!(out, " [{name}]")?;
            }
            writeln!(out)?;
            for (k, v) in &m.params {
                writeln!(out, "  {k} = {v}")?;
            }
            Ok(())
        }
        None => {
            let allowed = table.allowed_methods(&path, host);
            if !allowed.is_empty() {
                let list: Vec<&str> = allowed.iter().map(http::Method::as_str).collect();
                writeln!(out, "{method} not allowed for {path}; allowed: {}", list.join(", "))?;
            }
            Err(DispatchError::RouteNotFound { uri: path, method }.into())
        }
    }
}

fn parse_params(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            _ => bail!("parameter '{pair}' is not in key=value form"),
        })
        .collect()
}

//! `knox` CLI — command-line client for the Knox credential registry.
//!
//! A thin front end over `knox-core`: commands gather flags and the
//! linked context, the resolver does the rest against the REST API.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod context;
mod verify;

use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use knox_api::{ApiError, HttpRegistry, RegistryApi, RegistryConfig};
use knox_core::credentials::{self, CredentialParams};
use knox_core::value::CredentialValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI definition ───────────────────────────────────────────────────

/// Knox — credentials for services, addressed by path.
#[derive(Parser)]
#[command(
    name = "knox",
    version,
    about = "Knox CLI — link a directory to a project and manage its credentials",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         KNOX_REGISTRY   Registry address (default: https://registry.knox.dev)\n  \
         KNOX_TOKEN      Authentication token\n  \
         KNOX_LOG        Diagnostic log filter, e.g. debug\n\n\
         {DIM}Examples:{RESET}\n  \
         knox link --org acme --project api\n  \
         knox set DATABASE_URL postgres://db.internal/api --service api --environment production\n  \
         knox get --service api --environment production\n  \
         knox verify"
    ),
)]
struct Cli {
    /// Registry address.
    #[arg(long, env = "KNOX_REGISTRY", default_value = "https://registry.knox.dev")]
    registry: String,

    /// Authentication token.
    #[arg(long, env = "KNOX_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a credential in the registry.
    Set {
        /// Credential name, e.g. `DATABASE_URL`.
        name: String,
        /// Value to store. Canonical integers and floats keep their type.
        value: String,
        /// Full credential path: /org/project/environment/service/identity/instance.
        #[arg(long)]
        path: Option<String>,
        #[command(flatten)]
        location: LocationFlags,
    },
    /// Fetch the credential at the resolved path.
    Get {
        #[command(flatten)]
        location: LocationFlags,
    },
    /// Link this directory to an org and project.
    Link {
        /// Organization name.
        #[arg(long)]
        org: String,
        /// Project name.
        #[arg(long)]
        project: String,
        /// Default environment for later commands.
        #[arg(long, default_value = "development")]
        environment: String,
    },
    /// Verify your account's email address.
    Verify,
}

/// Flags that locate a credential when no explicit path is given.
#[derive(Args)]
struct LocationFlags {
    /// Organization name (defaults to the linked org).
    #[arg(long)]
    org: Option<String>,

    /// Project name (defaults to the linked project).
    #[arg(long)]
    project: Option<String>,

    /// Service the credential belongs to.
    #[arg(long)]
    service: Option<String>,

    /// Deployment environment (defaults to the linked default).
    #[arg(long)]
    environment: Option<String>,

    /// Instance discriminator, for running several copies of a service.
    #[arg(long, default_value = "1")]
    instance: String,
}

// ── Entry point ──────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("KNOX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    debug!(registry = %cli.registry, "using registry");

    let registry = HttpRegistry::with_config(RegistryConfig {
        token: cli.token.unwrap_or_default(),
        base_url: cli.registry,
        ..RegistryConfig::default()
    })?;

    match cli.command {
        Commands::Set {
            name,
            value,
            path,
            location,
        } => cmd_set(&registry, name, &value, path, location).await,
        Commands::Get { location } => cmd_get(&registry, location).await,
        Commands::Link {
            org,
            project,
            environment,
        } => cmd_link(&registry, &org, &project, &environment).await,
        Commands::Verify => cmd_verify(&registry).await,
    }
}

// ── Command implementations ──────────────────────────────────────────

/// Fold command-line flags and the linked context into resolver params.
///
/// Flags win over `.knox.toml`; anything neither side provides stays
/// empty and is rejected by the resolver's precondition checks.
fn resolve_params(
    name: String,
    path: Option<String>,
    location: LocationFlags,
    ctx: context::LinkedContext,
) -> CredentialParams {
    CredentialParams {
        name,
        path,
        org: location.org.unwrap_or(ctx.org),
        project: location.project.unwrap_or(ctx.project),
        service: location.service.unwrap_or_default(),
        environment: location.environment.unwrap_or(ctx.default_environment),
        instance: location.instance,
    }
}

async fn cmd_set(
    api: &dyn RegistryApi,
    name: String,
    raw_value: &str,
    path: Option<String>,
    location: LocationFlags,
) -> Result<()> {
    let ctx = context::load()?.unwrap_or_default();
    let params = resolve_params(name, path, location, ctx);
    let value = CredentialValue::parse(raw_value);

    let record = credentials::create(api, &params, &value).await?;

    println!();
    success(&format!("Credential {BOLD}{}{RESET} stored.", record.name));
    println!();
    kv_line("Path", &record.pathexp);
    kv_line("Type", value.type_name());
    println!();
    Ok(())
}

async fn cmd_get(api: &dyn RegistryApi, location: LocationFlags) -> Result<()> {
    let ctx = context::load()?.unwrap_or_default();
    let params = resolve_params(String::new(), None, location, ctx);

    match credentials::get(api, &params).await? {
        Some(record) => {
            println!();
            header("🔑", &record.name);
            kv_line("Path", &record.pathexp);
            kv_line("Value", &record.value);
            kv_line("Type", CredentialValue::parse(&record.value).type_name());
            println!();
        }
        None => {
            println!();
            warning("No credential at the resolved path.");
            println!();
        }
    }
    Ok(())
}

async fn cmd_link(
    api: &dyn RegistryApi,
    org: &str,
    project: &str,
    environment: &str,
) -> Result<()> {
    let Some(org_record) = api.orgs_by_name(org).await?.into_iter().next() else {
        bail!("unknown org: {org}");
    };
    if api
        .projects_by_name(&org_record.id, project)
        .await?
        .is_empty()
    {
        bail!("unknown project: {project}");
    }

    context::write(org, project, environment)?;

    println!();
    success(&format!(
        "Linked {BOLD}{org}/{project}{RESET} to this directory."
    ));
    println!();
    kv_line("Config", context::CONTEXT_FILE);
    kv_line("Default environment", environment);
    println!();
    Ok(())
}

async fn cmd_verify(api: &dyn RegistryApi) -> Result<()> {
    match verify::execute(api).await {
        Ok(()) => {
            println!();
            success("Your account is now verified.");
            println!();
            Ok(())
        }
        Err(e) => {
            // Failure reports carry a classification tag; anything that is
            // not an API error falls back to "unknown".
            let kind = e
                .downcast_ref::<ApiError>()
                .map_or_else(|| "unknown".to_owned(), |api_err| api_err.kind().to_owned());
            Err(e.context(format!("email verification failed ({kind})")))
        }
    }
}

// ── Output helpers ───────────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

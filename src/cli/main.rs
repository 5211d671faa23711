//! Export configuration CLI
//!
//! Inspect the collection catalog, turn export configuration files into
//! backend payloads, and validate, run and track exports.
//!
//! ```bash
//! export-config-cli collections
//! export-config-cli transform students.json
//! export-config-cli execute students.json --wait
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use export_config_sdk::cli::commands::{
    collections::handle_collections, execute::handle_execute, status::handle_status,
    transform::handle_transform, validate::handle_validate,
};
use export_config_sdk::config::ClientConfig;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "export-config-cli",
    version,
    about = "Build, validate and run cross-collection data exports"
)]
struct Args {
    /// Client configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Export API base URL (overrides EXPORT_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Bearer token (overrides EXPORT_API_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List collections and their suggested joins
    Collections {
        /// Print collection keys and names as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the backend payload for a configuration file ("-" for stdin)
    Transform {
        #[arg(value_name = "CONFIG")]
        input: String,
    },
    /// Check a configuration file
    Validate {
        #[arg(value_name = "CONFIG")]
        input: String,
        /// Also ask the backend
        #[arg(long)]
        remote: bool,
    },
    /// Submit an export
    Execute {
        #[arg(value_name = "CONFIG")]
        input: String,
        /// Poll until the export finishes
        #[arg(long)]
        wait: bool,
    },
    /// Show the status of an export task
    Status {
        #[arg(value_name = "TASK_ID")]
        task_id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    initialize_logging(args.verbose);

    let config = load_client_config(&args)?;
    debug!(api_url = %config.api_url, "Using export API");

    match &args.command {
        Command::Collections { json } => handle_collections(&config, *json).await?,
        Command::Transform { input } => handle_transform(&config, input)?,
        Command::Validate { input, remote } => handle_validate(&config, input, *remote).await?,
        Command::Execute { input, wait } => handle_execute(&config, input, *wait).await?,
        Command::Status { task_id } => handle_status(&config, task_id).await?,
    }
    Ok(())
}

/// Defaults, then the config file, then environment, then flags
fn load_client_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    }
    .with_env_overrides();

    if let Some(url) = &args.api_url {
        config = config.with_api_url(url.clone());
    }
    if let Some(token) = &args.token {
        config = config.with_auth_token(token.clone());
    }
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`
fn initialize_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

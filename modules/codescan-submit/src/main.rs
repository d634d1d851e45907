//! CI pipeline step: package the workspace and submit it for scanning.
//!
//! Produces exactly one scan request per invocation and exits non-zero on
//! any failure; retry policy belongs to the orchestrator.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cca_client::{ClientOptions, ScanClient};

/// Default log directives when `RUST_LOG` is unset: this step's crates at
/// info, transport internals quiet.
const DEFAULT_LOG_FILTER: &str = "codescan_submit=info,cca_client=info,codescan_archive=info";

#[derive(Parser, Debug)]
#[command(name = "codescan-submit", version, about)]
struct Options {
    /// Base URL of the scan service
    #[arg(long, env = "CODESCAN_SERVICE_URL")]
    scan_service_url: String,

    /// Bearer token for the scan service
    #[arg(long, env = "CODESCAN_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Language tag recorded in the scan request
    #[arg(long, env = "CODESCAN_LANGUAGE", default_value = "ui5")]
    language: String,

    /// Request timeout for the upload, in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Skip TLS certificate verification (debugging only)
    #[arg(long)]
    insecure_skip_verify: bool,

    /// Workspace directory to archive (defaults to the current directory)
    #[arg(long)]
    workspace: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let options = Options::parse();
    if let Err(e) = run(options).await {
        error!("Step execution failed: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(options: Options) -> Result<()> {
    info!("Creating scan client...");
    let client = ScanClient::new(
        &options.scan_service_url,
        &options.access_token,
        ClientOptions {
            timeout: Duration::from_secs(options.timeout_secs),
            accept_invalid_certs: options.insecure_skip_verify,
        },
    )
    .context("failed to create scan client")?;

    info!("Scanning project...");
    let response = match &options.workspace {
        Some(dir) => client.scan_project(dir, &options.language).await,
        None => client.scan_current_dir(&options.language).await,
    }
    .context("failed to scan project")?;

    info!(
        job_id = response.result.job_id.as_deref().unwrap_or(""),
        "Scan job submitted"
    );
    Ok(())
}

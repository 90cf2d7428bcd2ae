use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use kinsta_api_client::ClientCache;
use kinsta_api_client::config::{self, ProcessEnv};
use kinsta_mcp_server::KinstaServer;
use rmcp::ServiceExt as _;
use rmcp::transport::stdio;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Expose the Kinsta hosting API as MCP tools over stdio.
///
/// Credentials are read lazily from `KINSTA_API_KEY`, `KINSTA_COMPANY_ID` and the optional
/// `KINSTA_API_BASE_URL`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "KINSTA_MCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "KINSTA_MCP_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Per-request timeout for Kinsta API calls.
    #[arg(
        long,
        env = "KINSTA_MCP_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    if !config::is_configured(&ProcessEnv) {
        warn!("Kinsta credentials are not configured yet; tool calls will fail until they are");
    }

    let cache = ClientCache::from_process_env().with_timeout(Duration::from_secs(args.timeout_secs));
    let server = KinstaServer::new(Arc::new(cache));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        timeout_secs = args.timeout_secs,
        "starting kinsta mcp server on stdio"
    );
    let service = server
        .serve(stdio())
        .await
        .context("start MCP stdio service")?;
    service.waiting().await.context("MCP service terminated")?;
    info!("kinsta mcp server stopped");
    Ok(())
}

fn init_tracing(args: &Args) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;

    // stdout carries the MCP protocol.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

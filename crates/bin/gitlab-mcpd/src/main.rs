//! Daemon entry point for the GitLab MCP server.
//!
//! Loads configuration from flags and the environment, builds the tool
//! registry, and serves the MCP protocol over stdio. Logs go to stderr so
//! stdout stays reserved for protocol frames.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use gitlab_api::{HttpClientConfig, HttpClientFactory};
use gitlab_mcp::{ToolRegistry, server, tools};
use rmcp::service::QuitReason;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::GitlabConfig;

const CONFIG_ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match GitlabConfig::from_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("gitlab-mcpd: {err}");
            return ExitCode::from(CONFIG_ERROR_EXIT);
        }
    };
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    init_logging(config.effective_log_filter(rust_log.as_deref()));
    info!(?config, version = env!("CARGO_PKG_VERSION"), "starting gitlab-mcpd");

    run(config).await
}

fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

async fn run(config: GitlabConfig) -> ExitCode {
    let registry = match ToolRegistry::build(tools::catalog(), config.readonly) {
        Ok(registry) => Arc::new(registry),
        Err(err) => {
            error!(error = %err, "tool registration failed");
            return ExitCode::FAILURE;
        }
    };

    let http = HttpClientConfig::new().with_timeout(config.request_timeout);
    let clients = match HttpClientFactory::new(&http) {
        Ok(clients) => Arc::new(clients),
        Err(err) => {
            error!(error = %err, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    match server::serve_stdio(registry, clients, config.url, config.token, shutdown).await {
        Ok(QuitReason::Cancelled | QuitReason::Closed) => ExitCode::SUCCESS,
        Ok(reason) => {
            error!(?reason, "MCP service stopped unexpectedly");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "MCP server failed");
            ExitCode::FAILURE
        }
    }
}

fn spawn_shutdown_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        warn!(error = %err, "ctrl-c handler unavailable");
                        terminate.recv().await;
                    }
                }
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "SIGTERM handler unavailable");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

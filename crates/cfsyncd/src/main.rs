// # cfsyncd - cfsync Daemon
//
// Thin integration layer around `cfsync_core::Manager`:
// 1. Read the environment and the JSON configuration file
// 2. Initialize logging and the runtime
// 3. Build the ipify address source and the Cloudflare provider
// 4. Run the manager until SIGTERM/SIGINT, then stop it cleanly
//
// All discovery and reconciliation logic lives in cfsync-core.
//
// ## Environment
//
// - `CFSYNC_CONFIG_FILE`: Path to the JSON configuration (default `production.json`)
// - `CFSYNC_API_TOKEN`: Overrides `api_token` from the file
// - `CFSYNC_LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `CFSYNC_MODE`: `dry-run` logs updates instead of sending them
//
// ## Example
//
// ```bash
// export CFSYNC_CONFIG_FILE=/etc/cfsync/production.json
// export CFSYNC_API_TOKEN=your_token
//
// cfsyncd
// ```

use anyhow::{Context, Result};
use cfsync_core::{Manager, SyncConfig};
use cfsync_ip_ipify::IpifyClient;
use cfsync_provider_cloudflare::CloudflareProvider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_CONFIG_FILE: &str = "production.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CfsyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<CfsyncExitCode> for ExitCode {
    fn from(code: CfsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Settings taken from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct DaemonEnv {
    config_file: PathBuf,
    api_token: Option<String>,
    log_level: String,
    dry_run: bool,
}

impl DaemonEnv {
    /// Load settings from environment variables
    fn from_env() -> Self {
        Self {
            config_file: env::var("CFSYNC_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
            api_token: env::var("CFSYNC_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            log_level: env::var("CFSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dry_run: env::var("CFSYNC_MODE")
                .unwrap_or_default()
                .eq_ignore_ascii_case("dry-run"),
        }
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "CFSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Read the configuration file and apply environment overrides
    fn load_config(&self) -> Result<SyncConfig> {
        let mut config = SyncConfig::from_file(&self.config_file)?;

        if let Some(token) = &self.api_token {
            config.api_token = token.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }

        config.validate().with_context(|| {
            format!("Invalid configuration in {}", self.config_file.display())
        })?;

        Ok(config)
    }
}

fn main() -> ExitCode {
    let daemon_env = DaemonEnv::from_env();

    let log_level = match daemon_env.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CfsyncExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfsyncExitCode::ConfigError.into();
    }

    let config = match daemon_env.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return CfsyncExitCode::ConfigError.into();
        }
    };

    info!("Starting cfsyncd daemon");
    info!(
        "Configuration loaded: {} record(s), every {}s, ipv6 {}",
        config.records.len(),
        config.frequency_secs,
        if config.check_ipv6 { "on" } else { "off" }
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfsyncExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(run_daemon(config));
    code.into()
}

/// Build the pipeline, run it until a shutdown signal and stop it
async fn run_daemon(config: SyncConfig) -> CfsyncExitCode {
    let manager = match start_manager(config).await {
        Ok(manager) => manager,
        Err(e) => {
            error!("Startup failed: {}", e);
            return CfsyncExitCode::ConfigError;
        }
    };

    if let Err(e) = manager.run().await {
        error!("Failed to start manager: {}", e);
        return CfsyncExitCode::RuntimeError;
    }

    info!("Daemon initialized successfully");

    let code = match wait_for_shutdown().await {
        Ok(signal) => {
            info!("Received shutdown signal: {}", signal);
            CfsyncExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Shutdown error: {}", e);
            CfsyncExitCode::RuntimeError
        }
    };

    info!("Shutting down daemon");
    manager.stop().await;
    info!("All done");

    code
}

async fn start_manager(config: SyncConfig) -> cfsync_core::Result<Manager> {
    let source = Arc::new(IpifyClient::new()?);
    let provider = Arc::new(CloudflareProvider::from_config(&config)?);

    Manager::new(config, provider, source).await
}

/// Wait for a shutdown signal (SIGTERM or SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for a shutdown signal (CTRL-C only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

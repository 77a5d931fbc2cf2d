// # ddnsd - onamae DDNS Daemon
//
// This is a THIN integration layer:
// - No protocol logic, no change detection, no retry logic here
// - All DDNS logic lives in ddns-core and the provider crates
//
// The ddnsd daemon is responsible for:
// 1. Reading the configuration file and environment overrides
// 2. Initializing logging and the runtime
// 3. Registering the onamae provider and the HTTP IP source
// 4. Running the DDNS engine until SIGINT/SIGTERM
//
// ## Configuration
//
// ### Environment
// - `DDNS_CONFIG`: Path to the configuration file. Without it the first of
//   `./config.toml`, `./config.yml`, `./config.yaml` that exists is used.
//   `.yml`/`.yaml` files are read as YAML, everything else as TOML.
// - `DDNS_AUTH`: Base64 `username:password`, overrides `auth` from the file
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ### File
//
// ```toml
// auth = "dXNlcjpwYXNz"
//
// [[domains]]
// name = "example.com"
// hosts = [{ name = "www" }, { name = "" }]
//
// [engine]
// check_interval_secs = 600
// ```
//
// ## Exit Codes
// - 0: Clean shutdown
// - 1: Configuration or startup error
// - 2: Runtime error

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DdnsEngine, ProviderRegistry};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Configuration files looked up in the working directory, in order
const DEFAULT_CONFIG_FILES: &[&str] = &["config.toml", "config.yml", "config.yaml"];

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon settings taken from the environment
struct Settings {
    config_path: PathBuf,
    auth_override: Option<String>,
    log_level: String,
}

impl Settings {
    /// Read settings from environment variables
    fn from_env() -> Self {
        Self {
            config_path: env::var("DDNS_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_config_path(Path::new("."))),
            auth_override: env::var("DDNS_AUTH").ok().filter(|s| !s.is_empty()),
            log_level: env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

/// First default configuration file present in `dir`
///
/// Falls back to `config.toml` so the load error names a sensible path.
fn default_config_path(dir: &Path) -> PathBuf {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| dir.join(DEFAULT_CONFIG_FILES[0]))
}

/// Load the configuration file, apply the auth override and validate
fn load_config(path: &Path, auth_override: Option<String>) -> Result<DdnsConfig> {
    let mut config = DdnsConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    if let Some(auth) = auth_override {
        config = config.with_auth(auth);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Map `DDNS_LOG_LEVEL` to a tracing level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let settings = Settings::from_env();

    let log_level = match parse_log_level(&settings.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let config = match load_config(&settings.config_path, settings.auth_override) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded from {}: {} domain(s)",
        settings.config_path.display(),
        config.domains.len()
    );

    // One session at a time, so a single thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Build the engine and run it until a shutdown signal
async fn run_daemon(config: DdnsConfig) -> DdnsExitCode {
    let registry = ProviderRegistry::new();
    ddns_provider_onamae::register(&registry);
    ddns_ip_http::register(&registry);

    let mut engine = match build_engine(&registry, config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown handler error: {:#}", e),
        }
        let _ = shutdown_tx.send(());
    });

    match engine.run_with_shutdown(shutdown_rx).await {
        Ok(()) => {
            info!("Shutting down daemon");
            DdnsExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        }
    }
}

/// Create components from the registry and wire them into an engine
fn build_engine(registry: &ProviderRegistry, config: DdnsConfig) -> Result<DdnsEngine> {
    info!("IP source type: {}", config.ip_source.type_name());
    info!("Provider type: {}", config.provider.type_name());

    let ip_source = registry
        .create_ip_source(&config.ip_source)
        .context("failed to create IP source")?;
    let provider = registry
        .create_provider(&config)
        .context("failed to create DNS provider")?;

    let (engine, mut events) = DdnsEngine::new(ip_source, provider, config)?;

    for target in engine.targets() {
        info!("Managing record: {}", target);
    }

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    Ok(engine)
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use recallguard_onebot::OneBotPlatform;
use recallguard_platform::{DynPlatform, LogPlatform};
use recallguard_server::api::AppState;
use recallguard_server::config::{DEFAULT_CONFIG_PATH, RecallGuardConfig};
use recallguard_server::watcher::ConfigWatcher;
use recallguard_shadow::{ConfigHandle, GuardRuntime, RecallGuardBuilder};

/// RecallGuard OneBot event receiver.
#[derive(Parser, Debug)]
#[command(
    name = "recallguard-server",
    about = "Shadows monitored chat messages and forwards them when recalled"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Disable hot-reload of the configuration file.
    #[arg(long)]
    no_watch: bool,

    /// Log outbound traffic instead of calling the OneBot API. File
    /// references in events are then treated as local paths.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    recallguard_server::telemetry::init();

    let config_path = Path::new(&cli.config);
    let config = if let Some(config) = RecallGuardConfig::load(config_path)? {
        config
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        RecallGuardConfig::default()
    };

    let guard_config = config.to_guard_config()?;
    if guard_config.forward.destinations.is_empty() {
        warn!("no forward destinations configured, recalled content will only be logged");
    }

    let platform: Arc<dyn DynPlatform> = if cli.dry_run {
        info!("dry run, outbound traffic is only logged");
        Arc::new(LogPlatform::new("dry-run"))
    } else {
        Arc::new(OneBotPlatform::new(config.onebot.to_onebot_config())?)
    };
    let handle = ConfigHandle::new(guard_config);
    let guard = RecallGuardBuilder::new()
        .platform(platform)
        .config(handle.clone())
        .build()?;
    let runtime = GuardRuntime::start(Arc::new(guard)).await?;

    // Only watch a file that exists; a defaults-only run has nothing to reload.
    let watcher = (!cli.no_watch && config_path.exists())
        .then(|| ConfigWatcher::new(handle, config_path).spawn());

    let state = AppState {
        sender: runtime.sender(),
        guard: Arc::clone(runtime.guard()),
    };
    let event_path = config.server.route_path();
    let app = recallguard_server::api::router(state, &event_path);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, event_path = %event_path, "recallguard-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(watcher) = watcher {
        watcher.abort();
    }

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    info!(
        timeout_secs = config.server.shutdown_timeout_seconds,
        "waiting for queued events and in-flight forwards..."
    );
    if tokio::time::timeout(shutdown_timeout, runtime.shutdown())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, some forwards may be lost"
        );
    }

    info!("recallguard-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}

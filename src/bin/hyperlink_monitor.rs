use anyhow::{bail, Context, Result};
use hyperlink::{ChannelNotifier, ConnectionSupervisor, ErrorMode, EventKind, SupervisorConfig};
use hyperlink_realtime::bin_common::{
    init_tracing, load_config_from_env, parse_args, parse_endpoint, ConfigType, EndpointArg,
    ShutdownManager,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Host sampling period
const TICK: Duration = Duration::from_millis(100);
const STATUS_EVERY: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Supervisor);
    let config = SupervisorConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_tracing(&config.log_level);

    let (endpoints, error_mode) = parse_cli(parse_args())?;
    if endpoints.is_empty() {
        bail!("usage: hyperlink_monitor [--hat-only] label=url[@mode] ...");
    }

    let (notifier, wakeups) = ChannelNotifier::new();
    let supervisor = ConnectionSupervisor::builder()
        .config(config.clone())
        .notifier(Arc::new(notifier))
        .build()?;

    print_banner(&config, &endpoints);

    for endpoint in &endpoints {
        supervisor.set_error_mode(&endpoint.label, error_mode);
        supervisor.register_with_mode(
            &endpoint.label,
            endpoint.url.clone(),
            endpoint.mode.unwrap_or_default(),
        );
    }

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    let mut last_status = Instant::now();
    while shutdown.is_running() {
        shutdown.interruptible_sleep(TICK).await;

        // Nothing queued since the last tick
        if wakeups.try_recv().is_err() && last_status.elapsed() < STATUS_EVERY {
            continue;
        }

        for endpoint in &endpoints {
            sample(&supervisor, &endpoint.label);
        }

        if last_status.elapsed() >= STATUS_EVERY {
            log_status(&supervisor);
            last_status = Instant::now();
        }
    }

    supervisor.shutdown();
    log_status(&supervisor);
    print_shutdown("HyperLink monitor");
    Ok(())
}

fn parse_cli(args: Vec<String>) -> Result<(Vec<EndpointArg>, ErrorMode)> {
    let mut error_mode = ErrorMode::AutoReconnect;
    let mut endpoints = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--hat-only" => error_mode = ErrorMode::HatOnly,
            _ => endpoints.push(parse_endpoint(&arg).map_err(anyhow::Error::msg)?),
        }
    }

    Ok((endpoints, error_mode))
}

/// One host tick for `label`: consume its edges and print fresh data
fn sample(supervisor: &ConnectionSupervisor, label: &str) {
    for kind in EventKind::ALL {
        if !supervisor.poll_event(kind, label) {
            continue;
        }
        match kind {
            EventKind::MessageReceived => {
                info!("[{}] {}", label, supervisor.latest(label));
            }
            EventKind::Error => warn!("[{}] transport error", label),
            _ => info!("[{}] {} ({})", label, kind, supervisor.phase(label)),
        }
    }
}

fn log_status(supervisor: &ConnectionSupervisor) {
    for label in supervisor.labels() {
        if let Some(status) = supervisor.status(&label) {
            match serde_json::to_string(&status) {
                Ok(json) => info!("status {}", json),
                Err(e) => warn!("[{}] status not serializable: {}", label, e),
            }
        }
    }
}

fn print_banner(config: &SupervisorConfig, endpoints: &[EndpointArg]) {
    info!("");
    info!("========================================");
    info!("Starting HyperLink monitor");
    info!(
        "Poll interval: {}ms, reconnect delay: {}ms",
        config.poll_interval_ms, config.reconnect_delay_ms
    );
    for endpoint in endpoints {
        info!("  {} -> {}", endpoint.label, endpoint.url);
    }
    info!("Press Ctrl+C to stop");
    info!("========================================");
    info!("");
}

fn print_shutdown(name: &str) {
    info!("");
    info!("========================================");
    info!("{} stopped gracefully", name);
    info!("========================================");
}

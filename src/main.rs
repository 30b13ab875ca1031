//! findmy-bridge - publishes FindMy device locations to Home Assistant
//!
//! Reads the macOS FindMy cache on a fixed interval and publishes changed
//! devices as MQTT discovery device trackers.
//!
//! Module structure:
//! - `domain/` - Raw records, snapshots, zones
//! - `services/` - Identity, classification, normalization, change detection, sync
//! - `io/` - Cache files, discovery payloads, MQTT, console
//! - `infra/` - Config, zone file, errors, metrics

use anyhow::Context;
use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches};
use findmy_bridge::infra::{CliArgs, Config, Metrics};
use findmy_bridge::io::{cache_sources, console, MqttPublisher};
use findmy_bridge::services::SyncOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// How often the metrics summary is logged
const METRICS_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging to stderr (stdout is the status screen), level via RUST_LOG
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let matches = CliArgs::command().get_matches();
    if matches.value_source("password") == Some(ValueSource::CommandLine) {
        warn!(hint = "set MQTT_CLIENT_PASSWORD instead", "mqtt_password_on_command_line");
    }
    let args = CliArgs::from_arg_matches(&matches)?;

    let config = Config::from_args(args).context("Invalid configuration")?;

    info!(
        mqtt_host = %config.mqtt_host(),
        mqtt_port = %config.mqtt_port(),
        scan_interval_secs = %config.scan_interval_secs(),
        cache_dir = %config.cache_dir().display(),
        locations_file = ?config.locations_file(),
        zones = config.zones().len(),
        privacy = config.privacy(),
        force_sync = config.force_sync(),
        "config_loaded"
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let metrics = Arc::new(Metrics::new());
    let publisher = MqttPublisher::new(&config);
    let mut sync = SyncOrchestrator::new(
        config.zones().to_vec(),
        cache_sources(config.cache_dir()),
        publisher,
        metrics.clone(),
    );

    let mut status_console = console::stdout_console(config.privacy()).context("Failed to initialize console")?;
    if status_console.is_none() {
        info!("console_disabled_stdout_not_a_terminal");
    }

    let mut scan_interval = tokio::time::interval(Duration::from_secs(config.scan_interval_secs()));
    scan_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut metrics_interval = tokio::time::interval(METRICS_INTERVAL);
    metrics_interval.tick().await;

    info!("sync_started");
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = metrics_interval.tick() => {
                metrics.report(sync.detector().len()).log();
            }
            _ = scan_interval.tick() => {
                match sync.run_pass(config.force_sync()).await {
                    Ok(summary) if summary.published > 0 => {
                        info!(
                            published = summary.published,
                            suppressed = summary.suppressed,
                            skipped = summary.skipped,
                            "pass_completed"
                        );
                    }
                    Ok(summary) => {
                        debug!(suppressed = summary.suppressed, skipped = summary.skipped, "pass_unchanged");
                    }
                    Err(e) => {
                        warn!(source = %e.source_name(), error = %e, "source_read_failed");
                    }
                }

                if let Some(status_console) = status_console.as_mut() {
                    if let Err(e) = status_console.show(sync.detector(), sync.zones().len(), sync.has_manual_zones()) {
                        error!(error = %e, "console_output_failed");
                    }
                }
            }
        }
    }

    sync.into_publisher().shutdown().await;
    info!("findmy-bridge shutdown complete");
    Ok(())
}

// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! roomsense - room sensor fusion and scheduled telemetry
//!
//! Polls the configured sensors, resolves one value per signal and feeds
//! the local display, MQTT bridge, metrics exporter and lighting rules.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use roomsense::automation::{LightController, LightingConsumer, LoggingLightController, MqttLightController};
use roomsense::config::LightControllerKind;
use roomsense::core::{Engine, Scheduler, TelemetryBus};
use roomsense::scanners::{HttpFetcher, ScannerHub};
use roomsense::sensors::{DetachedBus, DeviceBus, SensorFactory, SimulatedBus};
use roomsense::streaming::{DisplayConsumer, MetricsExporter, MqttBridge, MqttClient};
use roomsense::{build_info, Config, VERSION};

/// roomsense - room sensor fusion and scheduled telemetry
#[derive(Parser, Debug)]
#[command(name = "roomsense")]
#[command(version = VERSION)]
#[command(about = "Room sensor polling, signal resolution and telemetry export")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with simulated sensors
    #[arg(long)]
    demo: bool,

    /// Seconds between poll cycles
    #[arg(long)]
    sample_interval: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("roomsense v{}", VERSION);
    debug!("{:?}", build_info());

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if args.debug {
        config.debug_output = true;
    }
    if let Some(secs) = args.sample_interval {
        config.sample_interval_secs = secs;
    }

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let telemetry = Arc::new(TelemetryBus::default());
    let scheduler = Arc::new(Scheduler::new());

    let fetcher = HttpFetcher::new(config.scanners.request_timeout(), &config.scanners.user_agent)?;
    let hub = Arc::new(ScannerHub::new(Arc::new(fetcher), scheduler.clone(), config.scanners.clone()));

    if config.scanners.disk_prices_enabled {
        hub.disk_prices().await;
    }

    // Metrics exporter first so no startup gauges are missed
    let exporter = MetricsExporter::new();
    exporter.attach(&telemetry, shutdown_tx.subscribe());
    if config.streaming.metrics_enabled {
        match MetricsExporter::bind(config.streaming.metrics_port).await {
            Ok(listener) => {
                exporter.serve(listener, shutdown_tx.subscribe());
            }
            Err(e) => warn!("Metrics exporter disabled: {}", e),
        }
    }

    let bus: Arc<dyn DeviceBus> = if config.demo_mode {
        Arc::new(SimulatedBus::new())
    } else {
        Arc::new(DetachedBus)
    };
    let factory = SensorFactory::new(bus, hub.clone(), telemetry.clone(), shutdown_tx.clone());
    let registry = factory.build_all(&config.sensors).await;
    if registry.is_empty() {
        warn!("No sensors available; consumers will only see scanner data");
    }

    let mqtt = if config.streaming.mqtt_enabled || config.lighting.controller == LightControllerKind::Mqtt {
        Some(MqttClient::new(&config.streaming).await?)
    } else {
        None
    };

    let mut engine = Engine::new(config.clone(), registry, hub.clone(), telemetry.clone());

    if config.streaming.display_enabled {
        engine.add_consumer(Arc::new(DisplayConsumer::new()));
    }

    if config.streaming.mqtt_enabled {
        if let Some(client) = &mqtt {
            engine.add_consumer(Arc::new(MqttBridge::new(client.clone(), &config.streaming.mqtt_topic_prefix)));
        }
    }

    if config.lighting.enabled {
        let controller: Arc<dyn LightController> = match (&config.lighting.controller, &mqtt) {
            (LightControllerKind::Mqtt, Some(client)) => {
                Arc::new(MqttLightController::new(client.clone(), &config.lighting.command_topic))
            }
            _ => Arc::new(LoggingLightController::new()),
        };
        engine.add_consumer(Arc::new(LightingConsumer::new(controller)));
    }

    info!("roomsense running, press Ctrl+C to shutdown");

    let engine_shutdown = shutdown_tx.subscribe();
    tokio::select! {
        result = engine.run(engine_shutdown) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, cleaning up...");
        }
    }

    let _ = shutdown_tx.send(());
    scheduler.shutdown();

    if let Some(client) = &mqtt {
        if let Err(e) = client.disconnect().await {
            debug!("{}", e);
        }
    }

    let state = engine.state().await;
    info!("roomsense shutdown complete after {} cycles", state.cycles);

    Ok(())
}

//! Time conductor demo: cycles through the available modes and logs bounds

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tc_core::{
    ConductorConfig, ConductorEvent, ConductorSubscriber, ManualTickSource, TickCapability,
    TickSourceMetadata, TimeBounds, TimeConductor, TimeConductorViewService, TimeDeltas, TimeSystem,
    UtcTimeSystem,
};

/// Logs every change the conductor broadcasts
struct ConductorLogger;

impl ConductorSubscriber for ConductorLogger {
    fn on_conductor_event(&self, event: &ConductorEvent) {
        match event {
            ConductorEvent::TimeSystemChanged(time_system) => {
                info!("Time system: {}", time_system.metadata().name);
            }
            ConductorEvent::BoundsChanged(bounds) => info!("Bounds: {}", format_bounds(bounds)),
            ConductorEvent::FollowChanged(follow) => info!("Follow: {}", follow),
        }
    }
}

fn format_bounds(bounds: &TimeBounds) -> String {
    let format = |ms: i64| {
        DateTime::<Utc>::from_timestamp_millis(ms)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| ms.to_string())
    };
    format!("{} .. {}", format(bounds.start), format(bounds.end))
}

fn load_config() -> Result<ConductorConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path))?;
            Ok(ConductorConfig::from_json_str(&json)?)
        }
        None => Ok(ConductorConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let period = config.clock_period()?;
    let runtime = tokio::runtime::Runtime::new()?;

    // Data-driven source ticking whenever a new sample arrives
    let lad = Arc::new(ManualTickSource::new(TickSourceMetadata::new(
        "lad",
        "Latest available data",
        TickCapability::Data,
    )));
    let utc = Arc::new(UtcTimeSystem::from_config(&config)?.with_tick_source(lad.clone()));
    utc.clock().start(runtime.handle());

    let conductor = Arc::new(TimeConductor::new());
    let logger: Arc<dyn ConductorSubscriber> = Arc::new(ConductorLogger);
    conductor.add_subscriber(logger.clone());

    let time_systems: Vec<Arc<dyn TimeSystem>> = vec![utc.clone()];
    let mut service = TimeConductorViewService::with_config(conductor.clone(), time_systems, config);

    let modes: Vec<String> = service.available_modes().keys().map(str::to_string).collect();
    info!("Available modes: {}", modes.join(", "));
    service.select_default_mode()?;

    for key in &modes {
        service.select_mode(key)?;
        info!("Mode '{}' with deltas {:?}", key, service.deltas()?);

        match key.as_str() {
            "realtime" => {
                service.set_deltas(TimeDeltas::new(60_000, 5_000))?;
                std::thread::sleep(period * 3);
            }
            "latest" => {
                lad.tick(Utc::now().timestamp_millis());
                std::thread::sleep(period);
                lad.tick(Utc::now().timestamp_millis());
            }
            _ => std::thread::sleep(Duration::from_millis(100)),
        }

        if let Some(bounds) = conductor.bounds() {
            println!("{:<10} {}", key, format_bounds(&bounds));
        }
    }

    utc.clock().stop();
    Ok(())
}

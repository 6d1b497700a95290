//! UTC time system driven by the local clock

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;

use crate::config::ConductorConfig;
use crate::error::Result;
use crate::tick_source::{LocalClock, TickSource};
use crate::time_system::{TimeBounds, TimeDeltas, TimeSystem, TimeSystemDefaults, TimeSystemMetadata};

const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Milliseconds since the UNIX epoch, UTC
pub struct UtcTimeSystem {
    metadata: TimeSystemMetadata,
    clock: Arc<LocalClock>,
    extra_sources: Vec<Arc<dyn TickSource>>,
    window: Duration,
}

impl UtcTimeSystem {
    pub fn new(clock: Arc<LocalClock>) -> Self {
        Self {
            metadata: TimeSystemMetadata {
                key: "utc".to_string(),
                name: "UTC".to_string(),
                icon_class: "icon-clock".to_string(),
                description: "UTC time system, milliseconds since the UNIX epoch".to_string(),
            },
            clock,
            extra_sources: Vec::new(),
            window: DEFAULT_WINDOW,
        }
    }

    /// Build from configuration, creating the local clock
    pub fn from_config(config: &ConductorConfig) -> Result<Self> {
        let clock = Arc::new(LocalClock::new(config.clock_period()?));
        Ok(Self::new(clock).with_window(config.utc_window()?))
    }

    /// Width of the default bounds and of the default start delta
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Attach another tick source, e.g. a data-driven one
    pub fn with_tick_source(mut self, source: Arc<dyn TickSource>) -> Self {
        self.extra_sources.push(source);
        self
    }

    pub fn clock(&self) -> &Arc<LocalClock> {
        &self.clock
    }
}

impl TimeSystem for UtcTimeSystem {
    fn metadata(&self) -> &TimeSystemMetadata {
        &self.metadata
    }

    fn tick_sources(&self) -> Vec<Arc<dyn TickSource>> {
        let mut sources: Vec<Arc<dyn TickSource>> = vec![self.clock.clone()];
        sources.extend(self.extra_sources.iter().cloned());
        sources
    }

    fn defaults(&self) -> TimeSystemDefaults {
        let now = Utc::now().timestamp_millis();
        let window = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        TimeSystemDefaults {
            bounds: TimeBounds::new(now.saturating_sub(window), now),
            deltas: TimeDeltas::new(window, 0),
        }
    }
}

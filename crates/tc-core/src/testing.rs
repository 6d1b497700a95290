//! Fixtures shared by the unit tests

use std::sync::Arc;
use parking_lot::RwLock;

use crate::conductor::{ConductorEvent, ConductorSubscriber};
use crate::tick_source::{ManualTickSource, TickCapability, TickSource, TickSourceMetadata};
use crate::time_system::{TimeBounds, TimeDeltas, TimeSystem, TimeSystemDefaults, TimeSystemMetadata};

/// Time system backed by manually ticked sources
pub struct StubTimeSystem {
    metadata: TimeSystemMetadata,
    sources: Vec<Arc<ManualTickSource>>,
    defaults: TimeSystemDefaults,
}

impl StubTimeSystem {
    pub fn new(key: &str, capabilities: &[TickCapability], defaults: TimeSystemDefaults) -> Arc<Self> {
        let sources = capabilities
            .iter()
            .map(|capability| {
                let suffix = match capability {
                    TickCapability::Clock => "clock",
                    TickCapability::Data => "data",
                };
                Arc::new(ManualTickSource::new(TickSourceMetadata::new(
                    format!("{}-{}", key, suffix),
                    format!("{} {}", key, suffix),
                    *capability,
                )))
            })
            .collect();

        Arc::new(Self {
            metadata: TimeSystemMetadata {
                key: key.to_string(),
                name: key.to_uppercase(),
                icon_class: "icon-clock".to_string(),
                description: format!("Stub time system {}", key),
            },
            sources,
            defaults,
        })
    }

    pub fn clock(key: &str) -> Arc<Self> {
        Self::new(key, &[TickCapability::Clock], defaults(0, 50))
    }

    pub fn data(key: &str) -> Arc<Self> {
        Self::new(key, &[TickCapability::Data], defaults(1_000, 20))
    }

    pub fn dual(key: &str) -> Arc<Self> {
        Self::new(key, &[TickCapability::Clock, TickCapability::Data], defaults(2_000, 30))
    }

    pub fn plain(key: &str) -> Arc<Self> {
        Self::new(key, &[], defaults(3_000, 10))
    }

    pub fn source(&self, index: usize) -> &Arc<ManualTickSource> {
        &self.sources[index]
    }
}

fn defaults(start: i64, delta: i64) -> TimeSystemDefaults {
    TimeSystemDefaults {
        bounds: TimeBounds::new(start, start + 100),
        deltas: TimeDeltas::new(delta, 0),
    }
}

impl TimeSystem for StubTimeSystem {
    fn metadata(&self) -> &TimeSystemMetadata {
        &self.metadata
    }

    fn tick_sources(&self) -> Vec<Arc<dyn TickSource>> {
        self.sources
            .iter()
            .map(|source| source.clone() as Arc<dyn TickSource>)
            .collect()
    }

    fn defaults(&self) -> TimeSystemDefaults {
        self.defaults
    }
}

pub fn clock_system(key: &str) -> Arc<dyn TimeSystem> {
    StubTimeSystem::clock(key)
}

pub fn data_system(key: &str) -> Arc<dyn TimeSystem> {
    StubTimeSystem::data(key)
}

pub fn dual_system(key: &str) -> Arc<dyn TimeSystem> {
    StubTimeSystem::dual(key)
}

pub fn plain_system(key: &str) -> Arc<dyn TimeSystem> {
    StubTimeSystem::plain(key)
}

/// Records conductor events as short strings
#[derive(Default)]
pub struct Recorder {
    events: RwLock<Vec<String>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.read().clone()
    }
}

impl ConductorSubscriber for Recorder {
    fn on_conductor_event(&self, event: &ConductorEvent) {
        let entry = match event {
            ConductorEvent::TimeSystemChanged(time_system) => format!("time_system:{}", time_system.key()),
            ConductorEvent::BoundsChanged(bounds) => format!("bounds:{}..{}", bounds.start, bounds.end),
            ConductorEvent::FollowChanged(follow) => format!("follow:{}", follow),
        };
        self.events.write().push(entry);
    }
}

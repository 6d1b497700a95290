//! Time-span modes and their descriptors

use std::sync::Arc;
use serde::{Serialize, Deserialize};

use crate::conductor::TimeConductor;
use crate::error::Result;
use crate::tick_source::{TickCapability, TickSource};
use crate::time_system::{TimeDeltas, TimeSystem};

mod fixed;
mod follow;

pub use fixed::FixedMode;
pub use follow::FollowMode;

/// Which implementation backs a mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModeVariant {
    /// Bounds set by the user, never moving
    Fixed,
    /// Bounds recomputed from a tick source on every tick
    Follow,
}

/// Static description of a mode offered to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeDescriptor {
    pub key: String,
    pub label: String,
    pub name: String,
    pub description: String,
    pub icon_class: String,
    pub variant: ModeVariant,
    /// Tick capability a time system must offer to be usable in this mode
    pub required_capability: Option<TickCapability>,
}

impl ModeDescriptor {
    pub const FIXED: &'static str = "fixed";
    pub const REALTIME: &'static str = "realtime";
    pub const LATEST: &'static str = "latest";

    pub fn fixed() -> Self {
        Self {
            key: Self::FIXED.to_string(),
            label: "Fixed".to_string(),
            name: "Fixed Timespan Mode".to_string(),
            description: "Query and explore data that falls between two fixed datetimes.".to_string(),
            icon_class: "icon-calendar".to_string(),
            variant: ModeVariant::Fixed,
            required_capability: None,
        }
    }

    pub fn realtime() -> Self {
        Self {
            key: Self::REALTIME.to_string(),
            label: "Real-time".to_string(),
            name: "Real-time Mode".to_string(),
            description: "Monitor real-time streaming data as it comes in. The Time Conductor and \
                displays will automatically advance themselves based on a UTC clock."
                .to_string(),
            icon_class: "icon-clock".to_string(),
            variant: ModeVariant::Follow,
            required_capability: Some(TickCapability::Clock),
        }
    }

    pub fn latest() -> Self {
        Self {
            key: Self::LATEST.to_string(),
            label: "LAD".to_string(),
            name: "LAD Mode".to_string(),
            description: "Latest Available Data mode monitors real-time streaming data as it comes \
                in. The Time Conductor and displays will only advance when data becomes available."
                .to_string(),
            icon_class: "icon-database".to_string(),
            variant: ModeVariant::Follow,
            required_capability: Some(TickCapability::Data),
        }
    }

    /// Descriptor of the follow mode driven by `capability`
    pub fn for_capability(capability: TickCapability) -> Self {
        match capability {
            TickCapability::Clock => Self::realtime(),
            TickCapability::Data => Self::latest(),
        }
    }
}

/// Shared contract of all time-span modes
///
/// A mode is created on entry and destroyed on exit; the owner must call
/// [`Mode::destroy`] before another mode takes over the conductor.
pub trait Mode: Send + Sync {
    fn descriptor(&self) -> &ModeDescriptor;

    fn key(&self) -> &str {
        &self.descriptor().key
    }

    /// Time systems usable in this mode, in input order
    fn available_time_systems(&self) -> &[Arc<dyn TimeSystem>];

    /// Entry hook, run once the conductor has a compatible time system
    fn initialize(&mut self);

    /// Exit hook releasing every subscription taken in `initialize`
    fn destroy(&mut self);

    fn deltas(&self) -> Option<TimeDeltas>;

    /// Replace the deltas, returning the ones now in effect
    fn set_deltas(&mut self, deltas: TimeDeltas) -> Result<TimeDeltas>;

    /// Tick source currently driving the bounds, if any
    fn tick_source(&self) -> Option<Arc<dyn TickSource>> {
        None
    }
}

/// Time systems offering a tick source with `capability`; all of them for `None`
pub fn time_systems_for(
    time_systems: &[Arc<dyn TimeSystem>],
    capability: Option<TickCapability>,
) -> Vec<Arc<dyn TimeSystem>> {
    match capability {
        None => time_systems.to_vec(),
        Some(capability) => time_systems
            .iter()
            .filter(|time_system| time_system.supports(capability))
            .cloned()
            .collect(),
    }
}

/// Build the mode implementation named by the descriptor's variant
pub fn build_mode(
    descriptor: &ModeDescriptor,
    conductor: Arc<TimeConductor>,
    time_systems: &[Arc<dyn TimeSystem>],
) -> Box<dyn Mode> {
    match (descriptor.variant, descriptor.required_capability) {
        (ModeVariant::Follow, Some(capability)) => {
            Box::new(FollowMode::new(descriptor.clone(), capability, conductor, time_systems))
        }
        (ModeVariant::Follow, None) => {
            tracing::warn!(
                "Follow mode '{}' declares no tick capability; treating it as fixed",
                descriptor.key
            );
            Box::new(FixedMode::new(descriptor.clone(), conductor, time_systems))
        }
        (ModeVariant::Fixed, _) => Box::new(FixedMode::new(descriptor.clone(), conductor, time_systems)),
    }
}

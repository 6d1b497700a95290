//! Time systems and the bounds/deltas they operate on

use std::sync::Arc;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::tick_source::{TickCapability, TickSource};

/// Start and end of the time window in effect (milliseconds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeBounds {
    pub start: i64,
    pub end: i64,
}

impl TimeBounds {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Check that the start bound does not exceed the end bound
    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(Error::InvalidBounds { start: self.start, end: self.end });
        }
        Ok(())
    }

    /// Width of the window in milliseconds
    pub fn span(&self) -> i64 {
        self.end - self.start
    }
}

/// Offsets from "now" used by follow modes to derive bounds (milliseconds)
///
/// `start` reaches back into the past and `end` reaches into the future.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeDeltas {
    pub start: i64,
    pub end: i64,
}

impl TimeDeltas {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn validate(&self) -> Result<()> {
        if self.start < 0 || self.end < 0 {
            return Err(Error::InvalidDeltas { start: self.start, end: self.end });
        }
        Ok(())
    }

    /// Bounds around `now`, clamped to the `i64` range
    pub fn bounds_at(&self, now: i64) -> TimeBounds {
        TimeBounds::new(now.saturating_sub(self.start), now.saturating_add(self.end))
    }
}

/// Default bounds and deltas a time system starts with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSystemDefaults {
    pub bounds: TimeBounds,
    pub deltas: TimeDeltas,
}

/// Descriptive information about a time system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSystemMetadata {
    /// Unique identity of the time system
    pub key: String,
    pub name: String,
    pub icon_class: String,
    pub description: String,
}

/// A time coordinate system and the tick sources able to drive it
pub trait TimeSystem: Send + Sync {
    fn metadata(&self) -> &TimeSystemMetadata;

    /// Tick sources that can advance this time system
    fn tick_sources(&self) -> Vec<Arc<dyn TickSource>>;

    fn defaults(&self) -> TimeSystemDefaults;

    fn key(&self) -> &str {
        &self.metadata().key
    }

    /// Whether any of this system's tick sources has the given capability
    fn supports(&self, capability: TickCapability) -> bool {
        self.tick_sources()
            .iter()
            .any(|source| source.capability() == capability)
    }
}

impl std::fmt::Debug for dyn TimeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSystem")
            .field("key", &self.key())
            .finish()
    }
}

/// Membership test by time system key
pub fn contains(time_systems: &[Arc<dyn TimeSystem>], time_system: &dyn TimeSystem) -> bool {
    time_systems.iter().any(|t| t.key() == time_system.key())
}

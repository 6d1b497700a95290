//! Tick sources: providers of time-advancement events

use std::str::FromStr;
use std::sync::Arc;
use serde::{Serialize, Deserialize};

use crate::error::Error;

mod listeners;
mod local_clock;
mod manual;

pub use listeners::TickListeners;
pub use local_clock::LocalClock;
pub use manual::ManualTickSource;

/// Capability class of a tick source
///
/// Older configurations call this field `type` or `mode` and use the
/// strings `"LAD"` or `"data"` for data-driven sources; all of them map here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TickCapability {
    /// Advances with a wall clock
    #[serde(rename = "realtime", alias = "clock")]
    Clock,
    /// Advances only when new data arrives
    #[serde(rename = "latest", alias = "LAD", alias = "lad", alias = "data")]
    Data,
}

impl TickCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickCapability::Clock => "realtime",
            TickCapability::Data => "latest",
        }
    }
}

impl std::fmt::Display for TickCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TickCapability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" | "clock" => Ok(TickCapability::Clock),
            "latest" | "LAD" | "lad" | "data" => Ok(TickCapability::Data),
            other => Err(Error::Config(format!("Unknown tick capability '{}'", other))),
        }
    }
}

/// Descriptive information about a tick source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickSourceMetadata {
    pub key: String,
    pub name: String,
    #[serde(alias = "type", alias = "mode")]
    pub capability: TickCapability,
}

impl TickSourceMetadata {
    pub fn new(key: impl Into<String>, name: impl Into<String>, capability: TickCapability) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            capability,
        }
    }
}

/// Callback invoked with the tick time in milliseconds
pub type TickCallback = Arc<dyn Fn(i64) + Send + Sync>;

/// Trait for sources of tick events
pub trait TickSource: Send + Sync {
    fn metadata(&self) -> &TickSourceMetadata;

    /// Start delivering ticks to `callback` until the returned handle is dropped
    fn listen(&self, callback: TickCallback) -> TickSubscription;

    fn capability(&self) -> TickCapability {
        self.metadata().capability
    }
}

impl std::fmt::Debug for dyn TickSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSource")
            .field("key", &self.metadata().key)
            .field("capability", &self.capability())
            .finish()
    }
}

/// Handle for an active tick listener; unsubscribes when dropped
pub struct TickSubscription {
    unlisten: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl TickSubscription {
    pub fn new<F>(unlisten: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            unlisten: Some(Box::new(unlisten)),
        }
    }

    /// Stop receiving ticks
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unlisten) = self.unlisten.take() {
            unlisten();
        }
    }
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for TickSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSubscription")
            .field("active", &self.unlisten.is_some())
            .finish()
    }
}

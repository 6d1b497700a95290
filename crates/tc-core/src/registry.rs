//! Resolution of the modes that can be offered for a set of time systems

use std::sync::Arc;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::mode::{time_systems_for, ModeDescriptor};
use crate::tick_source::TickCapability;
use crate::time_system::TimeSystem;

/// Immutable mapping from mode key to descriptor, in offer order
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModeRegistry {
    modes: IndexMap<String, ModeDescriptor>,
}

impl ModeRegistry {
    /// Decide which modes exist for the installed time systems
    ///
    /// `fixed` is always present. Each follow mode is present only when at
    /// least one time system has a tick source with its capability.
    pub fn resolve(time_systems: &[Arc<dyn TimeSystem>]) -> Self {
        let mut modes = IndexMap::new();
        let fixed = ModeDescriptor::fixed();
        modes.insert(fixed.key.clone(), fixed);

        for capability in [TickCapability::Clock, TickCapability::Data] {
            if !time_systems_for(time_systems, Some(capability)).is_empty() {
                let descriptor = ModeDescriptor::for_capability(capability);
                modes.insert(descriptor.key.clone(), descriptor);
            }
        }

        tracing::debug!("Resolved modes: {:?}", modes.keys().collect::<Vec<_>>());
        Self { modes }
    }

    pub fn get(&self, key: &str) -> Option<&ModeDescriptor> {
        self.modes.get(key)
    }

    /// Look up a descriptor, failing on unknown keys
    pub fn require(&self, key: &str) -> Result<&ModeDescriptor> {
        self.get(key).ok_or_else(|| Error::UnknownMode(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.modes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModeDescriptor> {
        self.modes.values()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

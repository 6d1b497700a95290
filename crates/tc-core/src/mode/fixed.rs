//! Fixed timespan mode

use std::sync::Arc;

use super::{time_systems_for, Mode, ModeDescriptor};
use crate::conductor::TimeConductor;
use crate::error::Result;
use crate::time_system::{TimeDeltas, TimeSystem};

/// Mode whose bounds are chosen by the user and never advance
pub struct FixedMode {
    descriptor: ModeDescriptor,
    conductor: Arc<TimeConductor>,
    available: Vec<Arc<dyn TimeSystem>>,
    deltas: Option<TimeDeltas>,
    destroyed: bool,
}

impl FixedMode {
    pub fn new(
        descriptor: ModeDescriptor,
        conductor: Arc<TimeConductor>,
        time_systems: &[Arc<dyn TimeSystem>],
    ) -> Self {
        // Fixed supports every time system
        let available = time_systems_for(time_systems, None);
        Self {
            descriptor,
            conductor,
            available,
            deltas: None,
            destroyed: false,
        }
    }
}

impl Mode for FixedMode {
    fn descriptor(&self) -> &ModeDescriptor {
        &self.descriptor
    }

    fn available_time_systems(&self) -> &[Arc<dyn TimeSystem>] {
        &self.available
    }

    fn initialize(&mut self) {
        self.conductor.set_follow(false);
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            tracing::debug!("Destroyed mode '{}'", self.descriptor.key);
        }
    }

    fn deltas(&self) -> Option<TimeDeltas> {
        self.deltas
    }

    /// Deltas are remembered but never move fixed bounds
    fn set_deltas(&mut self, deltas: TimeDeltas) -> Result<TimeDeltas> {
        deltas.validate()?;
        self.deltas = Some(deltas);
        Ok(deltas)
    }
}

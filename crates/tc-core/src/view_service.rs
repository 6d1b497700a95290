//! Entry point used by UI code to discover and switch time conductor modes

use std::sync::Arc;

use crate::conductor::TimeConductor;
use crate::config::ConductorConfig;
use crate::error::{Error, Result};
use crate::mode::{build_mode, Mode, ModeDescriptor};
use crate::registry::ModeRegistry;
use crate::tick_source::TickSource;
use crate::time_system::{contains, TimeDeltas, TimeSystem};

/// Builds a mode instance from its descriptor
pub type ModeFactory = Box<
    dyn Fn(&ModeDescriptor, Arc<TimeConductor>, &[Arc<dyn TimeSystem>]) -> Box<dyn Mode> + Send + Sync,
>;

/// Owns the active mode and keeps the conductor's time system compatible with it
///
/// Starts with no mode selected. Each call to [`select_mode`] destroys the
/// previous mode before the next one is built, so at most one mode is ever
/// live.
///
/// [`select_mode`]: TimeConductorViewService::select_mode
pub struct TimeConductorViewService {
    conductor: Arc<TimeConductor>,
    time_systems: Vec<Arc<dyn TimeSystem>>,
    available_modes: ModeRegistry,
    config: ConductorConfig,
    factory: ModeFactory,
    mode: Option<Box<dyn Mode>>,
}

impl TimeConductorViewService {
    /// Create a view service over the installed time systems
    pub fn new(conductor: Arc<TimeConductor>, time_systems: Vec<Arc<dyn TimeSystem>>) -> Self {
        Self::with_config(conductor, time_systems, ConductorConfig::default())
    }

    pub fn with_config(
        conductor: Arc<TimeConductor>,
        time_systems: Vec<Arc<dyn TimeSystem>>,
        config: ConductorConfig,
    ) -> Self {
        let available_modes = ModeRegistry::resolve(&time_systems);
        tracing::info!(
            "Time conductor offers {} mode(s) over {} time system(s)",
            available_modes.len(),
            time_systems.len()
        );

        Self {
            conductor,
            time_systems,
            available_modes,
            config,
            factory: Box::new(build_mode),
            mode: None,
        }
    }

    /// Replace how modes are built from their descriptors
    pub fn with_factory(mut self, factory: ModeFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Key of the active mode, if one has been selected
    pub fn mode(&self) -> Option<&str> {
        self.mode.as_ref().map(|mode| mode.key())
    }

    /// Switch to the mode registered under `key`
    pub fn select_mode(&mut self, key: &str) -> Result<&str> {
        // Validate before touching the current mode
        let descriptor = self.available_modes.require(key)?.clone();

        if let Some(mut previous) = self.mode.take() {
            tracing::debug!("Leaving mode '{}'", previous.key());
            previous.destroy();
        }

        let mut mode = (self.factory)(&descriptor, self.conductor.clone(), self.time_systems.as_slice());
        self.reconcile_time_system(&*mode);
        mode.initialize();

        tracing::info!("Entered mode '{}'", descriptor.key);
        Ok(self.mode.insert(mode).key())
    }

    /// Select the configured default mode, or `fixed` if it is not available
    pub fn select_default_mode(&mut self) -> Result<&str> {
        let key = if self.available_modes.contains(&self.config.default_mode) {
            self.config.default_mode.clone()
        } else {
            tracing::warn!(
                "Default mode '{}' is not available; falling back to '{}'",
                self.config.default_mode,
                ModeDescriptor::FIXED
            );
            ModeDescriptor::FIXED.to_string()
        };
        self.select_mode(&key)
    }

    pub fn available_modes(&self) -> &ModeRegistry {
        &self.available_modes
    }

    /// Time systems usable in the active mode
    pub fn available_time_systems(&self) -> Result<&[Arc<dyn TimeSystem>]> {
        Ok(self.current()?.available_time_systems())
    }

    pub fn deltas(&self) -> Result<Option<TimeDeltas>> {
        Ok(self.current()?.deltas())
    }

    pub fn set_deltas(&mut self, deltas: TimeDeltas) -> Result<TimeDeltas> {
        self.current_mut()?.set_deltas(deltas)
    }

    pub fn tick_source(&self) -> Result<Option<Arc<dyn TickSource>>> {
        Ok(self.current()?.tick_source())
    }

    /// Report whether the active mode has a time system to work with
    pub fn check_time_system(&self) -> Result<()> {
        let mode = self.current()?;
        if mode.available_time_systems().is_empty() {
            return Err(Error::NoCompatibleTimeSystem { mode: mode.key().to_string() });
        }
        Ok(())
    }

    pub fn conductor(&self) -> &Arc<TimeConductor> {
        &self.conductor
    }

    /// Every installed time system, in input order
    pub fn time_systems(&self) -> &[Arc<dyn TimeSystem>] {
        &self.time_systems
    }

    fn current(&self) -> Result<&dyn Mode> {
        self.mode.as_deref().ok_or(Error::NoModeSelected)
    }

    fn current_mut(&mut self) -> Result<&mut Box<dyn Mode>> {
        self.mode.as_mut().ok_or(Error::NoModeSelected)
    }

    /// Keep the conductor's time system if the mode supports it, else use the first supported one
    fn reconcile_time_system(&self, mode: &dyn Mode) {
        let available = mode.available_time_systems();
        if let Some(current) = self.conductor.time_system() {
            if contains(available, current.as_ref()) {
                tracing::debug!("Keeping time system '{}' for mode '{}'", current.key(), mode.key());
                return;
            }
        }

        let Some(time_system) = available.first() else {
            tracing::warn!(
                "{}; leaving the conductor's time system unchanged",
                Error::NoCompatibleTimeSystem { mode: mode.key().to_string() }
            );
            return;
        };

        let bounds = time_system.defaults().bounds;
        if let Err(e) = self.conductor.set_time_system(time_system.clone(), bounds) {
            tracing::error!("Failed to apply time system '{}': {}", time_system.key(), e);
        }
    }
}

impl Drop for TimeConductorViewService {
    fn drop(&mut self) {
        if let Some(mut mode) = self.mode.take() {
            mode.destroy();
        }
    }
}

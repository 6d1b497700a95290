//! Core functionality for the time conductor
//! 
//! This crate decides which time-span modes (fixed, real-time, latest
//! available data) can be offered, which time systems each mode supports,
//! and keeps the conductor's active time system consistent when the user
//! switches between them.

pub mod conductor;
pub mod config;
pub mod error;
pub mod mode;
pub mod registry;
pub mod systems;
pub mod tick_source;
pub mod time_system;
pub mod view_service;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use conductor::{ConductorEvent, ConductorSubscriber, TimeConductor};
pub use config::ConductorConfig;
pub use error::{Error, Result};
pub use mode::{FixedMode, FollowMode, Mode, ModeDescriptor, ModeVariant};
pub use registry::ModeRegistry;
pub use systems::UtcTimeSystem;
pub use tick_source::{
    LocalClock, ManualTickSource, TickCallback, TickCapability, TickListeners,
    TickSource, TickSourceMetadata, TickSubscription,
};
pub use time_system::{TimeBounds, TimeDeltas, TimeSystem, TimeSystemDefaults, TimeSystemMetadata};
pub use view_service::{ModeFactory, TimeConductorViewService};

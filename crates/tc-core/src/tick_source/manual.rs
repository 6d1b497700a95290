//! Tick source advanced explicitly by its owner

use super::{TickCallback, TickListeners, TickSource, TickSourceMetadata, TickSubscription};

/// A tick source that ticks only when told to
///
/// Suits data-driven sources, where the arrival of a new datum is the tick,
/// as well as tests.
pub struct ManualTickSource {
    metadata: TickSourceMetadata,
    listeners: TickListeners,
}

impl ManualTickSource {
    pub fn new(metadata: TickSourceMetadata) -> Self {
        Self {
            metadata,
            listeners: TickListeners::new(),
        }
    }

    /// Deliver a tick at `time` to all listeners
    pub fn tick(&self, time: i64) {
        tracing::debug!("Tick source '{}' ticked at {}", self.metadata.key, time);
        self.listeners.emit(time);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl TickSource for ManualTickSource {
    fn metadata(&self) -> &TickSourceMetadata {
        &self.metadata
    }

    fn listen(&self, callback: TickCallback) -> TickSubscription {
        self.listeners.subscribe(callback)
    }
}

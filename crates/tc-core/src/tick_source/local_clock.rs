//! Wall-clock tick source

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::{
    TickCallback, TickCapability, TickListeners, TickSource, TickSourceMetadata, TickSubscription,
};

/// Clock-driven tick source emitting the current UTC time
pub struct LocalClock {
    metadata: TickSourceMetadata,
    period: Duration,
    listeners: Arc<TickListeners>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LocalClock {
    /// Create a clock ticking every `period` once started
    pub fn new(period: Duration) -> Self {
        Self {
            metadata: TickSourceMetadata::new("local", "A local time source", TickCapability::Clock),
            period,
            listeners: Arc::new(TickListeners::new()),
            task: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Emit a single tick with the current time
    pub fn tick_now(&self) {
        self.listeners.emit(Utc::now().timestamp_millis());
    }

    /// Start ticking periodically on the given runtime
    pub fn start(&self, handle: &tokio::runtime::Handle) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let listeners = self.listeners.clone();
        let period = self.period;
        tracing::debug!("Starting local clock with period {:?}", period);
        *task = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                listeners.emit(Utc::now().timestamp_millis());
            }
        }));
    }

    /// Stop the periodic task, if running
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            tracing::debug!("Stopping local clock");
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl TickSource for LocalClock {
    fn metadata(&self) -> &TickSourceMetadata {
        &self.metadata
    }

    fn listen(&self, callback: TickCallback) -> TickSubscription {
        self.listeners.subscribe(callback)
    }
}

impl Drop for LocalClock {
    fn drop(&mut self) {
        self.stop();
    }
}

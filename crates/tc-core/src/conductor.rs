//! The time conductor: holder of the active time system and bounds

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::time_system::{TimeBounds, TimeSystem};

/// Conductor state stored internally
#[derive(Default)]
struct ConductorState {
    time_system: Option<Arc<dyn TimeSystem>>,
    bounds: Option<TimeBounds>,
    follow: bool,
}

/// Events waiting to be delivered
#[derive(Default)]
struct Dispatch {
    queue: VecDeque<ConductorEvent>,
    active: bool,
}

/// Changes broadcast to conductor subscribers
#[derive(Debug, Clone)]
pub enum ConductorEvent {
    TimeSystemChanged(Arc<dyn TimeSystem>),
    BoundsChanged(TimeBounds),
    FollowChanged(bool),
}

/// Trait for components that need to respond to conductor changes
pub trait ConductorSubscriber: Send + Sync {
    fn on_conductor_event(&self, event: &ConductorEvent);
}

/// Holds the globally active time system and bounds
///
/// Events are delivered one at a time in the order the changes were made.
/// A change made while events are being delivered (from a subscriber, or
/// from another thread) is queued behind them and delivered by the same
/// dispatch loop before it returns.
pub struct TimeConductor {
    state: Arc<RwLock<ConductorState>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn ConductorSubscriber>>>>,
    dispatch: Mutex<Dispatch>,
}

impl TimeConductor {
    /// Create a conductor with no time system
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ConductorState::default())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            dispatch: Mutex::new(Dispatch::default()),
        }
    }

    pub fn time_system(&self) -> Option<Arc<dyn TimeSystem>> {
        self.state.read().time_system.clone()
    }

    /// Switch the active time system together with new bounds
    pub fn set_time_system(&self, time_system: Arc<dyn TimeSystem>, bounds: TimeBounds) -> Result<()> {
        bounds.validate()?;

        tracing::info!("Time system changed to '{}'", time_system.key());
        let mut state = self.state.write();
        state.time_system = Some(time_system.clone());
        state.bounds = Some(bounds);
        let drain = self.enqueue([
            ConductorEvent::TimeSystemChanged(time_system),
            ConductorEvent::BoundsChanged(bounds),
        ]);
        drop(state);

        if drain {
            self.drain();
        }
        Ok(())
    }

    pub fn bounds(&self) -> Option<TimeBounds> {
        self.state.read().bounds
    }

    /// Set new bounds, rejecting a start after the end
    pub fn set_bounds(&self, bounds: TimeBounds) -> Result<()> {
        bounds.validate()?;

        let mut state = self.state.write();
        state.bounds = Some(bounds);
        let drain = self.enqueue([ConductorEvent::BoundsChanged(bounds)]);
        drop(state);

        if drain {
            self.drain();
        }
        Ok(())
    }

    /// Whether bounds are currently following a tick source
    pub fn follow(&self) -> bool {
        self.state.read().follow
    }

    pub fn set_follow(&self, follow: bool) {
        let mut state = self.state.write();
        if state.follow == follow {
            return;
        }
        state.follow = follow;
        let drain = self.enqueue([ConductorEvent::FollowChanged(follow)]);
        drop(state);

        if drain {
            self.drain();
        }
    }

    /// Add a subscriber; it is dropped from the list once its last `Arc` goes away
    pub fn add_subscriber(&self, subscriber: Arc<dyn ConductorSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.len()
    }

    /// Queue events; returns whether the caller must run the dispatch loop
    ///
    /// Called with the state lock held so queue order matches state order.
    fn enqueue<const N: usize>(&self, events: [ConductorEvent; N]) -> bool {
        let mut dispatch = self.dispatch.lock();
        dispatch.queue.extend(events);
        if dispatch.active {
            return false;
        }
        dispatch.active = true;
        true
    }

    fn drain(&self) {
        loop {
            let event = {
                let mut dispatch = self.dispatch.lock();
                match dispatch.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        dispatch.active = false;
                        return;
                    }
                }
            };
            self.notify_subscribers(&event);
        }
    }

    fn notify_subscribers(&self, event: &ConductorEvent) {
        let live: Vec<Arc<dyn ConductorSubscriber>> = {
            let mut subscribers = self.subscribers.write();

            // Remove any dead weak references
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        // Locks released; subscribers may call back into the conductor
        for subscriber in live {
            subscriber.on_conductor_event(event);
        }
    }
}

impl Default for TimeConductor {
    fn default() -> Self {
        Self::new()
    }
}

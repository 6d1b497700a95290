//! Follow modes: bounds that advance with a tick source

use std::sync::{Arc, Weak};
use parking_lot::RwLock;

use super::{time_systems_for, Mode, ModeDescriptor};
use crate::conductor::{ConductorEvent, ConductorSubscriber, TimeConductor};
use crate::error::Result;
use crate::tick_source::{TickCallback, TickCapability, TickSource, TickSubscription};
use crate::time_system::{contains, TimeBounds, TimeDeltas, TimeSystem};

#[derive(Default)]
struct FollowState {
    deltas: Option<TimeDeltas>,
    tick_source: Option<Arc<dyn TickSource>>,
    subscription: Option<TickSubscription>,
}

/// State reachable from tick callbacks and conductor listeners
struct FollowShared {
    key: String,
    capability: TickCapability,
    conductor: Arc<TimeConductor>,
    state: RwLock<FollowState>,
    /// Whether the mode is live; held shared while a tick or time system
    /// change writes to the conductor, exclusively by `initialize`/`destroy`
    live: RwLock<bool>,
}

impl FollowShared {
    fn tick_callback(self: &Arc<Self>) -> TickCallback {
        let shared = Arc::downgrade(self);
        Arc::new(move |time| {
            if let Some(shared) = shared.upgrade() {
                shared.tick(time);
            }
        })
    }

    fn tick(&self, time: i64) {
        let live = self.live.read();
        if !*live {
            return;
        }
        let bounds = self
            .state
            .read()
            .deltas
            .map(|deltas| deltas.bounds_at(time))
            .unwrap_or_else(|| TimeBounds::new(time, time));

        if let Err(e) = self.conductor.set_bounds(bounds) {
            tracing::warn!("Mode '{}' failed to advance bounds: {}", self.key, e);
        }
        // `destroy` waits for this guard
        drop(live);
    }

    /// Follow the first tick source of `time_system` with our capability
    fn change_time_system(self: &Arc<Self>, time_system: &dyn TimeSystem, push_bounds: bool) {
        let source = time_system
            .tick_sources()
            .into_iter()
            .find(|source| source.capability() == self.capability);

        let previous = self.state.write().subscription.take();
        drop(previous);

        let subscription = source.as_ref().map(|source| {
            tracing::debug!("Mode '{}' listening to tick source '{}'", self.key, source.metadata().key);
            source.listen(self.tick_callback())
        });
        if source.is_none() {
            tracing::warn!(
                "Time system '{}' has no {} tick source; mode '{}' will not advance",
                time_system.key(),
                self.capability,
                self.key
            );
        }

        {
            let mut state = self.state.write();
            state.tick_source = source;
            state.subscription = subscription;
        }

        let defaults = time_system.defaults().deltas;
        if push_bounds {
            if let Err(e) = self.apply_deltas(defaults) {
                tracing::warn!("Mode '{}' rejected default deltas: {}", self.key, e);
            }
        } else {
            self.state.write().deltas = Some(defaults);
        }
    }

    /// Recompute bounds around the current "now", then store the new deltas
    fn apply_deltas(&self, deltas: TimeDeltas) -> Result<TimeDeltas> {
        deltas.validate()?;

        let bounds = {
            let mut state = self.state.write();
            let bounds = match self.conductor.bounds() {
                Some(bounds) => {
                    let now = bounds.end.saturating_sub(state.deltas.map_or(0, |d| d.end));
                    let bounds = deltas.bounds_at(now);
                    bounds.validate()?;
                    Some(bounds)
                }
                None => None,
            };
            state.deltas = Some(deltas);
            bounds
        };

        if let Some(bounds) = bounds {
            self.conductor.set_bounds(bounds)?;
        }
        Ok(deltas)
    }
}

/// Re-targets the mode when the conductor switches time system
struct TimeSystemListener {
    shared: Weak<FollowShared>,
}

impl ConductorSubscriber for TimeSystemListener {
    fn on_conductor_event(&self, event: &ConductorEvent) {
        if let ConductorEvent::TimeSystemChanged(time_system) = event {
            if let Some(shared) = self.shared.upgrade() {
                let live = shared.live.read_recursive();
                if *live {
                    shared.change_time_system(time_system.as_ref(), true);
                }
            }
        }
    }
}

/// Mode whose bounds follow a clock- or data-driven tick source
pub struct FollowMode {
    descriptor: ModeDescriptor,
    available: Vec<Arc<dyn TimeSystem>>,
    shared: Arc<FollowShared>,
    listener: Option<Arc<TimeSystemListener>>,
    initialized: bool,
    destroyed: bool,
}

impl FollowMode {
    pub fn new(
        descriptor: ModeDescriptor,
        capability: TickCapability,
        conductor: Arc<TimeConductor>,
        time_systems: &[Arc<dyn TimeSystem>],
    ) -> Self {
        let available = time_systems_for(time_systems, Some(capability));
        let shared = Arc::new(FollowShared {
            key: descriptor.key.clone(),
            capability,
            conductor,
            state: RwLock::new(FollowState::default()),
            live: RwLock::new(false),
        });

        Self {
            descriptor,
            available,
            shared,
            listener: None,
            initialized: false,
            destroyed: false,
        }
    }

    pub fn capability(&self) -> TickCapability {
        self.shared.capability
    }
}

impl Mode for FollowMode {
    fn descriptor(&self) -> &ModeDescriptor {
        &self.descriptor
    }

    fn available_time_systems(&self) -> &[Arc<dyn TimeSystem>] {
        &self.available
    }

    fn initialize(&mut self) {
        if self.initialized || self.destroyed {
            return;
        }
        self.initialized = true;

        let conductor = self.shared.conductor.clone();
        conductor.set_follow(true);
        *self.shared.live.write() = true;

        match conductor.time_system() {
            Some(time_system) if contains(&self.available, time_system.as_ref()) => {
                self.shared.change_time_system(time_system.as_ref(), false);
            }
            _ => tracing::warn!(
                "Mode '{}' initialized without a compatible time system",
                self.descriptor.key
            ),
        }

        let listener = Arc::new(TimeSystemListener {
            shared: Arc::downgrade(&self.shared),
        });
        conductor.add_subscriber(listener.clone());
        self.listener = Some(listener);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        // Waits for any tick still writing to the conductor
        *self.shared.live.write() = false;

        let subscription = self.shared.state.write().subscription.take();
        drop(subscription);
        self.listener = None;

        tracing::debug!("Destroyed mode '{}'", self.descriptor.key);
    }

    fn deltas(&self) -> Option<TimeDeltas> {
        self.shared.state.read().deltas
    }

    fn set_deltas(&mut self, deltas: TimeDeltas) -> Result<TimeDeltas> {
        self.shared.apply_deltas(deltas)
    }

    fn tick_source(&self) -> Option<Arc<dyn TickSource>> {
        self.shared.state.read().tick_source.clone()
    }
}

impl Drop for FollowMode {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::testing::{clock_system, data_system, dual_system, Recorder, StubTimeSystem};

    fn realtime(conductor: &Arc<TimeConductor>, systems: &[Arc<dyn TimeSystem>]) -> FollowMode {
        FollowMode::new(ModeDescriptor::realtime(), TickCapability::Clock, conductor.clone(), systems)
    }

    #[test]
    fn test_available_filters_by_capability() {
        let conductor = Arc::new(TimeConductor::new());
        let systems = vec![clock_system("a"), data_system("b"), dual_system("c")];
        let mode = realtime(&conductor, &systems);

        let keys: Vec<&str> = mode.available_time_systems().iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_ticks_advance_bounds_with_deltas() {
        let conductor = Arc::new(TimeConductor::new());
        let system = StubTimeSystem::clock("a");
        let systems: Vec<Arc<dyn TimeSystem>> = vec![system.clone()];
        conductor.set_time_system(system.clone(), TimeBounds::new(0, 100)).unwrap();

        let mut mode = realtime(&conductor, &systems);
        mode.initialize();

        assert!(conductor.follow());
        assert_eq!(mode.deltas(), Some(system.defaults().deltas));
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(0, 100)));

        system.source(0).tick(1_000);
        let deltas = system.defaults().deltas;
        assert_eq!(conductor.bounds(), Some(deltas.bounds_at(1_000)));
    }

    #[test]
    fn test_set_deltas_recomputes_from_now() {
        let conductor = Arc::new(TimeConductor::new());
        let system = StubTimeSystem::clock("a");
        let systems: Vec<Arc<dyn TimeSystem>> = vec![system.clone()];
        conductor.set_time_system(system.clone(), TimeBounds::new(0, 100)).unwrap();

        let mut mode = realtime(&conductor, &systems);
        mode.initialize();
        mode.set_deltas(TimeDeltas::new(10, 0)).unwrap();
        system.source(0).tick(500);
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(490, 500)));

        mode.set_deltas(TimeDeltas::new(30, 20)).unwrap();
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(470, 520)));
        assert!(mode.set_deltas(TimeDeltas::new(-1, 0)).is_err());
    }

    #[test]
    fn test_destroy_releases_subscriptions() {
        let conductor = Arc::new(TimeConductor::new());
        let system = StubTimeSystem::clock("a");
        let systems: Vec<Arc<dyn TimeSystem>> = vec![system.clone()];
        conductor.set_time_system(system.clone(), TimeBounds::new(0, 100)).unwrap();

        let mut mode = realtime(&conductor, &systems);
        mode.initialize();
        assert_eq!(system.source(0).listener_count(), 1);
        assert_eq!(conductor.subscriber_count(), 1);

        mode.destroy();
        mode.destroy();
        system.source(0).tick(5_000);

        assert_eq!(system.source(0).listener_count(), 0);
        assert_eq!(conductor.subscriber_count(), 0);
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(0, 100)));
    }

    #[test]
    fn test_follows_conductor_time_system_change() {
        let conductor = Arc::new(TimeConductor::new());
        let first = StubTimeSystem::clock("a");
        let second = StubTimeSystem::clock("b");
        let systems: Vec<Arc<dyn TimeSystem>> = vec![first.clone(), second.clone()];
        conductor.set_time_system(first.clone(), TimeBounds::new(0, 100)).unwrap();

        let mut mode = realtime(&conductor, &systems);
        mode.initialize();
        conductor.set_time_system(second.clone(), TimeBounds::new(1_000, 2_000)).unwrap();

        assert_eq!(first.source(0).listener_count(), 0);
        assert_eq!(second.source(0).listener_count(), 1);
        assert_eq!(mode.tick_source().unwrap().metadata().key, "b-clock");

        second.source(0).tick(3_000);
        assert_eq!(conductor.bounds(), Some(second.defaults().deltas.bounds_at(3_000)));
    }

    #[test]
    fn test_time_system_change_events_end_with_current_bounds() {
        let conductor = Arc::new(TimeConductor::new());
        let first = StubTimeSystem::clock("a");
        let second = StubTimeSystem::clock("b");
        let systems: Vec<Arc<dyn TimeSystem>> = vec![first.clone(), second.clone()];
        conductor.set_time_system(first.clone(), TimeBounds::new(0, 100)).unwrap();

        let mut mode = realtime(&conductor, &systems);
        mode.initialize();
        let recorder = Arc::new(Recorder::default());
        conductor.add_subscriber(recorder.clone());

        conductor.set_time_system(second.clone(), TimeBounds::new(1_000, 2_000)).unwrap();

        assert_eq!(
            recorder.events(),
            vec!["time_system:b", "bounds:1000..2000", "bounds:1950..2000"]
        );
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(1_950, 2_000)));
    }

    #[test]
    fn test_rejected_deltas_leave_state_untouched() {
        let conductor = Arc::new(TimeConductor::new());
        let system = StubTimeSystem::clock("a");
        let systems: Vec<Arc<dyn TimeSystem>> = vec![system.clone()];
        conductor.set_time_system(system.clone(), TimeBounds::new(0, 100)).unwrap();

        let mut mode = realtime(&conductor, &systems);
        mode.initialize();
        mode.set_deltas(TimeDeltas::new(10, 0)).unwrap();

        assert!(mode.set_deltas(TimeDeltas::new(5, -1)).is_err());
        assert_eq!(mode.deltas(), Some(TimeDeltas::new(10, 0)));
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(90, 100)));
    }

    #[test]
    fn test_ticks_near_time_limits_saturate() {
        let conductor = Arc::new(TimeConductor::new());
        let system = StubTimeSystem::clock("a");
        let systems: Vec<Arc<dyn TimeSystem>> = vec![system.clone()];
        conductor.set_time_system(system.clone(), TimeBounds::new(0, 100)).unwrap();

        let mut mode = realtime(&conductor, &systems);
        mode.initialize();
        mode.set_deltas(TimeDeltas::new(10, 5)).unwrap();

        system.source(0).tick(i64::MAX);
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(i64::MAX - 10, i64::MAX)));

        mode.set_deltas(TimeDeltas::new(20, 0)).unwrap();
        assert_eq!(conductor.bounds(), Some(TimeBounds::new(i64::MAX - 25, i64::MAX - 5)));
    }

    #[test]
    fn test_no_ticks_reach_conductor_after_destroy() {
        for _ in 0..200 {
            let conductor = Arc::new(TimeConductor::new());
            let system = StubTimeSystem::clock("a");
            let systems: Vec<Arc<dyn TimeSystem>> = vec![system.clone()];
            conductor.set_time_system(system.clone(), TimeBounds::new(0, 100)).unwrap();

            let mut mode = realtime(&conductor, &systems);
            mode.initialize();

            let stop = Arc::new(AtomicBool::new(false));
            let ticker = {
                let source = system.source(0).clone();
                let stop = stop.clone();
                std::thread::spawn(move || {
                    let mut time = 1_000;
                    while !stop.load(Ordering::SeqCst) {
                        source.tick(time);
                        time += 1;
                    }
                })
            };

            while conductor.bounds() == Some(TimeBounds::new(0, 100)) {
                std::thread::yield_now();
            }
            mode.destroy();
            conductor.set_bounds(TimeBounds::new(-5, -1)).unwrap();
            std::thread::yield_now();

            stop.store(true, Ordering::SeqCst);
            ticker.join().unwrap();
            assert_eq!(conductor.bounds(), Some(TimeBounds::new(-5, -1)));
        }
    }
}

//! Fixed-timestep simulation scheduling
//!
//! Decouples variable wall-clock frame delivery from fixed physics
//! stepping. The host's frame callback drives [`SimulationScheduler::tick`]
//! (or hands a measured delta to [`SimulationScheduler::advance`], the pure
//! core that every test exercises without a display loop). Fixed-update
//! consumers always run to completion before render consumers within a
//! tick, and substeps run sequentially in registration order.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::foundation::time::Timer;

new_key_type! {
    /// Handle to a registered fixed-update consumer
    pub struct FixedConsumerKey;
    /// Handle to a registered render consumer
    pub struct RenderConsumerKey;
    /// Handle to a registered state observer
    pub struct ObserverKey;
}

/// Configuration for the fixed-timestep loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fixed simulation steps per second
    pub tick_rate: u32,

    /// Largest wall-clock delta accepted per tick (seconds); anything
    /// larger (debugger pause, backgrounded tab) is clamped down to this
    pub max_frame_delta: f32,

    /// Most fixed substeps allowed in a single tick
    pub max_substeps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_frame_delta: 0.1,
            max_substeps: 5,
        }
    }
}

impl SchedulerConfig {
    /// Duration of one fixed step in seconds
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

/// Lifecycle state of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started, or stopped; no callbacks fire
    Stopped,
    /// Physics and render callbacks both fire
    Running,
    /// Render callbacks fire; physics is frozen
    Paused,
}

/// Invalid lifecycle transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// `start` while already running or paused
    #[error("scheduler already started")]
    AlreadyStarted,
    /// `pause` while not running
    #[error("scheduler is not running")]
    NotRunning,
    /// `resume` while not paused
    #[error("scheduler is not paused")]
    NotPaused,
    /// `stop` while already stopped
    #[error("scheduler already stopped")]
    AlreadyStopped,
}

/// Control handle passed to consumers during a tick
///
/// Lets a callback request a stop or pause mid-tick without reaching for
/// the scheduler itself; the request is honored before the next callback
/// fires.
#[derive(Debug, Default)]
pub struct TickSignals {
    stop: bool,
    pause: bool,
}

impl TickSignals {
    /// Request that the scheduler stop before the next callback
    pub fn request_stop(&mut self) {
        self.stop = true;
    }

    /// Request that the scheduler pause once this tick's render pass ends
    pub fn request_pause(&mut self) {
        self.pause = true;
    }
}

type FixedConsumer = Box<dyn FnMut(f32, &mut TickSignals)>;
type RenderConsumer = Box<dyn FnMut(f32, &mut TickSignals)>;
type Observer = Box<dyn FnMut(SchedulerState, SchedulerState)>;

/// Fixed-timestep driver
///
/// Single-threaded and cooperative: all stepping happens inside `advance`,
/// on the caller's thread. Constructed once by the composition root and
/// handed to whoever needs to register consumers.
pub struct SimulationScheduler {
    config: SchedulerConfig,
    state: SchedulerState,
    accumulator: f32,
    timer: Timer,

    fixed_consumers: SlotMap<FixedConsumerKey, FixedConsumer>,
    fixed_order: Vec<FixedConsumerKey>,
    render_consumers: SlotMap<RenderConsumerKey, RenderConsumer>,
    render_order: Vec<RenderConsumerKey>,
    observers: SlotMap<ObserverKey, Observer>,
    observer_order: Vec<ObserverKey>,
}

impl SimulationScheduler {
    /// Creates a stopped scheduler
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Stopped,
            accumulator: 0.0,
            timer: Timer::new(),
            fixed_consumers: SlotMap::with_key(),
            fixed_order: Vec::new(),
            render_consumers: SlotMap::with_key(),
            render_order: Vec::new(),
            observers: SlotMap::with_key(),
            observer_order: Vec::new(),
        }
    }

    /// Register a fixed-update consumer, called once per fixed substep with
    /// the fixed step duration. Consumers run in registration order.
    pub fn register_fixed<F>(&mut self, consumer: F) -> FixedConsumerKey
    where
        F: FnMut(f32, &mut TickSignals) + 'static,
    {
        let key = self.fixed_consumers.insert(Box::new(consumer));
        self.fixed_order.push(key);
        key
    }

    /// Remove a fixed-update consumer; returns whether it was registered
    pub fn unregister_fixed(&mut self, key: FixedConsumerKey) -> bool {
        self.fixed_order.retain(|&k| k != key);
        self.fixed_consumers.remove(key).is_some()
    }

    /// Register a render consumer, called once per tick with the
    /// interpolation alpha. Render consumers fire even while paused, so the
    /// screen keeps redrawing without physics running.
    pub fn register_render<F>(&mut self, consumer: F) -> RenderConsumerKey
    where
        F: FnMut(f32, &mut TickSignals) + 'static,
    {
        let key = self.render_consumers.insert(Box::new(consumer));
        self.render_order.push(key);
        key
    }

    /// Remove a render consumer; returns whether it was registered
    pub fn unregister_render(&mut self, key: RenderConsumerKey) -> bool {
        self.render_order.retain(|&k| k != key);
        self.render_consumers.remove(key).is_some()
    }

    /// Register an observer notified on every state transition with
    /// `(old, new)`
    pub fn observe<F>(&mut self, observer: F) -> ObserverKey
    where
        F: FnMut(SchedulerState, SchedulerState) + 'static,
    {
        let key = self.observers.insert(Box::new(observer));
        self.observer_order.push(key);
        key
    }

    /// Remove an observer; returns whether it was registered
    pub fn unobserve(&mut self, key: ObserverKey) -> bool {
        self.observer_order.retain(|&k| k != key);
        self.observers.remove(key).is_some()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Duration of one fixed step in seconds
    pub fn fixed_dt(&self) -> f32 {
        self.config.fixed_dt()
    }

    /// Fraction of the next unconsumed fixed step, in `[0, 1)`
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.config.fixed_dt()).clamp(0.0, 1.0)
    }

    /// Begin running; the host should start delivering frame callbacks
    pub fn start(&mut self) -> Result<(), StateError> {
        if self.state != SchedulerState::Stopped {
            return Err(StateError::AlreadyStarted);
        }
        self.accumulator = 0.0;
        self.timer = Timer::new();
        self.set_state(SchedulerState::Running);
        Ok(())
    }

    /// Freeze physics; render callbacks keep firing
    pub fn pause(&mut self) -> Result<(), StateError> {
        if self.state != SchedulerState::Running {
            return Err(StateError::NotRunning);
        }
        self.set_state(SchedulerState::Paused);
        Ok(())
    }

    /// Resume from pause
    ///
    /// The accumulator is cleared so a long pause (tab backgrounding) does
    /// not burst into catch-up substeps on the first resumed tick.
    pub fn resume(&mut self) -> Result<(), StateError> {
        if self.state != SchedulerState::Paused {
            return Err(StateError::NotPaused);
        }
        self.accumulator = 0.0;
        self.timer = Timer::new();
        self.set_state(SchedulerState::Running);
        Ok(())
    }

    /// Stop entirely; no further physics or render callbacks fire
    pub fn stop(&mut self) -> Result<(), StateError> {
        if self.state == SchedulerState::Stopped {
            return Err(StateError::AlreadyStopped);
        }
        self.accumulator = 0.0;
        self.set_state(SchedulerState::Stopped);
        Ok(())
    }

    fn set_state(&mut self, new: SchedulerState) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        log::debug!("scheduler {old:?} -> {new:?}");
        for key in self.observer_order.clone() {
            if let Some(observer) = self.observers.get_mut(key) {
                observer(old, new);
            }
        }
    }

    /// Convenience tick: measure the wall-clock delta and advance
    pub fn tick(&mut self) {
        self.timer.update();
        let delta = self.timer.delta_time();
        self.advance(delta);
    }

    /// Advance the loop by a measured wall-clock delta
    ///
    /// This is the whole tick algorithm: clamp the delta, accumulate, run
    /// bounded fixed substeps, then run render consumers with the
    /// interpolation alpha. Safe to call in any state; does nothing while
    /// stopped.
    pub fn advance(&mut self, wall_dt: f32) {
        if self.state == SchedulerState::Stopped {
            return;
        }

        let wall_dt = if wall_dt.is_finite() { wall_dt.max(0.0) } else { 0.0 };
        let clamped = wall_dt.min(self.config.max_frame_delta);

        let mut signals = TickSignals::default();

        if self.state == SchedulerState::Running {
            self.accumulator += clamped;
            let fixed_dt = self.config.fixed_dt();

            let mut substeps = 0;
            'substeps: while self.accumulator >= fixed_dt && substeps < self.config.max_substeps {
                for key in self.fixed_order.clone() {
                    if let Some(consumer) = self.fixed_consumers.get_mut(key) {
                        consumer(fixed_dt, &mut signals);
                    }
                    if signals.stop {
                        // No further physics or render callbacks this tick.
                        let _ = self.stop();
                        return;
                    }
                    if signals.pause {
                        break 'substeps;
                    }
                }
                self.accumulator -= fixed_dt;
                substeps += 1;
            }

            // The substep bound can leave more than one step of backlog;
            // it is dropped, not owed, or a hitch would replay as another.
            if self.accumulator >= fixed_dt {
                log::debug!("dropping {:.3}s of substep backlog", self.accumulator - fixed_dt);
                self.accumulator %= fixed_dt;
            }
        }

        let alpha = self.alpha();
        for key in self.render_order.clone() {
            if let Some(consumer) = self.render_consumers.get_mut(key) {
                consumer(alpha, &mut signals);
            }
            if signals.stop {
                let _ = self.stop();
                return;
            }
        }

        if signals.pause && self.state == SchedulerState::Running {
            let _ = self.pause();
        }
    }
}

//! Timer records and the builder used to register them.

use std::time::Duration;

use crate::error::{TimerError, TimerResult};
use crate::id::TimerId;
use crate::scheduler::Scheduler;
use crate::target::{Detached, TimerTarget};

/// Per-interval callback. Receives the scheduler so it can register, cancel or
/// suspend re-entrantly.
pub type IntervalFn = Box<dyn FnMut(&mut Scheduler, TimerId)>;

/// One-time completion callback.
pub type CompleteFn = Box<dyn FnOnce(&mut Scheduler, TimerId)>;

/// Which tick quantity advances a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerMode {
    /// Advanced by elapsed wall-clock seconds.
    RealTime,
    /// Advanced by elapsed frame units.
    FrameBased,
}

/// Remaining firings before a timer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Countdown {
    /// Completes when this reaches zero. A timer registered with
    /// `Remaining(0)` completes on its first firing.
    Remaining(u32),
    /// Never completes on its own.
    Infinite,
}

impl Countdown {
    /// Whether the next firing (or reconciliation) completes the timer.
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::Remaining(0))
    }

    /// Charge one firing.
    pub(crate) fn decrement(&mut self) {
        if let Self::Remaining(n) = self {
            *n = n.saturating_sub(1);
        }
    }

    /// Charge `lost` firings at once without running them. Returns true when
    /// the countdown is used up and the timer should complete.
    pub(crate) fn reconcile(&mut self, lost: u64) -> bool {
        match *self {
            Self::Infinite => false,
            _ if lost == 0 => false,
            Self::Remaining(n) if lost >= u64::from(n) => {
                *self = Self::Remaining(0);
                true
            }
            Self::Remaining(n) => {
                *self = Self::Remaining(n - lost as u32);
                false
            }
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::Remaining(0)
    }
}

/// A registered timer.
pub(crate) struct Timer {
    pub id: TimerId,
    pub mode: TimerMode,
    /// Seconds or frame units between firings.
    pub step: f64,
    /// Stored, not consumed by the firing path.
    pub delay: f64,
    /// Excess since the last firing, always in `[0, step)` between ticks.
    pub accumulator: f64,
    pub countdown: Countdown,
    /// Scheduler elapsed time when suspended.
    pub paused_at: Option<Duration>,
    pub finished: bool,
    pub target: Box<dyn TimerTarget>,
    pub on_interval: Option<IntervalFn>,
    pub on_complete: Option<CompleteFn>,
}

/// Relative tolerance below a step boundary that still counts as reaching it.
pub(crate) const STEP_EPSILON: f64 = 1e-9;

/// Split `total` into whole steps and the remainder.
///
/// A total within `step * STEP_EPSILON` of the next boundary counts as having
/// reached it, so `0.1` added ten times against a `1.0` step fires once. The
/// remainder is always in `[0, step)`.
pub(crate) fn whole_steps(total: f64, step: f64) -> (u64, f64) {
    let mut steps = (total / step).floor();
    let mut rest = total - steps * step;

    if rest >= step - step * STEP_EPSILON {
        steps += 1.0;
        rest -= step;
    }
    if rest < 0.0 {
        rest = 0.0;
    }

    (steps.max(0.0) as u64, rest)
}

impl Timer {
    /// Add `delta` to the accumulator and return how many whole steps elapsed.
    pub fn accumulate(&mut self, delta: f64) -> u64 {
        if !delta.is_finite() || delta <= 0.0 {
            return 0;
        }

        let (fires, rest) = whole_steps(self.accumulator + delta, self.step);
        self.accumulator = rest;
        fires
    }

    pub fn is_target_alive(&self) -> bool {
        self.target.is_alive()
    }
}

impl core::fmt::Debug for Timer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("step", &self.step)
            .field("accumulator", &self.accumulator)
            .field("countdown", &self.countdown)
            .field("paused_at", &self.paused_at)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Builder for a timer registration.
///
/// # Example
///
/// ```
/// use rgb_timer::{Scheduler, TimerBuilder};
///
/// let mut scheduler = Scheduler::new();
/// let id = scheduler
///     .register_interval(
///         TimerBuilder::new(1.0)
///             .countdown(3)
///             .on_interval(|_scheduler, id| tracing::info!("{id} fired"))
///             .on_complete(|_scheduler, id| tracing::info!("{id} done")),
///     )
///     .unwrap();
/// assert!(scheduler.contains(id));
/// ```
pub struct TimerBuilder {
    step: f64,
    delay: f64,
    countdown: Countdown,
    target: Box<dyn TimerTarget>,
    on_interval: Option<IntervalFn>,
    on_complete: Option<CompleteFn>,
}

impl TimerBuilder {
    /// Start a timer that fires every `step` seconds (or frame units).
    #[must_use]
    pub fn new(step: f64) -> Self {
        Self {
            step,
            delay: 0.0,
            countdown: Countdown::default(),
            target: Box::new(Detached),
            on_interval: None,
            on_complete: None,
        }
    }

    /// Initial delay. Stored with the timer but does not postpone firing.
    #[must_use]
    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// Fire `n` times, then complete. `0` completes on the first firing.
    #[must_use]
    pub fn countdown(mut self, n: u32) -> Self {
        self.countdown = Countdown::Remaining(n);
        self
    }

    /// Fire until cancelled.
    #[must_use]
    pub fn repeat_forever(mut self) -> Self {
        self.countdown = Countdown::Infinite;
        self
    }

    /// Tie the timer to an owner. Once the owner reports dead, the timer
    /// finishes without firing.
    #[must_use]
    pub fn target(mut self, target: impl TimerTarget + 'static) -> Self {
        self.target = Box::new(target);
        self
    }

    /// Callback for each elapsed step.
    #[must_use]
    pub fn on_interval<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut Scheduler, TimerId) + 'static,
    {
        self.on_interval = Some(Box::new(callback));
        self
    }

    /// Callback run once when the countdown is used up.
    #[must_use]
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&mut Scheduler, TimerId) + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub(crate) fn build(self, id: TimerId, mode: TimerMode) -> TimerResult<Timer> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(TimerError::InvalidStep(self.step));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(TimerError::InvalidDelay(self.delay));
        }

        Ok(Timer {
            id,
            mode,
            step: self.step,
            delay: self.delay,
            accumulator: 0.0,
            countdown: self.countdown,
            paused_at: None,
            finished: false,
            target: self.target,
            on_interval: self.on_interval,
            on_complete: self.on_complete,
        })
    }
}

impl core::fmt::Debug for TimerBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerBuilder")
            .field("step", &self.step)
            .field("delay", &self.delay)
            .field("countdown", &self.countdown)
            .finish_non_exhaustive()
    }
}

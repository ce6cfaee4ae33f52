//! The timer scheduler.

use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::TimerResult;
use crate::id::TimerId;
use crate::timer::{Countdown, Timer, TimerBuilder, TimerMode, whole_steps};

/// Authoritative time origin injected by a collaborator.
#[derive(Debug, Clone, Copy, Default)]
struct ExternalTimeBase {
    /// External time at the moment of sync.
    base: Duration,
    /// Scheduler elapsed time at the moment of sync.
    local_at_sync: Duration,
}

/// Registry of timers advanced once per external tick.
///
/// The scheduler is single-threaded: callbacks are plain boxed closures and the
/// type is neither `Send` nor `Sync`. Callbacks receive `&mut Scheduler` and may
/// register, cancel, suspend or resume while a tick is in progress.
///
/// ```text
/// host loop:
///   scheduler.tick(dt, frames)   // or advance(dt) / update()
///     ├── drop finished timers
///     ├── accumulate dt (or frames) per timer
///     └── fire on_interval per whole step, on_complete when countdown hits 0
/// focus lost:   scheduler.suspend()   -> ticks ignored, timers snapshot time
/// focus gained: scheduler.resume()    -> countdowns charged for lost time
/// ```
pub struct Scheduler {
    timers: Vec<Timer>,
    clock: Box<dyn Clock>,
    config: SchedulerConfig,
    /// Clock reading at construction.
    epoch: Duration,
    /// Elapsed time of the last `update`.
    last_update: Duration,
    external: ExternalTimeBase,
    suspended: bool,
    /// Set while callbacks may run; structural removal is deferred meanwhile.
    dispatching: bool,
    next_id: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    /// Create a scheduler on a custom clock.
    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self::with_config(SchedulerConfig::default(), clock)
    }

    /// Create a scheduler with explicit configuration.
    #[must_use]
    pub fn with_config(config: SchedulerConfig, clock: impl Clock + 'static) -> Self {
        let epoch = clock.now();
        Self {
            timers: Vec::new(),
            clock: Box::new(clock),
            config,
            epoch,
            last_update: Duration::ZERO,
            external: ExternalTimeBase::default(),
            suspended: false,
            dispatching: false,
            next_id: 1,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a timer advanced by elapsed seconds.
    pub fn register_interval(&mut self, builder: TimerBuilder) -> TimerResult<TimerId> {
        self.register(builder, TimerMode::RealTime)
    }

    /// Register a timer advanced by elapsed frame units.
    pub fn register_frame_interval(&mut self, builder: TimerBuilder) -> TimerResult<TimerId> {
        self.register(builder, TimerMode::FrameBased)
    }

    fn register(&mut self, builder: TimerBuilder, mode: TimerMode) -> TimerResult<TimerId> {
        let id = TimerId::new(self.next_id);
        let timer = builder.build(id, mode)?;
        self.next_id += 1;

        trace!(
            %id,
            ?mode,
            step = timer.step,
            delay = timer.delay,
            countdown = ?timer.countdown,
            "registered timer"
        );
        self.timers.push(timer);
        Ok(id)
    }

    /// Cancel a timer. Idempotent; unknown ids are ignored.
    ///
    /// No callback runs. The record is dropped on the next tick.
    pub fn cancel(&mut self, id: TimerId) {
        match self.find_mut(id) {
            Some(timer) if !timer.finished => {
                timer.finished = true;
                debug!(%id, "cancelled timer");
            }
            Some(_) => {}
            None => trace!(%id, "cancel: unknown timer"),
        }
    }

    /// Finish every timer without running callbacks.
    ///
    /// Called from a callback, the records stay until the next tick.
    pub fn clear(&mut self) {
        for timer in &mut self.timers {
            timer.finished = true;
        }
        // While dispatching, the next scan owns removal.
        if !self.dispatching {
            self.timers.clear();
        }
        debug!("cleared all timers");
    }

    // ========================================================================
    // Ticking
    // ========================================================================

    /// Advance every timer by one external tick.
    ///
    /// Real-time timers consume `elapsed_seconds`, frame-based timers consume
    /// `elapsed_frames`. Ignored while suspended or when called from inside a
    /// timer callback.
    ///
    /// Firing is quantized to ticks: all steps completed by this tick fire
    /// back to back, and the leftover carries into the next tick. An
    /// accumulated total that falls short of a step boundary only by float
    /// rounding (within `step * 1e-9`) counts as reaching it.
    pub fn tick(&mut self, elapsed_seconds: f64, elapsed_frames: u32) {
        if self.suspended {
            trace!("tick ignored: suspended");
            return;
        }
        if self.dispatching {
            debug!("tick ignored: re-entrant call from a timer callback");
            return;
        }
        self.dispatching = true;

        // Timers registered by callbacks wait for the next tick.
        let mut end = self.timers.len();
        let mut i = 0;

        while i < end {
            if self.suspended {
                break;
            }

            if self.timers[i].finished {
                self.timers.remove(i);
                end -= 1;
                continue;
            }

            let timer = &mut self.timers[i];
            let fires = match timer.mode {
                TimerMode::RealTime => timer.accumulate(elapsed_seconds),
                TimerMode::FrameBased => timer.accumulate(f64::from(elapsed_frames)),
            };

            if fires > 0 {
                if timer.is_target_alive() {
                    self.fire(i, fires);
                } else {
                    timer.finished = true;
                    debug!(id = %timer.id, "target gone, finishing timer");
                }
            }

            i += 1;
        }

        self.dispatching = false;
    }

    /// Tick with the configured frame units per tick.
    pub fn advance(&mut self, elapsed_seconds: f64) {
        self.tick(elapsed_seconds, self.config.frames_per_tick);
    }

    /// Tick by the clock time since the previous `update`.
    pub fn update(&mut self) {
        let now = self.elapsed();
        let delta = now.saturating_sub(self.last_update);
        self.last_update = now;
        self.advance(delta.as_secs_f64());
    }

    /// Run `fires` firings of the timer at index `i`.
    fn fire(&mut self, i: usize, fires: u64) {
        let id = self.timers[i].id;
        trace!(%id, fires, "firing timer");

        // Taken out so the callback can borrow the scheduler.
        let mut on_interval = self.timers[i].on_interval.take();

        for _ in 0..fires {
            if self.timers[i].finished || self.suspended {
                break;
            }

            self.timers[i].countdown.decrement();

            if let Some(callback) = on_interval.as_mut() {
                callback(self, id);
            }

            let timer = &self.timers[i];
            if !timer.finished && timer.countdown.is_exhausted() {
                self.complete(i);
                break;
            }
        }

        self.timers[i].on_interval = on_interval;
    }

    /// Mark the timer at index `i` finished and run its completion callback.
    fn complete(&mut self, i: usize) {
        let timer = &mut self.timers[i];
        timer.finished = true;
        let id = timer.id;
        trace!(%id, "timer completed");

        if let Some(on_complete) = timer.on_complete.take() {
            on_complete(self, id);
        }
    }

    // ========================================================================
    // Suspend / resume
    // ========================================================================

    /// Stop ticking and snapshot the current time on every live timer.
    pub fn suspend(&mut self) {
        if self.suspended {
            trace!("suspend ignored: already suspended");
            return;
        }
        self.suspended = true;

        let now = self.elapsed();
        let mut count = 0usize;
        for timer in self.timers.iter_mut().filter(|t| !t.finished) {
            timer.paused_at = Some(now);
            count += 1;
        }
        debug!(elapsed = ?now, timers = count, "scheduler suspended");
    }

    /// Resume ticking, charging each timer's countdown for the intervals lost
    /// while suspended. Skipped intervals do not run `on_interval`; a countdown
    /// used up this way completes the timer.
    pub fn resume(&mut self) {
        if !self.suspended {
            trace!("resume ignored: not suspended");
            return;
        }
        self.suspended = false;

        let now = self.elapsed();
        self.last_update = now;

        let resume_interval = self.config.resume_interval.as_secs_f64();
        let mut completed = 0usize;
        let outer = core::mem::replace(&mut self.dispatching, true);

        // Completion callbacks may register timers; those have no snapshot.
        let end = self.timers.len();
        for i in 0..end {
            let timer = &mut self.timers[i];
            let Some(start) = timer.paused_at.take() else {
                continue;
            };
            if timer.finished {
                continue;
            }

            let away = now.saturating_sub(start).as_secs_f64();
            let unit = match timer.mode {
                TimerMode::RealTime => timer.step,
                TimerMode::FrameBased => resume_interval,
            };
            let lost = if unit > 0.0 {
                whole_steps(away, unit).0
            } else {
                0
            };

            if !timer.countdown.reconcile(lost) {
                continue;
            }

            if timer.is_target_alive() {
                self.complete(i);
            } else {
                timer.finished = true;
            }
            completed += 1;
        }
        self.dispatching = outer;

        debug!(elapsed = ?now, completed, "scheduler resumed");
    }

    /// Host focus signal: gaining focus resumes, losing it suspends.
    pub fn on_focus_changed(&mut self, focused: bool) {
        if focused {
            self.resume();
        } else {
            self.suspend();
        }
    }

    /// Whether ticks are currently ignored.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Time since the scheduler was created, per its clock.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.epoch)
    }

    /// Anchor an external (e.g. server) clock at the current elapsed time.
    /// A zero base is ignored.
    pub fn set_external_time(&mut self, base: Duration) {
        if base.is_zero() {
            trace!("external time base of zero ignored");
            return;
        }
        self.external = ExternalTimeBase {
            base,
            local_at_sync: self.elapsed(),
        };
        debug!(?base, "external time base set");
    }

    /// The external clock extrapolated from the last sync.
    #[must_use]
    pub fn external_time(&self) -> Duration {
        let since_sync = self.elapsed().saturating_sub(self.external.local_at_sync);
        self.external.base.saturating_add(since_sync)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of timers that have not finished.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.iter().filter(|t| !t.finished).count()
    }

    /// Whether no unfinished timers remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` names a timer that has not finished.
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.find(id).is_some_and(|t| !t.finished)
    }

    /// Remaining countdown of an unfinished timer.
    #[must_use]
    pub fn countdown(&self, id: TimerId) -> Option<Countdown> {
        self.find(id).filter(|t| !t.finished).map(|t| t.countdown)
    }

    /// Clock domain of an unfinished timer.
    #[must_use]
    pub fn mode(&self, id: TimerId) -> Option<TimerMode> {
        self.find(id).filter(|t| !t.finished).map(|t| t.mode)
    }

    fn find(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    fn find_mut(&mut self, id: TimerId) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| t.id == id)
    }
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("timers", &self.timers.len())
            .field("config", &self.config)
            .field("suspended", &self.suspended)
            .field("dispatching", &self.dispatching)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

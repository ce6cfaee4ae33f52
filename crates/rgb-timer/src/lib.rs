//! Tick-driven timer scheduler.
//!
//! # Tick Execution Model
//!
//! ```text
//! Tick N (elapsed_seconds, elapsed_frames):
//! ┌─────────────────────────────────────────────────────────────┐
//! │  For each timer registered before the tick, in order:       │
//! │    1. Finished?        → drop it                            │
//! │    2. Accumulate Δ     → seconds (RealTime) / frames (Frame)│
//! │    3. Whole steps = 0? → next timer                         │
//! │    4. Target dead?     → finish silently                    │
//! │    5. Per step: countdown -= 1, on_interval                 │
//! │       countdown hit 0 → on_complete, stop                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! While suspended (host lost focus) ticks are ignored. On resume every
//! timer's countdown is charged for the intervals that passed, without
//! replaying `on_interval` for them.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use rgb_timer::{ManualClock, Scheduler, TimerBuilder};
//!
//! let clock = ManualClock::new();
//! let mut scheduler = Scheduler::with_clock(clock.clone());
//!
//! let fired = Rc::new(Cell::new(0));
//! let done = Rc::new(Cell::new(false));
//! let (f, d) = (fired.clone(), done.clone());
//!
//! scheduler
//!     .register_interval(
//!         TimerBuilder::new(1.0)
//!             .countdown(3)
//!             .on_interval(move |_, _| f.set(f.get() + 1))
//!             .on_complete(move |_, _| d.set(true)),
//!     )
//!     .unwrap();
//!
//! for _ in 0..3 {
//!     scheduler.tick(1.0, 1);
//! }
//! assert_eq!(fired.get(), 3);
//! assert!(done.get());
//! ```
//!
//! # Threading
//!
//! A [`Scheduler`] is driven by one logical tick at a time and is not safe to
//! share between threads; it is `!Send` and `!Sync`.

mod clock;
mod config;
mod error;
mod id;
mod scheduler;
mod target;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use error::{TimerError, TimerResult};
pub use id::TimerId;
pub use scheduler::Scheduler;
pub use target::{AliveFn, Detached, TimerTarget};
pub use timer::{CompleteFn, Countdown, IntervalFn, TimerBuilder, TimerMode};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AliveFn, Clock, Countdown, Detached, ManualClock, Scheduler, SchedulerConfig, SystemClock,
        TimerBuilder, TimerError, TimerId, TimerMode, TimerTarget,
    };
}

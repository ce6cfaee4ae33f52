//! Scheduler configuration.

use std::time::Duration;

/// Tunables for a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Frame units fed to frame-based timers by `advance` and `update`.
    pub frames_per_tick: u32,
    /// Length of one lost interval for frame-based timers when reconciling a
    /// suspension. Real-time timers use their own step instead.
    pub resume_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frames_per_tick: 1,
            resume_interval: Duration::from_secs(1),
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame units per `advance`.
    #[must_use]
    pub const fn with_frames_per_tick(mut self, frames: u32) -> Self {
        self.frames_per_tick = frames;
        self
    }

    /// Set the frame-timer loss unit used on resume.
    #[must_use]
    pub const fn with_resume_interval(mut self, interval: Duration) -> Self {
        self.resume_interval = interval;
        self
    }
}

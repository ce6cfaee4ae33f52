//! Callback target liveness.
//!
//! A timer may be tied to an owner whose lifetime the scheduler does not
//! control. Before firing, the scheduler asks the target whether it is still
//! alive; a dead target finishes the timer without invoking any callback.

/// Liveness capability for a timer's owner.
pub trait TimerTarget {
    /// Whether callbacks for this target may still run.
    fn is_alive(&self) -> bool;
}

/// Target for timers with no owner. Always alive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detached;

impl TimerTarget for Detached {
    fn is_alive(&self) -> bool {
        true
    }
}

impl<T: ?Sized> TimerTarget for std::rc::Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

impl<T: ?Sized> TimerTarget for std::sync::Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// Target backed by an arbitrary predicate.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use rgb_timer::{AliveFn, TimerTarget};
///
/// let open = Rc::new(Cell::new(true));
/// let flag = open.clone();
/// let target = AliveFn(move || flag.get());
/// assert!(target.is_alive());
/// open.set(false);
/// assert!(!target.is_alive());
/// ```
pub struct AliveFn<F>(pub F);

impl<F: Fn() -> bool> TimerTarget for AliveFn<F> {
    fn is_alive(&self) -> bool {
        (self.0)()
    }
}

impl<F> core::fmt::Debug for AliveFn<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AliveFn").finish_non_exhaustive()
    }
}

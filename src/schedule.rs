//! Scheduling capability for timed modifiers.
//!
//! The engine never owns a clock. It asks the host's [`Scheduler`] for
//! cancellable timers and the host delivers expiry back through
//! [`StatSystem::timer_fired`](crate::StatSystem::timer_fired). The model is
//! single-threaded and cooperative, so the scheduler is shared as
//! `Rc<RefCell<_>>` — the engine schedules and cancels, the host drives.
//!
//! [`ManualScheduler`] is the bundled implementation: a virtual clock for
//! hosts with their own frame loop and for tests.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Handle to a scheduled timer, allocated by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub(crate) u64);

impl std::fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Host-provided timer capability.
///
/// Cancellation must be idempotent: cancelling a handle that already fired,
/// was already cancelled, or was never scheduled is a safe no-op, and no
/// callback may be delivered for a cancelled handle.
pub trait Scheduler {
    /// Arm a one-shot timer firing once after `delay`.
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle;

    /// Arm a repeating timer firing every `every` until cancelled.
    fn schedule_repeating(&mut self, every: Duration) -> TimerHandle;

    /// Disarm a timer.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Shared scheduler handle as consumed by [`StatSystem`](crate::StatSystem).
pub type SharedScheduler = Rc<RefCell<dyn Scheduler>>;

struct PendingTimer {
    handle: TimerHandle,
    due: Duration,
    repeat: Option<Duration>,
}

/// Virtual-clock scheduler driven by explicit [`advance`](Self::advance)
/// calls.
///
/// Timers fire in due order (ties broken by scheduling order) and repeating
/// timers re-arm as the clock sweeps past each interval boundary, so a
/// single large `advance` delivers every intermediate tick.
///
/// # Examples
///
/// ```rust
/// use statflow::{ManualScheduler, Scheduler};
/// use std::time::Duration;
///
/// let mut clock = ManualScheduler::new();
/// let slow = clock.schedule_once(Duration::from_secs(3));
/// let fast = clock.schedule_repeating(Duration::from_secs(1));
///
/// assert_eq!(clock.advance(Duration::from_secs(2)), vec![fast, fast]);
/// assert_eq!(clock.advance(Duration::from_secs(1)), vec![slow, fast]);
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    now: Duration,
    next_handle: u64,
    pending: Vec<PendingTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Move the clock forward by `dt`, returning every handle that fired,
    /// in firing order.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerHandle> {
        let target = self.now + dt;
        let mut fired = Vec::new();
        loop {
            let next = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= target)
                .min_by_key(|(_, t)| (t.due, t.handle.0))
                .map(|(i, _)| i);
            let Some(i) = next else { break };
            let due = self.pending[i].due;
            let handle = self.pending[i].handle;
            self.now = due;
            match self.pending[i].repeat {
                Some(every) if !every.is_zero() => self.pending[i].due = due + every,
                _ => {
                    self.pending.remove(i);
                }
            }
            fired.push(handle);
        }
        self.now = target;
        fired
    }

    fn arm(&mut self, delay: Duration, repeat: Option<Duration>) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.pending.push(PendingTimer {
            handle,
            due: self.now + delay,
            repeat,
        });
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        self.arm(delay, None)
    }

    fn schedule_repeating(&mut self, every: Duration) -> TimerHandle {
        debug_assert!(!every.is_zero(), "repeating timer with zero interval");
        self.arm(every, Some(every))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|t| t.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once() {
        let mut clock = ManualScheduler::new();
        let t = clock.schedule_once(Duration::from_secs(2));
        assert_eq!(clock.advance(Duration::from_secs(1)), Vec::new());
        assert_eq!(clock.advance(Duration::from_secs(1)), vec![t]);
        assert_eq!(clock.advance(Duration::from_secs(10)), Vec::new());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn repeating_fires_every_interval() {
        let mut clock = ManualScheduler::new();
        let t = clock.schedule_repeating(Duration::from_secs(2));
        assert_eq!(clock.advance(Duration::from_secs(6)), vec![t, t, t]);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut clock = ManualScheduler::new();
        let t = clock.schedule_once(Duration::from_secs(1));
        clock.cancel(t);
        clock.cancel(t);
        assert_eq!(clock.advance(Duration::from_secs(5)), Vec::new());
        // Cancelling a never-scheduled handle is also a no-op.
        clock.cancel(TimerHandle(999));
    }

    #[test]
    fn fire_order_is_due_then_scheduling_order() {
        let mut clock = ManualScheduler::new();
        let late = clock.schedule_once(Duration::from_secs(3));
        let early = clock.schedule_once(Duration::from_secs(1));
        let tied = clock.schedule_once(Duration::from_secs(3));
        assert_eq!(clock.advance(Duration::from_secs(3)), vec![early, late, tied]);
    }

    #[test]
    fn now_tracks_advances() {
        let mut clock = ManualScheduler::new();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), Duration::from_millis(1500));
    }
}

//! Timer seam used by the timeout hook.
//!
//! The runtime does not own a clock. [`Timers`] is the boundary to whatever
//! event loop the host runs; [`ManualTimers`] is a deterministic, single
//! threaded implementation driven by a virtual clock.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Handle of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw sequence number.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Schedules one-shot callbacks.
pub trait Timers {
    /// Runs `callback` once, `delay` from now.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancels a pending timer. Returns false if it already fired or was
    /// cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

#[derive(Default)]
struct Schedule {
    now: Duration,
    next_id: u64,
    /// Keyed by `(deadline, id)` so ties fire in scheduling order.
    pending: BTreeMap<(Duration, TimerId), Box<dyn FnOnce()>>,
}

/// Virtual-clock timers. Nothing fires until [`ManualTimers::advance`].
#[derive(Default)]
pub struct ManualTimers {
    schedule: RefCell<Schedule>,
}

impl ManualTimers {
    /// Creates timers with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed so far.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.schedule.borrow().now
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.schedule.borrow().pending.len()
    }

    /// Moves the clock forward by `by`, firing every timer that comes due in
    /// deadline order. Returns how many fired.
    ///
    /// Callbacks run without the schedule borrowed, so they may schedule or
    /// cancel timers; newly scheduled timers that fall inside the window fire
    /// in the same call.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let mut fired = 0;
        loop {
            let due = {
                let mut schedule = self.schedule.borrow_mut();
                match schedule.pending.keys().next().copied() {
                    Some(key @ (deadline, id)) if deadline <= target => {
                        schedule.now = deadline;
                        schedule.pending.remove(&key).map(|callback| (id, callback))
                    }
                    _ => None,
                }
            };
            let Some((id, callback)) = due else {
                break;
            };
            tracing::trace!(%id, "timer fired");
            callback();
            fired += 1;
        }
        self.schedule.borrow_mut().now = target;
        fired
    }
}

impl Timers for ManualTimers {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut schedule = self.schedule.borrow_mut();
        let id = TimerId(schedule.next_id);
        schedule.next_id += 1;
        let deadline = schedule.now.saturating_add(delay);
        schedule.pending.insert((deadline, id), callback);
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut schedule = self.schedule.borrow_mut();
        let key = schedule.pending.keys().find(|(_, pending)| *pending == id).copied();
        key.is_some_and(|key| schedule.pending.remove(&key).is_some())
    }
}

impl fmt::Debug for ManualTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schedule = self.schedule.borrow();
        f.debug_struct("ManualTimers")
            .field("now", &schedule.now)
            .field("pending", &schedule.pending.len())
            .finish()
    }
}

//! Virtual timer facility
//!
//! All suspension points of the sequencer are timers on this clock. Time
//! only moves when the host advances it, so tests simulate elapsed time
//! instead of sleeping, and a real-time host sleeps until
//! [`Scheduler::next_deadline`].

use crate::ads::AdEvent;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Smallest delay used to defer work to the next tick
pub const TICK: Duration = Duration::from_millis(1);

/// Handle to an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What happens when a timer fires
#[derive(Debug, Clone, PartialEq)]
pub enum TimerAction {
    /// Process an event
    Emit(AdEvent),

    /// Content-play guard fires its pause
    CancelContentPlay,

    /// Deferred release of a pending content-play guard
    ReleaseGuard,

    /// Move straight to `content-resuming` and signal `ended`
    ForceContentResuming,

    /// Check whether the restored content can be resumed
    TryToResume,

    /// Compare the surface source against the tracked content source
    CheckSource,
}

/// Single-threaded timer queue on a virtual clock
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), TimerAction>,
    deadlines: HashMap<TimerId, Duration>,
}

impl Scheduler {
    /// Create an empty scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arm a timer
    ///
    /// # Arguments
    ///
    /// * `delay` - Time from now until the timer fires
    /// * `action` - Work to perform when it fires
    pub fn set(&mut self, delay: Duration, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let deadline = self.now.saturating_add(delay);
        self.queue.insert((deadline, id), action);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Disarm a timer, returning whether it was still pending
    pub fn clear(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.queue.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// Whether a timer is still pending
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Number of pending timers
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Absolute time of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until`
    ///
    /// The clock moves to the popped timer's deadline. Timers sharing a
    /// deadline come out in the order they were armed.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, TimerAction)> {
        let (&(deadline, id), _) = self.queue.iter().next()?;
        if deadline > until {
            return None;
        }

        let action = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);
        Some((id, action))
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }
}

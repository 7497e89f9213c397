use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use rustc_hash::FxHashMap;

use crate::transfer::retry::{RetryScheduler, SequenceKind, TimerId};

#[derive(Debug, Default)]
struct ManualSchedulerState {
    pending: FxHashMap<SequenceKind, (TimerId, Duration)>,
    cancelled: Vec<TimerId>,
}

/// A [RetryScheduler] that never fires on its own. Tests look up the pending timer and pass it to
///  the code under test to simulate a timeout.
#[derive(Debug, Clone, Default)]
pub struct ManualRetryScheduler {
    state: Arc<Mutex<ManualSchedulerState>>,
}
impl ManualRetryScheduler {
    pub fn new() -> ManualRetryScheduler {
        Default::default()
    }

    fn state(&self) -> MutexGuard<ManualSchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending(&self, kind: SequenceKind) -> Option<TimerId> {
        self.state().pending.get(&kind).map(|(timer, _)| *timer)
    }

    /// the delay the pending timer of a given kind was scheduled with
    pub fn last_delay(&self, kind: SequenceKind) -> Option<Duration> {
        self.state().pending.get(&kind).map(|(_, delay)| *delay)
    }

    /// timers that were cancelled while pending, in the order of cancellation
    pub fn cancelled(&self) -> Vec<TimerId> {
        self.state().cancelled.clone()
    }
}

impl RetryScheduler for ManualRetryScheduler {
    fn schedule(&self, timer: TimerId, delay: Duration) {
        self.state().pending.insert(timer.kind, (timer, delay));
    }

    fn cancel(&self, timer: TimerId) {
        let mut state = self.state();
        if state.pending.get(&timer.kind).map(|(pending, _)| *pending) == Some(timer) {
            state.pending.remove(&timer.kind);
            state.cancelled.push(timer);
        }
    }
}

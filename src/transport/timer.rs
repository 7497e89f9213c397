use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, trace};

use crate::transfer::retry::{RetryScheduler, SequenceKind, TimerId};

/// [RetryScheduler] based on tokio tasks: every armed timer is a task sleeping for the retry delay,
///  which then delivers the [TimerId] on a channel. Re-arming or cancelling aborts the task.
pub struct TokioRetryScheduler {
    fired: mpsc::Sender<TimerId>,
    armed: Mutex<FxHashMap<SequenceKind, (TimerId, JoinHandle<()>)>>,
}
impl TokioRetryScheduler {
    /// Returns the scheduler and the receiving end for fired timers, which is typically passed to
    ///  [crate::transport::driver::run_session_loop].
    pub fn new() -> (TokioRetryScheduler, mpsc::Receiver<TimerId>) {
        let (fired, fired_recv) = mpsc::channel(16);

        let scheduler = TokioRetryScheduler {
            fired,
            armed: Default::default(),
        };
        (scheduler, fired_recv)
    }

    fn armed(&self) -> MutexGuard<'_, FxHashMap<SequenceKind, (TimerId, JoinHandle<()>)>> {
        // the map stays consistent even if a panic poisoned the lock
        self.armed.lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RetryScheduler for TokioRetryScheduler {
    fn schedule(&self, timer: TimerId, delay: Duration) {
        let fired = self.fired.clone();
        let deadline = time::Instant::now() + delay;
        let handle = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            if fired.send(timer).await.is_err() {
                debug!("{:?} fired after the receiver was closed", timer);
            }
        });

        if let Some((replaced, replaced_handle)) = self.armed().insert(timer.kind, (timer, handle)) {
            trace!("{:?} replaces {:?}", timer, replaced);
            replaced_handle.abort();
        }
    }

    fn cancel(&self, timer: TimerId) {
        let mut armed = self.armed();
        if armed.get(&timer.kind).map(|(t, _)| *t) != Some(timer) {
            trace!("cancelling {:?} which is not armed - ignoring", timer);
            return;
        }
        if let Some((_, handle)) = armed.remove(&timer.kind) {
            handle.abort();
        }
    }
}

impl Drop for TokioRetryScheduler {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.armed().drain() {
            handle.abort();
        }
    }
}


#[cfg(test)]
mod tests {
    use tokio::time::{timeout, Instant};
    use super::*;

    const DELAY: Duration = Duration::from_millis(2000);

    fn timer(kind: SequenceKind, generation: u64) -> TimerId {
        TimerId { kind, generation }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (scheduler, mut fired) = TokioRetryScheduler::new();
        let start = Instant::now();

        scheduler.schedule(timer(SequenceKind::Read, 1), DELAY);

        assert_eq!(fired.recv().await, Some(timer(SequenceKind::Read, 1)));
        assert_eq!(start.elapsed(), DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_does_not_fire() {
        let (scheduler, mut fired) = TokioRetryScheduler::new();

        scheduler.schedule(timer(SequenceKind::Write, 1), DELAY);
        time::advance(DELAY / 2).await;
        scheduler.cancel(timer(SequenceKind::Write, 1));

        assert!(timeout(DELAY * 3, fired.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let (scheduler, mut fired) = TokioRetryScheduler::new();
        let start = Instant::now();

        scheduler.schedule(timer(SequenceKind::Read, 1), DELAY);
        time::advance(DELAY / 2).await;
        scheduler.schedule(timer(SequenceKind::Read, 2), DELAY);

        assert_eq!(fired.recv().await, Some(timer(SequenceKind::Read, 2)));
        assert_eq!(start.elapsed(), DELAY + DELAY / 2);
        assert!(timeout(DELAY * 3, fired.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_of_replaced_timer_keeps_current_one() {
        let (scheduler, mut fired) = TokioRetryScheduler::new();

        scheduler.schedule(timer(SequenceKind::Read, 1), DELAY);
        scheduler.schedule(timer(SequenceKind::Read, 2), DELAY);
        scheduler.cancel(timer(SequenceKind::Read, 1));

        assert_eq!(fired.recv().await, Some(timer(SequenceKind::Read, 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kinds_are_independent() {
        let (scheduler, mut fired) = TokioRetryScheduler::new();

        scheduler.schedule(timer(SequenceKind::Read, 1), DELAY);
        scheduler.schedule(timer(SequenceKind::Write, 1), DELAY * 2);
        scheduler.cancel(timer(SequenceKind::Read, 1));

        assert_eq!(fired.recv().await, Some(timer(SequenceKind::Write, 1)));
    }
}

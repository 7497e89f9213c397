use std::time::Duration;
#[cfg(test)] use mockall::automock;
use tracing::trace;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SequenceKind {
    Read,
    Write,
}

/// Identifies one arming of a sequence's retry timer. Each arming gets a new generation, so a
///  timer that fires after it was replaced or cancelled can be recognized as stale.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TimerId {
    pub kind: SequenceKind,
    pub generation: u64,
}

/// This is the 'delayed callback' capability the transfer state machines depend on. An
///  implementation calls back (typically through a channel) with the [TimerId] once the delay has
///  passed, unless the timer was cancelled before.
///
/// There is at most one armed timer per [SequenceKind]: scheduling a timer implicitly replaces a
///  previous one of the same kind.
#[cfg_attr(test, automock)]
pub trait RetryScheduler: Send + Sync {
    fn schedule(&self, timer: TimerId, delay: Duration);

    /// NB: cancelling a timer that already fired or was replaced must be a no-op
    fn cancel(&self, timer: TimerId);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RetryDecision {
    Resend,
    GiveUp,
}

/// Retry bookkeeping for one sequence: the currently armed timer and the number of consecutive
///  timeouts for the index the sequence is waiting on.
#[derive(Debug)]
pub struct RetryTimer {
    kind: SequenceKind,
    generation: u64,
    armed: Option<TimerId>,
    retry_count: u32,
}
impl RetryTimer {
    pub fn new(kind: SequenceKind) -> RetryTimer {
        RetryTimer {
            kind,
            generation: 0,
            armed: None,
            retry_count: 0,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// starts a new retry window, replacing the current one if there is one
    pub fn arm(&mut self, scheduler: &dyn RetryScheduler, delay: Duration) {
        self.generation += 1;
        let timer = TimerId {
            kind: self.kind,
            generation: self.generation,
        };
        trace!("arming {:?} for {:?}", timer, delay);
        scheduler.schedule(timer, delay);
        self.armed = Some(timer);
    }

    pub fn cancel(&mut self, scheduler: &dyn RetryScheduler) {
        if let Some(timer) = self.armed.take() {
            trace!("cancelling {:?}", timer);
            scheduler.cancel(timer);
        }
    }

    /// the peer responded as expected: the next index starts with a fresh retry budget
    pub fn reset_retries(&mut self) {
        self.retry_count = 0;
    }

    /// Returns `None` for a stale timer, i.e. one that was cancelled or replaced after it was
    ///  scheduled. Otherwise this counts the timeout and decides whether there is retry budget left.
    ///
    /// NB: the fired timer stays armed until it is replaced by [Self::arm] or released by
    ///  [Self::cancel]
    pub fn on_fired(&mut self, timer: TimerId, max_retries: u32) -> Option<RetryDecision> {
        if self.armed != Some(timer) {
            trace!("ignoring stale {:?}, armed is {:?}", timer, self.armed);
            return None;
        }

        self.retry_count += 1;
        if self.retry_count >= max_retries {
            Some(RetryDecision::GiveUp)
        }
        else {
            Some(RetryDecision::Resend)
        }
    }
}


#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use rstest::rstest;
    use super::*;

    const DELAY: Duration = Duration::from_millis(2000);

    fn timer(kind: SequenceKind, generation: u64) -> TimerId {
        TimerId { kind, generation }
    }

    #[test]
    fn test_arm_uses_fresh_generations() {
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule()
            .with(eq(timer(SequenceKind::Write, 1)), eq(DELAY))
            .times(1)
            .return_const(());
        scheduler.expect_schedule()
            .with(eq(timer(SequenceKind::Write, 2)), eq(DELAY))
            .times(1)
            .return_const(());

        let mut retry = RetryTimer::new(SequenceKind::Write);
        retry.arm(&scheduler, DELAY);
        retry.arm(&scheduler, DELAY);

        assert!(retry.is_armed());
        assert_eq!(retry.on_fired(timer(SequenceKind::Write, 1), 5), None);
        assert_eq!(retry.on_fired(timer(SequenceKind::Write, 2), 5), Some(RetryDecision::Resend));
        assert!(retry.is_armed());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule()
            .return_const(());
        scheduler.expect_cancel()
            .with(eq(timer(SequenceKind::Read, 1)))
            .times(1)
            .return_const(());

        let mut retry = RetryTimer::new(SequenceKind::Read);
        retry.arm(&scheduler, DELAY);
        retry.cancel(&scheduler);
        retry.cancel(&scheduler);

        assert_eq!(retry.on_fired(timer(SequenceKind::Read, 1), 5), None);
        assert_eq!(retry.retry_count(), 0);
    }

    #[test]
    fn test_fired_timer_of_other_kind_is_stale() {
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule()
            .return_const(());

        let mut retry = RetryTimer::new(SequenceKind::Read);
        retry.arm(&scheduler, DELAY);

        assert_eq!(retry.on_fired(timer(SequenceKind::Write, 1), 5), None);
        assert!(retry.is_armed());
    }

    #[rstest]
    #[case::single_attempt(1)]
    #[case::default(5)]
    #[case::many(12)]
    fn test_gives_up_after_exactly_max_retries(#[case] max_retries: u32) {
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule()
            .return_const(());

        let mut retry = RetryTimer::new(SequenceKind::Read);
        for n in 1..max_retries {
            retry.arm(&scheduler, DELAY);
            let fired = timer(SequenceKind::Read, n as u64);
            assert_eq!(retry.on_fired(fired, max_retries), Some(RetryDecision::Resend));
            assert_eq!(retry.retry_count(), n);
        }

        retry.arm(&scheduler, DELAY);
        let fired = timer(SequenceKind::Read, max_retries as u64);
        assert_eq!(retry.on_fired(fired, max_retries), Some(RetryDecision::GiveUp));
    }

    #[test]
    fn test_reset_retries() {
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule()
            .return_const(());

        let mut retry = RetryTimer::new(SequenceKind::Write);
        retry.arm(&scheduler, DELAY);
        retry.on_fired(timer(SequenceKind::Write, 1), 5);
        assert_eq!(retry.retry_count(), 1);

        retry.reset_retries();
        assert_eq!(retry.retry_count(), 0);
    }
}

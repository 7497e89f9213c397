use std::sync::Arc;

use crate::test_util::scheduler::ManualRetryScheduler;
use crate::test_util::sender::TrackingDatagramSender;
use crate::transfer::sequence_context::SequenceContext;
use crate::transfer::transfer_config::TransferConfig;
use crate::transfer::transfer_events::TransferEventNotifier;

/// Bundles recording capabilities for driving a single read or write sequence directly. The
///  config can be modified between calls to [TestHarness::ctx].
pub struct TestHarness {
    pub config: TransferConfig,
    pub sender: TrackingDatagramSender,
    pub scheduler: ManualRetryScheduler,
    pub events: TransferEventNotifier,
}
impl TestHarness {
    pub fn new() -> TestHarness {
        TestHarness {
            config: TransferConfig::default(),
            sender: TrackingDatagramSender::new(),
            scheduler: ManualRetryScheduler::new(),
            events: TransferEventNotifier::new(),
        }
    }

    pub fn ctx(&self) -> SequenceContext {
        SequenceContext {
            config: Arc::new(self.config.clone()),
            sender: Arc::new(self.sender.clone()),
            scheduler: Arc::new(self.scheduler.clone()),
            events: self.events.clone(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        TestHarness::new()
    }
}

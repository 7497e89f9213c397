use std::sync::Arc;

use tracing::trace;

use crate::protocol::packet::Packet;
use crate::transfer::retry::RetryScheduler;
use crate::transfer::transfer_config::TransferConfig;
use crate::transfer::transfer_events::TransferEventNotifier;
use crate::transport::DatagramSender;

/// The collaborators both sequences share. They are owned by the session and lent to whichever
///  sequence an event is routed to.
pub struct SequenceContext {
    pub config: Arc<TransferConfig>,
    pub sender: Arc<dyn DatagramSender>,
    pub scheduler: Arc<dyn RetryScheduler>,
    pub events: TransferEventNotifier,
}
impl SequenceContext {
    pub async fn send_packet(&self, packet: &Packet) {
        let frame = packet.ser();
        trace!("sending frame {:?}", frame);
        self.sender.send_frame(&frame).await;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packet::{FrameIds, FRAME_SIZE};
    use crate::protocol::sector::Sector;
    use crate::test_util::scheduler::ManualRetryScheduler;
    use crate::transport::MockDatagramSender;

    #[tokio::test]
    async fn test_send_packet_sends_one_serialized_frame() {
        let packet = Packet::request(FrameIds::default(), Sector::MotorCutout, 3, 7);
        let expected = packet.ser();

        let mut sender = MockDatagramSender::new();
        sender.expect_send_frame()
            .withf(move |frame| frame.len() == FRAME_SIZE && frame == expected.as_slice())
            .times(1)
            .return_const(());

        let ctx = SequenceContext {
            config: Arc::new(TransferConfig::default()),
            sender: Arc::new(sender),
            scheduler: Arc::new(ManualRetryScheduler::new()),
            events: TransferEventNotifier::new(),
        };
        ctx.send_packet(&packet).await;
    }
}

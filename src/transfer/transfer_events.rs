use tokio::sync::broadcast;
use tracing::trace;

use crate::protocol::sector::SectorDataSet;
use crate::transfer::errors::ProtocolError;

#[derive(Clone, Debug, PartialEq)]
pub enum TransferEvent {
    RecordReceived(RecordReceivedData),
    ReadComplete,
    WriteComplete,
    Error(ProtocolError),
    /// human readable progress information, intended for display rather than for processing
    Status(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordReceivedData {
    pub index: u8,
    pub record: SectorDataSet,
}


#[derive(Clone)]
pub struct TransferEventNotifier {
    sender: broadcast::Sender<TransferEvent>,
}
impl TransferEventNotifier {
    pub fn new() -> TransferEventNotifier {
        let (sender, _) = broadcast::channel(1024);

        TransferEventNotifier {
            sender
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.sender.subscribe()
    }

    pub fn send_event(&self, event: TransferEvent) {
        trace!("event: {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send_event(TransferEvent::Status(message.into()));
    }
}

impl Default for TransferEventNotifier {
    fn default() -> Self {
        TransferEventNotifier::new()
    }
}

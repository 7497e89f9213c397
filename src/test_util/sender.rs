use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::protocol::packet::Packet;
use crate::transport::DatagramSender;

/// Records every frame instead of sending it
#[derive(Debug, Clone, Default)]
pub struct TrackingDatagramSender {
    tracker: Arc<RwLock<Vec<Vec<u8>>>>,
}
impl TrackingDatagramSender {
    pub fn new() -> TrackingDatagramSender {
        Default::default()
    }

    /// returns the frames sent since the previous call
    pub async fn sent_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.tracker.write().await)
    }

    /// returns the packets sent since the previous call, panicking if any of them is not a valid
    ///  frame
    pub async fn sent_packets(&self) -> Vec<Packet> {
        self.sent_frames().await
            .iter()
            .map(|frame| Packet::try_decode(frame).unwrap_or_else(|e| panic!("invalid frame was sent: {}", e)))
            .collect()
    }
}

#[async_trait]
impl DatagramSender for TrackingDatagramSender {
    async fn send_frame(&self, frame: &[u8]) {
        self.tracker.write().await.push(frame.to_vec());
    }
}

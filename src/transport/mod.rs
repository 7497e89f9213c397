use async_trait::async_trait;
#[cfg(test)] use mockall::automock;

pub mod driver;
pub mod timer;
pub mod udp;

/// This is an abstraction for sending a frame to the peer device, introduced to decouple the
///  transfer state machines from the actual socket and to facilitate mocking the I/O part away for
///  testing.
///
/// Implementations must be safe for concurrent calls from both sequences, sending each frame as a
///  single datagram. Send failures are handled (i.e. logged) by the implementation: for the
///  protocol, a frame that could not be sent is no different from a frame that got lost.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatagramSender: Send + Sync + 'static {
    async fn send_frame(&self, frame: &[u8]);
}

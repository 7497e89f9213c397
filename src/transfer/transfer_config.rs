use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::protocol::packet::FrameIds;

#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// the device all frames are sent to
    pub peer_addr: SocketAddr,
    pub frame_ids: FrameIds,

    /// number of consecutive timeouts for the same index after which a sequence gives up
    pub max_retries: u32,
    /// time to wait for a matching response before re-sending
    pub retry_delay: Duration,

    /// A peer reporting a total count of 0 makes a read sequence skip to the next index. If this
    ///  is set, that many consecutive empty responses fail the read sequence; otherwise the read
    ///  sequence keeps skipping for as long as the peer keeps responding that way.
    pub empty_response_limit: Option<u32>,
}

impl TransferConfig {
    pub const DEFAULT_PEER_PORT: u16 = 5000;

    pub fn new(peer_addr: SocketAddr) -> TransferConfig {
        TransferConfig {
            peer_addr,
            frame_ids: FrameIds::default(),
            max_retries: 5,
            retry_delay: Duration::from_millis(2000),
            empty_response_limit: None,
        }
    }

    /// the device's factory address
    pub fn default_peer_addr() -> SocketAddr {
        SocketAddrV4::new(Ipv4Addr::new(192, 168, 10, 15), Self::DEFAULT_PEER_PORT).into()
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig::new(TransferConfig::default_peer_addr())
    }
}

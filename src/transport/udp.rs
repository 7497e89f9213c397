use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{error, trace};

use crate::transport::DatagramSender;

pub struct UdpDatagramSender {
    socket: Arc<UdpSocket>,
    peer_addr: SocketAddr,
}
impl UdpDatagramSender {
    pub fn new(socket: Arc<UdpSocket>, peer_addr: SocketAddr) -> UdpDatagramSender {
        UdpDatagramSender {
            socket,
            peer_addr,
        }
    }

    /// convenience for the common case of a dedicated socket for the session
    pub async fn bind(local_addr: SocketAddr, peer_addr: SocketAddr) -> anyhow::Result<(UdpDatagramSender, Arc<UdpSocket>)> {
        let socket = Arc::new(UdpSocket::bind(local_addr).await?);
        Ok((UdpDatagramSender::new(socket.clone(), peer_addr), socket))
    }
}

#[async_trait]
impl DatagramSender for UdpDatagramSender {
    async fn send_frame(&self, frame: &[u8]) {
        trace!("UDP socket: sending frame to {:?}", self.peer_addr);

        if let Err(e) = self.socket.send_to(frame, self.peer_addr).await {
            error!("error sending UDP frame to {:?}: {}", self.peer_addr, e);
        }
    }
}

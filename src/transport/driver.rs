use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::select;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{error, info, trace, warn};

use crate::protocol::packet::FRAME_SIZE;
use crate::transfer::retry::TimerId;
use crate::transfer::session::TransferSession;

/// big enough to recognize (and report) oversized frames rather than having them truncated to a
///  valid size by the socket
const RECEIVE_BUFFER_SIZE: usize = 1500;

/// Feeds received datagrams and fired retry timers into the session, one event at a time, until
///  `shutdown` fires (or its sender is dropped) or the timer channel is closed.
///
/// Datagrams from other addresses than the configured peer are skipped.
pub async fn run_session_loop(
    session: Arc<RwLock<TransferSession>>,
    socket: Arc<UdpSocket>,
    mut timer_events: mpsc::Receiver<TimerId>,
    mut shutdown: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let peer_addr = session.read().await.config().peer_addr;
    info!("starting transfer session on {:?} with peer {:?}", socket.local_addr()?, peer_addr);

    let mut receive_buffer = vec![0u8; RECEIVE_BUFFER_SIZE];
    loop {
        select! {
            recv_result = socket.recv_from(&mut receive_buffer) => {
                match recv_result {
                    Ok((len, sender)) => {
                        if sender != peer_addr {
                            warn!("received datagram from {:?}, peer is {:?} - skipping", sender, peer_addr);
                            continue;
                        }
                        if len != FRAME_SIZE {
                            trace!("received datagram of {} bytes", len);
                        }
                        // invalid frames are reported through the session's events
                        let _ = session.write().await
                            .on_datagram(&receive_buffer[..len])
                            .await;
                    }
                    Err(e) => {
                        error!("error receiving UDP datagram: {}", e);
                    }
                }
            }
            timer = timer_events.recv() => {
                match timer {
                    Some(timer) => {
                        session.write().await
                            .on_timer(timer)
                            .await;
                    }
                    None => {
                        info!("retry timer channel closed - shutting down transfer session");
                        return Ok(());
                    }
                }
            }
            _ = &mut shutdown => {
                info!("shutting down transfer session");
                return Ok(());
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio::time::timeout;
    use super::*;
    use crate::protocol::packet::{Func, Packet};
    use crate::protocol::sector::{Sector, SectorDataSet};
    use crate::test_util::peer::{read_response, test_record, write_ack};
    use crate::transfer::transfer_config::TransferConfig;
    use crate::transfer::transfer_events::{RecordReceivedData, TransferEvent};
    use crate::transport::timer::TokioRetryScheduler;
    use crate::transport::udp::UdpDatagramSender;

    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    struct Running {
        session: Arc<RwLock<TransferSession>>,
        events: broadcast::Receiver<TransferEvent>,
        shutdown: oneshot::Sender<()>,
        session_loop: tokio::task::JoinHandle<anyhow::Result<()>>,
    }

    async fn start_session(device: &UdpSocket, retry_delay: Duration) -> Running {
        let mut config = TransferConfig::new(device.local_addr().unwrap());
        config.retry_delay = retry_delay;

        let (sender, socket) = UdpDatagramSender::bind("127.0.0.1:0".parse().unwrap(), config.peer_addr).await.unwrap();
        let (scheduler, timer_events) = TokioRetryScheduler::new();
        let session = TransferSession::new(Arc::new(config), Arc::new(sender), Arc::new(scheduler));
        let events = session.subscribe();
        let session = Arc::new(RwLock::new(session));

        let (shutdown, shutdown_recv) = oneshot::channel();
        let session_loop = tokio::spawn(run_session_loop(session.clone(), socket, timer_events, shutdown_recv));

        Running { session, events, shutdown, session_loop }
    }

    async fn next_event(events: &mut broadcast::Receiver<TransferEvent>) -> TransferEvent {
        loop {
            match timeout(TEST_TIMEOUT, events.recv()).await.unwrap().unwrap() {
                TransferEvent::Status(_) => {}
                evt => return evt,
            }
        }
    }

    /// answers read requests for three data sets, dropping the first request for index 1, and
    ///  acknowledges writes until the last data set is acknowledged
    async fn simulate_device(device: UdpSocket) -> Vec<SectorDataSet> {
        let mut buf = [0u8; 64];
        let mut dropped_request = false;
        let mut written = Vec::new();

        loop {
            let (len, from) = device.recv_from(&mut buf).await.unwrap();
            let request = Packet::try_decode(&buf[..len]).unwrap();
            match request.func() {
                Some(Func::Read) => {
                    if request.index == 1 && !dropped_request {
                        dropped_request = true;
                        continue;
                    }
                    let response = read_response(Sector::Obstacle, 3, request.index, test_record(request.index));
                    device.send_to(&response, from).await.unwrap();
                }
                Some(Func::Write) => {
                    if written.len() == request.index as usize {
                        written.push(request.record);
                    }
                    device.send_to(&write_ack(request.total_count, request.index), from).await.unwrap();
                    if request.index + 1 == request.total_count {
                        return written;
                    }
                }
                None => {}
            }
        }
    }

    #[tokio::test]
    async fn test_read_then_write_over_loopback() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut running = start_session(&device, Duration::from_millis(200)).await;
        let device = tokio::spawn(simulate_device(device));

        running.session.write().await
            .start_reading(Sector::Obstacle.into()).await
            .unwrap();
        for index in 0..3 {
            assert_eq!(next_event(&mut running.events).await, TransferEvent::RecordReceived(RecordReceivedData {
                index,
                record: test_record(index),
            }));
        }
        assert_eq!(next_event(&mut running.events).await, TransferEvent::ReadComplete);
        assert_eq!(running.session.read().await.all_records(), &[test_record(0), test_record(1), test_record(2)]);

        let to_write = vec![test_record(10), test_record(11)];
        running.session.write().await
            .start_writing(Sector::MotorCutout.into(), to_write.clone()).await
            .unwrap();
        assert_eq!(next_event(&mut running.events).await, TransferEvent::WriteComplete);
        assert!(!running.session.read().await.is_writing());

        assert_eq!(timeout(TEST_TIMEOUT, device).await.unwrap().unwrap(), to_write);

        running.shutdown.send(()).unwrap();
        timeout(TEST_TIMEOUT, running.session_loop).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_datagrams_from_other_addresses_are_skipped() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let stranger = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let running = start_session(&device, Duration::from_secs(60)).await;

        running.session.write().await
            .start_reading(Sector::Obstacle.into()).await
            .unwrap();
        let mut buf = [0u8; 64];
        let (_, session_addr) = timeout(TEST_TIMEOUT, device.recv_from(&mut buf)).await.unwrap().unwrap();

        stranger.send_to(&read_response(Sector::Obstacle, 1, 0, test_record(0)), session_addr).await.unwrap();
        // a frame from the real peer afterwards proves the stranger's frame was processed first
        device.send_to(b"not a frame", session_addr).await.unwrap();

        let mut events = running.events;
        assert!(matches!(next_event(&mut events).await, TransferEvent::Error(_)));
        assert!(running.session.read().await.is_reading());
        assert!(running.session.read().await.all_records().is_empty());

        drop(running.shutdown);
        timeout(TEST_TIMEOUT, running.session_loop).await.unwrap().unwrap().unwrap();
    }
}

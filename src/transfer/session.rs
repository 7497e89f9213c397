use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::protocol::packet::{DecodeError, Func, Packet};
use crate::protocol::sector::SectorDataSet;
use crate::transfer::errors::SequenceError;
use crate::transfer::read_sequence::ReadSequence;
use crate::transfer::retry::{RetryScheduler, SequenceKind, TimerId};
use crate::transfer::sequence_context::SequenceContext;
use crate::transfer::transfer_config::TransferConfig;
use crate::transfer::transfer_events::{TransferEvent, TransferEventNotifier};
use crate::transfer::write_sequence::WriteSequence;
use crate::transport::DatagramSender;

/// Entry point for transfers with one peer device: it owns one read and one write sequence, which
///  may run at the same time, and routes incoming frames and fired timers to them.
///
/// Every method reacts to a single event and runs to completion. Callers serialize events, e.g.
///  by holding the session in a lock (see [crate::transport::driver::run_session_loop]).
pub struct TransferSession {
    ctx: SequenceContext,
    read: ReadSequence,
    write: WriteSequence,
}

impl TransferSession {
    pub fn new(config: Arc<TransferConfig>, sender: Arc<dyn DatagramSender>, scheduler: Arc<dyn RetryScheduler>) -> TransferSession {
        TransferSession {
            ctx: SequenceContext {
                config,
                sender,
                scheduler,
                events: TransferEventNotifier::new(),
            },
            read: ReadSequence::new(),
            write: WriteSequence::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.ctx.events.subscribe()
    }

    pub fn config(&self) -> &TransferConfig {
        &self.ctx.config
    }

    pub async fn start_reading(&mut self, sector: u8) -> Result<(), SequenceError> {
        self.read.start(sector, &self.ctx).await
    }

    pub async fn start_writing(&mut self, sector: u8, records: Vec<SectorDataSet>) -> Result<(), SequenceError> {
        self.write.start(sector, records, &self.ctx).await
    }

    pub fn stop_reading(&mut self) {
        self.read.stop(&self.ctx);
    }

    pub fn stop_writing(&mut self) {
        self.write.stop(&self.ctx);
    }

    pub fn is_reading(&self) -> bool {
        self.read.is_active()
    }

    pub fn is_writing(&self) -> bool {
        self.write.is_active()
    }

    /// `(current index, announced total)` of the current or most recent read sequence
    pub fn read_progress(&self) -> (u8, Option<u8>) {
        (self.read.current_index(), self.read.total_count())
    }

    /// `(current index, total)` of the current or most recent write sequence
    pub fn write_progress(&self) -> (u8, u8) {
        (self.write.current_index(), self.write.total_count())
    }

    /// all records of the current or most recent read sequence, by index
    pub fn all_records(&self) -> &[SectorDataSet] {
        self.read.records().all()
    }

    /// NB: This returns a default record for an index that is out of range, which is
    ///  indistinguishable from a received all-zero record - see [Self::get_record]
    pub fn record_at(&self, index: usize) -> SectorDataSet {
        self.get_record(index)
            .unwrap_or_default()
    }

    pub fn get_record(&self, index: usize) -> Option<SectorDataSet> {
        self.read.records().get(index)
    }

    /// Handles a received datagram. Malformed frames are reported as [TransferEvent::Error] and
    ///  dropped: they do not trigger a retry, only the retry timer does.
    pub async fn on_datagram(&mut self, frame: &[u8]) -> Result<(), DecodeError> {
        let packet = match Packet::try_decode(frame) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("received invalid frame - dropping: {}", e);
                self.ctx.events.send_event(TransferEvent::Error(e.into()));
                return Err(e);
            }
        };
        trace!("received {:?}", packet);

        match packet.func() {
            Some(Func::Read) => {
                self.read.on_response(&packet, &self.ctx).await;
            }
            Some(Func::Write) => {
                self.write.on_ack(&packet, &self.ctx).await;
            }
            None => {
                debug!("received frame with unknown function code {} - ignoring", packet.func);
            }
        }
        Ok(())
    }

    pub async fn on_timer(&mut self, timer: TimerId) {
        match timer.kind {
            SequenceKind::Read => self.read.on_timer(timer, &self.ctx).await,
            SequenceKind::Write => self.write.on_timer(timer, &self.ctx).await,
        }
    }
}

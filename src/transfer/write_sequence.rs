use tracing::{debug, info, warn};

use crate::protocol::packet::Packet;
use crate::protocol::sector::{Sector, SectorDataSet};
use crate::transfer::errors::{SequenceError, TransferFailure};
use crate::transfer::retry::{RetryDecision, RetryTimer, SequenceKind, TimerId};
use crate::transfer::sequence_context::SequenceContext;
use crate::transfer::transfer_events::TransferEvent;

/// Sends a caller supplied list of data sets to the peer, one at a time, each one waiting for the
///  peer's acknowledgement before the next one goes out.
#[derive(Debug)]
pub struct WriteSequence {
    active: bool,
    sector: Sector,
    records: Vec<SectorDataSet>,
    current_index: u8,
    retry: RetryTimer,
}

impl Default for WriteSequence {
    fn default() -> Self {
        WriteSequence::new()
    }
}

impl WriteSequence {
    /// the total count goes over the wire as a single byte
    pub const MAX_RECORDS: usize = u8::MAX as usize;

    pub fn new() -> WriteSequence {
        WriteSequence {
            active: false,
            sector: Sector::Obstacle,
            records: Vec::new(),
            current_index: 0,
            retry: RetryTimer::new(SequenceKind::Write),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn current_index(&self) -> u8 {
        self.current_index
    }

    /// callers ensure there are at most [Self::MAX_RECORDS] records
    pub fn total_count(&self) -> u8 {
        self.records.len() as u8
    }

    pub fn retry_count(&self) -> u32 {
        self.retry.retry_count()
    }

    pub fn records(&self) -> &[SectorDataSet] {
        &self.records
    }

    pub async fn start(&mut self, sector: u8, records: Vec<SectorDataSet>, ctx: &SequenceContext) -> Result<(), SequenceError> {
        if self.active {
            ctx.events.status("a write sequence is already in progress");
            return Err(SequenceError::AlreadyActive(SequenceKind::Write));
        }
        if records.is_empty() {
            return Err(SequenceError::EmptyInput);
        }
        let sector = Sector::try_from(sector)
            .map_err(|_| SequenceError::InvalidSector(sector))?;
        if records.len() > Self::MAX_RECORDS {
            return Err(SequenceError::TooManyRecords(records.len()));
        }

        self.sector = sector;
        self.records = records;
        self.current_index = 0;
        self.retry.reset_retries();
        self.active = true;

        info!("starting to write {} {:?} data sets", self.records.len(), sector);
        ctx.events.status(format!("started writing {} data sets", self.records.len()));

        self.send_current(ctx).await;
        Ok(())
    }

    pub fn stop(&mut self, ctx: &SequenceContext) {
        if !self.active {
            return;
        }
        self.retry.cancel(ctx.scheduler.as_ref());
        self.active = false;

        info!("write sequence stopped at data set {}", self.current_index);
        ctx.events.status(format!("writing stopped at data set {}", self.current_index));
    }

    /// Returns `true` if the acknowledgement was for the data set currently in flight.
    pub async fn on_ack(&mut self, packet: &Packet, ctx: &SequenceContext) -> bool {
        if !self.active {
            debug!("write acknowledgement while no write sequence is active - ignoring");
            return false;
        }
        if packet.index != self.current_index {
            debug!("received acknowledgement for data set {} while waiting for {} - discarding", packet.index, self.current_index);
            return false;
        }

        ctx.events.status(format!("data set {} written and acknowledged", packet.index));
        self.retry.reset_retries();

        let next_index = packet.index as usize + 1;
        if next_index >= self.records.len() {
            self.complete(ctx);
        }
        else {
            self.current_index = next_index as u8;
            self.send_current(ctx).await;
        }
        true
    }

    pub async fn on_timer(&mut self, timer: TimerId, ctx: &SequenceContext) {
        match self.retry.on_fired(timer, ctx.config.max_retries) {
            None => {}
            Some(RetryDecision::Resend) => {
                debug!("no acknowledgement for data set {} - retrying", self.current_index);
                self.send_current(ctx).await;
            }
            Some(RetryDecision::GiveUp) => {
                self.fail(TransferFailure::MaxRetriesExceeded { kind: SequenceKind::Write, index: self.current_index }, ctx);
            }
        }
    }

    async fn send_current(&mut self, ctx: &SequenceContext) {
        let Some(record) = self.records.get(self.current_index as usize) else {
            warn!("write index {} is out of range for {} data sets", self.current_index, self.records.len());
            return;
        };

        let packet = Packet::write(ctx.config.frame_ids, self.current_index, self.total_count(), *record);
        ctx.send_packet(&packet).await;

        ctx.events.status(format!("data set {} sent (attempt {})", self.current_index, self.retry.retry_count() + 1));
        self.retry.arm(ctx.scheduler.as_ref(), ctx.config.retry_delay);
    }

    fn complete(&mut self, ctx: &SequenceContext) {
        self.retry.cancel(ctx.scheduler.as_ref());
        self.active = false;

        info!("wrote {} {:?} data sets", self.records.len(), self.sector);
        ctx.events.status("all data sets written");
        ctx.events.send_event(TransferEvent::WriteComplete);
    }

    fn fail(&mut self, failure: TransferFailure, ctx: &SequenceContext) {
        self.retry.cancel(ctx.scheduler.as_ref());
        self.active = false;

        warn!("write sequence failed: {}", failure);
        ctx.events.send_event(TransferEvent::Error(failure.into()));
    }
}

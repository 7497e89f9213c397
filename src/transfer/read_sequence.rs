use tracing::{debug, info, warn};

use crate::protocol::packet::Packet;
use crate::protocol::sector::Sector;
use crate::transfer::errors::{SequenceError, TransferFailure};
use crate::transfer::record_store::RecordStore;
use crate::transfer::retry::{RetryDecision, RetryTimer, SequenceKind, TimerId};
use crate::transfer::sequence_context::SequenceContext;
use crate::transfer::transfer_events::{RecordReceivedData, TransferEvent};

/// Requests the data sets of one sector from the peer, one at a time and in order.
///
/// The peer announces the total number of data sets in its first response. Every request is
///  re-sent when no response for the requested index arrives within the retry delay, and the
///  sequence fails after the configured number of consecutive timeouts.
#[derive(Debug)]
pub struct ReadSequence {
    active: bool,
    sector: Sector,
    /// the index that is currently requested - it only moves forward
    current_index: u8,
    /// `None` until the peer announced a non-zero total
    total_count: Option<u8>,
    consecutive_empty_responses: u32,
    retry: RetryTimer,
    records: RecordStore,
}

impl Default for ReadSequence {
    fn default() -> Self {
        ReadSequence::new()
    }
}

impl ReadSequence {
    pub fn new() -> ReadSequence {
        ReadSequence {
            active: false,
            sector: Sector::Obstacle,
            current_index: 0,
            total_count: None,
            consecutive_empty_responses: 0,
            retry: RetryTimer::new(SequenceKind::Read),
            records: RecordStore::new(),
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

    pub fn total_count(&self) -> Option<u8> {
        self.total_count
    }

    pub fn retry_count(&self) -> u32 {
        self.retry.retry_count()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub async fn start(&mut self, sector: u8, ctx: &SequenceContext) -> Result<(), SequenceError> {
        if self.active {
            ctx.events.status("a read sequence is already in progress");
            return Err(SequenceError::AlreadyActive(SequenceKind::Read));
        }
        let sector = Sector::try_from(sector)
            .map_err(|_| SequenceError::InvalidSector(sector))?;

        self.sector = sector;
        self.current_index = 0;
        self.total_count = None;
        self.consecutive_empty_responses = 0;
        self.retry.reset_retries();
        self.records.clear();
        self.active = true;

        info!("starting to read {:?} data sets", sector);
        ctx.events.status(format!("started reading {:?} data sets", sector));

        self.send_request(ctx).await;
        Ok(())
    }

    pub fn stop(&mut self, ctx: &SequenceContext) {
        if !self.active {
            return;
        }
        self.retry.cancel(ctx.scheduler.as_ref());
        self.active = false;

        info!("read sequence stopped at data set {}", self.current_index);
        ctx.events.status(format!("reading stopped at data set {}", self.current_index));
    }

    /// Returns `true` if the response was consumed, `false` if it was discarded as stale,
    ///  duplicate or unexpected.
    pub async fn on_response(&mut self, packet: &Packet, ctx: &SequenceContext) -> bool {
        if !self.active {
            debug!("read response while no read sequence is active - ignoring");
            return false;
        }

        if packet.total_count == 0 {
            self.on_empty_response(ctx).await;
            return true;
        }
        self.consecutive_empty_responses = 0;

        let total_count = match self.total_count {
            Some(total_count) => total_count,
            None => {
                debug!("peer announced {} data sets", packet.total_count);
                self.total_count = Some(packet.total_count);
                self.records.expect(packet.total_count as usize);
                ctx.events.status(format!("total of {} data sets announced", packet.total_count));
                packet.total_count
            }
        };

        if packet.index != self.current_index {
            debug!("received data set {} while waiting for {} - discarding", packet.index, self.current_index);
            return false;
        }

        self.records.store(packet.index as usize, packet.record);
        ctx.events.status(format!("data set {} received: {:?}", packet.index, packet.record));
        ctx.events.send_event(TransferEvent::RecordReceived(RecordReceivedData {
            index: packet.index,
            record: packet.record,
        }));
        self.retry.reset_retries();

        let next_index = packet.index as u16 + 1;
        if next_index >= total_count as u16 {
            self.complete(ctx);
        }
        else {
            // fits because it is less than a u8 total count
            self.current_index = next_index as u8;
            self.send_request(ctx).await;
        }
        true
    }

    pub async fn on_timer(&mut self, timer: TimerId, ctx: &SequenceContext) {
        match self.retry.on_fired(timer, ctx.config.max_retries) {
            None => {}
            Some(RetryDecision::Resend) => {
                debug!("no response for data set {} - retrying", self.current_index);
                self.send_request(ctx).await;
            }
            Some(RetryDecision::GiveUp) => {
                self.fail(TransferFailure::MaxRetriesExceeded { kind: SequenceKind::Read, index: self.current_index }, ctx);
            }
        }
    }

    /// The peer reports that it has nothing for the requested index. This skips to the next index
    ///  without storing anything, which never terminates if the peer keeps doing it - unless the
    ///  configuration puts a limit on it.
    async fn on_empty_response(&mut self, ctx: &SequenceContext) {
        self.consecutive_empty_responses += 1;

        if let Some(limit) = ctx.config.empty_response_limit {
            if self.consecutive_empty_responses >= limit {
                self.fail(TransferFailure::EmptyDataSet { consecutive: self.consecutive_empty_responses }, ctx);
                return;
            }
        }

        debug!("peer reported 0 data sets for index {} - skipping", self.current_index);
        ctx.events.status(format!("peer reported 0 data sets for index {}, skipping", self.current_index));
        self.current_index = self.current_index.wrapping_add(1);
        self.send_request(ctx).await;
    }

    async fn send_request(&mut self, ctx: &SequenceContext) {
        let packet = Packet::request(ctx.config.frame_ids, self.sector, self.current_index, self.total_count.unwrap_or(0));
        ctx.send_packet(&packet).await;

        ctx.events.status(format!("data set {} requested (attempt {})", self.current_index, self.retry.retry_count() + 1));
        self.retry.arm(ctx.scheduler.as_ref(), ctx.config.retry_delay);
    }

    fn complete(&mut self, ctx: &SequenceContext) {
        self.retry.cancel(ctx.scheduler.as_ref());
        self.active = false;

        info!("read {} {:?} data sets", self.records.received(), self.sector);
        ctx.events.status("all data sets read");
        ctx.events.send_event(TransferEvent::ReadComplete);
    }

    fn fail(&mut self, failure: TransferFailure, ctx: &SequenceContext) {
        self.retry.cancel(ctx.scheduler.as_ref());
        self.active = false;

        warn!("read sequence failed: {}", failure);
        ctx.events.send_event(TransferEvent::Error(failure.into()));
    }
}

use thiserror::Error;

use crate::protocol::packet::DecodeError;
use crate::transfer::retry::SequenceKind;

/// Rejection of a `start_*` call. Nothing is sent and no state is changed when this is returned.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum SequenceError {
    #[error("a {0:?} sequence is already in progress")]
    AlreadyActive(SequenceKind),
    #[error("there is no sector {0} - valid sectors are 0 (obstacle) and 1 (motor cutout)")]
    InvalidSector(u8),
    #[error("no data sets to write")]
    EmptyInput,
    #[error("{0} data sets exceed the maximum of 255 per write sequence")]
    TooManyRecords(usize),
}

/// Terminal failure of one sequence. The other sequence is unaffected, and the session accepts a
///  new `start_*` call afterwards.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum TransferFailure {
    #[error("{kind:?} of data set {index} failed: maximum number of retries exceeded")]
    MaxRetriesExceeded { kind: SequenceKind, index: u8 },
    #[error("peer reported an empty data set {consecutive} times in a row")]
    EmptyDataSet { consecutive: u32 },
}

/// everything that is reported through [crate::transfer::transfer_events::TransferEvent::Error]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum ProtocolError {
    #[error("dropped inbound frame: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Transfer(#[from] TransferFailure),
}

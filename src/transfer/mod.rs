//! The two transfer state machines, their retry handling and the session that routes events to
//!  them.

pub mod errors;
pub mod read_sequence;
pub mod record_store;
pub mod retry;
pub mod sequence_context;
pub mod session;
pub mod transfer_config;
pub mod transfer_events;
pub mod write_sequence;

//! Utilities for testing code that uses transfer sessions: recording stand-ins for the sending
//!  and retry-timer capabilities, and builders for the frames a device sends back.
//!
//! They are part of the crate's regular (non-#[cfg(test)]) code so that applications can use them
//!  for their own tests.

pub mod harness;
pub mod peer;
pub mod scheduler;
pub mod sender;

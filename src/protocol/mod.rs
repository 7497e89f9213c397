//! Wire format: fixed size frames, their checksum and the record payload they carry.

pub mod checksum;
pub mod packet;
pub mod sector;

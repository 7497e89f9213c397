use bytes::{Buf, BufMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::protocol::checksum::Checksum;
use crate::protocol::sector::{Sector, SectorDataSet};

/// Every frame in either direction has exactly this size.
pub const FRAME_SIZE: usize = 36;

/// The checksum is the last byte and covers everything before it.
pub const CHECKSUM_OFFSET: usize = FRAME_SIZE - 1;

pub const PAYLOAD_OFFSET: usize = 6;

/// Sector / type marker used in every write frame.
pub const WRITE_TYPE_MARKER: u8 = 0;

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum Func {
    /// read request (outbound) or read response (inbound)
    Read = 0,
    /// write request (outbound) or write acknowledgement (inbound)
    Write = 1,
}

/// The constant sender / receiver ids at the start of every outbound frame
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FrameIds {
    pub tx_id: u8,
    pub rx_id: u8,
}
impl Default for FrameIds {
    fn default() -> Self {
        FrameIds {
            tx_id: 0x0C,
            rx_id: 0x03,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("frame has {actual} bytes, expected {}", FRAME_SIZE)]
    SizeMismatch { actual: usize },
    #[error("checksum mismatch: calculated {expected:?}, received {actual:?}")]
    ChecksumMismatch { expected: Checksum, actual: Checksum },
}

/// A decoded (or to-be-encoded) 36 byte frame:
///
/// ```ascii
/// 0        1        2        3         4             5        6 .. 21    22 .. 34   35
/// +--------+--------+--------+---------+-------------+--------+----------+----------+----------+
/// | tx id  | rx id  | func   | sector  | total count | index  | payload  | reserved | checksum |
/// +--------+--------+--------+---------+-------------+--------+----------+----------+----------+
/// ```
///
/// The payload is one [SectorDataSet], four little endian f32 values. Reserved bytes are zero
///  when sending and ignored (but checksummed) when receiving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    pub ids: FrameIds,
    /// raw function code - inbound frames may carry codes this side does not understand, see
    ///  [Packet::func]
    pub func: u8,
    pub sector_or_type: u8,
    pub total_count: u8,
    pub index: u8,
    pub record: SectorDataSet,
}
impl Packet {
    /// Read request for the data set at `index`. `total_count_hint` is 0 as long as the total is
    ///  unknown.
    pub fn request(ids: FrameIds, sector: Sector, index: u8, total_count_hint: u8) -> Packet {
        Packet {
            ids,
            func: Func::Read.into(),
            sector_or_type: sector.into(),
            total_count: total_count_hint,
            index,
            record: SectorDataSet::default(),
        }
    }

    /// Write request carrying `record` as data set `index` of `total_count`.
    pub fn write(ids: FrameIds, index: u8, total_count: u8, record: SectorDataSet) -> Packet {
        Packet {
            ids,
            func: Func::Write.into(),
            sector_or_type: WRITE_TYPE_MARKER,
            total_count,
            index,
            record,
        }
    }

    pub fn func(&self) -> Option<Func> {
        Func::try_from(self.func).ok()
    }

    pub fn ser(&self) -> [u8; FRAME_SIZE] {
        let mut frame = [0u8; FRAME_SIZE];

        let mut buf = &mut frame[..CHECKSUM_OFFSET];
        buf.put_u8(self.ids.tx_id);
        buf.put_u8(self.ids.rx_id);
        buf.put_u8(self.func);
        buf.put_u8(self.sector_or_type);
        buf.put_u8(self.total_count);
        buf.put_u8(self.index);
        self.record.ser(&mut buf);

        frame[CHECKSUM_OFFSET] = Checksum::new(&frame[..CHECKSUM_OFFSET]).0;
        frame
    }

    pub fn try_decode(frame: &[u8]) -> Result<Packet, DecodeError> {
        if frame.len() != FRAME_SIZE {
            return Err(DecodeError::SizeMismatch { actual: frame.len() });
        }

        let expected = Checksum::new(&frame[..CHECKSUM_OFFSET]);
        let actual = Checksum(frame[CHECKSUM_OFFSET]);
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }

        let mut buf = &frame[..CHECKSUM_OFFSET];
        let ids = FrameIds {
            tx_id: buf.get_u8(),
            rx_id: buf.get_u8(),
        };
        let func = buf.get_u8();
        let sector_or_type = buf.get_u8();
        let total_count = buf.get_u8();
        let index = buf.get_u8();
        let record = SectorDataSet::deser(&mut buf);

        Ok(Packet {
            ids,
            func,
            sector_or_type,
            total_count,
            index,
            record,
        })
    }
}

//! Frames as the device sends them

use crate::protocol::packet::{FrameIds, Func, Packet, FRAME_SIZE, WRITE_TYPE_MARKER};
use crate::protocol::sector::{Sector, SectorDataSet};

pub fn peer_ids() -> FrameIds {
    let ids = FrameIds::default();
    FrameIds {
        tx_id: ids.rx_id,
        rx_id: ids.tx_id,
    }
}

/// a data set with distinct values for each `n`
pub fn test_record(n: u8) -> SectorDataSet {
    let n = n as f32;
    SectorDataSet::new(n + 0.5, n + 1.25, 100.0 + n, 200.0 - n)
}

pub fn read_response_packet(sector: Sector, total_count: u8, index: u8, record: SectorDataSet) -> Packet {
    Packet {
        ids: peer_ids(),
        func: Func::Read.into(),
        sector_or_type: sector.into(),
        total_count,
        index,
        record,
    }
}

pub fn read_response(sector: Sector, total_count: u8, index: u8, record: SectorDataSet) -> [u8; FRAME_SIZE] {
    read_response_packet(sector, total_count, index, record).ser()
}

pub fn write_ack_packet(total_count: u8, index: u8) -> Packet {
    Packet {
        ids: peer_ids(),
        func: Func::Write.into(),
        sector_or_type: WRITE_TYPE_MARKER,
        total_count,
        index,
        record: SectorDataSet::default(),
    }
}

pub fn write_ack(total_count: u8, index: u8) -> [u8; FRAME_SIZE] {
    write_ack_packet(total_count, index).ser()
}

use bytes::{Buf, BufMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The logical data category a transfer addresses. The peer keeps one list of
///  [SectorDataSet]s per sector.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum Sector {
    Obstacle = 0,
    MotorCutout = 1,
}

/// One transferred record: four measurements that travel together in a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectorDataSet {
    pub front_distance: f32,
    pub lateral_distance: f32,
    pub front_altitude: f32,
    pub lateral_altitude: f32,
}
impl SectorDataSet {
    pub const SERIALIZED_SIZE: usize = 4 * std::mem::size_of::<f32>();

    pub fn new(front_distance: f32, lateral_distance: f32, front_altitude: f32, lateral_altitude: f32) -> SectorDataSet {
        SectorDataSet {
            front_distance,
            lateral_distance,
            front_altitude,
            lateral_altitude,
        }
    }

    /// little endian, in field declaration order
    pub fn ser(&self, buf: &mut impl BufMut) {
        buf.put_f32_le(self.front_distance);
        buf.put_f32_le(self.lateral_distance);
        buf.put_f32_le(self.front_altitude);
        buf.put_f32_le(self.lateral_altitude);
    }

    /// NB: callers are responsible for passing at least [Self::SERIALIZED_SIZE] bytes - the frame
    ///  size check happens before the payload is touched
    pub fn deser(buf: &mut impl Buf) -> SectorDataSet {
        SectorDataSet {
            front_distance: buf.get_f32_le(),
            lateral_distance: buf.get_f32_le(),
            front_altitude: buf.get_f32_le(),
            lateral_altitude: buf.get_f32_le(),
        }
    }
}

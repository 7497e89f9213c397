use std::fmt::{Debug, Formatter};

/// Frame checksum: the unsigned 8-bit wrap-around sum of all covered bytes.
///
/// NB: This is a plain additive checksum and no CRC - it detects most transmission corruption but
///  no reordering of bytes, and provides no protection against deliberate tampering. The device
///  side defines it this way, so it must be reproduced exactly.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Checksum(pub u8);
impl Debug for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x?}", self.0)
    }
}
impl Checksum {
    pub fn new(covered: &[u8]) -> Checksum {
        Checksum(
            covered.iter()
                .fold(0u8, |acc, &b| acc.wrapping_add(b))
        )
    }
}

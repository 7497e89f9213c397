pub mod protocol;
pub mod transfer;
pub mod transport;
pub mod test_util;

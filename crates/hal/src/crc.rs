//! CRC capability.

use crate::error::HalResult;

/// CRC-32 (ISO-HDLC, Ethernet) generator polynomial, normal form.
pub const CRC32_POLY: u32 = 0x04C1_1DB7;
/// CRC-32 (ISO-HDLC) initial value.
pub const CRC32_INIT: u32 = 0xFFFF_FFFF;

/// CRC unit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CrcConfig {
    /// Generator polynomial (normal form)
    pub polynomial: u32,
    /// Register value after `reset`
    pub initial: u32,
}

impl Default for CrcConfig {
    /// CRC-32/ISO-HDLC.
    fn default() -> Self {
        Self {
            polynomial: CRC32_POLY,
            initial: CRC32_INIT,
        }
    }
}

/// CRC calculation unit.
pub trait Crc {
    /// CRC of `data` alone; the accumulator is left untouched.
    fn compute(&mut self, data: &[u8]) -> HalResult<u32>;

    /// Feed `data` into the accumulator and return the running CRC.
    fn accumulate(&mut self, data: &[u8]) -> HalResult<u32>;

    /// Running CRC without feeding more data.
    fn value(&self) -> HalResult<u32>;

    /// Restart the accumulator from the configured initial value.
    fn reset(&mut self) -> HalResult<()>;
}

//! Analog capabilities (ADC, DAC).

use crate::error::{HalError, HalResult};

/// Narrowest supported converter resolution.
pub const MIN_RESOLUTION_BITS: u8 = 6;
/// Widest supported converter resolution.
pub const MAX_RESOLUTION_BITS: u8 = 16;
/// Maximum ADC input channels.
pub const MAX_ADC_CHANNELS: u8 = 16;
/// Maximum DAC output channels.
pub const MAX_DAC_CHANNELS: u8 = 8;

/// Largest raw code at `bits` of resolution, e.g. `full_scale(12) == 4095`.
///
/// Out-of-range resolutions are rejected with [`HalError::InvalidArgument`].
pub fn full_scale(bits: u8) -> HalResult<u16> {
    if !(MIN_RESOLUTION_BITS..=MAX_RESOLUTION_BITS).contains(&bits) {
        return Err(HalError::InvalidArgument);
    }
    // bits is in 6..=16, so the shift fits in u32 and the result in u16
    let code = 1_u32
        .checked_shl(u32::from(bits))
        .and_then(|v| v.checked_sub(1))
        .ok_or(HalError::InvalidArgument)?;
    u16::try_from(code).map_err(|_| HalError::InvalidArgument)
}

/// Analog-to-digital converter role.
pub trait Adc {
    /// One conversion on `channel`; raw code in `0..=full_scale`.
    fn read(&mut self, channel: u8) -> HalResult<u16>;

    /// One conversion on `channel`, scaled to millivolts against the reference.
    fn read_millivolts(&mut self, channel: u8) -> HalResult<u32>;

    /// Configured channel count.
    fn channel_count(&self) -> u8;

    /// Configured resolution in bits.
    fn resolution_bits(&self) -> u8;
}

/// ADC configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    /// Number of input channels (1..=16)
    pub channels: u8,
    /// Resolution in bits (6..=16)
    pub resolution_bits: u8,
    /// Reference voltage in millivolts
    pub reference_mv: u32,
}

impl Default for AdcConfig {
    /// 8 channels, 12-bit, 3.3 V reference.
    fn default() -> Self {
        Self {
            channels: 8,
            resolution_bits: 12,
            reference_mv: 3300,
        }
    }
}

impl AdcConfig {
    /// Check channel count, resolution and reference.
    pub fn validate(&self) -> HalResult<()> {
        if self.channels == 0 || self.channels > MAX_ADC_CHANNELS || self.reference_mv == 0 {
            return Err(HalError::InvalidArgument);
        }
        full_scale(self.resolution_bits).map(|_| ())
    }
}

/// Digital-to-analog converter role.
pub trait Dac {
    /// Set the output code on `channel`. Codes above full scale are rejected.
    fn write(&mut self, channel: u8, value: u16) -> HalResult<()>;

    /// Last code written to `channel`.
    fn output(&self, channel: u8) -> HalResult<u16>;

    /// Configured channel count.
    fn channel_count(&self) -> u8;
}

/// DAC configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacConfig {
    /// Number of output channels (1..=8)
    pub channels: u8,
    /// Resolution in bits (6..=16)
    pub resolution_bits: u8,
}

impl Default for DacConfig {
    /// 2 channels, 12-bit.
    fn default() -> Self {
        Self {
            channels: 2,
            resolution_bits: 12,
        }
    }
}

impl DacConfig {
    /// Check channel count and resolution.
    pub fn validate(&self) -> HalResult<()> {
        if self.channels == 0 || self.channels > MAX_DAC_CHANNELS {
            return Err(HalError::InvalidArgument);
        }
        full_scale(self.resolution_bits).map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_matches_resolution() {
        assert_eq!(full_scale(6).unwrap(), 63);
        assert_eq!(full_scale(12).unwrap(), 4095);
        assert_eq!(full_scale(16).unwrap(), u16::MAX);
    }

    #[test]
    fn full_scale_rejects_out_of_range() {
        assert_eq!(full_scale(5), Err(HalError::InvalidArgument));
        assert_eq!(full_scale(17), Err(HalError::InvalidArgument));
    }

    #[test]
    fn default_configs_are_valid() {
        AdcConfig::default().validate().unwrap();
        DacConfig::default().validate().unwrap();
    }

    #[test]
    fn channel_limits_are_enforced() {
        let adc = AdcConfig {
            channels: 17,
            ..AdcConfig::default()
        };
        assert_eq!(adc.validate(), Err(HalError::InvalidArgument));
        let dac = DacConfig {
            channels: 0,
            ..DacConfig::default()
        };
        assert_eq!(dac.validate(), Err(HalError::InvalidArgument));
    }
}

//! Simulated CRC unit: CRC-32 (ISO-HDLC) over `crc32fast`.
//!
//! The hardware register is kept in its output form (final XOR applied), which
//! is what `crc32fast` resumes from; an initial register value `r` is stored
//! as `!r`.

use hal::{Crc, CrcConfig, DeviceKind, HalError, HalResult, CRC32_POLY};

use crate::native::{Model, Native};

/// CRC unit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcState {
    seed: u32,
    value: u32,
    bytes: u64,
}

impl CrcState {
    fn run(&mut self, from: u32, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new_with_initial(from);
        hasher.update(data);
        self.value = hasher.finalize();
        self.bytes = self.bytes.saturating_add(data.len() as u64);
        tracing::trace!(len = data.len(), value = self.value, "crc");
        self.value
    }
}

impl Model for CrcState {
    const KIND: DeviceKind = DeviceKind::Crc;
    type Config = CrcConfig;
    type Hooks = ();

    fn power_on(config: &CrcConfig) -> Self {
        Self {
            seed: !config.initial,
            value: !config.initial,
            bytes: 0,
        }
    }

    fn on_init(&mut self, config: &CrcConfig) -> HalResult<()> {
        if config.polynomial != CRC32_POLY {
            return Err(HalError::NotSupported);
        }
        self.seed = !config.initial;
        self.value = self.seed;
        Ok(())
    }
}

/// Simulated CRC unit handle.
pub type NativeCrc = Native<CrcState>;

impl NativeCrc {
    /// Bytes fed through the unit since power-on reset.
    #[must_use]
    pub fn bytes_processed(&self) -> u64 {
        self.peek(|core| core.data.bytes)
    }
}

impl Crc for NativeCrc {
    fn compute(&mut self, data: &[u8]) -> HalResult<u32> {
        self.running_mut(|state, _| {
            let seed = state.seed;
            Ok(state.run(seed, data))
        })
    }

    fn accumulate(&mut self, data: &[u8]) -> HalResult<u32> {
        self.running_mut(|state, _| {
            let from = state.value;
            Ok(state.run(from, data))
        })
    }

    fn value(&self) -> HalResult<u32> {
        self.running(|state, _| Ok(state.value))
    }

    fn reset(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.value = state.seed;
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use hal::{DeviceName, Lifecycle};

    const CHECK: u32 = 0xCBF4_3926;

    fn crc(config: CrcConfig) -> NativeCrc {
        NativeCrc::build(DeviceName::new("CRC0").unwrap(), 0, config, true)
    }

    #[test]
    fn standard_check_value() {
        let mut c = crc(CrcConfig::default());
        c.init().unwrap();
        assert_eq!(c.compute(b"123456789").unwrap(), CHECK);
        assert_eq!(c.value().unwrap(), CHECK);
    }

    #[test]
    fn accumulate_matches_one_shot() {
        let mut c = crc(CrcConfig::default());
        c.init().unwrap();
        c.reset().unwrap();
        c.accumulate(b"1234").unwrap();
        assert_eq!(c.accumulate(b"56789").unwrap(), CHECK);
        assert_eq!(c.bytes_processed(), 9);
    }

    #[test]
    fn compute_ignores_previous_state() {
        let mut c = crc(CrcConfig::default());
        c.init().unwrap();
        c.accumulate(b"garbage").unwrap();
        assert_eq!(c.compute(b"123456789").unwrap(), CHECK);
    }

    #[test]
    fn reset_returns_to_seed() {
        let mut c = crc(CrcConfig::default());
        c.init().unwrap();
        c.accumulate(b"abc").unwrap();
        c.reset().unwrap();
        assert_eq!(c.value().unwrap(), 0);
    }

    #[test]
    fn other_polynomials_are_not_supported() {
        let mut c = crc(CrcConfig {
            polynomial: 0x1EDC_6F41,
            ..CrcConfig::default()
        });
        assert_eq!(c.init(), Err(HalError::NotSupported));
        assert_eq!(c.compute(b"x"), Err(HalError::NotInitialized));
    }
}

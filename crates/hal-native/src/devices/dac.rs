//! Simulated DAC. Tests observe the latched outputs.

use hal::{full_scale, Dac, DacConfig, DeviceKind, HalError, HalResult};

use crate::native::{Model, Native};

/// DAC data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DacState {
    outputs: Vec<u16>,
    full_scale: u16,
    writes: u64,
}

impl Model for DacState {
    const KIND: DeviceKind = DeviceKind::Dac;
    type Config = DacConfig;
    type Hooks = ();

    fn power_on(config: &DacConfig) -> Self {
        Self {
            outputs: vec![0; usize::from(config.channels)],
            full_scale: full_scale(config.resolution_bits).unwrap_or(0),
            writes: 0,
        }
    }

    fn on_init(&mut self, config: &DacConfig) -> HalResult<()> {
        config.validate()?;
        self.full_scale = full_scale(config.resolution_bits)?;
        self.outputs = vec![0; usize::from(config.channels)];
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        self.outputs.iter().all(|&v| v <= self.full_scale)
    }
}

/// Simulated DAC handle.
pub type NativeDac = Native<DacState>;

impl NativeDac {
    /// Writes accepted since power-on reset.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.peek(|core| core.data.writes)
    }
}

impl Dac for NativeDac {
    fn write(&mut self, channel: u8, value: u16) -> HalResult<()> {
        self.running_mut(|state, _| {
            if value > state.full_scale {
                return Err(HalError::InvalidArgument);
            }
            let slot = state
                .outputs
                .get_mut(usize::from(channel))
                .ok_or(HalError::InvalidArgument)?;
            *slot = value;
            state.writes = state.writes.saturating_add(1);
            Ok(())
        })
    }

    fn output(&self, channel: u8) -> HalResult<u16> {
        self.running(|state, _| {
            state
                .outputs
                .get(usize::from(channel))
                .copied()
                .ok_or(HalError::InvalidArgument)
        })
    }

    fn channel_count(&self) -> u8 {
        self.construction_config().channels
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use hal::{DeviceName, Lifecycle};

    fn dac() -> NativeDac {
        let mut d = NativeDac::build(DeviceName::new("DAC0").unwrap(), 0, DacConfig::default(), true);
        d.init().unwrap();
        d
    }

    #[test]
    fn write_latches_output() {
        let mut d = dac();
        d.write(1, 1234).unwrap();
        assert_eq!(d.output(1).unwrap(), 1234);
        assert_eq!(d.output(0).unwrap(), 0);
        assert_eq!(d.write_count(), 1);
    }

    #[test]
    fn value_above_full_scale_is_rejected() {
        let mut d = dac();
        assert_eq!(d.write(0, 4096), Err(HalError::InvalidArgument));
        assert_eq!(d.write_count(), 0);
    }

    #[test]
    fn bad_channel_is_rejected() {
        let mut d = dac();
        assert_eq!(d.write(2, 1), Err(HalError::InvalidArgument));
        assert_eq!(d.output(2), Err(HalError::InvalidArgument));
    }

    #[test]
    fn reinit_zeroes_outputs_but_keeps_counter() {
        let mut d = dac();
        d.write(0, 100).unwrap();
        d.deinit().unwrap();
        d.init().unwrap();
        assert_eq!(d.output(0).unwrap(), 0);
        assert_eq!(d.write_count(), 1);
    }
}

//! Simulated ADC. Channel inputs are set from tests as raw codes.

use hal::{full_scale, Adc, AdcConfig, DeviceKind, HalError, HalResult};

use crate::native::{Model, Native};

/// ADC data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdcState {
    inputs: Vec<u16>,
    full_scale: u16,
    conversions: u64,
}

impl AdcState {
    fn input(&self, channel: u8) -> HalResult<u16> {
        self.inputs
            .get(usize::from(channel))
            .copied()
            .ok_or(HalError::InvalidArgument)
    }

    fn convert(&mut self, channel: u8) -> HalResult<u16> {
        let raw = self.input(channel)?;
        self.conversions = self.conversions.saturating_add(1);
        Ok(raw)
    }
}

impl Model for AdcState {
    const KIND: DeviceKind = DeviceKind::Adc;
    type Config = AdcConfig;
    type Hooks = ();

    fn power_on(config: &AdcConfig) -> Self {
        Self {
            inputs: vec![0; usize::from(config.channels)],
            full_scale: full_scale(config.resolution_bits).unwrap_or(0),
            conversions: 0,
        }
    }

    fn on_init(&mut self, config: &AdcConfig) -> HalResult<()> {
        config.validate()?;
        self.full_scale = full_scale(config.resolution_bits)?;
        self.inputs = vec![0; usize::from(config.channels)];
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        self.inputs.iter().all(|&v| v <= self.full_scale)
    }
}

/// Simulated ADC handle.
pub type NativeAdc = Native<AdcState>;

impl NativeAdc {
    // ── Test support ─────────────────────────────────────────────────────

    /// Set the raw code a channel converts to, clamped to full scale.
    pub fn set_input(&self, channel: u8, raw: u16) -> HalResult<()> {
        self.poke(|core| {
            let fs = core.data.full_scale;
            let slot = core
                .data
                .inputs
                .get_mut(usize::from(channel))
                .ok_or(HalError::InvalidArgument)?;
            *slot = raw.min(fs);
            Ok(())
        })
    }

    /// Conversions performed since power-on reset.
    #[must_use]
    pub fn conversion_count(&self) -> u64 {
        self.peek(|core| core.data.conversions)
    }
}

impl Adc for NativeAdc {
    fn read(&mut self, channel: u8) -> HalResult<u16> {
        self.running_mut(|state, _| state.convert(channel))
    }

    fn read_millivolts(&mut self, channel: u8) -> HalResult<u32> {
        let reference = self.construction_config().reference_mv;
        self.running_mut(|state, _| {
            let raw = state.convert(channel)?;
            let mv = u64::from(raw)
                .saturating_mul(u64::from(reference))
                .checked_div(u64::from(state.full_scale))
                .unwrap_or(0);
            Ok(u32::try_from(mv).unwrap_or(u32::MAX))
        })
    }

    fn channel_count(&self) -> u8 {
        self.construction_config().channels
    }

    fn resolution_bits(&self) -> u8 {
        self.construction_config().resolution_bits
    }
}

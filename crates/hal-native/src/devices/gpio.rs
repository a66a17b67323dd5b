//! Simulated GPIO pin.
//!
//! One pin, four roles (`GpioRead`, `GpioWrite`, `GpioReadWrite`,
//! `GpioInterrupt`) over one shared state. Driving the pin from firmware never
//! fires its interrupt; only externally simulated level changes do.

use hal::gpio::{EdgeEvent, EdgeTrigger, GpioConfig, PinLevel, PinMode};
use hal::{
    DeviceKind, EdgeCallback, GpioInterrupt, GpioRead, GpioReadWrite, GpioWrite, HalError,
    HalResult,
};

use crate::callback::{CallbackSlot, Hooks};
use crate::engine::EdgeDetector;
use crate::native::{Model, Native};

/// Pin data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioState {
    mode: PinMode,
    detector: EdgeDetector,
}

/// Pin callbacks.
#[derive(Default)]
pub struct GpioHooks {
    edge: CallbackSlot<EdgeCallback>,
}

impl Hooks for GpioHooks {
    fn clear(&mut self) {
        self.edge.clear();
    }
}

fn edge_slot(hooks: &mut GpioHooks) -> &mut CallbackSlot<EdgeCallback> {
    &mut hooks.edge
}

impl Model for GpioState {
    const KIND: DeviceKind = DeviceKind::Gpio;
    type Config = GpioConfig;
    type Hooks = GpioHooks;

    fn power_on(config: &GpioConfig) -> Self {
        Self {
            mode: config.mode,
            detector: EdgeDetector::new(config.initial_level),
        }
    }

    fn on_init(&mut self, config: &GpioConfig) -> HalResult<()> {
        self.mode = config.mode;
        self.detector.reset(config.initial_level);
        Ok(())
    }

    fn on_deinit(&mut self) {
        self.detector.arm(None);
    }
}

/// Simulated GPIO pin handle.
pub type NativeGpio = Native<GpioState>;

impl NativeGpio {
    /// Pin direction.
    #[must_use]
    pub fn mode(&self) -> PinMode {
        self.peek(|core| core.data.mode)
    }

    // ── Test support ─────────────────────────────────────────────────────

    /// Drive the pin from outside, as external hardware would.
    ///
    /// The level is always recorded; the interrupt fires (synchronously,
    /// before this returns) only while the pin is `Running` and the
    /// transition matches the armed trigger. Output-only pins cannot be
    /// driven externally.
    pub fn simulate_level(&self, level: PinLevel) -> HalResult<()> {
        let event = self.poke(|core| {
            if core.data.mode == PinMode::Output {
                return Err(HalError::NotSupported);
            }
            let running = core.flags.is_running();
            let pin = u8::try_from(core.index).unwrap_or(u8::MAX);
            Ok(core
                .data
                .detector
                .transition(level, running)
                .map(|edge| EdgeEvent {
                    pin,
                    edge,
                    level,
                    count: core.data.detector.count(),
                }))
        })?;
        if let Some(event) = event {
            tracing::trace!(pin = event.pin, count = event.count, "edge interrupt");
            self.fire(edge_slot, event);
        }
        Ok(())
    }

    /// Interrupts fired since power-on reset.
    #[must_use]
    pub fn trigger_count(&self) -> u32 {
        self.peek(|core| core.data.detector.count())
    }

    /// Current pin level regardless of lifecycle state.
    #[must_use]
    pub fn level(&self) -> PinLevel {
        self.peek(|core| core.data.detector.level())
    }
}

impl GpioRead for NativeGpio {
    fn read(&self) -> HalResult<PinLevel> {
        self.running(|data, _| Ok(data.detector.level()))
    }
}

impl GpioWrite for NativeGpio {
    fn write(&mut self, level: PinLevel) -> HalResult<()> {
        self.running_mut(|data, _| {
            if !data.mode.can_drive() {
                return Err(HalError::NotSupported);
            }
            data.detector.set_level(level);
            Ok(())
        })
    }

    fn toggle(&mut self) -> HalResult<()> {
        self.toggle_level().map(|_| ())
    }
}

impl GpioReadWrite for NativeGpio {
    fn read_level(&self) -> HalResult<PinLevel> {
        GpioRead::read(self)
    }

    fn write_level(&mut self, level: PinLevel) -> HalResult<()> {
        GpioWrite::write(self, level)
    }

    fn toggle_level(&mut self) -> HalResult<PinLevel> {
        self.running_mut(|data, _| {
            if !data.mode.can_drive() {
                return Err(HalError::NotSupported);
            }
            let next = data.detector.level().toggled();
            data.detector.set_level(next);
            Ok(next)
        })
    }
}

impl GpioInterrupt for NativeGpio {
    fn set_interrupt(
        &mut self,
        trigger: EdgeTrigger,
        callback: Option<EdgeCallback>,
    ) -> HalResult<()> {
        self.running_mut(|data, hooks| {
            if data.mode == PinMode::Output {
                return Err(HalError::NotSupported);
            }
            data.detector.arm(callback.is_some().then_some(trigger));
            hooks.edge.set(callback);
            Ok(())
        })
    }

    fn disable_interrupt(&mut self) -> HalResult<()> {
        self.running_mut(|data, hooks| {
            data.detector.arm(None);
            hooks.edge.clear();
            Ok(())
        })
    }

    fn interrupt_trigger(&self) -> Option<EdgeTrigger> {
        self.peek(|core| core.data.detector.trigger())
    }
}

// ── embedded-hal ─────────────────────────────────────────────────────────────

impl embedded_hal::digital::ErrorType for NativeGpio {
    type Error = HalError;
}

impl embedded_hal::digital::InputPin for NativeGpio {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        GpioRead::read(self).map(PinLevel::is_high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        GpioRead::read(self).map(|l| !l.is_high())
    }
}

impl embedded_hal::digital::OutputPin for NativeGpio {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        GpioWrite::write(self, PinLevel::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        GpioWrite::write(self, PinLevel::High)
    }
}

impl embedded_hal::digital::StatefulOutputPin for NativeGpio {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        GpioRead::read(self).map(PinLevel::is_high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        GpioRead::read(self).map(|l| !l.is_high())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use hal::gpio::Edge;
    use hal::{DeviceName, DeviceState, Lifecycle};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn pin(mode: PinMode) -> NativeGpio {
        let config = GpioConfig {
            mode,
            initial_level: PinLevel::Low,
        };
        NativeGpio::build(DeviceName::new("GPIOA3").unwrap(), 3, config, true)
    }

    fn running(mode: PinMode) -> NativeGpio {
        let mut p = pin(mode);
        p.init().unwrap();
        p
    }

    #[test]
    fn read_requires_running() {
        let mut p = pin(PinMode::InputOutput);
        assert_eq!(GpioRead::read(&p), Err(HalError::NotInitialized));
        p.init().unwrap();
        p.suspend().unwrap();
        assert_eq!(GpioRead::read(&p), Err(HalError::InvalidState));
    }

    #[test]
    fn write_then_read_back() {
        let mut p = running(PinMode::InputOutput);
        GpioWrite::write(&mut p, PinLevel::High).unwrap();
        assert_eq!(GpioRead::read(&p).unwrap(), PinLevel::High);
        assert_eq!(p.toggle_level().unwrap(), PinLevel::Low);
    }

    #[test]
    fn input_only_pin_rejects_write() {
        let mut p = running(PinMode::Input);
        assert_eq!(
            GpioWrite::write(&mut p, PinLevel::High),
            Err(HalError::NotSupported)
        );
    }

    #[test]
    fn roles_share_lifecycle() {
        let mut writer = pin(PinMode::InputOutput);
        let reader = writer.clone();
        writer.init().unwrap();
        assert_eq!(reader.state(), DeviceState::Running);
        GpioWrite::write(&mut writer, PinLevel::High).unwrap();
        assert_eq!(GpioRead::read(&reader).unwrap(), PinLevel::High);
    }

    #[test]
    fn rising_interrupt_reports_event() {
        let mut p = running(PinMode::Input);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        p.set_interrupt(
            EdgeTrigger::Rising,
            Some(Box::new(move |e: EdgeEvent| sink.borrow_mut().push(e))),
        )
        .unwrap();
        p.simulate_level(PinLevel::High).unwrap();
        p.simulate_level(PinLevel::Low).unwrap();
        p.simulate_level(PinLevel::High).unwrap();
        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].edge, Edge::Rising);
        assert_eq!(events[0].pin, 3);
        assert_eq!(events[1].count, 2);
        assert_eq!(p.trigger_count(), 2);
    }

    #[test]
    fn driving_the_pin_does_not_fire() {
        let mut p = running(PinMode::InputOutput);
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        p.set_interrupt(EdgeTrigger::Both, Some(Box::new(move |_| *h.borrow_mut() += 1)))
            .unwrap();
        GpioWrite::write(&mut p, PinLevel::High).unwrap();
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn suspended_pin_tracks_level_without_firing() {
        let mut p = running(PinMode::Input);
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        p.set_interrupt(EdgeTrigger::Both, Some(Box::new(move |_| *h.borrow_mut() += 1)))
            .unwrap();
        p.suspend().unwrap();
        p.simulate_level(PinLevel::High).unwrap();
        assert_eq!(*hits.borrow(), 0);
        p.resume().unwrap();
        assert_eq!(GpioRead::read(&p).unwrap(), PinLevel::High);
    }

    #[test]
    fn none_callback_disables_interrupt() {
        let mut p = running(PinMode::Input);
        p.set_interrupt(EdgeTrigger::Both, Some(Box::new(|_| {})))
            .unwrap();
        p.set_interrupt(EdgeTrigger::Both, None).unwrap();
        assert_eq!(p.interrupt_trigger(), None);
        p.simulate_level(PinLevel::High).unwrap();
        assert_eq!(p.trigger_count(), 0);
    }

    #[test]
    fn deinit_clears_interrupt() {
        let mut p = running(PinMode::Input);
        p.set_interrupt(EdgeTrigger::Rising, Some(Box::new(|_| {})))
            .unwrap();
        p.deinit().unwrap();
        assert_eq!(p.interrupt_trigger(), None);
    }

    #[test]
    fn output_only_pin_cannot_be_driven_externally() {
        let p = running(PinMode::Output);
        assert_eq!(
            p.simulate_level(PinLevel::High),
            Err(HalError::NotSupported)
        );
    }

    #[test]
    fn embedded_hal_pin_traits() {
        use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
        let mut p = running(PinMode::InputOutput);
        p.set_high().unwrap();
        assert!(p.is_high().unwrap());
        assert!(p.is_set_high().unwrap());
        StatefulOutputPin::toggle(&mut p).unwrap();
        assert!(p.is_low().unwrap());
    }
}

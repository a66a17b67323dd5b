//! Suspend/resume neutrality for every device on the default board: after
//! any mix of role operations, test-side stimulus and elapsed time, a
//! suspend/resume pair leaves the device data bit-for-bit unchanged, and
//! nothing done while suspended leaks into it.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod common;

use hal::{
    Adc, AlarmTime, Crc, Dac, DeviceState, GpioWrite, HalError, I2c, Lifecycle, OptionBytes,
    PinLevel, Rtc, Spi, Timer, Uart, Usb, Watchdog,
};
use hal_native::{Device, Model, Native, Registry};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Lifecycle-gated operation through the device's own role.
    Role(u8),
    /// The other side of the wire, pin or input.
    Drive(u8),
    /// Simulated time passing.
    Advance(u16),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => any::<u8>().prop_map(Step::Role),
        2 => any::<u8>().prop_map(Step::Drive),
        1 => (0u16..3_000).prop_map(Step::Advance),
    ]
}

fn target(v: u8) -> u8 {
    0x20 + v % 4
}

/// One role operation picked by `v`. Results are ignored; rejected
/// operations are part of the mix.
fn role_op(device: &mut Device, v: u8) {
    match device {
        Device::Gpio(pin) => {
            let _ = match v % 2 {
                0 => GpioWrite::write(pin, PinLevel::from(v & 0x80 != 0)),
                _ => GpioWrite::toggle(pin),
            };
        }
        Device::Uart(uart) => {
            let _ = match v % 3 {
                0 => Uart::write(uart, &[v, v]).map(drop),
                1 => Uart::read(uart, &mut [0u8; 3]).map(drop),
                _ => uart.flush_rx(),
            };
        }
        Device::Spi(spi) => {
            let _ = match v % 3 {
                0 => Spi::write(spi, &[v]).map(drop),
                1 => Spi::read(spi, &mut [0u8; 2]).map(drop),
                _ => spi.transfer(&[v, !v], &mut [0u8; 2]),
            };
        }
        Device::I2c(i2c) => {
            let _ = match v % 2 {
                0 => I2c::write(i2c, target(v), &[v]),
                _ => I2c::read(i2c, target(v), &mut [0u8; 2]),
            };
        }
        Device::Adc(adc) => {
            let channel = v % adc.channel_count().max(1);
            let _ = Adc::read(adc, channel);
        }
        Device::Dac(dac) => {
            let channel = v % dac.channel_count().max(1);
            let _ = Dac::write(dac, channel, u16::from(v) * 8);
        }
        Device::Timer(timer) => {
            let _ = match v % 4 {
                0 => timer.start(),
                1 => timer.stop(),
                2 => timer.set_period(u64::from(v) + 1),
                _ => timer.set_counter(0),
            };
        }
        Device::Rtc(rtc) => {
            let _ = match v % 2 {
                0 => rtc.set_alarm(AlarmTime::new(v % 24, v % 60, 0).unwrap(), None),
                _ => rtc.cancel_alarm(),
            };
        }
        Device::Crc(crc) => {
            let _ = match v % 3 {
                0 => crc.accumulate(&[v]).map(drop),
                1 => crc.compute(&[v, v]).map(drop),
                _ => crc.reset(),
            };
        }
        Device::Watchdog(dog) => {
            let _ = match v % 3 {
                0 => dog.start(),
                1 => dog.feed(),
                _ => dog.set_timeout(u32::from(v) * 20 + 1),
            };
        }
        Device::Usb(usb) => {
            let _ = match v % 4 {
                0 => usb.connect(),
                1 => usb.disconnect(),
                2 => Usb::write(usb, &[v]).map(drop),
                _ => Usb::read(usb, &mut [0u8; 2]).map(drop),
            };
        }
        Device::OptionBytes(opt) => {
            let _ = match v % 4 {
                0 => opt.set_user_config(v),
                1 => opt.write_user_data(usize::from(v % 16), &[v]),
                2 => opt.apply(),
                _ => opt.discard(),
            };
        }
    }
}

/// Test-side stimulus, for the kinds that have one.
fn drive(device: &Device, v: u8) {
    match device {
        Device::Gpio(pin) => {
            let _ = pin.simulate_level(PinLevel::from(v & 1 == 1));
        }
        Device::Uart(uart) => {
            uart.inject_rx(&[v; 3]);
        }
        Device::Spi(spi) => {
            spi.inject_rx(&[v; 2]);
        }
        Device::I2c(i2c) => {
            let _ = i2c.attach_target(target(v));
            let _ = i2c.inject_rx(target(v), &[v]);
        }
        Device::Adc(adc) => {
            let _ = adc.set_input(v % adc.channel_count().max(1), u16::from(v) * 16);
        }
        Device::Usb(usb) => {
            usb.host_send(&[v]);
        }
        _ => {}
    }
}

/// Suspend, let `idle` ticks pass and try `attempts` while suspended, then
/// resume; the data must come back unchanged.
fn round_trip<M: Model>(
    handle: &Native<M>,
    device: &mut Device,
    registry: &Registry,
    idle: u64,
    attempts: &[u8],
) -> Result<(), TestCaseError> {
    let mut lifecycle = handle.clone();
    let before = handle.snapshot();
    prop_assert_eq!(lifecycle.suspend(), Ok(()));
    registry.advance_time(idle);
    for &v in attempts {
        role_op(device, v);
    }
    prop_assert_eq!(lifecycle.state(), DeviceState::Suspended);
    prop_assert_eq!(handle.snapshot(), before.clone());
    prop_assert_eq!(lifecycle.resume(), Ok(()));
    prop_assert_eq!(handle.snapshot(), before);
    Ok(())
}

fn check(
    device: &mut Device,
    registry: &Registry,
    idle: u64,
    attempts: &[u8],
) -> Result<(), TestCaseError> {
    let handle = device.clone();
    match &handle {
        Device::Gpio(h) => round_trip(h, device, registry, idle, attempts),
        Device::Uart(h) => round_trip(h, device, registry, idle, attempts),
        Device::Spi(h) => round_trip(h, device, registry, idle, attempts),
        Device::I2c(h) => round_trip(h, device, registry, idle, attempts),
        Device::Adc(h) => round_trip(h, device, registry, idle, attempts),
        Device::Dac(h) => round_trip(h, device, registry, idle, attempts),
        Device::Timer(h) => round_trip(h, device, registry, idle, attempts),
        Device::Rtc(h) => round_trip(h, device, registry, idle, attempts),
        Device::Crc(h) => round_trip(h, device, registry, idle, attempts),
        Device::Watchdog(h) => round_trip(h, device, registry, idle, attempts),
        Device::Usb(h) => round_trip(h, device, registry, idle, attempts),
        Device::OptionBytes(h) => round_trip(h, device, registry, idle, attempts),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn suspend_resume_is_neutral_for_every_device(
        steps in proptest::collection::vec(step(), 0..24),
        idle in 0u64..10_000,
        attempts in proptest::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut registry = common::default_registry();
        let names: Vec<String> = registry.names().map(|n| n.as_str().to_owned()).collect();
        let mut devices: Vec<Device> = names
            .iter()
            .map(|name| common::running(&mut registry, name))
            .collect();

        for step in &steps {
            for device in &mut devices {
                match *step {
                    Step::Role(v) => role_op(device, v),
                    Step::Drive(v) => drive(device, v),
                    Step::Advance(_) => {}
                }
            }
            if let Step::Advance(ticks) = *step {
                registry.advance_time(u64::from(ticks));
            }
        }

        for device in &mut devices {
            check(device, &registry, idle, &attempts)?;
        }
    }
}

#[test]
fn role_operations_are_rejected_while_suspended() {
    let mut registry = common::default_registry();
    let mut dog = common::running(&mut registry, "WATCHDOG0")
        .into_watchdog()
        .unwrap();
    dog.start().unwrap();
    dog.suspend().unwrap();
    assert_eq!(dog.feed(), Err(HalError::InvalidState));
    assert_eq!(dog.set_timeout(10), Err(HalError::InvalidState));
    registry.advance_time(60_000);
    dog.resume().unwrap();
    assert_eq!(dog.elapsed(), 0);
    assert!(!dog.has_timed_out().unwrap());
}

//! Registry built from board tables: lookup, construction and reset across
//! the whole representative board.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use hal::{DeviceKind, DeviceState, GpioRead, GpioWrite, HalError, Lifecycle, PinLevel, Power, Uart};
use hal_native::{BoardTable, DeviceDescriptor, Registry, RegistryLimits};

#[test]
fn every_default_device_resolves_and_initializes() {
    let mut registry = common::default_registry();
    let names: Vec<String> = registry.names().map(|n| n.as_str().to_owned()).collect();
    assert_eq!(names.len(), 34);
    for name in &names {
        let mut device = registry.resolve(name).unwrap();
        assert_eq!(device.state(), DeviceState::Uninitialized, "{name}");
        device.lifecycle().init().unwrap();
        assert_eq!(device.state(), DeviceState::Running, "{name}");
        assert_eq!(device.name().as_str(), name);
    }
}

#[test]
fn only_always_on_devices_exist_before_lookup() {
    let registry = common::default_registry();
    assert!(registry.is_constructed("RTC0"));
    assert!(registry.is_constructed("OPTBYTES0"));
    assert!(!registry.is_constructed("UART0"));
    assert!(!registry.is_constructed("GPIOA0"));
    assert!(!registry.is_constructed("WATCHDOG0"));
}

#[test]
fn handles_from_separate_lookups_share_state() {
    let mut registry = common::default_registry();
    let mut writer = registry.gpio("GPIOB3").unwrap();
    let reader = registry.gpio("GPIOB3").unwrap();
    writer.init().unwrap();
    writer.write(PinLevel::High).unwrap();
    assert_eq!(reader.read().unwrap(), PinLevel::High);
    assert!(writer.same_device(&reader));
}

#[test]
fn gpio_ports_map_to_distinct_indices() {
    let registry = common::default_registry();
    let a7 = registry.descriptor("GPIOA7").unwrap();
    let b0 = registry.descriptor("GPIOB0").unwrap();
    assert_eq!(a7.index, 7);
    assert_eq!(b0.index, 8);
}

#[test]
fn power_domains_follow_device_kind() {
    let mut registry = common::default_registry();
    for name in ["RTC0", "WATCHDOG0", "OPTBYTES0"] {
        assert!(registry.resolve(name).unwrap().power().is_none(), "{name}");
    }
    let mut uart = registry.resolve("UART1").unwrap();
    let power = uart.power().unwrap();
    assert!(!power.is_enabled());
    power.enable().unwrap();
    assert!(power.is_enabled());
}

#[test]
fn reset_all_returns_every_device_to_power_on() {
    let mut registry = common::default_registry();
    let mut uart = registry.uart("UART0").unwrap();
    uart.init().unwrap();
    uart.write(b"abc").unwrap();
    let mut led = registry.gpio("GPIOA0").unwrap();
    led.init().unwrap();

    registry.reset_all();

    assert_eq!(uart.state(), DeviceState::Uninitialized);
    assert_eq!(led.state(), DeviceState::Uninitialized);
    assert!(uart.take_tx().is_empty());
    assert_eq!(uart.stats().bytes_tx, 0);
}

#[test]
fn reset_kind_leaves_other_kinds_alone() {
    let mut registry = common::default_registry();
    let mut uart = registry.uart("UART0").unwrap();
    let mut spi = registry.spi("SPI0").unwrap();
    uart.init().unwrap();
    spi.init().unwrap();
    registry.reset_kind(DeviceKind::Uart);
    assert_eq!(uart.state(), DeviceState::Uninitialized);
    assert_eq!(spi.state(), DeviceState::Running);
}

#[test]
fn released_devices_stay_constructed() {
    let mut registry = common::default_registry();
    let mut device = common::running(&mut registry, "TIMER2");
    registry.release(device.clone());
    assert!(registry.is_constructed("TIMER2"));
    assert_eq!(registry.resolve("TIMER2").unwrap().state(), DeviceState::Running);
    device.lifecycle().deinit().unwrap();
}

#[test]
fn json_board_builds_a_working_registry() {
    common::init_tracing();
    let table = BoardTable::from_json(
        r#"{
            "version": 1,
            "limits": { "max_per_kind": 4, "max_devices": 8 },
            "devices": [
                { "kind": "uart", "index": 1, "name": "CONSOLE",
                  "config": { "baud_rate": 9600, "tx_buffer_size": 4 } },
                { "kind": "gpio", "index": 5, "name": "BUTTON",
                  "config": { "mode": "input", "initial_high": true } },
                { "kind": "rtc", "index": 0, "config": { "initial": "2030-01-02T03:04:05" } }
            ]
        }"#,
    )
    .unwrap();
    let mut registry = Registry::from_board(&table).unwrap();
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.limits().max_devices, 8);

    let mut console = registry.uart("CONSOLE").unwrap();
    console.init().unwrap();
    assert_eq!(console.config().baud_rate, 9600);
    assert_eq!(console.write(b"overflow").unwrap(), 4);

    let mut button = registry.gpio("BUTTON").unwrap();
    button.init().unwrap();
    assert_eq!(button.read().unwrap(), PinLevel::High);
    assert_eq!(button.write(PinLevel::Low), Err(HalError::NotSupported));
}

#[test]
fn board_over_capacity_is_rejected() {
    let mut table = BoardTable::new(RegistryLimits {
        max_devices: 2,
        ..RegistryLimits::default()
    });
    for i in 0..3 {
        table.push(DeviceDescriptor::new(DeviceKind::Adc, i).unwrap());
    }
    assert_eq!(Registry::from_board(&table).unwrap_err(), HalError::NoMemory);
}

#[test]
fn eager_kind_over_its_limit_rejects_registration() {
    let mut registry = Registry::new(RegistryLimits {
        max_per_kind: 1,
        ..RegistryLimits::default()
    });
    registry
        .register(DeviceDescriptor::new(DeviceKind::Rtc, 0).unwrap())
        .unwrap();
    assert_eq!(
        registry.register(DeviceDescriptor::new(DeviceKind::Rtc, 1).unwrap()),
        Err(HalError::NoMemory)
    );
    assert!(!registry.contains("RTC1"));
}

#[test]
fn independent_registries_have_independent_time() {
    let mut a = common::default_registry();
    let mut b = common::default_registry();
    let mut ta = a.timer("TIMER0").unwrap();
    let mut tb = b.timer("TIMER0").unwrap();
    for t in [&mut ta, &mut tb] {
        t.init().unwrap();
        hal::Timer::start(t).unwrap();
    }
    a.advance_time(10);
    assert_eq!(hal::Timer::counter(&ta).unwrap(), 10);
    assert_eq!(hal::Timer::counter(&tb).unwrap(), 0);
    assert_eq!(b.clock().now(), 0);
}

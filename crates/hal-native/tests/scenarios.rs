//! End-to-end driver scenarios against the default board.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use hal::{
    Adc, AlarmTime, Dac, DateTime, DeviceState, HalError, I2c, Lifecycle, OptionBytes, Power,
    ProtectionLevel, Rtc, Spi, Timer, Uart, Usb, Watchdog,
};

#[test]
fn watchdog_fed_in_time_then_starved() {
    let mut registry = common::default_registry();
    let mut dog = registry.watchdog("WATCHDOG0").unwrap();
    dog.init().unwrap();
    dog.set_timeout(5000).unwrap();
    let expiries = Rc::new(RefCell::new(Vec::new()));
    let sink = expiries.clone();
    dog.set_callback(Some(Box::new(move |n| sink.borrow_mut().push(n))))
        .unwrap();
    dog.start().unwrap();

    registry.advance_time(4000);
    dog.feed().unwrap();
    registry.advance_time(4000);
    assert!(!dog.has_timed_out().unwrap());
    assert!(expiries.borrow().is_empty());

    registry.advance_time(1100);
    assert!(dog.has_timed_out().unwrap());
    assert_eq!(*expiries.borrow(), [1]);

    dog.suspend().unwrap();
    assert_eq!(dog.feed(), Err(HalError::InvalidState));
}

#[test]
fn option_bytes_stage_then_commit() {
    let mut registry = common::default_registry();
    let mut ob = registry.option_bytes("OPTBYTES0").unwrap();
    ob.init().unwrap();

    ob.set_protection_level(1).unwrap();
    ob.write_user_data(2, &[0xDE, 0xAD]).unwrap();
    assert_eq!(ob.protection_level().unwrap(), ProtectionLevel::Level0);
    assert_eq!(ob.user_data().unwrap()[2..4], [0, 0]);
    assert!(ob.has_pending_changes().unwrap());

    ob.apply().unwrap();
    assert_eq!(ob.protection_level().unwrap(), ProtectionLevel::Level1);
    assert_eq!(ob.user_data().unwrap()[2..4], [0xDE, 0xAD]);

    ob.set_user_config(0x11).unwrap();
    ob.discard().unwrap();
    assert!(!ob.has_pending_changes().unwrap());
    assert_eq!(ob.user_config().unwrap(), 0);
}

#[test]
fn option_bytes_reject_bad_writes_without_staging() {
    let mut registry = common::default_registry();
    let mut ob = registry.option_bytes("OPTBYTES0").unwrap();
    ob.init().unwrap();
    assert_eq!(ob.write_user_data(0, &[]), Err(HalError::NullArgument));
    assert_eq!(ob.write_user_data(15, &[1, 2]), Err(HalError::NoMemory));
    ob.set_write_protection(true);
    assert_eq!(ob.set_user_config(1), Err(HalError::PermissionDenied));
    assert_eq!(ob.set_protection_level(9), Err(HalError::InvalidArgument));
    assert!(!ob.has_pending_changes().unwrap());
}

#[test]
fn level_two_protection_is_permanent() {
    let mut registry = common::default_registry();
    let mut ob = registry.option_bytes("OPTBYTES0").unwrap();
    ob.init().unwrap();
    ob.set_protection_level(2).unwrap();
    ob.apply().unwrap();
    assert_eq!(ob.set_protection_level(0), Err(HalError::PermissionDenied));
    ob.deinit().unwrap();
    ob.init().unwrap();
    assert_eq!(ob.protection_level().unwrap(), ProtectionLevel::Level2);
}

#[test]
fn rtc_alarm_through_the_registry_clock() {
    let mut registry = common::default_registry();
    let mut rtc = registry.rtc("RTC0").unwrap();
    rtc.init().unwrap();
    rtc.set_time(DateTime::new(2025, 12, 31, 23, 59, 50).unwrap())
        .unwrap();
    let fired = Rc::new(RefCell::new(None));
    let sink = fired.clone();
    rtc.set_alarm(
        AlarmTime::new(0, 0, 5).unwrap(),
        Some(Box::new(move |t| *sink.borrow_mut() = Some(t))),
    )
    .unwrap();

    registry.advance_time(20_000);
    assert_eq!(
        *fired.borrow(),
        Some(DateTime::new(2026, 1, 1, 0, 0, 5).unwrap())
    );
    assert_eq!(
        rtc.time().unwrap(),
        DateTime::new(2026, 1, 1, 0, 0, 10).unwrap()
    );
    assert!(!rtc.alarm_enabled());
}

#[test]
fn uart_round_trip_with_timeouts() {
    let mut registry = common::default_registry();
    let mut uart = registry.uart("UART2").unwrap();
    uart.init().unwrap();

    uart.send(b"AT\r\n", 100).unwrap();
    assert_eq!(uart.tx_pending().unwrap(), 4);
    assert_eq!(uart.take_tx(), b"AT\r\n");

    uart.inject_rx(b"OK");
    let mut reply = [0u8; 4];
    assert_eq!(uart.receive(&mut reply, 100), Err(HalError::Timeout));
    assert_eq!(uart.rx_available().unwrap(), 2);
    let mut ok = [0u8; 2];
    uart.receive(&mut ok, 100).unwrap();
    assert_eq!(&ok, b"OK");
    assert_eq!(uart.stats().timeouts, 1);
}

#[test]
fn spi_transfer_clocks_idle_when_nothing_queued() {
    let mut registry = common::default_registry();
    let mut spi = registry.spi("SPI1").unwrap();
    spi.init().unwrap();
    spi.inject_rx(&[0x42]);
    let mut rx = [0u8; 3];
    spi.transfer(&[0x9F, 0, 0], &mut rx).unwrap();
    assert_eq!(rx, [0x42, 0xFF, 0xFF]);
    assert_eq!(spi.take_tx(), [0x9F, 0, 0]);
    assert_eq!(
        spi.transfer(&[1, 2], &mut [0u8; 3]),
        Err(HalError::InvalidArgument)
    );
}

#[test]
fn i2c_register_read_from_attached_target() {
    let mut registry = common::default_registry();
    let mut bus = registry.i2c("I2C0").unwrap();
    bus.init().unwrap();
    bus.attach_target(0x48).unwrap();
    bus.inject_rx(0x48, &[0x1A, 0x80]).unwrap();

    let mut temp = [0u8; 2];
    bus.write_read(0x48, &[0x00], &mut temp).unwrap();
    assert_eq!(temp, [0x1A, 0x80]);
    assert_eq!(bus.capture_tx(0x48).unwrap(), [0x00]);

    assert_eq!(bus.write(0x49, &[1]), Err(HalError::NotFound));
    assert_eq!(bus.stats().errors, 1);
    assert_eq!(bus.write(0x80, &[1]), Err(HalError::InvalidArgument));
}

#[test]
fn adc_reading_follows_injected_input() {
    let mut registry = common::default_registry();
    let mut adc = registry.adc("ADC0").unwrap();
    adc.init().unwrap();
    adc.set_input(3, 4095).unwrap();
    assert_eq!(adc.read(3).unwrap(), 4095);
    assert_eq!(adc.read_millivolts(3).unwrap(), 3300);
    assert_eq!(adc.read(8), Err(HalError::InvalidArgument));
    assert_eq!(adc.conversion_count(), 2);
}

#[test]
fn dac_holds_last_written_code() {
    let mut registry = common::default_registry();
    let mut dac = registry.dac("DAC0").unwrap();
    dac.init().unwrap();
    dac.write(0, 2048).unwrap();
    assert_eq!(dac.output(0).unwrap(), 2048);
    assert_eq!(dac.write(0, u16::MAX), Err(HalError::InvalidArgument));
    assert_eq!(dac.output(0).unwrap(), 2048);
}

#[test]
fn usb_moves_data_only_while_attached() {
    let mut registry = common::default_registry();
    let mut usb = registry.usb("USB0").unwrap();
    usb.init().unwrap();
    assert_eq!(usb.write(b"x"), Err(HalError::InvalidState));
    usb.connect().unwrap();
    assert_eq!(usb.host_send(b"hi"), 2);
    let mut buf = [0u8; 2];
    assert_eq!(usb.read(&mut buf).unwrap(), 2);
    usb.write(b"ack").unwrap();
    assert_eq!(usb.host_receive(), b"ack");
}

#[test]
fn power_callback_sees_every_toggle() {
    let mut registry = common::default_registry();
    let mut timer = registry.timer("TIMER0").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let domain = timer.power_domain().unwrap();
    domain
        .set_callback(Some(Box::new(move |on| sink.borrow_mut().push(on))))
        .unwrap();
    domain.enable().unwrap();
    domain.enable().unwrap();
    domain.disable().unwrap();
    assert_eq!(*seen.borrow(), [true, true, false]);
    assert_eq!(domain.notification_count(), 3);
}

#[test]
fn suspended_timer_holds_its_count_across_time() {
    let mut registry = common::default_registry();
    let mut timer = registry.timer("TIMER0").unwrap();
    timer.init().unwrap();
    timer.start().unwrap();
    registry.advance_time(250);
    timer.suspend().unwrap();
    let before = timer.snapshot();
    registry.advance_time(10_000);
    timer.resume().unwrap();
    assert_eq!(timer.snapshot(), before);
    assert_eq!(timer.counter().unwrap(), 250);
    assert_eq!(timer.state(), DeviceState::Running);
}

#[test]
fn injected_fault_only_allows_deinit() {
    let mut registry = common::default_registry();
    let mut uart = registry.uart("UART0").unwrap();
    uart.init().unwrap();
    uart.inject_fault();
    assert_eq!(uart.state(), DeviceState::Error);
    assert_eq!(uart.write(b"x"), Err(HalError::InvalidState));
    assert_eq!(uart.init(), Err(HalError::InvalidState));
    uart.deinit().unwrap();
    assert_eq!(uart.state(), DeviceState::Uninitialized);
    uart.init().unwrap();
}

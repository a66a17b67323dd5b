//! Property tests over the simulated devices: state-table conformance,
//! byte conservation through the rings, edge counting, timer arithmetic and
//! CRC chunking.

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
    Crc, DeviceState, EdgeTrigger, GpioInterrupt, HalError, Lifecycle, PinLevel, Timer, TimerConfig,
    TimerMode, Uart, UartConfig,
};
use hal_native::{DeviceConfig, DeviceDescriptor, NativeUart, Registry};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Init,
    Deinit,
    Suspend,
    Resume,
    Write,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Init),
        Just(Op::Deinit),
        Just(Op::Suspend),
        Just(Op::Resume),
        Just(Op::Write),
    ]
}

fn expected(state: DeviceState, op: Op) -> (Result<(), HalError>, DeviceState) {
    use DeviceState::{Running, Suspended, Uninitialized};
    match (op, state) {
        (Op::Init, Uninitialized) => (Ok(()), Running),
        (Op::Init, s) => (Err(HalError::AlreadyInitialized), s),
        (Op::Deinit, Uninitialized) => (Err(HalError::NotInitialized), Uninitialized),
        (Op::Deinit, _) => (Ok(()), Uninitialized),
        (Op::Suspend, Running) => (Ok(()), Suspended),
        (Op::Resume, Suspended) => (Ok(()), Running),
        (Op::Suspend | Op::Resume, Uninitialized) => {
            (Err(HalError::NotInitialized), Uninitialized)
        }
        (Op::Suspend | Op::Resume, s) => (Err(HalError::InvalidState), s),
        (Op::Write, Running) => (Ok(()), Running),
        (Op::Write, Uninitialized) => (Err(HalError::NotInitialized), Uninitialized),
        (Op::Write, s) => (Err(HalError::InvalidState), s),
    }
}

fn uart(tx: usize, rx: usize) -> NativeUart {
    let mut registry = Registry::default();
    let config = UartConfig {
        tx_buffer_size: tx,
        rx_buffer_size: rx,
        ..UartConfig::default()
    };
    registry
        .register(
            DeviceDescriptor::new(hal::DeviceKind::Uart, 0)
                .unwrap()
                .with_config(DeviceConfig::Uart(config)),
        )
        .unwrap();
    registry.uart("UART0").unwrap()
}

proptest! {
    /// A device follows the lifecycle table for any sequence of operations,
    /// and a suspend/resume pair leaves its data bit-for-bit unchanged.
    #[test]
    fn uart_follows_lifecycle_table(ops in proptest::collection::vec(op(), 0..48)) {
        let mut device = uart(64, 64);
        let mut state = DeviceState::Uninitialized;
        for op in ops {
            let (result, next) = expected(state, op);
            let before = device.snapshot();
            let actual = match op {
                Op::Init => device.init(),
                Op::Deinit => device.deinit(),
                Op::Suspend => device.suspend(),
                Op::Resume => device.resume(),
                Op::Write => device.write(b"x").map(|_| ()),
            };
            prop_assert_eq!(actual, result);
            prop_assert_eq!(device.state(), next);
            if matches!(op, Op::Suspend | Op::Resume) {
                prop_assert_eq!(device.snapshot(), before);
            }
            state = next;
        }
    }

    /// Every injected byte is either read back, still buffered, or counted
    /// as an overflow; order is preserved.
    #[test]
    fn rx_ring_conserves_bytes(
        capacity in 1usize..32,
        steps in proptest::collection::vec(
            (proptest::collection::vec(any::<u8>(), 0..16), 0usize..16),
            0..32,
        ),
    ) {
        let mut device = uart(8, capacity);
        device.init().unwrap();
        let mut accepted_stream = Vec::new();
        let mut read_stream = Vec::new();
        let mut injected = 0u64;
        for (chunk, want) in steps {
            injected += chunk.len() as u64;
            let accepted = device.inject_rx(&chunk);
            accepted_stream.extend_from_slice(&chunk[..accepted]);
            let mut buf = vec![0u8; want];
            let n = device.read(&mut buf).unwrap();
            read_stream.extend_from_slice(&buf[..n]);
        }
        let buffered = device.rx_available().unwrap();
        let stats = device.stats();
        prop_assert!(buffered <= capacity);
        prop_assert_eq!(read_stream.len() + buffered, accepted_stream.len());
        prop_assert_eq!(&accepted_stream[..read_stream.len()], &read_stream[..]);
        prop_assert_eq!(stats.bytes_rx, read_stream.len() as u64);
        prop_assert_eq!(stats.overflows + accepted_stream.len() as u64, injected);
    }

    /// The interrupt fires exactly once per transition matching the trigger.
    #[test]
    fn edge_interrupts_match_transitions(
        trigger in prop_oneof![
            Just(EdgeTrigger::Rising),
            Just(EdgeTrigger::Falling),
            Just(EdgeTrigger::Both),
        ],
        levels in proptest::collection::vec(any::<bool>(), 0..64),
    ) {
        let mut registry = common::default_registry();
        let mut pin = registry.gpio("GPIOA1").unwrap();
        pin.init().unwrap();
        let seen = Rc::new(RefCell::new(0u32));
        let sink = seen.clone();
        pin.set_interrupt(trigger, Some(Box::new(move |_| *sink.borrow_mut() += 1)))
            .unwrap();

        let mut last = PinLevel::Low;
        let mut want = 0u32;
        for high in levels {
            let level = PinLevel::from(high);
            if trigger.fires(last, level) {
                want += 1;
            }
            pin.simulate_level(level).unwrap();
            last = level;
        }
        prop_assert_eq!(*seen.borrow(), want);
        prop_assert_eq!(pin.trigger_count(), want);
    }

    /// Overflow count and counter depend only on total elapsed ticks, however
    /// the advance is split.
    #[test]
    fn timer_is_exact_under_any_split(
        period in 1u64..500,
        steps in proptest::collection::vec(0u64..2_000, 0..24),
    ) {
        let mut registry = common::default_registry();
        let mut timer = registry.timer("TIMER1").unwrap();
        timer.init().unwrap();
        timer.set_period(period).unwrap();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();
        timer.set_callback(Some(Box::new(move |n| sink.borrow_mut().push(n)))).unwrap();
        timer.start().unwrap();

        let total: u64 = steps.iter().sum();
        for ticks in steps {
            registry.advance_time(ticks);
        }
        let overflows = total / period;
        prop_assert_eq!(timer.overflow_count().unwrap(), overflows);
        prop_assert_eq!(timer.counter().unwrap(), total % period);
        let expected: Vec<u64> = (1..=overflows).collect();
        prop_assert_eq!(&*fired.borrow(), &expected);
    }

    /// A one-shot timer overflows once, when the first period elapses, and
    /// then stops counting.
    #[test]
    fn one_shot_overflows_at_most_once(
        period in 1u64..100,
        steps in proptest::collection::vec(0u64..300, 1..8),
    ) {
        let mut registry = Registry::default();
        registry
            .register(
                DeviceDescriptor::new(hal::DeviceKind::Timer, 0)
                    .unwrap()
                    .with_config(DeviceConfig::Timer(TimerConfig { period, mode: TimerMode::OneShot })),
            )
            .unwrap();
        let mut timer = registry.timer("TIMER0").unwrap();
        timer.init().unwrap();
        timer.start().unwrap();
        let total: u64 = steps.iter().sum();
        for ticks in steps {
            registry.advance_time(ticks);
        }
        let expired = total >= period;
        prop_assert_eq!(timer.overflow_count().unwrap(), u64::from(expired));
        prop_assert_eq!(timer.is_running(), !expired);
        if !expired {
            prop_assert_eq!(timer.counter().unwrap(), total);
        }
    }

    /// Accumulating in chunks gives the same CRC as one-shot computation.
    #[test]
    fn crc_chunking_is_transparent(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        split in any::<prop::sample::Index>(),
    ) {
        let mut registry = common::default_registry();
        let mut crc = registry.crc("CRC0").unwrap();
        crc.init().unwrap();
        let whole = crc.compute(&data).unwrap();
        prop_assert_eq!(whole, crc32fast::hash(&data));

        let at = split.index(data.len() + 1);
        crc.reset().unwrap();
        crc.accumulate(&data[..at]).unwrap();
        let chunked = crc.accumulate(&data[at..]).unwrap();
        prop_assert_eq!(chunked, whole);
        prop_assert_eq!(crc.value().unwrap(), whole);
    }
}

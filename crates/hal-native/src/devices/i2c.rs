//! Simulated I2C controller.
//!
//! Targets are attached by address from tests. Each target has its own pair of
//! rings: what the controller wrote to it, and what it will answer with. A
//! transaction to an address with no target behaves like a NACK.

use std::collections::BTreeMap;

use hal::{DeviceKind, HalError, HalResult, I2c, I2cConfig, TransferStats, I2C_MAX_ADDRESS};

use super::link::Link;
use crate::native::{Model, Native};

/// I2C controller data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cState {
    config: I2cConfig,
    targets: BTreeMap<u8, Link>,
    stats: TransferStats,
}

fn validate(config: &I2cConfig) -> HalResult<()> {
    if config.frequency == 0 || config.buffer_size == 0 {
        return Err(HalError::InvalidArgument);
    }
    Ok(())
}

fn check_address(address: u8) -> HalResult<()> {
    if address > I2C_MAX_ADDRESS {
        return Err(HalError::InvalidArgument);
    }
    Ok(())
}

impl I2cState {
    /// Look up the target at `address`, counting a NACK when absent.
    fn target(&mut self, address: u8) -> HalResult<&mut Link> {
        check_address(address)?;
        match self.targets.get_mut(&address) {
            Some(link) => Ok(link),
            None => {
                self.stats.errors = self.stats.errors.saturating_add(1);
                tracing::debug!(address, "i2c nack");
                Err(HalError::NotFound)
            }
        }
    }

    fn write_to(&mut self, address: u8, data: &[u8]) -> HalResult<()> {
        let link = self.target(address)?;
        // a target's RX ring is its view of what the controller sent
        let accepted = link.inject(data);
        let dropped = data.len().saturating_sub(accepted) as u64;
        self.stats.bytes_tx = self.stats.bytes_tx.saturating_add(accepted as u64);
        self.stats.overflows = self.stats.overflows.saturating_add(dropped);
        Ok(())
    }

    fn read_from(&mut self, address: u8, buf: &mut [u8]) -> HalResult<()> {
        let link = self.target(address)?;
        // and its TX ring is what it answers with
        let taken = link.tx.read(buf);
        for slot in buf.iter_mut().skip(taken) {
            *slot = hal::SPI_IDLE_BYTE;
        }
        self.stats.bytes_rx = self.stats.bytes_rx.saturating_add(buf.len() as u64);
        Ok(())
    }
}

impl Model for I2cState {
    const KIND: DeviceKind = DeviceKind::I2c;
    type Config = I2cConfig;
    type Hooks = ();

    fn power_on(config: &I2cConfig) -> Self {
        Self {
            config: *config,
            targets: BTreeMap::new(),
            stats: TransferStats::default(),
        }
    }

    fn on_init(&mut self, config: &I2cConfig) -> HalResult<()> {
        validate(config)?;
        self.config = *config;
        for link in self.targets.values_mut() {
            link.reset_buffers(config.buffer_size, config.buffer_size);
        }
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        self.targets.values().all(Link::is_consistent)
    }
}

/// Simulated I2C controller handle.
pub type NativeI2c = Native<I2cState>;

impl NativeI2c {
    // ── Test support ─────────────────────────────────────────────────────

    /// Attach a target at `address`. Re-attaching empties its buffers.
    pub fn attach_target(&self, address: u8) -> HalResult<()> {
        check_address(address)?;
        self.poke(|core| {
            let size = core.data.config.buffer_size;
            core.data.targets.insert(address, Link::new(size, size));
        });
        Ok(())
    }

    /// Detach the target at `address`; later transactions to it NACK.
    pub fn detach_target(&self, address: u8) -> bool {
        self.poke(|core| core.data.targets.remove(&address).is_some())
    }

    /// Queue bytes the target at `address` answers reads with.
    pub fn inject_rx(&self, address: u8, data: &[u8]) -> HalResult<usize> {
        self.poke(|core| {
            let link = core
                .data
                .targets
                .get_mut(&address)
                .ok_or(HalError::NotFound)?;
            Ok(link.send(data))
        })
    }

    /// Drain everything the controller wrote to the target at `address`.
    pub fn capture_tx(&self, address: u8) -> HalResult<Vec<u8>> {
        self.poke(|core| {
            let link = core
                .data
                .targets
                .get_mut(&address)
                .ok_or(HalError::NotFound)?;
            Ok(link.rx.drain_all())
        })
    }
}

impl I2c for NativeI2c {
    fn configure(&mut self, config: I2cConfig) -> HalResult<()> {
        validate(&config)?;
        self.running_mut(|state, _| {
            for link in state.targets.values_mut() {
                link.resize(config.buffer_size, config.buffer_size);
            }
            state.config = config;
            Ok(())
        })
    }

    fn config(&self) -> I2cConfig {
        self.peek(|core| core.data.config)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> HalResult<()> {
        self.running_mut(|state, _| state.write_to(address, data))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult<()> {
        self.running_mut(|state, _| state.read_from(address, buf))
    }

    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.write_to(address, write)?;
            state.read_from(address, read)
        })
    }

    fn stats(&self) -> TransferStats {
        self.peek(|core| core.data.stats)
    }
}

// ── embedded-hal ─────────────────────────────────────────────────────────────

impl embedded_hal::i2c::ErrorType for NativeI2c {
    type Error = HalError;
}

impl embedded_hal::i2c::I2c for NativeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        use embedded_hal::i2c::Operation;
        self.running_mut(|state, _| {
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(data) => state.write_to(address, data)?,
                    Operation::Read(buf) => state.read_from(address, buf)?,
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use hal::{DeviceName, Lifecycle};

    const SENSOR: u8 = 0x48;

    fn bus() -> NativeI2c {
        let mut b = NativeI2c::build(DeviceName::new("I2C0").unwrap(), 0, I2cConfig::default(), true);
        b.init().unwrap();
        b.attach_target(SENSOR).unwrap();
        b
    }

    #[test]
    fn write_reaches_target() {
        let mut b = bus();
        I2c::write(&mut b, SENSOR, &[0x01, 0x60]).unwrap();
        assert_eq!(b.capture_tx(SENSOR).unwrap(), [0x01, 0x60]);
        assert_eq!(b.stats().bytes_tx, 2);
    }

    #[test]
    fn write_read_returns_register_value() {
        let mut b = bus();
        b.inject_rx(SENSOR, &[0x19, 0x80]).unwrap();
        let mut buf = [0u8; 2];
        b.write_read(SENSOR, &[0x00], &mut buf).unwrap();
        assert_eq!(buf, [0x19, 0x80]);
    }

    #[test]
    fn read_pads_with_idle_bytes() {
        let mut b = bus();
        b.inject_rx(SENSOR, &[0x42]).unwrap();
        let mut buf = [0u8; 3];
        I2c::read(&mut b, SENSOR, &mut buf).unwrap();
        assert_eq!(buf, [0x42, 0xFF, 0xFF]);
    }

    #[test]
    fn missing_target_nacks_and_counts_error() {
        let mut b = bus();
        assert_eq!(I2c::write(&mut b, 0x50, &[1]), Err(HalError::NotFound));
        assert_eq!(b.stats().errors, 1);
        assert!(b.detach_target(SENSOR));
        assert_eq!(I2c::write(&mut b, SENSOR, &[1]), Err(HalError::NotFound));
        assert_eq!(b.stats().errors, 2);
    }

    #[test]
    fn ten_bit_addresses_are_rejected() {
        let mut b = bus();
        assert_eq!(I2c::write(&mut b, 0x80, &[1]), Err(HalError::InvalidArgument));
        assert_eq!(b.attach_target(0xFF), Err(HalError::InvalidArgument));
        assert_eq!(b.stats().errors, 0);
    }

    #[test]
    fn embedded_hal_transaction() {
        use embedded_hal::i2c::{I2c as _, Operation};
        let mut b = bus();
        b.inject_rx(SENSOR, &[0xAA]).unwrap();
        let mut read = [0u8; 1];
        b.transaction(SENSOR, &mut [Operation::Write(&[0x0F]), Operation::Read(&mut read)])
            .unwrap();
        assert_eq!(read, [0xAA]);
        assert_eq!(b.capture_tx(SENSOR).unwrap(), [0x0F]);
    }
}

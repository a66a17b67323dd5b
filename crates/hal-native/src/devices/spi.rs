//! Simulated SPI controller.
//!
//! MOSI bytes land in the TX ring; MISO bytes come from the RX ring, which
//! tests fill with `inject_rx`. A full-duplex transfer that runs out of
//! injected bytes clocks in the idle byte.

use hal::{DeviceKind, HalError, HalResult, Spi, SpiConfig, TransferStats};

use super::link::{Link, IDLE_BYTE};
use crate::native::{Model, Native};

/// SPI controller data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiState {
    config: SpiConfig,
    link: Link,
}

fn validate(config: &SpiConfig) -> HalResult<()> {
    if config.frequency == 0 || config.buffer_size == 0 {
        return Err(HalError::InvalidArgument);
    }
    Ok(())
}

impl Model for SpiState {
    const KIND: DeviceKind = DeviceKind::Spi;
    type Config = SpiConfig;
    type Hooks = ();

    fn power_on(config: &SpiConfig) -> Self {
        Self {
            config: *config,
            link: Link::new(config.buffer_size, config.buffer_size),
        }
    }

    fn on_init(&mut self, config: &SpiConfig) -> HalResult<()> {
        validate(config)?;
        self.config = *config;
        self.link.reset_buffers(config.buffer_size, config.buffer_size);
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        self.link.is_consistent()
    }
}

/// Simulated SPI controller handle.
pub type NativeSpi = Native<SpiState>;

impl NativeSpi {
    // ── Test support ─────────────────────────────────────────────────────

    /// Queue bytes the target will shift out on MISO.
    pub fn inject_rx(&self, data: &[u8]) -> usize {
        self.poke(|core| core.data.link.inject(data))
    }

    /// Drain up to `buf.len()` bytes shifted out on MOSI.
    pub fn capture_tx(&self, buf: &mut [u8]) -> usize {
        self.poke(|core| core.data.link.tx.read(buf))
    }

    /// Drain everything shifted out on MOSI.
    pub fn take_tx(&self) -> Vec<u8> {
        self.poke(|core| core.data.link.tx.drain_all())
    }
}

impl Spi for NativeSpi {
    fn configure(&mut self, config: SpiConfig) -> HalResult<()> {
        validate(&config)?;
        self.running_mut(|state, _| {
            state.link.resize(config.buffer_size, config.buffer_size);
            state.config = config;
            Ok(())
        })
    }

    fn config(&self) -> SpiConfig {
        self.peek(|core| core.data.config)
    }

    fn write(&mut self, data: &[u8]) -> HalResult<usize> {
        self.running_mut(|state, _| Ok(state.link.send(data)))
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize> {
        self.running_mut(|state, _| Ok(state.link.recv(buf)))
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> HalResult<()> {
        if tx.len() != rx.len() {
            return Err(HalError::InvalidArgument);
        }
        self.running_mut(|state, _| {
            state.link.send(tx);
            state.link.clock_in(rx);
            Ok(())
        })
    }

    fn stats(&self) -> TransferStats {
        self.peek(|core| core.data.link.stats)
    }
}

// ── embedded-hal ─────────────────────────────────────────────────────────────

impl embedded_hal::spi::ErrorType for NativeSpi {
    type Error = HalError;
}

impl embedded_hal::spi::SpiBus for NativeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.running_mut(|state, _| {
            state.link.clock_in(words);
            Ok(())
        })
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        Spi::write(self, words).map(|_| ())
    }

    /// Clocks `max(read.len(), write.len())` bytes; a short `write` is padded
    /// with the idle byte, surplus MISO bytes beyond `read` are discarded.
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.running_mut(|state, _| {
            state.link.send(write);
            let padding = read.len().saturating_sub(write.len());
            state.link.send(&vec![IDLE_BYTE; padding]);
            state.link.clock_in(read);
            let surplus = write.len().saturating_sub(read.len());
            let mut scratch = [0u8; 1];
            for _ in 0..surplus {
                state.link.recv(&mut scratch);
            }
            Ok(())
        })
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.running_mut(|state, _| {
            state.link.send(words);
            state.link.clock_in(words);
            Ok(())
        })
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.running(|_, _| Ok(()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use hal::{DeviceName, Lifecycle, SPI_IDLE_BYTE};

    fn spi() -> NativeSpi {
        let mut s = NativeSpi::build(
            DeviceName::new("SPI1").unwrap(),
            1,
            SpiConfig {
                buffer_size: 8,
                ..SpiConfig::default()
            },
            true,
        );
        s.init().unwrap();
        s
    }

    #[test]
    fn transfer_pads_missing_miso_with_idle_byte() {
        let mut s = spi();
        s.inject_rx(&[0x11, 0x22]);
        let mut rx = [0u8; 4];
        s.transfer(&[1, 2, 3, 4], &mut rx).unwrap();
        assert_eq!(rx, [0x11, 0x22, SPI_IDLE_BYTE, SPI_IDLE_BYTE]);
        assert_eq!(s.take_tx(), [1, 2, 3, 4]);
    }

    #[test]
    fn transfer_rejects_unequal_lengths() {
        let mut s = spi();
        let mut rx = [0u8; 2];
        assert_eq!(s.transfer(&[1, 2, 3], &mut rx), Err(HalError::InvalidArgument));
        assert_eq!(s.stats().bytes_tx, 0);
    }

    #[test]
    fn half_duplex_read_is_partial() {
        let mut s = spi();
        s.inject_rx(&[7]);
        let mut buf = [0u8; 3];
        assert_eq!(Spi::read(&mut s, &mut buf).unwrap(), 1);
        assert_eq!(buf[0], 7);
    }

    #[test]
    fn configure_rejects_zero_frequency() {
        let mut s = spi();
        let bad = SpiConfig {
            frequency: 0,
            ..SpiConfig::default()
        };
        assert_eq!(s.configure(bad), Err(HalError::InvalidArgument));
    }

    #[test]
    fn uninitialized_controller_rejects_transfers() {
        let mut s = NativeSpi::build(DeviceName::new("SPI0").unwrap(), 0, SpiConfig::default(), true);
        assert_eq!(Spi::write(&mut s, &[1]), Err(HalError::NotInitialized));
    }

    #[test]
    fn spi_bus_transfer_in_place() {
        use embedded_hal::spi::SpiBus;
        let mut s = spi();
        s.inject_rx(&[0xA5]);
        let mut words = [0x01, 0x02];
        s.transfer_in_place(&mut words).unwrap();
        assert_eq!(words, [0xA5, SPI_IDLE_BYTE]);
        assert_eq!(s.take_tx(), [0x01, 0x02]);
    }

    #[test]
    fn spi_bus_transfer_with_short_write() {
        use embedded_hal::spi::SpiBus;
        let mut s = spi();
        s.inject_rx(&[1, 2, 3]);
        let mut read = [0u8; 3];
        SpiBus::transfer(&mut s, &mut read, &[0x9F]).unwrap();
        assert_eq!(read, [1, 2, 3]);
        assert_eq!(s.take_tx(), [0x9F, SPI_IDLE_BYTE, SPI_IDLE_BYTE]);
    }
}

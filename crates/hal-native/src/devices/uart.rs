//! Simulated UART.
//!
//! Two rings stand in for the wire: firmware writes land in TX (drained by
//! tests with `capture_tx`/`take_tx`), and test input injected into RX is what
//! firmware reads. `send`/`receive` are all-or-nothing; with nothing to wait
//! for, a timeout resolves immediately.

use hal::{DeviceKind, HalError, HalResult, TransferStats, Uart, UartConfig};

use super::link::Link;
use crate::native::{Model, Native};

/// UART data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UartState {
    config: UartConfig,
    link: Link,
}

impl Model for UartState {
    const KIND: DeviceKind = DeviceKind::Uart;
    type Config = UartConfig;
    type Hooks = ();

    fn power_on(config: &UartConfig) -> Self {
        Self {
            config: *config,
            link: Link::new(config.tx_buffer_size, config.rx_buffer_size),
        }
    }

    fn on_init(&mut self, config: &UartConfig) -> HalResult<()> {
        if !config.is_valid() {
            return Err(HalError::InvalidArgument);
        }
        self.config = *config;
        self.link
            .reset_buffers(config.tx_buffer_size, config.rx_buffer_size);
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        self.link.is_consistent()
    }
}

/// Simulated UART handle.
pub type NativeUart = Native<UartState>;

impl NativeUart {
    // ── Test support ─────────────────────────────────────────────────────

    /// Feed bytes into RX as if received on the wire. Returns bytes accepted;
    /// the excess is dropped and counted as overflow.
    pub fn inject_rx(&self, data: &[u8]) -> usize {
        self.poke(|core| core.data.link.inject(data))
    }

    /// Drain up to `buf.len()` transmitted bytes.
    pub fn capture_tx(&self, buf: &mut [u8]) -> usize {
        self.poke(|core| core.data.link.tx.read(buf))
    }

    /// Drain everything transmitted so far.
    pub fn take_tx(&self) -> Vec<u8> {
        self.poke(|core| core.data.link.tx.drain_all())
    }
}

impl Uart for NativeUart {
    fn configure(&mut self, config: UartConfig) -> HalResult<()> {
        if !config.is_valid() {
            return Err(HalError::InvalidArgument);
        }
        self.running_mut(|data, _| {
            data.link
                .resize(config.tx_buffer_size, config.rx_buffer_size);
            data.config = config;
            Ok(())
        })
    }

    fn config(&self) -> UartConfig {
        self.peek(|core| core.data.config)
    }

    fn write(&mut self, data: &[u8]) -> HalResult<usize> {
        self.running_mut(|state, _| Ok(state.link.send(data)))
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize> {
        self.running_mut(|state, _| Ok(state.link.recv(buf)))
    }

    fn send(&mut self, data: &[u8], timeout_ms: u32) -> HalResult<()> {
        self.running_mut(|state, _| {
            if state.link.tx.free() < data.len() {
                state.link.count_timeout();
                tracing::warn!(len = data.len(), timeout_ms, "uart send timed out");
                return Err(HalError::Timeout);
            }
            state.link.send(data);
            Ok(())
        })
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> HalResult<()> {
        self.running_mut(|state, _| {
            if state.link.rx.len() < buf.len() {
                state.link.count_timeout();
                tracing::warn!(len = buf.len(), timeout_ms, "uart receive timed out");
                return Err(HalError::Timeout);
            }
            state.link.recv(buf);
            Ok(())
        })
    }

    fn rx_available(&self) -> HalResult<usize> {
        self.running(|state, _| Ok(state.link.rx.len()))
    }

    fn tx_pending(&self) -> HalResult<usize> {
        self.running(|state, _| Ok(state.link.tx.len()))
    }

    fn flush_rx(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            state.link.rx.clear();
            Ok(())
        })
    }

    fn stats(&self) -> TransferStats {
        self.peek(|core| core.data.link.stats)
    }
}

// ── embedded-io ──────────────────────────────────────────────────────────────

impl embedded_io::ErrorType for NativeUart {
    type Error = HalError;
}

impl embedded_io::Read for NativeUart {
    /// Never blocks: an empty RX ring is a [`HalError::Timeout`].
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        match Uart::read(self, buf)? {
            0 => Err(HalError::Timeout),
            n => Ok(n),
        }
    }
}

impl embedded_io::Write for NativeUart {
    /// Queues what fits without dropping; a full TX ring is a
    /// [`HalError::Timeout`].
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.running_mut(|state, _| {
            let fit = state.link.tx.free().min(buf.len());
            if fit == 0 {
                state.link.count_timeout();
                return Err(HalError::Timeout);
            }
            Ok(state.link.send(buf.get(..fit).unwrap_or_default()))
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
    use hal::{DeviceName, Lifecycle};

    fn uart(capacity: usize) -> NativeUart {
        let config = UartConfig {
            tx_buffer_size: capacity,
            rx_buffer_size: capacity,
            ..UartConfig::default()
        };
        let mut u = NativeUart::build(DeviceName::new("UART0").unwrap(), 0, config, true);
        u.init().unwrap();
        u
    }

    #[test]
    fn write_is_partial_and_counts_overflow() {
        let mut u = uart(4);
        assert_eq!(Uart::write(&mut u, b"abcdef").unwrap(), 4);
        assert_eq!(u.stats().overflows, 2);
        assert_eq!(u.stats().bytes_tx, 4);
        assert_eq!(u.take_tx(), b"abcd");
    }

    #[test]
    fn send_is_all_or_nothing() {
        let mut u = uart(4);
        assert_eq!(u.send(b"abcdef", 10), Err(HalError::Timeout));
        assert_eq!(u.tx_pending().unwrap(), 0);
        assert_eq!(u.stats().timeouts, 1);
        u.send(b"abcd", 10).unwrap();
        assert_eq!(u.tx_pending().unwrap(), 4);
    }

    #[test]
    fn receive_leaves_rx_untouched_on_timeout() {
        let mut u = uart(8);
        u.inject_rx(b"hi");
        let mut buf = [0u8; 3];
        assert_eq!(u.receive(&mut buf, 5), Err(HalError::Timeout));
        assert_eq!(u.rx_available().unwrap(), 2);
        let mut two = [0u8; 2];
        u.receive(&mut two, 5).unwrap();
        assert_eq!(&two, b"hi");
    }

    #[test]
    fn injected_bytes_arrive_in_order() {
        let mut u = uart(16);
        u.inject_rx(b"hel");
        u.inject_rx(b"lo");
        let mut buf = [0u8; 8];
        let n = Uart::read(&mut u, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
        assert_eq!(u.stats().bytes_rx, 5);
    }

    #[test]
    fn flush_rx_discards() {
        let mut u = uart(8);
        u.inject_rx(b"junk");
        u.flush_rx().unwrap();
        assert_eq!(u.rx_available().unwrap(), 0);
    }

    #[test]
    fn configure_rejects_zero_baud_and_keeps_data() {
        let mut u = uart(8);
        u.inject_rx(b"abc");
        let bad = UartConfig {
            baud_rate: 0,
            ..UartConfig::default()
        };
        assert_eq!(u.configure(bad), Err(HalError::InvalidArgument));
        let good = UartConfig {
            baud_rate: 9600,
            ..UartConfig::default()
        };
        u.configure(good).unwrap();
        assert_eq!(u.config().baud_rate, 9600);
        assert_eq!(u.rx_available().unwrap(), 3);
    }

    #[test]
    fn suspended_uart_rejects_io_but_keeps_buffers() {
        let mut u = uart(8);
        u.inject_rx(b"abc");
        u.suspend().unwrap();
        assert_eq!(u.rx_available(), Err(HalError::InvalidState));
        u.resume().unwrap();
        assert_eq!(u.rx_available().unwrap(), 3);
    }

    #[test]
    fn embedded_io_read_write() {
        use embedded_io::{Read, Write};
        let mut u = uart(4);
        assert_eq!(Write::write(&mut u, b"abcdef").unwrap(), 4);
        assert_eq!(u.stats().overflows, 0);
        assert_eq!(Write::write(&mut u, b"x"), Err(HalError::Timeout));
        let mut buf = [0u8; 4];
        assert_eq!(Read::read(&mut u, &mut buf), Err(HalError::Timeout));
        u.inject_rx(b"ok");
        assert_eq!(Read::read(&mut u, &mut buf).unwrap(), 2);
    }
}

//! Simulated USB device with a single bulk pipe.
//!
//! The host side is driven from tests with `host_send`/`host_receive`. Data
//! only moves while the device is attached.

use hal::{DeviceKind, HalError, HalResult, TransferStats, Usb, UsbConfig};

use super::link::Link;
use crate::native::{Model, Native};

/// USB device data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbState {
    connected: bool,
    link: Link,
}

impl UsbState {
    fn ensure_connected(&self) -> HalResult<()> {
        if !self.connected {
            return Err(HalError::InvalidState);
        }
        Ok(())
    }
}

impl Model for UsbState {
    const KIND: DeviceKind = DeviceKind::Usb;
    type Config = UsbConfig;
    type Hooks = ();

    fn power_on(config: &UsbConfig) -> Self {
        Self {
            connected: false,
            link: Link::new(config.buffer_size, config.buffer_size),
        }
    }

    fn on_init(&mut self, config: &UsbConfig) -> HalResult<()> {
        if config.buffer_size == 0 {
            return Err(HalError::InvalidArgument);
        }
        self.connected = false;
        self.link.reset_buffers(config.buffer_size, config.buffer_size);
        Ok(())
    }

    fn on_deinit(&mut self) {
        self.connected = false;
    }

    fn is_consistent(&self) -> bool {
        self.link.is_consistent()
    }
}

/// Simulated USB device handle.
pub type NativeUsb = Native<UsbState>;

impl NativeUsb {
    // ── Test support ─────────────────────────────────────────────────────

    /// Host → device. Returns bytes accepted; 0 while detached.
    pub fn host_send(&self, data: &[u8]) -> usize {
        self.poke(|core| {
            if !core.data.connected {
                return 0;
            }
            core.data.link.inject(data)
        })
    }

    /// Device → host: drain everything the device queued.
    pub fn host_receive(&self) -> Vec<u8> {
        self.poke(|core| core.data.link.tx.drain_all())
    }
}

impl Usb for NativeUsb {
    fn connect(&mut self) -> HalResult<()> {
        let config = self.construction_config();
        self.running_mut(|state, _| {
            if !state.connected {
                state.connected = true;
                tracing::debug!(
                    vid = config.vendor_id,
                    pid = config.product_id,
                    "usb attached"
                );
            }
            Ok(())
        })
    }

    fn disconnect(&mut self) -> HalResult<()> {
        self.running_mut(|state, _| {
            if state.connected {
                state.connected = false;
                tracing::debug!("usb detached");
            }
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.peek(|core| core.data.connected)
    }

    fn write(&mut self, data: &[u8]) -> HalResult<usize> {
        self.running_mut(|state, _| {
            state.ensure_connected()?;
            Ok(state.link.send(data))
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize> {
        self.running_mut(|state, _| {
            state.ensure_connected()?;
            Ok(state.link.recv(buf))
        })
    }

    fn stats(&self) -> TransferStats {
        self.peek(|core| core.data.link.stats)
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

    fn usb() -> NativeUsb {
        let mut u = NativeUsb::build(DeviceName::new("USB0").unwrap(), 0, UsbConfig::default(), true);
        u.init().unwrap();
        u
    }

    #[test]
    fn io_requires_connection() {
        let mut u = usb();
        assert_eq!(u.write(b"x"), Err(HalError::InvalidState));
        assert_eq!(u.host_send(b"x"), 0);
        u.connect().unwrap();
        assert_eq!(u.write(b"hello").unwrap(), 5);
        assert_eq!(u.host_receive(), b"hello");
    }

    #[test]
    fn host_data_reaches_device() {
        let mut u = usb();
        u.connect().unwrap();
        assert_eq!(u.host_send(b"cmd"), 3);
        let mut buf = [0u8; 8];
        assert_eq!(u.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"cmd");
    }

    #[test]
    fn deinit_detaches() {
        let mut u = usb();
        u.connect().unwrap();
        u.deinit().unwrap();
        assert!(!u.is_connected());
    }

    #[test]
    fn connect_is_idempotent() {
        let mut u = usb();
        u.connect().unwrap();
        u.connect().unwrap();
        assert!(u.is_connected());
        u.disconnect().unwrap();
        u.disconnect().unwrap();
        assert!(!u.is_connected());
    }
}

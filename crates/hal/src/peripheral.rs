//! Byte-transport capabilities (UART, SPI, I2C, USB).
//!
//! Wire protocols are out of scope; these roles expose the buffered byte
//! paths a driver sees. Timeouts are explicit parameters; a backend that
//! cannot wait resolves them immediately.

use crate::error::HalResult;

/// Default TX/RX ring capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Diagnostic counters kept by every transport. Read-only to drivers;
/// cleared only by a power-on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferStats {
    /// Bytes accepted into the TX path
    pub bytes_tx: u64,
    /// Bytes handed out of the RX path
    pub bytes_rx: u64,
    /// Bytes dropped because a ring was full
    pub overflows: u64,
    /// Failed transfers (NACK, protocol faults)
    pub errors: u32,
    /// Synchronous transfers that timed out
    pub timeouts: u32,
}

// ── UART ─────────────────────────────────────────────────────────────────────

/// UART role.
pub trait Uart {
    /// Apply a new line configuration. Buffered data is kept.
    fn configure(&mut self, config: UartConfig) -> HalResult<()>;

    /// Current configuration.
    fn config(&self) -> UartConfig;

    /// Queue as many bytes as fit; returns how many were accepted.
    /// The excess is dropped and counted in [`TransferStats::overflows`].
    fn write(&mut self, data: &[u8]) -> HalResult<usize>;

    /// Take up to `buf.len()` received bytes in FIFO order.
    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize>;

    /// Queue the whole frame or nothing; [`HalError::Timeout`](crate::HalError::Timeout)
    /// if it cannot be queued within `timeout_ms`.
    fn send(&mut self, data: &[u8], timeout_ms: u32) -> HalResult<()>;

    /// Fill `buf` completely or take nothing; `Timeout` if not enough bytes
    /// arrive within `timeout_ms`.
    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> HalResult<()>;

    /// Bytes waiting in the RX path.
    fn rx_available(&self) -> HalResult<usize>;

    /// Bytes queued in the TX path and not yet transmitted.
    fn tx_pending(&self) -> HalResult<usize>;

    /// Discard everything in the RX path.
    fn flush_rx(&mut self) -> HalResult<()>;

    /// Diagnostic counters.
    fn stats(&self) -> TransferStats;
}

/// UART configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits
    pub data_bits: DataBits,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// TX ring capacity in bytes
    pub tx_buffer_size: usize,
    /// RX ring capacity in bytes
    pub rx_buffer_size: usize,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            tx_buffer_size: DEFAULT_BUFFER_SIZE,
            rx_buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl UartConfig {
    /// Line parameters are sane and both rings have capacity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.baud_rate > 0 && self.tx_buffer_size > 0 && self.rx_buffer_size > 0
    }
}

/// Data bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    /// 7 data bits
    Seven,
    /// 8 data bits
    Eight,
    /// 9 data bits
    Nine,
}

/// Parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// No parity
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// Stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// 1 stop bit
    One,
    /// 2 stop bits
    Two,
}

// ── SPI ──────────────────────────────────────────────────────────────────────

/// Byte clocked in when the RX path has nothing buffered (MISO idles high).
pub const SPI_IDLE_BYTE: u8 = 0xFF;

/// SPI controller role.
pub trait Spi {
    /// Apply a new bus configuration.
    fn configure(&mut self, config: SpiConfig) -> HalResult<()>;

    /// Current configuration.
    fn config(&self) -> SpiConfig;

    /// Half-duplex write; returns bytes accepted.
    fn write(&mut self, data: &[u8]) -> HalResult<usize>;

    /// Half-duplex read; returns bytes taken from the RX path.
    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize>;

    /// Full-duplex transfer. `tx` and `rx` must have equal length.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> HalResult<()>;

    /// Diagnostic counters.
    fn stats(&self) -> TransferStats;
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// SPI mode (CPOL, CPHA)
    pub mode: SpiMode,
    /// Bit order
    pub bit_order: BitOrder,
    /// Ring capacity (each direction) in bytes
    pub buffer_size: usize,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            frequency: 1_000_000,
            mode: SpiMode::Mode0,
            bit_order: BitOrder::MsbFirst,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// SPI modes (CPOL, CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

/// Bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

// ── I2C ──────────────────────────────────────────────────────────────────────

/// Highest 7-bit target address.
pub const I2C_MAX_ADDRESS: u8 = 0x7F;

/// I2C controller role.
pub trait I2c {
    /// Apply a new bus configuration.
    fn configure(&mut self, config: I2cConfig) -> HalResult<()>;

    /// Current configuration.
    fn config(&self) -> I2cConfig;

    /// Write `data` to the target at `address`.
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult<()>;

    /// Read `buf.len()` bytes from the target at `address`.
    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult<()>;

    /// Write then read with a repeated start.
    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> HalResult<()>;

    /// Diagnostic counters.
    fn stats(&self) -> TransferStats;
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Ring capacity (each direction) in bytes
    pub buffer_size: usize,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

// ── USB ──────────────────────────────────────────────────────────────────────

/// USB device role (single bulk pipe).
pub trait Usb {
    /// Attach to the bus (pull-up on D+).
    fn connect(&mut self) -> HalResult<()>;

    /// Detach from the bus.
    fn disconnect(&mut self) -> HalResult<()>;

    /// `true` while attached.
    fn is_connected(&self) -> bool;

    /// Queue bytes for the host; returns bytes accepted.
    fn write(&mut self, data: &[u8]) -> HalResult<usize>;

    /// Take bytes sent by the host.
    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize>;

    /// Diagnostic counters.
    fn stats(&self) -> TransferStats;
}

/// USB device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbConfig {
    /// idVendor
    pub vendor_id: u16,
    /// idProduct
    pub product_id: u16,
    /// Ring capacity (each direction) in bytes
    pub buffer_size: usize,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_id: 0x1209,
            product_id: 0x0001,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

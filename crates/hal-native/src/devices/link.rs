//! TX/RX ring pair with transfer statistics, shared by the byte transports.

use hal::TransferStats;

use crate::engine::RingBuffer;

/// Byte clocked in when nothing is buffered (bus idles high).
pub(crate) const IDLE_BYTE: u8 = hal::SPI_IDLE_BYTE;

/// Device-side view of a byte link: TX is what firmware sent, RX is what the
/// far end sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub(crate) tx: RingBuffer,
    pub(crate) rx: RingBuffer,
    pub(crate) stats: TransferStats,
}

impl Link {
    pub(crate) fn new(tx_capacity: usize, rx_capacity: usize) -> Self {
        Self {
            tx: RingBuffer::new(tx_capacity),
            rx: RingBuffer::new(rx_capacity),
            stats: TransferStats::default(),
        }
    }

    /// Empty both rings at the given capacities; statistics survive.
    pub(crate) fn reset_buffers(&mut self, tx_capacity: usize, rx_capacity: usize) {
        self.tx = RingBuffer::new(tx_capacity);
        self.rx = RingBuffer::new(rx_capacity);
    }

    /// Resize both rings, keeping buffered bytes that still fit.
    pub(crate) fn resize(&mut self, tx_capacity: usize, rx_capacity: usize) {
        let before = self.tx.dropped().saturating_add(self.rx.dropped());
        self.tx = self.tx.resized(tx_capacity);
        self.rx = self.rx.resized(rx_capacity);
        let after = self.tx.dropped().saturating_add(self.rx.dropped());
        self.count_overflow(after.saturating_sub(before), "resize");
    }

    fn count_overflow(&mut self, dropped: u64, path: &'static str) {
        if dropped > 0 {
            self.stats.overflows = self.stats.overflows.saturating_add(dropped);
            tracing::warn!(path, dropped, "ring overflow, bytes dropped");
        }
    }

    /// Firmware → TX ring. Partial; the excess is dropped and counted.
    pub(crate) fn send(&mut self, data: &[u8]) -> usize {
        let accepted = self.tx.write(data);
        self.stats.bytes_tx = self.stats.bytes_tx.saturating_add(accepted as u64);
        self.count_overflow(data.len().saturating_sub(accepted) as u64, "tx");
        accepted
    }

    /// RX ring → firmware. Partial.
    pub(crate) fn recv(&mut self, buf: &mut [u8]) -> usize {
        let taken = self.rx.read(buf);
        self.stats.bytes_rx = self.stats.bytes_rx.saturating_add(taken as u64);
        taken
    }

    /// RX ring → firmware, padding whatever is missing with [`IDLE_BYTE`].
    pub(crate) fn clock_in(&mut self, buf: &mut [u8]) {
        let taken = self.rx.read(buf);
        for slot in buf.iter_mut().skip(taken) {
            *slot = IDLE_BYTE;
        }
        self.stats.bytes_rx = self.stats.bytes_rx.saturating_add(buf.len() as u64);
    }

    /// Far end → RX ring. Partial; the excess is dropped and counted.
    pub(crate) fn inject(&mut self, data: &[u8]) -> usize {
        let accepted = self.rx.write(data);
        self.count_overflow(data.len().saturating_sub(accepted) as u64, "rx");
        accepted
    }

    pub(crate) fn count_timeout(&mut self) {
        self.stats.timeouts = self.stats.timeouts.saturating_add(1);
    }

    pub(crate) fn count_error(&mut self) {
        self.stats.errors = self.stats.errors.saturating_add(1);
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.tx.is_consistent() && self.rx.is_consistent()
    }
}

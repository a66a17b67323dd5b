//! Fixed-capacity byte ring used for every simulated TX and RX path.
//!
//! Writes never block and never grow the buffer: whatever does not fit is
//! dropped and counted.

/// Circular byte buffer with explicit head/tail/count.
///
/// Invariants: `count <= capacity`; `head`, `tail < capacity` (or both 0 for a
/// zero-capacity ring); `count == 0` ⇔ empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingBuffer {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
    count: usize,
    dropped: u64,
}

impl RingBuffer {
    /// Empty ring holding up to `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
            dropped: 0,
        }
    }

    /// Maximum bytes held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` when nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Room left before writes start dropping.
    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity().saturating_sub(self.count)
    }

    /// Bytes dropped by writes that did not fit, over the ring's lifetime.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Copy as many bytes of `data` as fit; return how many were stored.
    #[allow(clippy::arithmetic_side_effects)] // Safety: head < capacity; +1 wraps via % capacity; count < capacity before each +1
    #[allow(clippy::indexing_slicing)] // Safety: head < capacity invariant; loop bounded by free()
    pub fn write(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free());
        let cap = self.capacity();
        for &byte in data.iter().take(accepted) {
            self.buf[self.head] = byte;
            self.head = (self.head + 1) % cap;
            self.count += 1;
        }
        let excess = data.len().saturating_sub(accepted);
        if excess > 0 {
            self.dropped = self.dropped.saturating_add(excess as u64);
            tracing::trace!(excess, capacity = cap, "ring full, bytes dropped");
        }
        accepted
    }

    /// Copy up to `out.len()` bytes out in FIFO order; return how many.
    #[allow(clippy::arithmetic_side_effects)] // Safety: tail < capacity; +1 wraps via % capacity; count > 0 before each -1
    #[allow(clippy::indexing_slicing)] // Safety: tail < capacity invariant; loop bounded by count
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let taken = out.len().min(self.count);
        let cap = self.capacity();
        for slot in out.iter_mut().take(taken) {
            *slot = self.buf[self.tail];
            self.tail = (self.tail + 1) % cap;
            self.count -= 1;
        }
        taken
    }

    /// Drain everything in FIFO order.
    pub fn drain_all(&mut self) -> Vec<u8> {
        let mut out = vec![0; self.count];
        let n = self.read(&mut out);
        out.truncate(n);
        out
    }

    /// Copy of the buffered bytes in FIFO order, without consuming them.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // Safety: index wraps via % capacity
    pub fn peek_all(&self) -> Vec<u8> {
        let cap = self.capacity();
        (0..self.count)
            .filter_map(|i| self.buf.get((self.tail + i) % cap).copied())
            .collect()
    }

    /// Discard all buffered bytes. The drop counter is kept.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Same bytes in a ring of `capacity`; the newest bytes that no longer fit
    /// are dropped and counted.
    #[must_use]
    pub fn resized(&self, capacity: usize) -> Self {
        let mut next = Self::new(capacity);
        next.dropped = self.dropped;
        next.write(&self.peek_all());
        next
    }

    /// Structural invariants hold.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let cap = self.capacity();
        if cap == 0 {
            return self.count == 0 && self.head == 0 && self.tail == 0;
        }
        self.count <= cap
            && self.head < cap
            && self.tail < cap
            && self.tail.wrapping_add(self.count).checked_rem(cap) == Some(self.head)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_across_wraparound() {
        let mut ring = RingBuffer::new(4);
        assert_eq!(ring.write(b"abc"), 3);
        let mut out = [0u8; 2];
        assert_eq!(ring.read(&mut out), 2);
        assert_eq!(&out, b"ab");
        assert_eq!(ring.write(b"def"), 3);
        assert_eq!(ring.drain_all(), b"cdef");
        assert!(ring.is_consistent());
    }

    #[test]
    fn partial_write_drops_excess_and_counts() {
        let mut ring = RingBuffer::new(3);
        assert_eq!(ring.write(b"hello"), 3);
        assert_eq!(ring.dropped(), 2);
        assert_eq!(ring.drain_all(), b"hel");
    }

    #[test]
    fn read_from_empty_returns_zero() {
        let mut ring = RingBuffer::new(8);
        let mut out = [0u8; 4];
        assert_eq!(ring.read(&mut out), 0);
    }

    #[test]
    fn zero_capacity_ring_drops_everything() {
        let mut ring = RingBuffer::new(0);
        assert_eq!(ring.write(b"x"), 0);
        assert_eq!(ring.dropped(), 1);
        assert!(ring.is_consistent());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut ring = RingBuffer::new(4);
        ring.write(b"xy");
        assert_eq!(ring.peek_all(), b"xy");
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn resize_keeps_oldest_bytes() {
        let mut ring = RingBuffer::new(8);
        ring.write(b"abcdef");
        let smaller = ring.resized(4);
        assert_eq!(smaller.peek_all(), b"abcd");
        assert_eq!(smaller.dropped(), 2);
    }
}

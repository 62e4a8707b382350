//! # Ring Buffer
//!
//! Fixed-capacity circular storage for queued tasks. When full it doubles,
//! copying the live entries into head-aligned order so FIFO order survives
//! every resize.

/// A growable circular buffer preserving FIFO order across resizes.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Creates a buffer with the given initial capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    /// Number of queued entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current slot capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Appends at the tail, doubling capacity first if full.
    pub fn push_back(&mut self, value: T) {
        if self.len == self.slots.len() {
            self.grow();
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(value);
        self.len += 1;
    }

    /// Removes and returns the oldest entry, or `None` if empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        value
    }

    /// Doubles capacity, realigning entries so the head lands on slot 0.
    fn grow(&mut self) {
        let old_capacity = self.slots.len();
        let mut slots = Vec::with_capacity(old_capacity * 2);
        slots.resize_with(old_capacity * 2, || None);
        for (i, slot) in slots.iter_mut().take(self.len).enumerate() {
            *slot = self.slots[(self.head + i) % old_capacity].take();
        }
        self.slots = slots;
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut ring = RingBuffer::with_capacity(4);
        for i in 0..4 {
            ring.push_back(i);
        }
        for i in 0..4 {
            assert_eq!(ring.pop_front(), Some(i));
        }
        assert_eq!(ring.pop_front(), None);
    }

    #[test]
    fn test_fifo_preserved_across_resize() {
        let mut ring = RingBuffer::with_capacity(2);
        // Wrap the head first so the resize has to realign.
        ring.push_back(0);
        ring.push_back(1);
        assert_eq!(ring.pop_front(), Some(0));
        ring.push_back(2);
        // Full with head at slot 1; the next push grows to capacity 4.
        ring.push_back(3);
        assert_eq!(ring.capacity(), 4);
        ring.push_back(4);
        for i in 1..=4 {
            assert_eq!(ring.pop_front(), Some(i));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn test_interleaved_push_pop() {
        let mut ring = RingBuffer::with_capacity(1);
        let mut expected = 0;
        for i in 0..50 {
            ring.push_back(i);
            if i % 3 == 0 {
                assert_eq!(ring.pop_front(), Some(expected));
                expected += 1;
            }
        }
        while let Some(v) = ring.pop_front() {
            assert_eq!(v, expected);
            expected += 1;
        }
        assert_eq!(expected, 50);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut ring = RingBuffer::with_capacity(0);
        assert_eq!(ring.capacity(), 1);
        ring.push_back(9);
        assert_eq!(ring.pop_front(), Some(9));
    }
}

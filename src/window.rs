//! Sliding-window ring buffers indexed by circular sequence distance.
//!
//! Both windows are built over a fixed slot arena plus a head offset, so
//! sliding never reallocates and "circular distance from the window base" is
//! an explicit, testable operation ([`seq_distance`]) rather than scattered
//! modulo arithmetic.
//!
//! ```text
//!   base              base+len
//!     │                  │
//! ────┼──────────────────┼──────────────────▶ seq space (mod SEQ_LEN)
//!     │ <── occupied ──▶ │ <── free ──▶
//! ```
//!
//! [`SendWindow`] holds outstanding `(packet, acked)` entries for a sender;
//! [`RecvWindow`] holds `(packet, received)` slots aligned to the next
//! sequence number a Selective Repeat receiver may deliver.

use crate::packet::Packet;

/// Circular distance from `base` to `seq` in a sequence space of `seq_len`.
///
/// Returns how many increments (mod `seq_len`) it takes to reach `seq` from
/// `base`; `0` means `seq == base`.
#[inline]
pub fn seq_distance(base: u32, seq: u32, seq_len: u32) -> u32 {
    (seq % seq_len + seq_len - base % seq_len) % seq_len
}

// ---------------------------------------------------------------------------
// SendWindow
// ---------------------------------------------------------------------------

/// A single outstanding packet occupying one sender-side window slot.
#[derive(Debug, Clone)]
pub struct SendSlot {
    /// The framed packet, kept verbatim for retransmission.
    pub packet: Packet,
    /// Whether this packet has been individually acknowledged (SR only;
    /// cumulative variants drop slots instead of marking them).
    pub acked: bool,
}

/// Bounded FIFO of outstanding packets, ordered by circular offset from the
/// window base (front = oldest unacknowledged).
#[derive(Debug)]
pub struct SendWindow {
    slots: Vec<Option<SendSlot>>,
    /// Arena index of the slot holding `base`.
    head: usize,
    /// Occupied slots, contiguous from `head`.
    len: usize,
    /// Oldest unacknowledged sequence number (left window edge).
    base: u32,
    seq_len: u32,
}

impl SendWindow {
    /// Create an empty window of `window_len` slots with the given base.
    pub fn new(window_len: usize, seq_len: u32, base: u32) -> Self {
        assert!(window_len >= 1, "window_len must be at least 1");
        assert!(
            seq_len >= 2 * window_len as u32,
            "sequence space must be at least twice the window"
        );
        Self {
            slots: vec![None; window_len],
            head: 0,
            len: 0,
            base,
            seq_len,
        }
    }

    /// Oldest unacknowledged sequence number.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Number of outstanding packets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when no further packet may enter the window.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Append a just-transmitted packet at the back of the window.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the window is already full.  Check
    /// [`is_full`](Self::is_full) before calling.
    pub fn push(&mut self, packet: Packet) {
        debug_assert!(
            !self.is_full(),
            "push on a full window ({} / {})",
            self.len,
            self.slots.len()
        );
        let idx = (self.head + self.len) % self.slots.len();
        self.slots[idx] = Some(SendSlot {
            packet,
            acked: false,
        });
        self.len += 1;
    }

    /// Window offset of `seq`, or `None` when `seq` is not an outstanding
    /// sequence number (out of window, stale, or not yet sent).
    pub fn offset_of(&self, seq: u32) -> Option<usize> {
        let d = seq_distance(self.base, seq, self.seq_len) as usize;
        (d < self.len).then_some(d)
    }

    /// The slot at a given window offset (0 = oldest).
    pub fn get(&self, offset: usize) -> Option<&SendSlot> {
        if offset >= self.len {
            return None;
        }
        let idx = (self.head + offset) % self.slots.len();
        self.slots[idx].as_ref()
    }

    /// The oldest outstanding slot.
    pub fn front(&self) -> Option<&SendSlot> {
        self.get(0)
    }

    /// Mark the slot at `offset` acknowledged.
    ///
    /// Returns `false` when the slot was already acknowledged (duplicate).
    pub fn mark_acked(&mut self, offset: usize) -> bool {
        if offset >= self.len {
            return false;
        }
        let idx = (self.head + offset) % self.slots.len();
        match self.slots[idx].as_mut() {
            Some(slot) if !slot.acked => {
                slot.acked = true;
                true
            }
            _ => false,
        }
    }

    /// Remove the oldest slot and advance the base by one sequence number.
    pub fn pop_front(&mut self) -> Option<SendSlot> {
        if self.len == 0 {
            return None;
        }
        let slot = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        self.base = (self.base + 1) % self.seq_len;
        slot
    }

    /// Iterate over outstanding slots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &SendSlot> {
        (0..self.len).filter_map(move |offset| self.get(offset))
    }
}

// ---------------------------------------------------------------------------
// RecvWindow
// ---------------------------------------------------------------------------

/// Receiver-side slot arena for Selective Repeat.
///
/// Always holds exactly `window_len` slots aligned to `base` (the next
/// sequence number to deliver); a `None` slot is a blank placeholder for a
/// not-yet-received sequence number.  Delivering the front slot recycles it
/// to the back of the window as a fresh blank.
#[derive(Debug)]
pub struct RecvWindow {
    slots: Vec<Option<Packet>>,
    head: usize,
    /// Next sequence number to deliver to the application.
    base: u32,
    seq_len: u32,
}

impl RecvWindow {
    /// Create a window of `window_len` blank slots with the given base.
    pub fn new(window_len: usize, seq_len: u32, base: u32) -> Self {
        assert!(window_len >= 1, "window_len must be at least 1");
        assert!(
            seq_len >= 2 * window_len as u32,
            "sequence space must be at least twice the window"
        );
        Self {
            slots: vec![None; window_len],
            head: 0,
            base,
            seq_len,
        }
    }

    /// Next sequence number to deliver to the application.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Window offset of `seq`, or `None` when `seq` falls outside the
    /// receive window (which includes already-delivered sequence numbers:
    /// their circular distance lands in the upper half of the space).
    pub fn offset_of(&self, seq: u32) -> Option<usize> {
        let d = seq_distance(self.base, seq, self.seq_len) as usize;
        (d < self.slots.len()).then_some(d)
    }

    /// `true` when the slot at `offset` already holds a packet.
    pub fn is_filled(&self, offset: usize) -> bool {
        let idx = (self.head + offset) % self.slots.len();
        self.slots[idx].is_some()
    }

    /// Store a received packet into the slot at `offset`.
    pub fn store(&mut self, offset: usize, packet: Packet) {
        debug_assert!(offset < self.slots.len());
        let idx = (self.head + offset) % self.slots.len();
        self.slots[idx] = Some(packet);
    }

    /// Take the front packet if its slot is filled, advancing the base and
    /// recycling the slot as a blank at the back of the window.
    pub fn pop_ready(&mut self) -> Option<Packet> {
        let packet = self.slots[self.head].take()?;
        self.head = (self.head + 1) % self.slots.len();
        self.base = (self.base + 1) % self.seq_len;
        Some(packet)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

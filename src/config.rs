//! Protocol configuration shared by every engine variant.
//!
//! The only tunable knobs are the window size and the retransmission
//! timeout.  The sequence-number space is **derived** as twice the window
//! size: with `SEQ_LEN < 2 × WINDOW_LEN` a retransmitted old packet and a
//! fresh packet one window later would carry the same sequence number, and
//! the Selective Repeat receiver could no longer tell them apart.

use std::time::Duration;

/// Tunable parameters for one sender/receiver pair.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of outstanding unacknowledged packets (N ≥ 1).
    pub window_len: usize,
    /// Retransmission timeout (virtual time in the simulator).
    pub timeout: Duration,
}

impl Config {
    /// Create a [`Config`] with an explicit window size and timeout.
    pub fn new(window_len: usize, timeout: Duration) -> Self {
        assert!(window_len >= 1, "window_len must be at least 1");
        Self {
            window_len,
            timeout,
        }
    }

    /// Size of the sequence-number space.
    ///
    /// Always `2 × window_len`; sequence numbers are in `0..seq_len()`.
    pub fn seq_len(&self) -> u32 {
        2 * self.window_len as u32
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(4, Duration::from_millis(300))
    }
}

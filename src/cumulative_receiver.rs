//! Strict in-order receive-side state machine (GBN and TCP-like).
//!
//! [`CumulativeReceiver`] accepts a packet only when it is valid **and**
//! carries exactly the next expected sequence number.  Everything else —
//! corruption, duplicates, reordered packets — triggers a resend of the
//! last ACK, which is the mechanism by which the sender's timeout-driven
//! retransmission eventually resynchronizes (and, for the TCP-like sender,
//! what makes duplicate-ACK counting meaningful).
//!
//! The same machine serves both the GBN and TCP-like variants: their
//! asymmetry lives entirely on the sender side.

use crate::config::Config;
use crate::engine::ArqReceiver;
use crate::env::{Environment, Role};
use crate::packet::{Message, Packet};

/// Cumulative, in-order-only receiver state for one endpoint.
#[derive(Debug)]
pub struct CumulativeReceiver {
    /// Next in-order sequence number expected.
    expected: u32,
    seq_len: u32,
    /// Last ACK sent, resent verbatim on every rejection.
    ///
    /// Starts as an ACK for `SEQ_LEN - 1` — "nothing received yet" — which
    /// every sender variant classifies as no new progress.
    last_ack: Packet,
}

impl CumulativeReceiver {
    pub fn new(config: &Config) -> Self {
        let seq_len = config.seq_len();
        Self {
            expected: 0,
            seq_len,
            last_ack: Packet::ack(seq_len - 1),
        }
    }
}

impl ArqReceiver for CumulativeReceiver {
    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment) {
        if packet.is_valid() && packet.seqnum == self.expected {
            log::debug!("[recv] ← DATA seq={} delivered", packet.seqnum);
            env.deliver_payload(Message {
                data: packet.payload,
            });
            self.last_ack = Packet::ack(packet.seqnum);
            env.send_packet(Role::Sender, self.last_ack);
            self.expected = (self.expected + 1) % self.seq_len;
        } else {
            if !packet.is_valid() {
                log::debug!("[recv] ← corrupted packet, resending last ACK");
            } else {
                log::debug!(
                    "[recv] ← DATA seq={} (expected {}), resending last ACK",
                    packet.seqnum,
                    self.expected
                );
            }
            env.send_packet(Role::Sender, self.last_ack);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Go-Back-N send-side state machine.
//!
//! [`GbnSender`] keeps a sliding window of up to `WINDOW_LEN` in-flight
//! packets and exactly **one** retransmission timer, keyed by the window
//! base.
//!
//! # Protocol contract
//!
//! - At most `WINDOW_LEN` packets may be outstanding; [`try_send`] rejects
//!   further messages until an ACK frees a slot.
//! - ACKs are **cumulative**: `acknum = K` acknowledges every sequence
//!   number up to and including `K`, so one ACK may slide the base past
//!   several packets at once.
//! - On timeout the sender retransmits **every** outstanding packet in
//!   window order — the defining "go back N" behavior.
//! - Sequence numbers live in `0..SEQ_LEN` with `SEQ_LEN = 2 × WINDOW_LEN`;
//!   all window positions are circular distances from the base.
//!
//! This module only manages state; transmission, timers, and delivery go
//! through the [`Environment`] capability.
//!
//! [`try_send`]: ArqSender::try_send

use std::time::Duration;

use crate::config::Config;
use crate::engine::ArqSender;
use crate::env::{Environment, Role};
use crate::packet::{Message, Packet};
use crate::window::SendWindow;

/// Go-Back-N sender state for one endpoint.
#[derive(Debug)]
pub struct GbnSender {
    /// Sequence number to assign to the next new packet.
    next_seq: u32,
    /// Outstanding packets, front = oldest unacknowledged (the base).
    window: SendWindow,
    seq_len: u32,
    timeout: Duration,
}

impl GbnSender {
    pub fn new(config: &Config) -> Self {
        Self {
            next_seq: 0,
            window: SendWindow::new(config.window_len, config.seq_len(), 0),
            seq_len: config.seq_len(),
            timeout: config.timeout,
        }
    }

    /// Oldest unacknowledged sequence number (left window edge).
    #[cfg(test)]
    pub(crate) fn base(&self) -> u32 {
        self.window.base()
    }
}

impl ArqSender for GbnSender {
    fn try_send(&mut self, message: &Message, env: &mut dyn Environment) -> bool {
        if self.window.is_full() {
            log::trace!("[gbn] window full, send rejected");
            return false;
        }

        let packet = Packet::data(self.next_seq, message.data);

        // The first packet of an otherwise-empty window arms the timer.
        if self.window.base() == self.next_seq {
            env.start_timer(Role::Sender, self.timeout, self.window.base());
        }
        env.send_packet(Role::Receiver, packet);
        self.window.push(packet);
        self.next_seq = (self.next_seq + 1) % self.seq_len;
        log::debug!(
            "[gbn] → DATA seq={} in_flight={}",
            packet.seqnum,
            self.window.len()
        );
        true
    }

    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment) {
        if !packet.is_valid() {
            log::debug!("[gbn] corrupted ACK dropped");
            return;
        }
        let Some(acknum) = packet.ack_seq() else {
            log::trace!("[gbn] non-ACK packet at sender ignored");
            return;
        };
        if self.window.is_empty() {
            // Duplicate of the final ACK; nothing outstanding, no timer.
            return;
        }

        env.stop_timer(Role::Sender, self.window.base());

        // Cumulative slide: drop everything up to and including acknum.
        // A duplicate or stale ACK maps outside the window and slides
        // nothing; the timer below is restarted either way.
        if let Some(offset) = self.window.offset_of(acknum) {
            for _ in 0..=offset {
                self.window.pop_front();
            }
            log::debug!(
                "[gbn] ← ACK ack={} base={} in_flight={}",
                acknum,
                self.window.base(),
                self.window.len()
            );
        } else {
            log::trace!("[gbn] ← duplicate ACK ack={}", acknum);
        }

        if !self.window.is_empty() {
            env.start_timer(Role::Sender, self.timeout, self.window.base());
        }
    }

    fn on_timer(&mut self, seq: u32, env: &mut dyn Environment) {
        env.stop_timer(Role::Sender, seq);
        env.start_timer(Role::Sender, self.timeout, seq);
        log::debug!(
            "[gbn] timeout seq={} — retransmitting {} packet(s)",
            seq,
            self.window.len()
        );
        for slot in self.window.iter() {
            env.send_packet(Role::Receiver, slot.packet);
        }
    }

    fn in_flight(&self) -> usize {
        self.window.len()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

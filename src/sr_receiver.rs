//! Selective Repeat receive-side state machine.
//!
//! The receiver buffers any valid packet that lands inside its window and
//! ACKs it **individually**, regardless of arrival order.  Payloads are
//! only handed to the application once the window base catches up, so
//! delivery order is decoupled from reception order while the application
//! still sees a gapless, duplicate-free, in-sequence stream.
//!
//! Rejection rules differ from the cumulative receiver in one important
//! way: a corrupted packet is dropped **silently** (no ACK at all), while a
//! valid duplicate — inside or behind the window — is re-ACKed so a sender
//! whose ACK was lost still converges.

use crate::config::Config;
use crate::engine::ArqReceiver;
use crate::env::{Environment, Role};
use crate::packet::{Message, Packet};
use crate::window::RecvWindow;

/// Selective Repeat receiver state for one endpoint.
#[derive(Debug)]
pub struct SrReceiver {
    /// `WINDOW_LEN` slots aligned to `recvbase`, blank until received.
    window: RecvWindow,
}

impl SrReceiver {
    pub fn new(config: &Config) -> Self {
        Self {
            window: RecvWindow::new(config.window_len, config.seq_len(), 0),
        }
    }

    /// Next sequence number to deliver to the application.
    #[cfg(test)]
    pub(crate) fn recv_base(&self) -> u32 {
        self.window.base()
    }
}

impl ArqReceiver for SrReceiver {
    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment) {
        if !packet.is_valid() {
            log::debug!("[sr recv] ← corrupted packet dropped");
            return;
        }

        match self.window.offset_of(packet.seqnum) {
            Some(offset) if !self.window.is_filled(offset) => {
                self.window.store(offset, *packet);
                log::debug!(
                    "[sr recv] ← DATA seq={} buffered at offset {}",
                    packet.seqnum,
                    offset
                );

                // Deliver the contiguous prefix, recycling each slot.
                while let Some(ready) = self.window.pop_ready() {
                    log::debug!("[sr recv] delivering seq={}", ready.seqnum);
                    env.deliver_payload(Message {
                        data: ready.payload,
                    });
                }
                env.send_packet(Role::Sender, Packet::ack(packet.seqnum));
            }
            _ => {
                // Duplicate or behind the window: the original delivery may
                // have been acked on a lost packet, so ack it again.
                log::debug!("[sr recv] ← DATA seq={} duplicate, re-ACK", packet.seqnum);
                env.send_packet(Role::Sender, Packet::ack(packet.seqnum));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::CommandQueue;
    use crate::packet::PAYLOAD_SIZE;
    use std::time::Duration;

    fn cfg() -> Config {
        Config::new(4, Duration::from_millis(100))
    }

    fn data(seq: u32) -> Packet {
        Packet::data(seq, [seq as u8; PAYLOAD_SIZE])
    }

    #[test]
    fn in_order_packet_delivered_immediately() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();

        r.on_packet(&data(0), &mut env);
        assert_eq!(env.delivered().len(), 1);
        assert_eq!(env.sent_to(Role::Sender)[0].ack_seq(), Some(0));
        assert_eq!(r.recv_base(), 1);
    }

    #[test]
    fn out_of_order_packet_buffered_and_acked() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();

        r.on_packet(&data(2), &mut env);
        assert!(env.delivered().is_empty(), "gap: nothing deliverable yet");
        assert_eq!(env.sent_to(Role::Sender)[0].ack_seq(), Some(2));
        assert_eq!(r.recv_base(), 0);
    }

    #[test]
    fn gap_fill_releases_buffered_run() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();

        r.on_packet(&data(1), &mut env);
        r.on_packet(&data(2), &mut env);
        assert!(env.delivered().is_empty());
        env.clear();

        r.on_packet(&data(0), &mut env);
        let seqs: Vec<u8> = env.delivered().iter().map(|m| m.data[0]).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(r.recv_base(), 3);
    }

    #[test]
    fn duplicate_in_window_reacked_not_rebuffered() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();
        r.on_packet(&data(2), &mut env);
        env.clear();

        r.on_packet(&data(2), &mut env);
        assert!(env.delivered().is_empty());
        assert_eq!(env.sent_to(Role::Sender)[0].ack_seq(), Some(2));
    }

    #[test]
    fn delivered_packet_reacked_on_retransmit() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();
        r.on_packet(&data(0), &mut env);
        env.clear();

        // Sender never saw ACK(0) and retransmits; seq 0 is now behind the
        // window but must still be re-ACKed, never redelivered.
        r.on_packet(&data(0), &mut env);
        assert!(env.delivered().is_empty());
        assert_eq!(env.sent_to(Role::Sender)[0].ack_seq(), Some(0));
    }

    #[test]
    fn corrupted_packet_dropped_silently() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();

        let mut pkt = data(0);
        pkt.payload[3] ^= 0xff;
        r.on_packet(&pkt, &mut env);
        assert!(env.commands().is_empty(), "no ACK for a corrupted packet");
    }

    #[test]
    fn reordered_stream_delivered_in_sequence_exactly_once() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();

        // Arrival order 3, 1, 0, 2 with a duplicate of 1 mixed in.
        for seq in [3, 1, 0, 1, 2] {
            r.on_packet(&data(seq), &mut env);
        }
        let seqs: Vec<u8> = env.delivered().iter().map(|m| m.data[0]).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(r.recv_base(), 4);
    }

    #[test]
    fn window_slides_across_wraparound() {
        let mut r = SrReceiver::new(&cfg());
        let mut env = CommandQueue::new();

        // 12 packets through a seq space of 8: 0..7 then 0..3 again.
        for i in 0..12u32 {
            r.on_packet(&data(i % 8), &mut env);
        }
        assert_eq!(env.delivered().len(), 12);
        assert_eq!(r.recv_base(), 4);
    }
}

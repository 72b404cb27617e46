//! Selective Repeat send-side state machine.
//!
//! Unlike Go-Back-N, every outstanding packet owns its **own**
//! retransmission timer, keyed by that packet's sequence number, and a
//! timeout retransmits only that one packet.  ACKs are individual, not
//! cumulative: a slot may be acknowledged long before the base reaches it,
//! and the base slides only over the contiguous acknowledged prefix.

use std::time::Duration;

use crate::config::Config;
use crate::engine::ArqSender;
use crate::env::{Environment, Role};
use crate::packet::{Message, Packet};
use crate::window::SendWindow;

/// Selective Repeat sender state for one endpoint.
#[derive(Debug)]
pub struct SrSender {
    /// Sequence number to assign to the next new packet.
    next_seq: u32,
    /// Outstanding `(packet, acked)` slots, front = send base.
    window: SendWindow,
    seq_len: u32,
    timeout: Duration,
}

impl SrSender {
    pub fn new(config: &Config) -> Self {
        Self {
            next_seq: 0,
            window: SendWindow::new(config.window_len, config.seq_len(), 0),
            seq_len: config.seq_len(),
            timeout: config.timeout,
        }
    }

    /// Oldest not-fully-acknowledged sequence number.
    #[cfg(test)]
    pub(crate) fn base(&self) -> u32 {
        self.window.base()
    }
}

impl ArqSender for SrSender {
    fn try_send(&mut self, message: &Message, env: &mut dyn Environment) -> bool {
        if self.window.is_full() {
            log::trace!("[sr] window full, send rejected");
            return false;
        }

        let packet = Packet::data(self.next_seq, message.data);

        // Every packet gets an individual timer keyed by its own seqnum.
        env.start_timer(Role::Sender, self.timeout, self.next_seq);
        env.send_packet(Role::Receiver, packet);
        self.window.push(packet);
        self.next_seq = (self.next_seq + 1) % self.seq_len;
        log::debug!(
            "[sr] → DATA seq={} in_flight={}",
            packet.seqnum,
            self.window.len()
        );
        true
    }

    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment) {
        if !packet.is_valid() {
            log::debug!("[sr] corrupted ACK dropped");
            return;
        }
        let Some(acknum) = packet.ack_seq() else {
            log::trace!("[sr] non-ACK packet at sender ignored");
            return;
        };
        let Some(offset) = self.window.offset_of(acknum) else {
            log::trace!("[sr] ← stale ACK ack={}", acknum);
            return;
        };
        if !self.window.mark_acked(offset) {
            log::trace!("[sr] ← duplicate ACK ack={}", acknum);
            return;
        }

        env.stop_timer(Role::Sender, acknum);

        // Slide out the contiguous acknowledged prefix only.
        while self.window.front().is_some_and(|slot| slot.acked) {
            self.window.pop_front();
        }
        log::debug!(
            "[sr] ← ACK ack={} base={} in_flight={}",
            acknum,
            self.window.base(),
            self.window.len()
        );
    }

    fn on_timer(&mut self, seq: u32, env: &mut dyn Environment) {
        let Some(offset) = self.window.offset_of(seq) else {
            log::trace!("[sr] stale timeout seq={} ignored", seq);
            return;
        };
        env.stop_timer(Role::Sender, seq);
        env.start_timer(Role::Sender, self.timeout, seq);
        if let Some(slot) = self.window.get(offset) {
            log::debug!("[sr] timeout seq={} — retransmitting", seq);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::CommandQueue;
    use crate::packet::PAYLOAD_SIZE;

    fn cfg() -> Config {
        Config::new(4, Duration::from_millis(100))
    }

    fn msg(fill: u8) -> Message {
        Message {
            data: [fill; PAYLOAD_SIZE],
        }
    }

    fn fill(sender: &mut SrSender, n: u8) {
        let mut env = CommandQueue::new();
        for i in 0..n {
            assert!(sender.try_send(&msg(i), &mut env));
        }
    }

    #[test]
    fn every_send_arms_its_own_timer() {
        let mut s = SrSender::new(&cfg());
        let mut env = CommandQueue::new();

        for i in 0..3 {
            assert!(s.try_send(&msg(i), &mut env));
        }
        assert_eq!(env.timer_starts(), vec![0, 1, 2]);
        assert_eq!(s.in_flight(), 3);
    }

    #[test]
    fn window_full_rejects() {
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 4);

        let mut env = CommandQueue::new();
        assert!(!s.try_send(&msg(9), &mut env));
        assert!(env.commands().is_empty());
    }

    #[test]
    fn out_of_order_acks_slide_contiguous_prefix() {
        // spec scenario: ACKs arrive 2, 0, 1, 3.
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 4);

        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(2), &mut env);
        assert_eq!(s.base(), 0, "ack of slot 2 must not move the base");
        assert_eq!(s.in_flight(), 4);
        assert_eq!(env.timer_stops(), vec![2]);

        s.on_packet(&Packet::ack(0), &mut env);
        assert_eq!(s.base(), 1);
        assert_eq!(s.in_flight(), 3);

        s.on_packet(&Packet::ack(1), &mut env);
        assert_eq!(s.base(), 3, "slide must skip the already-acked slot 2");
        assert_eq!(s.in_flight(), 1);

        s.on_packet(&Packet::ack(3), &mut env);
        assert_eq!(s.base(), 4);
        assert_eq!(s.in_flight(), 0);
    }

    #[test]
    fn acking_one_slot_leaves_other_timers_alone() {
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 3);

        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(1), &mut env);
        // Only seq 1's timer is touched; 0 and 2 keep running.
        assert_eq!(env.timer_stops(), vec![1]);
        assert!(env.timer_starts().is_empty());
    }

    #[test]
    fn duplicate_ack_ignored() {
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 2);

        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(1), &mut env);
        env.clear();

        s.on_packet(&Packet::ack(1), &mut env);
        assert!(env.commands().is_empty(), "second ack of slot 1 is a no-op");
        assert_eq!(s.in_flight(), 2);
    }

    #[test]
    fn stale_ack_outside_window_ignored() {
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 2);
        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(0), &mut env);
        s.on_packet(&Packet::ack(1), &mut env);
        env.clear();

        // Window now empty at base 2; the old ack maps outside it.
        s.on_packet(&Packet::ack(0), &mut env);
        assert!(env.commands().is_empty());
    }

    #[test]
    fn corrupted_ack_ignored() {
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 1);

        let mut ack = Packet::ack(0);
        ack.payload[0] ^= 0xff;
        let mut env = CommandQueue::new();
        s.on_packet(&ack, &mut env);
        assert!(env.commands().is_empty());
        assert_eq!(s.in_flight(), 1);
    }

    #[test]
    fn timeout_retransmits_only_that_packet() {
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 3);

        let mut env = CommandQueue::new();
        s.on_timer(1, &mut env);

        let resent = env.sent_to(Role::Receiver);
        assert_eq!(resent.len(), 1);
        assert_eq!(resent[0].seqnum, 1);
        assert_eq!(env.timer_stops(), vec![1]);
        assert_eq!(env.timer_starts(), vec![1]);
    }

    #[test]
    fn stale_timeout_ignored() {
        let mut s = SrSender::new(&cfg());
        fill(&mut s, 1);
        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(0), &mut env);
        env.clear();

        s.on_timer(0, &mut env);
        assert!(env.commands().is_empty());
    }

    #[test]
    fn base_wraps_across_sequence_space() {
        let mut s = SrSender::new(&cfg());
        let mut env = CommandQueue::new();

        for i in 0..10u8 {
            assert!(s.try_send(&msg(i), &mut env));
            s.on_packet(&Packet::ack((i as u32) % 8), &mut env);
        }
        assert_eq!(s.base(), 2); // 10 mod 8
        assert_eq!(s.in_flight(), 0);
    }
}

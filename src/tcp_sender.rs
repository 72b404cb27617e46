//! TCP-like send-side state machine: cumulative ACKs + fast retransmit.
//!
//! Window accounting is identical to Go-Back-N — cumulative ACKs slide a
//! FIFO window, one timer keyed by the base — with two TCP-flavored
//! differences:
//!
//! - **Fast retransmit**: a duplicate ACK is one that re-acknowledges
//!   `(base - 1) mod SEQ_LEN`, i.e. the last packet the receiver accepted.
//!   On exactly the third consecutive duplicate the head-of-window packet
//!   is retransmitted immediately and the counter resets, recovering a
//!   single loss without waiting for the timeout.
//! - **Timeout retransmits only the head-of-window packet**, not the whole
//!   window.
//!
//! Only ACKs exactly equal to `base - 1` count as duplicates; older stale
//! values are ignored.

use std::time::Duration;

use crate::config::Config;
use crate::engine::ArqSender;
use crate::env::{Environment, Role};
use crate::packet::{Message, Packet};
use crate::window::SendWindow;

/// Number of duplicate ACKs that triggers a fast retransmit.
const DUP_ACK_THRESHOLD: u32 = 3;

/// TCP-like sender state for one endpoint.
#[derive(Debug)]
pub struct TcpSender {
    /// Sequence number to assign to the next new packet.
    next_seq: u32,
    /// Outstanding packets, front = oldest unacknowledged (the base).
    window: SendWindow,
    /// Consecutive duplicate ACKs of `(base - 1) mod SEQ_LEN`.
    dup_acks: u32,
    seq_len: u32,
    timeout: Duration,
}

impl TcpSender {
    pub fn new(config: &Config) -> Self {
        Self {
            next_seq: 0,
            window: SendWindow::new(config.window_len, config.seq_len(), 0),
            dup_acks: 0,
            seq_len: config.seq_len(),
            timeout: config.timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn base(&self) -> u32 {
        self.window.base()
    }

    /// The sequence number a duplicate ACK re-acknowledges.
    fn last_acked_seq(&self) -> u32 {
        (self.window.base() + self.seq_len - 1) % self.seq_len
    }
}

impl ArqSender for TcpSender {
    fn try_send(&mut self, message: &Message, env: &mut dyn Environment) -> bool {
        if self.window.is_full() {
            log::trace!("[tcp] window full, send rejected");
            return false;
        }

        let packet = Packet::data(self.next_seq, message.data);

        if self.window.base() == self.next_seq {
            env.start_timer(Role::Sender, self.timeout, self.window.base());
        }
        env.send_packet(Role::Receiver, packet);
        self.window.push(packet);
        self.next_seq = (self.next_seq + 1) % self.seq_len;
        log::debug!(
            "[tcp] → DATA seq={} in_flight={}",
            packet.seqnum,
            self.window.len()
        );
        true
    }

    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment) {
        if !packet.is_valid() {
            log::debug!("[tcp] corrupted ACK dropped");
            return;
        }
        let Some(acknum) = packet.ack_seq() else {
            log::trace!("[tcp] non-ACK packet at sender ignored");
            return;
        };

        if let Some(offset) = self.window.offset_of(acknum) {
            // New progress: cumulative slide exactly as GBN.
            env.stop_timer(Role::Sender, self.window.base());
            for _ in 0..=offset {
                self.window.pop_front();
            }
            self.dup_acks = 0;
            log::debug!(
                "[tcp] ← ACK ack={} base={} in_flight={}",
                acknum,
                self.window.base(),
                self.window.len()
            );
            if !self.window.is_empty() {
                env.start_timer(Role::Sender, self.timeout, self.window.base());
            }
        } else if acknum == self.last_acked_seq() {
            self.dup_acks += 1;
            log::debug!("[tcp] ← duplicate ACK ack={} count={}", acknum, self.dup_acks);
            if self.dup_acks == DUP_ACK_THRESHOLD {
                if let Some(front) = self.window.front() {
                    log::debug!("[tcp] fast retransmit seq={}", front.packet.seqnum);
                    env.send_packet(Role::Receiver, front.packet);
                }
                self.dup_acks = 0;
            }
        } else {
            log::trace!("[tcp] ← stale ACK ack={} ignored", acknum);
        }
    }

    fn on_timer(&mut self, seq: u32, env: &mut dyn Environment) {
        env.stop_timer(Role::Sender, seq);
        env.start_timer(Role::Sender, self.timeout, seq);
        if let Some(front) = self.window.front() {
            log::debug!("[tcp] timeout seq={} — retransmitting head", seq);
            env.send_packet(Role::Receiver, front.packet);
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

    fn fill(sender: &mut TcpSender, n: u8) {
        let mut env = CommandQueue::new();
        for i in 0..n {
            assert!(sender.try_send(&msg(i), &mut env));
        }
    }

    /// Fill, then ack seq 0 so base = 1 and duplicates of ACK(0) count.
    fn fill_with_progress(sender: &mut TcpSender, n: u8) {
        fill(sender, n);
        let mut env = CommandQueue::new();
        sender.on_packet(&Packet::ack(0), &mut env);
        assert_eq!(sender.base(), 1);
    }

    #[test]
    fn cumulative_slide_matches_gbn() {
        let mut s = TcpSender::new(&cfg());
        fill(&mut s, 4);

        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(1), &mut env);
        assert_eq!(s.base(), 2);
        assert_eq!(s.in_flight(), 2);
        assert_eq!(env.timer_stops(), vec![0]);
        assert_eq!(env.timer_starts(), vec![2]);

        let mut env = CommandQueue::new();
        assert!(s.try_send(&msg(4), &mut env), "freed slot must be reusable");
    }

    #[test]
    fn third_duplicate_ack_fast_retransmits_head() {
        let mut s = TcpSender::new(&cfg());
        fill_with_progress(&mut s, 4);

        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(0), &mut env);
        s.on_packet(&Packet::ack(0), &mut env);
        assert!(
            env.sent_to(Role::Receiver).is_empty(),
            "two duplicates must not retransmit"
        );

        s.on_packet(&Packet::ack(0), &mut env);
        let resent = env.sent_to(Role::Receiver);
        assert_eq!(resent.len(), 1, "third duplicate retransmits exactly once");
        assert_eq!(resent[0].seqnum, 1, "head of window, not the whole window");
        assert_eq!(s.dup_acks, 0, "counter resets after fast retransmit");
    }

    #[test]
    fn fourth_duplicate_starts_a_new_count() {
        let mut s = TcpSender::new(&cfg());
        fill_with_progress(&mut s, 4);

        let mut env = CommandQueue::new();
        for _ in 0..3 {
            s.on_packet(&Packet::ack(0), &mut env);
        }
        env.clear();

        // Duplicates 4 and 5: still below a fresh threshold.
        s.on_packet(&Packet::ack(0), &mut env);
        s.on_packet(&Packet::ack(0), &mut env);
        assert!(env.sent_to(Role::Receiver).is_empty());

        // Duplicate 6 completes the second round of three.
        s.on_packet(&Packet::ack(0), &mut env);
        assert_eq!(env.sent_to(Role::Receiver).len(), 1);
    }

    #[test]
    fn new_ack_resets_duplicate_count() {
        let mut s = TcpSender::new(&cfg());
        fill_with_progress(&mut s, 4);

        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(0), &mut env);
        s.on_packet(&Packet::ack(0), &mut env);

        // Progress: ACK(1) slides the base and clears the counter.
        s.on_packet(&Packet::ack(1), &mut env);
        assert_eq!(s.dup_acks, 0);
        env.clear();

        // A single old duplicate of the *new* base - 1 must not fire.
        s.on_packet(&Packet::ack(1), &mut env);
        assert!(env.sent_to(Role::Receiver).is_empty());
        assert_eq!(s.dup_acks, 1);
    }

    #[test]
    fn stale_ack_neither_slides_nor_counts() {
        let mut s = TcpSender::new(&cfg());
        fill(&mut s, 4);
        let mut env = CommandQueue::new();
        s.on_packet(&Packet::ack(1), &mut env); // base → 2
        env.clear();

        // ACK(0) is two behind the base: not a countable duplicate.
        s.on_packet(&Packet::ack(0), &mut env);
        assert!(env.commands().is_empty());
        assert_eq!(s.dup_acks, 0);
        assert_eq!(s.base(), 2);
    }

    #[test]
    fn corrupted_ack_ignored_entirely() {
        let mut s = TcpSender::new(&cfg());
        fill_with_progress(&mut s, 2);

        let mut ack = Packet::ack(0);
        ack.seqnum ^= 1;
        let mut env = CommandQueue::new();
        for _ in 0..3 {
            s.on_packet(&ack, &mut env);
        }
        assert!(env.commands().is_empty(), "corrupt duplicates must not count");
        assert_eq!(s.dup_acks, 0);
    }

    #[test]
    fn timeout_retransmits_only_head() {
        let mut s = TcpSender::new(&cfg());
        fill(&mut s, 3);

        let mut env = CommandQueue::new();
        s.on_timer(0, &mut env);

        let resent = env.sent_to(Role::Receiver);
        assert_eq!(resent.len(), 1, "TCP-like timeout is head-only");
        assert_eq!(resent[0].seqnum, 0);
        assert_eq!(env.timer_stops(), vec![0]);
        assert_eq!(env.timer_starts(), vec![0]);
    }

    #[test]
    fn duplicate_counting_works_across_wraparound() {
        let mut s = TcpSender::new(&cfg());
        let mut env = CommandQueue::new();

        // Advance the base to 7, then fill: last acked seq is 6.
        for i in 0..7u8 {
            assert!(s.try_send(&msg(i), &mut env));
            s.on_packet(&Packet::ack(i as u32), &mut env);
        }
        assert_eq!(s.base(), 7);
        fill(&mut s, 2); // seqs 7 and 0 outstanding
        env.clear();

        for _ in 0..3 {
            s.on_packet(&Packet::ack(6), &mut env);
        }
        let resent = env.sent_to(Role::Receiver);
        assert_eq!(resent.len(), 1);
        assert_eq!(resent[0].seqnum, 7);
    }
}

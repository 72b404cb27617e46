//! Protocol selection and the sender/receiver engine interfaces.
//!
//! Every protocol variant implements the same two small traits:
//! [`ArqSender`] reacts to outbound send requests, inbound ACKs, and timer
//! expirations; [`ArqReceiver`] reacts to inbound data packets.  The
//! environment invokes exactly one event method at a time and each call
//! runs to completion — engines have no internal concurrency and never
//! block.
//!
//! [`SenderEngine`] and [`ReceiverEngine`] are tagged variants over the
//! concrete state machines; construction selects the variant from a
//! [`Protocol`] value at runtime, so a single binary can run any of the
//! three schemes.

use crate::config::Config;
use crate::cumulative_receiver::CumulativeReceiver;
use crate::env::Environment;
use crate::gbn_sender::GbnSender;
use crate::packet::{Message, Packet};
use crate::sr_receiver::SrReceiver;
use crate::sr_sender::SrSender;
use crate::tcp_sender::TcpSender;

/// The three interchangeable ARQ schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Cumulative ACKs, one timer, whole-window retransmit on timeout.
    GoBackN,
    /// Per-packet ACKs, per-packet timers, single-packet retransmit.
    SelectiveRepeat,
    /// Cumulative ACKs plus fast retransmit on three duplicate ACKs.
    TcpLike,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::GoBackN => write!(f, "go-back-n"),
            Protocol::SelectiveRepeat => write!(f, "selective-repeat"),
            Protocol::TcpLike => write!(f, "tcp-like"),
        }
    }
}

/// Send-side engine interface.
pub trait ArqSender {
    /// Attempt to transmit one application message.
    ///
    /// Returns `false` without queuing when the window is full —
    /// backpressure is explicit and the caller must retry later.
    fn try_send(&mut self, message: &Message, env: &mut dyn Environment) -> bool;

    /// React to a packet arriving from the peer (an ACK).
    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment);

    /// React to the expiry of the timer keyed by `seq`.
    fn on_timer(&mut self, seq: u32, env: &mut dyn Environment);

    /// Number of outstanding unacknowledged packets.
    fn in_flight(&self) -> usize;
}

/// Receive-side engine interface.
pub trait ArqReceiver {
    /// React to a data packet arriving from the peer.
    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment);
}

// ---------------------------------------------------------------------------
// Tagged engine variants
// ---------------------------------------------------------------------------

/// A sender state machine for one of the three protocols.
#[derive(Debug)]
pub enum SenderEngine {
    GoBackN(GbnSender),
    SelectiveRepeat(SrSender),
    TcpLike(TcpSender),
}

impl SenderEngine {
    /// Construct the sender variant selected by `protocol`.
    pub fn new(protocol: Protocol, config: &Config) -> Self {
        match protocol {
            Protocol::GoBackN => Self::GoBackN(GbnSender::new(config)),
            Protocol::SelectiveRepeat => Self::SelectiveRepeat(SrSender::new(config)),
            Protocol::TcpLike => Self::TcpLike(TcpSender::new(config)),
        }
    }
}

impl ArqSender for SenderEngine {
    fn try_send(&mut self, message: &Message, env: &mut dyn Environment) -> bool {
        match self {
            Self::GoBackN(s) => s.try_send(message, env),
            Self::SelectiveRepeat(s) => s.try_send(message, env),
            Self::TcpLike(s) => s.try_send(message, env),
        }
    }

    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment) {
        match self {
            Self::GoBackN(s) => s.on_packet(packet, env),
            Self::SelectiveRepeat(s) => s.on_packet(packet, env),
            Self::TcpLike(s) => s.on_packet(packet, env),
        }
    }

    fn on_timer(&mut self, seq: u32, env: &mut dyn Environment) {
        match self {
            Self::GoBackN(s) => s.on_timer(seq, env),
            Self::SelectiveRepeat(s) => s.on_timer(seq, env),
            Self::TcpLike(s) => s.on_timer(seq, env),
        }
    }

    fn in_flight(&self) -> usize {
        match self {
            Self::GoBackN(s) => s.in_flight(),
            Self::SelectiveRepeat(s) => s.in_flight(),
            Self::TcpLike(s) => s.in_flight(),
        }
    }
}

/// A receiver state machine for one of the three protocols.
///
/// GBN and TCP-like share [`CumulativeReceiver`]: the TCP-like scheme's
/// sophistication (duplicate-ACK counting, fast retransmit) lives entirely
/// on the sender side.
#[derive(Debug)]
pub enum ReceiverEngine {
    GoBackN(CumulativeReceiver),
    SelectiveRepeat(SrReceiver),
    TcpLike(CumulativeReceiver),
}

impl ReceiverEngine {
    /// Construct the receiver variant selected by `protocol`.
    pub fn new(protocol: Protocol, config: &Config) -> Self {
        match protocol {
            Protocol::GoBackN => Self::GoBackN(CumulativeReceiver::new(config)),
            Protocol::SelectiveRepeat => Self::SelectiveRepeat(SrReceiver::new(config)),
            Protocol::TcpLike => Self::TcpLike(CumulativeReceiver::new(config)),
        }
    }
}

impl ArqReceiver for ReceiverEngine {
    fn on_packet(&mut self, packet: &Packet, env: &mut dyn Environment) {
        match self {
            Self::GoBackN(r) | Self::TcpLike(r) => r.on_packet(packet, env),
            Self::SelectiveRepeat(r) => r.on_packet(packet, env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_selects_variant() {
        let cfg = Config::default();
        assert!(matches!(
            SenderEngine::new(Protocol::GoBackN, &cfg),
            SenderEngine::GoBackN(_)
        ));
        assert!(matches!(
            SenderEngine::new(Protocol::SelectiveRepeat, &cfg),
            SenderEngine::SelectiveRepeat(_)
        ));
        assert!(matches!(
            SenderEngine::new(Protocol::TcpLike, &cfg),
            SenderEngine::TcpLike(_)
        ));
        assert!(matches!(
            ReceiverEngine::new(Protocol::TcpLike, &cfg),
            ReceiverEngine::TcpLike(_)
        ));
    }

    #[test]
    fn fresh_sender_has_nothing_in_flight() {
        let cfg = Config::default();
        for protocol in [Protocol::GoBackN, Protocol::SelectiveRepeat, Protocol::TcpLike] {
            assert_eq!(SenderEngine::new(protocol, &cfg).in_flight(), 0);
        }
    }
}

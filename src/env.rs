//! The environment capability through which engines reach the outside world.
//!
//! Protocol engines never perform I/O, own timers, or touch the application
//! layer directly.  Every reaction to an event is expressed as calls on an
//! [`Environment`] handle passed into the event method — packets to
//! transmit, timers to start or stop, payloads to deliver.  The driver
//! behind the handle (the [`crate::simulator`] in this crate) decides what
//! those calls actually do.
//!
//! [`CommandQueue`] is the buffering implementation used by the simulator's
//! dispatch loop and by unit tests: it records each call as a [`Command`]
//! so the effects of a single engine invocation can be applied — or
//! asserted on — afterwards.

use std::time::Duration;

use crate::packet::{Message, Packet};

/// The two endpoints of a session.
///
/// Used to address outbound packets and to namespace timer keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Sender,
    Receiver,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Sender => write!(f, "sender"),
            Role::Receiver => write!(f, "receiver"),
        }
    }
}

/// Services an engine may call while reacting to an event.
///
/// Timer contract (owned by sender engines): starting a timer whose key is
/// already running restarts it; stopping a timer that is not running is a
/// no-op.  Engines never leave more timers running than they have
/// outstanding unacknowledged sequence numbers.
pub trait Environment {
    /// Hand a packet to the channel for transmission toward `dest`.
    fn send_packet(&mut self, dest: Role, packet: Packet);

    /// Start (or restart) the timer keyed by `(owner, seq)`.
    fn start_timer(&mut self, owner: Role, timeout: Duration, seq: u32);

    /// Cancel the timer keyed by `(owner, seq)` if it is running.
    fn stop_timer(&mut self, owner: Role, seq: u32);

    /// Deliver one in-order message to the application layer.
    fn deliver_payload(&mut self, message: Message);
}

/// One recorded [`Environment`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SendPacket {
        dest: Role,
        packet: Packet,
    },
    StartTimer {
        owner: Role,
        timeout: Duration,
        seq: u32,
    },
    StopTimer {
        owner: Role,
        seq: u32,
    },
    Deliver(Message),
}

/// An [`Environment`] that buffers calls as [`Command`]s in order.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all buffered commands, leaving the queue empty.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// All buffered commands, in emission order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Packets sent toward `dest`, in emission order.
    pub fn sent_to(&self, dest: Role) -> Vec<&Packet> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::SendPacket { dest: d, packet } if *d == dest => Some(packet),
                _ => None,
            })
            .collect()
    }

    /// Messages delivered to the application, in emission order.
    pub fn delivered(&self) -> Vec<&Message> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Deliver(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Sequence keys of `StartTimer` commands, in emission order.
    pub fn timer_starts(&self) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::StartTimer { seq, .. } => Some(*seq),
                _ => None,
            })
            .collect()
    }

    /// Sequence keys of `StopTimer` commands, in emission order.
    pub fn timer_stops(&self) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::StopTimer { seq, .. } => Some(*seq),
                _ => None,
            })
            .collect()
    }

    /// Discard everything recorded so far (between test phases).
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Environment for CommandQueue {
    fn send_packet(&mut self, dest: Role, packet: Packet) {
        self.commands.push(Command::SendPacket { dest, packet });
    }

    fn start_timer(&mut self, owner: Role, timeout: Duration, seq: u32) {
        self.commands.push(Command::StartTimer {
            owner,
            timeout,
            seq,
        });
    }

    fn stop_timer(&mut self, owner: Role, seq: u32) {
        self.commands.push(Command::StopTimer { owner, seq });
    }

    fn deliver_payload(&mut self, message: Message) {
        self.commands.push(Command::Deliver(message));
    }
}

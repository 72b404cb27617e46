//! Deterministic discrete-event simulator for the lossy channel.
//!
//! The simulator is the one place where the sans-I/O engines meet "the
//! world": it owns both endpoints, a virtual millisecond clock, a priority
//! queue of future events, the timer table, and a seeded fault model.  Each
//! engine invocation runs to completion against a [`CommandQueue`]; the
//! emitted commands are then applied here — packets enter the channel,
//! timers are (re)armed or cancelled, delivered payloads are collected.
//!
//! ```text
//!   messages ──▶ pump ──▶ SenderEngine ──┐
//!                  ▲                     │ commands
//!                  │                     ▼
//!            event loop ◀──── channel / timer table
//!                  │                     ▲
//!                  ▼                     │ commands
//!              deliveries ◀── ReceiverEngine
//! ```
//!
//! # Fault model
//!
//! Every transmitted packet independently rolls against a seeded
//! [`StdRng`]: it may be dropped outright, have one payload byte flipped
//! (which the checksum is guaranteed to catch), and is delayed by the base
//! latency plus uniform jitter.  Jitter is what produces reordering — two
//! packets sent back to back may draw delays that cross.  The same seed
//! always replays the same run.
//!
//! # Timers
//!
//! Timer events carry a generation number.  Starting a timer bumps the
//! generation stored under its `(owner, seq)` key, so any previously
//! scheduled expiry for that key becomes stale and is discarded when popped.
//! Stopping removes the key entirely.  This realises the restart/no-op
//! contract of [`Environment`] without ever removing events from the heap.
//!
//! [`Environment`]: crate::env::Environment

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::engine::{ArqReceiver, ArqSender, Protocol, ReceiverEngine, SenderEngine};
use crate::env::{Command, CommandQueue, Role};
use crate::packet::{Message, Packet, PAYLOAD_SIZE};

/// Channel fault model and run limits.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Probability in `[0, 1]` that a transmitted packet is dropped.
    pub loss_rate: f64,
    /// Probability in `[0, 1]` that a surviving packet has a payload byte
    /// flipped in flight.
    pub corrupt_rate: f64,
    /// Base one-way propagation delay.
    pub latency: Duration,
    /// Extra uniform delay in `[0, jitter]` added per packet; nonzero
    /// jitter causes reordering.
    pub jitter: Duration,
    /// RNG seed; the same seed replays the same run exactly.
    pub seed: u64,
    /// Virtual-time budget after which the run is abandoned.
    pub deadline: Duration,
}

impl SimConfig {
    /// A fault-free channel with a fixed 10 ms delay.
    pub fn reliable() -> Self {
        Self::default()
    }

    fn validate(&self) {
        assert!(
            (0.0..=1.0).contains(&self.loss_rate),
            "loss_rate must be a probability"
        );
        assert!(
            (0.0..=1.0).contains(&self.corrupt_rate),
            "corrupt_rate must be a probability"
        );
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            latency: Duration::from_millis(10),
            jitter: Duration::ZERO,
            seed: 0,
            deadline: Duration::from_secs(60),
        }
    }
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Packets handed to the channel, retransmissions included.
    pub sent: u64,
    /// Packets the channel dropped.
    pub dropped: u64,
    /// Packets the channel corrupted in flight.
    pub corrupted: u64,
    /// Timer expirations dispatched to the sender.
    pub timer_fires: u64,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct SimReport {
    /// Messages the receiver handed to the application, in delivery order.
    pub delivered: Vec<Message>,
    pub stats: SimStats,
    /// Virtual time at which the last event was processed.
    pub elapsed: Duration,
}

/// Ways a run can fail to complete.
#[derive(Debug, PartialEq, Eq)]
pub enum SimError {
    /// The virtual clock passed the configured deadline.
    DeadlineExceeded { delivered: usize, expected: usize },
    /// The event queue drained with messages still undelivered.
    Stalled { delivered: usize, expected: usize },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::DeadlineExceeded {
                delivered,
                expected,
            } => write!(
                f,
                "deadline exceeded with {delivered}/{expected} messages delivered"
            ),
            SimError::Stalled {
                delivered,
                expected,
            } => write!(
                f,
                "simulation stalled with {delivered}/{expected} messages delivered"
            ),
        }
    }
}

impl std::error::Error for SimError {}

// ---------------------------------------------------------------------------
// Event queue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum EventKind {
    /// A packet surfaces from the channel at `dest`.
    Arrival { dest: Role, packet: Packet },
    /// The timer keyed by `(owner, seq)` expires, if `gen` is still live.
    TimerFire { owner: Role, seq: u32, gen: u64 },
}

#[derive(Debug, Clone)]
struct Event {
    /// Virtual time in milliseconds.
    at: u64,
    /// Insertion counter; ties at the same instant pop in insertion order.
    id: u64,
    kind: EventKind,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.at, self.id).cmp(&(other.at, other.id))
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// One sender, one receiver, and the channel between them.
pub struct Simulator {
    sender: SenderEngine,
    receiver: ReceiverEngine,
    sim: SimConfig,
    rng: StdRng,
    events: BinaryHeap<Reverse<Event>>,
    /// Live timer generation per `(owner, seq)` key.
    timers: HashMap<(Role, u32), u64>,
    now: u64,
    next_event_id: u64,
    next_gen: u64,
    env: CommandQueue,
    backlog: VecDeque<Message>,
    delivered: Vec<Message>,
    stats: SimStats,
}

impl Simulator {
    pub fn new(protocol: Protocol, config: &Config, sim: SimConfig) -> Self {
        sim.validate();
        let rng = StdRng::seed_from_u64(sim.seed);
        Self {
            sender: SenderEngine::new(protocol, config),
            receiver: ReceiverEngine::new(protocol, config),
            sim,
            rng,
            events: BinaryHeap::new(),
            timers: HashMap::new(),
            now: 0,
            next_event_id: 0,
            next_gen: 0,
            env: CommandQueue::new(),
            backlog: VecDeque::new(),
            delivered: Vec::new(),
            stats: SimStats::default(),
        }
    }

    /// Push every message through the channel and run to completion.
    ///
    /// Returns the delivered stream and run counters, or an error if the
    /// transfer could not finish within the deadline.
    pub fn run(mut self, messages: &[Message]) -> Result<SimReport, SimError> {
        self.backlog.extend(messages.iter().copied());
        self.pump();

        while let Some(Reverse(event)) = self.events.pop() {
            self.now = event.at;
            if self.now > self.sim.deadline.as_millis() as u64 {
                return Err(SimError::DeadlineExceeded {
                    delivered: self.delivered.len(),
                    expected: messages.len(),
                });
            }

            match event.kind {
                EventKind::Arrival { dest, packet } => match dest {
                    Role::Sender => self.sender.on_packet(&packet, &mut self.env),
                    Role::Receiver => self.receiver.on_packet(&packet, &mut self.env),
                },
                EventKind::TimerFire { owner, seq, gen } => {
                    if self.timers.get(&(owner, seq)) != Some(&gen) {
                        continue; // restarted or cancelled since scheduling
                    }
                    self.timers.remove(&(owner, seq));
                    self.stats.timer_fires += 1;
                    self.sender.on_timer(seq, &mut self.env);
                }
            }
            self.apply();
            self.pump();
        }

        if self.backlog.is_empty()
            && self.sender.in_flight() == 0
            && self.delivered.len() == messages.len()
        {
            log::debug!("[sim] finished at t={}ms: {:?}", self.now, self.stats);
            Ok(SimReport {
                delivered: self.delivered,
                stats: self.stats,
                elapsed: Duration::from_millis(self.now),
            })
        } else {
            Err(SimError::Stalled {
                delivered: self.delivered.len(),
                expected: messages.len(),
            })
        }
    }

    /// Feed backlogged messages to the sender until it pushes back.
    fn pump(&mut self) {
        while let Some(message) = self.backlog.front() {
            if !self.sender.try_send(message, &mut self.env) {
                break;
            }
            self.backlog.pop_front();
            self.apply();
        }
    }

    /// Apply every command the last engine invocation emitted.
    fn apply(&mut self) {
        for command in self.env.take() {
            match command {
                Command::SendPacket { dest, packet } => self.transmit(dest, packet),
                Command::StartTimer {
                    owner,
                    timeout,
                    seq,
                } => {
                    self.next_gen += 1;
                    self.timers.insert((owner, seq), self.next_gen);
                    let at = self.now + timeout.as_millis() as u64;
                    let gen = self.next_gen;
                    self.schedule(at, EventKind::TimerFire { owner, seq, gen });
                }
                Command::StopTimer { owner, seq } => {
                    self.timers.remove(&(owner, seq));
                }
                Command::Deliver(message) => self.delivered.push(message),
            }
        }
    }

    /// Roll the fault dice for one packet and schedule its arrival.
    fn transmit(&mut self, dest: Role, mut packet: Packet) {
        self.stats.sent += 1;

        if self.rng.gen_bool(self.sim.loss_rate) {
            self.stats.dropped += 1;
            log::trace!("[net] dropped seq={} ack={}", packet.seqnum, packet.acknum);
            return;
        }
        if self.rng.gen_bool(self.sim.corrupt_rate) {
            let idx = self.rng.gen_range(0..PAYLOAD_SIZE);
            packet.payload[idx] ^= 0xff;
            self.stats.corrupted += 1;
            log::trace!(
                "[net] corrupted byte {} of seq={} ack={}",
                idx,
                packet.seqnum,
                packet.acknum
            );
        }

        let jitter_ms = self.sim.jitter.as_millis() as u64;
        let delay = self.sim.latency.as_millis() as u64
            + if jitter_ms > 0 {
                self.rng.gen_range(0..=jitter_ms)
            } else {
                0
            };
        self.schedule(self.now + delay, EventKind::Arrival { dest, packet });
    }

    fn schedule(&mut self, at: u64, kind: EventKind) {
        self.next_event_id += 1;
        self.events.push(Reverse(Event {
            at,
            id: self.next_event_id,
            kind,
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

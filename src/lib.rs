//! Reliable-delivery (ARQ) protocol engines over a simulated lossy channel.
//!
//! Three interchangeable sliding-window schemes provide in-order,
//! exactly-once delivery of fixed-size messages across a channel that
//! drops, corrupts, and reorders packets:
//!
//! - **Go-Back-N**: cumulative ACKs, one timer, whole-window retransmit.
//! - **Selective Repeat**: per-packet ACKs, timers, and retransmits, with
//!   receiver-side buffering of out-of-order arrivals.
//! - **TCP-like**: cumulative ACKs plus fast retransmit after three
//!   duplicate ACKs; timeout resends only the head of the window.
//!
//! # Architecture
//!
//! The engines are pure state machines: they never touch sockets, clocks,
//! or threads.  Every reaction is expressed as calls on an [`Environment`]
//! capability handed in per event, and the [`Simulator`] is the driver that
//! turns those calls into scheduled channel and timer events:
//!
//! ```text
//!   ┌────────────┐  try_send / on_packet / on_timer  ┌──────────────┐
//!   │  Simulator │ ────────────────────────────────▶ │ Sender/Recv  │
//!   │ (events,   │ ◀──────────────────────────────── │   Engine     │
//!   │  channel,  │   send_packet / start_timer /     └──────────────┘
//!   │  timers)   │   stop_timer / deliver_payload
//!   └────────────┘
//! ```
//!
//! Sequence numbers live in `0..SEQ_LEN` with `SEQ_LEN = 2 × WINDOW_LEN`,
//! the minimum space in which a retransmission and a new packet can never
//! be confused.
//!
//! [`Environment`]: env::Environment
//! [`Simulator`]: simulator::Simulator

pub mod config;
pub mod cumulative_receiver;
pub mod engine;
pub mod env;
pub mod gbn_sender;
pub mod packet;
pub mod simulator;
pub mod sr_receiver;
pub mod sr_sender;
pub mod tcp_sender;
pub mod window;

pub use config::Config;
pub use engine::{ArqReceiver, ArqSender, Protocol, ReceiverEngine, SenderEngine};
pub use env::{Command, CommandQueue, Environment, Role};
pub use packet::{Message, Packet, PacketError, PAYLOAD_SIZE};
pub use simulator::{SimConfig, SimError, SimReport, SimStats, Simulator};

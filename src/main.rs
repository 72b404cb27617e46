//! Entry point for `arq-sim`.
//!
//! Transfers a file through the simulated lossy channel using the selected
//! ARQ protocol and writes the delivered bytes back out.  All protocol work
//! lives in the library; `main.rs` owns only process setup (logging,
//! argument parsing) and file chunking.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use arq_sim::{Config, Message, Protocol, SimConfig, Simulator, PAYLOAD_SIZE};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProtocolArg {
    /// Cumulative ACKs, one timer, whole-window retransmit.
    GoBackN,
    /// Per-packet ACKs, timers, and retransmits.
    SelectiveRepeat,
    /// Cumulative ACKs with fast retransmit on three duplicates.
    TcpLike,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::GoBackN => Protocol::GoBackN,
            ProtocolArg::SelectiveRepeat => Protocol::SelectiveRepeat,
            ProtocolArg::TcpLike => Protocol::TcpLike,
        }
    }
}

/// Transfer a file through a simulated unreliable channel.
#[derive(Debug, Parser)]
#[command(name = "arq-sim", version, about)]
struct Args {
    /// ARQ protocol variant to run.
    #[arg(value_enum)]
    protocol: ProtocolArg,

    /// File to transfer.
    input: PathBuf,

    /// Where to write the delivered bytes.
    output: PathBuf,

    /// Sliding-window size (sequence space is twice this).
    #[arg(long, default_value_t = 4)]
    window: usize,

    /// Retransmission timeout in virtual milliseconds.
    #[arg(long, default_value_t = 300)]
    timeout_ms: u64,

    /// Packet loss probability in [0, 1].
    #[arg(long, default_value_t = 0.0)]
    loss: f64,

    /// Packet corruption probability in [0, 1].
    #[arg(long, default_value_t = 0.0)]
    corrupt: f64,

    /// Base one-way channel latency in virtual milliseconds.
    #[arg(long, default_value_t = 10)]
    latency_ms: u64,

    /// Extra uniform per-packet delay in virtual milliseconds; nonzero
    /// values reorder packets.
    #[arg(long, default_value_t = 0)]
    jitter_ms: u64,

    /// RNG seed for the fault model.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Give up after this much virtual time, in seconds.
    #[arg(long, default_value_t = 600)]
    deadline_secs: u64,
}

/// Split raw bytes into fixed-size messages, zero-padding the tail.
fn chunk(bytes: &[u8]) -> Vec<Message> {
    bytes
        .chunks(PAYLOAD_SIZE)
        .map(|chunk| {
            let mut data = [0u8; PAYLOAD_SIZE];
            data[..chunk.len()].copy_from_slice(chunk);
            Message { data }
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let bytes = fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let messages = chunk(&bytes);

    let config = Config::new(args.window, Duration::from_millis(args.timeout_ms));
    let sim = SimConfig {
        loss_rate: args.loss,
        corrupt_rate: args.corrupt,
        latency: Duration::from_millis(args.latency_ms),
        jitter: Duration::from_millis(args.jitter_ms),
        seed: args.seed,
        deadline: Duration::from_secs(args.deadline_secs),
    };

    let protocol: Protocol = args.protocol.into();
    log::info!(
        "transferring {} bytes ({} packets) via {} (window {}, timeout {}ms)",
        bytes.len(),
        messages.len(),
        protocol,
        args.window,
        args.timeout_ms
    );

    let report = Simulator::new(protocol, &config, sim)
        .run(&messages)
        .context("transfer failed")?;

    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    for message in &report.delivered {
        out.extend_from_slice(&message.data);
    }
    out.truncate(bytes.len());
    fs::write(&args.output, &out)
        .with_context(|| format!("writing {}", args.output.display()))?;

    log::info!(
        "done in {}ms virtual time: {} sent, {} dropped, {} corrupted, {} timeouts",
        report.elapsed.as_millis(),
        report.stats.sent,
        report.stats.dropped,
        report.stats.corrupted,
        report.stats.timer_fires
    );
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use log::info;

use playsync_clock::{ClockConfig, ClockCore, ClockView, MonotonicSource, UpdateFlags};
use playsync_types::{Rational, TICKS_PER_SECOND, Ticks};

mod producer;
mod queue;
mod renderer;
mod stats;

use producer::ProducerConfig;
use queue::FrameQueue;

#[derive(Parser, Debug)]
#[command(name = "playsim")]
#[command(about = "Drive a playback clock with a simulated decoder and renderer")]
struct Args {
    /// Clock configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of units to feed
    #[arg(short = 'n', long, default_value = "250")]
    frames: u64,

    /// Units per second of stream time
    #[arg(long, default_value = "50")]
    fps: u32,

    /// Largest random timing error per observation, in milliseconds
    #[arg(
        short,
        long,
        default_value = "5",
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    jitter_ms: i64,

    /// Seed for the timing noise
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Playback rate as N or N/D (e.g. "3/2")
    #[arg(long, default_value = "1", value_parser = parse_rate)]
    rate: Rational,

    /// Pause before feeding this unit
    #[arg(long)]
    pause_at: Option<u64>,

    /// How long to stay paused, in milliseconds
    #[arg(
        long,
        default_value = "500",
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    pause_ms: i64,

    /// Drop units whose deadline is further out than this, in milliseconds
    #[arg(
        short,
        long,
        default_value = "1000",
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    bound_ms: i64,

    /// Every n-th unit carries a timestamp far in the future
    #[arg(long)]
    corrupt_every: Option<u64>,

    /// The source cannot be held back by the renderer
    #[arg(long)]
    no_pace: bool,

    /// The source cannot be rebuffered; freezes the jitter estimate
    #[arg(long)]
    live: bool,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.fps == 0 {
        bail!("--fps must be at least 1");
    }

    let config = match &args.config {
        Some(path) => ClockConfig::from_json_file(path)
            .with_context(|| format!("failed to load clock config from {}", path.display()))?,
        None => ClockConfig::default(),
    };
    let clock = ClockCore::new(config, args.rate).context("failed to create clock")?;

    let flags = UpdateFlags {
        can_pace: !args.no_pace && !args.live,
        buffering_allowed: !args.live,
    };
    let producer_config = ProducerConfig {
        frames: args.frames,
        frame_ticks: Ticks(TICKS_PER_SECOND / i64::from(args.fps)),
        jitter: Ticks::from_millis(args.jitter_ms),
        seed: args.seed,
        pause_at: args.pause_at,
        pause: Ticks::from_millis(args.pause_ms),
        corrupt_every: args.corrupt_every,
        flags,
    };

    info!(
        "feeding {} units at {} fps, rate {} ({:.2}x), minimum delay {} us",
        args.frames,
        args.fps,
        args.rate,
        args.rate.to_f64(),
        clock.jitter().0
    );

    let source = MonotonicSource::new();
    let shared = stats::shared();
    let queue = Arc::new(FrameQueue::new());
    let stop = Arc::new(AtomicBool::new(false));

    let renderer_handle = {
        let reader = clock.reader();
        let queue = Arc::clone(&queue);
        let shared = Arc::clone(&shared);
        let stop = Arc::clone(&stop);
        let bound = Ticks::from_millis(args.bound_ms);
        thread::Builder::new()
            .name("renderer".into())
            .spawn(move || renderer::run(reader, queue, bound, source, shared, stop))
            .context("failed to spawn renderer thread")?
    };

    let producer_handle = {
        let queue = Arc::clone(&queue);
        let shared = Arc::clone(&shared);
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("producer".into())
            .spawn(move || producer::run(clock, producer_config, source, queue, shared, stop))
            .context("failed to spawn producer thread")?
    };

    let clock = producer_handle
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
    renderer_handle
        .join()
        .map_err(|_| anyhow::anyhow!("renderer thread panicked"))?;

    if let Ok(state) = clock.state() {
        info!(
            "played {} us of stream in {} us",
            state.stream_duration.0, state.system_duration.0
        );
    }

    let stats = shared.lock().clone();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats.report());
    }

    Ok(())
}

/**
    Parse a playback rate written as `N` or `N/D`.
*/
fn parse_rate(s: &str) -> Result<Rational, String> {
    let (num, den) = match s.split_once('/') {
        Some((num, den)) => (num.trim(), den.trim()),
        None => (s.trim(), "1"),
    };
    let num: i32 = num.parse().map_err(|e| format!("invalid numerator '{num}': {e}"))?;
    let den: i32 = den.parse().map_err(|e| format!("invalid denominator '{den}': {e}"))?;
    if den == 0 {
        return Err("denominator must not be zero".to_string());
    }
    let rate = Rational::new(num, den)
        .reduced()
        .ok_or_else(|| format!("rate {num}/{den} is out of range"))?;
    if !rate.is_positive() {
        return Err(format!("rate must be positive, got {rate}"));
    }
    Ok(rate)
}

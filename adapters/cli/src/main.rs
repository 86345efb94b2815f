#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Wegen arcade session.

mod bot;
mod config;
mod logging;
mod simulation;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wegen_arcade_core::{SessionResult, WELCOME_BANNER};
use wegen_arcade_persistence::{
    Delivery, JsonLineSink, OfflineSink, ScoreSink, StagingArea, Submission,
};
use wegen_arcade_presentation::AudioCue;
use wegen_arcade_session::query;

use bot::Bot;
use config::Overrides;
use logging::{LogAudio, LogRenderer};
use simulation::{RunPlan, Simulation};

/// Plays one seeded arcade session with a simulated player.
#[derive(Debug, Parser)]
#[command(name = "wegen-arcade", version, about)]
struct Args {
    /// TOML file with session and spawn settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for every random stream in the session.
    #[arg(long)]
    seed: Option<u64>,
    /// Seconds in the starting time bank.
    #[arg(long)]
    time_bank: Option<u32>,
    /// Near-miss radius in world units.
    #[arg(long)]
    near_miss_radius: Option<f32>,
    /// Probability that a simulated press lands on its target.
    #[arg(long, default_value_t = 0.85)]
    accuracy: f64,
    /// Simulated reaction delay between presses, in milliseconds.
    #[arg(long, default_value_t = 350)]
    reaction_ms: u64,
    /// Seed of the simulated player.
    #[arg(long, default_value_t = 0x0b07)]
    bot_seed: u64,
    /// Frame length, in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Pause once the session clock reaches this many seconds.
    #[arg(long)]
    pause_at: Option<f64>,
    /// Wall-clock seconds to stay paused.
    #[arg(long, default_value_t = 2.0)]
    pause_for: f64,
    /// Simulate host termination once the session clock reaches this many seconds.
    #[arg(long)]
    terminate_at: Option<f64>,
    /// Identity attached to the submitted score.
    #[arg(long, default_value = "guest")]
    player: String,
    /// Stage the score locally instead of printing it.
    #[arg(long)]
    offline: bool,
    /// File that holds undelivered scores.
    #[arg(long, default_value = "wegen-arcade-staged.jsonl")]
    staging: PathBuf,
    /// Treat every audio asset as missing.
    #[arg(long)]
    no_audio: bool,
}

impl Args {
    fn plan(&self) -> Result<RunPlan> {
        Ok(RunPlan {
            frame: Duration::from_millis(self.frame_ms.max(1)),
            pause_at: self.pause_at.map(seconds).transpose()?,
            pause_for: seconds(self.pause_for)?,
            terminate_at: self.terminate_at.map(seconds).transpose()?,
            ..RunPlan::default()
        })
    }
}

fn seconds(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid duration {value}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let overrides = Overrides {
        seed: args.seed,
        time_bank_secs: args.time_bank,
        near_miss_radius: args.near_miss_radius,
    };
    let config = config::load(args.config.as_deref(), overrides)?;
    let plan = args.plan()?;

    info!("{WELCOME_BANNER}");

    let bot = Bot::new(
        args.bot_seed,
        args.accuracy,
        config.session.near_miss_radius / 2.0,
        Duration::from_millis(args.reaction_ms),
    );
    let audio = if args.no_audio {
        LogAudio::without(AudioCue::ALL)
    } else {
        LogAudio::default()
    };
    let mut simulation = Simulation::new(&config, bot, LogRenderer::default(), audio);
    let Some(result) = simulation.run(&plan) else {
        info!("session closed without a result");
        return Ok(());
    };

    let snapshot = query::snapshot(simulation.session());
    info!(
        score = result.score,
        raw_score = result.raw_score,
        bonus = result.bonus_applied,
        misses = result.miss_count,
        perfect_hits = result.perfect_hit_count,
        elapsed_ms = snapshot.elapsed.as_millis() as u64,
        shakes = simulation.presenter().renderer().shakes(),
        left_on_screen = simulation.presenter().renderer().on_screen(),
        muted = simulation.presenter().audio().is_muted(),
        reason = ?result.reason,
        "session finished"
    );

    let staging = StagingArea::new(args.staging.clone());
    if args.offline {
        submit(OfflineSink, &args.player, staging, &result, false)
    } else {
        submit(JsonLineSink::new(io::stdout()), &args.player, staging, &result, true)
    }
}

fn submit<S: ScoreSink>(
    sink: S,
    player: &str,
    staging: StagingArea,
    result: &SessionResult,
    retry_staged: bool,
) -> Result<()> {
    let mut submission = Submission::new(sink, player).with_staging(staging);
    let delivery = submission
        .deliver(result)
        .context("failed to stage undelivered score")?;
    if delivery == Delivery::Dropped {
        warn!("score could not be delivered");
    }

    if retry_staged {
        match submission.flush_staged() {
            Ok(0) => {}
            Ok(flushed) => info!(flushed, "delivered staged scores"),
            Err(error) => warn!(%error, "failed to replay staged scores"),
        }
    }
    if !submission.unsaved().is_empty() {
        warn!(
            lost = submission.unsaved().len(),
            "staged scores could not be written back"
        );
    }
    Ok(())
}

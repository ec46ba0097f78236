//! Headless replay runner
//!
//! Plays a draw result (built-in preset or JSON file) through the full
//! stage sequence on a simulated clock and prints the final standings.
//! Useful for verifying a result file replays cleanly before it ships
//! to a real surface.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::debug;

use df_draw::{normalize_value, presets, DrawResult};
use df_replay::{
    AudioCue, CueSink, FeedbackBus, HapticPulse, HostView, PlaybackHost, ReplayError, ReplayPhase,
    ReplayResult, ReplayTiming, ResultSource, StayPut,
};

#[derive(Parser)]
#[command(name = "df-replay", version, about = "Headless draw replay runner")]
struct Args {
    /// Built-in preset to replay (see `--list-presets`)
    #[arg(long, conflicts_with = "file")]
    preset: Option<String>,

    /// Draw result JSON file (canonical or legacy export shape)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Timing profile: normal, turbo, instant
    #[arg(long, default_value = "turbo")]
    timing: String,

    /// Jump straight to the summary instead of playing through
    #[arg(long)]
    skip: bool,

    /// Simulated clock tick in milliseconds
    #[arg(long, default_value_t = 50.0)]
    tick_ms: f64,

    /// List built-in presets and exit
    #[arg(long)]
    list_presets: bool,
}

/// Cue sink that narrates to the debug log
struct LogSink;

impl CueSink for LogSink {
    fn play(&mut self, cue: AudioCue) {
        debug!("cue: {cue:?}");
    }

    fn pulse(&mut self, pulse: HapticPulse) {
        debug!("haptic: {pulse:?}");
    }
}

struct PresetSource(String);

impl ResultSource for PresetSource {
    fn fetch(&mut self, _draw_id: &str) -> ReplayResult<DrawResult> {
        presets::by_name(&self.0)
            .ok_or_else(|| ReplayError::Source(format!("unknown preset `{}`", self.0)))
    }
}

struct FileSource(PathBuf);

impl ResultSource for FileSource {
    fn fetch(&mut self, _draw_id: &str) -> ReplayResult<DrawResult> {
        let text = fs::read_to_string(&self.0)
            .map_err(|e| ReplayError::Source(format!("{}: {e}", self.0.display())))?;
        let value = serde_json::from_str(&text)
            .map_err(|e| ReplayError::Source(format!("{}: {e}", self.0.display())))?;
        let result = normalize_value(value)?;
        Ok(result)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_presets {
        for name in presets::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(timing) = ReplayTiming::by_name(&args.timing) else {
        bail!("unknown timing profile `{}`", args.timing);
    };
    if args.tick_ms <= 0.0 {
        bail!("--tick-ms must be positive");
    }

    let mut source: Box<dyn ResultSource> = match (&args.preset, &args.file) {
        (Some(name), _) => Box::new(PresetSource(name.clone())),
        (None, Some(path)) => Box::new(FileSource(path.clone())),
        (None, None) => Box::new(PresetSource("grand_draw".into())),
    };

    let fx = FeedbackBus::new(|| Box::new(LogSink));
    let mut host = PlaybackHost::mount(&mut *source, "cli", timing, fx, Box::new(StayPut));

    if let HostView::Unavailable(reason) = host.view() {
        bail!("replay unavailable: {reason}");
    }

    if args.skip {
        host.skip_to_end();
    } else {
        play_through(&mut host, args.tick_ms)?;
    }

    print_summary(&host)?;
    host.unmount();
    Ok(())
}

/// Drive the simulated clock until the summary view, narrating stage
/// transitions as they happen
fn play_through(host: &mut PlaybackHost, tick_ms: f64) -> Result<()> {
    let mut last_phase: Option<ReplayPhase> = None;

    // Generous cap: a normal-profile replay of a large draw stays well
    // under a few thousand simulated seconds
    let max_ticks = (3_600_000.0 / tick_ms).ceil() as u64;

    for _ in 0..max_ticks {
        host.tick(tick_ms);

        let phase = host
            .controller()
            .map(|c| c.phase())
            .context("controller missing after successful mount")?;

        if last_phase != Some(phase) {
            println!("▶ {}", phase.label());
            last_phase = Some(phase);
            // The CLI has no card-tapping viewer, so flip everything as
            // soon as the reveal stage opens
            if phase == ReplayPhase::Stage2 {
                host.reveal_remaining();
            }
        }

        if *host.view() == HostView::Summary {
            return Ok(());
        }
    }
    bail!("replay did not finish within the simulated clock budget")
}

fn print_summary(host: &PlaybackHost) -> Result<()> {
    let standings = host.standings().context("no standings at summary")?;
    println!("\nFinal standings");
    println!("───────────────");
    for row in &standings.rows {
        println!("  {}. {} ({})", row.rank, row.display_name, row.ticket);
    }
    Ok(())
}

//! Replay a landmark recording and print one status line per tick.
//!
//! ```text
//! palmsense-replay <recording.jsonl> [--profile NAME] [--tick 16ms] [--hold 120ms]
//!                  [--transitions-only] [--json-logs]
//! ```

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use palmsense_gesture::{GestureConfig, GesturePipeline};
use palmsense_runtime::{logging, replay, LoggingConfig, Recording, ReplayPacing};
use tracing::{error, info};

struct Options {
    recording: PathBuf,
    profile: String,
    tick: Option<Duration>,
    hold: Option<Duration>,
    transitions_only: bool,
    json_logs: bool,
}

fn main() {
    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(err) => {
            eprintln!("error: {err}\n\n{}", usage());
            process::exit(2);
        }
    };

    let log_config = if options.json_logs {
        LoggingConfig::json()
    } else {
        LoggingConfig::default()
    };
    logging::init(&log_config);

    if let Err(err) = run(&options) {
        error!(%err, "replay failed");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GestureConfig::preset(&options.profile)?;
    if let Some(hold) = options.hold {
        config = config.with_hold(hold);
    }
    let mut pipeline = GesturePipeline::new(config)?;
    let recording = Recording::open(&options.recording)?;

    let pacing = match options.tick {
        Some(interval) => ReplayPacing::Fixed(interval),
        None => ReplayPacing::PerRecord,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;

    let summary = replay(&recording, &mut pipeline, pacing, |signal| {
        if write_error.is_some() || (options.transitions_only && !signal.transition) {
            return;
        }
        if let Err(err) = writeln!(out, "{:>8.1}ms  {}", signal.at.as_secs_f64() * 1000.0, signal) {
            write_error = Some(err);
        }
    })?;

    if let Some(err) = write_error {
        // Closed pipe (e.g. `| head`) is not a failure
        if err.kind() != io::ErrorKind::BrokenPipe {
            return Err(err.into());
        }
    }

    info!(
        profile = %options.profile,
        ticks = summary.ticks,
        hands = summary.hands_seen,
        malformed = summary.malformed_frames,
        transitions = summary.transitions,
        bursts = summary.motion_bursts,
        "replay complete"
    );
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>, String> {
    let mut recording = None;
    let mut profile = "canonical".to_string();
    let mut tick = None;
    let mut hold = None;
    let mut transitions_only = false;
    let mut json_logs = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--profile" => {
                profile = args.next().ok_or("missing name after --profile")?;
            }
            "--tick" => {
                let value = args.next().ok_or("missing duration after --tick")?;
                tick = Some(parse_duration("--tick", &value)?);
            }
            "--hold" => {
                let value = args.next().ok_or("missing duration after --hold")?;
                hold = Some(parse_duration("--hold", &value)?);
            }
            "--transitions-only" => transitions_only = true,
            "--json-logs" => json_logs = true,
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(None);
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown argument: {value}"));
            }
            value => {
                if recording.is_some() {
                    return Err("multiple recordings provided".into());
                }
                recording = Some(PathBuf::from(value));
            }
        }
    }

    let recording = recording.ok_or("missing recording path")?;
    Ok(Some(Options {
        recording,
        profile,
        tick,
        hold,
        transitions_only,
        json_logs,
    }))
}

fn parse_duration(flag: &str, value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value).map_err(|e| format!("{flag} {value}: {e}"))?;
    if duration.is_zero() {
        return Err(format!("{flag} must be positive"));
    }
    Ok(duration)
}

fn usage() -> String {
    [
        "usage: palmsense-replay <recording.jsonl> [options]",
        "",
        "options:",
        "  --profile NAME        canonical | ambient-sound | spatial-field",
        "  --tick DURATION       tick at a fixed rate (e.g. 16ms) instead of once per record",
        "  --hold DURATION       override the profile's hold duration",
        "  --transitions-only    print only ticks where the state changed",
        "  --json-logs           log as JSON lines on stderr",
    ]
    .join("\n")
}

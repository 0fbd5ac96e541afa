//! posture-score - seated posture scoring from pose landmarks
//!
//! Reads one frame of pose-detector output per line, classifies each frame as
//! good posture or slouching, and reports the share of session time spent in
//! good posture.
//!
//! # Usage
//!
//! ```bash
//! # Live: pipe detector output in on stdin, Ctrl+C to end the session
//! python pose_bridge.py | ./posture-score
//!
//! # Replay a recorded session at 4x speed
//! ./posture-score --replay session.jsonl --speed 4
//!
//! # Synthetic sitter
//! ./simulation --duration 120 | ./posture-score --json
//! ```
//!
//! # Environment Variables
//!
//! - `POSTURE_CONFIG`: Path to a posture_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use posture_score::config::PostureConfig;
use posture_score::display;
use posture_score::pipeline::{FrameLoop, FrameSource, OverlayLogger, ReplaySource, StdinSource};
use posture_score::session::{Session, SessionExit, SessionReport};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "posture-score")]
#[command(about = "Score seated posture from per-frame pose landmarks")]
#[command(version)]
struct CliArgs {
    /// Replay a recorded JSON-lines session instead of reading stdin
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Replay speed multiplier (1 = recorded pace, 4 = 4x faster, 0 = no delay)
    #[arg(long, default_value = "1")]
    speed: u64,

    /// Path to posture_config.toml (overrides $POSTURE_CONFIG and ./posture_config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// End the session after this many seconds (0 = until stopped)
    #[arg(long, value_name = "SECS")]
    max_duration: Option<u64>,

    /// Print the session report as JSON instead of the text summary
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long, env = "POSTURE_LOG_JSON")]
    log_json: bool,
}

// ============================================================================
// Helpers
// ============================================================================

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so stdout stays clean for the report
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &CliArgs) -> Result<PostureConfig> {
    let mut config = match &args.config {
        Some(path) => PostureConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PostureConfig::load(),
    };
    if let Some(secs) = args.max_duration {
        config.session.max_duration_secs = secs;
    }
    Ok(config)
}

async fn run_session<S: FrameSource>(
    mut source: S,
    config: &PostureConfig,
    cancel_token: CancellationToken,
) -> SessionReport {
    let session = Session::from_config(config);
    FrameLoop::new(session, OverlayLogger, cancel_token)
        .with_session_config(&config.session)
        .run(&mut source)
        .await
}

/// Live mode reads stdin; replay mode reads a file.
fn reads_stdin(args: &CliArgs) -> bool {
    args.replay.is_none()
}

fn print_report(report: &SessionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json_pretty().context("Failed to serialize report")?);
    } else {
        for line in display::summary_lines(report) {
            println!("{line}");
        }
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let config = load_config(&args)?;
    let t = &config.thresholds;
    info!(
        "Thresholds: neck {:.3} | spine {:.3} | shoulders {:.3}",
        t.neck_threshold, t.spine_threshold, t.shoulder_threshold
    );
    if config.session.max_duration_secs > 0 {
        info!("⏱️  Time limit: {}s", config.session.max_duration_secs);
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  posture-score");
    info!("  Seated posture scoring from pose landmarks");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("");

    // Graceful stop via Ctrl+C; the session is still scored
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, ending session...");
        shutdown_token.cancel();
    });

    let stdin_mode = reads_stdin(&args);
    let report = if let Some(path) = &args.replay {
        let delay_ms = if args.speed == 0 {
            0
        } else {
            config.replay.frame_delay_ms / args.speed
        };
        let source = ReplaySource::from_path(path, delay_ms)
            .with_context(|| format!("Failed to open replay {}", path.display()))?;
        info!(
            "📥 Input: replay {} ({} frames, {}ms between frames)",
            path.display(),
            source.remaining(),
            delay_ms
        );
        run_session(source, &config, cancel_token).await
    } else {
        info!("📥 Input: stdin (JSON-lines pose frames)");
        run_session(StdinSource::stdin(), &config, cancel_token).await
    };

    if let SessionExit::CaptureFailure(reason) = &report.exit {
        warn!("Session ended early: {}", reason);
    }
    print_report(&report, args.json)?;

    info!("");
    info!("✓ posture-score session complete");

    // tokio reads stdin on a blocking thread that cannot be cancelled, so
    // runtime shutdown would wait for the upstream pipe to produce a line or close
    if stdin_mode {
        std::io::stdout().flush().context("Failed to flush report")?;
        std::process::exit(0);
    }
    Ok(())
}

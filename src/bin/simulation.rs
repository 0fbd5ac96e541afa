//! Seated Posture Simulation
//!
//! Generates pose-detector frames for a synthetic person at a desk, for
//! testing posture-score without a camera. The sitter moves through:
//! - Upright sitting
//! - Forward head slouch
//! - Sideways lean with a dropped shoulder
//! - Stepping away from the camera
//!
//! # Usage
//! ```bash
//! ./simulation --duration 120 --speed 10 | ./posture-score
//! ./simulation --duration 600 --seed 7 --score
//! ```

use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use posture_score::classifier::PostureClassifier;
use posture_score::config::defaults::SIMULATION_FPS;
use posture_score::display;
use posture_score::session::{Session, SessionExit};
use posture_score::timing::ManualClock;
use posture_score::types::{FrameRecord, Landmark, LandmarkKind, LandmarkSnapshot};

// ============================================================================
// Body Geometry (normalized image coordinates)
// ============================================================================

/// Shoulder height
const SHOULDER_Y: f64 = 0.45;
/// Hip height
const HIP_Y: f64 = 0.80;
/// Ear height
const EAR_Y: f64 = 0.27;
/// Left/right body edges
const LEFT_X: f64 = 0.42;
const RIGHT_X: f64 = 0.58;
/// Forward head offset while slouching
const SLOUCH_HEAD_OFFSET: f64 = 0.14;
/// Torso lean while leaning sideways
const LEAN_TORSO_OFFSET: f64 = 0.13;
/// Shoulder drop while leaning sideways
const LEAN_SHOULDER_DROP: f64 = 0.07;
/// Chance per frame that a hip is hidden behind the desk
const HIP_OCCLUSION_CHANCE: f64 = 0.02;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "posture-simulation")]
#[command(about = "Synthetic seated-posture frames for posture-score testing")]
#[command(version = "1.0")]
struct Args {
    /// Session length in seconds
    #[arg(short, long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=86_400))]
    duration: u32,

    /// Frames per second
    #[arg(long, default_value_t = SIMULATION_FPS, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,

    /// Time compression factor (1 = real-time, 1000 = no delay)
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=1000))]
    speed: u32,

    /// Score the generated session on a simulated clock instead of printing frames
    #[arg(long)]
    score: bool,

    /// Print the score report as JSON (with --score)
    #[arg(long)]
    json: bool,

    /// Suppress the phase log
    #[arg(short, long)]
    quiet: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Simulation Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Sitting upright (0-25%, 45-60%, 78-100%)
    Upright,
    /// Head pushed forward (25-45%)
    Slouching,
    /// Leaning to one side (60-70%)
    Leaning,
    /// Out of frame (70-78%)
    Away,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Upright => "Upright (ears over shoulders)",
            Phase::Slouching => "Slouching (forward head)",
            Phase::Leaning => "Leaning (torso and shoulders tilted)",
            Phase::Away => "Away (nobody in frame)",
        }
    }

    fn from_progress(progress: f64) -> Self {
        match progress {
            p if p < 0.25 => Phase::Upright,
            p if p < 0.45 => Phase::Slouching,
            p if p < 0.60 => Phase::Upright,
            p if p < 0.70 => Phase::Leaning,
            p if p < 0.78 => Phase::Away,
            _ => Phase::Upright,
        }
    }
}

// ============================================================================
// Simulation State
// ============================================================================

struct Sitter {
    rng: StdRng,
    phase: Phase,
    frame: u64,
    total_frames: u64,
    frame_interval: Duration,

    // Statistics
    undetected_frames: u64,
    occluded_frames: u64,

    jitter: Normal<f64>,
    sway: Normal<f64>,
}

impl Sitter {
    fn new(duration_secs: u32, fps: u32, seed: Option<u64>) -> Result<Self, rand_distr::NormalError> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            rng,
            phase: Phase::Upright,
            frame: 0,
            total_frames: u64::from(duration_secs) * u64::from(fps),
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(fps)),
            undetected_frames: 0,
            occluded_frames: 0,
            jitter: Normal::new(0.0, 0.004)?,
            sway: Normal::new(0.0, 0.012)?,
        })
    }

    fn progress(&self) -> f64 {
        self.frame as f64 / self.total_frames as f64
    }

    fn sim_time_secs(&self) -> f64 {
        self.frame as f64 * self.frame_interval.as_secs_f64()
    }

    fn finished(&self) -> bool {
        self.frame >= self.total_frames
    }

    fn update_phase(&mut self) -> bool {
        let new_phase = Phase::from_progress(self.progress());
        if new_phase != self.phase {
            self.phase = new_phase;
            true
        } else {
            false
        }
    }

    fn point(&mut self, x: f64, y: f64, visibility: f64) -> Landmark {
        Landmark::new(x + self.jitter.sample(&mut self.rng), y + self.jitter.sample(&mut self.rng))
            .with_visibility(visibility)
    }

    /// Generate the next frame; `None` when nobody is in view.
    fn next_snapshot(&mut self) -> Option<LandmarkSnapshot> {
        self.frame += 1;
        if self.phase == Phase::Away {
            self.undetected_frames += 1;
            return None;
        }

        // Slow head sway shared by both ears
        let sway = self.sway.sample(&mut self.rng).clamp(-0.03, 0.03);
        let (head_dx, torso_dx, shoulder_drop) = match self.phase {
            Phase::Slouching => (SLOUCH_HEAD_OFFSET, 0.0, 0.0),
            Phase::Leaning => (0.0, LEAN_TORSO_OFFSET, LEAN_SHOULDER_DROP),
            Phase::Upright | Phase::Away => (0.0, 0.0, 0.0),
        };

        let left_shoulder = self.point(LEFT_X + torso_dx, SHOULDER_Y + shoulder_drop, 0.99);
        let right_shoulder = self.point(RIGHT_X + torso_dx, SHOULDER_Y, 0.99);
        let left_ear = self.point(left_shoulder.x + head_dx + sway * 0.5, EAR_Y, 0.95);
        let right_ear = self.point(right_shoulder.x + head_dx + sway * 0.5, EAR_Y, 0.95);
        let nose = self.point((left_ear.x + right_ear.x) / 2.0, EAR_Y + 0.02, 0.99);

        let mut landmarks = vec![
            (LandmarkKind::Nose, nose),
            (LandmarkKind::LeftEar, left_ear),
            (LandmarkKind::RightEar, right_ear),
            (LandmarkKind::LeftShoulder, left_shoulder),
            (LandmarkKind::RightShoulder, right_shoulder),
        ];

        // Hips are sometimes hidden by the desk
        if self.rng.gen_bool(HIP_OCCLUSION_CHANCE) {
            self.occluded_frames += 1;
        } else {
            landmarks.push((LandmarkKind::LeftHip, self.point(LEFT_X, HIP_Y, 0.8)));
            landmarks.push((LandmarkKind::RightHip, self.point(RIGHT_X, HIP_Y, 0.8)));
        }

        Some(landmarks.into_iter().collect())
    }

    fn timestamp_ms(&self) -> u64 {
        (self.sim_time_secs() * 1000.0) as u64
    }
}

// ============================================================================
// Logging Utilities
// ============================================================================

fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", minutes, secs)
}

fn log_mission(time: f64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{}] {}", format_time(time), message);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut sitter = Sitter::new(args.duration, args.fps, args.seed)?;

    log_mission(0.0, &"=".repeat(60), args.quiet);
    log_mission(0.0, "SEATED POSTURE SIMULATION v1.0", args.quiet);
    log_mission(0.0, &"=".repeat(60), args.quiet);
    log_mission(0.0, &format!("  Duration: {}s ({} frames @ {} fps)", args.duration, sitter.total_frames, args.fps), args.quiet);
    if args.score {
        log_mission(0.0, "  Mode: offline scoring (simulated clock)", args.quiet);
    } else {
        log_mission(0.0, &format!("  Mode: JSON-lines frames, {}x speed", args.speed), args.quiet);
    }
    if let Some(seed) = args.seed {
        log_mission(0.0, &format!("  Random seed: {}", seed), args.quiet);
    }
    log_mission(0.0, "", args.quiet);
    log_mission(0.0, "SCENARIO PHASES:", args.quiet);
    log_mission(0.0, "  0-25%:   Upright", args.quiet);
    log_mission(0.0, "  25-45%:  Slouching", args.quiet);
    log_mission(0.0, "  45-60%:  Upright", args.quiet);
    log_mission(0.0, "  60-70%:  Leaning", args.quiet);
    log_mission(0.0, "  70-78%:  Away", args.quiet);
    log_mission(0.0, "  78-100%: Upright", args.quiet);
    log_mission(0.0, &"=".repeat(60), args.quiet);

    if args.score {
        run_offline(&mut sitter, &args)
    } else {
        run_stream(&mut sitter, &args)
    }
}

/// Write frames to stdout, paced for a live consumer.
fn run_stream(sitter: &mut Sitter, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let real_interval = sitter.frame_interval / args.speed;
    let start_time = Instant::now();

    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    while !sitter.finished() {
        let loop_start = Instant::now();
        log_phase_change(sitter, args.quiet);

        let timestamp_ms = sitter.timestamp_ms();
        let record = FrameRecord {
            timestamp_ms: Some(timestamp_ms),
            ..sitter
                .next_snapshot()
                .map_or_else(FrameRecord::undetected, FrameRecord::detected)
        };
        writeln!(stdout_lock, "{}", serde_json::to_string(&record)?)?;
        stdout_lock.flush()?;

        if args.speed < 1000 {
            let elapsed = loop_start.elapsed();
            if elapsed < real_interval {
                std::thread::sleep(real_interval - elapsed);
            }
        }
    }

    drop(stdout_lock);
    log_debrief(sitter, args.quiet);
    log_mission(
        sitter.sim_time_secs(),
        &format!("Real time: {:.1}s", start_time.elapsed().as_secs_f64()),
        args.quiet,
    );
    Ok(())
}

/// Score the session directly, advancing a simulated clock one frame at a time.
fn run_offline(sitter: &mut Sitter, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let clock = ManualClock::new();
    let mut session = Session::with_clock(PostureClassifier::default(), clock.clone());
    session.start();

    while !sitter.finished() {
        log_phase_change(sitter, args.quiet);
        let snapshot = sitter.next_snapshot();
        session.process_frame(snapshot.as_ref());
        clock.advance(sitter.frame_interval);
    }

    log_debrief(sitter, args.quiet);
    let report = session.finish(SessionExit::EndOfStream);
    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        for line in display::summary_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

fn log_phase_change(sitter: &mut Sitter, quiet: bool) {
    if sitter.update_phase() || sitter.frame == 0 {
        log_mission(sitter.sim_time_secs(), &format!(">>> PHASE: {}", sitter.phase.name()), quiet);
    }
}

fn log_debrief(sitter: &Sitter, quiet: bool) {
    let t = sitter.sim_time_secs();
    log_mission(t, &"=".repeat(60), quiet);
    log_mission(t, "SIMULATION COMPLETE", quiet);
    log_mission(t, &format!("Total frames: {}", sitter.frame), quiet);
    log_mission(t, &format!("Frames with nobody in view: {}", sitter.undetected_frames), quiet);
    log_mission(t, &format!("Frames with hips occluded: {}", sitter.occluded_frames), quiet);
    log_mission(t, &"=".repeat(60), quiet);
}

//! Hand AR - headless runner
//!
//! Replays recorded hand landmarks through the full gesture pipeline and
//! logs the resulting scene.
//!
//! Usage: `hand-ar [settings.json] [recording.json]`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use hand_ar::hand::{HandLandmarks, Landmark};
use hand_ar::telemetry::init_logging;
use hand_ar::tracker::{ReplaySource, TrackerError};
use hand_ar::{App, SessionMode, Settings};

/// Built-in recording: one hand pinches, drags right, and lets go
fn demo_source() -> ReplaySource {
    let open = |x: f32| {
        HandLandmarks::with_tips(Landmark::new(x - 0.1, 0.5, 0.0), Landmark::new(x + 0.1, 0.5, 0.0))
    };
    let pinched = |x: f32| {
        HandLandmarks::with_tips(Landmark::new(x, 0.5, 0.0), Landmark::new(x + 0.01, 0.5, 0.0))
    };

    let mut frames = vec![vec![open(0.4)]];
    frames.extend((0..10).map(|i| vec![pinched(0.4 + i as f32 * 0.02)]));
    frames.push(vec![open(0.6)]);
    frames.push(Vec::new());
    ReplaySource::from_hands(frames)
}

fn load_source(path: Option<&Path>) -> Result<ReplaySource, TrackerError> {
    match path {
        Some(path) => ReplaySource::from_file(path),
        None => Ok(demo_source()),
    }
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let settings_path = args.next();
    let recording_path = args.next();
    if args.next().is_some() {
        bail!("usage: hand-ar [settings.json] [recording.json]");
    }

    // Logging is configured from the settings, so report load errors after init
    let (settings, settings_error) = match &settings_path {
        Some(path) => match Settings::load(path) {
            Ok(settings) => (settings, None),
            Err(e) => (Settings::default(), Some(e)),
        },
        None => (Settings::default(), None),
    };

    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    if let (Some(path), Some(e)) = (&settings_path, settings_error) {
        log::warn!("Failed to load settings from {:?}: {}. Using defaults.", path, e);
    }

    let source = load_source(recording_path.as_deref()).with_context(|| match &recording_path {
        Some(path) => format!("loading recording {:?}", path),
        None => "building demo recording".to_string(),
    })?;

    let interval = Duration::from_millis(settings.tracker.frame_interval_ms.max(1));
    let mut app = App::new(settings);
    // No immersive display when headless
    app.set_session_mode(SessionMode::Fallback);
    app.start_tracking(source).context("starting hand tracking")?;

    let mut last_status = app.tracker_status();
    loop {
        let batches = app.update();
        if batches > 0 {
            log::debug!("Applied {} gesture batches", batches);
        }

        let status = app.tracker_status();
        if status != last_status {
            if let Some(message) = status.user_message() {
                log::info!("{}", message);
            }
            last_status = status;
        }

        if let Some(message) = app.tracking_error() {
            app.stop_tracking();
            bail!("{}", message);
        }
        if app.tracking_finished() {
            // Pick up whatever arrived after the last drain
            app.update();
            break;
        }
        if app.tracking_stopped() {
            app.stop_tracking();
            bail!("Hand tracker stopped unexpectedly");
        }
        std::thread::sleep(interval);
    }

    if let Some(stats) = app.tracker_stats() {
        log::info!(
            "Processed {} frames ({} skipped, {} failed), {} gestures, avg {:.2}ms",
            stats.frames_processed,
            stats.frames_skipped,
            stats.frames_failed,
            stats.gestures_emitted,
            stats.avg_detect_ms
        );
    }
    app.stop_tracking();

    let snapshot = app.snapshot();
    log::info!("{} objects placed", snapshot.objects.len());
    for object in &snapshot.objects {
        log::info!(
            "  object {} at ({:.3}, {:.3}, {:.3})",
            object.id,
            object.position.x,
            object.position.y,
            object.position.z
        );
    }

    Ok(())
}

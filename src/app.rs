//! Application state
//!
//! Ties the hand tracker to the scene. Call [`App::update`] once per
//! rendered frame, then hand [`App::snapshot`] to the renderer.

use crate::gesture::HandGesture;
use crate::scene::controller::ApplyReport;
use crate::scene::{ObjectId, ObjectStore, PlacedObject, SceneController, SceneSnapshot, Selection};
use crate::settings::Settings;
use crate::telemetry::DetectionStatsSnapshot;
use crate::tracker::{HandTracker, InitState, LandmarkSource, TrackerError};

/// What kind of rendering session is available
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// Still probing for immersive AR support
    #[default]
    Checking,
    /// Immersive AR session running
    Immersive,
    /// No immersive session; camera passthrough only
    Fallback,
}

impl SessionMode {
    /// Status text for the on-screen indicator
    pub fn label(&self) -> &'static str {
        match self {
            SessionMode::Checking => "Checking AR support...",
            SessionMode::Immersive => "AR Mode Active",
            SessionMode::Fallback => "Fallback Mode (Camera Only)",
        }
    }
}

/// Main application state
pub struct App {
    settings: Settings,
    store: ObjectStore,
    controller: SceneController,
    selection: Selection,
    tracker: Option<HandTracker>,
    session_mode: SessionMode,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let controller = SceneController::new(settings.scene.clone());
        Self {
            settings,
            store: ObjectStore::new(),
            controller,
            selection: None,
            tracker: None,
            session_mode: SessionMode::Checking,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start hand tracking with `source`, replacing any running tracker
    pub fn start_tracking<S: LandmarkSource + 'static>(
        &mut self,
        source: S,
    ) -> Result<(), TrackerError> {
        self.stop_tracking();
        log::info!("Starting hand tracking...");
        self.tracker = Some(HandTracker::spawn(source, self.settings.tracker.clone())?);
        Ok(())
    }

    /// Stop hand tracking and release the source
    pub fn stop_tracking(&mut self) {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.stop();
            log::info!("Hand tracking stopped");
        }
    }

    /// Apply every gesture batch the tracker produced since the last call.
    ///
    /// Returns how many batches were applied.
    pub fn update(&mut self) -> usize {
        let Some(tracker) = &self.tracker else { return 0 };
        let batches = tracker.drain_gestures();
        for batch in &batches {
            self.apply_gestures(batch);
        }
        batches.len()
    }

    /// Apply one gesture batch to the scene with the current selection
    pub fn apply_gestures(&mut self, gestures: &[HandGesture]) -> ApplyReport {
        self.controller.apply(&mut self.store, gestures, self.selection)
    }

    /// Select an object for translation. Unknown ids are ignored.
    pub fn select(&mut self, id: ObjectId) -> bool {
        if self.store.contains(id) {
            self.selection = Some(id);
            true
        } else {
            log::warn!("Cannot select object {}: no such object", id);
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Remove the selected object, if any, and clear the selection
    pub fn delete_selected(&mut self) -> Option<PlacedObject> {
        let id = self.selection.take()?;
        let removed = self.store.remove(id);
        if removed.is_some() {
            log::info!("Deleted object {}", id);
        }
        removed
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.store
    }

    /// Renderer view of the current frame
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot::capture(&self.store, self.selection)
    }

    pub fn set_session_mode(&mut self, mode: SessionMode) {
        if self.session_mode != mode {
            log::info!("Session mode: {}", mode.label());
        }
        self.session_mode = mode;
        self.controller.set_session_active(mode == SessionMode::Immersive);
    }

    pub fn session_mode(&self) -> SessionMode {
        self.session_mode
    }

    pub fn status_label(&self) -> &'static str {
        self.session_mode.label()
    }

    /// Initialization state of the landmark source
    pub fn tracker_status(&self) -> InitState {
        self.tracker
            .as_ref()
            .map(|t| t.status())
            .unwrap_or_default()
    }

    /// User-facing error once tracking has given up
    pub fn tracking_error(&self) -> Option<String> {
        let status = self.tracker_status();
        if status.is_failed() {
            status.user_message()
        } else {
            None
        }
    }

    /// User-requested retry after tracking gave up
    pub fn retry_tracking(&self) {
        if let Some(tracker) = &self.tracker {
            tracker.retry();
        }
    }

    pub fn tracker_stats(&self) -> Option<DetectionStatsSnapshot> {
        self.tracker.as_ref().map(|t| t.stats())
    }

    /// Whether the tracker's source has played out
    pub fn tracking_finished(&self) -> bool {
        self.tracker.as_ref().map(|t| t.is_finished()).unwrap_or(false)
    }

    /// Whether the tracker thread has exited, whether the source played out
    /// or the thread died
    pub fn tracking_stopped(&self) -> bool {
        self.tracker.as_ref().map(|t| t.is_stopped()).unwrap_or(false)
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{GestureDetector, GesturePhase};
    use crate::hand::{HandLandmarks, Landmark};
    use crate::tracker::{DetectionLoop, ReplaySource, RetryPolicy, TickOutcome, TrackerConfig};
    use glam::Vec3;
    use std::time::{Duration, Instant};

    fn pinch(phase: GesturePhase, x: f32) -> HandGesture {
        HandGesture::pinch(phase, Vec3::new(x, 0.0, 0.0), 0)
    }

    /// Thumb and index tips 0.02 apart in scene space, centred near `x`
    fn pinched(x: f32) -> HandLandmarks {
        HandLandmarks::with_tips(Landmark::new(x, 0.5, 0.0), Landmark::new(x + 0.01, 0.5, 0.0))
    }

    fn open(x: f32) -> HandLandmarks {
        HandLandmarks::with_tips(Landmark::new(x - 0.2, 0.5, 0.0), Landmark::new(x + 0.2, 0.5, 0.0))
    }

    /// Scene-space x of the pinch midpoint produced by `pinched(x)`
    fn pinch_x(x: f32) -> f32 {
        (x + 0.005 - 0.5) * 2.0
    }

    fn fast_settings() -> Settings {
        Settings {
            tracker: TrackerConfig {
                frame_interval_ms: 1,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Run a recording through a detection loop, returning every non-empty batch
    fn detect_all(frames: Vec<Vec<HandLandmarks>>) -> Vec<Vec<HandGesture>> {
        let mut detection = DetectionLoop::new(
            ReplaySource::from_hands(frames),
            RetryPolicy::default(),
            GestureDetector::default(),
        );
        let t0 = Instant::now();
        let mut batches = Vec::new();
        for i in 0..1000 {
            match detection.tick(t0 + Duration::from_millis(i * 16)) {
                TickOutcome::Gestures(gestures) => batches.push(gestures),
                TickOutcome::Finished => return batches,
                _ => {}
            }
        }
        panic!("recording never finished");
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    fn assert_close(actual: Vec3, expected: Vec3) {
        assert!(actual.abs_diff_eq(expected, 1e-4), "expected {:?}, got {:?}", expected, actual);
    }

    #[test]
    fn test_status_labels() {
        let mut app = App::new(Settings::default());
        assert_eq!(app.status_label(), "Checking AR support...");
        app.set_session_mode(SessionMode::Immersive);
        assert_eq!(app.status_label(), "AR Mode Active");
        app.set_session_mode(SessionMode::Fallback);
        assert_eq!(app.status_label(), "Fallback Mode (Camera Only)");
    }

    #[test]
    fn test_select_requires_existing_object() {
        let mut app = App::new(Settings::default());
        assert!(!app.select(ObjectId(7)));
        assert_eq!(app.selection(), None);

        let created = app.apply_gestures(&[pinch(GesturePhase::Start, 0.0)]).created.unwrap();
        assert!(app.select(created));
        assert_eq!(app.selection(), Some(created));
        assert!(app.snapshot().objects[0].selected);
    }

    #[test]
    fn test_delete_selected() {
        let mut app = App::new(Settings::default());
        let id = app.apply_gestures(&[pinch(GesturePhase::Start, 0.0)]).created.unwrap();
        assert!(app.delete_selected().is_none());

        app.select(id);
        assert_eq!(app.delete_selected().map(|o| o.id), Some(id));
        assert!(app.objects().is_empty());
        assert_eq!(app.selection(), None);
    }

    #[test]
    fn test_fallback_mode_blocks_gestures_when_session_required() {
        let mut settings = Settings::default();
        settings.scene.require_session = true;
        let mut app = App::new(settings);

        app.set_session_mode(SessionMode::Fallback);
        app.apply_gestures(&[pinch(GesturePhase::Start, 0.0)]);
        assert!(app.objects().is_empty());

        app.set_session_mode(SessionMode::Immersive);
        app.apply_gestures(&[pinch(GesturePhase::Start, 0.0)]);
        assert_eq!(app.objects().len(), 1);
    }

    #[test]
    fn test_no_tracker() {
        let mut app = App::new(Settings::default());
        assert_eq!(app.update(), 0);
        assert_eq!(app.tracker_status(), InitState::Uninitialized);
        assert!(app.tracking_error().is_none());
        assert!(app.tracker_stats().is_none());
        assert!(!app.tracking_finished());
        assert!(!app.tracking_stopped());
    }

    #[test]
    fn test_pinch_creates_object_at_midpoint() {
        let batches = detect_all(vec![vec![open(0.5)], vec![pinched(0.5)], vec![open(0.5)]]);
        let mut app = App::new(Settings::default());
        for batch in &batches {
            app.apply_gestures(batch);
        }

        assert_eq!(app.objects().len(), 1);
        let object = app.objects().iter().next().unwrap();
        assert_close(object.position, Vec3::new(pinch_x(0.5), 0.0, 0.0));
    }

    #[test]
    fn test_two_hands_starting_together_create_one_object() {
        let batches = detect_all(vec![vec![pinched(0.3), pinched(0.7)]]);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);

        let mut app = App::new(Settings::default());
        app.apply_gestures(&batches[0]);

        assert_eq!(app.objects().len(), 1);
        let object = app.objects().iter().next().unwrap();
        assert_close(object.position, Vec3::new(pinch_x(0.3), 0.0, 0.0));
    }

    #[test]
    fn test_drag_translates_selected_object() {
        let batches = detect_all(vec![
            vec![pinched(0.5)],
            vec![pinched(0.55)],
            vec![pinched(0.6)],
            vec![pinched(0.65)],
            vec![open(0.65)],
        ]);
        let phases: Vec<GesturePhase> = batches.iter().map(|b| b[0].phase).collect();
        assert_eq!(
            phases,
            vec![
                GesturePhase::Start,
                GesturePhase::Move,
                GesturePhase::Move,
                GesturePhase::Move,
                GesturePhase::End
            ]
        );

        let mut app = App::new(Settings::default());
        let id = app.apply_gestures(&batches[0]).created.unwrap();
        assert!(app.select(id));
        for batch in &batches[1..] {
            app.apply_gestures(batch);
        }

        // The first move only samples; the object follows from there
        let expected = pinch_x(0.5) + (pinch_x(0.65) - pinch_x(0.55));
        assert_close(app.objects().get(id).unwrap().position, Vec3::new(expected, 0.0, 0.0));
    }

    #[test]
    fn test_changing_selection_restarts_drag() {
        let mut app = App::new(Settings::default());
        let first = app.apply_gestures(&[pinch(GesturePhase::Start, 0.0)]).created.unwrap();
        let second = app
            .apply_gestures(&[HandGesture::pinch(GesturePhase::Start, Vec3::ONE, 0)])
            .created
            .unwrap();
        assert_ne!(first, second);

        app.select(first);
        app.apply_gestures(&[pinch(GesturePhase::Move, 0.0)]);
        app.apply_gestures(&[pinch(GesturePhase::Move, 0.1)]);
        assert_close(app.objects().get(first).unwrap().position, Vec3::new(0.1, 0.0, 0.0));

        // Switching objects must not carry the old sample over
        app.select(second);
        let report = app.apply_gestures(&[pinch(GesturePhase::Move, 0.5)]);
        assert_eq!(report.translated, None);
        assert_close(app.objects().get(second).unwrap().position, Vec3::ONE);

        app.clear_selection();
        app.apply_gestures(&[pinch(GesturePhase::Move, 0.9)]);
        assert_close(app.objects().get(first).unwrap().position, Vec3::new(0.1, 0.0, 0.0));
        assert_close(app.objects().get(second).unwrap().position, Vec3::ONE);
    }

    #[test]
    fn test_unknown_selection_is_harmless() {
        let mut app = App::new(Settings::default());
        assert!(!app.select(ObjectId(42)));
        let report = app.apply_gestures(&[pinch(GesturePhase::Move, 1.0)]);
        assert_eq!(report.translated, None);
        assert!(app.objects().is_empty());
    }

    #[test]
    fn test_tracker_feeds_app() {
        let mut app = App::new(fast_settings());
        app.start_tracking(ReplaySource::from_hands(vec![
            vec![open(0.5)],
            vec![pinched(0.5)],
            vec![pinched(0.5)],
            vec![open(0.5)],
            vec![pinched(0.2)],
        ]))
        .unwrap();

        assert!(wait_until(|| {
            app.update();
            app.tracking_finished()
        }));
        app.update();

        assert_eq!(app.objects().len(), 2);
        assert!(app.tracker_status().is_ready());
        assert!(app.tracking_stopped());
        assert_eq!(app.tracker_stats().unwrap().frames_processed, 5);
        app.stop_tracking();
    }

    /// Comes up fine, then panics on its first frame
    struct CrashingSource;

    impl LandmarkSource for CrashingSource {
        fn initialize(&mut self) -> Result<(), TrackerError> {
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn detect(&mut self, _timestamp_ms: u64) -> Result<Vec<HandLandmarks>, TrackerError> {
            panic!("landmark model crashed");
        }

        fn release(&mut self) {}
    }

    #[test]
    fn test_crashed_tracker_is_reported_stopped() {
        let mut app = App::new(fast_settings());
        app.start_tracking(CrashingSource).unwrap();

        assert!(wait_until(|| app.tracking_stopped()));
        assert!(!app.tracking_finished());
        assert!(app.tracking_error().is_none());
        assert_eq!(app.update(), 0);
        app.stop_tracking();
        assert!(!app.tracking_stopped());
    }
}

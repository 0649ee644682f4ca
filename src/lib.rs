//! Hand AR - gesture driven object placement
//!
//! Turns per-frame hand landmarks from a landmark model into pinch gestures,
//! and pinch gestures into placed and translated scene objects. Rendering,
//! camera capture and the landmark model itself live outside this crate; the
//! model is reached through [`tracker::LandmarkSource`] and the renderer reads
//! [`scene::SceneSnapshot`] once per frame.

pub mod app;
pub mod gesture;
pub mod hand;
pub mod scene;
pub mod settings;
pub mod telemetry;
pub mod tracker;

pub use app::{App, SessionMode};
pub use settings::Settings;

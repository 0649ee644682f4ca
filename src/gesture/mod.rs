//! Gesture events
//!
//! [`HandGesture`] is what the scene consumes. Events come out of the
//! per-hand state machine in [`detector`], at most one per hand per frame.

pub mod detector;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use detector::{GestureConfig, GestureDetector, PINCH_THRESHOLD};

/// Gesture kinds
///
/// Only `Pinch` is produced today. `Rotate` and `Scale` are reserved for
/// detectors that fill in [`HandGesture::angle`] and [`HandGesture::scale`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Pinch,
    Rotate,
    Scale,
}

/// Where a gesture is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GesturePhase {
    Start,
    Move,
    End,
}

/// A gesture observed on one hand during one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandGesture {
    pub kind: GestureKind,
    pub phase: GesturePhase,
    /// Scene-space position of the gesture
    pub position: Vec3,
    /// Index of the hand within the frame's detections
    pub hand_index: usize,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
}

impl HandGesture {
    /// A pinch event at full confidence
    pub fn pinch(phase: GesturePhase, position: Vec3, hand_index: usize) -> Self {
        Self {
            kind: GestureKind::Pinch,
            phase,
            position,
            hand_index,
            confidence: 1.0,
            angle: None,
            scale: None,
        }
    }

    pub fn is(&self, kind: GestureKind, phase: GesturePhase) -> bool {
        self.kind == kind && self.phase == phase
    }
}

/// First gesture of the given kind and phase, in hand-index order
pub fn find_gesture(
    gestures: &[HandGesture],
    kind: GestureKind,
    phase: GesturePhase,
) -> Option<&HandGesture> {
    gestures.iter().find(|g| g.is(kind, phase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_gesture_first_match_wins() {
        let gestures = vec![
            HandGesture::pinch(GesturePhase::Move, Vec3::X, 0),
            HandGesture::pinch(GesturePhase::Start, Vec3::Y, 1),
            HandGesture::pinch(GesturePhase::Start, Vec3::Z, 2),
        ];

        let found = find_gesture(&gestures, GestureKind::Pinch, GesturePhase::Start).unwrap();
        assert_eq!(found.hand_index, 1);
        assert!(find_gesture(&gestures, GestureKind::Pinch, GesturePhase::End).is_none());
        assert!(find_gesture(&gestures, GestureKind::Rotate, GesturePhase::Move).is_none());
    }

    #[test]
    fn test_gesture_json_shape() {
        let gesture = HandGesture::pinch(GesturePhase::Start, Vec3::new(0.1, 0.2, 0.3), 0);
        let json = serde_json::to_value(&gesture).unwrap();
        assert_eq!(json["kind"], "pinch");
        assert_eq!(json["phase"], "start");
        assert!(json.get("angle").is_none());
    }
}

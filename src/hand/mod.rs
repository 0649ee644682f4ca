//! Hand landmark model
//!
//! A detected hand is a fixed set of 21 landmarks in normalized image
//! coordinates (x and y in [0, 1], z a relative depth estimate), in the
//! MediaPipe landmark order.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of landmarks per hand
pub const LANDMARK_COUNT: usize = 21;

/// Wrist landmark id
pub const WRIST: usize = 0;
/// Thumb tip landmark id
pub const THUMB_TIP: usize = 4;
/// Index fingertip landmark id
pub const INDEX_FINGER_TIP: usize = 8;

/// Errors building a hand from raw landmark data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandError {
    #[error("expected 21 landmarks per hand, got {0}")]
    WrongLandmarkCount(usize),
}

/// A single tracked point on a hand
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Visibility score, when the model reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    /// Map this landmark into scene space.
    ///
    /// x and y are re-centred onto [-1, 1], y is flipped so up is positive,
    /// and depth is flipped and doubled so points further from the camera
    /// land on negative Z (the renderer's forward axis).
    pub fn to_scene_space(&self) -> Vec3 {
        Vec3::new(
            (self.x - 0.5) * 2.0,
            (self.y - 0.5) * -2.0,
            self.z * -2.0,
        )
    }
}

/// Which hand the model believes it saw
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

/// One detected hand
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    landmarks: [Landmark; LANDMARK_COUNT],
    #[serde(default)]
    pub handedness: Handedness,
}

impl HandLandmarks {
    /// Build a hand from a landmark slice, which must hold exactly 21 points
    pub fn from_slice(points: &[Landmark]) -> Result<Self, HandError> {
        let landmarks: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| HandError::WrongLandmarkCount(points.len()))?;
        Ok(Self {
            landmarks,
            handedness: Handedness::Unknown,
        })
    }

    /// Build a hand with every landmark at the image centre except the
    /// thumb and index tips. Mostly useful for recordings and tests.
    pub fn with_tips(thumb_tip: Landmark, index_tip: Landmark) -> Self {
        let mut landmarks = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        landmarks[THUMB_TIP] = thumb_tip;
        landmarks[INDEX_FINGER_TIP] = index_tip;
        Self {
            landmarks,
            handedness: Handedness::Unknown,
        }
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        self
    }

    pub fn landmark(&self, id: usize) -> Option<&Landmark> {
        self.landmarks.get(id)
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    /// Thumb tip in scene space
    pub fn thumb_tip(&self) -> Vec3 {
        self.landmarks[THUMB_TIP].to_scene_space()
    }

    /// Index fingertip in scene space
    pub fn index_tip(&self) -> Vec3 {
        self.landmarks[INDEX_FINGER_TIP].to_scene_space()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centre_maps_to_origin() {
        let p = Landmark::new(0.5, 0.5, 0.0).to_scene_space();
        assert_eq!(p, Vec3::ZERO);
    }

    #[test]
    fn test_corner_mapping() {
        let p = Landmark::new(1.0, 1.0, 1.0).to_scene_space();
        assert_eq!(p, Vec3::new(1.0, -1.0, -2.0));

        let p = Landmark::new(0.0, 0.0, 0.0).to_scene_space();
        assert_eq!(p, Vec3::new(-1.0, 1.0, 0.0));
    }

    #[test]
    fn test_from_slice_length_check() {
        let points = vec![Landmark::default(); 20];
        assert_eq!(
            HandLandmarks::from_slice(&points),
            Err(HandError::WrongLandmarkCount(20))
        );

        let points = vec![Landmark::default(); LANDMARK_COUNT];
        assert!(HandLandmarks::from_slice(&points).is_ok());
    }

    #[test]
    fn test_with_tips() {
        let hand =
            HandLandmarks::with_tips(Landmark::new(1.0, 0.5, 0.0), Landmark::new(0.0, 0.5, 0.0));
        assert_eq!(hand.thumb_tip(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(hand.index_tip(), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(hand.landmark(WRIST), Some(&Landmark::new(0.5, 0.5, 0.0)));
        assert!(hand.landmark(LANDMARK_COUNT).is_none());
    }

    #[test]
    fn test_landmark_json_visibility_optional() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.1,"y":0.2,"z":0.3}"#).unwrap();
        assert_eq!(lm.visibility, None);
        let lm: Landmark =
            serde_json::from_str(r#"{"x":0.1,"y":0.2,"z":0.3,"visibility":0.9}"#).unwrap();
        assert_eq!(lm.visibility, Some(0.9));
    }
}

//! Pinch detection
//!
//! Each hand index gets its own slot of state so that a pinch held across
//! frames produces `Start`, any number of `Move`s, then exactly one `End`.
//! A slot is created the first time its hand index is seen and lives for
//! the rest of the tracking session.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{GestureKind, GesturePhase, HandGesture};
use crate::hand::HandLandmarks;

/// Thumb-to-index distance (scene-space units) below which a hand is pinching
pub const PINCH_THRESHOLD: f32 = 0.05;

/// Gesture detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Pinch distance threshold in scene-space units
    pub pinch_threshold: f32,
    /// Frames a pinching hand may be missing before its pinch is ended.
    ///
    /// `None` keeps the pinch open until the same hand index is seen again.
    pub stale_pinch_frames: Option<u32>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: PINCH_THRESHOLD,
            stale_pinch_frames: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct SlotKey {
    hand_index: usize,
    kind: GestureKind,
}

/// Persistent per-hand state for one gesture kind
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct SlotState {
    is_pinching: bool,
    /// Where the current pinch began. Recorded for consumers that want it,
    /// nothing in the scene reads it yet.
    start_position: Option<Vec3>,
    last_position: Vec3,
    missed_frames: u32,
}

/// Per-hand gesture state machine
#[derive(Debug, Default)]
pub struct GestureDetector {
    config: GestureConfig,
    slots: HashMap<SlotKey, SlotState>,
}

impl GestureDetector {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            slots: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Run detection for every hand in a frame.
    ///
    /// Returns the frame's gestures in hand-index order. Hands with nothing
    /// to report contribute nothing, so a frame with no hands gives an empty
    /// list.
    pub fn process_frame(&mut self, hands: &[HandLandmarks]) -> Vec<HandGesture> {
        let mut gestures: Vec<HandGesture> = hands
            .iter()
            .enumerate()
            .filter_map(|(hand_index, hand)| self.detect_pinch(hand_index, hand))
            .collect();

        if let Some(limit) = self.config.stale_pinch_frames {
            gestures.extend(self.expire_missing_hands(hands.len(), limit));
        }

        gestures
    }

    /// Advance the pinch state machine for one hand
    pub fn detect_pinch(&mut self, hand_index: usize, hand: &HandLandmarks) -> Option<HandGesture> {
        let thumb_tip = hand.thumb_tip();
        let index_tip = hand.index_tip();

        let distance = thumb_tip.distance(index_tip);
        let is_pinching = distance < self.config.pinch_threshold;
        let position = (thumb_tip + index_tip) * 0.5;

        let slot = self
            .slots
            .entry(SlotKey {
                hand_index,
                kind: GestureKind::Pinch,
            })
            .or_default();
        slot.missed_frames = 0;

        let phase = match (slot.is_pinching, is_pinching) {
            (false, true) => {
                log::debug!(
                    "Pinch started on hand {} at {:?} (distance {:.4})",
                    hand_index,
                    position.to_array(),
                    distance
                );
                GesturePhase::Start
            }
            (true, false) => {
                log::debug!("Pinch ended on hand {}", hand_index);
                GesturePhase::End
            }
            (true, true) => GesturePhase::Move,
            (false, false) => {
                slot.start_position = None;
                return None;
            }
        };

        slot.is_pinching = is_pinching;
        slot.last_position = position;
        if phase == GesturePhase::Start {
            slot.start_position = Some(position);
        }

        Some(HandGesture::pinch(phase, position, hand_index))
    }

    /// Close out pinches whose hand has been missing for `limit` frames
    fn expire_missing_hands(&mut self, hand_count: usize, limit: u32) -> Vec<HandGesture> {
        let mut expired = Vec::new();

        for (key, slot) in self.slots.iter_mut() {
            if key.hand_index < hand_count || !slot.is_pinching {
                continue;
            }
            slot.missed_frames += 1;
            if slot.missed_frames >= limit {
                log::debug!(
                    "Hand {} missing for {} frames, ending its pinch",
                    key.hand_index,
                    slot.missed_frames
                );
                let mut gesture =
                    HandGesture::pinch(GesturePhase::End, slot.last_position, key.hand_index);
                gesture.kind = key.kind;
                gesture.confidence = 0.0;
                expired.push(gesture);
                *slot = SlotState::default();
            }
        }

        expired.sort_by_key(|g| g.hand_index);
        expired
    }

    /// Whether the given hand index is mid-pinch
    pub fn is_pinching(&self, hand_index: usize) -> bool {
        self.slots
            .get(&SlotKey {
                hand_index,
                kind: GestureKind::Pinch,
            })
            .map(|s| s.is_pinching)
            .unwrap_or(false)
    }

    /// Where the given hand's current pinch began
    pub fn pinch_start(&self, hand_index: usize) -> Option<Vec3> {
        self.slots
            .get(&SlotKey {
                hand_index,
                kind: GestureKind::Pinch,
            })
            .and_then(|s| s.start_position)
    }

    /// Forget all per-hand state
    pub fn reset(&mut self) {
        self.slots.clear();
    }
}

//! Gesture-to-scene rules
//!
//! Two rules run for every gesture batch, creation first:
//!
//! - **Create**: the first pinch `Start` places a new object at the pinch.
//!   At most one object per batch; lower hand indices win.
//! - **Translate**: while an object is selected, the first pinch `Move`
//!   moves it by the difference from the previous `Move` sample. Any break
//!   in continuity (no `Move`, selection change, no selection) drops the
//!   sample so the next move starts from zero.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{IdAllocator, ObjectId, ObjectStore, PlacedObject, SceneError, Selection};
use crate::gesture::{find_gesture, GestureKind, GesturePhase, HandGesture};

/// Scene rule settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Only apply gestures while an immersive session is running
    pub require_session: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            require_session: false,
        }
    }
}

/// What a batch did to the scene
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApplyReport {
    pub created: Option<ObjectId>,
    /// Offset applied to the selected object
    pub translated: Option<Vec3>,
}

/// Applies gesture batches to an [`ObjectStore`]
#[derive(Debug, Default)]
pub struct SceneController {
    config: SceneConfig,
    ids: IdAllocator,
    /// Previous `Move` sample used to compute translation deltas
    last_pinch_position: Option<Vec3>,
    last_selection: Selection,
    session_active: bool,
}

impl SceneController {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn set_session_active(&mut self, active: bool) {
        if self.session_active != active {
            log::info!("Immersive session {}", if active { "started" } else { "ended" });
        }
        self.session_active = active;
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn last_pinch_position(&self) -> Option<Vec3> {
        self.last_pinch_position
    }

    /// Apply one batch of gestures with the current selection
    pub fn apply(
        &mut self,
        store: &mut ObjectStore,
        gestures: &[HandGesture],
        selection: Selection,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        if self.config.require_session && !self.session_active {
            self.last_pinch_position = None;
            self.last_selection = selection;
            return report;
        }

        match self.create_object(store, gestures) {
            Ok(created) => report.created = created,
            Err(e) => log::warn!("Skipping object creation this frame: {}", e),
        }

        match self.translate_selected(store, gestures, selection) {
            Ok(delta) => report.translated = delta,
            Err(e) => {
                log::warn!("Skipping object translation this frame: {}", e);
                self.last_pinch_position = None;
            }
        }

        report
    }

    fn create_object(
        &mut self,
        store: &mut ObjectStore,
        gestures: &[HandGesture],
    ) -> Result<Option<ObjectId>, SceneError> {
        let Some(gesture) = find_gesture(gestures, GestureKind::Pinch, GesturePhase::Start) else {
            return Ok(None);
        };
        let position = checked_position(gesture)?;

        let id = self.ids.next_id();
        store.append(PlacedObject::new(id, position))?;
        log::info!("Placed object {} at {:?}", id, position.to_array());
        Ok(Some(id))
    }

    fn translate_selected(
        &mut self,
        store: &mut ObjectStore,
        gestures: &[HandGesture],
        selection: Selection,
    ) -> Result<Option<Vec3>, SceneError> {
        if selection != self.last_selection {
            self.last_pinch_position = None;
            self.last_selection = selection;
        }

        let Some(selected) = selection else {
            self.last_pinch_position = None;
            return Ok(None);
        };

        let Some(gesture) = find_gesture(gestures, GestureKind::Pinch, GesturePhase::Move) else {
            self.last_pinch_position = None;
            return Ok(None);
        };
        let current = checked_position(gesture)?;

        let applied = match self.last_pinch_position {
            Some(last) => {
                let delta = current - last;
                store.translate(selected, delta).then_some(delta)
            }
            None => None,
        };
        self.last_pinch_position = Some(current);

        Ok(applied)
    }
}

fn checked_position(gesture: &HandGesture) -> Result<Vec3, SceneError> {
    if gesture.position.is_finite() {
        Ok(gesture.position)
    } else {
        Err(SceneError::MalformedGesture {
            hand_index: gesture.hand_index,
            reason: format!("non-finite position {:?}", gesture.position.to_array()),
        })
    }
}

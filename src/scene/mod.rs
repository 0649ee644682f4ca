//! Scene state
//!
//! [`ObjectStore`] owns the placed objects; [`SceneController`] applies
//! gesture batches to it. The renderer only ever sees a [`SceneSnapshot`].

pub mod controller;
pub mod objects;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use controller::{SceneConfig, SceneController};
pub use objects::{IdAllocator, ObjectId, ObjectStore, PlacedObject};

/// The object currently eligible for translation, if any
pub type Selection = Option<ObjectId>;

/// Errors raised while applying gestures to the scene
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("object {0} already exists")]
    DuplicateId(ObjectId),
    #[error("malformed gesture from hand {hand_index}: {reason}")]
    MalformedGesture { hand_index: usize, reason: String },
}

/// One object as the renderer should draw it
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderObject {
    pub id: ObjectId,
    pub position: Vec3,
    pub selected: bool,
}

/// Read-only view of the scene for one rendered frame
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Objects in render order
    pub objects: Vec<RenderObject>,
    pub selection: Selection,
}

impl SceneSnapshot {
    pub fn capture(store: &ObjectStore, selection: Selection) -> Self {
        Self {
            objects: store
                .iter()
                .map(|o| RenderObject {
                    id: o.id,
                    position: o.position,
                    selected: Some(o.id) == selection,
                })
                .collect(),
            selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_marks_selection() {
        let mut store = ObjectStore::new();
        store.append(PlacedObject::new(ObjectId(1), Vec3::X)).unwrap();
        store.append(PlacedObject::new(ObjectId(2), Vec3::Y)).unwrap();

        let snapshot = SceneSnapshot::capture(&store, Some(ObjectId(2)));
        assert_eq!(snapshot.objects.len(), 2);
        assert!(!snapshot.objects[0].selected);
        assert!(snapshot.objects[1].selected);
        assert_eq!(snapshot.selection, Some(ObjectId(2)));

        let snapshot = SceneSnapshot::capture(&store, None);
        assert!(snapshot.objects.iter().all(|o| !o.selected));
    }
}

//! Placed objects and the store that owns them

use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::SceneError;

/// Stable identity of a placed object
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out strictly increasing ids based on the wall clock in milliseconds
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: Option<u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: the current time in milliseconds, or one past the previous
    /// id if the clock has not moved on (or went backwards)
    pub fn next_id(&mut self) -> ObjectId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let id = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last = Some(id);
        ObjectId(id)
    }
}

/// An object placed in the scene
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub position: Vec3,
}

impl PlacedObject {
    pub fn new(id: ObjectId, position: Vec3) -> Self {
        Self { id, position }
    }
}

/// Insertion-ordered collection of placed objects, unique by id
#[derive(Debug, Default, Clone)]
pub struct ObjectStore {
    objects: Vec<PlacedObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object at the end of the render order
    pub fn append(&mut self, object: PlacedObject) -> Result<(), SceneError> {
        if self.contains(object.id) {
            return Err(SceneError::DuplicateId(object.id));
        }
        self.objects.push(object);
        Ok(())
    }

    /// Replace the position of the matching object.
    ///
    /// Returns `false` and leaves the store untouched if no object has `id`.
    pub fn update_position(&mut self, id: ObjectId, position: Vec3) -> bool {
        match self.get_mut(id) {
            Some(object) => {
                object.position = position;
                true
            }
            None => false,
        }
    }

    /// Move the matching object by `delta`
    pub fn translate(&mut self, id: ObjectId, delta: Vec3) -> bool {
        match self.get_mut(id) {
            Some(object) => {
                object.position += delta;
                true
            }
            None => false,
        }
    }

    /// Remove an object, keeping the order of the rest
    pub fn remove(&mut self, id: ObjectId) -> Option<PlacedObject> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(idx))
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn get_mut(&mut self, id: ObjectId) -> Option<&mut PlacedObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Objects in insertion (render) order
    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter()
    }

    pub fn as_slice(&self) -> &[PlacedObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

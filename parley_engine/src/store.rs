//! The object store: every object in the running game, addressed by id.
//!
//! The store also knows which object is the player. The player's parent is
//! the current location ("here"); anything whose parent is the player is held.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use log::info;
use serde::{Deserialize, Serialize};

use crate::object::{GameObject, NOWHERE, ObjectId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectStore {
    objects: Vec<GameObject>,
    labels: HashMap<String, ObjectId>,
    user_attributes: Vec<String>,
    player: ObjectId,
}

impl ObjectStore {
    /// Create an empty store. The player must be set once it has been added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the user attribute names, in bit order.
    pub fn set_user_attributes(&mut self, names: Vec<String>) {
        self.user_attributes = names;
    }

    /// Add an object, assigning it the next id. The object's own `id` field is overwritten.
    pub fn add(&mut self, mut object: GameObject) -> ObjectId {
        let id = self.objects.len() + 1;
        object.id = id;
        self.labels.insert(object.label.clone(), id);
        self.objects.push(object);
        id
    }

    /// Choose which object is the player.
    ///
    /// # Errors
    /// - if no object has the given id
    pub fn set_player(&mut self, id: ObjectId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(anyhow!("player object {id} does not exist"));
        }
        info!("player is object {id} ('{}')", self.label(id));
        self.player = id;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All object ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + use<> {
        1..=self.objects.len()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        if id == NOWHERE {
            return None;
        }
        self.objects.get(id - 1)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        if id == NOWHERE {
            return None;
        }
        self.objects.get_mut(id - 1)
    }

    pub fn by_label(&self, label: &str) -> Option<ObjectId> {
        self.labels.get(label).copied()
    }

    /// The object that holds carried things.
    pub fn player(&self) -> ObjectId {
        self.player
    }

    /// The player's current location.
    pub fn here(&self) -> ObjectId {
        self.parent(self.player)
    }

    pub fn parent(&self, id: ObjectId) -> ObjectId {
        self.get(id).map_or(NOWHERE, |obj| obj.parent)
    }

    pub fn label(&self, id: ObjectId) -> &str {
        self.get(id).map_or("nothing", |obj| obj.label.as_str())
    }

    /// Text used to name the object to the player.
    pub fn display(&self, id: ObjectId) -> &str {
        self.get(id).map_or("nothing", |obj| obj.display.as_str())
    }

    /// Move an object to a new parent.
    ///
    /// # Errors
    /// - if either object does not exist, or the move would put an object inside itself
    pub fn move_to(&mut self, id: ObjectId, parent: ObjectId) -> Result<()> {
        if id == parent {
            return Err(anyhow!("cannot put '{}' inside itself", self.label(id)));
        }
        if parent != NOWHERE && self.get(parent).is_none() {
            return Err(anyhow!("destination object {parent} does not exist"));
        }
        let object = self.get_mut(id).ok_or_else(|| anyhow!("object {id} does not exist"))?;
        object.parent = parent;
        info!("moved object {id} to parent {parent}");
        Ok(())
    }

    /// Bit index of a declared user attribute.
    pub fn user_attribute_index(&self, name: &str) -> Option<usize> {
        self.user_attributes.iter().position(|attr| attr == name)
    }
}

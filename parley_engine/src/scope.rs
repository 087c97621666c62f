//! Containment and visibility predicates.
//!
//! These answer "can the player refer to this object right now?" for each of
//! the grammar's scope names by walking PARENT links up the containment tree.
//! Closed containers and concealing objects hide what is inside them;
//! locations and objects that are nowhere end a walk.

use std::collections::HashSet;

use log::error;

use crate::grammar::Scope;
use crate::object::{NOWHERE, ObjectId};
use crate::store::ObjectStore;

/// Evaluates scope predicates against a store.
#[derive(Debug, Clone, Copy)]
pub struct ScopeEvaluator<'a> {
    store: &'a ObjectStore,
    heavy: i32,
}

impl<'a> ScopeEvaluator<'a> {
    pub fn new(store: &'a ObjectStore, heavy: i32) -> Self {
        Self { store, heavy }
    }

    /// Does `id` satisfy `scope`?
    ///
    /// `restricted` makes walks stop beneath light intermediate objects (used
    /// for "everything"), and `anchor` is the object `inside` is measured
    /// against; the current location is used when there is none.
    pub fn in_scope(&self, id: ObjectId, scope: Scope, restricted: bool, anchor: Option<ObjectId>) -> bool {
        let Some(object) = self.store.get(id) else {
            return false;
        };
        let here = self.store.here();
        let holder = self.store.player();
        match scope {
            Scope::Held => {
                if object.parent == holder {
                    true
                } else if object.mass >= self.heavy {
                    // fixed parts of a held object, like the label on a jar
                    object.parent != NOWHERE && self.store.parent(object.parent) == holder
                } else {
                    false
                }
            },
            Scope::Location => object.is_location(),
            Scope::Here => {
                if object.parent == here || id == here {
                    true
                } else if object.parent == holder {
                    false
                } else {
                    self.parent_of(here, id, restricted)
                }
            },
            Scope::Anywhere => true,
            Scope::Inside => self.parent_of(anchor.unwrap_or(here), id, restricted),
            Scope::Present => id == here || self.find_parent(id),
        }
    }

    /// Is `target` an ancestor of `id` that can see into it? `parent_of(a, a, _)` is true.
    pub fn parent_of(&self, target: ObjectId, id: ObjectId, restricted: bool) -> bool {
        if id == target {
            return true;
        }
        let mut visited = HashSet::new();
        let mut child = id;
        loop {
            let Some(object) = self.store.get(child) else {
                return false;
            };
            if object.is_location() || object.parent == NOWHERE {
                return false;
            }
            let parent_id = object.parent;
            if parent_id == child || !visited.insert(child) {
                self.report_cycle(child);
                return false;
            }
            let Some(parent) = self.store.get(parent_id) else {
                return false;
            };
            if parent.blocks_view() {
                return false;
            }
            if restricted && parent.mass < self.heavy && parent_id != target {
                return false;
            }
            if parent_id == target {
                return true;
            }
            if parent.is_location() {
                return false;
            }
            child = parent_id;
        }
    }

    /// Is `id` visible from the current location, either lying around or carried?
    pub fn find_parent(&self, id: ObjectId) -> bool {
        let here = self.store.here();
        let holder = self.store.player();
        let mut visited = HashSet::new();
        let mut child = id;
        loop {
            let Some(object) = self.store.get(child) else {
                return false;
            };
            if object.is_location() || object.parent == NOWHERE {
                return child == here;
            }
            let parent_id = object.parent;
            if parent_id == child || !visited.insert(child) {
                self.report_cycle(child);
                return false;
            }
            let Some(parent) = self.store.get(parent_id) else {
                return false;
            };
            if parent.blocks_view() {
                return false;
            }
            if parent_id == here || parent_id == holder {
                return true;
            }
            if parent.is_location() {
                return false;
            }
            child = parent_id;
        }
    }

    fn report_cycle(&self, id: ObjectId) {
        error!(
            "containment cycle: object '{}' is inside itself; treating it as out of scope",
            self.store.label(id)
        );
    }
}

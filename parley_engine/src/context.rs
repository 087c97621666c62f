//! Per-command working memory for the parser, and the session-wide pronoun store.

use crate::grammar::Scope;
use crate::object::{Attribute, GameObject, ObjectId};
use crate::store::ObjectStore;

/// One of the four object lists a command fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Noun1,
    Noun2,
    Noun1Except,
    Noun2Except,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Noun1, Slot::Noun2, Slot::Noun1Except, Slot::Noun2Except];

    fn index(self) -> usize {
        match self {
            Slot::Noun1 => 0,
            Slot::Noun2 => 1,
            Slot::Noun1Except => 2,
            Slot::Noun2Except => 3,
        }
    }

    /// Primary noun slot for the n-th placeholder of a rule (0 or 1).
    pub fn noun(position: usize) -> Slot {
        if position == 0 { Slot::Noun1 } else { Slot::Noun2 }
    }

    /// The exception list paired with a primary slot, `None` for exception slots.
    pub fn exception(self) -> Option<Slot> {
        match self {
            Slot::Noun1 => Some(Slot::Noun1Except),
            Slot::Noun2 => Some(Slot::Noun2Except),
            Slot::Noun1Except | Slot::Noun2Except => None,
        }
    }

    /// The primary slot an exception list subtracts from.
    pub fn primary(self) -> Slot {
        match self {
            Slot::Noun1 | Slot::Noun1Except => Slot::Noun1,
            Slot::Noun2 | Slot::Noun2Except => Slot::Noun2,
        }
    }
}

/// Ordered list of objects with holes left by removals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectList {
    entries: Vec<Option<ObjectId>>,
    live: usize,
}

impl ObjectList {
    pub fn push(&mut self, id: ObjectId) {
        self.entries.push(Some(id));
        self.live += 1;
    }

    /// Remove every occurrence of `id`, leaving holes. Returns how many were removed.
    pub fn remove(&mut self, id: ObjectId) -> usize {
        let mut removed = 0;
        for entry in &mut self.entries {
            if *entry == Some(id) {
                *entry = None;
                removed += 1;
            }
        }
        self.live -= removed;
        removed
    }

    /// Number of objects still in the list.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// First object that has not been removed.
    pub fn first(&self) -> Option<ObjectId> {
        self.entries.iter().flatten().copied().next()
    }

    /// Live objects in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.iter().flatten().copied()
    }

    pub fn to_vec(&self) -> Vec<ObjectId> {
        self.ids().collect()
    }
}

/// Back-references used by pronouns. Lives for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pronouns {
    pub it: Option<ObjectId>,
    pub him: Option<ObjectId>,
    pub her: Option<ObjectId>,
    pub them: Vec<ObjectId>,
}

impl Pronouns {
    /// Note an object that was just added to a list.
    pub fn note(&mut self, object: &GameObject) {
        if !object.is(Attribute::Animate) {
            self.it = Some(object.id);
        } else if object.is(Attribute::Female) {
            self.her = Some(object.id);
        } else {
            self.him = Some(object.id);
        }
    }

    /// Rebuild `them` from a list: a lone plural object, or every live object when there are several.
    pub fn refresh_them(&mut self, list: &ObjectList, store: &ObjectStore) {
        if list.live() == 1 {
            if let Some(id) = list.first()
                && store.get(id).is_some_and(|obj| obj.is(Attribute::Plural))
            {
                self.them = vec![id];
            }
        } else {
            self.them = list.to_vec();
        }
    }
}

/// Values captured by `$string` and `$integer` grammar words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    pub text: Option<String>,
    pub integer: Option<i64>,
}

/// Scoring state for one noun phrase.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    /// Indexed by object id; 0 means excluded, 1 means possible but not yet matched.
    pub confidence: Vec<u32>,
    /// True once any word of the phrase has been tested.
    pub counted: bool,
    pub prime_suspect: Option<ObjectId>,
    pub everything: bool,
    /// 0 until something sets it; treated as 1 after the phrase is consumed.
    pub return_limit: usize,
}

impl Candidates {
    pub fn reset(&mut self, object_count: usize) {
        self.confidence.clear();
        self.confidence.resize(object_count + 1, 1);
        self.confidence[0] = 0;
        self.counted = false;
        self.prime_suspect = None;
        self.everything = false;
        self.return_limit = 0;
    }

    /// Ids still in contention, ascending.
    pub fn live(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.confidence
            .iter()
            .enumerate()
            .filter(|(_, conf)| **conf > 0)
            .map(|(id, _)| id)
    }

    /// Number of matched candidates; nothing counts until a word has been tested.
    pub fn matches(&self) -> usize {
        if self.counted { self.live().count() } else { 0 }
    }

    pub fn exclude(&mut self, id: ObjectId) {
        self.confidence[id] = 0;
    }

    pub fn highest(&self) -> u32 {
        self.confidence.iter().copied().max().unwrap_or(0)
    }
}

/// Everything the parser knows about the command in progress.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    lists: [ObjectList; 4],
    pub candidates: Candidates,
    pub from_objects: Vec<ObjectId>,
    /// Cursor position just past an already resolved FROM clause.
    pub after_from: Option<usize>,
    pub expected_scope: [Option<Scope>; 2],
    /// Index of the next token to read.
    pub cursor: usize,
    /// Index of the most recent token that matched a grammar word exactly.
    pub last_exact: Option<usize>,
    pub object_expected: bool,
    /// The object phrase as typed so far, for "unknown object" messages.
    pub object_phrase: String,
    pub captures: Captures,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, slot: Slot) -> &ObjectList {
        &self.lists[slot.index()]
    }

    pub fn list_mut(&mut self, slot: Slot) -> &mut ObjectList {
        &mut self.lists[slot.index()]
    }

    /// First live object of a slot, or `None`.
    pub fn first_available(&self, slot: Slot) -> Option<ObjectId> {
        self.list(slot).first()
    }
}

//! Game objects and their attribute sets.
//!
//! Everything addressable in a Parley world is a [`GameObject`]: rooms, the
//! player, props and characters alike. Objects are numbered from 1; id 0 is
//! reserved for "nowhere".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer handle of an object in the store. `0` never names an object.
pub type ObjectId = usize;

/// Parent value of objects that are not anywhere in the containment tree.
pub const NOWHERE: ObjectId = 0;

/// Mass at which an object counts as fixed scenery for multi-object commands.
pub const HEAVY: i32 = 99;

/// Built-in attributes the resolver and scope evaluator understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Location,
    Container,
    Closed,
    Locked,
    Concealing,
    Surface,
    Animate,
    Female,
    Plural,
    Lit,
    Worn,
    Visited,
}

impl Attribute {
    pub const ALL: [Attribute; 12] = [
        Attribute::Location,
        Attribute::Container,
        Attribute::Closed,
        Attribute::Locked,
        Attribute::Concealing,
        Attribute::Surface,
        Attribute::Animate,
        Attribute::Female,
        Attribute::Plural,
        Attribute::Lit,
        Attribute::Worn,
        Attribute::Visited,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Location => "location",
            Attribute::Container => "container",
            Attribute::Closed => "closed",
            Attribute::Locked => "locked",
            Attribute::Concealing => "concealing",
            Attribute::Surface => "surface",
            Attribute::Animate => "animate",
            Attribute::Female => "female",
            Attribute::Plural => "plural",
            Attribute::Lit => "lit",
            Attribute::Worn => "worn",
            Attribute::Visited => "visited",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised when an attribute name cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("unknown attribute '{0}'")]
    Unknown(String),
    #[error("user attribute index {0} is out of range")]
    OutOfRange(usize),
}

impl FromStr for Attribute {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name() == lower)
            .ok_or_else(|| AttributeError::Unknown(s.to_string()))
    }
}

/// Compact set of attribute bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet(u32);

impl AttributeSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, attr: Attribute) -> Self {
        self.insert(attr);
        self
    }

    pub fn contains(self, attr: Attribute) -> bool {
        self.0 & attr.bit() != 0
    }

    pub fn insert(&mut self, attr: Attribute) {
        self.0 |= attr.bit();
    }

    pub fn remove(&mut self, attr: Attribute) {
        self.0 &= !attr.bit();
    }

    /// Test a user attribute by its declaration index.
    pub fn has_index(self, index: usize) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    /// Set or clear a user attribute by its declaration index.
    ///
    /// # Errors
    /// - if the index does not fit in the set
    pub fn set_index(&mut self, index: usize, on: bool) -> Result<(), AttributeError> {
        if index >= 32 {
            return Err(AttributeError::OutOfRange(index));
        }
        if on {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
        Ok(())
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        let mut set = AttributeSet::empty();
        for attr in iter {
            set.insert(attr);
        }
        set
    }
}

/// An object in the world as the parser sees it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameObject {
    pub id: ObjectId,
    pub label: String,
    pub display: String,
    pub names: Vec<String>,
    pub plurals: Vec<String>,
    pub attributes: AttributeSet,
    pub user_attributes: AttributeSet,
    pub parent: ObjectId,
    pub mass: i32,
}

impl GameObject {
    /// Create a bare object with a single name; mostly useful for tests and tools.
    pub fn new(id: ObjectId, label: &str, names: &[&str]) -> Self {
        Self {
            id,
            label: label.to_string(),
            display: format!("the {label}"),
            names: names.iter().map(|n| (*n).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn is(&self, attr: Attribute) -> bool {
        self.attributes.contains(attr)
    }

    pub fn is_location(&self) -> bool {
        self.is(Attribute::Location)
    }

    /// True if this object hides its contents from view.
    pub fn blocks_view(&self) -> bool {
        !self.is_location() && ((self.is(Attribute::Closed) && self.is(Attribute::Container)) || self.is(Attribute::Concealing))
    }

    pub fn has_name(&self, word: &str) -> bool {
        self.names.iter().any(|name| name == word)
    }

    pub fn has_plural(&self, word: &str) -> bool {
        self.plurals.iter().any(|name| name == word)
    }
}

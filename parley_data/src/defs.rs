use serde::{Deserialize, Serialize};

/// Stable label used to refer to an object across a `WorldDef`.
pub type Label = String;

/// Top-level world data loaded by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldDef {
    pub game: GameDef,
    #[serde(default)]
    pub user_attributes: Vec<String>,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    /// Grammar rules, one per string, e.g. `"take **here from *present >take"`.
    #[serde(default)]
    pub grammar: Vec<String>,
    #[serde(default)]
    pub handlers: Vec<HandlerDef>,
}

/// Game-level metadata and startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameDef {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub intro: String,
    /// Label of the object that represents the player (the holder of carried things).
    pub player: Label,
}

/// A single addressable object. Locations are objects too (`attributes` contains `"location"`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObjectDef {
    pub label: Label,
    /// Text used when the object is named in output, e.g. "the brass lamp".
    pub display: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub plurals: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub user_attributes: Vec<String>,
    /// Containing object, or `None` for objects that are nowhere (and for locations).
    #[serde(default)]
    pub parent: Option<Label>,
    #[serde(default)]
    pub mass: i32,
}

/// A handler: the hook it answers to and the actions it performs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerDef {
    pub hook: HookDef,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

/// Where in the dispatch chain a handler sits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HookDef {
    BeforeAll,
    Before { verb: String },
    Specific { verb: String, target: TargetDef },
    Library { verb: String },
    Override { verb: String, target: TargetDef },
    Default { verb: String },
    LocalAfter { verb: String, target: Option<TargetDef> },
    After { verb: String },
    AfterAll,
    EachTurn,
}

/// Objects a verb-specific handler is attached to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TargetDef {
    /// Command with no nouns, qualified by the player's current location.
    Location(Label),
    Object(Label),
    Pair { noun1: Label, noun2: Label },
}

/// Reference to an object from within a handler action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ObjectRefDef {
    Noun1,
    Noun2,
    Player,
    Here,
    Label(Label),
}

/// One step performed by a handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActionDef {
    Say { text: String },
    MoveObject { object: ObjectRefDef, to: ObjectRefDef },
    SetAttribute { object: ObjectRefDef, attribute: String },
    ClearAttribute { object: ObjectRefDef, attribute: String },
    /// Stop the handler here and report "not handled".
    Continue,
    /// Ask the dispatcher to run the target-specific override or the default handler.
    Override,
    StopTime,
    Interrupt,
    /// Run a sentence through the interpreter as if the player typed it.
    Parse { sentence: String },
    EndGame,
}

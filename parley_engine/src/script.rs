//! Handler execution.
//!
//! The dispatcher asks a [`Script`] to run handlers by key. [`ScriptTable`] is
//! the data-driven implementation loaded from `world.ron`: each handler is a
//! fixed list of actions with no control flow.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};
use parley_data::{ActionDef, HandlerDef, ObjectRefDef};

use crate::config::render;
use crate::dispatch::{Call, HandlerKey, Signal};
use crate::object::{Attribute, ObjectId};
use crate::session::Session;
use crate::store::ObjectStore;

/// Runs handlers on behalf of the dispatcher.
pub trait Script {
    /// Run the handler for `key`, or return `Ok(None)` if there is none.
    ///
    /// # Errors
    /// - if the handler cannot be carried out
    fn execute(&mut self, key: &HandlerKey, call: &Call, session: &mut Session) -> Result<Option<Signal>>;
}

/// An object named by a handler action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectRef {
    Noun1,
    Noun2,
    Player,
    Here,
    Id(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeRef {
    System(Attribute),
    User(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Say(String),
    Move { object: ObjectRef, to: ObjectRef },
    Set { object: ObjectRef, attribute: AttributeRef, on: bool },
    Continue,
    Override,
    StopTime,
    Interrupt,
    Parse(String),
    EndGame,
}

/// Handlers by key, built once at load.
#[derive(Debug, Default)]
pub struct ScriptTable {
    handlers: HashMap<HandlerKey, Rc<[Action]>>,
}

impl ScriptTable {
    /// Build the table, resolving object labels and attribute names against `store`.
    ///
    /// # Errors
    /// - if an action names an unknown object or attribute
    pub fn from_defs(defs: &[HandlerDef], store: &ObjectStore) -> Result<Self> {
        let mut handlers: HashMap<HandlerKey, Rc<[Action]>> = HashMap::new();
        for def in defs {
            let key = HandlerKey::from(&def.hook);
            let actions = def
                .actions
                .iter()
                .map(|action| compile_action(action, store))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("compiling handler '{key}'"))?;
            if handlers.insert(key.clone(), Rc::from(actions)).is_some() {
                warn!("handler '{key}' is defined more than once; the last definition wins");
            }
        }
        info!("{} handlers loaded", handlers.len());
        Ok(Self { handlers })
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, key: &HandlerKey) -> bool {
        self.handlers.contains_key(key)
    }
}

impl Script for ScriptTable {
    fn execute(&mut self, key: &HandlerKey, call: &Call, session: &mut Session) -> Result<Option<Signal>> {
        let Some(actions) = self.handlers.get(key).cloned() else {
            return Ok(None);
        };
        for action in actions.iter() {
            match action {
                Action::Say(text) => {
                    let text = substitute(text, call, &session.store);
                    session.console.writeln(&text);
                },
                Action::Move { object, to } => {
                    let id = object_id(*object, call, &session.store).with_context(|| format!("in handler '{key}'"))?;
                    let to = object_id(*to, call, &session.store).with_context(|| format!("in handler '{key}'"))?;
                    session
                        .store
                        .move_to(id, to)
                        .with_context(|| format!("in handler '{key}'"))?;
                },
                Action::Set { object, attribute, on } => {
                    let id = object_id(*object, call, &session.store).with_context(|| format!("in handler '{key}'"))?;
                    set_attribute(&mut session.store, id, *attribute, *on)?;
                },
                Action::Continue => return Ok(Some(Signal::NotHandled)),
                Action::Override => return Ok(Some(Signal::Override)),
                Action::StopTime => session.time_passes = false,
                Action::Interrupt => session.interrupted = true,
                Action::Parse(sentence) => session.run_nested(sentence, self)?,
                Action::EndGame => {
                    info!("handler '{key}' ended the game");
                    session.game_over = true;
                    session.interrupted = true;
                },
            }
        }
        Ok(Some(Signal::Handled))
    }
}

fn compile_action(def: &ActionDef, store: &ObjectStore) -> Result<Action> {
    Ok(match def {
        ActionDef::Say { text } => Action::Say(text.clone()),
        ActionDef::MoveObject { object, to } => Action::Move {
            object: compile_ref(object, store)?,
            to: compile_ref(to, store)?,
        },
        ActionDef::SetAttribute { object, attribute } => Action::Set {
            object: compile_ref(object, store)?,
            attribute: compile_attribute(attribute, store)?,
            on: true,
        },
        ActionDef::ClearAttribute { object, attribute } => Action::Set {
            object: compile_ref(object, store)?,
            attribute: compile_attribute(attribute, store)?,
            on: false,
        },
        ActionDef::Continue => Action::Continue,
        ActionDef::Override => Action::Override,
        ActionDef::StopTime => Action::StopTime,
        ActionDef::Interrupt => Action::Interrupt,
        ActionDef::Parse { sentence } => Action::Parse(sentence.clone()),
        ActionDef::EndGame => Action::EndGame,
    })
}

fn compile_ref(def: &ObjectRefDef, store: &ObjectStore) -> Result<ObjectRef> {
    Ok(match def {
        ObjectRefDef::Noun1 => ObjectRef::Noun1,
        ObjectRefDef::Noun2 => ObjectRef::Noun2,
        ObjectRefDef::Player => ObjectRef::Player,
        ObjectRefDef::Here => ObjectRef::Here,
        ObjectRefDef::Label(label) => ObjectRef::Id(
            store
                .by_label(label)
                .ok_or_else(|| anyhow!("unknown object '{label}'"))?,
        ),
    })
}

/// System attributes by name; user attributes as `user:<name>`.
fn compile_attribute(name: &str, store: &ObjectStore) -> Result<AttributeRef> {
    if let Some(user) = name.strip_prefix("user:") {
        return store
            .user_attribute_index(user)
            .map(AttributeRef::User)
            .ok_or_else(|| anyhow!("unknown user attribute '{user}'"));
    }
    Ok(AttributeRef::System(name.parse()?))
}

fn object_id(reference: ObjectRef, call: &Call, store: &ObjectStore) -> Result<ObjectId> {
    match reference {
        ObjectRef::Noun1 => call.noun1.ok_or_else(|| anyhow!("'{}' has no first object", call.action)),
        ObjectRef::Noun2 => call.noun2.ok_or_else(|| anyhow!("'{}' has no second object", call.action)),
        ObjectRef::Player => Ok(store.player()),
        ObjectRef::Here => Ok(store.here()),
        ObjectRef::Id(id) => Ok(id),
    }
}

fn set_attribute(store: &mut ObjectStore, id: ObjectId, attribute: AttributeRef, on: bool) -> Result<()> {
    let Some(object) = store.get_mut(id) else {
        bail!("object {id} does not exist");
    };
    match attribute {
        AttributeRef::System(attr) if on => object.attributes.insert(attr),
        AttributeRef::System(attr) => object.attributes.remove(attr),
        AttributeRef::User(index) => object.user_attributes.set_index(index, on)?,
    }
    Ok(())
}

/// Fill `{noun1}`, `{noun2}` and `{here}` with display text.
fn substitute(text: &str, call: &Call, store: &ObjectStore) -> String {
    let name = |id: Option<ObjectId>| id.map_or("nothing", |id| store.display(id));
    render(
        text,
        &[
            ("noun1", name(call.noun1)),
            ("noun2", name(call.noun2)),
            ("here", store.display(store.here())),
        ],
    )
}

//! Handler dispatch.
//!
//! A parsed command runs through a fixed chain of handlers, from the global
//! `+before` down to `+after`, stopping at the first one that reports the
//! command handled. Commands naming several objects run the chain once per
//! object.

use std::fmt;

use anyhow::Result;
use log::{info, warn};
use parley_data::{HookDef, TargetDef};

use crate::config::render;
use crate::context::Captures;
use crate::object::ObjectId;
use crate::parser::ParsedCommand;
use crate::script::Script;
use crate::session::Session;

/// The objects a verb-specific handler is attached to, by label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerTarget {
    /// A command with no nouns, run in this location.
    Location(String),
    Object(String),
    Pair { noun1: String, noun2: String },
}

impl From<&TargetDef> for HandlerTarget {
    fn from(def: &TargetDef) -> Self {
        match def {
            TargetDef::Location(label) => HandlerTarget::Location(label.clone()),
            TargetDef::Object(label) => HandlerTarget::Object(label.clone()),
            TargetDef::Pair { noun1, noun2 } => HandlerTarget::Pair {
                noun1: noun1.clone(),
                noun2: noun2.clone(),
            },
        }
    }
}

/// Identifies one handler in the dispatch chain.
///
/// Displays as the traditional handler name, e.g. `+before_take`,
/// `put_box_cup` or `take_override_cup`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    BeforeAll,
    Before { verb: String },
    Specific { verb: String, target: HandlerTarget },
    Library { verb: String },
    Override { verb: String, target: HandlerTarget },
    Default { verb: String },
    LocalAfter { verb: String, target: Option<HandlerTarget> },
    After { verb: String },
    AfterAll,
    EachTurn,
}

impl From<&HookDef> for HandlerKey {
    fn from(hook: &HookDef) -> Self {
        match hook {
            HookDef::BeforeAll => HandlerKey::BeforeAll,
            HookDef::Before { verb } => HandlerKey::Before { verb: verb.clone() },
            HookDef::Specific { verb, target } => HandlerKey::Specific {
                verb: verb.clone(),
                target: target.into(),
            },
            HookDef::Library { verb } => HandlerKey::Library { verb: verb.clone() },
            HookDef::Override { verb, target } => HandlerKey::Override {
                verb: verb.clone(),
                target: target.into(),
            },
            HookDef::Default { verb } => HandlerKey::Default { verb: verb.clone() },
            HookDef::LocalAfter { verb, target } => HandlerKey::LocalAfter {
                verb: verb.clone(),
                target: target.as_ref().map(HandlerTarget::from),
            },
            HookDef::After { verb } => HandlerKey::After { verb: verb.clone() },
            HookDef::AfterAll => HandlerKey::AfterAll,
            HookDef::EachTurn => HandlerKey::EachTurn,
        }
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKey::BeforeAll => f.write_str("+before"),
            HandlerKey::Before { verb } => write!(f, "+before_{verb}"),
            HandlerKey::Specific { verb, target } => match target {
                HandlerTarget::Location(label) | HandlerTarget::Object(label) => write!(f, "{verb}_{label}"),
                HandlerTarget::Pair { noun1, noun2 } => write!(f, "{verb}_{noun2}_{noun1}"),
            },
            HandlerKey::Library { verb } => write!(f, "+{verb}"),
            HandlerKey::Override { verb, target } => match target {
                HandlerTarget::Location(label) | HandlerTarget::Object(label) => {
                    write!(f, "{verb}_override_{label}")
                },
                HandlerTarget::Pair { noun1, noun2 } => write!(f, "{verb}_{noun2}_override_{noun1}"),
            },
            HandlerKey::Default { verb } => write!(f, "+default_{verb}"),
            HandlerKey::LocalAfter { verb, target } => match target {
                None => write!(f, "after_{verb}"),
                Some(HandlerTarget::Location(label) | HandlerTarget::Object(label)) => {
                    write!(f, "after_{verb}_{label}")
                },
                Some(HandlerTarget::Pair { noun1, noun2 }) => write!(f, "after_{verb}_{noun2}_{noun1}"),
            },
            HandlerKey::After { verb } => write!(f, "+after_{verb}"),
            HandlerKey::AfterAll => f.write_str("+after"),
            HandlerKey::EachTurn => f.write_str("+eachturn"),
        }
    }
}

/// What a handler reports back to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Handled,
    NotHandled,
    /// Only meaningful from a library handler: run the target's override instead.
    Override,
}

/// One run of the handler chain: the action with at most one object per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub action: String,
    pub noun1: Option<ObjectId>,
    pub noun2: Option<ObjectId>,
    pub captures: Captures,
    /// The words of the command as typed.
    pub phrase: String,
}

/// Run a parsed command, once per object when a slot holds several.
///
/// # Errors
/// - if a handler fails
pub fn dispatch(session: &mut Session, script: &mut dyn Script, command: &ParsedCommand) -> Result<()> {
    let call = |noun1: Option<ObjectId>, noun2: Option<ObjectId>| Call {
        action: command.action.clone(),
        noun1,
        noun2,
        captures: command.captures.clone(),
        phrase: command.phrase.clone(),
    };
    let first1 = command.noun1.first().copied();
    let first2 = command.noun2.first().copied();

    let (each, fixed_first): (&[ObjectId], bool) = if command.noun1.len() > 1 {
        (&command.noun1, true)
    } else if command.noun2.len() > 1 {
        (&command.noun2, false)
    } else {
        return run_chain(session, script, &call(first1, first2));
    };

    info!("'{}' applies to {} objects", command.action, each.len());
    for &id in each {
        if session.config.multi_prefix {
            let prefix = render(
                &session.config.messages.multi_prefix,
                &[("object", session.store.display(id))],
            );
            session.console.write(&prefix);
        }
        let this = if fixed_first { call(Some(id), first2) } else { call(first1, Some(id)) };
        run_chain(session, script, &this)?;
        if session.interrupted {
            info!("'{}' interrupted; remaining objects skipped", command.action);
            break;
        }
    }
    Ok(())
}

/// Run the handler chain once.
///
/// The chain stops at the first handler that reports the command handled or
/// interrupts it. An interrupted command does not use up a turn.
///
/// # Errors
/// - if a handler fails
pub fn run_chain(session: &mut Session, script: &mut dyn Script, call: &Call) -> Result<()> {
    session.time_passes = true;
    let verb = call.action.clone();
    let label = |session: &Session, id: ObjectId| session.store.label(id).to_string();

    let signal = invoke(session, script, &HandlerKey::BeforeAll, call)?;
    if ends_chain(session, signal) {
        return Ok(());
    }
    let signal = invoke(session, script, &HandlerKey::Before { verb: verb.clone() }, call)?;
    if ends_chain(session, signal) {
        return Ok(());
    }

    let target = match (call.noun1, call.noun2) {
        (None, _) => HandlerTarget::Location(label(session, session.store.here())),
        (Some(noun1), None) => HandlerTarget::Object(label(session, noun1)),
        (Some(noun1), Some(noun2)) => HandlerTarget::Pair {
            noun1: label(session, noun1),
            noun2: label(session, noun2),
        },
    };
    let specific = HandlerKey::Specific {
        verb: verb.clone(),
        target: target.clone(),
    };
    let signal = invoke(session, script, &specific, call)?;
    if session.interrupted {
        return Ok(());
    }
    if !handled(signal) {
        let library = HandlerKey::Library { verb: verb.clone() };
        match invoke(session, script, &library, call)? {
            None => warn!("no library handler '{library}' for action '{verb}'"),
            Some(Signal::Override) if !session.interrupted => {
                let key = HandlerKey::Override {
                    verb: verb.clone(),
                    target,
                };
                let signal = invoke(session, script, &key, call)?;
                if signal.is_none() && !session.interrupted {
                    invoke(session, script, &HandlerKey::Default { verb: verb.clone() }, call)?;
                }
            },
            Some(_) => {},
        }
        if session.interrupted {
            return Ok(());
        }
    }

    let local_target = match (call.noun1, call.noun2) {
        (None, _) => None,
        (Some(noun1), None) => Some(HandlerTarget::Object(label(session, noun1))),
        (Some(noun1), Some(noun2)) => Some(HandlerTarget::Pair {
            noun1: label(session, noun1),
            noun2: label(session, noun2),
        }),
    };
    let local_after = HandlerKey::LocalAfter {
        verb: verb.clone(),
        target: local_target,
    };
    let signal = invoke(session, script, &local_after, call)?;
    if ends_chain(session, signal) {
        return Ok(());
    }
    let signal = invoke(session, script, &HandlerKey::After { verb }, call)?;
    if ends_chain(session, signal) {
        return Ok(());
    }
    let signal = invoke(session, script, &HandlerKey::AfterAll, call)?;
    if ends_chain(session, signal) {
        return Ok(());
    }

    if session.time_passes {
        invoke(session, script, &HandlerKey::EachTurn, call)?;
        session.turns += 1;
    }
    Ok(())
}

fn invoke(session: &mut Session, script: &mut dyn Script, key: &HandlerKey, call: &Call) -> Result<Option<Signal>> {
    let signal = script.execute(key, call, session)?;
    if let Some(signal) = signal {
        info!("handler '{key}' returned {signal:?}");
    }
    Ok(signal)
}

fn handled(signal: Option<Signal>) -> bool {
    signal == Some(Signal::Handled)
}

fn ends_chain(session: &Session, signal: Option<Signal>) -> bool {
    session.interrupted || handled(signal)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::ParserConfig;
    use crate::console::BufferConsole;
    use crate::grammar::GrammarTree;
    use crate::object::{Attribute, AttributeSet, GameObject};
    use crate::store::ObjectStore;

    /// Records every handler asked for and answers from a fixed table.
    #[derive(Default)]
    struct Recorder {
        answers: HashMap<String, Signal>,
        asked: Vec<String>,
        /// Handler that stops time when asked.
        stops_time: Option<String>,
        /// Handler that interrupts the command when asked.
        interrupts: Option<String>,
    }

    impl Recorder {
        fn answering(answers: &[(&str, Signal)]) -> Self {
            Self {
                answers: answers.iter().map(|(name, signal)| ((*name).to_string(), *signal)).collect(),
                ..Self::default()
            }
        }

        fn ran(&self) -> Vec<&str> {
            self.asked
                .iter()
                .filter(|name| self.answers.contains_key(*name))
                .map(String::as_str)
                .collect()
        }
    }

    impl Script for Recorder {
        fn execute(&mut self, key: &HandlerKey, _call: &Call, session: &mut Session) -> Result<Option<Signal>> {
            let name = key.to_string();
            if self.stops_time.as_ref() == Some(&name) {
                session.time_passes = false;
            }
            if self.interrupts.as_ref() == Some(&name) {
                session.interrupted = true;
            }
            let answer = self.answers.get(&name).copied();
            self.asked.push(name);
            Ok(answer)
        }
    }

    fn session() -> (Session, BufferConsole) {
        let mut store = ObjectStore::new();
        let mut kitchen = GameObject::new(0, "kitchen", &["kitchen"]);
        kitchen.attributes = AttributeSet::empty().with(Attribute::Location);
        let kitchen = store.add(kitchen);
        let mut player = GameObject::new(0, "player", &["me"]);
        player.parent = kitchen;
        let player = store.add(player);
        store.set_player(player).unwrap();
        for label in ["cup", "box", "plate"] {
            let mut object = GameObject::new(0, label, &[label]);
            object.parent = kitchen;
            store.add(object);
        }
        let console = BufferConsole::new();
        let session = Session::new(
            store,
            GrammarTree::new(),
            ParserConfig::default(),
            Box::new(console.clone()),
        );
        (session, console)
    }

    fn command(action: &str, noun1: &[ObjectId], noun2: &[ObjectId]) -> ParsedCommand {
        ParsedCommand {
            action: action.into(),
            noun1: noun1.to_vec(),
            noun2: noun2.to_vec(),
            captures: Captures::default(),
            phrase: action.into(),
            next: None,
        }
    }

    #[test]
    fn handler_names_follow_the_traditional_scheme() {
        let pair = HandlerTarget::Pair {
            noun1: "cup".into(),
            noun2: "box".into(),
        };
        let verb = || "put".to_string();
        assert_eq!(
            HandlerKey::Specific {
                verb: verb(),
                target: pair.clone()
            }
            .to_string(),
            "put_box_cup"
        );
        assert_eq!(
            HandlerKey::Override {
                verb: verb(),
                target: pair.clone()
            }
            .to_string(),
            "put_box_override_cup"
        );
        assert_eq!(
            HandlerKey::LocalAfter {
                verb: verb(),
                target: Some(pair)
            }
            .to_string(),
            "after_put_box_cup"
        );
        assert_eq!(HandlerKey::Default { verb: verb() }.to_string(), "+default_put");
        assert_eq!(HandlerKey::EachTurn.to_string(), "+eachturn");
    }

    #[test]
    fn full_chain_runs_in_order_when_nothing_handles() {
        let (mut session, _console) = session();
        let mut script = Recorder::default();
        dispatch(&mut session, &mut script, &command("take", &[3], &[])).unwrap();
        assert_eq!(
            script.asked,
            vec![
                "+before",
                "+before_take",
                "take_cup",
                "+take",
                "after_take_cup",
                "+after_take",
                "+after",
                "+eachturn"
            ]
        );
        assert_eq!(session.turns, 1);
    }

    #[test]
    fn before_handler_short_circuits_everything() {
        let (mut session, _console) = session();
        let mut script = Recorder::answering(&[("+before_take", Signal::Handled)]);
        dispatch(&mut session, &mut script, &command("take", &[3], &[])).unwrap();
        assert_eq!(script.asked, vec!["+before", "+before_take"]);
        assert_eq!(session.turns, 0);
    }

    #[test]
    fn specific_handler_skips_the_library() {
        let (mut session, _console) = session();
        let mut script = Recorder::answering(&[("take_cup", Signal::Handled), ("+take", Signal::Handled)]);
        dispatch(&mut session, &mut script, &command("take", &[3], &[])).unwrap();
        assert_eq!(script.ran(), vec!["take_cup"]);
        assert!(script.asked.contains(&"+eachturn".to_string()));
    }

    #[test]
    fn override_falls_back_to_default() {
        let (mut session, _console) = session();
        let mut script = Recorder::answering(&[("+take", Signal::Override), ("+default_take", Signal::Handled)]);
        dispatch(&mut session, &mut script, &command("take", &[3], &[])).unwrap();
        assert_eq!(script.ran(), vec!["+take", "+default_take"]);
        assert!(script.asked.contains(&"take_override_cup".to_string()));

        let mut script = Recorder::answering(&[
            ("+take", Signal::Override),
            ("take_override_cup", Signal::Handled),
            ("+default_take", Signal::Handled),
        ]);
        dispatch(&mut session, &mut script, &command("take", &[3], &[])).unwrap();
        assert_eq!(script.ran(), vec!["+take", "take_override_cup"]);
    }

    #[test]
    fn commands_without_nouns_are_qualified_by_location() {
        let (mut session, _console) = session();
        let mut script = Recorder::default();
        dispatch(&mut session, &mut script, &command("look", &[], &[])).unwrap();
        assert!(script.asked.contains(&"look_kitchen".to_string()));
        assert!(script.asked.contains(&"after_look".to_string()));
    }

    #[test]
    fn stopped_time_skips_eachturn() {
        let (mut session, _console) = session();
        let mut script = Recorder {
            stops_time: Some("+take".into()),
            ..Recorder::default()
        };
        dispatch(&mut session, &mut script, &command("take", &[3], &[])).unwrap();
        assert!(script.asked.contains(&"+after".to_string()));
        assert!(!script.asked.contains(&"+eachturn".to_string()));
        assert_eq!(session.turns, 0);
    }

    #[test]
    fn multi_object_commands_run_once_per_object_with_prefix() {
        let (mut session, console) = session();
        let mut script = Recorder::answering(&[("+take", Signal::Handled)]);
        dispatch(&mut session, &mut script, &command("take", &[3, 5], &[])).unwrap();
        assert_eq!(script.ran(), vec!["+take", "+take"]);
        assert_eq!(console.output(), "the cup: the plate: ");
        assert_eq!(session.turns, 2);

        let mut script = Recorder::answering(&[("+put", Signal::Handled)]);
        console.take_output();
        dispatch(&mut session, &mut script, &command("put", &[4], &[3, 5])).unwrap();
        assert!(script.asked.contains(&"put_plate_box".to_string()));
        assert_eq!(console.output(), "the cup: the plate: ");
    }

    #[test]
    fn interruption_stops_remaining_objects() {
        let (mut session, _console) = session();
        let mut script = Recorder {
            interrupts: Some("+take".into()),
            ..Recorder::default()
        };
        dispatch(&mut session, &mut script, &command("take", &[3, 5], &[])).unwrap();
        assert_eq!(script.asked, vec!["+before", "+before_take", "take_cup", "+take"]);
        assert_eq!(session.turns, 0);
    }

    #[test]
    fn interrupting_before_handler_ends_the_chain() {
        let (mut session, _console) = session();
        let mut script = Recorder {
            interrupts: Some("+before".into()),
            ..Recorder::default()
        };
        dispatch(&mut session, &mut script, &command("look", &[], &[])).unwrap();
        assert_eq!(script.asked, vec!["+before"]);
        assert_eq!(session.turns, 0);
    }

    #[test]
    fn only_a_handled_signal_ends_the_chain() {
        assert!(handled(Some(Signal::Handled)));
        assert!(!handled(Some(Signal::NotHandled)));
        assert!(!handled(Some(Signal::Override)));
        assert!(!handled(None));
    }
}

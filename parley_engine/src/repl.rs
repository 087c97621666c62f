//! The read-eval-print loop.
//!
//! Reads a line from the session's console, runs it through the session, and
//! repeats until the player leaves or a handler ends the game.

pub mod input;

use log::{error, info};

use crate::script::Script;
use crate::session::Session;
use crate::style::GameStyle;
use input::InputEvent;

/// Control flow signal for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplControl {
    Continue,
    Quit,
}

/// Run the main loop until input ends or the game is over. Handler failures
/// are logged and shown to the player.
pub fn run_repl(session: &mut Session, script: &mut dyn Script) {
    let mut current_turn = None;
    loop {
        if current_turn != Some(session.turns) {
            current_turn = Some(session.turns);
            info!("================> BEGIN TURN {} <================", session.turns + 1);
        }
        if let ReplControl::Quit = step(session, script) {
            break;
        }
    }
    info!("leaving the game after {} turns", session.turns);
}

/// Read and run one line of input.
pub fn step(session: &mut Session, script: &mut dyn Script) -> ReplControl {
    let prompt = format!("\n[Turn: {}]> ", session.turns + 1).prompt_style().to_string();
    let line = match session.console.read_line(&prompt) {
        InputEvent::Line(line) => line,
        InputEvent::Eof => {
            session.console.writeln("");
            return ReplControl::Quit;
        },
        InputEvent::Interrupted => {
            session.console.writeln("Command canceled. (Press Ctrl-D to leave.)");
            return ReplControl::Continue;
        },
    };

    if let Err(err) = session.process_line(&line, script) {
        error!("handler failed while running '{line}': {err:#}");
        session.console.error("Something went wrong running that command.");
    }

    if session.game_over {
        ReplControl::Quit
    } else {
        ReplControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::console::BufferConsole;
    use crate::dispatch::{Call, HandlerKey, Signal};
    use crate::grammar::GrammarTree;
    use crate::object::GameObject;
    use crate::store::ObjectStore;
    use crate::object::{Attribute, AttributeSet};
    use anyhow::{Result, bail};

    struct Verbs;

    impl Script for Verbs {
        fn execute(&mut self, key: &HandlerKey, _call: &Call, session: &mut Session) -> Result<Option<Signal>> {
            match key {
                HandlerKey::Library { verb } if verb == "quit" => {
                    session.game_over = true;
                    Ok(Some(Signal::Handled))
                },
                HandlerKey::Library { verb } if verb == "break" => bail!("broken handler"),
                HandlerKey::Library { .. } => {
                    session.console.writeln("Done.");
                    Ok(Some(Signal::Handled))
                },
                _ => Ok(None),
            }
        }
    }

    fn session() -> (Session, BufferConsole) {
        let mut store = ObjectStore::new();
        let mut hall = GameObject::new(0, "hall", &["hall"]);
        hall.attributes = AttributeSet::empty().with(Attribute::Location);
        let hall = store.add(hall);
        let mut player = GameObject::new(0, "player", &["me"]);
        player.parent = hall;
        let player = store.add(player);
        store.set_player(player).unwrap();
        let grammar = GrammarTree::from_rules(&["look >look", "quit >quit", "break >break"]).unwrap();
        let console = BufferConsole::new();
        let session = Session::new(store, grammar, ParserConfig::default(), Box::new(console.clone()));
        (session, console)
    }

    #[test]
    fn loop_runs_until_input_ends() {
        let (mut session, console) = session();
        console.queue_input(&["look", "look"]);
        run_repl(&mut session, &mut Verbs);
        assert_eq!(session.turns, 2);
        assert_eq!(console.output().matches("Done.").count(), 2);
    }

    #[test]
    fn game_over_stops_the_loop() {
        let (mut session, console) = session();
        console.queue_input(&["quit", "look"]);
        run_repl(&mut session, &mut Verbs);
        assert!(!console.output().contains("Done."));
    }

    #[test]
    fn handler_failure_is_shown_and_the_loop_goes_on() {
        let (mut session, console) = session();
        console.queue_input(&["break"]);
        assert_eq!(step(&mut session, &mut Verbs), ReplControl::Continue);
        assert!(console.output().contains("Something went wrong"));
        assert_eq!(step(&mut session, &mut Verbs), ReplControl::Quit);
    }
}

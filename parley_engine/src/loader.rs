//! Loading a game from its data directory.
//!
//! A game is a RON world file (`world.ron`: objects, grammar, handlers) plus
//! an optional TOML parser configuration (`parser.toml`).

pub mod worlddef;

use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use parley_data::WorldDef;

use crate::config::load_config;
use crate::console::Console;
use crate::data_paths::data_root;
use crate::dispatch::HandlerKey;
use crate::grammar::GrammarTree;
use crate::loader::worlddef::{build_grammar, build_store, load_worlddef};
use crate::script::ScriptTable;
use crate::session::{GameInfo, Session};

/// A session ready to play and the handlers that drive it.
pub struct LoadedGame {
    pub session: Session,
    pub script: ScriptTable,
}

/// Load the game from the detected data directory.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, or validation.
pub fn load_game(console: Box<dyn Console>) -> Result<LoadedGame> {
    load_game_from(data_root(), console)
}

/// Load the game from `dir`.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, or validation.
pub fn load_game_from(dir: &Path, console: Box<dyn Console>) -> Result<LoadedGame> {
    let world_path = dir.join("world.ron");
    let worlddef = load_worlddef(&world_path).context("while loading worlddef from file")?;
    validate_worlddef(&worlddef)?;

    let store = build_store(&worlddef).context("while building objects from worlddef")?;
    info!("{} objects loaded", store.len());
    let grammar = build_grammar(&worlddef).context("while building grammar from worlddef")?;
    let script = ScriptTable::from_defs(&worlddef.handlers, &store).context("while building handlers from worlddef")?;
    warn_unhandled_actions(&grammar, &script);
    let config = load_config(&dir.join("parser.toml"));

    let mut session = Session::new(store, grammar, config, console);
    session.info = GameInfo {
        title: worlddef.game.title.clone(),
        author: worlddef.game.author.clone(),
        intro: worlddef.game.intro.clone(),
    };
    info!("game \"{}\" loaded from '{}'", session.info.title, dir.display());
    Ok(LoadedGame { session, script })
}

/// Validate the WorldDef and return a single aggregated error.
fn validate_worlddef(def: &WorldDef) -> Result<()> {
    let errors = parley_data::validate_world(def);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("worlddef validation failed:\n{details}");
}

/// Actions the grammar can produce but no library handler answers.
fn warn_unhandled_actions(grammar: &GrammarTree, script: &ScriptTable) {
    for verb in grammar.actions() {
        let key = HandlerKey::Library { verb };
        if !script.contains(&key) {
            warn!("grammar action has no library handler '{key}'");
        }
    }
}

#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Parley: a rule-based command interpreter for text adventures.
//!
//! Player input is matched against an author-supplied grammar tree, noun
//! phrases are resolved to objects in the world, and the resulting command is
//! handed to a chain of handlers.

pub const PARLEY_VERSION: &str = env!("CARGO_PKG_VERSION");

// World model
pub mod object;
pub mod scope;
pub mod store;

// Parsing
pub mod clause;
pub mod context;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod resolver;
pub mod tokens;

// Running commands
pub mod config;
pub mod console;
pub mod data_paths;
pub mod dispatch;
pub mod loader;
pub mod repl;
pub mod script;
pub mod session;
pub mod style;

// Re-exports for convenience
pub use console::{BufferConsole, Console, TerminalConsole};
pub use dispatch::{Call, HandlerKey, Signal, dispatch};
pub use error::ParseError;
pub use loader::{LoadedGame, load_game, load_game_from};
pub use parser::ParsedCommand;
pub use repl::run_repl;
pub use script::{Script, ScriptTable};
pub use session::Session;

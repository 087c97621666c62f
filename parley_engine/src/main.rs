#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Parley **
//! Plays the game found in the data directory.

use parley_engine::style::GameStyle;
use parley_engine::{BufferConsole, LoadedGame, TerminalConsole, load_game, run_repl};

use anyhow::{Context, Result};
use log::{info, warn};

use std::io::Write;

fn main() -> Result<()> {
    env_logger::init();
    info!("Start: loading Parley game...");
    let LoadedGame { mut session, mut script } =
        load_game(Box::new(BufferConsole::new())).context("while loading the game")?;
    session.console = Box::new(TerminalConsole::new(session.vocabulary()));
    info!("game loaded successfully.");

    // clear the screen
    print!("\x1B[2J\x1B[H");
    if let Err(err) = std::io::stdout().flush() {
        warn!("failed to flush stdout: {err}");
    }
    info!("Starting the game!");

    println!("{:^84}", session.info.title.to_uppercase().title_style());
    if !session.info.author.is_empty() {
        println!("{:^84}", format!("by {}", session.info.author));
    }
    if !session.info.intro.is_empty() {
        println!("\n{}", session.info.intro.description_style());
    }

    run_repl(&mut session, &mut script);
    Ok(())
}

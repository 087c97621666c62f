//! A running game: the world, the grammar, and the state carried between commands.

use anyhow::Result;
use log::{error, info};

use crate::config::ParserConfig;
use crate::console::Console;
use crate::context::{Pronouns, ResolutionContext};
use crate::dispatch::dispatch;
use crate::error::ParseError;
use crate::grammar::GrammarTree;
use crate::parser::Parser;
use crate::script::Script;
use crate::store::ObjectStore;
use crate::tokens::Tokens;

/// Title and introduction shown when the game starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameInfo {
    pub title: String,
    pub author: String,
    pub intro: String,
}

/// Owns everything a command needs and runs player input through it.
pub struct Session {
    pub info: GameInfo,
    pub store: ObjectStore,
    pub grammar: GrammarTree,
    pub config: ParserConfig,
    pub pronouns: Pronouns,
    pub console: Box<dyn Console>,
    /// Set when a command fails or a handler interrupts; stops the rest of the line.
    pub interrupted: bool,
    /// Cleared by a failed command or a handler that takes no time.
    pub time_passes: bool,
    pub game_over: bool,
    pub turns: u32,
    ctx: ResolutionContext,
    depth: usize,
}

impl Session {
    pub fn new(store: ObjectStore, grammar: GrammarTree, config: ParserConfig, console: Box<dyn Console>) -> Self {
        Self {
            info: GameInfo::default(),
            store,
            grammar,
            config,
            pronouns: Pronouns::default(),
            console,
            interrupted: false,
            time_passes: false,
            game_over: false,
            turns: 0,
            ctx: ResolutionContext::new(),
            depth: 0,
        }
    }

    /// Run one line of input: every command on it, separated by THEN, until
    /// the line ends or a command fails or is interrupted.
    ///
    /// Player mistakes are reported to the console, not returned.
    ///
    /// # Errors
    /// - if a handler fails
    pub fn process_line(&mut self, text: &str, script: &mut dyn Script) -> Result<()> {
        self.interrupted = false;
        let tokens = Tokens::tokenize_at(text, self.depth).without_words(&self.config.keywords.ignore);
        let mut start = 0;
        loop {
            while tokens.word(start).is_some_and(|word| self.config.keywords.is_then(word)) {
                start += 1;
            }
            if start >= tokens.len() {
                break;
            }

            let parsed = Parser::new(
                &self.store,
                &self.grammar,
                &self.config,
                &mut self.pronouns,
                self.console.as_mut(),
                &mut self.ctx,
                &tokens,
            )
            .parse(start);

            let command = match parsed {
                Ok(command) => command,
                Err(err) => {
                    self.report(&err);
                    break;
                },
            };
            info!(
                "'{}' parsed as '{}' (noun1 {:?}, noun2 {:?})",
                command.phrase, command.action, command.noun1, command.noun2
            );
            dispatch(self, script, &command)?;

            match command.next {
                Some(next) if !self.interrupted && !self.game_over => start = next,
                _ => break,
            }
        }
        Ok(())
    }

    /// Run a sentence from inside a handler as if the player had typed it,
    /// leaving the outer command's state as it was.
    ///
    /// # Errors
    /// - if a handler of the nested sentence fails
    pub fn run_nested(&mut self, sentence: &str, script: &mut dyn Script) -> Result<()> {
        if self.depth >= self.config.max_nesting {
            self.report(&ParseError::NestingTooDeep(self.depth));
            return Ok(());
        }
        info!("nested sentence at depth {}: '{sentence}'", self.depth + 1);

        let saved_ctx = std::mem::take(&mut self.ctx);
        let saved_pronouns = self.pronouns.clone();
        let saved_flags = (self.interrupted, self.time_passes);
        self.depth += 1;

        let result = self.process_line(sentence, script);

        self.depth -= 1;
        self.ctx = saved_ctx;
        self.pronouns = saved_pronouns;
        (self.interrupted, self.time_passes) = saved_flags;
        result
    }

    /// Show a failed command to the player and stop the line.
    pub fn report(&mut self, err: &ParseError) {
        if err.is_configuration() {
            error!("configuration error: {err}");
        } else {
            info!("command rejected: {err}");
        }
        let message = err.render(&self.config.messages);
        self.console.error(&message);
        self.time_passes = false;
        self.interrupted = true;
    }

    /// Words worth offering for tab completion: grammar literals and object names.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut words = self.grammar.literal_words();
        for id in self.store.ids() {
            if let Some(object) = self.store.get(id) {
                words.extend(object.names.iter().cloned());
                words.extend(object.plurals.iter().cloned());
            }
        }
        words.sort_unstable();
        words.dedup();
        words
    }
}

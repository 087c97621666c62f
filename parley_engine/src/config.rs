//! Parser configuration: keywords, player-facing messages and tuning values.
//!
//! Everything here can be overridden from `parser.toml`; any field left out of
//! the file keeps its default. If the file is missing or cannot be parsed the
//! built-in defaults are used and a warning is logged.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::object::HEAVY;
use crate::tokens::{COMMA, FULL_STOP};

/// Complete parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    pub keywords: KeyWords,
    pub messages: Messages,
    /// Mass at which an object counts as scenery.
    pub heavy: i32,
    /// Most candidates listed in a disambiguation prompt.
    pub max_choices: usize,
    /// Re-prompt instead of failing when a disambiguation reply is invalid.
    pub insist_on_choice: bool,
    /// Print the object acted on before each iteration of a multi-object command.
    pub multi_prefix: bool,
    /// Deepest allowed chain of handler-issued sentences.
    pub max_nesting: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            keywords: KeyWords::default(),
            messages: Messages::default(),
            heavy: HEAVY,
            max_choices: 9,
            insist_on_choice: false,
            multi_prefix: true,
            max_nesting: 8,
        }
    }
}

/// Words with a fixed meaning to the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyWords {
    pub then: Vec<String>,
    pub and: Vec<String>,
    pub except: Vec<String>,
    #[serde(rename = "for")]
    pub for_word: String,
    pub from: String,
    pub of: String,
    pub everything: Vec<String>,
    pub it: Vec<String>,
    pub him: Vec<String>,
    pub her: Vec<String>,
    pub them: Vec<String>,
    /// Filler words removed before parsing.
    pub ignore: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Default for KeyWords {
    fn default() -> Self {
        Self {
            then: words(&["then"]),
            and: words(&["and"]),
            except: words(&["but", "except"]),
            for_word: "for".into(),
            from: "from".into(),
            of: "of".into(),
            everything: words(&["everything", "all"]),
            it: words(&["it", "itself"]),
            him: words(&["him", "himself"]),
            her: words(&["her", "herself"]),
            them: words(&["them", "themselves", "ones"]),
            ignore: words(&["the", "a", "an"]),
        }
    }
}

impl KeyWords {
    pub fn is_then(&self, word: &str) -> bool {
        word == FULL_STOP || self.then.iter().any(|w| w == word)
    }

    /// AND words and the comma token.
    pub fn is_separator(&self, word: &str) -> bool {
        word == COMMA || self.and.iter().any(|w| w == word)
    }

    pub fn is_except(&self, word: &str) -> bool {
        self.except.iter().any(|w| w == word)
    }

    pub fn is_from(&self, word: &str) -> bool {
        self.from == word
    }

    pub fn is_of(&self, word: &str) -> bool {
        self.of == word
    }

    pub fn is_for(&self, word: &str) -> bool {
        self.for_word == word
    }

    pub fn is_everything(&self, word: &str) -> bool {
        self.everything.iter().any(|w| w == word)
    }

    /// Words that end an object phrase regardless of the grammar.
    pub fn ends_phrase(&self, word: &str) -> bool {
        self.is_from(word) || self.is_separator(word) || self.is_except(word) || self.is_then(word)
    }

    /// Which back-reference a word names, if any.
    pub fn pronoun(&self, word: &str) -> Option<Pronoun> {
        let has = |list: &[String]| list.iter().any(|w| w == word);
        if has(&self.it) {
            Some(Pronoun::It)
        } else if has(&self.him) {
            Some(Pronoun::Him)
        } else if has(&self.her) {
            Some(Pronoun::Her)
        } else if has(&self.them) {
            Some(Pronoun::Them)
        } else {
            None
        }
    }
}

/// The four back-reference pronouns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pronoun {
    It,
    Him,
    Her,
    Them,
}

/// Player-facing message templates. `{name}` markers are filled in by [`render`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Messages {
    pub unknown_word: String,
    pub unknown_object: String,
    pub incomplete_sentence: String,
    pub no_referent: String,
    pub no_multiple_verb: String,
    pub no_multiple_start: String,
    pub double_exception: String,
    pub container_closed: String,
    pub container_closed_female: String,
    pub none_held: String,
    pub no_objects: String,
    pub invalid_selection: String,
    pub referring_to: String,
    pub choice: String,
    pub no_grammar: String,
    pub incomplete_grammar: String,
    pub nesting_too_deep: String,
    pub multi_prefix: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            unknown_word: "You can't use the word \"{word}\" in that context.".into(),
            unknown_object: "I don't know what \"{object}\" refers to.".into(),
            incomplete_sentence: "The sentence you typed was incomplete.".into(),
            no_referent: "You must name an object before you can use the word \"{word}\".".into(),
            no_multiple_verb: "You can't refer to multiple objects directly after the word \"{word}\".".into(),
            no_multiple_start: "You can't refer to multiple objects at the start of a command.".into(),
            double_exception: "You can't use the word \"{word}\" twice in one command.".into(),
            container_closed: "{object} is closed.".into(),
            container_closed_female: "{object} has her arms folded.".into(),
            none_held: "You are not holding anything.".into(),
            no_objects: "I'm not sure what you're referring to.".into(),
            invalid_selection: "No such choice.".into(),
            referring_to: "By \"{phrase}\", are you referring to:".into(),
            choice: "  [{number}] {object}".into(),
            no_grammar: "There is nothing you can do here.".into(),
            incomplete_grammar: "The game's grammar is incomplete; that command cannot be finished.".into(),
            nesting_too_deep: "Commands are nested too deeply.".into(),
            multi_prefix: "{object}: ".into(),
        }
    }
}

/// Fill `{key}` markers in a template.
///
/// ```
/// use parley_engine::config::render;
///
/// assert_eq!(render("take {object}?", &[("object", "the cup")]), "take the cup?");
/// ```
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Load parser configuration, falling back to defaults on any error.
pub fn load_config(toml_path: &Path) -> ParserConfig {
    match try_load_config(toml_path) {
        Ok(config) => {
            info!("parser configuration loaded from '{}'", toml_path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load parser configuration from '{}': {e:#}. Using built-in defaults.",
                toml_path.display()
            );
            ParserConfig::default()
        },
    }
}

fn try_load_config(toml_path: &Path) -> Result<ParserConfig> {
    let text = fs::read_to_string(toml_path)
        .with_context(|| format!("reading parser configuration from '{}'", toml_path.display()))?;
    let config: ParserConfig = toml::from_str(&text)
        .with_context(|| format!("parsing parser configuration from '{}'", toml_path.display()))?;
    Ok(config)
}

//! Failures that end a command.

use thiserror::Error;

use crate::config::{Messages, render};

/// A command could not be understood or carried out. Rendered to the player once,
/// at the command boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown word '{0}'")]
    UnknownWord(String),
    #[error("unknown object '{0}'")]
    UnknownObject(String),
    #[error("incomplete sentence")]
    IncompleteSentence,
    #[error("pronoun '{0}' has no referent")]
    NoReferent(String),
    #[error("multiple objects not allowed (after {verb:?})")]
    NoMultiple { verb: Option<String> },
    #[error("second exception word '{0}'")]
    DoubleException(String),
    #[error("'{display}' is closed")]
    ContainerClosed { display: String, female: bool },
    #[error("no held objects")]
    NoneHeld,
    #[error("no objects left")]
    NoObjects,
    #[error("invalid disambiguation choice")]
    InvalidSelection,
    #[error("no grammar rules defined")]
    NoGrammar,
    #[error("grammar path ends without an action")]
    IncompleteGrammar,
    #[error("nested sentences exceed depth {0}")]
    NestingTooDeep(usize),
}

impl ParseError {
    /// True for problems in the game data rather than in what the player typed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ParseError::NoGrammar | ParseError::IncompleteGrammar | ParseError::NestingTooDeep(_)
        )
    }

    /// The message shown to the player.
    pub fn render(&self, messages: &Messages) -> String {
        match self {
            ParseError::UnknownWord(word) => render(&messages.unknown_word, &[("word", word)]),
            ParseError::UnknownObject(object) => render(&messages.unknown_object, &[("object", object)]),
            ParseError::IncompleteSentence => messages.incomplete_sentence.clone(),
            ParseError::NoReferent(word) => render(&messages.no_referent, &[("word", word)]),
            ParseError::NoMultiple { verb: Some(verb) } => render(&messages.no_multiple_verb, &[("word", verb)]),
            ParseError::NoMultiple { verb: None } => messages.no_multiple_start.clone(),
            ParseError::DoubleException(word) => render(&messages.double_exception, &[("word", word)]),
            ParseError::ContainerClosed { display, female } => {
                let template = if *female {
                    &messages.container_closed_female
                } else {
                    &messages.container_closed
                };
                capitalize(&render(template, &[("object", display)]))
            },
            ParseError::NoneHeld => messages.none_held.clone(),
            ParseError::NoObjects => messages.no_objects.clone(),
            ParseError::InvalidSelection => messages.invalid_selection.clone(),
            ParseError::NoGrammar => messages.no_grammar.clone(),
            ParseError::IncompleteGrammar => messages.incomplete_grammar.clone(),
            ParseError::NestingTooDeep(_) => messages.nesting_too_deep.clone(),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

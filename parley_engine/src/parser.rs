//! Grammar matching.
//!
//! [`Parser`] walks the grammar tree one level at a time. At each level the
//! current token is first tried against the literal and wildcard words, then
//! against the object placeholders in declaration order; the first placeholder
//! that yields at least one object wins. When the tokens run out (or THEN is
//! reached) the level must offer an action leaf, which names the command.
//!
//! Noun phrase resolution lives in [`crate::resolver`] and list building in
//! [`crate::clause`]; both extend `Parser` with further methods.

use log::error;

use crate::config::ParserConfig;
use crate::console::Console;
use crate::context::{Captures, ObjectList, Pronouns, ResolutionContext, Slot};
use crate::error::ParseError;
use crate::grammar::{GrammarTree, NodeId, NodeKind, Placeholder};
use crate::object::ObjectId;
use crate::store::ObjectStore;
use crate::tokens::{Tokens, integer_value};

/// A command that matched a complete grammar path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub action: String,
    pub noun1: Vec<ObjectId>,
    pub noun2: Vec<ObjectId>,
    pub captures: Captures,
    /// The words of this command, up to THEN or the end of input.
    pub phrase: String,
    /// Where the next command on the same line starts, if there is one.
    pub next: Option<usize>,
}

/// Borrowed view of everything one parse needs.
pub struct Parser<'a> {
    pub(crate) store: &'a ObjectStore,
    pub(crate) grammar: &'a GrammarTree,
    pub(crate) config: &'a ParserConfig,
    pub(crate) pronouns: &'a mut Pronouns,
    pub(crate) console: &'a mut dyn Console,
    pub(crate) ctx: &'a mut ResolutionContext,
    pub(crate) tokens: &'a Tokens,
    pub(crate) start: usize,
}

impl<'a> Parser<'a> {
    pub fn new(
        store: &'a ObjectStore,
        grammar: &'a GrammarTree,
        config: &'a ParserConfig,
        pronouns: &'a mut Pronouns,
        console: &'a mut dyn Console,
        ctx: &'a mut ResolutionContext,
        tokens: &'a Tokens,
    ) -> Self {
        Self {
            store,
            grammar,
            config,
            pronouns,
            console,
            ctx,
            tokens,
            start: 0,
        }
    }

    /// Parse the command beginning at token `start`.
    ///
    /// # Errors
    /// - any [`ParseError`]; the caller renders it to the player
    pub fn parse(&mut self, start: usize) -> Result<ParsedCommand, ParseError> {
        *self.ctx = ResolutionContext::new();
        self.ctx.cursor = start;
        self.start = start;

        let Some(root) = self.grammar.root() else {
            return Err(ParseError::NoGrammar);
        };

        let mut level = Some(root);
        let mut placeholders = 0;
        while let Some(first) = level {
            let Some(word) = self.word() else {
                break;
            };
            self.ctx.object_expected = false;
            if self.config.keywords.is_then(word) {
                break;
            }
            if let Some(node) = self.exact_match(first) {
                level = self.grammar.node(node).first_child;
                continue;
            }
            let Some((node, placeholder)) = self.object_match(first, placeholders)? else {
                return Err(ParseError::UnknownWord(word.to_string()));
            };

            let slot = Slot::noun(placeholders);
            if self.ctx.list(slot).live() > 1 && !placeholder.multiple {
                let verb = self
                    .ctx
                    .last_exact
                    .and_then(|index| self.tokens.word(index))
                    .map(str::to_string);
                return Err(ParseError::NoMultiple { verb });
            }
            self.ctx.expected_scope[placeholders.min(1)] = Some(placeholder.scope);
            placeholders += 1;
            level = self.grammar.node(node).first_child;
        }

        let Some(first) = level else {
            error!(
                "grammar path '{}' has no action leaf",
                self.tokens.phrase(self.start, self.ctx.cursor)
            );
            return Err(ParseError::IncompleteGrammar);
        };

        let action = self
            .grammar
            .siblings(Some(first))
            .find_map(|id| self.grammar.node(id).kind.clone().action());
        let Some(action) = action else {
            return Err(self.diagnose());
        };

        let next = self
            .word()
            .filter(|word| self.config.keywords.is_then(word))
            .map(|_| self.ctx.cursor + 1);
        Ok(ParsedCommand {
            action,
            noun1: self.ctx.list(Slot::Noun1).to_vec(),
            noun2: self.ctx.list(Slot::Noun2).to_vec(),
            captures: self.ctx.captures.clone(),
            phrase: self.tokens.phrase(self.start, self.ctx.cursor),
            next,
        })
    }

    /// The token under the cursor.
    pub(crate) fn word(&self) -> Option<&'a str> {
        self.tokens.word(self.ctx.cursor)
    }

    /// Try the literal and wildcard words of one level against the current token.
    fn exact_match(&mut self, first: NodeId) -> Option<NodeId> {
        let (grammar, tokens) = (self.grammar, self.tokens);
        let token = tokens.get(self.ctx.cursor)?;
        for id in grammar.siblings(Some(first)) {
            let matched = match &grammar.node(id).kind {
                NodeKind::Placeholder(_) | NodeKind::Action(_) => false,
                NodeKind::Text => {
                    self.ctx.captures.text = Some(token.text.clone());
                    true
                },
                NodeKind::Integer => match integer_value(&token.text) {
                    Some(value) => {
                        self.ctx.captures.integer = Some(value);
                        true
                    },
                    None => false,
                },
                NodeKind::Literal(literal) => !token.quoted && *literal == token.text,
            };
            if matched {
                self.ctx.last_exact = Some(self.ctx.cursor);
                self.ctx.cursor += 1;
                return Some(id);
            }
        }
        None
    }

    /// Try each placeholder of one level in turn.
    ///
    /// Returns `Ok(None)` when the level has no placeholders at all. A
    /// placeholder that finds nothing is undone before the next one is tried.
    fn object_match(&mut self, first: NodeId, position: usize) -> Result<Option<(NodeId, Placeholder)>, ParseError> {
        let grammar = self.grammar;
        let slot = Slot::noun(position);
        let mut had_placeholder = false;
        for id in grammar.siblings(Some(first)) {
            let NodeKind::Placeholder(placeholder) = grammar.node(id).kind else {
                continue;
            };
            had_placeholder = true;
            let mark = self.mark(slot);
            if self.build_object_list(id, placeholder, slot)? {
                return Ok(Some((id, placeholder)));
            }
            self.rewind(mark);
        }
        if had_placeholder {
            Err(self.diagnose())
        } else {
            Ok(None)
        }
    }

    /// Explain why the tokens at the cursor could not be used.
    pub(crate) fn diagnose(&self) -> ParseError {
        match self.word() {
            None => ParseError::IncompleteSentence,
            Some(word) if self.config.keywords.is_then(word) => ParseError::IncompleteSentence,
            Some(_) if self.ctx.object_expected && self.ctx.cursor != self.start => {
                ParseError::UnknownObject(self.ctx.object_phrase.clone())
            },
            Some(word) => ParseError::UnknownWord(word.to_string()),
        }
    }

    fn mark(&self, slot: Slot) -> Mark {
        let exception = slot.exception().unwrap_or(slot);
        Mark {
            cursor: self.ctx.cursor,
            primary: self.ctx.list(slot).clone(),
            exception: self.ctx.list(exception).clone(),
            from_objects: self.ctx.from_objects.clone(),
            after_from: self.ctx.after_from,
            slot,
        }
    }

    fn rewind(&mut self, mark: Mark) {
        self.ctx.cursor = mark.cursor;
        *self.ctx.list_mut(mark.slot) = mark.primary;
        if let Some(exception) = mark.slot.exception() {
            *self.ctx.list_mut(exception) = mark.exception;
        }
        self.ctx.from_objects = mark.from_objects;
        self.ctx.after_from = mark.after_from;
    }
}

/// Parser state saved before trying a placeholder.
struct Mark {
    cursor: usize,
    primary: ObjectList,
    exception: ObjectList,
    from_objects: Vec<ObjectId>,
    after_from: Option<usize>,
    slot: Slot,
}

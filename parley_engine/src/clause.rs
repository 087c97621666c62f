//! Object lists for one placeholder: AND-separated phrases, BUT/EXCEPT
//! exclusions and FROM qualifiers.

use log::info;

use crate::context::Slot;
use crate::error::ParseError;
use crate::grammar::{NodeId, NodeKind, Placeholder, Scope};
use crate::object::{Attribute, ObjectId};
use crate::parser::Parser;
use crate::resolver::Resolved;
use crate::scope::ScopeEvaluator;

impl Parser<'_> {
    /// Fill `slot` with the objects named at the cursor.
    ///
    /// Returns `Ok(false)` when a phrase matched nothing, so that a later
    /// placeholder can be tried instead.
    ///
    /// # Errors
    /// - a second exception clause, a closed FROM container, an unknown FROM
    ///   object, or a list that ends up empty after exclusions
    pub(crate) fn build_object_list(
        &mut self,
        node: NodeId,
        placeholder: Placeholder,
        slot: Slot,
    ) -> Result<bool, ParseError> {
        let config = self.config;
        let keywords = &config.keywords;
        let mut target = slot;

        self.from_lookahead(node, placeholder, slot)?;

        while let Some(word) = self.word() {
            if keywords.is_except(word) {
                let Some(exception) = target.exception() else {
                    return Err(ParseError::DoubleException(word.to_string()));
                };
                self.ctx.cursor += 1;
                if self.word().is_some_and(|w| keywords.is_for(w)) {
                    self.ctx.cursor += 1;
                }
                self.from_lookahead(node, placeholder, slot)?;
                self.pronouns.refresh_them(self.ctx.list(target), self.store);
                target = exception;
            } else if keywords.is_from(word)
                && let Some(after_from) = self.ctx.after_from
            {
                self.ctx.cursor = after_from;
                if self.ctx.list(target).is_empty() {
                    self.add_all(placeholder, target);
                }
                self.from_lookahead(node, placeholder, slot)?;
            } else if keywords.is_then(word) || self.is_terminator(node, word) {
                break;
            } else if keywords.is_separator(word) {
                self.ctx.cursor += 1;
            } else {
                match self.resolve(node, placeholder, false, target)? {
                    Resolved::One(id) => self.add_to_list(target, id),
                    Resolved::Many(ids) => {
                        for id in ids {
                            self.add_to_list(target, id);
                        }
                    },
                    Resolved::Nothing => return Ok(false),
                }
            }
        }

        let primary = target.primary();
        if target != primary {
            self.pronouns.refresh_them(self.ctx.list(target), self.store);
            let excluded = self.ctx.list(target).to_vec();
            for id in excluded {
                self.ctx.list_mut(primary).remove(id);
            }
        }

        if self.ctx.list(primary).is_empty() {
            info!("object list for {primary:?} is empty after exclusions");
            return Err(if placeholder.scope == Scope::Held {
                ParseError::NoneHeld
            } else {
                ParseError::NoObjects
            });
        }
        self.pronouns.refresh_them(self.ctx.list(primary), self.store);
        Ok(true)
    }

    /// Look ahead for a FROM clause belonging to this phrase and resolve its
    /// objects. The cursor is left where it was.
    fn from_lookahead(&mut self, node: NodeId, placeholder: Placeholder, slot: Slot) -> Result<(), ParseError> {
        let config = self.config;
        let keywords = &config.keywords;
        let grammar = self.grammar;

        // the grammar consumes FROM itself, as in "take *present from *present"
        let grammar_from = grammar
            .children(node)
            .any(|child| matches!(&grammar.node(child).kind, NodeKind::Literal(literal) if keywords.is_from(literal)));
        if grammar_from {
            return Ok(());
        }

        let backup = self.ctx.cursor;
        while let Some(word) = self.word() {
            if keywords.is_from(word) {
                self.ctx.cursor += 1;
                let resolved = self.resolve(node, placeholder, true, slot)?;
                self.ctx.after_from = Some(self.ctx.cursor);
                let from_objects = match resolved {
                    Resolved::One(id) => vec![id],
                    Resolved::Many(ids) => ids,
                    Resolved::Nothing => return Err(self.diagnose()),
                };
                for &id in &from_objects {
                    self.verify_from(id)?;
                }
                self.ctx.from_objects = from_objects;
                self.ctx.cursor = backup;
                return Ok(());
            }
            if keywords.is_except(word) || keywords.is_then(word) || self.is_terminator(node, word) {
                break;
            }
            self.ctx.cursor += 1;
        }
        self.ctx.cursor = backup;
        Ok(())
    }

    /// A FROM object must not be a closed container.
    fn verify_from(&self, id: ObjectId) -> Result<(), ParseError> {
        match self.store.get(id) {
            Some(object) if object.is(Attribute::Container) && object.is(Attribute::Closed) => {
                Err(ParseError::ContainerClosed {
                    display: object.display.clone(),
                    female: object.is(Attribute::Female),
                })
            },
            _ => Ok(()),
        }
    }

    /// Without a FROM clause every object qualifies; otherwise only the
    /// immediate children of a FROM object do.
    pub(crate) fn is_child_of_from(&self, id: ObjectId) -> bool {
        self.ctx.from_objects.is_empty() || self.ctx.from_objects.contains(&self.store.parent(id))
    }

    /// Everything portable in scope, for a bare "from X" with nothing before it.
    fn add_all(&mut self, placeholder: Placeholder, slot: Slot) {
        let scope = ScopeEvaluator::new(self.store, self.config.heavy);
        let anchor = self.ctx.first_available(Slot::Noun1);
        let store = self.store;
        for id in store.ids() {
            let Some(object) = store.get(id) else {
                continue;
            };
            if object.mass < self.config.heavy
                && !object.is_location()
                && self.is_child_of_from(id)
                && scope.in_scope(id, placeholder.scope, true, anchor)
            {
                self.add_to_list(slot, id);
            }
        }
    }

    /// Pronouns noted here survive a rewind of the phrase.
    fn add_to_list(&mut self, slot: Slot, id: ObjectId) {
        if let Some(object) = self.store.get(id) {
            self.pronouns.note(object);
        }
        self.ctx.list_mut(slot).push(id);
    }
}

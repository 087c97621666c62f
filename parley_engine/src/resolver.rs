//! Noun phrase resolution.
//!
//! Every object starts a phrase as a possible candidate (confidence 1). Each
//! word of the phrase either raises the confidence of the objects it names or
//! knocks the rest out of contention. What survives is filtered by scope and
//! reduced to a single object, a bounded list, or a question to the player.

use log::info;
use variantly::Variantly;

use crate::config::{Pronoun, render};
use crate::context::Slot;
use crate::error::ParseError;
use crate::grammar::{NodeId, NodeKind, Placeholder, Scope};
use crate::object::ObjectId;
use crate::parser::Parser;
use crate::repl::input::InputEvent;
use crate::scope::ScopeEvaluator;
use crate::tokens::integer_value;

/// Outcome of resolving one noun phrase.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum Resolved {
    One(ObjectId),
    Many(Vec<ObjectId>),
    /// Nothing matched; the cursor is back at the start of the phrase.
    Nothing,
}

impl Parser<'_> {
    /// Resolve the phrase at the cursor for the placeholder at `node`.
    ///
    /// `finding_from` is set while resolving the target of a FROM clause.
    ///
    /// # Errors
    /// - a pronoun with no referent, or an invalid disambiguation reply
    pub(crate) fn resolve(
        &mut self,
        node: NodeId,
        placeholder: Placeholder,
        finding_from: bool,
        slot: Slot,
    ) -> Result<Resolved, ParseError> {
        let start = self.ctx.cursor;
        let object_count = self.store.len();
        self.ctx.candidates.reset(object_count);
        self.ctx.object_phrase.clear();

        let Some(first) = self.word() else {
            return Ok(Resolved::Nothing);
        };
        let config = self.config;
        let keywords = &config.keywords;

        if let Some(quantity) = integer_value(first)
            && self.tokens.word(start + 1).is_some_and(|w| keywords.is_of(w))
        {
            self.ctx.candidates.return_limit = usize::try_from(quantity).unwrap_or(0).max(1);
            self.ctx.object_expected = true;
            self.ctx.object_phrase = format!("{first} {}", keywords.of);
            self.ctx.cursor += 2;
        }

        let mut typed: Vec<&str> = Vec::new();
        while let Some(word) = self.word() {
            if self.ends_object_phrase(node, word) {
                if self.ctx.candidates.matches() == 0 {
                    self.ctx.cursor = start;
                    return Ok(Resolved::Nothing);
                }
                break;
            }
            typed.push(word);
            if !self.ctx.object_phrase.is_empty() {
                self.ctx.object_phrase.push(' ');
            }
            self.ctx.object_phrase.push_str(word);

            if keywords.is_everything(word) {
                let candidates = &mut self.ctx.candidates;
                if candidates.return_limit == 0 {
                    candidates.return_limit = object_count.max(1);
                }
                candidates.everything = true;
                candidates.counted = true;
                if self.tokens.word(self.ctx.cursor + 1).is_some_and(|w| keywords.is_of(w)) {
                    self.ctx.cursor += 1;
                }
            } else if let Some(pronoun) = keywords.pronoun(word) {
                self.match_pronoun(pronoun, word)?;
            } else {
                self.match_name(word);
            }

            if self.ctx.candidates.matches() == 0 {
                break;
            }
            self.ctx.cursor += 1;
        }

        let candidates = &mut self.ctx.candidates;
        if candidates.return_limit == 0 {
            candidates.return_limit = 1;
        }
        if candidates.matches() == 0 {
            self.ctx.object_expected = true;
            self.ctx.cursor = start;
            return Ok(Resolved::Nothing);
        }

        self.filter_candidates(placeholder, finding_from);
        let phrase = typed.join(" ");
        self.reduce(start, &phrase, slot)
    }

    /// Words that end the phrase: literal children of the placeholder, a number
    /// where the grammar expects one, and the clause keywords.
    pub(crate) fn ends_object_phrase(&self, node: NodeId, word: &str) -> bool {
        self.is_terminator(node, word) || self.config.keywords.ends_phrase(word)
    }

    /// Does `word` continue the grammar after the placeholder at `node`?
    pub(crate) fn is_terminator(&self, node: NodeId, word: &str) -> bool {
        self.grammar
            .children(node)
            .any(|child| match &self.grammar.node(child).kind {
                NodeKind::Literal(literal) => literal == word,
                NodeKind::Integer => integer_value(word).is_some(),
                _ => false,
            })
    }

    fn match_pronoun(&mut self, pronoun: Pronoun, word: &str) -> Result<(), ParseError> {
        let referents: Vec<ObjectId> = match pronoun {
            Pronoun::It => self.pronouns.it.into_iter().collect(),
            Pronoun::Him => self.pronouns.him.into_iter().collect(),
            Pronoun::Her => self.pronouns.her.into_iter().collect(),
            Pronoun::Them => self.pronouns.them.clone(),
        };
        if pronoun != Pronoun::Them && referents.is_empty() {
            return Err(ParseError::NoReferent(word.to_string()));
        }
        let candidates = &mut self.ctx.candidates;
        if pronoun == Pronoun::Them && candidates.return_limit == 0 {
            candidates.return_limit = self.store.len().max(1);
        }
        candidates.counted = true;
        for id in 1..candidates.confidence.len() {
            if candidates.confidence[id] == 0 {
                continue;
            }
            if referents.contains(&id) {
                candidates.confidence[id] += 1;
            } else {
                candidates.exclude(id);
            }
        }
        Ok(())
    }

    fn match_name(&mut self, word: &str) {
        let candidates = &mut self.ctx.candidates;
        candidates.counted = true;
        for id in 1..candidates.confidence.len() {
            if candidates.confidence[id] == 0 {
                continue;
            }
            let Some(object) = self.store.get(id) else {
                candidates.exclude(id);
                continue;
            };
            let plural = object.has_plural(word);
            if plural && candidates.return_limit == 0 {
                candidates.return_limit = self.store.len().max(1);
            }
            if plural || object.has_name(word) {
                candidates.confidence[id] += 1;
            } else {
                candidates.exclude(id);
            }
        }
    }

    /// Scope, scenery and FROM filtering, plus the percentage score for single results.
    fn filter_candidates(&mut self, placeholder: Placeholder, finding_from: bool) {
        let scope = ScopeEvaluator::new(self.store, self.config.heavy);
        let heavy = self.config.heavy;
        let anchor = self.ctx.first_available(Slot::Noun1);
        let unscoped = matches!(placeholder.scope, Scope::Anywhere | Scope::Location);
        let restricted = self.ctx.candidates.everything && self.ctx.from_objects.is_empty();
        let from_objects = self.ctx.from_objects.clone();
        let candidates = &mut self.ctx.candidates;

        for id in 1..candidates.confidence.len() {
            if candidates.confidence[id] == 0 {
                continue;
            }
            let Some(object) = self.store.get(id) else {
                candidates.exclude(id);
                continue;
            };
            if !unscoped && !scope.in_scope(id, Scope::Present, false, None) {
                candidates.exclude(id);
                continue;
            }
            // implicitly included scenery never joins a multi-object result
            if candidates.confidence[id] == 1
                && candidates.return_limit > 1
                && (object.mass >= heavy || object.is_location())
            {
                candidates.exclude(id);
                continue;
            }
            if candidates.return_limit == 1 {
                let names = u32::try_from(object.names.len()).unwrap_or(u32::MAX).max(1);
                candidates.confidence[id] = (candidates.confidence[id] - 1) * 100 / names;
            }
        }

        let highest = candidates.highest();
        for id in 1..candidates.confidence.len() {
            if candidates.confidence[id] == 0 {
                continue;
            }
            // a FROM clause overrules the fallback as well
            let from_ok = from_objects.is_empty() || from_objects.contains(&self.store.parent(id));
            if from_ok && candidates.confidence[id] == highest && scope.in_scope(id, Scope::Present, false, None) {
                candidates.prime_suspect = Some(id);
            }
            let in_scope = if finding_from {
                placeholder.scope == Scope::Anywhere || scope.in_scope(id, Scope::Present, false, None)
            } else {
                scope.in_scope(id, placeholder.scope, restricted, anchor)
            };
            if !in_scope || !from_ok {
                candidates.exclude(id);
            }
        }
    }

    fn reduce(&mut self, start: usize, phrase: &str, slot: Slot) -> Result<Resolved, ParseError> {
        let candidates = &mut self.ctx.candidates;
        let limit = candidates.return_limit;
        if limit == 1 && candidates.live().count() > 1 {
            let highest = candidates.highest();
            for id in 1..candidates.confidence.len() {
                if candidates.confidence[id] != 0 && candidates.confidence[id] < highest {
                    candidates.exclude(id);
                }
            }
        }

        let live: Vec<ObjectId> = candidates.live().collect();
        let prime_suspect = candidates.prime_suspect;
        if live.is_empty() {
            if let Some(id) = prime_suspect {
                return Ok(Resolved::One(id));
            }
            self.ctx.object_expected = true;
            self.ctx.cursor = start;
            return Ok(Resolved::Nothing);
        }
        if live.len() == 1 {
            return Ok(Resolved::One(live[0]));
        }
        if limit > 1 {
            return Ok(Resolved::Many(live.into_iter().take(limit).collect()));
        }
        self.disambiguate(phrase, &live, slot)
    }

    /// Ask the player which of several equally good objects they meant.
    fn disambiguate(&mut self, phrase: &str, live: &[ObjectId], slot: Slot) -> Result<Resolved, ParseError> {
        let config = self.config;
        let messages = &config.messages;
        let shown = &live[..live.len().min(config.max_choices.max(1))];
        info!("asking the player to choose between {} objects for {slot:?}", live.len());

        self.console.writeln(&render(&messages.referring_to, &[("phrase", phrase)]));
        for (index, id) in shown.iter().enumerate() {
            let number = (index + 1).to_string();
            self.console.writeln(&render(
                &messages.choice,
                &[("number", &number), ("object", self.store.display(*id))],
            ));
        }

        loop {
            let reply = match self.console.read_line("> ") {
                InputEvent::Line(line) => line,
                InputEvent::Eof | InputEvent::Interrupted => return Err(ParseError::InvalidSelection),
            };
            let choice = reply
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=shown.len()).contains(n));
            match choice {
                Some(n) => return Ok(Resolved::One(shown[n - 1])),
                None if config.insist_on_choice => {
                    self.console.writeln(&messages.invalid_selection);
                },
                None => return Err(ParseError::InvalidSelection),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::console::BufferConsole;
    use crate::context::{Pronouns, ResolutionContext};
    use crate::grammar::GrammarTree;
    use crate::object::{Attribute, AttributeSet, GameObject, HEAVY, NOWHERE};
    use crate::store::ObjectStore;
    use crate::tokens::Tokens;

    struct Fixture {
        store: ObjectStore,
        grammar: GrammarTree,
        config: ParserConfig,
        pronouns: Pronouns,
        console: BufferConsole,
        ctx: ResolutionContext,
    }

    fn object(store: &mut ObjectStore, label: &str, names: &[&str], parent: ObjectId) -> ObjectId {
        let mut obj = GameObject::new(0, label, names);
        obj.parent = parent;
        obj.mass = 5;
        store.add(obj)
    }

    impl Fixture {
        fn new(rule: &str) -> Self {
            let mut store = ObjectStore::new();
            let mut room = GameObject::new(0, "room", &["room"]);
            room.attributes = AttributeSet::empty().with(Attribute::Location);
            let room = store.add(room);
            let mut player = GameObject::new(0, "player", &["me"]);
            player.parent = room;
            player.mass = HEAVY;
            player.attributes = AttributeSet::empty().with(Attribute::Animate);
            let player = store.add(player);
            store.set_player(player).unwrap();
            Self {
                store,
                grammar: GrammarTree::from_rules(&[rule]).unwrap(),
                config: ParserConfig::default(),
                pronouns: Pronouns::default(),
                console: BufferConsole::new(),
                ctx: ResolutionContext::new(),
            }
        }

        /// Resolve `line` against the first placeholder of the rule.
        fn resolve(&mut self, line: &str) -> Result<Resolved, ParseError> {
            self.ctx = ResolutionContext::new();
            let tokens = Tokens::tokenize(line);
            let node = self.grammar.root().unwrap();
            let NodeKind::Placeholder(placeholder) = self.grammar.node(node).kind else {
                panic!("rule must start with a placeholder");
            };
            let mut parser = Parser::new(
                &self.store,
                &self.grammar,
                &self.config,
                &mut self.pronouns,
                &mut self.console,
                &mut self.ctx,
                &tokens,
            );
            parser.resolve(node, placeholder, false, Slot::Noun1)
        }
    }

    #[test]
    fn unique_name_resolves_without_prompting() {
        let mut fx = Fixture::new("*present >x");
        let cup = object(&mut fx.store, "cup", &["cup", "mug"], 1);
        object(&mut fx.store, "plate", &["plate"], 1);
        assert_eq!(fx.resolve("mug"), Ok(Resolved::One(cup)));
        assert!(fx.console.output().is_empty());
    }

    #[test]
    fn fewer_unmatched_names_score_higher() {
        let mut fx = Fixture::new("*present >x");
        let red = object(&mut fx.store, "red_ball", &["red", "ball"], 1);
        let big_red = object(&mut fx.store, "big_red_ball", &["big", "red", "ball"], 1);
        assert_eq!(fx.resolve("red ball"), Ok(Resolved::One(red)));
        assert_eq!(fx.resolve("big red ball"), Ok(Resolved::One(big_red)));
    }

    #[test]
    fn zero_confidence_objects_never_appear() {
        let mut fx = Fixture::new("*present >x");
        let a = object(&mut fx.store, "a", &["coin"], 1);
        fx.store.get_mut(a).unwrap().plurals = vec!["coins".into()];
        let b = object(&mut fx.store, "b", &["coin"], 1);
        fx.store.get_mut(b).unwrap().plurals = vec!["coins".into()];
        object(&mut fx.store, "c", &["cup"], 1);
        let Ok(Resolved::Many(ids)) = fx.resolve("coins") else {
            panic!("expected several coins");
        };
        assert_eq!(ids, vec![a, b]);
        assert!(ids.iter().all(|id| fx.ctx.candidates.confidence[*id] > 0));
    }

    #[test]
    fn quantity_limits_the_result() {
        let mut fx = Fixture::new("*present >x");
        let mut coins = Vec::new();
        for label in ["c1", "c2", "c3"] {
            let id = object(&mut fx.store, label, &["coin"], 1);
            fx.store.get_mut(id).unwrap().plurals = vec!["coins".into()];
            coins.push(id);
        }
        assert_eq!(fx.resolve("2 of coins"), Ok(Resolved::Many(coins[..2].to_vec())));
        assert_eq!(fx.resolve("5 of coins"), Ok(Resolved::Many(coins.clone())));
        // zero counts as one, which leaves three equal coins and nobody to ask
        assert_eq!(fx.resolve("0 of coins"), Err(ParseError::InvalidSelection));
    }

    #[test]
    fn everything_skips_scenery_and_locations() {
        let mut fx = Fixture::new("*here >x");
        let cup = object(&mut fx.store, "cup", &["cup"], 1);
        let table = object(&mut fx.store, "table", &["table"], 1);
        fx.store.get_mut(table).unwrap().mass = HEAVY;
        let plate = object(&mut fx.store, "plate", &["plate"], 1);
        object(&mut fx.store, "far", &["far"], NOWHERE);
        assert_eq!(fx.resolve("everything"), Ok(Resolved::Many(vec![cup, plate])));
    }

    #[test]
    fn unknown_phrase_rewinds_and_expects_an_object() {
        let mut fx = Fixture::new("*present >x");
        object(&mut fx.store, "cup", &["cup"], 1);
        assert_eq!(fx.resolve("teapot"), Ok(Resolved::Nothing));
        assert_eq!(fx.ctx.cursor, 0);
        assert!(fx.ctx.object_expected);
        assert_eq!(fx.ctx.object_phrase, "teapot");
    }

    #[test]
    fn pronoun_without_referent_fails() {
        let mut fx = Fixture::new("*held >x");
        object(&mut fx.store, "cup", &["cup"], 2);
        assert_eq!(fx.resolve("it"), Err(ParseError::NoReferent("it".into())));
    }

    #[test]
    fn pronoun_picks_the_stored_referent() {
        let mut fx = Fixture::new("*held >x");
        let cup = object(&mut fx.store, "cup", &["cup"], 2);
        object(&mut fx.store, "lamp", &["lamp"], 2);
        fx.pronouns.it = Some(cup);
        assert_eq!(fx.resolve("it"), Ok(Resolved::One(cup)));
    }

    #[test]
    fn them_returns_every_remembered_object() {
        let mut fx = Fixture::new("*held >x");
        let cup = object(&mut fx.store, "cup", &["cup"], 2);
        let lamp = object(&mut fx.store, "lamp", &["lamp"], 2);
        fx.pronouns.them = vec![lamp, cup];
        assert_eq!(fx.resolve("them"), Ok(Resolved::Many(vec![cup, lamp])));
    }

    #[test]
    fn ambiguous_phrase_prompts_and_accepts_a_number() {
        let mut fx = Fixture::new("*present >x");
        object(&mut fx.store, "red_ball", &["red", "ball"], 1);
        let blue = object(&mut fx.store, "blue_ball", &["blue", "ball"], 1);
        fx.console.queue_input(&["2"]);
        assert_eq!(fx.resolve("ball"), Ok(Resolved::One(blue)));
        let output = fx.console.output();
        assert!(output.contains("By \"ball\", are you referring to:"));
        assert!(output.contains("[1] the red_ball"));
        assert!(output.contains("[2] the blue_ball"));
    }

    #[test]
    fn invalid_reply_fails_or_insists() {
        let mut fx = Fixture::new("*present >x");
        object(&mut fx.store, "red_ball", &["red", "ball"], 1);
        let blue = object(&mut fx.store, "blue_ball", &["blue", "ball"], 1);
        fx.console.queue_input(&["7"]);
        assert_eq!(fx.resolve("ball"), Err(ParseError::InvalidSelection));

        fx.config.insist_on_choice = true;
        fx.console.queue_input(&["nope", "2"]);
        assert_eq!(fx.resolve("ball"), Ok(Resolved::One(blue)));
        assert!(fx.console.output().contains("No such choice."));

        fx.console.queue_input(&["9"]);
        assert_eq!(fx.resolve("ball"), Err(ParseError::InvalidSelection));
    }

    #[test]
    fn absent_objects_never_join_a_plural_result() {
        let mut fx = Fixture::new("*here >x");
        let near = object(&mut fx.store, "near", &["coin"], 1);
        fx.store.get_mut(near).unwrap().plurals = vec!["coins".into()];
        let far = object(&mut fx.store, "far", &["coin"], NOWHERE);
        fx.store.get_mut(far).unwrap().plurals = vec!["coins".into()];
        assert_eq!(fx.resolve("coins"), Ok(Resolved::One(near)));
        assert_eq!(fx.resolve("2 of coins"), Ok(Resolved::One(near)));
    }
}

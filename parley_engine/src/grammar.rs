//! Grammar tree
//!
//! Author rules such as `take **here from *present >take` are merged into a
//! prefix tree. Each level of the tree is a chain of siblings in declaration
//! order; matching a word at one level moves the parser on to that node's
//! children. Nodes live in an arena and refer to each other by [`NodeId`].

use std::str::FromStr;

use log::info;
use thiserror::Error;
use variantly::Variantly;

/// Handle of a node in the grammar arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Named reachability rules a placeholder can demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Held,
    Here,
    Anywhere,
    Inside,
    Present,
    Location,
}

impl FromStr for Scope {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "held" => Ok(Scope::Held),
            "here" => Ok(Scope::Here),
            "anywhere" => Ok(Scope::Anywhere),
            "inside" => Ok(Scope::Inside),
            "present" => Ok(Scope::Present),
            "location" => Ok(Scope::Location),
            other => Err(GrammarError::UnknownScope(other.to_string())),
        }
    }
}

/// A noun placeholder: the scope its objects must satisfy and whether a list is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub scope: Scope,
    pub multiple: bool,
}

/// What a grammar word means.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum NodeKind {
    Literal(String),
    Placeholder(Placeholder),
    Integer,
    Text,
    Action(String),
}

impl NodeKind {
    /// Classify one word of a grammar rule.
    ///
    /// # Errors
    /// - if a placeholder names an unknown scope or an action has no name
    pub fn classify(word: &str) -> Result<Self, GrammarError> {
        if let Some(scope) = word.strip_prefix("**") {
            return Ok(NodeKind::Placeholder(Placeholder {
                scope: scope.parse()?,
                multiple: false,
            }));
        }
        if let Some(scope) = word.strip_prefix('*') {
            return Ok(NodeKind::Placeholder(Placeholder {
                scope: scope.parse()?,
                multiple: true,
            }));
        }
        if let Some(action) = word.strip_prefix('>') {
            if action.is_empty() {
                return Err(GrammarError::EmptyAction);
            }
            return Ok(NodeKind::Action(action.to_string()));
        }
        Ok(match word {
            "$integer" => NodeKind::Integer,
            "$string" => NodeKind::Text,
            literal => NodeKind::Literal(literal.to_lowercase()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GrammarNode {
    pub word: String,
    pub kind: NodeKind,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

/// Problems found while adding rules to the tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("empty grammar rule")]
    EmptyRule,
    #[error("unknown scope '{0}'")]
    UnknownScope(String),
    #[error("action with no name")]
    EmptyAction,
    #[error("grammar rule '{0}' does not end with an action")]
    MissingAction(String),
    #[error("grammar rule '{0}' has an action before its last word")]
    MisplacedAction(String),
    #[error("grammar rule '{0}' has more than two object placeholders")]
    TooManyPlaceholders(String),
}

/// The compiled grammar. Empty until rules are inserted.
#[derive(Debug, Clone, Default)]
pub struct GrammarTree {
    nodes: Vec<GrammarNode>,
}

impl GrammarTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a list of rules.
    ///
    /// # Errors
    /// - on the first malformed rule
    pub fn from_rules<S: AsRef<str>>(rules: &[S]) -> Result<Self, GrammarError> {
        let mut tree = Self::new();
        for rule in rules {
            tree.insert_rule(rule.as_ref())?;
        }
        info!("grammar tree built: {} rules, {} nodes", rules.len(), tree.nodes.len());
        Ok(tree)
    }

    /// First node of the top level, or `None` when no rules exist.
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() { None } else { Some(NodeId(0)) }
    }

    pub fn node(&self, id: NodeId) -> &GrammarNode {
        &self.nodes[id.0]
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate a sibling chain starting at `first`.
    pub fn siblings(&self, first: Option<NodeId>) -> Siblings<'_> {
        Siblings { tree: self, next: first }
    }

    /// Children of `id`, in declaration order.
    pub fn children(&self, id: NodeId) -> Siblings<'_> {
        self.siblings(self.node(id).first_child)
    }

    /// Every action name in the tree.
    pub fn actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self
            .nodes
            .iter()
            .filter_map(|node| node.kind.clone().action())
            .collect();
        actions.sort_unstable();
        actions.dedup();
        actions
    }

    /// Every literal word in the tree (used for completion).
    pub fn literal_words(&self) -> Vec<String> {
        let mut words: Vec<String> = self
            .nodes
            .iter()
            .filter_map(|node| node.kind.clone().literal())
            .collect();
        words.sort_unstable();
        words.dedup();
        words
    }

    /// Merge one rule into the tree, sharing any existing prefix.
    ///
    /// # Errors
    /// - if the rule is empty, lacks a final action, places an action early,
    ///   names an unknown scope or has more than two placeholders
    pub fn insert_rule(&mut self, rule: &str) -> Result<(), GrammarError> {
        let words: Vec<&str> = rule.split_whitespace().collect();
        if words.is_empty() {
            return Err(GrammarError::EmptyRule);
        }
        let kinds = words
            .iter()
            .map(|word| NodeKind::classify(word))
            .collect::<Result<Vec<_>, _>>()?;

        let last = kinds.len() - 1;
        if !kinds[last].is_action() || last == 0 {
            return Err(GrammarError::MissingAction(rule.to_string()));
        }
        if kinds[..last].iter().any(NodeKind::is_action) {
            return Err(GrammarError::MisplacedAction(rule.to_string()));
        }
        if kinds.iter().filter(|kind| kind.is_placeholder()).count() > 2 {
            return Err(GrammarError::TooManyPlaceholders(rule.to_string()));
        }

        let mut parent: Option<NodeId> = None;
        for (word, kind) in words.into_iter().zip(kinds) {
            let first = match parent {
                None => self.root(),
                Some(id) => self.node(id).first_child,
            };
            let existing = self.siblings(first).find(|id| self.node(*id).word == word);
            let id = match existing {
                Some(id) => id,
                None => self.append(parent, first, word, kind),
            };
            parent = Some(id);
        }
        Ok(())
    }

    fn append(&mut self, parent: Option<NodeId>, first: Option<NodeId>, word: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let literal = match &kind {
            NodeKind::Literal(lower) => lower.clone(),
            _ => word.to_string(),
        };
        self.nodes.push(GrammarNode {
            word: literal,
            kind,
            first_child: None,
            next_sibling: None,
        });
        match self.siblings(first).last() {
            Some(tail) => self.nodes[tail.0].next_sibling = Some(id),
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.0].first_child = Some(id);
                }
            },
        }
        id
    }
}

/// Iterator over one sibling chain.
pub struct Siblings<'a> {
    tree: &'a GrammarTree,
    next: Option<NodeId>,
}

impl Iterator for Siblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.node(current).next_sibling;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(tree: &GrammarTree, first: Option<NodeId>) -> Vec<String> {
        tree.siblings(first).map(|id| tree.node(id).word.clone()).collect()
    }

    #[test]
    fn shared_prefixes_are_merged() {
        let tree = GrammarTree::from_rules(&["take **here >take", "take *held from *present >take_from", "look >look"])
            .unwrap();
        assert_eq!(words(&tree, tree.root()), vec!["take", "look"]);
        let take = tree.root().unwrap();
        assert_eq!(words(&tree, tree.node(take).first_child), vec!["**here", "*held"]);
    }

    #[test]
    fn siblings_keep_declaration_order() {
        let tree = GrammarTree::from_rules(&["x *held >a", "x *here >b", "x *anywhere >c"]).unwrap();
        let x = tree.root().unwrap();
        assert_eq!(
            words(&tree, tree.node(x).first_child),
            vec!["*held", "*here", "*anywhere"]
        );
    }

    #[test]
    fn classify_recognises_every_kind() {
        assert_eq!(
            NodeKind::classify("**held"),
            Ok(NodeKind::Placeholder(Placeholder {
                scope: Scope::Held,
                multiple: false
            }))
        );
        assert!(NodeKind::classify("*present").unwrap().is_placeholder());
        assert_eq!(NodeKind::classify("$integer"), Ok(NodeKind::Integer));
        assert_eq!(NodeKind::classify("$string"), Ok(NodeKind::Text));
        assert_eq!(NodeKind::classify(">look"), Ok(NodeKind::Action("look".into())));
        assert_eq!(NodeKind::classify("Take"), Ok(NodeKind::Literal("take".into())));
        assert_eq!(
            NodeKind::classify("*nearby"),
            Err(GrammarError::UnknownScope("nearby".into()))
        );
    }

    #[test]
    fn malformed_rules_are_rejected() {
        let mut tree = GrammarTree::new();
        assert_eq!(tree.insert_rule("   "), Err(GrammarError::EmptyRule));
        assert!(matches!(tree.insert_rule("take *here"), Err(GrammarError::MissingAction(_))));
        assert!(matches!(tree.insert_rule(">take"), Err(GrammarError::MissingAction(_))));
        assert!(matches!(tree.insert_rule("take >take *here >x"), Err(GrammarError::MisplacedAction(_))));
        assert!(matches!(
            tree.insert_rule("put *held in *here with *held >put"),
            Err(GrammarError::TooManyPlaceholders(_))
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn literal_words_are_deduplicated() {
        let tree = GrammarTree::from_rules(&["take *here >take", "take off *held >remove", "drop *held >drop"]).unwrap();
        assert_eq!(tree.literal_words(), vec!["drop", "off", "take"]);
    }

    #[test]
    fn actions_are_listed_once() {
        let tree = GrammarTree::from_rules(&["take *here >take", "get *here >take", "l >look"]).unwrap();
        assert_eq!(tree.actions(), vec!["look", "take"]);
    }
}

//! WorldDef loader and conversion helpers.
//!
//! Converts the serialized `WorldDef` into the object store and grammar tree.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use parley_data::{ObjectDef, WorldDef};

use crate::grammar::GrammarTree;
use crate::object::{Attribute, AttributeSet, GameObject, NOWHERE};
use crate::store::ObjectStore;

/// Load a `WorldDef` from a RON file.
pub fn load_worlddef(path: &Path) -> Result<WorldDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading worlddef from '{}'", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing worlddef RON from '{}'", path.display()))
}

/// Build the object store. Ids follow declaration order, starting at 1.
pub fn build_store(def: &WorldDef) -> Result<ObjectStore> {
    let mut store = ObjectStore::new();
    store.set_user_attributes(def.user_attributes.clone());

    for object_def in &def.objects {
        let object = object_from_def(object_def, &store)?;
        store.add(object);
    }

    // parents may be declared after their children
    for object_def in &def.objects {
        let Some(parent_label) = &object_def.parent else {
            continue;
        };
        let id = store
            .by_label(&object_def.label)
            .ok_or_else(|| anyhow!("object '{}' vanished while loading", object_def.label))?;
        let parent = store
            .by_label(parent_label)
            .ok_or_else(|| anyhow!("parent '{parent_label}' of '{}' not found", object_def.label))?;
        store.move_to(id, parent)?;
    }

    let player = store
        .by_label(&def.game.player)
        .ok_or_else(|| anyhow!("player object '{}' not found", def.game.player))?;
    store.set_player(player)?;
    Ok(store)
}

fn object_from_def(def: &ObjectDef, store: &ObjectStore) -> Result<GameObject> {
    let attributes = def
        .attributes
        .iter()
        .map(|name| name.parse::<Attribute>())
        .collect::<Result<AttributeSet, _>>()
        .with_context(|| format!("attributes of object '{}'", def.label))?;

    let mut user_attributes = AttributeSet::empty();
    for name in &def.user_attributes {
        let index = store
            .user_attribute_index(name)
            .ok_or_else(|| anyhow!("object '{}' uses undeclared user attribute '{name}'", def.label))?;
        user_attributes.set_index(index, true)?;
    }

    Ok(GameObject {
        id: 0,
        label: def.label.clone(),
        display: def.display.clone(),
        names: def.names.iter().map(|n| n.to_lowercase()).collect(),
        plurals: def.plurals.iter().map(|n| n.to_lowercase()).collect(),
        attributes,
        user_attributes,
        parent: NOWHERE,
        mass: def.mass,
    })
}

/// Compile the grammar rules, in declaration order.
pub fn build_grammar(def: &WorldDef) -> Result<GrammarTree> {
    let mut grammar = GrammarTree::new();
    for rule in &def.grammar {
        grammar
            .insert_rule(rule)
            .with_context(|| format!("grammar rule '{rule}'"))?;
    }
    Ok(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_data::GameDef;

    fn object(label: &str, parent: Option<&str>, attributes: &[&str]) -> ObjectDef {
        ObjectDef {
            label: label.into(),
            display: format!("the {label}"),
            names: vec![label.to_uppercase()],
            attributes: attributes.iter().map(|a| (*a).to_string()).collect(),
            parent: parent.map(Into::into),
            ..ObjectDef::default()
        }
    }

    fn world(objects: Vec<ObjectDef>) -> WorldDef {
        WorldDef {
            game: GameDef {
                title: "Test".into(),
                player: "player".into(),
                ..GameDef::default()
            },
            objects,
            ..WorldDef::default()
        }
    }

    #[test]
    fn parents_resolve_regardless_of_declaration_order() {
        let def = world(vec![
            object("cup", Some("kitchen"), &[]),
            object("player", Some("kitchen"), &["animate"]),
            object("kitchen", None, &["location"]),
        ]);
        let store = build_store(&def).unwrap();
        assert_eq!(store.by_label("cup"), Some(1));
        assert_eq!(store.parent(1), 3);
        assert_eq!(store.here(), 3);
        assert!(store.get(3).unwrap().is_location());
        assert_eq!(store.get(1).unwrap().names, vec!["cup".to_string()]);
    }

    #[test]
    fn unknown_attribute_names_the_object() {
        let def = world(vec![object("player", None, &["sparkly"])]);
        let err = build_store(&def).unwrap_err();
        assert!(format!("{err:#}").contains("player"));
    }

    #[test]
    fn user_attributes_map_to_declaration_order() {
        let mut player = object("player", None, &[]);
        player.user_attributes = vec!["tired".into()];
        let mut def = world(vec![player]);
        def.user_attributes = vec!["hungry".into(), "tired".into()];
        let store = build_store(&def).unwrap();
        let player = store.get(1).unwrap();
        assert!(player.user_attributes.has_index(1));
        assert!(!player.user_attributes.has_index(0));
    }

    #[test]
    fn bad_grammar_rule_is_quoted_in_the_error() {
        let mut def = world(vec![object("player", None, &[])]);
        def.grammar = vec!["look >look".into(), "take *nearby >take".into()];
        let err = build_grammar(&def).unwrap_err();
        assert!(format!("{err:#}").contains("take *nearby >take"));
    }
}

use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Number of user attributes an object store can track.
pub const MAX_USER_ATTRIBUTES: usize = 32;

/// Validation error for malformed or missing references in a WorldDef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateLabel { kind: &'static str, label: String },
    MissingReference { kind: &'static str, label: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateLabel { kind, label } => {
                write!(f, "duplicate {kind} label '{label}'")
            },
            ValidationError::MissingReference { kind, label, context } => {
                write!(f, "missing {kind} '{label}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate cross-references and basic invariants in a WorldDef.
///
/// ```
/// use parley_data::{GameDef, ObjectDef, WorldDef, validate_world};
///
/// let world = WorldDef {
///     game: GameDef {
///         title: "Demo".into(),
///         player: "player".into(),
///         ..GameDef::default()
///     },
///     objects: vec![
///         ObjectDef {
///             label: "kitchen".into(),
///             display: "the kitchen".into(),
///             names: vec!["kitchen".into()],
///             attributes: vec!["location".into()],
///             ..ObjectDef::default()
///         },
///         ObjectDef {
///             label: "player".into(),
///             display: "yourself".into(),
///             names: vec!["me".into(), "myself".into()],
///             parent: Some("kitchen".into()),
///             ..ObjectDef::default()
///         },
///     ],
///     grammar: vec!["look >look".into()],
///     ..WorldDef::default()
/// };
/// assert!(validate_world(&world).is_empty());
/// ```
pub fn validate_world(world: &WorldDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut labels = HashSet::new();
    for object in &world.objects {
        if object.label.trim().is_empty() {
            errors.push(ValidationError::InvalidValue {
                context: format!("object '{}' has an empty label", object.display),
            });
        } else if !labels.insert(object.label.as_str()) {
            errors.push(ValidationError::DuplicateLabel {
                kind: "object",
                label: object.label.clone(),
            });
        }
    }

    let mut user_attributes = HashSet::new();
    for attribute in &world.user_attributes {
        if !user_attributes.insert(attribute.as_str()) {
            errors.push(ValidationError::DuplicateLabel {
                kind: "user attribute",
                label: attribute.clone(),
            });
        }
    }
    if world.user_attributes.len() > MAX_USER_ATTRIBUTES {
        errors.push(ValidationError::InvalidValue {
            context: format!(
                "{} user attributes declared, at most {MAX_USER_ATTRIBUTES} are supported",
                world.user_attributes.len()
            ),
        });
    }

    if world.game.player.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: "game player label missing".to_string(),
        });
    } else {
        check_ref("object", &world.game.player, &labels, "game player", &mut errors);
    }

    for object in &world.objects {
        if let Some(parent) = &object.parent {
            if parent == &object.label {
                errors.push(ValidationError::InvalidValue {
                    context: format!("object '{}' is its own parent", object.label),
                });
            } else {
                check_ref(
                    "object",
                    parent,
                    &labels,
                    &format!("parent of '{}'", object.label),
                    &mut errors,
                );
            }
        }
        if object.names.is_empty() && object.plurals.is_empty() {
            errors.push(ValidationError::InvalidValue {
                context: format!("object '{}' has no names", object.label),
            });
        }
        for attribute in &object.user_attributes {
            check_ref(
                "user attribute",
                attribute,
                &user_attributes,
                &format!("attributes of '{}'", object.label),
                &mut errors,
            );
        }
    }

    for (index, rule) in world.grammar.iter().enumerate() {
        validate_rule(index, rule, &mut errors);
    }

    for handler in &world.handlers {
        validate_hook(&handler.hook, &labels, &mut errors);
        for action in &handler.actions {
            validate_action(action, &labels, &user_attributes, &mut errors);
        }
    }

    errors
}

fn validate_rule(index: usize, rule: &str, errors: &mut Vec<ValidationError>) {
    let words: Vec<&str> = rule.split_whitespace().collect();
    let Some(last) = words.last() else {
        errors.push(ValidationError::InvalidValue {
            context: format!("grammar rule {index} is empty"),
        });
        return;
    };
    if !last.starts_with('>') || last.len() < 2 {
        errors.push(ValidationError::InvalidValue {
            context: format!("grammar rule '{rule}' does not end with an action"),
        });
    }
    if words[..words.len() - 1].iter().any(|word| word.starts_with('>')) {
        errors.push(ValidationError::InvalidValue {
            context: format!("grammar rule '{rule}' has an action before its end"),
        });
    }
    if words.first().is_some_and(|word| word.starts_with('>')) {
        errors.push(ValidationError::InvalidValue {
            context: format!("grammar rule '{rule}' has no words before its action"),
        });
    }
}

fn validate_hook(hook: &HookDef, labels: &HashSet<&str>, errors: &mut Vec<ValidationError>) {
    if let HookDef::LocalAfter {
        verb,
        target: Some(TargetDef::Location(_)),
    } = hook
    {
        errors.push(ValidationError::InvalidValue {
            context: format!("local after handler for '{verb}' cannot target a location"),
        });
    }
    let target = match hook {
        HookDef::Specific { target, .. } | HookDef::Override { target, .. } => Some(target),
        HookDef::LocalAfter { target, .. } => target.as_ref(),
        _ => None,
    };
    let Some(target) = target else {
        return;
    };
    match target {
        TargetDef::Location(label) | TargetDef::Object(label) => {
            check_ref("object", label, labels, "handler target", errors);
        },
        TargetDef::Pair { noun1, noun2 } => {
            check_ref("object", noun1, labels, "handler target noun1", errors);
            check_ref("object", noun2, labels, "handler target noun2", errors);
        },
    }
}

fn validate_action(
    action: &ActionDef,
    labels: &HashSet<&str>,
    user_attributes: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    match action {
        ActionDef::MoveObject { object, to } => {
            check_object_ref(object, labels, errors);
            check_object_ref(to, labels, errors);
        },
        ActionDef::SetAttribute { object, attribute } | ActionDef::ClearAttribute { object, attribute } => {
            check_object_ref(object, labels, errors);
            if attribute.trim().is_empty() {
                errors.push(ValidationError::InvalidValue {
                    context: "handler action names an empty attribute".to_string(),
                });
            }
            // system attributes are checked by the engine, user attributes here
            if let Some(user) = attribute.strip_prefix("user:") {
                check_ref("user attribute", user, user_attributes, "handler action", errors);
            }
        },
        ActionDef::Parse { sentence } if sentence.trim().is_empty() => {
            errors.push(ValidationError::InvalidValue {
                context: "handler parses an empty sentence".to_string(),
            });
        },
        _ => {},
    }
}

fn check_object_ref(reference: &ObjectRefDef, labels: &HashSet<&str>, errors: &mut Vec<ValidationError>) {
    if let ObjectRefDef::Label(label) = reference {
        check_ref("object", label, labels, "handler action", errors);
    }
}

fn check_ref(kind: &'static str, label: &str, known: &HashSet<&str>, context: &str, errors: &mut Vec<ValidationError>) {
    if !known.contains(label) {
        errors.push(ValidationError::MissingReference {
            kind,
            label: label.to_string(),
            context: context.to_string(),
        });
    }
}

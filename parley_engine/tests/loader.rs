use std::fs;
use std::path::Path;

use parley_engine::config::ParserConfig;
use parley_engine::{BufferConsole, load_game_from};

const SMALL_WORLD: &str = r#"(
    game: (title: "Hall", player: "player"),
    objects: [
        (label: "hall", display: "the hall", names: ["hall"], attributes: ["location"]),
        (label: "player", display: "yourself", names: ["me"], parent: Some("hall"), mass: 99),
        (label: "lamp", display: "the lamp", names: ["lamp"], parent: Some("hall")),
    ],
    grammar: ["take *present >take"],
    handlers: [
        (hook: library(verb: "take"), actions: [moveObject(object: noun1, to: player), say(text: "Got {noun1}.")]),
    ],
)"#;

fn write_world(dir: &Path, text: &str) {
    fs::write(dir.join("world.ron"), text).unwrap();
}

#[test]
fn loads_a_world_without_parser_config() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), SMALL_WORLD);
    let console = BufferConsole::new();
    let mut game = load_game_from(dir.path(), Box::new(console.clone())).unwrap();

    assert_eq!(game.session.config, ParserConfig::default());
    assert_eq!(game.session.store.len(), 3);
    assert_eq!(game.script.len(), 1);

    game.session.process_line("take lamp", &mut game.script).unwrap();
    assert_eq!(console.output(), "Got the lamp.\n");
}

#[test]
fn parser_config_is_read_next_to_the_world() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), SMALL_WORLD);
    fs::write(dir.path().join("parser.toml"), "max_choices = 3\n[keywords]\nthen = [\"next\"]\n").unwrap();
    let game = load_game_from(dir.path(), Box::new(BufferConsole::new())).unwrap();
    assert_eq!(game.session.config.max_choices, 3);
    assert_eq!(game.session.config.keywords.then, vec!["next".to_string()]);
}

#[test]
fn every_validation_problem_is_reported_at_once() {
    let dir = tempfile::tempdir().unwrap();
    let broken = SMALL_WORLD
        .replace(r#"player: "player")"#, r#"player: "hero")"#)
        .replace(r#"parent: Some("hall"))"#, r#"parent: Some("attic"))"#);
    write_world(dir.path(), &broken);
    let err = load_game_from(dir.path(), Box::new(BufferConsole::new()))
        .err()
        .unwrap();
    let text = format!("{err:#}");
    assert!(text.contains("worlddef validation failed"), "{text}");
    assert!(text.contains("missing object 'hero'"), "{text}");
    assert!(text.contains("missing object 'attic'"), "{text}");
}

#[test]
fn malformed_ron_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), "(game: (title: \"Hall\"");
    let err = load_game_from(dir.path(), Box::new(BufferConsole::new()))
        .err()
        .unwrap();
    let text = format!("{err:#}");
    assert!(text.contains("parsing worlddef RON"), "{text}");
    assert!(text.contains("world.ron"), "{text}");
}

#[test]
fn missing_world_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_game_from(dir.path(), Box::new(BufferConsole::new()))
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("reading worlddef"));
}

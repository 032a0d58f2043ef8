use std::cell::RefCell;
use std::rc::Rc;

use editor::scene_index::scan;
use editor::{Decision, DocumentHost, Editor, Key, KeyOutcome, MemoryHost, Origin, SceneEntry};
use screenplay::block::BlockType;
use screenplay::document::Document;
use screenplay::parser::Parser;
use screenplay::transcript::{CharacterMap, SceneDetails, classify};

fn editor(listing: &str) -> Editor<MemoryHost> {
    let listing = Parser::new(listing.to_string(), 0)
        .parse()
        .expect("listing parse failed");
    Editor::new(MemoryHost::from_listing(listing).expect("selection out of range"))
}

fn listing(editor: &Editor<MemoryHost>) -> String {
    editor.host().to_listing()
}

fn press(source: &str, key: Key) -> String {
    let mut editor = editor(source);
    editor.press(key);
    listing(&editor)
}

#[test]
fn enter_at_end_inserts_one_successor() {
    let cases = [
        ("scene-heading: INT. CAFE - DAY|", "scene-heading: INT. CAFE - DAY\naction: |\n"),
        ("character: MIA|", "character: MIA\ndialogue: |\n"),
        ("dialogue: Coffee?|", "dialogue: Coffee?\ncharacter: |\n"),
        ("parenthetical: (quietly)|", "parenthetical: (quietly)\ndialogue: |\n"),
        ("transition: CUT TO:|", "transition: CUT TO:\nscene-heading: |\n"),
    ];
    for (source, expected) in cases {
        assert_eq!(press(source, Key::Enter), expected, "{source}");
    }
}

#[test]
fn successor_lands_right_after_the_current_block() {
    let out = press("action: Rain.\ncharacter: MIA|\naction: Later.", Key::Enter);
    assert_eq!(out, "action: Rain.\ncharacter: MIA\ndialogue: |\naction: Later.\n");
}

#[test]
fn empty_dialogue_collapses_to_action_in_place() {
    let mut editor = editor("character: MIA\ndialogue: |\naction: Rain.");
    let outcome = editor.press(Key::Enter);
    assert_eq!(outcome, KeyOutcome::Handled(Decision::ChangeType(BlockType::Action)));
    assert_eq!(listing(&editor), "character: MIA\naction: |\naction: Rain.\n");
    assert_eq!(editor.host().document().len(), 3);
}

#[test]
fn tab_on_action_converts_anywhere_and_keeps_text() {
    for source in ["action: |She runs.", "action: She |runs.", "action: She runs.|"] {
        let mut editor = editor(source);
        assert_eq!(
            editor.press(Key::Tab),
            KeyOutcome::Handled(Decision::ChangeType(BlockType::Character))
        );
        let block = &editor.host().document().blocks[0];
        assert_eq!(block.kind, BlockType::Character);
        assert_eq!(block.text(), "She runs.");
    }
}

#[test]
fn tab_elsewhere_is_a_no_op() {
    assert_eq!(press("dialogue: Hi|", Key::Tab), "dialogue: Hi|\n");
    assert_eq!(press("scene-heading: EXT. PIER|", Key::Tab), "scene-heading: EXT. PIER|\n");
}

#[test]
fn enter_mid_dialogue_splits_at_the_cursor() {
    let mut editor = editor("dialogue: Hello| world");
    assert_eq!(editor.press(Key::Enter), KeyOutcome::Deferred);
    let blocks = &editor.host().document().blocks;
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|b| b.kind == BlockType::Dialogue));
    assert_eq!(blocks[0].text(), "Hello");
    assert_eq!(blocks[1].text(), " world");
}

#[test]
fn ranged_selection_defers_to_default_enter() {
    let mut editor = editor("character: M|IA|");
    assert_eq!(editor.press(Key::Enter), KeyOutcome::Deferred);
    assert_eq!(listing(&editor), "character: M\naction: |\n");
}

#[test]
fn typing_a_scene_prefix_keeps_the_text() {
    let mut editor = editor("action: |");
    let changes = editor.type_text("INT. ");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].to, BlockType::SceneHeading);
    let block = &editor.host().document().blocks[0];
    assert_eq!(block.kind, BlockType::SceneHeading);
    assert_eq!(block.text(), "INT. ");

    editor.type_text("KITCHEN - NIGHT");
    assert_eq!(listing(&editor), "scene-heading: INT. KITCHEN - NIGHT|\n");
}

#[test]
fn prefix_not_at_block_start_does_nothing() {
    let mut editor = editor("action: |");
    assert!(editor.type_text("See INT. here").is_empty());
    assert_eq!(listing(&editor), "action: See INT. here|\n");
}

#[test]
fn reclassification_is_one_undo_step_with_its_keystroke() {
    let mut editor = editor("action: INT.|");
    editor.type_char(' ');
    assert!(editor.host_mut().undo());
    assert_eq!(listing(&editor), "action: INT.|\n");
}

#[test]
fn smart_enter_undoes_in_one_step() {
    let mut editor = editor("character: MIA|");
    editor.press(Key::Enter);
    assert!(editor.host_mut().undo());
    assert_eq!(listing(&editor), "character: MIA|\n");
    assert!(!editor.host().can_undo());
}

#[test]
fn rule_edits_are_silent_and_typing_is_not() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut editor = editor("character: MIA|");
    let sink = Rc::clone(&seen);
    editor.host_mut().on_document_changed(Box::new(move |event| {
        sink.borrow_mut().push(event.meta);
    }));

    editor.press(Key::Enter);
    editor.type_text("Hi");
    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].origin, Origin::Rule(Key::Enter));
    assert!(seen[0].silent);
    assert!(seen[1..].iter().all(|meta| meta.origin == Origin::Typing && !meta.silent));
}

#[test]
fn scene_index_follows_every_change() {
    let mut editor = editor("action: |");
    assert!(editor.scene_index().is_empty());

    editor.type_text("EXT. PIER - DAY\nGulls.");
    assert_eq!(
        editor.scene_index(),
        vec![SceneEntry {
            label: "EXT. PIER - DAY".to_string(),
            position: 0,
        }]
    );
    assert_eq!(editor.scene_index(), editor.scene_index());

    while editor.host_mut().undo() {}
    assert_eq!(listing(&editor), "action: |\n");
    assert!(editor.scene_index().is_empty());
}

#[test]
fn scene_positions_shift_with_edits_above() {
    let mut editor = editor("action: |\nscene-heading: INT. HALL");
    assert_eq!(editor.scene_index()[0].position, 2);
    editor.type_text("Dark.");
    assert_eq!(editor.scene_index()[0].position, 7);
}

#[test]
fn destroyed_host_ignores_keys_and_typing() {
    let mut editor = editor("character: MIA|");
    editor.host_mut().destroy();
    assert_eq!(editor.press(Key::Enter), KeyOutcome::Ignored);
    assert_eq!(editor.type_char('x'), None);
    assert_eq!(editor.host().document().len(), 1);
    assert_eq!(editor.host().document().blocks[0].text(), "MIA");
}

fn details(location: &str) -> SceneDetails {
    SceneDetails::new("INT.", location, "DAY")
}

#[test]
fn classify_round_trips_through_the_scene_index() {
    let blocks = classify("JOHN: Hi.\nHe leaves.", &details("office"), &CharacterMap::new());
    let document = Document::new(blocks);
    let scenes: Vec<_> = scan(&document).collect();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].label, "INT. OFFICE - DAY");
}

#[test]
fn classified_transcript_opens_in_the_editor() {
    let blocks = classify("JOHN: Hello world.", &details("ROOM"), &CharacterMap::new());
    let mut editor = Editor::new(MemoryHost::new(blocks.into()));
    assert_eq!(
        listing(&editor),
        "scene-heading: |INT. ROOM - DAY\ncharacter: JOHN\ndialogue: Hello world.\n"
    );
    editor.host_mut().set_cursor(2, 12).unwrap();
    editor.press(Key::Enter);
    assert_eq!(editor.host().document().blocks[3].kind, BlockType::Character);
}

use super::*;

// ============================================
// SHORTCUT PARSING
// ============================================

#[test]
fn test_parse_simple_shortcut() {
    let s = Shortcut::parse("cmd+1").unwrap();
    assert_eq!(s.key, "1");
    assert_eq!(s.modifiers, Modifiers::cmd());
}

#[test]
fn test_parse_aliases_and_spaces() {
    let s = Shortcut::parse("Command Shift ArrowUp").unwrap();
    assert_eq!(s.key, "up");
    assert!(s.modifiers.cmd && s.modifiers.shift);
    assert_eq!(s.to_canonical_string(), "cmd+shift+up");
}

#[test]
fn test_parse_errors() {
    assert_eq!(Shortcut::parse("   "), Err(ShortcutParseError::Empty));
    assert_eq!(Shortcut::parse("cmd+shift"), Err(ShortcutParseError::MissingKey));
    assert_eq!(
        Shortcut::parse("cmd+a+b"),
        Err(ShortcutParseError::UnknownToken("b".to_string()))
    );
    assert_eq!(
        Shortcut::parse("cmd+hyperspace"),
        Err(ShortcutParseError::UnknownKey("hyperspace".to_string()))
    );
}

#[test]
fn test_parse_bare_plus_key() {
    let s = Shortcut::parse("+").unwrap();
    assert_eq!(s.key, "+");
    assert!(s.modifiers.none());
}

#[test]
fn test_modifiers_parse() {
    let m = Modifiers::parse("ctrl+alt").unwrap();
    assert!(m.ctrl && m.alt && !m.cmd && !m.shift);
    assert_eq!(Modifiers::parse(""), Err(ShortcutParseError::Empty));
    assert!(Modifiers::parse("cmd+k").is_err());
}

#[test]
fn test_canonicalize_host_key_codes() {
    assert_eq!(canonicalize_key("Digit3"), "3");
    assert_eq!(canonicalize_key("KeyA"), "a");
    assert_eq!(canonicalize_key("Return"), "enter");
    assert_eq!(canonicalize_key("Esc"), "escape");
    assert_eq!(canonicalize_key("keyboard"), "keyboard");
}

#[test]
fn test_display_per_platform() {
    let s = Shortcut::new("1", Modifiers::cmd());
    assert_eq!(s.display_for_platform(Platform::MacOS), "⌘1");
    assert_eq!(s.display_for_platform(Platform::Linux), "Super+1");

    let s = Shortcut::new("enter", Modifiers::shift());
    assert_eq!(s.display_for_platform(Platform::MacOS), "⇧↵");
    assert_eq!(s.display_for_platform(Platform::Windows), "Shift+Enter");
}

// ============================================
// KEY EVENTS
// ============================================

#[test]
fn test_key_event_chord_is_canonical() {
    let event = KeyEvent::new("ArrowDown", Modifiers::default());
    assert_eq!(event.chord(), Shortcut::new("down", Modifiers::default()));
}

#[test]
fn test_key_event_text() {
    assert_eq!(KeyEvent::plain("a").text(), Some("a"));
    assert_eq!(KeyEvent::new("A", Modifiers::shift()).text(), Some("A"));
    assert_eq!(KeyEvent::plain("space").text(), Some(" "));
    assert_eq!(KeyEvent::plain("enter").text(), None);
    assert_eq!(KeyEvent::new("a", Modifiers::cmd()).text(), None);
}

#[test]
fn test_named_punctuation_types_its_glyph() {
    assert_eq!(KeyEvent::plain("slash").text(), Some("/"));
    assert_eq!(KeyEvent::plain("Period").text(), Some("."));
    assert_eq!(KeyEvent::plain("minus").text(), Some("-"));
    assert_eq!(KeyEvent::plain("pageup").text(), None);

    let parsed = Shortcut::parse("/").unwrap();
    assert_eq!(parsed.key, "slash");
    assert_eq!(KeyEvent::new(parsed.key, parsed.modifiers).text(), Some("/"));
}

// ============================================
// DISPATCH TABLE
// ============================================

#[test]
fn test_default_table_bindings() {
    let table = DispatchTable::build(&DispatchConfig::default());
    let at = |key: &str, m: Modifiers| table.resolve(&KeyEvent::new(key, m), 10);

    assert_eq!(at("Return", Modifiers::default()), Some(Action::Confirm));
    assert_eq!(at("Escape", Modifiers::default()), Some(Action::Cancel));
    assert_eq!(at("ArrowUp", Modifiers::default()), Some(Action::MoveSelection(-1)));
    assert_eq!(at("n", Modifiers::ctrl()), Some(Action::MoveSelection(1)));
    assert_eq!(at("PageDown", Modifiers::default()), Some(Action::MoveSelection(10)));
    assert_eq!(at("1", Modifiers::cmd()), Some(Action::SelectRow(0)));
    assert_eq!(at("9", Modifiers::cmd()), Some(Action::SelectRow(8)));
    assert_eq!(at("0", Modifiers::cmd()), Some(Action::SelectRow(9)));
    assert_eq!(table.row_shortcut_count(), 10);
}

#[test]
fn test_oversized_page_keeps_direction() {
    let config = DispatchConfig {
        page_size: usize::MAX,
        ..DispatchConfig::default()
    };
    let table = DispatchTable::build(&config);
    assert_eq!(
        table.resolve(&KeyEvent::plain("pagedown"), 10),
        Some(Action::MoveSelection(isize::MAX))
    );
    assert_eq!(
        table.resolve(&KeyEvent::plain("pageup"), 10),
        Some(Action::MoveSelection(-isize::MAX))
    );
}

#[test]
fn test_plain_characters_pass_through() {
    let table = DispatchTable::build(&DispatchConfig::default());
    assert_eq!(table.resolve(&KeyEvent::plain("a"), 10), None);
    assert_eq!(table.resolve(&KeyEvent::plain("1"), 10), None);
    assert_eq!(table.resolve(&KeyEvent::new("1", Modifiers::ctrl()), 10), None);
}

#[test]
fn test_select_row_disabled_beyond_visible_rows() {
    let table = DispatchTable::build(&DispatchConfig::default());
    let cmd = |k: &str| KeyEvent::new(k, Modifiers::cmd());
    assert_eq!(table.resolve(&cmd("3"), 3), Some(Action::SelectRow(2)));
    assert_eq!(table.resolve(&cmd("4"), 3), None);
    assert_eq!(table.resolve(&cmd("0"), 9), None);
    assert_eq!(table.resolve(&cmd("1"), 0), None);
}

#[test]
fn test_hidden_shortcuts_have_no_row_bindings() {
    let table = DispatchTable::build(&DispatchConfig {
        shortcuts_visible: false,
        ..DispatchConfig::default()
    });
    assert_eq!(table.row_shortcut_count(), 0);
    assert_eq!(table.resolve(&KeyEvent::new("1", Modifiers::cmd()), 10), None);
    assert_eq!(
        table.resolve(&KeyEvent::plain("enter"), 0),
        Some(Action::Confirm)
    );
}

#[test]
fn test_custom_modifier_and_slots() {
    let table = DispatchTable::build(&DispatchConfig {
        shortcut_modifiers: Modifiers::parse("alt").unwrap(),
        shortcut_slots: 3,
        ..DispatchConfig::default()
    });
    assert_eq!(table.row_shortcut_count(), 3);
    assert_eq!(
        table.resolve(&KeyEvent::new("2", Modifiers::parse("alt").unwrap()), 10),
        Some(Action::SelectRow(1))
    );
    assert_eq!(table.resolve(&KeyEvent::new("4", Modifiers::parse("alt").unwrap()), 10), None);
    assert_eq!(
        table.row_shortcut(2).map(|s| s.to_canonical_string()),
        Some("alt+3".to_string())
    );
}

//! Key chords, raw key events and shortcut labels.
//!
//! - `Shortcut` - a canonical (modifier-set, key) pair, used as the dispatch key
//! - `Modifiers` - modifier key flags (cmd, ctrl, alt, shift)
//! - `KeyEvent` - a raw key-down event as delivered by the host
//! - Platform-aware display (⌘1 on macOS, Super+1 on Windows/Linux)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing a shortcut string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("shortcut has no key, only modifiers")]
    MissingKey,
    #[error("unknown token '{0}' in shortcut")]
    UnknownToken(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Held modifier keys. `cmd` is Command on macOS and Super elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub cmd: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub fn cmd() -> Self {
        Self {
            cmd: true,
            ..Default::default()
        }
    }
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }
    pub fn any(&self) -> bool {
        self.cmd || self.ctrl || self.alt || self.shift
    }
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Parse a modifier-only string such as `"cmd"` or `"ctrl+alt"`.
    pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
        let normalized = s.trim().replace('+', " ");
        let mut modifiers = Self::default();
        let mut seen = false;
        for part in normalized.split_whitespace() {
            if !modifiers.apply_token(&part.to_lowercase()) {
                return Err(ShortcutParseError::UnknownToken(part.to_string()));
            }
            seen = true;
        }
        if seen {
            Ok(modifiers)
        } else {
            Err(ShortcutParseError::Empty)
        }
    }

    /// Set the flag named by `token`; false if it isn't a modifier.
    fn apply_token(&mut self, token: &str) -> bool {
        match token {
            "cmd" | "command" | "meta" | "super" | "win" | "⌘" | "mod" => self.cmd = true,
            "ctrl" | "control" | "ctl" | "^" | "⌃" => self.ctrl = true,
            "alt" | "opt" | "option" | "⌥" => self.alt = true,
            "shift" | "shft" | "⇧" => self.shift = true,
            _ => return false,
        }
        true
    }

    fn canonical_parts(&self) -> Vec<&'static str> {
        let mut parts = Vec::with_capacity(4);
        if self.alt {
            parts.push("alt");
        }
        if self.cmd {
            parts.push("cmd");
        }
        if self.ctrl {
            parts.push("ctrl");
        }
        if self.shift {
            parts.push("shift");
        }
        parts
    }
}

/// Platform enum for display formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Platform::Linux
        }
    }
}

/// A raw key-down event from the host.
///
/// `key` is whatever name the host uses (`"ArrowUp"`, `"Return"`, `"a"`);
/// it is canonicalized when the event is turned into a [`Shortcut`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::default())
    }

    /// Normalize into the canonical chord used for dispatch lookups.
    pub fn chord(&self) -> Shortcut {
        Shortcut::new(self.key.as_str(), self.modifiers)
    }

    /// Printable text this event would insert, if any (no cmd/ctrl held).
    pub fn text(&self) -> Option<&str> {
        if self.modifiers.cmd || self.modifiers.ctrl {
            return None;
        }
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Some(self.key.as_str()),
            // Named punctuation ("slash", "period") types its glyph
            _ => named_key(&canonicalize_key(&self.key))
                .map(|n| if n.0 == "space" { " " } else { n.2 })
                .filter(|text| text.chars().count() == 1),
        }
    }
}

/// A canonical chord: modifier set plus canonical key name. This is the
/// lookup key of the dispatch table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: String,
    pub modifiers: Modifiers,
}

/// Named keys: (canonical name, macOS glyph, text label).
const NAMED_KEYS: &[(&str, &str, &str)] = &[
    ("enter", "↵", "Enter"),
    ("escape", "⎋", "Esc"),
    ("tab", "⇥", "Tab"),
    ("space", "␣", "Space"),
    ("backspace", "⌫", "Backspace"),
    ("delete", "⌦", "Delete"),
    ("up", "↑", "Up"),
    ("down", "↓", "Down"),
    ("left", "←", "Left"),
    ("right", "→", "Right"),
    ("home", "↖", "Home"),
    ("end", "↘", "End"),
    ("pageup", "⇞", "PageUp"),
    ("pagedown", "⇟", "PageDown"),
    ("slash", "/", "/"),
    ("backslash", "\\", "\\"),
    ("semicolon", ";", ";"),
    ("quote", "'", "'"),
    ("comma", ",", ","),
    ("period", ".", "."),
    ("bracketleft", "[", "["),
    ("bracketright", "]", "]"),
    ("minus", "-", "-"),
    ("equal", "=", "="),
    ("backquote", "`", "`"),
    ("+", "+", "+"),
];

/// Host spellings mapped to canonical names. Input is lowercased first.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("arrowup", "up"),
    ("uparrow", "up"),
    ("arrowdown", "down"),
    ("downarrow", "down"),
    ("arrowleft", "left"),
    ("leftarrow", "left"),
    ("arrowright", "right"),
    ("rightarrow", "right"),
    ("return", "enter"),
    ("numpadenter", "enter"),
    ("esc", "escape"),
    ("back", "backspace"),
    ("del", "delete"),
    (" ", "space"),
    ("pgup", "pageup"),
    ("pgdn", "pagedown"),
    ("pgdown", "pagedown"),
    ("/", "slash"),
    ("\\", "backslash"),
    (";", "semicolon"),
    ("'", "quote"),
    (",", "comma"),
    (".", "period"),
    ("[", "bracketleft"),
    ("]", "bracketright"),
    ("-", "minus"),
    ("=", "equal"),
    ("`", "backquote"),
];

/// Modifier order for labels: (flag, macOS glyph, text label).
fn label_modifiers(m: &Modifiers) -> [(bool, char, &'static str); 4] {
    [
        (m.ctrl, '⌃', "Ctrl"),
        (m.alt, '⌥', "Alt"),
        (m.shift, '⇧', "Shift"),
        (m.cmd, '⌘', "Super"),
    ]
}

fn named_key(key: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    NAMED_KEYS.iter().find(|(name, _, _)| *name == key)
}

impl Shortcut {
    pub fn new(key: impl AsRef<str>, modifiers: Modifiers) -> Self {
        Self {
            key: canonicalize_key(key.as_ref()),
            modifiers,
        }
    }

    /// Parse `"cmd+shift+k"`, `"ctrl n"`, `"enter"`. Modifiers may appear in
    /// any order; exactly one non-modifier token is the key.
    pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutParseError::Empty);
        }
        if s == "+" {
            return Ok(Self::new("+", Modifiers::default()));
        }

        let mut modifiers = Modifiers::default();
        let mut key = None;
        for token in s.split(|c: char| c == '+' || c.is_whitespace()).filter(|t| !t.is_empty()) {
            if modifiers.apply_token(&token.to_lowercase()) {
                continue;
            }
            if key.replace(token).is_some() {
                return Err(ShortcutParseError::UnknownToken(token.to_string()));
            }
        }

        let raw = key.ok_or(ShortcutParseError::MissingKey)?;
        let shortcut = Self::new(raw, modifiers);
        if is_known_key(&shortcut.key) {
            Ok(shortcut)
        } else {
            Err(ShortcutParseError::UnknownKey(raw.to_string()))
        }
    }

    /// Label for the current platform, e.g. "⌘1" or "Super+1".
    pub fn display(&self) -> String {
        self.display_for_platform(Platform::current())
    }

    pub fn display_for_platform(&self, platform: Platform) -> String {
        let named = named_key(&self.key);
        let held = label_modifiers(&self.modifiers).into_iter().filter(|(on, _, _)| *on);
        match platform {
            Platform::MacOS => {
                let mut label: String = held.map(|(_, glyph, _)| glyph).collect();
                label.push_str(&named.map_or_else(|| self.key.to_uppercase(), |n| n.1.to_string()));
                label
            }
            Platform::Windows | Platform::Linux => {
                let mut parts: Vec<String> = held.map(|(_, _, text)| text.to_string()).collect();
                parts.push(named.map_or_else(|| self.key.to_uppercase(), |n| n.2.to_string()));
                parts.join("+")
            }
        }
    }

    /// Stable textual form, modifiers in alphabetical order: `cmd+shift+k`.
    pub fn to_canonical_string(&self) -> String {
        let mut parts: Vec<&str> = self.modifiers.canonical_parts();
        parts.push(&self.key);
        parts.join("+")
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Map a host key name to its canonical form (`"ArrowUp"` -> `"up"`,
/// `"Digit1"` -> `"1"`, `"KeyA"` -> `"a"`).
pub fn canonicalize_key(key: &str) -> String {
    let lower = key.to_lowercase();
    if let Some((_, canonical)) = KEY_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return canonical.to_string();
    }
    let single = |rest: &str, ok: fn(char) -> bool| {
        let mut chars = rest.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if ok(c))
    };
    for prefix in ["digit", "numpad"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            if single(rest, |c| c.is_ascii_digit()) {
                return rest.to_string();
            }
        }
    }
    if let Some(rest) = lower.strip_prefix("key") {
        if single(rest, |c| c.is_ascii_lowercase()) {
            return rest.to_string();
        }
    }
    lower
}

/// Whether a canonical key name can be bound: a letter, a digit, F1..F20 or
/// one of the named keys.
pub fn is_known_key(key: &str) -> bool {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_ascii_lowercase() || c.is_ascii_digit() || c == '+';
    }
    if let Some(n) = key.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        return (1..=20).contains(&n);
    }
    named_key(key).is_some()
}

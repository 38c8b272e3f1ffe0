//! Single dispatch point for raw key events.
//!
//! One `HashMap<Shortcut, Action>` built at activation replaces per-shortcut
//! listeners: a key event is canonicalized once and resolved with a single
//! lookup. Anything unbound (or bound but disabled) passes through to text
//! input.

use std::collections::HashMap;

use tracing::debug;

use super::types::{KeyEvent, Modifiers, Shortcut};

/// Numeric row shortcuts: rows 0..=8 use keys 1..=9, row 9 uses key 0.
pub const MAX_SHORTCUT_SLOTS: usize = 10;

/// What a bound chord does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Highlight the row at this visible position.
    SelectRow(usize),
    /// Move the highlight by this many rows, clamped to the result.
    MoveSelection(isize),
    Confirm,
    Cancel,
}

/// Whether a key event was consumed by the dispatch table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Passthrough,
}

impl DispatchOutcome {
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

/// Inputs that shape the table. A change to any of these means a rebuild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    pub shortcuts_visible: bool,
    pub shortcut_modifiers: Modifiers,
    pub shortcut_slots: usize,
    pub page_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            shortcuts_visible: true,
            shortcut_modifiers: Modifiers::cmd(),
            shortcut_slots: MAX_SHORTCUT_SLOTS,
            page_size: MAX_SHORTCUT_SLOTS,
        }
    }
}

/// Canonical chord -> action mapping.
#[derive(Clone, Debug, Default)]
pub struct DispatchTable {
    bindings: HashMap<Shortcut, Action>,
    row_shortcuts: Vec<Shortcut>,
}

impl DispatchTable {
    pub fn build(config: &DispatchConfig) -> Self {
        let mut table = Self::default();
        let page = isize::try_from(config.page_size.max(1)).unwrap_or(isize::MAX);

        table.bind("enter", Modifiers::default(), Action::Confirm);
        table.bind("escape", Modifiers::default(), Action::Cancel);
        table.bind("up", Modifiers::default(), Action::MoveSelection(-1));
        table.bind("down", Modifiers::default(), Action::MoveSelection(1));
        table.bind("p", Modifiers::ctrl(), Action::MoveSelection(-1));
        table.bind("n", Modifiers::ctrl(), Action::MoveSelection(1));
        table.bind("pageup", Modifiers::default(), Action::MoveSelection(-page));
        table.bind("pagedown", Modifiers::default(), Action::MoveSelection(page));
        table.bind("up", Modifiers::cmd(), Action::MoveSelection(isize::MIN));
        table.bind("down", Modifiers::cmd(), Action::MoveSelection(isize::MAX));

        if config.shortcuts_visible {
            let slots = config.shortcut_slots.min(MAX_SHORTCUT_SLOTS);
            for row in 0..slots {
                let digit = ((row + 1) % 10).to_string();
                let shortcut = Shortcut::new(digit, config.shortcut_modifiers);
                table.bindings.insert(shortcut.clone(), Action::SelectRow(row));
                table.row_shortcuts.push(shortcut);
            }
        }

        debug!(
            event_type = "chooser",
            action = "dispatch_table_built",
            bindings = table.bindings.len(),
            row_shortcuts = table.row_shortcuts.len(),
            "Key dispatch table built"
        );
        table
    }

    fn bind(&mut self, key: &str, modifiers: Modifiers, action: Action) {
        self.bindings.insert(Shortcut::new(key, modifiers), action);
    }

    /// Look up the action for `event` and check it is currently enabled.
    ///
    /// `visible_rows` is the number of rows the user can currently see;
    /// `SelectRow(n)` is disabled when `n >= visible_rows`.
    pub fn resolve(&self, event: &KeyEvent, visible_rows: usize) -> Option<Action> {
        let action = *self.bindings.get(&event.chord())?;
        match action {
            Action::SelectRow(row) if row >= visible_rows => None,
            _ => Some(action),
        }
    }

    pub fn binding(&self, shortcut: &Shortcut) -> Option<Action> {
        self.bindings.get(shortcut).copied()
    }

    /// Shortcut that selects the row at `position`, when numeric shortcuts are on.
    pub fn row_shortcut(&self, position: usize) -> Option<&Shortcut> {
        self.row_shortcuts.get(position)
    }

    pub fn row_shortcut_count(&self) -> usize {
        self.row_shortcuts.len()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

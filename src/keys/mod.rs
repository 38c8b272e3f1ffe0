//! Keyboard handling for the chooser.
//!
//! This module provides:
//! - Canonical key chords (`Shortcut`) and raw events (`KeyEvent`)
//! - The single key dispatch table mapping chords to chooser actions
//! - Platform-aware display for shortcut labels
//!
//! # Example
//!
//! ```ignore
//! use chooser_core::keys::{DispatchConfig, DispatchTable, KeyEvent, Modifiers};
//!
//! let table = DispatchTable::build(&DispatchConfig::default());
//! let action = table.resolve(&KeyEvent::new("1", Modifiers::cmd()), 3);
//! ```

mod dispatch;
mod types;

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;

pub use dispatch::{
    Action, DispatchConfig, DispatchOutcome, DispatchTable, MAX_SHORTCUT_SLOTS,
};
pub use types::{
    canonicalize_key, is_known_key, KeyEvent, Modifiers, Platform, Shortcut, ShortcutParseError,
};

//! Configuration type definitions

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::defaults::*;
use crate::error::Result;
use crate::keys::{DispatchConfig, Modifiers, MAX_SHORTCUT_SLOTS};
use crate::search::{MatchStrategy, SearchMode};

/// Chooser settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooserConfig {
    /// Quiet period before the query-changed callback fires (default: 0)
    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,
    /// Fields matched by the query (default: textOnly)
    #[serde(default)]
    pub search_mode: SearchMode,
    /// Substring (default) or fuzzy subsequence matching
    #[serde(default)]
    pub match_strategy: MatchStrategy,
    /// Whether numeric row shortcuts are active (default: true)
    #[serde(default = "default_shortcuts_visible")]
    pub shortcuts_visible: bool,
    /// Modifier for numeric row shortcuts, e.g. "cmd" or "ctrl+alt" (default: "cmd")
    #[serde(default = "default_shortcut_modifier")]
    pub shortcut_modifier: String,
    /// Number of rows with a numeric shortcut, 1..=10 (default: 10)
    #[serde(default = "default_shortcut_slots")]
    pub shortcut_slots: usize,
    /// Rows visible at once (default: 10)
    #[serde(default = "default_visible_rows")]
    pub visible_rows: usize,
    /// Rows moved by PageUp/PageDown (default: visibleRows)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    /// A numeric shortcut confirms the row instead of only highlighting it
    #[serde(default = "default_shortcut_confirms")]
    pub shortcut_confirms: bool,
    /// Placeholder text for the query field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

fn default_debounce_delay_ms() -> u64 {
    DEFAULT_DEBOUNCE_DELAY_MS
}
fn default_shortcuts_visible() -> bool {
    DEFAULT_SHORTCUTS_VISIBLE
}
fn default_shortcut_modifier() -> String {
    DEFAULT_SHORTCUT_MODIFIER.to_string()
}
fn default_shortcut_slots() -> usize {
    DEFAULT_SHORTCUT_SLOTS
}
fn default_visible_rows() -> usize {
    DEFAULT_VISIBLE_ROWS
}
fn default_shortcut_confirms() -> bool {
    DEFAULT_SHORTCUT_CONFIRMS
}

impl Default for ChooserConfig {
    fn default() -> Self {
        ChooserConfig {
            debounce_delay_ms: DEFAULT_DEBOUNCE_DELAY_MS,
            search_mode: SearchMode::default(),
            match_strategy: MatchStrategy::default(),
            shortcuts_visible: DEFAULT_SHORTCUTS_VISIBLE,
            shortcut_modifier: default_shortcut_modifier(),
            shortcut_slots: DEFAULT_SHORTCUT_SLOTS,
            visible_rows: DEFAULT_VISIBLE_ROWS,
            page_size: None,
            shortcut_confirms: DEFAULT_SHORTCUT_CONFIRMS,
            placeholder: None,
        }
    }
}

impl ChooserConfig {
    /// Clamp out-of-range values, warning about each one.
    pub fn validated(mut self) -> Self {
        if self.shortcut_slots == 0 || self.shortcut_slots > MAX_SHORTCUT_SLOTS {
            let clamped = self.shortcut_slots.clamp(1, MAX_SHORTCUT_SLOTS);
            warn!(value = self.shortcut_slots, clamped, "shortcutSlots out of range");
            self.shortcut_slots = clamped;
        }
        if self.visible_rows == 0 || self.visible_rows > MAX_VISIBLE_ROWS {
            let clamped = self.visible_rows.clamp(1, MAX_VISIBLE_ROWS);
            warn!(value = self.visible_rows, clamped, "visibleRows out of range");
            self.visible_rows = clamped;
        }
        match self.page_size {
            Some(0) => {
                warn!("pageSize must be at least 1, using visibleRows");
                self.page_size = None;
            }
            Some(size) if size > MAX_VISIBLE_ROWS => {
                warn!(value = size, clamped = MAX_VISIBLE_ROWS, "pageSize too large, clamping");
                self.page_size = Some(MAX_VISIBLE_ROWS);
            }
            _ => {}
        }
        if self.debounce_delay_ms > MAX_DEBOUNCE_DELAY_MS {
            warn!(
                value = self.debounce_delay_ms,
                max = MAX_DEBOUNCE_DELAY_MS,
                "debounceDelayMs too large, clamping"
            );
            self.debounce_delay_ms = MAX_DEBOUNCE_DELAY_MS;
        }
        if Modifiers::parse(&self.shortcut_modifier).is_err() {
            warn!(
                value = %self.shortcut_modifier,
                "Invalid shortcutModifier, using default"
            );
            self.shortcut_modifier = default_shortcut_modifier();
        }
        self
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(self.visible_rows).max(1)
    }

    pub fn shortcut_modifiers(&self) -> Result<Modifiers> {
        Ok(Modifiers::parse(&self.shortcut_modifier)?)
    }

    /// The subset of settings the key dispatch table is built from.
    pub fn dispatch_config(&self) -> Result<DispatchConfig> {
        Ok(DispatchConfig {
            shortcuts_visible: self.shortcuts_visible,
            shortcut_modifiers: self.shortcut_modifiers()?,
            shortcut_slots: self.shortcut_slots.min(MAX_SHORTCUT_SLOTS),
            page_size: self.page_size(),
        })
    }
}

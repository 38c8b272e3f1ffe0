//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default query-change debounce (0 = deliver synchronously)
pub const DEFAULT_DEBOUNCE_DELAY_MS: u64 = 0;

/// Upper bound accepted for the debounce delay
pub const MAX_DEBOUNCE_DELAY_MS: u64 = 10_000;

/// Numeric row shortcuts are shown by default
pub const DEFAULT_SHORTCUTS_VISIBLE: bool = true;

/// Modifier held with the digit keys
pub const DEFAULT_SHORTCUT_MODIFIER: &str = "cmd";

/// Rows addressable by numeric shortcut (keys 1..9 then 0)
pub const DEFAULT_SHORTCUT_SLOTS: usize = 10;

/// Rows the presentation layer shows at once
pub const DEFAULT_VISIBLE_ROWS: usize = 10;

/// Upper bound for visibleRows and pageSize
pub const MAX_VISIBLE_ROWS: usize = 10_000;

/// Numeric shortcuts only highlight by default
pub const DEFAULT_SHORTCUT_CONFIRMS: bool = false;

/// Config file location relative to the user config dir
pub const CONFIG_DIR_NAME: &str = "chooser";
pub const CONFIG_FILE_NAME: &str = "config.json";

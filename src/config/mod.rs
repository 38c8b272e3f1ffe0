//! Configuration module - chooser settings
//!
//! This module provides functionality for:
//! - Loading configuration from `<config dir>/chooser/config.json`
//! - Default values for all settings
//! - Type definitions and validation
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - `ChooserConfig` definition
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_DEBOUNCE_DELAY_MS, DEFAULT_SHORTCUT_SLOTS, DEFAULT_VISIBLE_ROWS, MAX_DEBOUNCE_DELAY_MS,
    MAX_VISIBLE_ROWS,
};
pub use loader::{default_config_path, load_config, load_config_from};
pub use types::ChooserConfig;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

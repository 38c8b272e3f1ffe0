use thiserror::Error;
use tracing::{error, warn};

use crate::keys::ShortcutParseError;

/// Domain-specific errors for the chooser.
///
/// The filtering and dispatch paths never produce these; they only surface
/// at the edges where configuration and candidate records are loaded.
#[derive(Error, Debug)]
pub enum ChooserError {
    #[error("Failed to read config from '{path}': {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid shortcut: {0}")]
    Shortcut(#[from] ShortcutParseError),

    #[error("Invalid entry record: {0}")]
    InvalidEntry(String),
}

impl ChooserError {
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigRead { path, .. } => format!("Could not read configuration at {}", path),
            Self::Parse(e) => format!("Invalid JSON: {}", e),
            Self::Shortcut(e) => format!("Shortcut issue: {}", e),
            Self::InvalidEntry(msg) => format!("Entry issue: {}", msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChooserError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use chooser_core::error::ResultExt;
///
/// let config = load_config_from(&path).warn_on_err().unwrap_or_default();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

/// Panic in debug mode, log error in release mode.
///
/// Use for "impossible" states that should crash during development
/// but gracefully degrade in production.
///
/// ```ignore
/// debug_panic!("highlight {} outside result of length {}", idx, len);
/// ```
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("IMPOSSIBLE STATE: {}", format_args!($($fmt_arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ext_passes_ok_through() {
        let ok: std::result::Result<u32, String> = Ok(7);
        assert_eq!(ok.log_err(), Some(7));
    }

    #[test]
    fn test_result_ext_swallows_err() {
        let err: std::result::Result<u32, String> = Err("boom".to_string());
        assert_eq!(err.warn_on_err(), None);
    }

    #[test]
    fn test_user_message_for_shortcut_error() {
        let err = ChooserError::from(ShortcutParseError::MissingKey);
        assert!(err.user_message().contains("Shortcut issue"));
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ChooserError = parse.into();
        assert!(matches!(err, ChooserError::Parse(_)));
    }
}

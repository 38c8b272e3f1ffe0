//! Chooser core - the engine behind a keyboard-driven "choose one of many" popup.
//!
//! The host supplies candidate entries and raw key events; this crate filters,
//! tracks the highlight, maps key chords to actions and reports the user's
//! choice. Drawing is left to the host, which reads rows out of a per-refresh
//! snapshot.
//!
//! Everything here runs on a single event-loop thread.

pub mod chooser;
pub mod config;
pub mod debounce;
pub mod entry;
pub mod error;
pub mod event_loop;
pub mod keys;
pub mod logging;
pub mod presentation;
pub mod search;
pub mod state;

pub use chooser::{Chooser, KeyMonitor, ListenerHandle, LocalKeyMonitor};
pub use config::ChooserConfig;
pub use entry::{CandidateStore, Entry, EntryId};
pub use error::{ChooserError, Result};
pub use event_loop::EventLoop;
pub use keys::{Action, DispatchOutcome, KeyEvent, Modifiers, Shortcut};
pub use search::{MatchStrategy, SearchMode};
pub use state::ChooserPhase;

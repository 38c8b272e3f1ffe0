//! Selection and navigation state.
//!
//! The highlight is valid-or-absent: absent only for an empty result,
//! otherwise inside `0..len`. When the result changes the previously
//! highlighted entry stays highlighted if it is still present.

use crate::entry::{CandidateStore, EntryId};
use crate::search::{FilterResult, Query};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChooserPhase {
    /// No query, full list.
    #[default]
    Idle,
    /// A non-empty query is applied.
    Filtering,
    /// An entry was reported to the selection callback.
    Confirmed,
    /// "No selection" was reported.
    Cancelled,
}

impl ChooserPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

/// The highlighted entry, by store position and by identity.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Highlight {
    position: usize,
    store_index: usize,
    id: EntryId,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    phase: ChooserPhase,
    query: Query,
    highlight: Option<Highlight>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to `Idle` with an empty query and no highlight.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> ChooserPhase {
        self.phase
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Visible position of the highlighted row.
    pub fn highlighted(&self) -> Option<usize> {
        self.highlight.as_ref().map(|h| h.position)
    }

    /// Store position of the highlighted entry.
    pub fn highlighted_store_index(&self) -> Option<usize> {
        self.highlight.as_ref().map(|h| h.store_index)
    }

    /// Replace the query. Returns false if the raw text did not change.
    pub fn set_query(&mut self, raw: &str) -> bool {
        if self.query.raw() == raw {
            return false;
        }
        self.query = Query::new(raw);
        if !self.phase.is_terminal() {
            self.phase = if self.query.is_empty() {
                ChooserPhase::Idle
            } else {
                ChooserPhase::Filtering
            };
        }
        true
    }

    /// Re-anchor the highlight after a new filter result.
    ///
    /// `store_replaced` means store positions from the previous result are
    /// meaningless, so the old entry is looked up by identity instead.
    pub fn apply_result(
        &mut self,
        result: &FilterResult,
        store: &CandidateStore,
        store_replaced: bool,
    ) {
        let previous_store_index = self.highlight.take().and_then(|h| {
            if store_replaced {
                store.position_of(&h.id)
            } else {
                Some(h.store_index)
            }
        });

        let position = previous_store_index
            .and_then(|i| result.position_of(i))
            .or(if result.is_empty() { None } else { Some(0) });

        self.highlight = position.and_then(|p| Self::highlight_at(p, result, store));
    }

    /// Highlight the row at `position`. Out of range is a no-op.
    pub fn select_row(
        &mut self,
        position: usize,
        result: &FilterResult,
        store: &CandidateStore,
    ) -> bool {
        match Self::highlight_at(position, result, store) {
            Some(h) => {
                self.highlight = Some(h);
                true
            }
            None => false,
        }
    }

    /// Move the highlight by `delta`, clamped into the result. No-op when empty.
    pub fn move_by(&mut self, delta: isize, result: &FilterResult, store: &CandidateStore) -> bool {
        if result.is_empty() {
            return false;
        }
        let last = result.len() - 1;
        let current = self.highlighted().unwrap_or(0);
        let target = if delta.is_negative() {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta as usize).min(last)
        };
        self.select_row(target, result, store)
    }

    /// Enter a terminal phase.
    pub fn finish(&mut self, phase: ChooserPhase) {
        debug_assert!(phase.is_terminal());
        self.phase = phase;
    }

    fn highlight_at(
        position: usize,
        result: &FilterResult,
        store: &CandidateStore,
    ) -> Option<Highlight> {
        let store_index = result.get(position)?;
        let entry = store.get(store_index)?;
        Some(Highlight {
            position,
            store_index,
            id: entry.id.clone(),
        })
    }
}

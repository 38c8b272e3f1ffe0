//! Lowercase-normalized parallel index over the candidate store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::debug;

use crate::entry::Entry;
use crate::logging;

/// Rebuilding the index for tens of thousands of entries should stay under a frame.
const SLOW_REBUILD_THRESHOLD_US: u128 = 16_666;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Lowercased text fields of one entry. Position `i` mirrors store entry `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct IndexedEntry {
    pub(crate) lowercased_text: String,
    pub(crate) lowercased_sub_text: String,
}

impl IndexedEntry {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            lowercased_text: entry.text.to_lowercase(),
            lowercased_sub_text: entry.sub_text_or_empty().to_lowercase(),
        }
    }
}

/// Derived search index. Rebuilt together with the store, never per keystroke.
#[derive(Clone, Debug)]
pub struct SearchIndex {
    entries: Vec<IndexedEntry>,
    generation: u64,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::rebuild(&[])
    }
}

impl SearchIndex {
    /// Build the index for `entries`. O(total text length).
    pub fn rebuild(entries: &[Entry]) -> Self {
        let start = Instant::now();
        let indexed: Vec<IndexedEntry> = entries.iter().map(IndexedEntry::from_entry).collect();
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

        logging::log_perf(
            "search_index_rebuild",
            start.elapsed().as_micros(),
            SLOW_REBUILD_THRESHOLD_US,
        );
        debug!(
            event_type = "chooser",
            action = "index_rebuilt",
            entries = indexed.len(),
            generation,
            "Search index rebuilt"
        );

        Self {
            entries: indexed,
            generation,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unique per rebuild; lets cached filter results detect a stale index.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn get(&self, index: usize) -> Option<&IndexedEntry> {
        self.entries.get(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &IndexedEntry)> {
        self.entries.iter().enumerate()
    }
}

//! Per-refresh snapshot of the rows the presentation layer draws.
//!
//! The host opens a cycle with [`RowCache::begin_cycle`], reads as many rows
//! as it needs, and closes it with [`RowCache::end_cycle`]. A snapshot is a
//! handful of `Arc` clones; rows are read straight out of it.

use std::sync::Arc;

use tracing::trace;

use crate::entry::Entry;
use crate::search::FilterResult;

/// One visible row, borrowed from a snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowView<'a> {
    /// Visible position, 0-based.
    pub position: usize,
    /// Position in the candidate store.
    pub store_index: usize,
    pub entry: &'a Entry,
    /// e.g. "⌘1", present only for rows with a numeric shortcut.
    pub shortcut_label: Option<&'a str>,
    pub highlighted: bool,
}

/// Immutable view of the filtered list for one refresh cycle.
#[derive(Clone, Debug, Default)]
pub struct RowSnapshot {
    entries: Arc<[Entry]>,
    result: Arc<[usize]>,
    labels: Arc<[String]>,
    highlighted: Option<usize>,
}

impl RowSnapshot {
    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn row(&self, position: usize) -> Option<RowView<'_>> {
        let store_index = *self.result.get(position)?;
        let entry = self.entries.get(store_index)?;
        Some(RowView {
            position,
            store_index,
            entry,
            shortcut_label: self.labels.get(position).map(String::as_str),
            highlighted: self.highlighted == Some(position),
        })
    }

    /// Rows `start..start + count`, clipped to the result.
    pub fn rows(&self, start: usize, count: usize) -> impl Iterator<Item = RowView<'_>> {
        let end = start.saturating_add(count).min(self.len());
        (start.min(end)..end).filter_map(move |p| self.row(p))
    }
}

#[derive(Debug, Default)]
pub struct RowCache {
    source: RowSnapshot,
    open: Option<Arc<RowSnapshot>>,
    cycles: u64,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest filtered list. An open cycle keeps its snapshot.
    pub fn update(&mut self, entries: Arc<[Entry]>, result: &FilterResult, highlighted: Option<usize>) {
        self.source.entries = entries;
        self.source.result = result.shared();
        self.source.highlighted = highlighted;
    }

    pub fn set_highlighted(&mut self, highlighted: Option<usize>) {
        self.source.highlighted = highlighted;
    }

    /// Shortcut labels for the first rows, in visible order.
    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.source.labels = labels.into();
    }

    /// Open a refresh cycle, or return the snapshot of the one already open.
    pub fn begin_cycle(&mut self) -> Arc<RowSnapshot> {
        if let Some(open) = &self.open {
            return open.clone();
        }
        self.cycles += 1;
        let snapshot = Arc::new(self.source.clone());
        trace!(cycle = self.cycles, rows = snapshot.len(), "row cycle started");
        self.open = Some(snapshot.clone());
        snapshot
    }

    /// Row lookup inside the open cycle. `None` outside a cycle.
    pub fn row(&self, position: usize) -> Option<RowView<'_>> {
        self.open.as_ref()?.row(position)
    }

    pub fn end_cycle(&mut self) {
        self.open = None;
    }

    pub fn in_cycle(&self) -> bool {
        self.open.is_some()
    }

    /// Number of cycles opened so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Drop the cached rows (teardown). Shortcut labels are kept.
    pub fn clear(&mut self) {
        self.source = RowSnapshot {
            labels: std::mem::take(&mut self.source.labels),
            ..RowSnapshot::default()
        };
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Arc<[Entry]> {
        vec![Entry::new("Safari"), Entry::new("Terminal"), Entry::new("Mail")].into()
    }

    #[test]
    fn test_snapshot_reads_filtered_rows() {
        let mut cache = RowCache::new();
        cache.update(entries(), &FilterResult::from_indices(vec![0, 2]), Some(1));
        cache.set_labels(vec!["⌘1".into(), "⌘2".into()]);

        let snap = cache.begin_cycle();
        assert_eq!(snap.len(), 2);
        let row = snap.row(1).unwrap();
        assert_eq!(row.entry.text, "Mail");
        assert_eq!(row.store_index, 2);
        assert_eq!(row.shortcut_label, Some("⌘2"));
        assert!(row.highlighted);
        assert!(snap.row(2).is_none());
    }

    #[test]
    fn test_open_cycle_is_stable_across_updates() {
        let mut cache = RowCache::new();
        cache.update(entries(), &FilterResult::all(3), Some(0));
        let snap = cache.begin_cycle();

        cache.update(entries(), &FilterResult::from_indices(vec![2]), Some(0));
        assert_eq!(cache.row(1).map(|r| r.entry.text.as_str()), Some("Terminal"));
        assert!(Arc::ptr_eq(&snap, &cache.begin_cycle()));
        assert_eq!(cache.cycles(), 1);

        cache.end_cycle();
        assert!(cache.row(0).is_none());
        let next = cache.begin_cycle();
        assert_eq!(next.len(), 1);
        assert_eq!(cache.cycles(), 2);
    }

    #[test]
    fn test_rows_range_clips() {
        let mut cache = RowCache::new();
        cache.update(entries(), &FilterResult::all(3), None);
        let snap = cache.begin_cycle();
        let texts: Vec<&str> = snap.rows(1, 10).map(|r| r.entry.text.as_str()).collect();
        assert_eq!(texts, vec!["Terminal", "Mail"]);
        assert_eq!(snap.rows(5, 2).count(), 0);
        assert!(snap.row(0).unwrap().shortcut_label.is_none());
    }

    #[test]
    fn test_clear_releases_rows() {
        let mut cache = RowCache::new();
        cache.update(entries(), &FilterResult::all(3), Some(0));
        cache.begin_cycle();
        cache.clear();
        assert!(!cache.in_cycle());
        assert!(cache.begin_cycle().is_empty());
    }
}

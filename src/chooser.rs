//! The chooser: wires the candidate store, search index, filter engine,
//! debouncer, key dispatch table, selection state and row cache together.
//!
//! Everything runs on the host's event-loop thread. Data flow:
//!
//! - `set_entries` -> index rebuild -> filter with current query -> row cache
//! - key event -> dispatch table -> action (handled) or passthrough
//! - `set_query` -> filter -> selection state -> row cache -> debouncer

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::ChooserConfig;
use crate::debounce::Debouncer;
use crate::entry::{CandidateStore, Entry};
use crate::error::Result;
use crate::event_loop::EventLoop;
use crate::keys::{Action, DispatchConfig, DispatchOutcome, DispatchTable, KeyEvent};
use crate::logging;
use crate::presentation::{RowCache, RowSnapshot, RowView};
use crate::search::{FilterResult, IncrementalFilter, MatchStrategy, SearchIndex, SearchMode};
use crate::state::{ChooserPhase, SelectionState};

/// Called with the confirmed entry, or `None` on cancel.
pub type SelectionCallback = Box<dyn FnMut(Option<&Entry>)>;

/// Supplies a fresh candidate list on every activation.
pub type EntryProvider = Box<dyn FnMut() -> Vec<Entry>>;

/// Token for an installed key listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(pub u64);

/// Host-side keyboard hook.
///
/// While a listener is installed the host routes key-down events to
/// [`Chooser::handle_key_event`] and honours the returned outcome.
pub trait KeyMonitor {
    fn install(&mut self) -> ListenerHandle;
    fn uninstall(&mut self, handle: ListenerHandle);
}

/// In-process monitor for hosts that call `handle_key_event` directly.
/// Clones share state, so the installed set can be inspected from outside.
#[derive(Clone, Debug, Default)]
pub struct LocalKeyMonitor {
    inner: Rc<RefCell<LocalKeyMonitorState>>,
}

#[derive(Debug, Default)]
struct LocalKeyMonitorState {
    next: u64,
    installed: BTreeSet<ListenerHandle>,
}

impl LocalKeyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed_count(&self) -> usize {
        self.inner.borrow().installed.len()
    }
}

impl KeyMonitor for LocalKeyMonitor {
    fn install(&mut self) -> ListenerHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next += 1;
        let handle = ListenerHandle(inner.next);
        inner.installed.insert(handle);
        handle
    }

    fn uninstall(&mut self, handle: ListenerHandle) {
        self.inner.borrow_mut().installed.remove(&handle);
    }
}

pub struct Chooser {
    config: ChooserConfig,
    store: CandidateStore,
    index: SearchIndex,
    filter: IncrementalFilter,
    result: FilterResult,
    state: SelectionState,
    dispatch_config: DispatchConfig,
    dispatch: DispatchTable,
    dispatch_builds: u64,
    rows: RowCache,
    debouncer: Debouncer<String>,
    on_selection: Option<SelectionCallback>,
    entry_provider: Option<EntryProvider>,
    key_monitor: Box<dyn KeyMonitor>,
    listener: Option<ListenerHandle>,
}

impl Chooser {
    pub fn new(
        config: ChooserConfig,
        event_loop: EventLoop,
        key_monitor: Box<dyn KeyMonitor>,
    ) -> Result<Self> {
        let config = config.validated();
        let dispatch_config = config.dispatch_config()?;
        let debouncer = Debouncer::new(event_loop, config.debounce_delay());

        let mut chooser = Self {
            config,
            store: CandidateStore::default(),
            index: SearchIndex::default(),
            filter: IncrementalFilter::new(),
            result: FilterResult::default(),
            state: SelectionState::new(),
            dispatch_config,
            dispatch: DispatchTable::default(),
            dispatch_builds: 0,
            rows: RowCache::new(),
            debouncer,
            on_selection: None,
            entry_provider: None,
            key_monitor,
            listener: None,
        };
        chooser.rebuild_dispatch();
        Ok(chooser)
    }

    // ============================================
    // CONFIGURATION SURFACE
    // ============================================

    /// Replace the candidate store, rebuild the index and re-filter with the
    /// current query.
    #[instrument(skip_all, fields(count = entries.len()))]
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.store = CandidateStore::new(entries);
        self.index = SearchIndex::rebuild(self.store.entries());
        self.filter.reset();
        self.refilter(true);
        info!(
            event_type = "chooser",
            action = "entries_replaced",
            count = self.store.len(),
            matches = self.result.len(),
            "Candidate store replaced"
        );
    }

    /// Parse a JSON array of loose records and install them.
    pub fn set_entries_from_json(&mut self, json: &str) -> Result<()> {
        let entries = Entry::list_from_json(json)?;
        self.set_entries(entries);
        Ok(())
    }

    /// Pull a fresh list from `provider` on every `activate()`.
    pub fn set_entry_provider(&mut self, provider: impl FnMut() -> Vec<Entry> + 'static) {
        self.entry_provider = Some(Box::new(provider));
    }

    /// Takes effect on the next filter run (`refresh()` or a query change).
    pub fn set_search_mode(&mut self, mode: SearchMode) {
        self.config.search_mode = mode;
    }

    /// Takes effect on the next filter run (`refresh()` or a query change).
    pub fn set_match_strategy(&mut self, strategy: MatchStrategy) {
        self.config.match_strategy = strategy;
    }

    pub fn set_shortcuts_visible(&mut self, visible: bool) {
        if self.config.shortcuts_visible == visible {
            return;
        }
        self.config.shortcuts_visible = visible;
        self.dispatch_config.shortcuts_visible = visible;
        self.rebuild_dispatch();
    }

    /// Takes effect on the next query change.
    pub fn set_debounce_delay(&mut self, millis: u64) {
        self.config.debounce_delay_ms = millis;
        self.config = std::mem::take(&mut self.config).validated();
        self.debouncer.set_delay(self.config.debounce_delay());
    }

    /// Apply a whole config; the dispatch table is rebuilt only if its inputs changed.
    pub fn apply_config(&mut self, config: ChooserConfig) -> Result<()> {
        let config = config.validated();
        let dispatch_config = config.dispatch_config()?;
        self.debouncer.set_delay(config.debounce_delay());
        self.config = config;
        if dispatch_config != self.dispatch_config {
            self.dispatch_config = dispatch_config;
            self.rebuild_dispatch();
        }
        Ok(())
    }

    pub fn on_query_changed(&mut self, callback: impl FnMut(String) + 'static) {
        self.debouncer.set_callback(callback);
    }

    pub fn on_selection(&mut self, callback: impl FnMut(Option<&Entry>) + 'static) {
        self.on_selection = Some(Box::new(callback));
    }

    // ============================================
    // LIFECYCLE
    // ============================================

    /// Install the key listener and start a fresh `Idle` session.
    pub fn activate(&mut self) {
        if self.listener.is_some() {
            return;
        }
        self.state.reset();
        if let Some(provider) = self.entry_provider.as_mut() {
            let entries = provider();
            self.set_entries(entries);
        } else {
            self.filter.reset();
            self.refilter(true);
        }
        self.listener = Some(self.key_monitor.install());
        info!(
            event_type = "chooser",
            action = "activated",
            entries = self.store.len(),
            "Chooser activated"
        );
    }

    /// Tear down: cancel the pending query notification, uninstall the key
    /// listener and release the store and its caches.
    pub fn deactivate(&mut self) {
        self.debouncer.cancel();
        let had_listener = match self.listener.take() {
            Some(handle) => {
                self.key_monitor.uninstall(handle);
                true
            }
            None => false,
        };

        let phase = self.state.phase();
        self.state.reset();
        if phase.is_terminal() {
            self.state.finish(phase);
        }

        self.store = CandidateStore::default();
        self.index = SearchIndex::default();
        self.filter.reset();
        self.result = FilterResult::default();
        self.rows.clear();

        if had_listener {
            info!(
                event_type = "chooser",
                action = "deactivated",
                phase = ?phase,
                "Chooser deactivated"
            );
        }
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    // ============================================
    // INPUT
    // ============================================

    /// Single entry point for raw key-down events.
    pub fn handle_key_event(&mut self, event: &KeyEvent) -> DispatchOutcome {
        if !self.is_active() {
            return DispatchOutcome::Passthrough;
        }
        let visible = self.visible_rows();
        let outcome = match self.dispatch.resolve(event, visible) {
            Some(action) => {
                self.execute(action);
                DispatchOutcome::Handled
            }
            None => DispatchOutcome::Passthrough,
        };
        logging::log_key_event(
            &event.chord().to_canonical_string(),
            if outcome.is_handled() { "handled" } else { "passthrough" },
        );
        outcome
    }

    /// The query text changed (typed or programmatic).
    pub fn set_query(&mut self, raw: &str) {
        if !self.state.set_query(raw) {
            return;
        }
        self.refilter(false);
        if self.is_active() {
            self.debouncer.notify(raw.to_string());
        }
    }

    /// Re-run the filter with the current query and settings.
    pub fn refresh(&mut self) {
        self.refilter(false);
    }

    /// Run an action as if its key had been pressed.
    pub fn execute(&mut self, action: Action) {
        debug!(event_type = "chooser", action = ?action, "Executing action");
        match action {
            Action::SelectRow(position) => {
                let selected = self.state.select_row(position, &self.result, &self.store);
                self.rows.set_highlighted(self.state.highlighted());
                if selected && self.config.shortcut_confirms {
                    self.confirm();
                }
            }
            Action::MoveSelection(delta) => {
                self.state.move_by(delta, &self.result, &self.store);
                self.rows.set_highlighted(self.state.highlighted());
            }
            Action::Confirm => self.confirm(),
            Action::Cancel => self.cancel(),
        }
    }

    fn confirm(&mut self) {
        let Some(store_index) = self.state.highlighted_store_index() else {
            return;
        };
        let entries: Arc<[Entry]> = self.store.shared();
        let Some(entry) = entries.get(store_index) else {
            crate::debug_panic!(
                "highlighted store index {} outside store of {}",
                store_index,
                entries.len()
            );
            return;
        };
        info!(
            event_type = "chooser",
            action = "confirmed",
            entry_id = %entry.id,
            "Entry confirmed"
        );
        self.state.finish(ChooserPhase::Confirmed);
        self.deactivate();
        if let Some(callback) = self.on_selection.as_mut() {
            callback(Some(entry));
        }
    }

    fn cancel(&mut self) {
        info!(event_type = "chooser", action = "cancelled", "Chooser cancelled");
        self.state.finish(ChooserPhase::Cancelled);
        self.deactivate();
        if let Some(callback) = self.on_selection.as_mut() {
            callback(None);
        }
    }

    // ============================================
    // READ ACCESS
    // ============================================

    pub fn config(&self) -> &ChooserConfig {
        &self.config
    }

    pub fn phase(&self) -> ChooserPhase {
        self.state.phase()
    }

    pub fn query(&self) -> &str {
        self.state.query().raw()
    }

    /// Hint shown in the empty query field, if configured.
    pub fn placeholder(&self) -> Option<&str> {
        self.config.placeholder.as_deref()
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    pub fn result(&self) -> &FilterResult {
        &self.result
    }

    pub fn result_len(&self) -> usize {
        self.result.len()
    }

    /// Entries of the current result, in display order.
    pub fn result_entries(&self) -> impl Iterator<Item = &Entry> {
        self.result.iter().filter_map(|i| self.store.get(i))
    }

    /// Visible position of the highlighted row.
    pub fn selected_row(&self) -> Option<usize> {
        self.state.highlighted()
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.state
            .highlighted_store_index()
            .and_then(|i| self.store.get(i))
    }

    /// Rows currently visible, which bounds the enabled numeric shortcuts.
    pub fn visible_rows(&self) -> usize {
        self.result.len().min(self.config.visible_rows)
    }

    /// How many times the dispatch table has been built.
    pub fn dispatch_builds(&self) -> u64 {
        self.dispatch_builds
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    // ============================================
    // ROW PRESENTATION
    // ============================================

    pub fn begin_cycle(&mut self) -> Arc<RowSnapshot> {
        self.rows.begin_cycle()
    }

    pub fn row(&self, position: usize) -> Option<RowView<'_>> {
        self.rows.row(position)
    }

    pub fn end_cycle(&mut self) {
        self.rows.end_cycle();
    }

    // ============================================
    // INTERNALS
    // ============================================

    fn refilter(&mut self, store_replaced: bool) {
        let result = self.filter.run(
            self.state.query(),
            &self.index,
            self.config.search_mode,
            self.config.match_strategy,
        );
        self.state.apply_result(&result, &self.store, store_replaced);
        self.rows
            .update(self.store.shared(), &result, self.state.highlighted());
        self.result = result;
    }

    fn rebuild_dispatch(&mut self) {
        self.dispatch = DispatchTable::build(&self.dispatch_config);
        self.dispatch_builds += 1;
        let labels = (0..self.dispatch.row_shortcut_count())
            .filter_map(|i| self.dispatch.row_shortcut(i).map(|s| s.display()))
            .collect();
        self.rows.set_labels(labels);
    }
}

impl Drop for Chooser {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            self.key_monitor.uninstall(handle);
        }
    }
}

#[cfg(test)]
#[path = "chooser_tests.rs"]
mod tests;

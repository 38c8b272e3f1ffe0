//! Filter engine: (query, index, mode) -> ordered matches.
//!
//! Matching only ever reads the precomputed lowercase fields of the
//! [`SearchIndex`]. Results always come out in store order.

use std::sync::Arc;
#[cfg(feature = "perf")]
use std::time::Instant;

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};
use tracing::trace;

use super::index::{IndexedEntry, SearchIndex};
use super::query::{MatchStrategy, Query, SearchMode};

#[cfg(feature = "perf")]
const SLOW_FILTER_THRESHOLD_US: u128 = 8_000;

/// Ordered store positions of the entries matching a query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterResult {
    indices: Arc<[usize]>,
}

impl FilterResult {
    pub(crate) fn from_indices(indices: Vec<usize>) -> Self {
        Self {
            indices: indices.into(),
        }
    }

    /// Every position `0..len`, the result of an empty query.
    pub fn all(len: usize) -> Self {
        Self::from_indices((0..len).collect())
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Store position of the row at visible position `position`.
    pub fn get(&self, position: usize) -> Option<usize> {
        self.indices.get(position).copied()
    }

    /// Visible position of a store position, if it matched.
    pub fn position_of(&self, store_index: usize) -> Option<usize> {
        // Indices are ascending
        self.indices.binary_search(&store_index).ok()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub(crate) fn shared(&self) -> Arc<[usize]> {
        self.indices.clone()
    }
}

/// Substring filter over the index.
pub fn filter(query: &Query, index: &SearchIndex, mode: SearchMode) -> FilterResult {
    filter_with(query, index, mode, MatchStrategy::Substring)
}

/// Filter with an explicit match strategy.
pub fn filter_with(
    query: &Query,
    index: &SearchIndex,
    mode: SearchMode,
    strategy: MatchStrategy,
) -> FilterResult {
    if query.is_empty() {
        return FilterResult::all(index.len());
    }
    let mut matcher = EntryMatcher::new(query.normalized(), mode, strategy);
    let indices = index
        .iter()
        .filter(|(_, entry)| matcher.matches(entry))
        .map(|(i, _)| i)
        .collect();
    FilterResult::from_indices(indices)
}

/// Per-run matching state. The fuzzy pattern and its scratch buffer are built
/// once per filter run, not per candidate.
struct EntryMatcher<'q> {
    needle: &'q str,
    mode: SearchMode,
    fuzzy: Option<FuzzyCtx>,
}

impl<'q> EntryMatcher<'q> {
    fn new(needle: &'q str, mode: SearchMode, strategy: MatchStrategy) -> Self {
        let fuzzy = match strategy {
            MatchStrategy::Substring => None,
            MatchStrategy::Fuzzy => Some(FuzzyCtx::new(needle)),
        };
        Self {
            needle,
            mode,
            fuzzy,
        }
    }

    fn matches(&mut self, entry: &IndexedEntry) -> bool {
        if self.field_matches(&entry.lowercased_text) {
            return true;
        }
        self.mode == SearchMode::TextAndSubtext && self.field_matches(&entry.lowercased_sub_text)
    }

    fn field_matches(&mut self, field: &str) -> bool {
        match self.fuzzy.as_mut() {
            None => field.contains(self.needle),
            Some(ctx) => ctx.is_match(field),
        }
    }
}

/// Nucleo matcher context that reuses allocations across candidates.
struct FuzzyCtx {
    pattern: Pattern,
    matcher: Matcher,
    buf: Vec<char>,
}

impl FuzzyCtx {
    fn new(needle: &str) -> Self {
        Self {
            pattern: Pattern::new(
                needle,
                CaseMatching::Ignore,
                Normalization::Smart,
                AtomKind::Fuzzy,
            ),
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
            buf: Vec::with_capacity(64),
        }
    }

    #[inline]
    fn is_match(&mut self, haystack: &str) -> bool {
        self.buf.clear();
        let utf32 = Utf32Str::new(haystack, &mut self.buf);
        self.pattern.score(utf32, &mut self.matcher).is_some()
    }
}

/// Remembers the previous run so a query that only narrows (the new
/// normalized query contains the old one) rescans just the previous matches.
///
/// The output is always identical to a full [`filter_with`] run.
#[derive(Debug, Default)]
pub struct IncrementalFilter {
    last: Option<LastRun>,
}

#[derive(Debug)]
struct LastRun {
    normalized: String,
    mode: SearchMode,
    strategy: MatchStrategy,
    generation: u64,
    result: FilterResult,
}

impl IncrementalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous run.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn run(
        &mut self,
        query: &Query,
        index: &SearchIndex,
        mode: SearchMode,
        strategy: MatchStrategy,
    ) -> FilterResult {
        #[cfg(feature = "perf")]
        let start = Instant::now();

        let result = match self.narrowing_base(query, index, mode, strategy) {
            Some(base) => {
                trace!(
                    event_type = "chooser",
                    candidates = base.len(),
                    query = query.normalized(),
                    "Narrowing previous result"
                );
                let mut matcher = EntryMatcher::new(query.normalized(), mode, strategy);
                let indices = base
                    .iter()
                    .filter(|&i| index.get(i).is_some_and(|entry| matcher.matches(entry)))
                    .collect();
                FilterResult::from_indices(indices)
            }
            None => filter_with(query, index, mode, strategy),
        };

        #[cfg(feature = "perf")]
        crate::logging::log_perf(
            "filter",
            start.elapsed().as_micros(),
            SLOW_FILTER_THRESHOLD_US,
        );

        self.last = Some(LastRun {
            normalized: query.normalized().to_string(),
            mode,
            strategy,
            generation: index.generation(),
            result: result.clone(),
        });
        result
    }

    fn narrowing_base(
        &self,
        query: &Query,
        index: &SearchIndex,
        mode: SearchMode,
        strategy: MatchStrategy,
    ) -> Option<FilterResult> {
        let last = self.last.as_ref()?;
        let narrows = strategy == MatchStrategy::Substring
            && last.strategy == strategy
            && last.mode == mode
            && last.generation == index.generation()
            && !query.is_empty()
            && query.normalized().contains(last.normalized.as_str());
        narrows.then(|| last.result.clone())
    }
}

//! Search index and filter engine.
//!
//! - `index` - lowercase-normalized mirror of the candidate store
//! - `query` - query normalization and search-mode flags
//! - `filter` - pure filtering plus the incremental narrowing wrapper

mod filter;
mod index;
mod query;

pub use filter::{filter, filter_with, FilterResult, IncrementalFilter};
pub use index::SearchIndex;
pub use query::{normalize, MatchStrategy, Query, SearchMode};

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;

use serde::{Deserialize, Serialize};

/// Which entry fields a query is matched against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    #[default]
    TextOnly,
    TextAndSubtext,
}

/// How a normalized query is compared against an indexed field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    /// Plain substring containment.
    #[default]
    Substring,
    /// Characters appear in order. Matches only; results keep store order.
    Fuzzy,
}

/// The query as typed plus its normalized (trimmed, lowercased) form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    raw: String,
    normalized: String,
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Trim and lowercase a raw query.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

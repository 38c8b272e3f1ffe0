//! Candidate entries and the store that owns them.
//!
//! Hosts hand over loosely-typed records (a JSON object per row); they are
//! converted once into fixed-shape [`Entry`] values so nothing downstream
//! probes string keys at render time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ChooserError, Result};

/// Stable identity of an entry. Generated (UUID v4) when the record has none.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque image handle. The core carries it through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub Value);

/// One selectable candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_text: Option<String>,
    #[serde(default, rename = "image", skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(rename = "uuid")]
    pub id: EntryId,
    /// Any other keys the host put on the record, handed back on selection.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sub_text: None,
            image: None,
            id: EntryId::generate(),
            extra: Map::new(),
        }
    }

    pub fn with_sub_text(mut self, sub_text: impl Into<String>) -> Self {
        self.sub_text = Some(sub_text.into());
        self
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_id(mut self, id: EntryId) -> Self {
        self.id = id;
        self
    }

    /// Subtext or empty string.
    pub fn sub_text_or_empty(&self) -> &str {
        self.sub_text.as_deref().unwrap_or("")
    }

    /// Convert a loose host record into an entry.
    ///
    /// Never fails: a missing or non-string `text`/`subText` becomes empty,
    /// a missing `uuid` is generated and a non-object record yields an
    /// empty-text entry.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            debug!(
                event_type = "chooser",
                record = %value,
                "Non-object entry record, using empty entry"
            );
            return Self::new("");
        };

        let text = string_field(obj, "text").unwrap_or_default();
        let sub_text = string_field(obj, "subText");
        let image = obj
            .get("image")
            .filter(|v| !v.is_null())
            .cloned()
            .map(ImageRef);
        let id = match obj.get("uuid") {
            Some(Value::String(s)) if !s.is_empty() => EntryId::new(s.clone()),
            Some(Value::Number(n)) => EntryId::new(n.to_string()),
            _ => EntryId::generate(),
        };

        let extra = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "text" | "subText" | "image" | "uuid"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            text,
            sub_text,
            image,
            id,
            extra,
        }
    }

    /// Parse a JSON array of records. Only a non-array document is an error;
    /// individual records are converted softly.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Array(items) => Ok(items.iter().map(Self::from_value).collect()),
            other => Err(ChooserError::InvalidEntry(format!(
                "expected an array of entries, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => {
            debug!(
                event_type = "chooser",
                field = key,
                kind = json_kind(other),
                "Non-string entry field, defaulting to empty"
            );
            Some(String::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The current candidate list. Replaced wholesale, never patched.
#[derive(Clone, Debug, Default)]
pub struct CandidateStore {
    entries: Arc<[Entry]>,
    positions: HashMap<EntryId, usize>,
}

impl CandidateStore {
    pub fn new(entries: Vec<Entry>) -> Self {
        let mut positions = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            // Later duplicates overwrite earlier ones
            positions.insert(entry.id.clone(), i);
        }
        Self {
            entries: entries.into(),
            positions,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Cheap shared handle for snapshots.
    pub fn shared(&self) -> Arc<[Entry]> {
        self.entries.clone()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store position for an id; duplicate ids resolve to the last one.
    pub fn position_of(&self, id: &EntryId) -> Option<usize> {
        self.positions.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_known_fields() {
        let entry = Entry::from_value(&json!({
            "text": "Safari",
            "subText": "Web browser",
            "uuid": "safari-1",
            "image": {"path": "/Applications/Safari.app"},
            "bundleId": "com.apple.Safari"
        }));
        assert_eq!(entry.text, "Safari");
        assert_eq!(entry.sub_text.as_deref(), Some("Web browser"));
        assert_eq!(entry.id, EntryId::new("safari-1"));
        assert!(entry.image.is_some());
        assert_eq!(entry.extra.get("bundleId"), Some(&json!("com.apple.Safari")));
        assert!(!entry.extra.contains_key("text"));
    }

    #[test]
    fn test_from_value_defaults_malformed_fields() {
        let entry = Entry::from_value(&json!({"text": 42, "subText": ["x"]}));
        assert_eq!(entry.text, "");
        assert_eq!(entry.sub_text.as_deref(), Some(""));
        assert!(!entry.id.as_str().is_empty());
    }

    #[test]
    fn test_from_value_non_object() {
        let entry = Entry::from_value(&json!("just a string"));
        assert_eq!(entry.text, "");
        assert_eq!(entry.sub_text, None);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = Entry::new("a");
        let b = Entry::new("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_list_from_json_requires_array() {
        assert!(Entry::list_from_json(r#"{"text": "x"}"#).is_err());
        let list = Entry::list_from_json(r#"[{"text": "x"}, 3]"#).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].text, "");
    }

    #[test]
    fn test_store_duplicate_ids_last_wins() {
        let id = EntryId::new("dup");
        let store = CandidateStore::new(vec![
            Entry::new("first").with_id(id.clone()),
            Entry::new("middle"),
            Entry::new("last").with_id(id.clone()),
        ]);
        assert_eq!(store.position_of(&id), Some(2));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_entry_serializes_with_host_keys() {
        let entry = Entry::new("Mail")
            .with_sub_text("Email")
            .with_id(EntryId::new("m"));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["text"], "Mail");
        assert_eq!(value["subText"], "Email");
        assert_eq!(value["uuid"], "m");
    }
}

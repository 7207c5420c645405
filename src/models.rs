//! Core records persisted by every backend.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default number of versions retained per (locale, key).
pub const DEFAULT_MAX_VERSIONS: usize = 10;

/// A registered locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    /// Short code, unique across the registry (e.g. "fr", "pt-BR")
    pub code: String,

    /// English name (e.g. "French")
    pub name: String,

    /// Name in the locale itself (e.g. "Français")
    pub native_name: String,
}

impl Locale {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        native_name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            native_name: native_name.into(),
        }
    }

    /// Row created when a write targets an unregistered locale.
    pub fn placeholder(code: &str) -> Self {
        Self::new(code, code, code)
    }
}

/// Immutable snapshot of a value with authorship metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub user_id: String,

    /// Epoch milliseconds, assigned at write time
    pub timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    pub key: String,
    pub value: String,
}

/// Authorship data shared by every record produced by one write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMeta {
    pub user_id: String,
    pub timestamp: i64,
    pub tag: Option<String>,
}

impl VersionMeta {
    /// Metadata stamped with the current wall-clock time.
    pub fn now(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp: Utc::now().timestamp_millis(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.map(str::to_string);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn record(&self, key: &str, value: &str) -> VersionRecord {
        VersionRecord {
            user_id: self.user_id.clone(),
            timestamp: self.timestamp,
            tag: self.tag.clone(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Optional criteria for reading a past version instead of the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSelector {
    pub user_id: Option<String>,
    pub version_tag: Option<String>,

    /// Upper bound (inclusive) in epoch milliseconds
    pub timestamp: Option<i64>,
}

impl VersionSelector {
    pub fn by_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn by_tag(tag: impl Into<String>) -> Self {
        Self {
            version_tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    /// A selector with no criteria behaves exactly like no selector.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.version_tag.is_none() && self.timestamp.is_none()
    }
}

/// How a tag list is combined when querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// Every tag must be present (AND)
    All,
    /// At least one tag must be present (OR)
    Any,
}

impl From<bool> for TagMatch {
    fn from(match_all: bool) -> Self {
        if match_all {
            Self::All
        } else {
            Self::Any
        }
    }
}

/// Tag mutation applied to a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagUpdate {
    /// Set union
    Add(BTreeSet<String>),
    /// Wholesale replacement
    Replace(BTreeSet<String>),
    /// Set difference
    Remove(BTreeSet<String>),
}

impl TagUpdate {
    pub fn apply(&self, tags: &mut BTreeSet<String>) {
        match self {
            Self::Add(added) => tags.extend(added.iter().cloned()),
            Self::Replace(replacement) => *tags = replacement.clone(),
            Self::Remove(removed) => tags.retain(|tag| !removed.contains(tag)),
        }
    }
}

/// Collect caller-supplied tags into a set, dropping blanks.
pub fn tag_set<S: AsRef<str>>(tags: &[S]) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| tag.as_ref().trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// One translatable string within a locale, with its version history.
///
/// `versions` is newest-first and never empty once the entry exists;
/// `versions[0].value == value` after every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    pub locale: String,
    pub key: String,
    pub value: String,
    pub versions: Vec<VersionRecord>,

    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TranslationEntry {
    /// Build a fresh entry from its first version.
    pub fn first(locale: &str, record: VersionRecord, tags: Option<BTreeSet<String>>) -> Self {
        Self {
            locale: locale.to_string(),
            key: record.key.clone(),
            value: record.value.clone(),
            versions: vec![record],
            tags: tags.unwrap_or_default(),
        }
    }

    /// Prepend a version, evict the oldest beyond `max_versions`, and replace
    /// tags only when a new set is supplied.
    pub fn push_version(
        &mut self,
        record: VersionRecord,
        max_versions: usize,
        tags: Option<BTreeSet<String>>,
    ) {
        self.value = record.value.clone();
        self.versions.insert(0, record);
        self.versions.truncate(max_versions.max(1));
        if let Some(tags) = tags {
            self.tags = tags;
        }
    }

    pub fn latest(&self) -> Option<&VersionRecord> {
        self.versions.first()
    }

    pub fn matches_tags(&self, tags: &BTreeSet<String>, mode: TagMatch) -> bool {
        if tags.is_empty() {
            return false;
        }
        match mode {
            TagMatch::All => tags.iter().all(|tag| self.tags.contains(tag)),
            TagMatch::Any => tags.iter().any(|tag| self.tags.contains(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &str, ts: i64) -> VersionRecord {
        VersionMeta::now("u1").with_timestamp(ts).record("a.b", value)
    }

    // ==================== Locale Tests ====================

    #[test]
    fn test_placeholder_locale_uses_code_for_names() {
        let locale = Locale::placeholder("xx");
        assert_eq!(locale.code, "xx");
        assert_eq!(locale.name, "xx");
        assert_eq!(locale.native_name, "xx");
    }

    #[test]
    fn test_locale_serializes_camel_case() {
        let locale = Locale::new("fr", "French", "Français");
        let json = serde_json::to_string(&locale).expect("Should serialize");
        assert!(json.contains("\"nativeName\":\"Français\""));
    }

    // ==================== VersionMeta Tests ====================

    #[test]
    fn test_meta_record_copies_fields() {
        let meta = VersionMeta::now("u1").with_tag(Some("v1")).with_timestamp(42);
        let record = meta.record("greeting", "Hello");
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.tag.as_deref(), Some("v1"));
        assert_eq!(record.key, "greeting");
        assert_eq!(record.value, "Hello");
    }

    #[test]
    fn test_version_record_omits_missing_tag() {
        let json = serde_json::to_string(&record("x", 1)).expect("Should serialize");
        assert!(!json.contains("tag"));
        let back: VersionRecord = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(back.tag, None);
    }

    // ==================== Selector Tests ====================

    #[test]
    fn test_selector_is_empty() {
        assert!(VersionSelector::default().is_empty());
        assert!(!VersionSelector::by_user("u").is_empty());
        assert!(!VersionSelector::by_tag("v1").is_empty());
        assert!(!VersionSelector::at(0).is_empty());
    }

    // ==================== Tag Tests ====================

    #[test]
    fn test_tag_match_from_bool() {
        assert_eq!(TagMatch::from(true), TagMatch::All);
        assert_eq!(TagMatch::from(false), TagMatch::Any);
    }

    #[test]
    fn test_tag_set_dedupes_and_drops_blanks() {
        let tags = tag_set(&["a", "a", " ", "b "]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_tag_update_apply() {
        let mut tags = tag_set(&["a", "b"]);
        TagUpdate::Add(tag_set(&["b", "c"])).apply(&mut tags);
        assert_eq!(tags, tag_set(&["a", "b", "c"]));
        TagUpdate::Remove(tag_set(&["a", "z"])).apply(&mut tags);
        assert_eq!(tags, tag_set(&["b", "c"]));
        TagUpdate::Replace(tag_set(&["x"])).apply(&mut tags);
        assert_eq!(tags, tag_set(&["x"]));
    }

    // ==================== Entry Tests ====================

    #[test]
    fn test_push_version_prepends_and_truncates() {
        let mut entry = TranslationEntry::first("fr", record("v0", 0), None);
        for i in 1..5 {
            entry.push_version(record(&format!("v{}", i), i), 3, None);
        }
        assert_eq!(entry.value, "v4");
        assert_eq!(entry.versions.len(), 3);
        let values: Vec<_> = entry.versions.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["v4", "v3", "v2"]);
        assert_eq!(entry.latest().map(|v| v.value.as_str()), Some("v4"));
    }

    #[test]
    fn test_push_version_preserves_tags_when_omitted() {
        let mut entry = TranslationEntry::first("fr", record("v0", 0), Some(tag_set(&["ui"])));
        entry.push_version(record("v1", 1), 10, None);
        assert_eq!(entry.tags, tag_set(&["ui"]));
        entry.push_version(record("v2", 2), 10, Some(tag_set(&["email"])));
        assert_eq!(entry.tags, tag_set(&["email"]));
    }

    #[test]
    fn test_push_version_keeps_at_least_one() {
        let mut entry = TranslationEntry::first("fr", record("v0", 0), None);
        entry.push_version(record("v1", 1), 0, None);
        assert_eq!(entry.versions.len(), 1);
        assert_eq!(entry.versions[0].value, entry.value);
    }

    #[test]
    fn test_matches_tags() {
        let entry = TranslationEntry::first("fr", record("v0", 0), Some(tag_set(&["a", "b"])));
        assert!(entry.matches_tags(&tag_set(&["a", "b"]), TagMatch::All));
        assert!(!entry.matches_tags(&tag_set(&["a", "c"]), TagMatch::All));
        assert!(entry.matches_tags(&tag_set(&["a", "c"]), TagMatch::Any));
        assert!(!entry.matches_tags(&tag_set(&["c"]), TagMatch::Any));
        assert!(!entry.matches_tags(&BTreeSet::new(), TagMatch::Any));
    }
}

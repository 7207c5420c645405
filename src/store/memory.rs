//! In-process backend.

use super::Backend;
use crate::error::{Result, StoreError};
use crate::models::{Locale, TagMatch, TagUpdate, TranslationEntry, VersionRecord};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    /// Creation order
    locales: Vec<Locale>,
    entries: HashMap<String, BTreeMap<String, TranslationEntry>>,
}

/// Backend keeping everything in memory behind one async lock.
///
/// Every call holds the lock for its whole duration, so `append_version` is
/// atomic per document like a real database row update. The backend can be
/// flipped offline to exercise failure handling.
#[derive(Debug)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    available: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backend going away (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable(operation, "memory backend is offline"))
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn upsert_locale(&self, locale: &Locale) -> Result<()> {
        self.check("upsert_locale")?;
        let mut state = self.state.write().await;
        match state.locales.iter_mut().find(|l| l.code == locale.code) {
            Some(existing) => *existing = locale.clone(),
            None => state.locales.push(locale.clone()),
        }
        Ok(())
    }

    async fn update_locale(&self, locale: &Locale) -> Result<bool> {
        self.check("update_locale")?;
        let mut state = self.state.write().await;
        match state.locales.iter_mut().find(|l| l.code == locale.code) {
            Some(existing) => {
                *existing = locale.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_locale_if_absent(&self, locale: &Locale) -> Result<bool> {
        self.check("insert_locale_if_absent")?;
        let mut state = self.state.write().await;
        if state.locales.iter().any(|l| l.code == locale.code) {
            return Ok(false);
        }
        state.locales.push(locale.clone());
        Ok(true)
    }

    async fn delete_locale(&self, code: &str) -> Result<bool> {
        self.check("delete_locale")?;
        let mut state = self.state.write().await;
        let before = state.locales.len();
        state.locales.retain(|l| l.code != code);
        Ok(state.locales.len() != before)
    }

    async fn find_locale(&self, code: &str) -> Result<Option<Locale>> {
        self.check("find_locale")?;
        let state = self.state.read().await;
        Ok(state.locales.iter().find(|l| l.code == code).cloned())
    }

    async fn list_locales(&self) -> Result<Vec<Locale>> {
        self.check("list_locales")?;
        Ok(self.state.read().await.locales.clone())
    }

    async fn find_entry(&self, locale: &str, key: &str) -> Result<Option<TranslationEntry>> {
        self.check("find_entry")?;
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(locale)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn entry_exists(&self, locale: &str, key: &str) -> Result<bool> {
        self.check("entry_exists")?;
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(locale)
            .is_some_and(|entries| entries.contains_key(key)))
    }

    async fn append_version(
        &self,
        locale: &str,
        record: VersionRecord,
        max_versions: usize,
        tags: Option<BTreeSet<String>>,
    ) -> Result<TranslationEntry> {
        self.check("append_version")?;
        let mut state = self.state.write().await;
        let entries = state.entries.entry(locale.to_string()).or_default();
        let entry = match entries.get_mut(&record.key) {
            Some(entry) => {
                entry.push_version(record, max_versions, tags);
                entry.clone()
            }
            None => {
                let entry = TranslationEntry::first(locale, record, tags);
                entries.insert(entry.key.clone(), entry.clone());
                entry
            }
        };
        Ok(entry)
    }

    async fn delete_entry(&self, locale: &str, key: &str) -> Result<bool> {
        self.check("delete_entry")?;
        let mut state = self.state.write().await;
        Ok(state
            .entries
            .get_mut(locale)
            .is_some_and(|entries| entries.remove(key).is_some()))
    }

    async fn entries_for_locale(&self, locale: &str) -> Result<Vec<TranslationEntry>> {
        self.check("entries_for_locale")?;
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(locale)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn distinct_tags(&self, locale: Option<&str>) -> Result<BTreeSet<String>> {
        self.check("distinct_tags")?;
        let state = self.state.read().await;
        let tags = match locale {
            Some(locale) => state
                .entries
                .get(locale)
                .into_iter()
                .flat_map(|entries| entries.values())
                .flat_map(|entry| entry.tags.iter().cloned())
                .collect(),
            None => state
                .entries
                .values()
                .flat_map(|entries| entries.values())
                .flat_map(|entry| entry.tags.iter().cloned())
                .collect(),
        };
        Ok(tags)
    }

    async fn entries_by_tags(
        &self,
        locale: &str,
        tags: &BTreeSet<String>,
        mode: TagMatch,
    ) -> Result<Vec<TranslationEntry>> {
        self.check("entries_by_tags")?;
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(locale)
            .into_iter()
            .flat_map(|entries| entries.values())
            .filter(|entry| entry.matches_tags(tags, mode))
            .cloned()
            .collect())
    }

    async fn count_by_tags(
        &self,
        locale: &str,
        tags: &BTreeSet<String>,
        mode: TagMatch,
    ) -> Result<u64> {
        self.check("count_by_tags")?;
        let state = self.state.read().await;
        let count = state
            .entries
            .get(locale)
            .into_iter()
            .flat_map(|entries| entries.values())
            .filter(|entry| entry.matches_tags(tags, mode))
            .count();
        Ok(count as u64)
    }

    async fn modify_tags(&self, locale: &str, key: &str, update: &TagUpdate) -> Result<bool> {
        self.check("modify_tags")?;
        let mut state = self.state.write().await;
        match state
            .entries
            .get_mut(locale)
            .and_then(|entries| entries.get_mut(key))
        {
            Some(entry) => {
                update.apply(&mut entry.tags);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

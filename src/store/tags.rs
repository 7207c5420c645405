//! Tag-set queries scoped per locale.

use super::Backend;
use crate::error::Result;
use crate::models::{tag_set, TagMatch, TagUpdate, TranslationEntry};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Tag listing, querying and mutation over a shared backend.
pub struct TagIndex<B> {
    backend: Arc<B>,
}

impl<B: Backend> TagIndex<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Distinct tags, globally or within `locale`. Unknown locales yield an
    /// empty set.
    pub async fn list(&self, locale: Option<&str>) -> Result<BTreeSet<String>> {
        self.backend.distinct_tags(locale).await
    }

    pub async fn by_tag(&self, locale: &str, tag: &str) -> Result<BTreeMap<String, TranslationEntry>> {
        self.by_tags(locale, &[tag], TagMatch::Any).await
    }

    /// `key -> entry` for entries carrying all (`TagMatch::All`) or any
    /// (`TagMatch::Any`) of `tags`. No tags, no results.
    pub async fn by_tags<S: AsRef<str>>(
        &self,
        locale: &str,
        tags: &[S],
        mode: TagMatch,
    ) -> Result<BTreeMap<String, TranslationEntry>> {
        let tags = tag_set(tags);
        if tags.is_empty() {
            return Ok(BTreeMap::new());
        }
        let entries = self.backend.entries_by_tags(locale, &tags, mode).await?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect())
    }

    pub async fn count<S: AsRef<str>>(&self, locale: &str, tags: &[S], mode: TagMatch) -> Result<u64> {
        let tags = tag_set(tags);
        if tags.is_empty() {
            return Ok(0);
        }
        self.backend.count_by_tags(locale, &tags, mode).await
    }

    /// Set union; idempotent.
    pub async fn add_tags<S: AsRef<str>>(&self, locale: &str, key: &str, tags: &[S]) -> Result<bool> {
        self.modify(locale, key, TagUpdate::Add(tag_set(tags))).await
    }

    /// Wholesale replacement.
    pub async fn update_tags<S: AsRef<str>>(
        &self,
        locale: &str,
        key: &str,
        tags: &[S],
    ) -> Result<bool> {
        self.modify(locale, key, TagUpdate::Replace(tag_set(tags))).await
    }

    /// Set difference.
    pub async fn remove_tags<S: AsRef<str>>(
        &self,
        locale: &str,
        key: &str,
        tags: &[S],
    ) -> Result<bool> {
        self.modify(locale, key, TagUpdate::Remove(tag_set(tags))).await
    }

    async fn modify(&self, locale: &str, key: &str, update: TagUpdate) -> Result<bool> {
        let changed = self.backend.modify_tags(locale, key, &update).await?;
        if !changed {
            debug!(locale, key, "Tag update skipped, entry does not exist");
        }
        Ok(changed)
    }
}

//! Versioned CRUD over `(locale, key) -> value`.

use super::Backend;
use crate::error::{require_key, require_locale, Result};
use crate::models::{tag_set, TranslationEntry, VersionMeta, VersionRecord, VersionSelector};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// One criterion of a [`VersionSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    VersionTag,
    UserId,
    Timestamp,
}

/// Precedence used when one version satisfies several criteria. Among
/// different versions the newest always wins regardless of criterion.
pub const CRITERION_RANK: [Criterion; 3] =
    [Criterion::VersionTag, Criterion::UserId, Criterion::Timestamp];

impl Criterion {
    fn matches(self, selector: &VersionSelector, version: &VersionRecord) -> bool {
        match self {
            Self::VersionTag => selector
                .version_tag
                .as_deref()
                .is_some_and(|tag| version.tag.as_deref() == Some(tag)),
            Self::UserId => selector
                .user_id
                .as_deref()
                .is_some_and(|user| version.user_id == user),
            Self::Timestamp => selector
                .timestamp
                .is_some_and(|bound| version.timestamp <= bound),
        }
    }
}

/// Single pass over a newest-first version list: the first version satisfying
/// any present criterion, together with the highest-ranked criterion it met.
pub fn select_version<'a>(
    versions: &'a [VersionRecord],
    selector: &VersionSelector,
) -> Option<(&'a VersionRecord, Criterion)> {
    versions.iter().find_map(|version| {
        CRITERION_RANK
            .iter()
            .find(|criterion| criterion.matches(selector, version))
            .map(|criterion| (version, *criterion))
    })
}

/// Versioned entry operations over a shared backend.
pub struct VersionedEntryStore<B> {
    backend: Arc<B>,
    max_versions: usize,
}

impl<B: Backend> VersionedEntryStore<B> {
    pub fn new(backend: Arc<B>, max_versions: usize) -> Self {
        Self {
            backend,
            max_versions: max_versions.max(1),
        }
    }

    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// Current value, or the value picked by `selector`. A selector that
    /// matches no version falls back to the current value.
    pub async fn get(
        &self,
        locale: &str,
        key: &str,
        selector: Option<&VersionSelector>,
    ) -> Result<Option<String>> {
        let Some(entry) = self.backend.find_entry(locale, key).await? else {
            return Ok(None);
        };
        let selector = selector.filter(|s| !s.is_empty());
        if let Some(selector) = selector {
            if let Some((version, criterion)) = select_version(&entry.versions, selector) {
                debug!(locale, key, ?criterion, "Selected historical version");
                return Ok(Some(version.value.clone()));
            }
            debug!(locale, key, "No version matched selector, using current value");
        }
        Ok(Some(entry.value))
    }

    /// Full entry including history and tags.
    pub async fn entry(&self, locale: &str, key: &str) -> Result<Option<TranslationEntry>> {
        self.backend.find_entry(locale, key).await
    }

    /// Record a new version. Tags are replaced only when supplied.
    ///
    /// Does not register the locale; callers that want write-through
    /// provisioning use [`super::LocaleRegistry::ensure`] first.
    pub async fn set(
        &self,
        locale: &str,
        key: &str,
        value: &str,
        meta: &VersionMeta,
        tags: Option<&[String]>,
    ) -> Result<TranslationEntry> {
        require_locale(locale)?;
        require_key(key)?;
        let record = meta.record(key, value);
        let entry = self
            .backend
            .append_version(locale, record, self.max_versions, tags.map(tag_set))
            .await?;
        debug!(
            locale,
            key,
            user_id = %meta.user_id,
            versions = entry.versions.len(),
            "Stored translation version"
        );
        Ok(entry)
    }

    /// False for any absence, never an error.
    pub async fn remove(&self, locale: &str, key: &str) -> Result<bool> {
        self.backend.delete_entry(locale, key).await
    }

    /// Newest-first version list.
    pub async fn history(&self, locale: &str, key: &str) -> Result<Option<Vec<VersionRecord>>> {
        Ok(self
            .backend
            .find_entry(locale, key)
            .await?
            .map(|entry| entry.versions))
    }

    pub async fn latest(&self, locale: &str, key: &str) -> Result<Option<VersionRecord>> {
        Ok(self
            .backend
            .find_entry(locale, key)
            .await?
            .and_then(|entry| entry.versions.into_iter().next()))
    }

    pub async fn exists(
        &self,
        locale: &str,
        key: &str,
        selector: Option<&VersionSelector>,
    ) -> Result<bool> {
        match selector.filter(|s| !s.is_empty()) {
            Some(selector) => Ok(self.get(locale, key, Some(selector)).await?.is_some()),
            None => self.backend.entry_exists(locale, key).await,
        }
    }

    /// `key -> current value` for a registered locale.
    pub async fn all_for_locale(&self, locale: &str) -> Result<Option<BTreeMap<String, String>>> {
        if self.backend.find_locale(locale).await?.is_none() {
            return Ok(None);
        }
        let entries = self.backend.entries_for_locale(locale).await?;
        Ok(Some(
            entries
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
        ))
    }
}

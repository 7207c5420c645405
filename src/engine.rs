//! Translation engine: the single entry point for callers.
//!
//! Composes the entry store, tag index and locale registry over one backend,
//! keeps the optional [`TranslationCache`] in step with writes, and renders
//! values through plural selection and interpolation.

use crate::cache::TranslationCache;
use crate::error::{require_key, require_locale, Result, StoreError};
use crate::i18n::interpolate::{DEFAULT_PREFIX, DEFAULT_SUFFIX};
use crate::i18n::plural::{pluralize, DEFAULT_SEPARATOR};
use crate::i18n::{Interpolator, Node, Vars};
use crate::models::{
    Locale, TagMatch, TranslationEntry, VersionMeta, VersionRecord, VersionSelector,
    DEFAULT_MAX_VERSIONS,
};
use crate::store::{Backend, LocaleRegistry, TagIndex, VersionedEntryStore};
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Engine behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub max_versions: usize,

    /// Register unknown locales as placeholders before writing to them
    pub auto_provision_locales: bool,

    pub plural_separator: String,
    pub placeholder_prefix: String,
    pub placeholder_suffix: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_versions: DEFAULT_MAX_VERSIONS,
            auto_provision_locales: true,
            plural_separator: DEFAULT_SEPARATOR.to_string(),
            placeholder_prefix: DEFAULT_PREFIX.to_string(),
            placeholder_suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

/// Per-call options for [`TranslationEngine::translate`].
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub count: Option<i64>,
    pub default: Option<String>,
    pub vars: Vars,
    pub selector: Option<VersionSelector>,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn selector(mut self, selector: VersionSelector) -> Self {
        self.selector = Some(selector);
        self
    }
}

pub struct TranslationEngine<B> {
    backend: Arc<B>,
    entries: VersionedEntryStore<B>,
    tags: TagIndex<B>,
    locales: LocaleRegistry<B>,
    cache: Option<Arc<TranslationCache>>,
    interpolator: Interpolator,
    options: EngineOptions,
}

impl<B: Backend> TranslationEngine<B> {
    /// Build the engine and, when a cache is supplied, preload every known
    /// locale into it.
    pub async fn init(
        backend: Arc<B>,
        options: EngineOptions,
        cache: Option<Arc<TranslationCache>>,
    ) -> Result<Self> {
        let interpolator =
            Interpolator::new(&options.placeholder_prefix, &options.placeholder_suffix)?;
        let engine = Self {
            entries: VersionedEntryStore::new(backend.clone(), options.max_versions),
            tags: TagIndex::new(backend.clone()),
            locales: LocaleRegistry::new(backend.clone()),
            backend,
            cache,
            interpolator,
            options,
        };
        engine.preload_cache().await?;
        Ok(engine)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_deref()
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// `(code, key -> value)` for every registered locale, read in parallel.
    async fn snapshot(&self) -> Result<Vec<(String, BTreeMap<String, String>)>> {
        let codes = self.locales.list().await?;
        let loads = codes.iter().map(|code| async move {
            let values = self.entries.all_for_locale(code).await?;
            Ok::<_, StoreError>(values.map(|values| (code.clone(), values)))
        });
        Ok(try_join_all(loads).await?.into_iter().flatten().collect())
    }

    async fn preload_cache(&self) -> Result<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let loaded = cache.replace_with(self.snapshot()).await?;
        info!("Translation cache preloaded {} locale(s)", loaded);
        Ok(())
    }

    /// Rebuild the mirror from the store. Writes issued while the reload is
    /// running are applied on top of the fresh snapshot.
    pub async fn reload_cache(&self) -> Result<()> {
        self.preload_cache().await
    }

    // ==================== Rendering ====================

    /// Render `key` for `locale`. Never fails: store faults and misses fall
    /// through to the default and finally to the key itself.
    pub async fn translate(&self, locale: &str, key: &str, options: &TranslateOptions) -> String {
        let mut value = match self.resolve(locale, key, options.selector.as_ref()).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(locale, key, "Lookup failed, rendering fallback: {}", e);
                String::new()
            }
        };
        trace!(locale, key, found = !value.is_empty(), "Resolved value");

        if let Some(count) = options.count {
            value = pluralize(&value, &self.options.plural_separator, count, locale);
        }

        if value.is_empty() {
            if let Some(default) = &options.default {
                value = default.clone();
            }
        }

        if value.is_empty() {
            debug!(locale, key, "No translation, falling back to key");
            value = key.to_string();
        }

        match options.count {
            Some(count) if !options.vars.contains_key("count") => {
                let mut vars = options.vars.clone();
                vars.insert("count".to_string(), Value::from(count));
                self.interpolator.interpolate(&value, &vars)
            }
            _ => self.interpolator.interpolate(&value, &options.vars),
        }
    }

    /// Cache-or-store lookup. Selectors always go to the store.
    async fn resolve(
        &self,
        locale: &str,
        key: &str,
        selector: Option<&VersionSelector>,
    ) -> Result<Option<String>> {
        let selector = selector.filter(|s| !s.is_empty());
        if selector.is_none() {
            if let Some(cache) = &self.cache {
                if let Some(value) = cache.get(locale, key).await {
                    return Ok(Some(value));
                }
            }
        }
        self.entries.get(locale, key, selector).await
    }

    // ==================== Entries ====================

    pub async fn get_translation(
        &self,
        locale: &str,
        key: &str,
        selector: Option<&VersionSelector>,
    ) -> Result<Option<String>> {
        self.resolve(locale, key, selector).await
    }

    /// Commit every leaf of `tree` under one shared [`VersionMeta`].
    ///
    /// # Returns
    /// The number of leaves written.
    pub async fn add_translations(
        &self,
        locale: &str,
        tree: &Node,
        user_id: &str,
        version_tag: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<usize> {
        require_locale(locale)?;
        let meta = VersionMeta::now(user_id).with_tag(version_tag);
        let leaves = tree.flatten();
        if leaves.is_empty() {
            return Ok(0);
        }
        for (key, _) in &leaves {
            require_key(key)?;
        }
        self.provision(locale).await?;

        for (key, value) in &leaves {
            self.entries.set(locale, key, value, &meta, tags).await?;
            if let Some(cache) = &self.cache {
                cache.patch(locale, key, value).await;
            }
        }
        info!(locale, user_id, "Added {} translation(s)", leaves.len());
        Ok(leaves.len())
    }

    /// Write one value as a new version.
    pub async fn update_translation(
        &self,
        locale: &str,
        key: &str,
        value: &str,
        user_id: &str,
        version_tag: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<TranslationEntry> {
        let meta = VersionMeta::now(user_id).with_tag(version_tag);
        self.commit(locale, key, value, &meta, tags).await
    }

    pub(crate) async fn commit(
        &self,
        locale: &str,
        key: &str,
        value: &str,
        meta: &VersionMeta,
        tags: Option<&[String]>,
    ) -> Result<TranslationEntry> {
        require_locale(locale)?;
        self.provision(locale).await?;
        let entry = self.entries.set(locale, key, value, meta, tags).await?;
        if let Some(cache) = &self.cache {
            cache.patch(locale, key, value).await;
        }
        Ok(entry)
    }

    /// Delete an entry and its history.
    pub async fn remove_translation(&self, locale: &str, key: &str) -> Result<bool> {
        let removed = self.entries.remove(locale, key).await?;
        if removed {
            if let Some(cache) = &self.cache {
                cache.evict(locale, key).await;
            }
        }
        Ok(removed)
    }

    pub async fn translation_exists(
        &self,
        locale: &str,
        key: &str,
        selector: Option<&VersionSelector>,
    ) -> Result<bool> {
        self.entries.exists(locale, key, selector).await
    }

    pub async fn history(&self, locale: &str, key: &str) -> Result<Option<Vec<VersionRecord>>> {
        self.entries.history(locale, key).await
    }

    pub async fn latest(&self, locale: &str, key: &str) -> Result<Option<VersionRecord>> {
        self.entries.latest(locale, key).await
    }

    pub async fn entry(&self, locale: &str, key: &str) -> Result<Option<TranslationEntry>> {
        self.entries.entry(locale, key).await
    }

    pub async fn translations_for_locale(
        &self,
        locale: &str,
    ) -> Result<Option<BTreeMap<String, String>>> {
        self.entries.all_for_locale(locale).await
    }

    /// Current values of `locale` as a nested tree.
    pub async fn export_locale(&self, locale: &str) -> Result<Option<Node>> {
        Ok(self
            .entries
            .all_for_locale(locale)
            .await?
            .map(Node::unflatten))
    }

    async fn provision(&self, locale: &str) -> Result<()> {
        if self.options.auto_provision_locales {
            self.locales.ensure(locale).await?;
        }
        Ok(())
    }

    // ==================== Tags ====================

    pub async fn list_all_tags(&self, locale: Option<&str>) -> Result<BTreeSet<String>> {
        self.tags.list(locale).await
    }

    pub async fn translations_by_tag(
        &self,
        locale: &str,
        tag: &str,
    ) -> Result<BTreeMap<String, TranslationEntry>> {
        self.tags.by_tag(locale, tag).await
    }

    pub async fn translations_by_tags<S: AsRef<str>>(
        &self,
        locale: &str,
        tags: &[S],
        mode: TagMatch,
    ) -> Result<BTreeMap<String, TranslationEntry>> {
        self.tags.by_tags(locale, tags, mode).await
    }

    pub async fn count_by_tags<S: AsRef<str>>(
        &self,
        locale: &str,
        tags: &[S],
        mode: TagMatch,
    ) -> Result<u64> {
        self.tags.count(locale, tags, mode).await
    }

    pub async fn add_tags<S: AsRef<str>>(&self, locale: &str, key: &str, tags: &[S]) -> Result<bool> {
        self.tags.add_tags(locale, key, tags).await
    }

    pub async fn update_tags<S: AsRef<str>>(
        &self,
        locale: &str,
        key: &str,
        tags: &[S],
    ) -> Result<bool> {
        self.tags.update_tags(locale, key, tags).await
    }

    pub async fn remove_tags<S: AsRef<str>>(
        &self,
        locale: &str,
        key: &str,
        tags: &[S],
    ) -> Result<bool> {
        self.tags.remove_tags(locale, key, tags).await
    }

    // ==================== Locales ====================

    pub async fn add_locale(&self, locale: &Locale) -> Result<bool> {
        self.locales.add(locale).await
    }

    pub async fn update_locale(&self, locale: &Locale) -> Result<bool> {
        self.locales.update(locale).await
    }

    /// Unregister a locale. Its entries stay in the store; its mirror is
    /// dropped.
    pub async fn remove_locale(&self, code: &str) -> Result<bool> {
        let removed = self.locales.remove(code).await?;
        if removed {
            if let Some(cache) = &self.cache {
                cache.evict_locale(code).await;
            }
        }
        Ok(removed)
    }

    pub async fn get_locale(&self, code: &str) -> Result<Option<Locale>> {
        self.locales.get(code).await
    }

    pub async fn list_locales(&self) -> Result<Vec<String>> {
        self.locales.list().await
    }

    pub async fn list_locales_detailed(&self) -> Result<Vec<Locale>> {
        self.locales.list_detailed().await
    }

    pub async fn ensure_locale(&self, code: &str) -> Result<bool> {
        self.locales.ensure(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use serde_json::json;

    async fn engine(cache: bool) -> TranslationEngine<MemoryBackend> {
        let cache = cache.then(|| Arc::new(TranslationCache::new()));
        TranslationEngine::init(Arc::new(MemoryBackend::new()), EngineOptions::default(), cache)
            .await
            .unwrap()
    }

    fn tree(value: serde_json::Value) -> Node {
        Node::from_json(&value).unwrap()
    }

    // ==================== init Tests ====================

    #[tokio::test]
    async fn test_init_preloads_known_locales() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let seed = TranslationEngine::init(backend.clone(), EngineOptions::default(), None)
                .await
                .unwrap();
            seed.add_translations("fr", &tree(json!({"a": {"b": "x"}})), "u1", None, None)
                .await
                .unwrap();
        }

        let cache = Arc::new(TranslationCache::new());
        let engine =
            TranslationEngine::init(backend, EngineOptions::default(), Some(cache.clone()))
                .await
                .unwrap();
        assert!(cache.is_loaded("fr").await);
        assert_eq!(engine.translate("fr", "a.b", &TranslateOptions::new()).await, "x");
        assert_eq!(cache.metrics().hits(), 1);
    }

    #[tokio::test]
    async fn test_init_rejects_empty_delimiters() {
        let options = EngineOptions {
            placeholder_prefix: String::new(),
            ..EngineOptions::default()
        };
        let result = TranslationEngine::init(Arc::new(MemoryBackend::new()), options, None).await;
        assert!(result.is_err());
    }

    // ==================== translate Tests ====================

    #[tokio::test]
    async fn test_translate_falls_back_to_default_then_key() {
        let engine = engine(true).await;
        let opts = TranslateOptions::new().default_value("Fallback");
        assert_eq!(engine.translate("fr", "missing", &opts).await, "Fallback");
        assert_eq!(engine.translate("fr", "missing", &TranslateOptions::new()).await, "missing");
    }

    #[tokio::test]
    async fn test_translate_plural_and_count_injection() {
        let engine = engine(true).await;
        engine
            .update_translation("ru", "files", "{{count}} файл|{{count}} файла|{{count}} файлов", "u1", None, None)
            .await
            .unwrap();
        let render = |n| TranslateOptions::new().count(n);
        assert_eq!(engine.translate("ru", "files", &render(1)).await, "1 файл");
        assert_eq!(engine.translate("ru", "files", &render(3)).await, "3 файла");
        assert_eq!(engine.translate("ru", "files", &render(11)).await, "11 файлов");
    }

    #[tokio::test]
    async fn test_translate_explicit_count_var_wins() {
        let engine = engine(false).await;
        engine
            .update_translation("en", "n", "{{count}} thing|{{count}} things", "u1", None, None)
            .await
            .unwrap();
        let opts = TranslateOptions::new().count(2).var("count", "two");
        assert_eq!(engine.translate("en", "n", &opts).await, "two things");
    }

    #[tokio::test]
    async fn test_translate_interpolates_default() {
        let engine = engine(false).await;
        let opts = TranslateOptions::new()
            .default_value("Hi {{name}}")
            .var("name", "Ann");
        assert_eq!(engine.translate("en", "missing", &opts).await, "Hi Ann");
    }

    #[tokio::test]
    async fn test_translate_survives_backend_outage() {
        let backend = Arc::new(MemoryBackend::new());
        let engine = TranslationEngine::init(backend.clone(), EngineOptions::default(), None)
            .await
            .unwrap();
        backend.set_available(false);
        assert_eq!(engine.translate("en", "a.b", &TranslateOptions::new()).await, "a.b");
    }

    #[tokio::test]
    async fn test_cache_miss_reads_store_without_populating() {
        let engine = engine(true).await;
        engine.update_translation("en", "seen", "cached", "u1", None, None).await.unwrap();
        engine
            .entries
            .set("en", "direct.key", "direct", &VersionMeta::now("u1"), None)
            .await
            .unwrap();

        let cache = engine.cache().unwrap();
        let misses_before = cache.metrics().misses();
        assert_eq!(
            engine.translate("en", "direct.key", &TranslateOptions::new()).await,
            "direct"
        );
        assert_eq!(cache.metrics().misses(), misses_before + 1);

        let tree = cache.locale_tree("en").await.unwrap();
        assert_eq!(tree.read("seen"), Some("cached"));
        assert_eq!(tree.read("direct.key"), None);

        // A second read misses again
        engine.translate("en", "direct.key", &TranslateOptions::new()).await;
        assert_eq!(cache.metrics().misses(), misses_before + 2);
    }

    #[tokio::test]
    async fn test_translate_with_selector_bypasses_cache() {
        let engine = engine(true).await;
        engine
            .update_translation("en", "k", "first", "u1", Some("v1"), None)
            .await
            .unwrap();
        engine.update_translation("en", "k", "second", "u2", None, None).await.unwrap();

        let cache = engine.cache().unwrap();
        let hits_before = cache.metrics().hits();
        let opts = TranslateOptions::new().selector(VersionSelector::by_tag("v1"));
        assert_eq!(engine.translate("en", "k", &opts).await, "first");
        assert_eq!(cache.metrics().hits(), hits_before);
        assert_eq!(cache.metrics().misses(), 0);
    }

    // ==================== write Tests ====================

    #[tokio::test]
    async fn test_add_translations_commits_every_leaf() {
        let engine = engine(true).await;
        let added = engine
            .add_translations(
                "de",
                &tree(json!({"home": {"title": "Start", "body": "Text"}, "bye": "Tschüss"})),
                "u1",
                Some("import"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(added, 3);
        assert_eq!(engine.list_locales().await.unwrap(), vec!["de"]);

        let all = engine.translations_for_locale("de").await.unwrap().unwrap();
        assert_eq!(all.len(), 3);
        let latest = engine.latest("de", "home.title").await.unwrap().unwrap();
        assert_eq!(latest.tag.as_deref(), Some("import"));
        assert_eq!(latest.user_id, "u1");
    }

    #[tokio::test]
    async fn test_add_translations_shares_one_timestamp() {
        let engine = engine(false).await;
        engine
            .add_translations("de", &tree(json!({"a": "1", "b": "2"})), "u1", None, None)
            .await
            .unwrap();
        let a = engine.latest("de", "a").await.unwrap().unwrap();
        let b = engine.latest("de", "b").await.unwrap().unwrap();
        assert_eq!(a.timestamp, b.timestamp);
    }

    #[tokio::test]
    async fn test_add_translations_empty_tree() {
        let engine = engine(false).await;
        let added = engine.add_translations("de", &Node::branch(), "u1", None, None).await.unwrap();
        assert_eq!(added, 0);
        assert!(engine.list_locales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_translations_rejects_bad_key_before_writing() {
        let engine = engine(true).await;
        let mut bundle = Node::branch();
        bundle.write("ok", "fine");
        bundle.write("z..b", "broken");

        let result = engine.add_translations("de", &bundle, "u1", None, None).await;
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
        assert!(engine.list_locales().await.unwrap().is_empty());
        assert!(!engine.translation_exists("de", "ok", None).await.unwrap());
        assert!(!engine.cache().unwrap().is_loaded("de").await);
    }

    #[tokio::test]
    async fn test_auto_provision_can_be_disabled() {
        let options = EngineOptions {
            auto_provision_locales: false,
            ..EngineOptions::default()
        };
        let engine = TranslationEngine::init(Arc::new(MemoryBackend::new()), options, None)
            .await
            .unwrap();
        engine.update_translation("it", "k", "v", "u1", None, None).await.unwrap();
        assert!(engine.get_locale("it").await.unwrap().is_none());
        assert_eq!(
            engine.get_translation("it", "k", None).await.unwrap().as_deref(),
            Some("v")
        );
    }

    #[tokio::test]
    async fn test_remove_translation_evicts_cache() {
        let engine = engine(true).await;
        engine.update_translation("en", "a.b", "x", "u1", None, None).await.unwrap();
        assert!(engine.remove_translation("en", "a.b").await.unwrap());
        assert_eq!(engine.get_translation("en", "a.b", None).await.unwrap(), None);
        assert!(!engine.translation_exists("en", "a.b", None).await.unwrap());
        assert!(!engine.remove_translation("en", "a.b").await.unwrap());
    }

    // ==================== locale Tests ====================

    #[tokio::test]
    async fn test_remove_locale_keeps_entries() {
        let engine = engine(true).await;
        engine.update_translation("fr", "k", "v", "u1", None, None).await.unwrap();
        assert!(engine.remove_locale("fr").await.unwrap());
        assert!(!engine.cache().unwrap().is_loaded("fr").await);
        assert_eq!(engine.translations_for_locale("fr").await.unwrap(), None);
        assert_eq!(engine.get_translation("fr", "k", None).await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_export_locale() {
        let engine = engine(false).await;
        let bundle = tree(json!({"a": {"b": "1", "c": "2"}}));
        engine.add_translations("fr", &bundle, "u1", None, None).await.unwrap();
        assert_eq!(engine.export_locale("fr").await.unwrap(), Some(bundle));
        assert_eq!(engine.export_locale("zz").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reload_cache() {
        let engine = engine(true).await;
        engine.update_translation("fr", "k", "v", "u1", None, None).await.unwrap();
        let cache = engine.cache().unwrap();
        cache.clear().await;
        engine.reload_cache().await.unwrap();
        assert_eq!(cache.locale_tree("fr").await, Some(Node::unflatten([("k", "v")])));
    }

    #[tokio::test]
    async fn test_reload_cache_picks_up_direct_writes() {
        let engine = engine(true).await;
        engine.update_translation("fr", "k", "v1", "u1", None, None).await.unwrap();
        engine
            .entries
            .set("fr", "k", "v2", &VersionMeta::now("u2"), None)
            .await
            .unwrap();
        assert_eq!(engine.translate("fr", "k", &TranslateOptions::new()).await, "v1");

        engine.reload_cache().await.unwrap();
        assert_eq!(engine.translate("fr", "k", &TranslateOptions::new()).await, "v2");
    }

    #[tokio::test]
    async fn test_write_during_reload_survives() {
        let engine = engine(true).await;
        engine.update_translation("fr", "k", "before", "u1", None, None).await.unwrap();

        let (reloaded, written) = tokio::join!(
            engine.reload_cache(),
            engine.update_translation("fr", "k", "after", "u2", None, None),
        );
        reloaded.unwrap();
        written.unwrap();

        assert_eq!(
            engine.cache().unwrap().get("fr", "k").await.as_deref(),
            Some("after")
        );
    }
}

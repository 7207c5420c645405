//! In-process mirror of current translation values.
//!
//! The mirror holds one [`Node`] tree per locale. It is never authoritative:
//! it is filled by explicit loads and patched by writes routed through the
//! engine, and a read miss does not populate it.

use crate::i18n::Node;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use tokio::sync::RwLock;
use tracing::debug;

mod metrics;

pub use metrics::{CacheMetrics, MetricsReport};

#[derive(Debug, Default)]
pub struct TranslationCache {
    trees: RwLock<HashMap<String, Node>>,
    metrics: CacheMetrics,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mirror with the locales produced by `snapshot`.
    ///
    /// The write lock is taken before `snapshot` is polled and held until the
    /// new trees are in place, so a [`patch`](Self::patch) racing the reload
    /// lands after it and is never overwritten by older data. Reads wait for
    /// the reload to finish. On error the current mirror is left untouched.
    ///
    /// # Returns
    /// The number of locales loaded.
    pub async fn replace_with<F, E>(&self, snapshot: F) -> Result<usize, E>
    where
        F: Future<Output = Result<Vec<(String, BTreeMap<String, String>)>, E>>,
    {
        let mut trees = self.trees.write().await;
        let locales = snapshot.await?;
        trees.clear();
        for (locale, values) in &locales {
            let tree = Node::unflatten(values.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            trees.insert(locale.clone(), tree);
            self.metrics.record_load();
        }
        debug!(locales = locales.len(), "Cache replaced");
        Ok(locales.len())
    }

    /// Current value from the mirror, counting the hit or miss.
    pub async fn get(&self, locale: &str, key: &str) -> Option<String> {
        let value = self
            .trees
            .read()
            .await
            .get(locale)
            .and_then(|tree| tree.read(key))
            .map(str::to_string);
        match value {
            Some(_) => self.metrics.record_hit(),
            None => self.metrics.record_miss(),
        }
        value
    }

    /// Mirror a successful write.
    pub async fn patch(&self, locale: &str, key: &str, value: &str) {
        self.trees
            .write()
            .await
            .entry(locale.to_string())
            .or_default()
            .write(key, value);
        self.metrics.record_patch();
    }

    /// Mirror a successful removal.
    pub async fn evict(&self, locale: &str, key: &str) {
        if let Some(tree) = self.trees.write().await.get_mut(locale) {
            tree.remove(key);
        }
        self.metrics.record_patch();
    }

    /// Drop the whole mirror of `locale`.
    pub async fn evict_locale(&self, locale: &str) -> bool {
        self.trees.write().await.remove(locale).is_some()
    }

    pub async fn is_loaded(&self, locale: &str) -> bool {
        self.trees.read().await.contains_key(locale)
    }

    /// Snapshot of the mirrored tree for `locale`.
    pub async fn locale_tree(&self, locale: &str) -> Option<Node> {
        self.trees.read().await.get(locale).cloned()
    }

    /// Drop everything (teardown).
    pub async fn clear(&self) {
        self.trees.write().await.clear();
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn load(cache: &TranslationCache, locale: &str, pairs: &[(&str, &str)]) {
        let snapshot = vec![(locale.to_string(), values(pairs))];
        cache
            .replace_with(async { Ok::<_, ()>(snapshot) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_and_get() {
        let cache = TranslationCache::new();
        load(&cache, "fr", &[("home.title", "Accueil"), ("bye", "Salut")]).await;

        assert_eq!(cache.get("fr", "home.title").await.as_deref(), Some("Accueil"));
        assert_eq!(cache.get("fr", "home").await, None);
        assert_eq!(cache.get("de", "bye").await, None);

        let report = cache.metrics().report();
        assert_eq!(report.hits, 1);
        assert_eq!(report.misses, 2);
        assert_eq!(report.loads, 1);
    }

    #[tokio::test]
    async fn test_patch_creates_locale_tree() {
        let cache = TranslationCache::new();
        assert!(!cache.is_loaded("es").await);
        cache.patch("es", "a.b", "hola").await;
        assert!(cache.is_loaded("es").await);
        assert_eq!(cache.get("es", "a.b").await.as_deref(), Some("hola"));
    }

    #[tokio::test]
    async fn test_patch_replaces_leaf_with_branch() {
        let cache = TranslationCache::new();
        cache.patch("es", "a", "leaf").await;
        cache.patch("es", "a.b", "nested").await;
        assert_eq!(cache.get("es", "a").await, None);
        assert_eq!(cache.get("es", "a.b").await.as_deref(), Some("nested"));
    }

    #[tokio::test]
    async fn test_evict() {
        let cache = TranslationCache::new();
        load(&cache, "fr", &[("a.b", "1"), ("a.c", "2")]).await;
        cache.evict("fr", "a.b").await;
        assert_eq!(cache.get("fr", "a.b").await, None);
        assert_eq!(cache.get("fr", "a.c").await.as_deref(), Some("2"));

        assert!(cache.evict_locale("fr").await);
        assert!(!cache.evict_locale("fr").await);
    }

    #[tokio::test]
    async fn test_replace_with_swaps_everything() {
        let cache = TranslationCache::new();
        cache.patch("de", "old", "x").await;
        let loaded = cache
            .replace_with(async {
                Ok::<_, std::convert::Infallible>(vec![("fr".to_string(), values(&[("a.b", "1")]))])
            })
            .await
            .unwrap();
        assert_eq!(loaded, 1);
        assert!(!cache.is_loaded("de").await);
        assert_eq!(cache.get("fr", "a.b").await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_replace_with_error_keeps_mirror() {
        let cache = TranslationCache::new();
        cache.patch("de", "k", "v").await;
        let result = cache.replace_with(async { Err::<Vec<_>, _>("store down") }).await;
        assert_eq!(result, Err("store down"));
        assert_eq!(cache.get("de", "k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_patch_during_reload_is_not_lost() {
        let cache = TranslationCache::new();
        let stale = values(&[("k", "old")]);

        // The snapshot yields once, so the patch is attempted while it is pending.
        let (loaded, ()) = tokio::join!(
            cache.replace_with(async {
                tokio::task::yield_now().await;
                Ok::<_, std::convert::Infallible>(vec![("fr".to_string(), stale.clone())])
            }),
            cache.patch("fr", "k", "new"),
        );

        assert_eq!(loaded.unwrap(), 1);
        assert_eq!(cache.get("fr", "k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = TranslationCache::new();
        cache.patch("fr", "k", "v").await;
        cache.clear().await;
        assert!(!cache.is_loaded("fr").await);
        assert!(cache.locale_tree("fr").await.is_none());
    }
}

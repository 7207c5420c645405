//! Persistence layer.
//!
//! # Architecture
//!
//! - [`Backend`]: primitive operations a persistence engine must provide
//! - `memory`: in-process backend (tests, embedding)
//! - `postgres`: PostgreSQL backend over `sqlx`
//! - `entries`: versioned CRUD and version selection
//! - `tags`: tag listing, querying and mutation
//! - `locales`: locale registry
//!
//! The three facades share one backend through an `Arc` and hold no state of
//! their own beyond configuration.

use crate::error::Result;
use crate::models::{Locale, TagMatch, TagUpdate, TranslationEntry, VersionRecord};
use async_trait::async_trait;
use std::collections::BTreeSet;

mod entries;
mod locales;
mod memory;
mod postgres;
mod tags;

pub use entries::{select_version, Criterion, VersionedEntryStore, CRITERION_RANK};
pub use locales::LocaleRegistry;
pub use memory::MemoryBackend;
pub use postgres::PgBackend;
pub use tags::TagIndex;

/// Storage primitives. Absence is reported through `Option`/`bool`; an `Err`
/// always means the backend itself failed.
#[async_trait]
pub trait Backend: Send + Sync {
    // ==================== Locales ====================

    /// Insert or overwrite name/native name. Creation order is kept for
    /// existing codes.
    async fn upsert_locale(&self, locale: &Locale) -> Result<()>;

    /// Overwrite an existing row; false if the code is unknown.
    async fn update_locale(&self, locale: &Locale) -> Result<bool>;

    /// Insert only if absent; true if a row was created.
    async fn insert_locale_if_absent(&self, locale: &Locale) -> Result<bool>;

    async fn delete_locale(&self, code: &str) -> Result<bool>;

    async fn find_locale(&self, code: &str) -> Result<Option<Locale>>;

    /// All locales in creation order.
    async fn list_locales(&self) -> Result<Vec<Locale>>;

    // ==================== Entries ====================

    async fn find_entry(&self, locale: &str, key: &str) -> Result<Option<TranslationEntry>>;

    async fn entry_exists(&self, locale: &str, key: &str) -> Result<bool>;

    /// Atomically prepend `record` to the entry for `(locale, record.key)`,
    /// creating it if needed, truncating history to `max_versions` and
    /// replacing tags only when `tags` is supplied.
    async fn append_version(
        &self,
        locale: &str,
        record: VersionRecord,
        max_versions: usize,
        tags: Option<BTreeSet<String>>,
    ) -> Result<TranslationEntry>;

    async fn delete_entry(&self, locale: &str, key: &str) -> Result<bool>;

    /// Every entry stored under `locale`, ordered by key.
    async fn entries_for_locale(&self, locale: &str) -> Result<Vec<TranslationEntry>>;

    // ==================== Tags ====================

    /// Distinct tags across all locales, or within one.
    async fn distinct_tags(&self, locale: Option<&str>) -> Result<BTreeSet<String>>;

    /// Entries of `locale` matching `tags` under `mode`. `tags` is non-empty.
    async fn entries_by_tags(
        &self,
        locale: &str,
        tags: &BTreeSet<String>,
        mode: TagMatch,
    ) -> Result<Vec<TranslationEntry>>;

    /// Same predicate as [`Backend::entries_by_tags`] without materializing.
    async fn count_by_tags(
        &self,
        locale: &str,
        tags: &BTreeSet<String>,
        mode: TagMatch,
    ) -> Result<u64>;

    /// Apply a tag mutation; false if the entry does not exist.
    async fn modify_tags(&self, locale: &str, key: &str, update: &TagUpdate) -> Result<bool>;
}

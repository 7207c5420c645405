//! PostgreSQL backend.
//!
//! Locales and entries live in two tables. Entries carry their version history
//! as a JSONB array (newest first) and their tags as `TEXT[]` with a GIN index,
//! so tag predicates (`@>` for AND, `&&` for OR) and counts run in SQL.

use super::Backend;
use crate::error::{Result, StoreError};
use crate::models::{Locale, TagMatch, TagUpdate, TranslationEntry, VersionRecord};
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::BTreeSet;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS locales (
        id BIGSERIAL PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        native_name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS translations (
        id BIGSERIAL PRIMARY KEY,
        locale TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        versions JSONB NOT NULL DEFAULT '[]'::jsonb,
        tags TEXT[] NOT NULL DEFAULT '{}',
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (locale, key)
    )",
    "CREATE INDEX IF NOT EXISTS idx_translations_tags ON translations USING GIN (tags)",
];

const ENTRY_COLUMNS: &str = "locale, key, value, versions, tags";

#[derive(sqlx::FromRow)]
struct EntryRow {
    locale: String,
    key: String,
    value: String,
    versions: Json<Vec<VersionRecord>>,
    tags: Vec<String>,
}

impl From<EntryRow> for TranslationEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            locale: row.locale,
            key: row.key,
            value: row.value,
            versions: row.versions.0,
            tags: row.tags.into_iter().collect(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct LocaleRow {
    code: String,
    name: String,
    native_name: String,
}

impl From<LocaleRow> for Locale {
    fn from(row: LocaleRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            native_name: row.native_name,
        }
    }
}

/// Backend over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Connect (retrying transient failures) and create the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = with_retry_if(
            &RetryConfig::database_connect(),
            "Connecting to PostgreSQL",
            || {
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(database_url)
            },
            is_transient,
        )
        .await
        .map_err(|e| StoreError::unavailable("connect", e))?;

        let backend = Self { pool };
        backend.migrate().await?;
        info!("✓ Connected to PostgreSQL");
        Ok(backend)
    }

    /// Wrap an existing pool and create the schema.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        let backend = Self { pool };
        backend.migrate().await?;
        Ok(backend)
    }

    /// Idempotent schema creation.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::unavailable("migrate", e))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connection errors worth retrying; configuration mistakes are not.
fn is_transient(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut
    )
}

fn tag_vec(tags: &BTreeSet<String>) -> Vec<String> {
    tags.iter().cloned().collect()
}

#[async_trait]
impl Backend for PgBackend {
    async fn upsert_locale(&self, locale: &Locale) -> Result<()> {
        sqlx::query(
            "INSERT INTO locales (code, name, native_name) VALUES ($1, $2, $3)
             ON CONFLICT (code) DO UPDATE
             SET name = EXCLUDED.name, native_name = EXCLUDED.native_name",
        )
        .bind(&locale.code)
        .bind(&locale.name)
        .bind(&locale.native_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_locale(&self, locale: &Locale) -> Result<bool> {
        let result = sqlx::query("UPDATE locales SET name = $2, native_name = $3 WHERE code = $1")
            .bind(&locale.code)
            .bind(&locale.name)
            .bind(&locale.native_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_locale_if_absent(&self, locale: &Locale) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO locales (code, name, native_name) VALUES ($1, $2, $3)
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(&locale.code)
        .bind(&locale.name)
        .bind(&locale.native_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_locale(&self, code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM locales WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_locale(&self, code: &str) -> Result<Option<Locale>> {
        let row: Option<LocaleRow> =
            sqlx::query_as("SELECT code, name, native_name FROM locales WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Locale::from))
    }

    async fn list_locales(&self) -> Result<Vec<Locale>> {
        let rows: Vec<LocaleRow> =
            sqlx::query_as("SELECT code, name, native_name FROM locales ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Locale::from).collect())
    }

    async fn find_entry(&self, locale: &str, key: &str) -> Result<Option<TranslationEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM translations WHERE locale = $1 AND key = $2",
            ENTRY_COLUMNS
        ))
        .bind(locale)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TranslationEntry::from))
    }

    async fn entry_exists(&self, locale: &str, key: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM translations WHERE locale = $1 AND key = $2)",
        )
        .bind(locale)
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn append_version(
        &self,
        locale: &str,
        record: VersionRecord,
        max_versions: usize,
        tags: Option<BTreeSet<String>>,
    ) -> Result<TranslationEntry> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<EntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM translations WHERE locale = $1 AND key = $2 FOR UPDATE",
            ENTRY_COLUMNS
        ))
        .bind(locale)
        .bind(&record.key)
        .fetch_optional(&mut *tx)
        .await?;

        let entry = match existing {
            Some(row) => {
                let mut entry = TranslationEntry::from(row);
                entry.push_version(record, max_versions, tags);
                entry
            }
            None => TranslationEntry::first(locale, record, tags),
        };

        sqlx::query(
            "INSERT INTO translations (locale, key, value, versions, tags)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (locale, key) DO UPDATE
             SET value = EXCLUDED.value,
                 versions = EXCLUDED.versions,
                 tags = EXCLUDED.tags,
                 updated_at = NOW()",
        )
        .bind(&entry.locale)
        .bind(&entry.key)
        .bind(&entry.value)
        .bind(Json(&entry.versions))
        .bind(tag_vec(&entry.tags))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn delete_entry(&self, locale: &str, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM translations WHERE locale = $1 AND key = $2")
            .bind(locale)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn entries_for_locale(&self, locale: &str) -> Result<Vec<TranslationEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM translations WHERE locale = $1 ORDER BY key",
            ENTRY_COLUMNS
        ))
        .bind(locale)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TranslationEntry::from).collect())
    }

    async fn distinct_tags(&self, locale: Option<&str>) -> Result<BTreeSet<String>> {
        let tags: Vec<String> = match locale {
            Some(locale) => {
                sqlx::query_scalar(
                    "SELECT DISTINCT unnest(tags) FROM translations WHERE locale = $1",
                )
                .bind(locale)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT DISTINCT unnest(tags) FROM translations")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(tags.into_iter().collect())
    }

    async fn entries_by_tags(
        &self,
        locale: &str,
        tags: &BTreeSet<String>,
        mode: TagMatch,
    ) -> Result<Vec<TranslationEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM translations WHERE locale = $1 AND tags {} $2 ORDER BY key",
            ENTRY_COLUMNS,
            tag_operator(mode)
        ))
        .bind(locale)
        .bind(tag_vec(tags))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TranslationEntry::from).collect())
    }

    async fn count_by_tags(
        &self,
        locale: &str,
        tags: &BTreeSet<String>,
        mode: TagMatch,
    ) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM translations WHERE locale = $1 AND tags {} $2",
            tag_operator(mode)
        ))
        .bind(locale)
        .bind(tag_vec(tags))
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn modify_tags(&self, locale: &str, key: &str, update: &TagUpdate) -> Result<bool> {
        let (assignment, tags) = match update {
            TagUpdate::Add(tags) => (
                "ARRAY(SELECT DISTINCT t FROM unnest(tags || $3::text[]) AS t ORDER BY t)",
                tags,
            ),
            TagUpdate::Replace(tags) => ("$3::text[]", tags),
            TagUpdate::Remove(tags) => (
                "ARRAY(SELECT t FROM unnest(tags) AS t WHERE t <> ALL($3::text[]) ORDER BY t)",
                tags,
            ),
        };
        let result = sqlx::query(&format!(
            "UPDATE translations SET tags = {}, updated_at = NOW() WHERE locale = $1 AND key = $2",
            assignment
        ))
        .bind(locale)
        .bind(key)
        .bind(tag_vec(tags))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn tag_operator(mode: TagMatch) -> &'static str {
    match mode {
        TagMatch::All => "@>",
        TagMatch::Any => "&&",
    }
}

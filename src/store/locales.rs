//! Locale registry: the set of known locales and their display names.
//!
//! Unlike a compiled-in language table, the registry is backed by the same
//! persistence backend as the entries, so locales can be added at runtime.
//! Removing a locale never touches its entries.

use super::Backend;
use crate::error::{require_locale, Result};
use crate::models::Locale;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of known locales.
pub struct LocaleRegistry<B> {
    backend: Arc<B>,
}

impl<B: Backend> LocaleRegistry<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Insert or overwrite. Always succeeds for a non-empty code.
    ///
    /// # Returns
    /// `true` on success; the only failures are an empty code or a backend fault.
    pub async fn add(&self, locale: &Locale) -> Result<bool> {
        require_locale(&locale.code)?;
        self.backend.upsert_locale(locale).await?;
        debug!(code = %locale.code, "Locale upserted");
        Ok(true)
    }

    /// Overwrite an existing locale.
    ///
    /// # Returns
    /// `false` if the code is unknown; nothing is created in that case.
    pub async fn update(&self, locale: &Locale) -> Result<bool> {
        self.backend.update_locale(locale).await
    }

    /// # Returns
    /// `true` iff a row existed.
    pub async fn remove(&self, code: &str) -> Result<bool> {
        let removed = self.backend.delete_locale(code).await?;
        if removed {
            info!(code, "Locale removed (entries are kept)");
        }
        Ok(removed)
    }

    pub async fn get(&self, code: &str) -> Result<Option<Locale>> {
        self.backend.find_locale(code).await
    }

    /// All codes in creation order.
    pub async fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .list_locales()
            .await?
            .into_iter()
            .map(|locale| locale.code)
            .collect())
    }

    /// All locales with names, in creation order.
    pub async fn list_detailed(&self) -> Result<Vec<Locale>> {
        self.backend.list_locales().await
    }

    /// Register a placeholder locale (name = native name = code) if `code` is
    /// unknown.
    ///
    /// # Returns
    /// `true` if a row was created.
    pub async fn ensure(&self, code: &str) -> Result<bool> {
        require_locale(code)?;
        let created = self
            .backend
            .insert_locale_if_absent(&Locale::placeholder(code))
            .await?;
        if created {
            info!(code, "Auto-provisioned locale");
        }
        Ok(created)
    }
}

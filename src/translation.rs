//! Machine translation of missing keys.
//!
//! The translation provider is opaque: anything implementing
//! [`MachineTranslator`] can be plugged in. The engine only decides which
//! keys are missing, validates what comes back and commits it.

use crate::engine::TranslationEngine;
use crate::error::Result;
use crate::i18n::TranslationValidator;
use crate::models::{Locale, VersionMeta};
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::Backend;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

/// Version tag stamped on machine-translated values.
pub const MACHINE_VERSION_TAG: &str = "machine";

#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate one value from `source` to `target`.
    async fn translate(&self, text: &str, source: &Locale, target: &Locale)
        -> anyhow::Result<String>;

    /// Whether a failed call is worth repeating (rate limits, 5xx, network).
    fn is_retryable(&self, _error: &anyhow::Error) -> bool {
        false
    }
}

/// Outcome of a [`TranslationEngine::fill_missing`] run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FillReport {
    /// Keys committed to the target locale
    pub translated: Vec<String>,

    /// Keys whose translation failed, with the reason
    pub failed: Vec<(String, String)>,

    /// Keys committed despite validation warnings or errors
    pub flagged: Vec<String>,
}

impl FillReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<B: Backend> TranslationEngine<B> {
    /// Machine-translate every key present in `source` but absent from
    /// `target`. Returns `None` if either locale is not registered.
    pub async fn fill_missing(
        &self,
        source: &str,
        target: &str,
        user_id: &str,
        translator: &dyn MachineTranslator,
    ) -> Result<Option<FillReport>> {
        let (Some(source_locale), Some(target_locale)) =
            (self.get_locale(source).await?, self.get_locale(target).await?)
        else {
            return Ok(None);
        };
        let (Some(source_values), Some(target_values)) = (
            self.translations_for_locale(source).await?,
            self.translations_for_locale(target).await?,
        ) else {
            return Ok(None);
        };

        let meta = VersionMeta::now(user_id).with_tag(Some(MACHINE_VERSION_TAG));
        let validator =
            TranslationValidator::new(self.interpolator(), &self.options().plural_separator);
        let retry = RetryConfig::api_call();
        let mut report = FillReport::default();

        for (key, text) in source_values
            .iter()
            .filter(|(key, _)| !target_values.contains_key(*key))
        {
            let translated = with_retry_if(
                &retry,
                &format!("Translation of {} to {}", key, target),
                || translator.translate(text, &source_locale, &target_locale),
                |e| translator.is_retryable(e),
            )
            .await;

            let translated = match translated {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(key = %key, "Machine translation to {} failed: {:#}", target, e);
                    report.failed.push((key.clone(), format!("{:#}", e)));
                    continue;
                }
            };

            let validation = validator.validate(text, &translated);
            if !validation.is_clean() {
                warn!(
                    key = %key,
                    "Translation validation for {}: errors {:?}, warnings {:?}",
                    target,
                    validation.errors,
                    validation.warnings
                );
                report.flagged.push(key.clone());
            }

            self.commit(target, key, &translated, &meta, None).await?;
            report.translated.push(key.clone());
        }

        info!(
            "✓ Filled {} key(s) from {} into {} ({} failed)",
            report.translated.len(),
            source,
            target,
            report.failed.len()
        );
        Ok(Some(report))
    }
}

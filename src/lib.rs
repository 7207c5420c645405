//! Versioned, tag-indexed translation store.
//!
//! Each `(locale, key)` keeps a bounded newest-first history of values with
//! author, timestamp and optional version tag. Lookups can pin a version by
//! tag, author or point in time; entries carry tag sets that can be queried
//! with AND/OR semantics. The [`TranslationEngine`] renders values with
//! plural selection and placeholder interpolation, optionally served from an
//! in-process [`TranslationCache`].

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod i18n;
pub mod models;
pub mod retry;
pub mod store;
pub mod translation;

pub use cache::TranslationCache;
pub use config::Config;
pub use engine::{EngineOptions, TranslateOptions, TranslationEngine};
pub use error::{Result, StoreError};
pub use i18n::Node;
pub use models::{Locale, TagMatch, TranslationEntry, VersionRecord, VersionSelector};
pub use store::{Backend, MemoryBackend, PgBackend};
pub use translation::{FillReport, MachineTranslator};

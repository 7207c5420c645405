use crate::engine::EngineOptions;
use crate::i18n::interpolate::{DEFAULT_PREFIX, DEFAULT_SUFFIX};
use crate::i18n::plural::DEFAULT_SEPARATOR;
use crate::models::DEFAULT_MAX_VERSIONS;
use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Versioning
    pub max_versions: usize,

    // Engine
    pub cache_enabled: bool,
    pub auto_provision_locales: bool,
    pub plural_separator: String,
    pub placeholder_prefix: String,
    pub placeholder_suffix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let max_versions = std::env::var("MAX_VERSIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_VERSIONS);
        if max_versions == 0 {
            bail!("MAX_VERSIONS must be at least 1");
        }

        Ok(Self {
            // Database - only the CLI requires it
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            max_versions,

            // Engine
            cache_enabled: env_flag("CACHE_ENABLED", true),
            auto_provision_locales: env_flag("AUTO_PROVISION_LOCALES", true),
            plural_separator: std::env::var("PLURAL_SEPARATOR")
                .unwrap_or_else(|_| DEFAULT_SEPARATOR.to_string()),
            placeholder_prefix: std::env::var("PLACEHOLDER_PREFIX")
                .unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
            placeholder_suffix: std::env::var("PLACEHOLDER_SUFFIX")
                .unwrap_or_else(|_| DEFAULT_SUFFIX.to_string()),
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_versions: self.max_versions,
            auto_provision_locales: self.auto_provision_locales,
            plural_separator: self.plural_separator.clone(),
            placeholder_prefix: self.placeholder_prefix.clone(),
            placeholder_suffix: self.placeholder_suffix.clone(),
        }
    }
}

/// Accepts true/false, 1/0, yes/no, on/off (any case).
fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

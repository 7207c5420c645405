//! Operator CLI for the translation store.
//!
//! Usage:
//!   translation-store locales
//!   translation-store add-locale <code> <name> <native-name>
//!   translation-store import <locale> <file.json> [user] [version-tag]
//!   translation-store export <locale>
//!   translation-store get <locale> <key> [count]
//!   translation-store history <locale> <key>
//!   translation-store tags [locale]
//!
//! Required environment variables:
//! - DATABASE_URL
//!
//! Optional: DATABASE_MAX_CONNECTIONS, MAX_VERSIONS, CACHE_ENABLED,
//! AUTO_PROVISION_LOCALES, PLURAL_SEPARATOR, PLACEHOLDER_PREFIX,
//! PLACEHOLDER_SUFFIX

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tracing::info;
use translation_store::{
    Config, Locale, Node, PgBackend, TranslateOptions, TranslationCache, TranslationEngine,
};

const USAGE: &str = "usage: translation-store <locales|add-locale|import|export|get|history|tags> [args]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_store=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    let config = Config::from_env()?;
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL not set")?;

    let backend = PgBackend::connect(database_url, config.database_max_connections)
        .await
        .context("Failed to connect to translation database")?;
    let cache = config
        .cache_enabled
        .then(|| Arc::new(TranslationCache::new()));
    let engine = TranslationEngine::init(Arc::new(backend), config.engine_options(), cache)
        .await
        .context("Failed to initialise translation engine")?;

    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    match (command.as_str(), rest.as_slice()) {
        ("locales", []) => {
            for locale in engine.list_locales_detailed().await? {
                println!("{}\t{}\t{}", locale.code, locale.name, locale.native_name);
            }
        }
        ("add-locale", [code, name, native]) => {
            engine.add_locale(&Locale::new(*code, *name, *native)).await?;
            info!("✓ Locale {} registered", code);
        }
        ("import", [locale, path, extra @ ..]) if extra.len() <= 2 => {
            let user = extra.first().copied().unwrap_or("cli");
            let version_tag = extra.get(1).copied();
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path))?;
            let tree = Node::from_json_str(&text)
                .with_context(|| format!("{} is not a translation bundle", path))?;
            let added = engine
                .add_translations(locale, &tree, user, version_tag, None)
                .await?;
            info!("✓ Imported {} translation(s) into {}", added, locale);
        }
        ("export", [locale]) => match engine.export_locale(locale).await? {
            Some(tree) => println!("{}", serde_json::to_string_pretty(&tree)?),
            None => bail!("Unknown locale: {}", locale),
        },
        ("get", [locale, key, count @ ..]) if count.len() <= 1 => {
            let mut options = TranslateOptions::new();
            if let Some(count) = count.first() {
                options = options.count(
                    count
                        .parse::<i64>()
                        .with_context(|| format!("Invalid count: {}", count))?,
                );
            }
            println!("{}", engine.translate(locale, key, &options).await);
        }
        ("history", [locale, key]) => match engine.history(locale, key).await? {
            Some(versions) => {
                for version in versions {
                    let when = Utc
                        .timestamp_millis_opt(version.timestamp)
                        .single()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| version.timestamp.to_string());
                    println!(
                        "{}\t{}\t{}\t{}",
                        when,
                        version.user_id,
                        version.tag.as_deref().unwrap_or("-"),
                        version.value
                    );
                }
            }
            None => bail!("No translation {} in {}", key, locale),
        },
        ("tags", []) => print_tags(engine.list_all_tags(None).await?),
        ("tags", [locale]) => print_tags(engine.list_all_tags(Some(*locale)).await?),
        _ => bail!(USAGE),
    }

    Ok(())
}

fn print_tags(tags: impl IntoIterator<Item = String>) {
    for tag in tags {
        println!("{}", tag);
    }
}

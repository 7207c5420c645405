//! Placeholder substitution with configurable delimiters.

use crate::error::{Result, StoreError};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_PREFIX: &str = "{{";
pub const DEFAULT_SUFFIX: &str = "}}";

/// Variables available to a template.
pub type Vars = BTreeMap<String, Value>;

/// Replaces `{{name}}`-style placeholders (delimiters configurable).
#[derive(Debug, Clone)]
pub struct Interpolator {
    pattern: Regex,
}

impl Interpolator {
    /// Build an interpolator for `prefix name suffix` placeholders. A name is
    /// any text up to the first suffix (spaces and non-ASCII included), with
    /// surrounding whitespace ignored.
    pub fn new(prefix: &str, suffix: &str) -> Result<Self> {
        if prefix.is_empty() || suffix.is_empty() {
            return Err(StoreError::invalid(
                "placeholder delimiters must not be empty",
            ));
        }
        let pattern = format!(
            r"{}\s*(.+?)\s*{}",
            regex::escape(prefix),
            regex::escape(suffix)
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| StoreError::invalid(format!("bad placeholder delimiters: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Substitute every placeholder that has a variable. Unknown names and
    /// `null` values leave the placeholder verbatim.
    pub fn interpolate(&self, template: &str, vars: &Vars) -> String {
        if vars.is_empty() {
            return template.to_string();
        }
        self.pattern
            .replace_all(template, |caps: &regex::Captures<'_>| {
                match vars.get(caps[1].trim()).and_then(stringify) {
                    Some(value) => value,
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Placeholder names in order of appearance, duplicates included.
    pub fn placeholders(&self, template: &str) -> Vec<String> {
        self.pattern
            .captures_iter(template)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
            .collect()
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

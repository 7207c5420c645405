//! Translation quality validation.
//!
//! Checks that a translated value keeps the structure of its source:
//! the same placeholders and the same number of plural forms.

use crate::i18n::interpolate::Interpolator;
use crate::i18n::plural::form_count;
use std::collections::BTreeSet;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that break rendering (e.g. a placeholder was dropped)
    pub errors: Vec<String>,

    /// Suspicious but renderable differences
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Validator for translated values.
#[derive(Debug, Clone)]
pub struct TranslationValidator<'a> {
    interpolator: &'a Interpolator,
    plural_separator: &'a str,
}

impl<'a> TranslationValidator<'a> {
    pub fn new(interpolator: &'a Interpolator, plural_separator: &'a str) -> Self {
        Self {
            interpolator,
            plural_separator,
        }
    }

    pub fn validate(&self, original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::default();

        let orig: BTreeSet<String> = self.interpolator.placeholders(original).into_iter().collect();
        let trans: BTreeSet<String> =
            self.interpolator.placeholders(translated).into_iter().collect();

        let missing: Vec<&String> = orig.difference(&trans).collect();
        if !missing.is_empty() {
            report
                .errors
                .push(format!("Placeholders missing from translation: {:?}", missing));
        }
        let extra: Vec<&String> = trans.difference(&orig).collect();
        if !extra.is_empty() {
            report
                .warnings
                .push(format!("Placeholders not present in original: {:?}", extra));
        }

        let orig_forms = form_count(original, self.plural_separator);
        let trans_forms = form_count(translated, self.plural_separator);
        if orig_forms != trans_forms {
            report.warnings.push(format!(
                "Plural form count mismatch: original has {}, translation has {}",
                orig_forms, trans_forms
            ));
        }

        report
    }
}

//! Plural form selection.
//!
//! A pluralized value holds its forms in one string joined by a separator,
//! e.g. `"file|files"` or `"файл|файла|файлов"`. The locale's family decides
//! which form a count selects.

/// Default separator between plural forms.
pub const DEFAULT_SEPARATOR: &str = "|";

/// Languages that pick form 0 for a count of exactly one and form 1 otherwise.
const ONE_OTHER_LANGUAGES: &[&str] = &[
    "ca", "da", "de", "el", "en", "es", "et", "fi", "fr", "gl", "hu", "it", "nb", "nl", "nn",
    "no", "pt", "sv",
];

/// Languages using the East/South Slavic one/few/many rule.
const SLAVIC_LANGUAGES: &[&str] = &["be", "bs", "hr", "ru", "sr", "uk"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralFamily {
    /// one / other
    OneOther,
    /// one / few / many by mod 10 and mod 100
    Slavic,
    /// No rule known; the first form is used
    Unknown,
}

impl PluralFamily {
    /// Family for a locale code. Only the language subtag is considered, so
    /// `en-GB` and `ru_RU` resolve like `en` and `ru`.
    pub fn for_locale(code: &str) -> Self {
        let language = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if ONE_OTHER_LANGUAGES.contains(&language.as_str()) {
            Self::OneOther
        } else if SLAVIC_LANGUAGES.contains(&language.as_str()) {
            Self::Slavic
        } else {
            Self::Unknown
        }
    }

    /// Index of the form a count selects in a full form list.
    pub fn form_index(self, count: i64) -> usize {
        let n = count.unsigned_abs();
        match self {
            Self::OneOther => usize::from(n != 1),
            Self::Slavic => {
                let (mod10, mod100) = (n % 10, n % 100);
                if mod10 == 1 && mod100 != 11 {
                    0
                } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
                    1
                } else {
                    2
                }
            }
            Self::Unknown => 0,
        }
    }
}

/// Pick a form for `count`. A single form always wins; a list shorter than
/// the family needs falls back to its last form; no forms yields "".
pub fn select_form<'a>(forms: &[&'a str], count: i64, family: PluralFamily) -> &'a str {
    match forms {
        [] => "",
        [only] => only,
        _ => {
            let index = family.form_index(count);
            forms
                .get(index)
                .or_else(|| forms.last())
                .copied()
                .unwrap_or_default()
        }
    }
}

/// Split `value` on `separator` and select the form for `count` in `locale`.
/// Padding around separators is dropped so `"file | files"` behaves like
/// `"file|files"`; the outer edges of the value and a single form are kept
/// as written.
pub fn pluralize(value: &str, separator: &str, count: i64, locale: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let mut forms: Vec<&str> = if separator.is_empty() {
        vec![value]
    } else {
        value.split(separator).collect()
    };
    if let [first, middle @ .., last] = forms.as_mut_slice() {
        *first = first.trim_end();
        *last = last.trim_start();
        for form in middle {
            *form = form.trim();
        }
    }
    select_form(&forms, count, PluralFamily::for_locale(locale)).to_string()
}

/// Number of forms a value carries.
pub fn form_count(value: &str, separator: &str) -> usize {
    if value.is_empty() || separator.is_empty() {
        return usize::from(!value.is_empty());
    }
    value.split(separator).count()
}

//! Translation tables and the lookup-with-fallback function.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use super::strings::ENGLISH_STRINGS;

/// Key → template mapping for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    entries: BTreeMap<String, String>,
}

static ENGLISH_TABLE: OnceLock<Arc<TranslationTable>> = OnceLock::new();
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in, complete English table.
    pub fn english() -> Arc<TranslationTable> {
        Arc::clone(ENGLISH_TABLE.get_or_init(|| {
            Arc::new(
                ENGLISH_STRINGS
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            )
        }))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether both tables carry exactly the same keys.
    pub fn same_keys(&self, other: &TranslationTable) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.keys().all(|key| other.entries.contains_key(key))
    }

    /// Look up `key`, falling back to `fallback`, then to the key itself.
    ///
    /// Blank values count as missing. Never fails.
    pub fn translate(&self, key: &str, fallback: Option<&str>, params: &[(&str, &str)]) -> String {
        let template = self
            .get(key)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| fallback.filter(|value| !value.trim().is_empty()))
            .unwrap_or(key);
        interpolate(template, params)
    }
}

impl FromIterator<(String, String)> for TranslationTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Replace every `{name}` in `template` with its value from `params`.
///
/// Placeholders without a matching param are left as written.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
}

/// Names of all `{name}` placeholders in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    let re = PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("Invalid placeholder regex"));
    re.captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(entries: &[(&str, &str)]) -> TranslationTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_translate_hits_table() {
        let t = table(&[("common.save", "Enregistrer")]);
        assert_eq!(t.translate("common.save", None, &[]), "Enregistrer");
    }

    #[test]
    fn test_translate_missing_key_uses_fallback_then_key() {
        let t = TranslationTable::new();
        assert_eq!(t.translate("x.y", Some("Fallback"), &[]), "Fallback");
        assert_eq!(t.translate("x.y", None, &[]), "x.y");
    }

    #[test]
    fn test_translate_blank_value_counts_as_missing() {
        let t = table(&[("blank", "   ")]);
        assert_eq!(t.translate("blank", Some("Shown"), &[]), "Shown");
        assert_eq!(t.translate("blank", Some(" "), &[]), "blank");
    }

    // ==================== Interpolation Tests ====================

    #[test]
    fn test_placeholder_substitution() {
        let t = table(&[("x", "Hi {name}")]);
        assert_eq!(t.translate("x", Some("Hi {name}"), &[("name", "Sam")]), "Hi Sam");
    }

    #[test]
    fn test_missing_param_leaves_placeholder() {
        let t = table(&[("x", "Hi {name}")]);
        assert_eq!(t.translate("x", None, &[]), "Hi {name}");
        assert_eq!(t.translate("x", None, &[("other", "v")]), "Hi {name}");
    }

    #[test]
    fn test_interpolate_replaces_every_occurrence() {
        assert_eq!(interpolate("{a}-{a}-{b}", &[("a", "1"), ("b", "2")]), "1-1-2");
    }

    #[test]
    fn test_placeholders_extraction() {
        assert_eq!(
            placeholders("Showing {count} of {total} and {count}"),
            vec!["count", "total", "count"]
        );
        assert!(placeholders("no params here {}").is_empty());
    }

    // ==================== English Table Tests ====================

    #[test]
    fn test_english_table_is_complete() {
        let english = TranslationTable::english();
        assert_eq!(english.len(), ENGLISH_STRINGS.len());
        assert_eq!(english.get("common.save"), Some("Save"));
    }

    #[test]
    fn test_english_table_is_shared() {
        assert!(Arc::ptr_eq(&TranslationTable::english(), &TranslationTable::english()));
    }

    #[test]
    fn test_same_keys() {
        let a = table(&[("a", "1"), ("b", "2")]);
        let b = table(&[("a", "x"), ("b", "y")]);
        let c = table(&[("a", "x")]);
        assert!(a.same_keys(&b));
        assert!(!a.same_keys(&c));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let t = table(&[("a", "1")]);
        assert_eq!(serde_json::to_string(&t).unwrap(), r#"{"a":"1"}"#);
    }

    proptest! {
        #[test]
        fn prop_translate_is_total(
            key in ".*",
            fallback in proptest::option::of(".*"),
            name in "[a-z]{1,8}",
            value in ".*",
        ) {
            let t = TranslationTable::english();
            let plain = t.translate(&key, fallback.as_deref(), &[]);
            prop_assert!(!plain.is_empty() || key.is_empty());

            let params = [(name.as_str(), value.as_str())];
            let _ = t.translate(&key, fallback.as_deref(), &params);
        }
    }
}

//! Translation quality validation module.
//!
//! A translated UI string is only usable if it still interpolates: every
//! `{placeholder}` in the English source must come back unchanged.

use super::table::placeholders;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make the translation unusable
    pub errors: Vec<String>,

    /// Non-critical observations
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

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

/// Validator for translated UI strings.
pub struct TranslationValidator;

impl TranslationValidator {
    /// Validate a translated string against its English source.
    ///
    /// Errors: blank translation, or a source placeholder missing from it.
    /// Warnings: placeholders the source never had.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if translated.trim().is_empty() {
            report.errors.push("Translation is empty".to_string());
            return report;
        }

        let orig_placeholders = placeholders(original);
        let trans_placeholders = placeholders(translated);

        let missing: Vec<&str> = orig_placeholders
            .iter()
            .filter(|name| !trans_placeholders.contains(name))
            .copied()
            .collect();
        if !missing.is_empty() {
            report
                .errors
                .push(format!("Placeholders lost in translation: {:?}", missing));
        }

        let extra: Vec<&str> = trans_placeholders
            .iter()
            .filter(|name| !orig_placeholders.contains(name))
            .copied()
            .collect();
        if !extra.is_empty() {
            report
                .warnings
                .push(format!("Unexpected placeholders in translation: {:?}", extra));
        }

        report
    }
}

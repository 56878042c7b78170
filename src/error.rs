//! Error taxonomy shared by the localization engine, the AI controller and
//! the key-value store.

use serde::Serialize;
use thiserror::Error;

/// Failures of an AI operation (face analysis or advice generation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    /// The on-device model is absent or not ready.
    #[error("On-device AI is unavailable")]
    CapabilityUnavailable,

    /// The model answered, but found no usable face in the photo.
    #[error("{0}")]
    NoFaceDetected(String),

    /// The model answered with something we could not parse.
    #[error("AI response format error: {0}")]
    ResponseFormat(String),

    /// Session creation or the prompt itself was rejected by the capability.
    #[error("AI request failed: {0}")]
    Model(String),

    /// The user aborted the operation.
    #[error("cancelled by user")]
    Cancelled,

    /// A skip was requested while the operation was not in a skippable state.
    #[error("Cannot {action} while operation is {status}")]
    InvalidTransition {
        action: &'static str,
        status: &'static str,
    },
}

/// Machine-readable error category handed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CapabilityUnavailable,
    NoFaceDetected,
    ResponseFormat,
    Model,
    Cancelled,
    InvalidTransition,
    UnsupportedLanguage,
    TranslationTotalFailure,
    Storage,
}

/// Structured `{kind, message}` pair propagated to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl AiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AiError::CapabilityUnavailable => ErrorKind::CapabilityUnavailable,
            AiError::NoFaceDetected(_) => ErrorKind::NoFaceDetected,
            AiError::ResponseFormat(_) => ErrorKind::ResponseFormat,
            AiError::Model(_) => ErrorKind::Model,
            AiError::Cancelled => ErrorKind::Cancelled,
            AiError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }

    /// Whether a manual retry counts against the retry budget.
    ///
    /// Retrying a structurally absent capability is pointless, and a
    /// cancellation is not a failure at all.
    pub fn counts_as_attempt(&self) -> bool {
        !matches!(
            self,
            AiError::CapabilityUnavailable | AiError::Cancelled | AiError::InvalidTransition { .. }
        )
    }

    /// Failures caused by the AI itself rather than by the user's input.
    pub fn is_capability_fault(&self) -> bool {
        matches!(
            self,
            AiError::CapabilityUnavailable | AiError::ResponseFormat(_) | AiError::Model(_)
        )
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Failures of a language switch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalizationError {
    #[error("Unsupported language code: '{0}'")]
    UnsupportedLanguage(String),

    /// Every key failed (or the translator is unavailable).
    #[error("Translation to '{0}' failed, using English")]
    TranslationTotalFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LocalizationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LocalizationError::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
            LocalizationError::TranslationTotalFailure(_) => ErrorKind::TranslationTotalFailure,
            LocalizationError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Failures of the persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid import: {0}")]
    InvalidImport(String),
}

impl From<StorageError> for LocalizationError {
    fn from(err: StorageError) -> Self {
        LocalizationError::Storage(err.to_string())
    }
}

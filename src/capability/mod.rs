//! Capability contracts for the external AI services.
//!
//! Every service follows the same negotiation: ask for availability, create
//! a session, then invoke it. The traits here are what the localization
//! engine and the AI controller depend on; concrete bindings live in
//! `openai` (HTTP-backed) and `mock` (scripted, for tests and offline runs).

pub mod mock;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// A compressed photo, as produced by the capture/compression collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }
}

/// Raw availability answer from a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Downloadable,
    Downloading,
    Unavailable,
}

impl Availability {
    /// Only a ready model counts; a pending download is as good as absent.
    pub fn is_ready(self) -> bool {
        self == Availability::Available
    }
}

impl FromStr for Availability {
    type Err = std::convert::Infallible;

    /// Accepts both the legacy (`readily`, `after-download`, `no`) and the
    /// current (`available`, `downloadable`, `downloading`, `unavailable`)
    /// host vocabularies. Anything unrecognised is `Unavailable`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "readily" | "available" => Availability::Available,
            "after-download" | "downloadable" => Availability::Downloadable,
            "downloading" => Availability::Downloading,
            _ => Availability::Unavailable,
        })
    }
}

/// Published status of the on-device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityStatus {
    Checking,
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Text,
    Image,
}

/// Options passed when creating a model session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub expected_inputs: Vec<Modality>,
    pub expected_outputs: Vec<Modality>,
    /// Language the model should answer in (a supported language code).
    pub language: String,
}

impl SessionOptions {
    pub fn image_to_text(language: impl Into<String>) -> Self {
        Self {
            expected_inputs: vec![Modality::Text, Modality::Image],
            expected_outputs: vec![Modality::Text],
            language: language.into(),
        }
    }

    pub fn text_to_text(language: impl Into<String>) -> Self {
        Self {
            expected_inputs: vec![Modality::Text],
            expected_outputs: vec![Modality::Text],
            language: language.into(),
        }
    }

    pub fn accepts_images(&self) -> bool {
        self.expected_inputs.contains(&Modality::Image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Image(ImageBlob),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl PromptMessage {
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![ContentPart::Text(text.into())])
    }

    pub fn has_image(&self) -> bool {
        self.content
            .iter()
            .any(|part| matches!(part, ContentPart::Image(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    pub language: String,
    pub confidence: f32,
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Candidates ordered by descending confidence.
    async fn detect(&self, text: &str) -> Result<Vec<DetectedLanguage>>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn availability(&self, source: &str, target: &str) -> Result<Availability>;
    async fn create(&self, source: &str, target: &str) -> Result<Box<dyn TranslatorSession>>;
}

#[async_trait]
pub trait TranslatorSession: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn availability(&self) -> Result<Availability>;
    async fn create(&self, options: SessionOptions) -> Result<Box<dyn ModelSession>>;
}

#[async_trait]
pub trait ModelSession: Send + Sync {
    async fn prompt(&self, messages: Vec<PromptMessage>) -> Result<String>;
}

/// The injected capability set. Any member may be absent.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub detector: Option<Arc<dyn LanguageDetector>>,
    pub translator: Option<Arc<dyn Translator>>,
    pub model: Option<Arc<dyn LanguageModel>>,
}

impl Capabilities {
    /// No capabilities at all; every AI path falls back.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("detector", &self.detector.is_some())
            .field("translator", &self.translator.is_some())
            .field("model", &self.model.is_some())
            .finish()
    }
}

/// Collapse an availability query into ready / not ready.
///
/// A query error is logged and treated as not ready; callers never see it.
pub fn is_ready(label: &str, answer: Result<Availability>) -> bool {
    match answer {
        Ok(availability) => {
            debug!("{} availability: {:?}", label, availability);
            availability.is_ready()
        }
        Err(e) => {
            warn!("{} availability check failed: {:#}", label, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_parses_legacy_and_current_strings() {
        assert_eq!("readily".parse::<Availability>().unwrap(), Availability::Available);
        assert_eq!("available".parse::<Availability>().unwrap(), Availability::Available);
        assert_eq!(
            "after-download".parse::<Availability>().unwrap(),
            Availability::Downloadable
        );
        assert_eq!(
            "downloading".parse::<Availability>().unwrap(),
            Availability::Downloading
        );
        assert_eq!("no".parse::<Availability>().unwrap(), Availability::Unavailable);
        assert_eq!("".parse::<Availability>().unwrap(), Availability::Unavailable);
    }

    #[test]
    fn test_only_available_is_ready() {
        assert!(Availability::Available.is_ready());
        assert!(!Availability::Downloadable.is_ready());
        assert!(!Availability::Downloading.is_ready());
        assert!(!Availability::Unavailable.is_ready());
    }

    #[test]
    fn test_is_ready_swallows_errors() {
        assert!(!is_ready("test", Err(anyhow::anyhow!("boom"))));
        assert!(is_ready("test", Ok(Availability::Available)));
    }

    #[test]
    fn test_session_options_modalities() {
        assert!(SessionOptions::image_to_text("en").accepts_images());
        assert!(!SessionOptions::text_to_text("en").accepts_images());
    }

    #[test]
    fn test_prompt_message_has_image() {
        let message = PromptMessage::user(vec![
            ContentPart::Text("look".into()),
            ContentPart::Image(ImageBlob::jpeg(vec![1, 2, 3])),
        ]);
        assert!(message.has_image());
        assert!(!PromptMessage::user_text("hi").has_image());
    }

    #[test]
    fn test_capabilities_debug_hides_internals() {
        let debug = format!("{:?}", Capabilities::none());
        assert!(debug.contains("model: false"));
    }
}

//! Scripted and no-op capability bindings.
//!
//! These drive every fallback branch deterministically without a model.
//! All mocks are cheap to clone; clones share call counters and scripts so a
//! test can hand one clone to the code under test and inspect the other.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use super::{
    Availability, DetectedLanguage, LanguageDetector, LanguageModel, ModelSession, PromptMessage,
    SessionOptions, Translator, TranslatorSession,
};

/// A capability that is never present.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCapability;

#[async_trait]
impl LanguageModel for UnavailableCapability {
    async fn availability(&self) -> Result<Availability> {
        Ok(Availability::Unavailable)
    }

    async fn create(&self, _options: SessionOptions) -> Result<Box<dyn ModelSession>> {
        bail!("Language model is not available")
    }
}

#[async_trait]
impl Translator for UnavailableCapability {
    async fn availability(&self, _source: &str, _target: &str) -> Result<Availability> {
        Ok(Availability::Unavailable)
    }

    async fn create(&self, _source: &str, _target: &str) -> Result<Box<dyn TranslatorSession>> {
        bail!("Translator is not available")
    }
}

#[async_trait]
impl LanguageDetector for UnavailableCapability {
    async fn detect(&self, _text: &str) -> Result<Vec<DetectedLanguage>> {
        bail!("Language detector is not available")
    }
}

// ==================== Language Model ====================

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Resolve the prompt with this text.
    Text(String),
    /// Reject the prompt with this message.
    Fail(String),
    /// Never resolve (until the caller aborts).
    Hang,
}

#[derive(Debug)]
struct MockModelState {
    availability: Availability,
    replies: VecDeque<MockReply>,
    prompts: Vec<Vec<PromptMessage>>,
    sessions: Vec<SessionOptions>,
}

#[derive(Debug, Clone)]
pub struct MockModel {
    state: Arc<Mutex<MockModelState>>,
}

impl MockModel {
    pub fn new(availability: Availability) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockModelState {
                availability,
                replies: VecDeque::new(),
                prompts: Vec::new(),
                sessions: Vec::new(),
            })),
        }
    }

    /// An available model answering with the given replies, in order.
    pub fn replying(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let model = Self::new(Availability::Available);
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.lock().replies.push_back(reply);
    }

    pub fn set_availability(&self, availability: Availability) {
        self.lock().availability = availability;
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        self.lock().prompts.clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Options of every session created, in order.
    pub fn sessions(&self) -> Vec<SessionOptions> {
        self.lock().sessions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockModelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn availability(&self) -> Result<Availability> {
        Ok(self.lock().availability)
    }

    async fn create(&self, options: SessionOptions) -> Result<Box<dyn ModelSession>> {
        let mut state = self.lock();
        if !state.availability.is_ready() {
            bail!("Language model is {:?}", state.availability);
        }
        state.sessions.push(options);
        Ok(Box::new(MockModelSession {
            model: self.clone(),
        }))
    }
}

struct MockModelSession {
    model: MockModel,
}

#[async_trait]
impl ModelSession for MockModelSession {
    async fn prompt(&self, messages: Vec<PromptMessage>) -> Result<String> {
        let reply = {
            let mut state = self.model.lock();
            state.prompts.push(messages);
            state.replies.pop_front()
        };

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(message)) => Err(anyhow!(message)),
            Some(MockReply::Hang) => futures::future::pending::<Result<String>>().await,
            None => bail!("No scripted reply left"),
        }
    }
}

// ==================== Translator ====================

#[derive(Debug)]
struct MockTranslatorState {
    availability: Availability,
    failing_texts: HashSet<String>,
    fail_all: bool,
    calls: usize,
    sessions: usize,
}

/// Translates `text` into `"[target] text"` unless told to fail.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    state: Arc<Mutex<MockTranslatorState>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTranslatorState {
                availability: Availability::Available,
                failing_texts: HashSet::new(),
                fail_all: false,
                calls: 0,
                sessions: 0,
            })),
        }
    }

    pub fn with_availability(self, availability: Availability) -> Self {
        self.lock().availability = availability;
        self
    }

    /// Reject translation of this exact source text.
    pub fn failing_on(self, text: impl Into<String>) -> Self {
        self.lock().failing_texts.insert(text.into());
        self
    }

    /// Reject every translation call.
    pub fn failing_everything(self) -> Self {
        self.lock().fail_all = true;
        self
    }

    /// Number of `translate` calls across all sessions.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    pub fn sessions_created(&self) -> usize {
        self.lock().sessions
    }

    /// The translation this mock produces for `text`.
    pub fn render(target: &str, text: &str) -> String {
        format!("[{}] {}", target, text)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockTranslatorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn availability(&self, _source: &str, _target: &str) -> Result<Availability> {
        Ok(self.lock().availability)
    }

    async fn create(&self, _source: &str, target: &str) -> Result<Box<dyn TranslatorSession>> {
        let mut state = self.lock();
        if !state.availability.is_ready() {
            bail!("Translator is {:?}", state.availability);
        }
        state.sessions += 1;
        Ok(Box::new(MockTranslatorSession {
            translator: self.clone(),
            target: target.to_string(),
        }))
    }
}

struct MockTranslatorSession {
    translator: MockTranslator,
    target: String,
}

#[async_trait]
impl TranslatorSession for MockTranslatorSession {
    async fn translate(&self, text: &str) -> Result<String> {
        let mut state = self.translator.lock();
        state.calls += 1;
        if state.fail_all || state.failing_texts.contains(text) {
            bail!("Mock translation rejected");
        }
        Ok(MockTranslator::render(&self.target, text))
    }
}

// ==================== Language Detector ====================

#[derive(Debug, Clone)]
pub struct MockDetector {
    result: Result<Vec<DetectedLanguage>, String>,
}

impl MockDetector {
    pub fn detecting(candidates: Vec<(&str, f32)>) -> Self {
        Self {
            result: Ok(candidates
                .into_iter()
                .map(|(language, confidence)| DetectedLanguage {
                    language: language.to_string(),
                    confidence,
                })
                .collect()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
        }
    }
}

#[async_trait]
impl LanguageDetector for MockDetector {
    async fn detect(&self, _text: &str) -> Result<Vec<DetectedLanguage>> {
        self.result.clone().map_err(|message| anyhow!(message))
    }
}

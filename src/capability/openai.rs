//! Capability binding backed by an OpenAI-compatible chat completions API.
//!
//! One client serves all three capabilities: the multimodal model, the UI
//! string translator and the language detector. Without an API key every
//! availability query answers `Unavailable`, which routes callers onto
//! their fallback paths.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{
    Availability, ContentPart, DetectedLanguage, LanguageDetector, LanguageModel, ModelSession,
    PromptMessage, Role, SessionOptions, Translator, TranslatorSession,
};
use crate::config::Config;
use crate::i18n::Language;

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub temperature: f32,
}

impl OpenAiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            api_url: config.openai_api_url.clone(),
            temperature: config.openai_temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

fn to_chat_message(message: PromptMessage) -> ChatMessage {
    let role = message.role.to_string();

    // Plain strings for text-only messages keep the payload compatible with
    // endpoints that reject content arrays.
    if !message.has_image() {
        let text = message
            .content
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text),
                ContentPart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        return ChatMessage {
            role,
            content: ChatContent::Text(text),
        };
    }

    let parts = message
        .content
        .into_iter()
        .map(|part| match part {
            ContentPart::Text(text) => ChatPart::Text { text },
            ContentPart::Image(image) => ChatPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!(
                        "data:{};base64,{}",
                        image.mime_type,
                        BASE64.encode(&image.bytes)
                    ),
                },
            },
        })
        .collect();

    ChatMessage {
        role,
        content: ChatContent::Parts(parts),
    }
}

#[derive(Clone)]
pub struct OpenAiCapability {
    client: reqwest::Client,
    settings: Arc<OpenAiSettings>,
}

impl OpenAiCapability {
    pub fn new(client: reqwest::Client, settings: OpenAiSettings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client, OpenAiSettings::from_config(config)))
    }

    fn configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn chat(&self, messages: Vec<PromptMessage>, temperature: f32) -> Result<String> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            bail!("OpenAI API key is not configured");
        };

        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: messages.into_iter().map(to_chat_message).collect(),
            // Reasoning models don't support temperature
            temperature: if is_reasoning_model(&self.settings.model) {
                None
            } else {
                Some(temperature)
            },
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            bail!("OpenAI API error ({}): {}", status, body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("OpenAI response contained no content")
    }
}

fn language_display_name(code: &str) -> String {
    Language::from_code(code)
        .map(|language| language.name().to_string())
        .unwrap_or_else(|_| code.to_string())
}

// ==================== Language Model ====================

#[async_trait]
impl LanguageModel for OpenAiCapability {
    async fn availability(&self) -> Result<Availability> {
        Ok(if self.configured() {
            Availability::Available
        } else {
            Availability::Unavailable
        })
    }

    async fn create(&self, options: SessionOptions) -> Result<Box<dyn ModelSession>> {
        if !self.configured() {
            bail!("OpenAI API key is not configured");
        }
        Ok(Box::new(OpenAiModelSession {
            capability: self.clone(),
            options,
        }))
    }
}

struct OpenAiModelSession {
    capability: OpenAiCapability,
    options: SessionOptions,
}

#[async_trait]
impl ModelSession for OpenAiModelSession {
    async fn prompt(&self, messages: Vec<PromptMessage>) -> Result<String> {
        if !self.options.accepts_images() && messages.iter().any(PromptMessage::has_image) {
            bail!("Session was created without image input");
        }

        let mut request = Vec::with_capacity(messages.len() + 1);
        request.push(PromptMessage {
            role: Role::System,
            content: vec![ContentPart::Text(format!(
                "Always answer in {}.",
                language_display_name(&self.options.language)
            ))],
        });
        request.extend(messages);

        self.capability
            .chat(request, self.capability.settings.temperature)
            .await
    }
}

// ==================== Translator ====================

/// Build the system prompt for translating a single UI string
fn build_translation_system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        r#"You are a professional software localizer. Translate the user's text from {} to {}.

## Rules
- Reply with the translation only, no quotes, notes or explanations
- Keep every placeholder in curly braces exactly as written (e.g., {{faceShape}}, {{count}})
- Keep brand and product names (e.g., Chrome AI) untranslated
- Keep punctuation such as trailing colons and ellipses
- Keep it short: this text is shown in buttons, labels and headings"#,
        source_language, target_language
    )
}

#[async_trait]
impl Translator for OpenAiCapability {
    async fn availability(&self, source: &str, target: &str) -> Result<Availability> {
        let supported = Language::from_code(source).is_ok() && Language::from_code(target).is_ok();
        Ok(if self.configured() && supported {
            Availability::Available
        } else {
            Availability::Unavailable
        })
    }

    async fn create(&self, source: &str, target: &str) -> Result<Box<dyn TranslatorSession>> {
        if !self.configured() {
            bail!("OpenAI API key is not configured");
        }
        Ok(Box::new(OpenAiTranslatorSession {
            capability: self.clone(),
            system_prompt: build_translation_system_prompt(
                &language_display_name(source),
                &language_display_name(target),
            ),
        }))
    }
}

struct OpenAiTranslatorSession {
    capability: OpenAiCapability,
    system_prompt: String,
}

#[async_trait]
impl TranslatorSession for OpenAiTranslatorSession {
    async fn translate(&self, text: &str) -> Result<String> {
        let messages = vec![
            PromptMessage {
                role: Role::System,
                content: vec![ContentPart::Text(self.system_prompt.clone())],
            },
            PromptMessage::user_text(text),
        ];
        let translated = self.capability.chat(messages, 0.3).await?;
        Ok(translated.trim().to_string())
    }
}

// ==================== Language Detector ====================

const DETECTION_PROMPT: &str = r#"Identify the language of the user's text. It may be a locale tag such as "fr-FR".
Reply with a JSON array only, most likely first, e.g. [{"language":"fr","confidence":0.92}].
Use ISO 639-1 codes, adding a region only for Chinese (e.g., "zh-CN")."#;

#[derive(Debug, Deserialize)]
struct DetectionCandidate {
    language: String,
    confidence: f32,
}

#[async_trait]
impl LanguageDetector for OpenAiCapability {
    async fn detect(&self, text: &str) -> Result<Vec<DetectedLanguage>> {
        let messages = vec![
            PromptMessage {
                role: Role::System,
                content: vec![ContentPart::Text(DETECTION_PROMPT.to_string())],
            },
            PromptMessage::user_text(text),
        ];
        let reply = self.chat(messages, 0.0).await?;

        let start = reply.find('[').context("Detection reply contained no JSON array")?;
        let end = reply.rfind(']').context("Detection reply contained no JSON array")?;
        if end < start {
            bail!("Detection reply contained no JSON array");
        }
        let candidates: Vec<DetectionCandidate> = serde_json::from_str(&reply[start..=end])
            .context("Failed to parse detection reply")?;

        let mut detected: Vec<DetectedLanguage> = candidates
            .into_iter()
            .map(|c| DetectedLanguage {
                language: c.language,
                confidence: c.confidence,
            })
            .collect();
        detected.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ImageBlob;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_settings(api_url: &str, api_key: Option<&str>) -> OpenAiSettings {
        OpenAiSettings {
            api_key: api_key.map(str::to_string),
            model: "gpt-4o-mini".to_string(),
            api_url: api_url.to_string(),
            temperature: 0.7,
        }
    }

    fn create_openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content
                    },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    async fn capability_for(server: &MockServer) -> OpenAiCapability {
        OpenAiCapability::new(
            reqwest::Client::new(),
            create_settings(
                &format!("{}/v1/chat/completions", server.uri()),
                Some("test-openai-key"),
            ),
        )
    }

    // ==================== Request Shape Tests ====================

    #[test]
    fn test_is_reasoning_model() {
        assert!(is_reasoning_model("gpt-5-mini"));
        assert!(is_reasoning_model("o3-mini"));
        assert!(!is_reasoning_model("gpt-4o-mini"));
    }

    #[test]
    fn test_text_message_serializes_as_string() {
        let message = to_chat_message(PromptMessage::user_text("Hello"));
        let json = serde_json::to_value(&message).expect("Should serialize");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hello");
    }

    #[test]
    fn test_image_message_serializes_as_parts() {
        let message = to_chat_message(PromptMessage::user(vec![
            ContentPart::Text("Analyze".into()),
            ContentPart::Image(ImageBlob::jpeg(vec![0xff, 0xd8, 0xff])),
        ]));
        let json = serde_json::to_value(&message).expect("Should serialize");

        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "Analyze");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,/9j/"
        );
    }

    #[test]
    fn test_translation_prompt_mentions_placeholders() {
        let prompt = build_translation_system_prompt("English", "French");
        assert!(prompt.contains("from English to French"));
        assert!(prompt.contains("{faceShape}"));
    }

    // ==================== Availability Tests ====================

    #[tokio::test]
    async fn test_unavailable_without_api_key() {
        let cap = OpenAiCapability::new(
            reqwest::Client::new(),
            create_settings("http://localhost/none", None),
        );
        assert_eq!(
            LanguageModel::availability(&cap).await.unwrap(),
            Availability::Unavailable
        );
        assert_eq!(
            Translator::availability(&cap, "en", "fr").await.unwrap(),
            Availability::Unavailable
        );
        assert!(LanguageModel::create(&cap, SessionOptions::text_to_text("en"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_translator_rejects_unsupported_target() {
        let cap = OpenAiCapability::new(
            reqwest::Client::new(),
            create_settings("http://localhost/none", Some("key")),
        );
        assert_eq!(
            Translator::availability(&cap, "en", "xx").await.unwrap(),
            Availability::Unavailable
        );
        assert_eq!(
            Translator::availability(&cap, "en", "fr").await.unwrap(),
            Availability::Available
        );
    }

    // ==================== Integration Tests with Wiremock ====================

    #[tokio::test]
    async fn test_model_prompt_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-openai-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_openai_response(r#"{"faceShape":"Oval"}"#)),
            )
            .mount(&mock_server)
            .await;

        let cap = capability_for(&mock_server).await;
        let session = LanguageModel::create(&cap, SessionOptions::image_to_text("fr"))
            .await
            .expect("Should create session");
        let reply = session
            .prompt(vec![PromptMessage::user(vec![
                ContentPart::Text("Analyze".into()),
                ContentPart::Image(ImageBlob::jpeg(vec![1, 2, 3])),
            ])])
            .await
            .expect("Should succeed");

        assert_eq!(reply, r#"{"faceShape":"Oval"}"#);
    }

    #[tokio::test]
    async fn test_model_session_rejects_images_on_text_session() {
        let mock_server = MockServer::start().await;
        let cap = capability_for(&mock_server).await;
        let session = LanguageModel::create(&cap, SessionOptions::text_to_text("en"))
            .await
            .unwrap();

        let result = session
            .prompt(vec![PromptMessage::user(vec![ContentPart::Image(
                ImageBlob::jpeg(vec![1]),
            )])])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_api_error_surfaces_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let cap = capability_for(&mock_server).await;
        let session = Translator::create(&cap, "en", "es").await.unwrap();
        let err = session.translate("Save").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_translate_trims_reply_and_uses_low_temperature() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "temperature": 0.3 })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_openai_response("  Guardar \n")),
            )
            .mount(&mock_server)
            .await;

        let cap = capability_for(&mock_server).await;
        let session = Translator::create(&cap, "en", "es").await.unwrap();
        assert_eq!(session.translate("Save").await.unwrap(), "Guardar");
    }

    #[tokio::test]
    async fn test_detect_parses_and_sorts_candidates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response(
                r#"Sure: [{"language":"es","confidence":0.2},{"language":"fr","confidence":0.9}]"#,
            )))
            .mount(&mock_server)
            .await;

        let cap = capability_for(&mock_server).await;
        let detected = cap.detect("fr-FR").await.expect("Should succeed");

        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].language, "fr");
        assert!((detected[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&mock_server)
            .await;

        let cap = capability_for(&mock_server).await;
        let session = LanguageModel::create(&cap, SessionOptions::text_to_text("en"))
            .await
            .unwrap();
        let err = session
            .prompt(vec![PromptMessage::user_text("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no content"));
    }
}

//! Face analysis and advice results, response parsing, and mock data.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::catalog::Hairstyle;
use crate::error::AiError;
use crate::i18n::TranslationTable;

pub const FACE_SHAPES: [&str; 5] = ["Oval", "Round", "Square", "Heart", "Long"];

pub const DEFAULT_CONFIDENCE: &str = "85%";
pub const DEFAULT_SYMMETRY: &str = "Good";
pub const DEFAULT_PROPORTIONS: &str = "Standard";
pub const UNKNOWN_SHAPE_DESCRIPTION: &str = "No specific facial features detected";

pub const AI_NOTE: &str = "Generated by on-device AI";
pub const MOCK_NOTE: &str = "On-device AI unavailable, using sample data";

static SHAPE_WORD_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Features {
    pub symmetry: String,
    pub proportions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnalysis {
    pub face_shape: String,
    pub confidence: String,
    pub features: Features,
    pub description: String,
    pub is_mock: bool,
    pub note: String,
}

impl FaceAnalysis {
    fn new(face_shape: String, confidence: String, features: Features, is_mock: bool) -> Self {
        let description = describe_face_shape(&face_shape);
        Self {
            face_shape,
            confidence,
            features,
            description,
            is_mock,
            note: if is_mock { MOCK_NOTE } else { AI_NOTE }.to_string(),
        }
    }

    /// The deterministic result used when analysis is skipped.
    pub fn mock() -> Self {
        Self::new(
            "Oval".to_string(),
            "90%".to_string(),
            Features {
                symmetry: DEFAULT_SYMMETRY.to_string(),
                proportions: DEFAULT_PROPORTIONS.to_string(),
            },
            true,
        )
    }

    /// Parse a raw model reply into a normalized analysis.
    ///
    /// The first `{...}` span is read as JSON. A set `error` field (a
    /// non-empty string, `true`, a non-zero number or any object), or a bare
    /// "no face" message, means no face was found. Without JSON, a reply that
    /// names one of the known face shapes as a whole word is accepted with
    /// default features; the earliest named shape wins.
    pub fn parse_reply(reply: &str) -> Result<Self, AiError> {
        let Some(json) = extract_json_object(reply) else {
            if mentions_no_face(reply) {
                return Err(AiError::NoFaceDetected("No face detected".to_string()));
            }
            return match find_shape_in_text(reply) {
                Some(shape) => Ok(Self::new(
                    shape,
                    DEFAULT_CONFIDENCE.to_string(),
                    default_features(),
                    false,
                )),
                None => Err(AiError::ResponseFormat(excerpt(reply))),
            };
        };

        let value: Value =
            serde_json::from_str(json).map_err(|_| AiError::ResponseFormat(excerpt(reply)))?;

        if let Some(error) = value.get("error").filter(|e| is_set(e)) {
            let message = match error {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => "No face detected".to_string(),
            };
            return Err(AiError::NoFaceDetected(message));
        }

        let face_shape = value
            .get("faceShape")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AiError::ResponseFormat("missing faceShape".to_string()))?;

        let features = value.get("features");
        let confidence = value
            .get("confidence")
            .or_else(|| features.and_then(|f| f.get("confidence")))
            .and_then(confidence_text)
            .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string());

        let field = |name: &str, default: &str| {
            features
                .and_then(|f| f.get(name))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Ok(Self::new(
            canonical_shape(face_shape),
            confidence,
            Features {
                symmetry: field("symmetry", DEFAULT_SYMMETRY),
                proportions: field("proportions", DEFAULT_PROPORTIONS),
            },
            false,
        ))
    }
}

fn default_features() -> Features {
    Features {
        symmetry: DEFAULT_SYMMETRY.to_string(),
        proportions: DEFAULT_PROPORTIONS.to_string(),
    }
}

/// The span from the first `{` to the last `}`, inclusive.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// English description of a known face shape.
pub fn describe_face_shape(face_shape: &str) -> String {
    TranslationTable::english()
        .get(&format!("faceShape.{}", face_shape))
        .unwrap_or(UNKNOWN_SHAPE_DESCRIPTION)
        .to_string()
}

fn canonical_shape(shape: &str) -> String {
    FACE_SHAPES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(shape))
        .map(|known| known.to_string())
        .unwrap_or_else(|| shape.to_string())
}

fn confidence_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => n.as_f64().map(|f| {
            let percent = if f <= 1.0 { f * 100.0 } else { f };
            format!("{}%", percent.round())
        }),
        _ => None,
    }
}

fn mentions_no_face(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    lower.contains("no face") || lower.contains("without a face")
}

/// Whether a JSON `error` value reports a failure.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn find_shape_in_text(reply: &str) -> Option<String> {
    let regex = SHAPE_WORD_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\b(oval|round|square|heart|long)\b").expect("Invalid shape regex")
    });
    regex
        .find(reply)
        .map(|found| canonical_shape(found.as_str()))
}

fn excerpt(reply: &str) -> String {
    const MAX: usize = 200;
    let trimmed = reply.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ==================== Advice ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
    pub text: String,
    pub is_mock: bool,
    pub note: String,
}

/// Advice text grouped by topic for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdviceSections {
    pub reason: String,
    pub maintenance: String,
    pub styling: String,
    pub caution: String,
    pub summary: String,
}

impl Advice {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_mock: false,
            note: AI_NOTE.to_string(),
        }
    }

    /// Sample advice keyed by face shape.
    pub fn mock(face: &FaceAnalysis, hairstyle: &Hairstyle) -> Self {
        let shape = &face.face_shape;
        let name = &hairstyle.name;
        let description = hairstyle.description.trim_end_matches('.');

        let text = match shape.as_str() {
            "Oval" => format!(
                "Your {} face shape is well balanced, and the {} shows off its strengths. {}. Trim regularly to keep the layers defined.",
                shape, name, description
            ),
            "Round" => format!(
                "The {} visually lengthens your {} face shape. {}. Pair it with a side part for more dimension.",
                name, shape, description
            ),
            "Square" => format!(
                "This {} softens the contours of your {} face shape. {}. Keep some volume in the style.",
                name, shape, description
            ),
            "Heart" => format!(
                "The {} suits your {} face shape and balances forehead and chin. {}.",
                name, shape, description
            ),
            "Long" => format!(
                "Your {} face shape works well with the {}. Keep width in the style to add fullness. {}.",
                shape, name, description
            ),
            _ => format!(
                "The {} suits your {} face shape. {}. Ask a professional stylist for more ideas.",
                name, shape, description
            ),
        };

        Self {
            text,
            is_mock: true,
            note: MOCK_NOTE.to_string(),
        }
    }

    /// Split the text into sections by topic keywords, line by line.
    ///
    /// A line that contains a keyword as a whole word opens that section.
    /// Lines before any keyword land in `reason`.
    pub fn sections(&self) -> AdviceSections {
        let mut sections = AdviceSections::default();
        let mut current = Section::Reason;

        for line in self.text.lines().filter(|l| !l.trim().is_empty()) {
            if let Some(section) = Section::from_line(line) {
                current = section;
            }
            let target = match current {
                Section::Reason => &mut sections.reason,
                Section::Maintenance => &mut sections.maintenance,
                Section::Styling => &mut sections.styling,
                Section::Caution => &mut sections.caution,
                Section::Summary => &mut sections.summary,
            };
            target.push_str(line);
            target.push('\n');
        }

        sections
    }
}

#[derive(Clone, Copy)]
enum Section {
    Reason,
    Maintenance,
    Styling,
    Caution,
    Summary,
}

impl Section {
    fn from_line(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has = |keywords: &[&str]| keywords.iter().any(|k| words.contains(k));

        if has(&["why", "reason", "suitable", "suits"]) {
            Some(Section::Reason)
        } else if has(&["maintenance", "care", "daily"]) {
            Some(Section::Maintenance)
        } else if has(&["styling", "match", "outfit"]) {
            Some(Section::Styling)
        } else if has(&["caution", "attention", "avoid", "note"]) {
            Some(Section::Caution)
        } else if has(&["summary", "overall", "conclusion"]) {
            Some(Section::Summary)
        } else {
            None
        }
    }
}

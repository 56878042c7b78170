use crate::capability::{ContentPart, ImageBlob, PromptMessage};
use crate::catalog::Hairstyle;
use crate::i18n::Language;

use super::analysis::{FaceAnalysis, FACE_SHAPES};

/// Single user message: the analysis instruction followed by the photo.
pub fn face_analysis_prompt(image: ImageBlob) -> Vec<PromptMessage> {
    let instruction = format!(
        "You are a professional image consultant. Analyze the face in this photo and identify:\n\
         1. The face shape (one of: {shapes})\n\
         2. Facial features and contours\n\n\
         Reply with a single JSON object with these fields:\n\
         - faceShape: the face shape\n\
         - confidence: confidence as a percentage string, e.g. \"88%\"\n\
         - features: an object with symmetry and proportions descriptions\n\n\
         If no face is detected, reply with {{\"error\": \"No face detected\"}}",
        shapes = FACE_SHAPES.join(", ")
    );

    vec![PromptMessage::user(vec![
        ContentPart::Text(instruction),
        ContentPart::Image(image),
    ])]
}

pub fn advice_prompt(
    face: &FaceAnalysis,
    hairstyle: &Hairstyle,
    language: Language,
) -> Vec<PromptMessage> {
    let text = format!(
        "You are a professional hairstylist. Write personalized hairstyle advice from this information:\n\n\
         Face shape: {shape}\n\
         Chosen hairstyle: {name}\n\
         Hairstyle details: {description}\n\n\
         Write exactly five short sections, each starting with its title on its own line:\n\
         1. Why it suits you: concrete reasons this hairstyle fits the face shape\n\
         2. Daily care: maintenance tips\n\
         3. Styling: makeup and outfit suggestions\n\
         4. Things to note: what to avoid\n\
         5. Summary: one sentence\n\n\
         Use plain text only. No markdown, no bullet symbols, no headings markup.\n\
         Answer in a natural, professional and friendly tone in {language}.",
        shape = face.face_shape,
        name = hairstyle.name,
        description = hairstyle.description,
        language = language.name(),
    );

    vec![PromptMessage::user_text(text)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Role;
    use crate::catalog;

    #[test]
    fn test_face_prompt_carries_image() {
        let messages = face_analysis_prompt(ImageBlob::jpeg(vec![1, 2, 3]));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert!(messages[0].has_image());
        match &messages[0].content[0] {
            ContentPart::Text(text) => {
                assert!(text.contains("faceShape"));
                assert!(text.contains("Oval, Round, Square, Heart, Long"));
                assert!(text.contains(r#"{"error": "No face detected"}"#));
            }
            other => panic!("Expected text first, got {:?}", other),
        }
    }

    #[test]
    fn test_advice_prompt_embeds_inputs() {
        let bob = catalog::find(1).unwrap();
        let messages = advice_prompt(
            &FaceAnalysis::mock(),
            &bob,
            Language::from_code("ja").unwrap(),
        );
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].has_image());

        let ContentPart::Text(text) = &messages[0].content[0] else {
            panic!("Expected text content");
        };
        assert!(text.contains("Face shape: Oval"));
        assert!(text.contains("Chosen hairstyle: Bob"));
        assert!(text.contains(&bob.description));
        assert!(text.contains("five short sections"));
        assert!(text.contains("No markdown"));
        assert!(text.contains("Japanese"));
    }
}

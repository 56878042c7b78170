//! Face analysis and advice generation on top of the language model capability.

mod analysis;
mod controller;
mod prompts;
mod state;

pub use analysis::{
    describe_face_shape, extract_json_object, Advice, AdviceSections, FaceAnalysis, Features,
    FACE_SHAPES,
};
pub use controller::AiController;
pub use prompts::{advice_prompt, face_analysis_prompt};
pub use state::{OperationKind, OperationState, OperationStatus};

//! Gatekeeper for the on-device model.
//!
//! Each operation kind owns one `OperationState` and at most one in-flight
//! call. Failures are recorded, never retried here; the caller decides
//! whether to retry or skip using `recovery_options`.

use futures::future::{AbortHandle, Abortable, Aborted};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::analysis::{Advice, FaceAnalysis};
use super::prompts;
use super::state::{OperationKind, OperationState};
use crate::capability::{
    is_ready, Capabilities, CapabilityStatus, ImageBlob, LanguageModel, SessionOptions,
};
use crate::catalog::Hairstyle;
use crate::error::AiError;
use crate::i18n::{Language, LanguageSnapshot};
use crate::recovery::{RecoveryOptions, RecoveryPolicy};

#[derive(Default)]
struct Slot {
    state: OperationState,
    abort: Option<AbortHandle>,
    generation: u64,
}

#[derive(Default)]
struct Slots {
    face: Slot,
    advice: Slot,
}

impl Slots {
    fn get_mut(&mut self, kind: OperationKind) -> &mut Slot {
        match kind {
            OperationKind::FaceAnalysis => &mut self.face,
            OperationKind::AdviceGeneration => &mut self.advice,
        }
    }

    fn get(&self, kind: OperationKind) -> &Slot {
        match kind {
            OperationKind::FaceAnalysis => &self.face,
            OperationKind::AdviceGeneration => &self.advice,
        }
    }
}

/// Marks the run Cancelled if its future is dropped while still Running.
struct RunGuard<'a> {
    controller: &'a AiController,
    kind: OperationKind,
    generation: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.controller.slots();
        let slot = slots.get_mut(self.kind);
        if slot.generation == self.generation && slot.state.is_running() {
            debug!("{} dropped while running", self.kind);
            slot.state.fail(AiError::Cancelled, Instant::now());
            slot.abort = None;
        }
    }
}

pub struct AiController {
    model: Option<Arc<dyn LanguageModel>>,
    policy: RecoveryPolicy,
    language: Option<watch::Receiver<LanguageSnapshot>>,
    capability: watch::Sender<CapabilityStatus>,
    slots: Mutex<Slots>,
}

impl AiController {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, policy: RecoveryPolicy) -> Self {
        let (capability, _) = watch::channel(CapabilityStatus::Checking);
        Self {
            model,
            policy,
            language: None,
            capability,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn from_capabilities(capabilities: &Capabilities, policy: RecoveryPolicy) -> Self {
        Self::new(capabilities.model.clone(), policy)
    }

    /// Follow the UI language for model sessions. Without it, English is used.
    pub fn with_language(mut self, language: watch::Receiver<LanguageSnapshot>) -> Self {
        self.language = Some(language);
        self
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    pub fn capability_status(&self) -> CapabilityStatus {
        *self.capability.borrow()
    }

    pub fn subscribe_capability(&self) -> watch::Receiver<CapabilityStatus> {
        self.capability.subscribe()
    }

    pub fn state(&self, kind: OperationKind) -> OperationState {
        self.slots().get(kind).state.clone()
    }

    /// Whether any operation is currently running.
    pub fn is_loading(&self) -> bool {
        let slots = self.slots();
        OperationKind::ALL
            .iter()
            .any(|kind| slots.get(*kind).state.is_running())
    }

    /// Retry and skip affordances for a failed operation at `now`.
    pub fn recovery_options(&self, kind: OperationKind, now: Instant) -> RecoveryOptions {
        self.policy.options(&self.slots().get(kind).state, now)
    }

    /// Ask the model whether it is ready. Never fails.
    pub async fn check_capability(&self) -> bool {
        self.capability.send_replace(CapabilityStatus::Checking);
        let ready = match self.model.as_ref() {
            Some(model) => is_ready("Language model", model.availability().await),
            None => false,
        };
        let status = if ready {
            CapabilityStatus::Available
        } else {
            CapabilityStatus::Unavailable
        };
        self.capability.send_replace(status);
        ready
    }

    /// Classify the face in `image`, in the current UI language.
    pub async fn run_face_analysis(&self, image: ImageBlob) -> Result<FaceAnalysis, AiError> {
        let language = self.language_code();
        self.run(OperationKind::FaceAnalysis, async move {
            let model = self.ready_model().await?;
            let session = model
                .create(SessionOptions::image_to_text(language))
                .await
                .map_err(model_error)?;
            let reply = session
                .prompt(prompts::face_analysis_prompt(image))
                .await
                .map_err(model_error)?;
            debug!("Face analysis reply: {}", reply);
            FaceAnalysis::parse_reply(&reply)
        })
        .await
    }

    /// Ask for plain-text advice on `hairstyle` for this face.
    pub async fn run_advice_generation(
        &self,
        face: &FaceAnalysis,
        hairstyle: &Hairstyle,
    ) -> Result<Advice, AiError> {
        let language = self.language();
        self.run(OperationKind::AdviceGeneration, async move {
            let model = self.ready_model().await?;
            let session = model
                .create(SessionOptions::text_to_text(language.code()))
                .await
                .map_err(model_error)?;
            let reply = session
                .prompt(prompts::advice_prompt(face, hairstyle, language))
                .await
                .map_err(model_error)?;
            let text = reply.trim();
            if text.is_empty() {
                return Err(AiError::ResponseFormat("empty advice".to_string()));
            }
            Ok(Advice::generated(text))
        })
        .await
    }

    /// Abort one operation. Returns whether something was in flight.
    pub fn cancel(&self, kind: OperationKind) -> bool {
        let handle = self.slots().get_mut(kind).abort.take();
        match handle {
            Some(handle) => {
                info!("Cancelling {}", kind);
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every in-flight operation of this controller.
    pub fn cancel_operation(&self) {
        for kind in OperationKind::ALL {
            self.cancel(kind);
        }
    }

    /// Reset error and retry counter on both operations without cancelling.
    pub fn clear_error(&self) {
        for kind in OperationKind::ALL {
            self.clear_error_for(kind);
        }
    }

    pub fn clear_error_for(&self, kind: OperationKind) {
        self.slots().get_mut(kind).state.clear_error();
    }

    /// Resolve face analysis with the deterministic sample result.
    pub fn skip_face_analysis(&self) -> Result<FaceAnalysis, AiError> {
        self.skip(OperationKind::FaceAnalysis)?;
        info!("Face analysis skipped, using sample result");
        Ok(FaceAnalysis::mock())
    }

    /// Resolve advice generation with sample advice for this face and style.
    pub fn skip_advice(&self, face: &FaceAnalysis, hairstyle: &Hairstyle) -> Result<Advice, AiError> {
        self.skip(OperationKind::AdviceGeneration)?;
        info!("Advice generation skipped, using sample advice");
        Ok(Advice::mock(face, hairstyle))
    }

    fn skip(&self, kind: OperationKind) -> Result<(), AiError> {
        let mut slots = self.slots();
        let state = &mut slots.get_mut(kind).state;
        state.check_skip()?;
        state.succeed(true);
        Ok(())
    }

    async fn ready_model(&self) -> Result<Arc<dyn LanguageModel>, AiError> {
        if !self.check_capability().await {
            return Err(AiError::CapabilityUnavailable);
        }
        self.model.clone().ok_or(AiError::CapabilityUnavailable)
    }

    fn language(&self) -> Language {
        self.language
            .as_ref()
            .map(|rx| rx.borrow().current_language)
            .unwrap_or(Language::ENGLISH)
    }

    fn language_code(&self) -> &'static str {
        self.language().code()
    }

    /// Drive `work` as the single in-flight call of `kind`.
    async fn run<T, F>(&self, kind: OperationKind, work: F) -> Result<T, AiError>
    where
        F: Future<Output = Result<T, AiError>>,
    {
        let (handle, registration) = AbortHandle::new_pair();
        let generation = {
            let mut slots = self.slots();
            let slot = slots.get_mut(kind);
            if let Some(previous) = slot.abort.replace(handle) {
                debug!("Superseding in-flight {}", kind);
                previous.abort();
            }
            slot.generation += 1;
            slot.state.begin();
            slot.generation
        };
        let _guard = RunGuard {
            controller: self,
            kind,
            generation,
        };

        let result = match Abortable::new(work, registration).await {
            Ok(result) => result,
            Err(Aborted) => Err(AiError::Cancelled),
        };

        let mut slots = self.slots();
        let slot = slots.get_mut(kind);
        if slot.generation == generation {
            slot.abort = None;
            match &result {
                Ok(_) => slot.state.succeed(false),
                Err(e) => {
                    warn!("{} failed: {}", kind, e);
                    slot.state.fail(e.clone(), Instant::now());
                }
            }
        }
        result
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn model_error(err: anyhow::Error) -> AiError {
    AiError::Model(format!("{:#}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::OperationStatus;
    use crate::capability::mock::{MockModel, MockReply};
    use crate::capability::{Availability, Modality};
    use crate::catalog;
    use std::time::Duration;

    const ROUND_REPLY: &str =
        r#"{"faceShape":"Round","confidence":"92%","features":{"symmetry":"Good","proportions":"Balanced"}}"#;

    fn controller_with(model: &MockModel) -> AiController {
        AiController::new(
            Some(Arc::new(model.clone()) as Arc<dyn LanguageModel>),
            RecoveryPolicy::immediate(),
        )
    }

    fn image() -> ImageBlob {
        ImageBlob::jpeg(vec![0xFF, 0xD8, 0xFF])
    }

    fn text(reply: &str) -> MockReply {
        MockReply::Text(reply.to_string())
    }

    // ==================== Capability Tests ====================

    #[tokio::test]
    async fn test_check_capability() {
        let model = MockModel::new(Availability::Available);
        let controller = controller_with(&model);
        assert_eq!(controller.capability_status(), CapabilityStatus::Checking);
        assert!(controller.check_capability().await);
        assert_eq!(controller.capability_status(), CapabilityStatus::Available);

        model.set_availability(Availability::Downloadable);
        assert!(!controller.check_capability().await);
        assert_eq!(controller.capability_status(), CapabilityStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_unavailable_scenario() {
        let controller = AiController::new(None, RecoveryPolicy::immediate());

        let err = controller.run_face_analysis(image()).await.unwrap_err();
        assert_eq!(err, AiError::CapabilityUnavailable);

        let state = controller.state(OperationKind::FaceAnalysis);
        assert_eq!(state.status, OperationStatus::Failed);
        assert_eq!(state.retry_count, 0);
        assert!(!controller.is_loading());

        let options = controller.recovery_options(OperationKind::FaceAnalysis, Instant::now());
        assert!(options.can_skip);
        assert!(options.troubleshooting);

        let mock = controller.skip_face_analysis().unwrap();
        assert_eq!(mock.face_shape, "Oval");
        assert_eq!(mock.confidence, "90%");
        assert!(mock.is_mock);

        let state = controller.state(OperationKind::FaceAnalysis);
        assert_eq!(state.status, OperationStatus::Succeeded);
        assert!(state.is_mock);
    }

    #[tokio::test]
    async fn test_capability_revalidated_every_run() {
        let model = MockModel::replying([text(ROUND_REPLY)]);
        let controller = controller_with(&model);
        assert!(controller.run_face_analysis(image()).await.is_ok());

        model.set_availability(Availability::Unavailable);
        assert_eq!(
            controller.run_face_analysis(image()).await,
            Err(AiError::CapabilityUnavailable)
        );
        assert_eq!(model.prompt_count(), 1);
    }

    // ==================== Face Analysis Tests ====================

    #[tokio::test]
    async fn test_round_scenario() {
        let model = MockModel::replying([text(ROUND_REPLY)]);
        let controller = controller_with(&model);

        let analysis = controller.run_face_analysis(image()).await.unwrap();
        assert_eq!(analysis.face_shape, "Round");
        assert_eq!(analysis.confidence, "92%");
        assert!(!analysis.is_mock);

        let state = controller.state(OperationKind::FaceAnalysis);
        assert_eq!(state.status, OperationStatus::Succeeded);
        assert!(state.error.is_none());

        let sessions = model.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].expected_inputs, vec![Modality::Text, Modality::Image]);
        assert_eq!(sessions[0].language, "en");
        assert!(model.prompts()[0][0].has_image());

        let lob = catalog::recommended_for(&analysis.face_shape)
            .into_iter()
            .find(|s| s.name == "Lob");
        assert!(lob.is_some());
    }

    #[tokio::test]
    async fn test_no_face_scenario() {
        let model = MockModel::replying([text(r#"{"error":"No face detected"}"#)]);
        let controller = controller_with(&model);

        let err = controller.run_face_analysis(image()).await.unwrap_err();
        assert_eq!(err, AiError::NoFaceDetected("No face detected".to_string()));
        assert_eq!(err.to_string(), "No face detected");

        let state = controller.state(OperationKind::FaceAnalysis);
        assert_eq!(state.status, OperationStatus::Failed);
        assert_eq!(state.retry_count, 1);

        let options = controller.recovery_options(OperationKind::FaceAnalysis, Instant::now());
        assert!(options.can_retry);
        assert!(options.can_skip);
        assert!(!options.troubleshooting);

        let mock = controller.skip_face_analysis().unwrap();
        assert!(mock.is_mock);
        assert_eq!(
            controller.state(OperationKind::FaceAnalysis).status,
            OperationStatus::Succeeded
        );
    }

    #[tokio::test]
    async fn test_retry_counting() {
        let model = MockModel::replying([text("garbage"), text("still garbage"), text(ROUND_REPLY)]);
        let controller = controller_with(&model);

        for _ in 0..2 {
            assert!(matches!(
                controller.run_face_analysis(image()).await,
                Err(AiError::ResponseFormat(_))
            ));
        }
        assert_eq!(controller.state(OperationKind::FaceAnalysis).retry_count, 2);

        assert!(controller.run_face_analysis(image()).await.is_ok());
        let state = controller.state(OperationKind::FaceAnalysis);
        assert_eq!(state.status, OperationStatus::Succeeded);
        assert_eq!(state.retry_count, 2);
    }

    #[tokio::test]
    async fn test_retry_withdrawn_after_budget() {
        let model = MockModel::replying((0..3).map(|_| MockReply::Fail("busy".to_string())));
        let controller = controller_with(&model);

        for _ in 0..3 {
            assert!(matches!(
                controller.run_face_analysis(image()).await,
                Err(AiError::Model(_))
            ));
        }
        let options = controller.recovery_options(OperationKind::FaceAnalysis, Instant::now());
        assert!(!options.can_retry);
        assert!(options.can_skip);
        assert_eq!(options.attempts, 3);
    }

    #[tokio::test]
    async fn test_session_follows_ui_language() {
        let (tx, rx) = watch::channel(LanguageSnapshot {
            current_language: Language::from_code("ko").unwrap(),
            is_translating: false,
            fallback_active: false,
            last_error: None,
            detected_language: None,
            table: crate::i18n::TranslationTable::english(),
        });
        let model = MockModel::replying([text(ROUND_REPLY)]);
        let controller = controller_with(&model).with_language(rx);

        controller.run_face_analysis(image()).await.unwrap();
        assert_eq!(model.sessions()[0].language, "ko");
        drop(tx);
    }

    // ==================== Cancellation Tests ====================

    #[tokio::test]
    async fn test_cancel_in_flight() {
        let model = MockModel::replying([MockReply::Hang]);
        let controller = controller_with(&model);

        let canceller = async {
            while !controller.state(OperationKind::FaceAnalysis).is_running() {
                tokio::task::yield_now().await;
            }
            tokio::task::yield_now().await;
            controller.cancel_operation();
        };

        let (result, _) = tokio::join!(controller.run_face_analysis(image()), canceller);
        assert_eq!(result, Err(AiError::Cancelled));

        let state = controller.state(OperationKind::FaceAnalysis);
        assert_eq!(state.status, OperationStatus::Cancelled);
        assert_eq!(state.retry_count, 0);
        assert_eq!(state.error.map(|e| e.to_string()).as_deref(), Some("cancelled by user"));
        assert!(!controller.is_loading());

        let options = controller.recovery_options(OperationKind::FaceAnalysis, Instant::now());
        assert!(!options.can_skip);
    }

    #[tokio::test]
    async fn test_cancel_when_idle_is_noop() {
        let controller = controller_with(&MockModel::new(Availability::Available));
        assert!(!controller.cancel(OperationKind::AdviceGeneration));
        assert_eq!(
            controller.state(OperationKind::AdviceGeneration).status,
            OperationStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_dropped_future_releases_loading_flag() {
        let model = MockModel::replying([MockReply::Hang]);
        let controller = controller_with(&model);

        let outcome =
            tokio::time::timeout(Duration::from_millis(20), controller.run_face_analysis(image()))
                .await;
        assert!(outcome.is_err());

        let state = controller.state(OperationKind::FaceAnalysis);
        assert_eq!(state.status, OperationStatus::Cancelled);
        assert!(!controller.is_loading());
    }

    // ==================== Advice Tests ====================

    #[tokio::test]
    async fn test_advice_generation() {
        let model = MockModel::replying([text("  Why it suits you\nIt frames the face.  ")]);
        let controller = controller_with(&model);
        let bob = catalog::find(1).unwrap();

        let advice = controller
            .run_advice_generation(&FaceAnalysis::mock(), &bob)
            .await
            .unwrap();
        assert_eq!(advice.text, "Why it suits you\nIt frames the face.");
        assert!(!advice.is_mock);

        let sessions = model.sessions();
        assert!(!sessions[0].accepts_images());
        assert!(!model.prompts()[0][0].has_image());
    }

    #[tokio::test]
    async fn test_empty_advice_is_format_error() {
        let model = MockModel::replying([text("   ")]);
        let controller = controller_with(&model);
        let err = controller
            .run_advice_generation(&FaceAnalysis::mock(), &catalog::find(2).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::ResponseFormat(_)));
        assert_eq!(controller.state(OperationKind::AdviceGeneration).retry_count, 1);
        assert_eq!(controller.state(OperationKind::FaceAnalysis).status, OperationStatus::Idle);
    }

    #[tokio::test]
    async fn test_skip_advice_after_failure() {
        let model = MockModel::replying([MockReply::Fail("overloaded".to_string())]);
        let controller = controller_with(&model);
        let face = FaceAnalysis::mock();
        let waves = catalog::find(3).unwrap();

        assert!(controller.run_advice_generation(&face, &waves).await.is_err());
        let advice = controller.skip_advice(&face, &waves).unwrap();
        assert!(advice.is_mock);
        assert!(advice.text.contains("Big Waves"));
    }

    // ==================== Error Management Tests ====================

    #[tokio::test]
    async fn test_skip_after_success_is_rejected() {
        let model = MockModel::replying([text(ROUND_REPLY)]);
        let controller = controller_with(&model);
        controller.run_face_analysis(image()).await.unwrap();

        assert_eq!(
            controller.skip_face_analysis(),
            Err(AiError::InvalidTransition {
                action: "skip",
                status: "succeeded"
            })
        );
    }

    #[tokio::test]
    async fn test_skip_waits_for_grace_period() {
        let model = MockModel::replying([text("garbage")]);
        let controller = AiController::new(
            Some(Arc::new(model) as Arc<dyn LanguageModel>),
            RecoveryPolicy::new(3).with_skip_grace(Duration::from_secs(3)),
        );
        assert!(controller.run_face_analysis(image()).await.is_err());

        let now = Instant::now();
        assert!(!controller.recovery_options(OperationKind::FaceAnalysis, now).can_skip);
        assert!(
            controller
                .recovery_options(OperationKind::FaceAnalysis, now + Duration::from_secs(4))
                .can_skip
        );
    }

    #[tokio::test]
    async fn test_clear_error_resets_both() {
        let model = MockModel::replying([text("x"), MockReply::Fail("y".to_string())]);
        let controller = controller_with(&model);
        let _ = controller.run_face_analysis(image()).await;
        let _ = controller
            .run_advice_generation(&FaceAnalysis::mock(), &catalog::find(1).unwrap())
            .await;

        controller.clear_error();
        for kind in OperationKind::ALL {
            let state = controller.state(kind);
            assert_eq!(state.status, OperationStatus::Idle);
            assert_eq!(state.retry_count, 0);
            assert!(state.error.is_none());
        }
    }
}

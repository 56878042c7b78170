//! Manual retry and skip policy for failed AI operations.
//!
//! Nothing here retries on its own. The policy only answers what the UI may
//! offer after a failure: another attempt (bounded) and, once a short grace
//! period has passed, a skip to deterministic mock data.

use std::time::{Duration, Instant};

use crate::ai::{OperationState, OperationStatus};
use crate::error::AiError;

/// Configuration for manual recovery affordances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Maximum number of counted failed attempts before retry is withdrawn
    pub max_manual_retries: u32,
    /// Delay after a failure before the skip-to-mock path is offered
    pub skip_grace: Duration,
}

impl RecoveryPolicy {
    /// Create a new recovery policy
    pub fn new(max_manual_retries: u32) -> Self {
        Self {
            max_manual_retries,
            skip_grace: Duration::from_secs(3),
        }
    }

    /// Set the grace period before skip is offered
    pub fn with_skip_grace(mut self, skip_grace: Duration) -> Self {
        self.skip_grace = skip_grace;
        self
    }

    /// Preset: skip offered immediately (headless runs and tests)
    pub fn immediate() -> Self {
        Self::new(3).with_skip_grace(Duration::ZERO)
    }

    /// Evaluate what the UI may offer for an operation at `now`.
    pub fn options(&self, state: &OperationState, now: Instant) -> RecoveryOptions {
        if state.status != OperationStatus::Failed {
            return RecoveryOptions::default();
        }

        let error = state.error.as_ref();
        let cancelled = matches!(error, Some(AiError::Cancelled));
        let grace_elapsed = state
            .failed_at
            .map(|at| now.saturating_duration_since(at) >= self.skip_grace)
            .unwrap_or(true);

        RecoveryOptions {
            can_retry: state.retry_count < self.max_manual_retries,
            can_skip: !cancelled && grace_elapsed,
            troubleshooting: error.map(AiError::is_capability_fault).unwrap_or(false),
            attempts: state.retry_count,
        }
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Affordances available for a failed operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryOptions {
    /// Retry button enabled
    pub can_retry: bool,
    /// Skip-to-mock button shown
    pub can_skip: bool,
    /// Frame the failure as an AI problem (not a photo problem)
    pub troubleshooting: bool,
    /// Visible attempt counter
    pub attempts: u32,
}

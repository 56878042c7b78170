//! Per-operation state machine.
//!
//! ```text
//! Idle ──begin──▶ Running ──succeed──▶ Succeeded
//!                   │  ├───fail─────▶ Failed ──begin (retry)──▶ Running
//!                   │  └──cancel───▶ Cancelled          └─skip─▶ Succeeded (mock)
//! ```
//!
//! Transitions are plain functions so the machine can be driven headlessly.

use serde::Serialize;
use std::fmt;
use std::time::Instant;

use crate::error::AiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    FaceAnalysis,
    AdviceGeneration,
}

impl OperationKind {
    pub const ALL: [OperationKind; 2] = [OperationKind::FaceAnalysis, OperationKind::AdviceGeneration];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::FaceAnalysis => "face_analysis",
            OperationKind::AdviceGeneration => "advice_generation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Idle => "idle",
            OperationStatus::Running => "running",
            OperationStatus::Succeeded => "succeeded",
            OperationStatus::Failed => "failed",
            OperationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Cancelled)
    }
}

/// Observable state of one operation kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationState {
    pub status: OperationStatus,
    pub error: Option<AiError>,
    /// Counted failed attempts since the last `clear_error`.
    pub retry_count: u32,
    pub failed_at: Option<Instant>,
    /// Whether the last success came from the skip path.
    pub is_mock: bool,
}

impl OperationState {
    pub fn is_running(&self) -> bool {
        self.status == OperationStatus::Running
    }

    /// Enter Running, clearing the previous error. The retry count is kept.
    pub fn begin(&mut self) {
        self.status = OperationStatus::Running;
        self.error = None;
        self.failed_at = None;
        self.is_mock = false;
    }

    pub fn succeed(&mut self, is_mock: bool) {
        self.status = OperationStatus::Succeeded;
        self.error = None;
        self.failed_at = None;
        self.is_mock = is_mock;
    }

    /// Record `error`, routing `Cancelled` to its own terminal state.
    pub fn fail(&mut self, error: AiError, now: Instant) {
        if error == AiError::Cancelled {
            self.status = OperationStatus::Cancelled;
            self.failed_at = None;
        } else {
            self.status = OperationStatus::Failed;
            self.failed_at = Some(now);
        }
        if error.counts_as_attempt() {
            self.retry_count += 1;
        }
        self.error = Some(error);
    }

    /// Skip is allowed from Failed, or from Idle when nothing was attempted.
    pub fn check_skip(&self) -> Result<(), AiError> {
        match self.status {
            OperationStatus::Failed | OperationStatus::Idle => Ok(()),
            status => Err(AiError::InvalidTransition {
                action: "skip",
                status: status.as_str(),
            }),
        }
    }

    /// Reset error and retry counter. The status leaves Failed for Idle.
    pub fn clear_error(&mut self) {
        self.error = None;
        self.retry_count = 0;
        self.failed_at = None;
        if self.status == OperationStatus::Failed {
            self.status = OperationStatus::Idle;
        }
    }
}

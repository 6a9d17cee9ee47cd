use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{is_submittable, DUPLICATE_EMAIL_MESSAGE, GENERIC_FAILURE_MESSAGE};
use super::gateway::{InsertOutcome, WaitlistGateway};

/// Mutable form state for one page session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SubmissionState {
    candidate_email: String,
    is_submitting: bool,
    last_error: Option<String>,
    is_completed: bool,
}

/// Where the sign-up flow currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "message", rename_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Completed,
    Failed(String),
}

/// Read-only copy of the controller state handed to the presentation layer.
/// The default is the state of a freshly loaded page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionSnapshot {
    pub candidate_email: String,
    pub is_submitting: bool,
    pub last_error: Option<String>,
    pub is_completed: bool,
    pub phase: SubmissionPhase,
}

/// Why a submit call did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidEmail,
    InFlight,
    AlreadyCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Duplicate,
    Backend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionResult {
    Succeeded,
    Failed { error: String, kind: FailureKind },
    Skipped { reason: SkipReason },
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Drives the waitlist sign-up for one session, allowing at most one
/// backend insert in flight at a time.
#[derive(Debug)]
pub struct WaitlistController {
    gateway: Arc<dyn WaitlistGateway>,
    state: Arc<Mutex<SubmissionState>>,
}

impl WaitlistController {
    pub fn new(gateway: Arc<dyn WaitlistGateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(Mutex::new(SubmissionState::default())),
        }
    }

    pub fn candidate_email(&self) -> String {
        self.lock().candidate_email.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().is_submitting
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn is_completed(&self) -> bool {
        self.lock().is_completed
    }

    pub fn phase(&self) -> SubmissionPhase {
        phase_of(&self.lock())
    }

    pub fn snapshot(&self) -> SubmissionSnapshot {
        let state = self.lock();
        SubmissionSnapshot {
            candidate_email: state.candidate_email.clone(),
            is_submitting: state.is_submitting,
            last_error: state.last_error.clone(),
            is_completed: state.is_completed,
            phase: phase_of(&state),
        }
    }

    /// Mirrors a keystroke in the email field. Stays live during a submit.
    pub fn on_candidate_change(&self, value: impl Into<String>) {
        self.lock().candidate_email = value.into();
    }

    pub fn clear_error(&self) {
        self.lock().last_error = None;
    }

    /// Submits whatever is currently in the email field.
    pub async fn submit_current(&self) -> SubmissionResult {
        let candidate = self.candidate_email();
        self.submit(&candidate).await
    }

    /// Submits `candidate` unless it fails validation, a submit is already in
    /// flight, or the sign-up has completed. The insert runs on its own task
    /// and always settles the state, even if this future is dropped first.
    pub async fn submit(&self, candidate: &str) -> SubmissionResult {
        if !is_submittable(candidate) {
            debug!("waitlist submit skipped: candidate failed local validation");
            return SubmissionResult::Skipped {
                reason: SkipReason::InvalidEmail,
            };
        }

        if let Err(reason) = self.begin() {
            debug!(?reason, "waitlist submit skipped");
            return SubmissionResult::Skipped { reason };
        }

        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);
        let email = candidate.to_string();
        let insert = tokio::spawn(async move {
            let outcome = gateway.insert(&email).await;
            settle(&state, outcome)
        });

        match insert.await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "waitlist insert task ended without an outcome");
                settle(&self.state, InsertOutcome::OtherFailure(String::new()))
            }
        }
    }

    fn begin(&self) -> Result<(), SkipReason> {
        let mut state = self.lock();
        if state.is_submitting {
            return Err(SkipReason::InFlight);
        }
        if state.is_completed {
            return Err(SkipReason::AlreadyCompleted);
        }
        state.last_error = None;
        state.is_submitting = true;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<SubmissionState>) -> MutexGuard<'_, SubmissionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn phase_of(state: &SubmissionState) -> SubmissionPhase {
    if state.is_completed {
        SubmissionPhase::Completed
    } else if state.is_submitting {
        SubmissionPhase::Submitting
    } else if let Some(message) = &state.last_error {
        SubmissionPhase::Failed(message.clone())
    } else {
        SubmissionPhase::Idle
    }
}

/// Applies the gateway's answer and releases the single-flight slot.
fn settle(state: &Mutex<SubmissionState>, outcome: InsertOutcome) -> SubmissionResult {
    let mut state = lock_state(state);
    state.is_submitting = false;

    match outcome {
        InsertOutcome::Success => {
            state.is_completed = true;
            state.candidate_email.clear();
            info!("waitlist sign-up completed");
            SubmissionResult::Succeeded
        }
        InsertOutcome::DuplicateConflict => {
            info!("waitlist sign-up rejected: address already registered");
            state.last_error = Some(DUPLICATE_EMAIL_MESSAGE.to_string());
            SubmissionResult::Failed {
                error: DUPLICATE_EMAIL_MESSAGE.to_string(),
                kind: FailureKind::Duplicate,
            }
        }
        InsertOutcome::OtherFailure(message) => {
            let error = if message.trim().is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                message
            };
            warn!(error = %error, "waitlist sign-up failed");
            state.last_error = Some(error.clone());
            SubmissionResult::Failed {
                error,
                kind: FailureKind::Backend,
            }
        }
    }
}

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::{BackendError, VerificationBackend};
use super::capture::{CaptureError, CaptureRequest, CaptureSdk};
use super::domain::{ApplicantDraft, RunId, VerificationRun};
use super::intake::{IntakeGuard, IntakeViolation};
use super::poller::{PollOutcome, TIMEOUT_MESSAGE};
use super::view::FinalResult;

/// Which screen the session is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Home,
    Form,
    Capture,
    Pending,
    Final,
    Error,
}

/// Error raised by session operations.
///
/// Every variant also lands the session in [`ViewState::Error`] with a
/// human-readable message; the typed error exists for embedders that want to
/// log or branch on the cause.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("{TIMEOUT_MESSAGE}")]
    PollTimeout,
}

/// Receipt for a poll started on behalf of this session.
///
/// The poller itself is cancellation-unaware beyond its token; the ticket's
/// generation stamp is what lets the session discard an outcome that arrives
/// after the user has already navigated away or resubmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub run_id: RunId,
    generation: u64,
}

/// The per-session state machine driving the verification wizard.
///
/// Owns the current screen, the applicant draft, the error message, the final
/// result, and at most one live capture handle. Exactly one instance exists
/// per active session; it is discarded and recreated on cleanup.
pub struct Session<B, C: CaptureSdk> {
    backend: Arc<B>,
    capture_sdk: Arc<C>,
    guard: IntakeGuard,
    workflow_id: String,
    view: ViewState,
    draft: ApplicantDraft,
    run: Option<VerificationRun>,
    capture: Option<C::Handle>,
    error: Option<String>,
    result: Option<FinalResult>,
    generation: u64,
}

impl<B, C> Session<B, C>
where
    B: VerificationBackend,
    C: CaptureSdk,
{
    pub fn new(
        backend: Arc<B>,
        capture_sdk: Arc<C>,
        guard: IntakeGuard,
        workflow_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            capture_sdk,
            guard,
            workflow_id: workflow_id.into(),
            view: ViewState::Home,
            draft: ApplicantDraft::default(),
            run: None,
            capture: None,
            error: None,
            result: None,
            generation: 0,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn draft(&self) -> &ApplicantDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ApplicantDraft {
        &mut self.draft
    }

    pub fn run(&self) -> Option<&VerificationRun> {
        self.run.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&FinalResult> {
        self.result.as_ref()
    }

    /// The user activated the entry point on the home screen.
    pub fn activate(&mut self) {
        if self.view == ViewState::Home {
            self.view = ViewState::Form;
        }
    }

    /// Submit the draft: validate, create applicant and run, mount capture.
    ///
    /// A draft that fails validation never reaches the network. The two
    /// creation calls are sequential; if either fails the whole submission
    /// fails and no partial run is kept. Any previous capture handle is
    /// released before a new one is acquired.
    pub async fn submit(&mut self) -> Result<(), SessionError> {
        debug_assert_eq!(self.view, ViewState::Form, "submit outside the form screen");
        let payload = match self.guard.payload_from_draft(&self.draft) {
            Ok(payload) => payload,
            Err(violation) => {
                debug!(error = %violation, "draft rejected client-side");
                self.fail(violation.to_string());
                return Err(violation.into());
            }
        };

        let run = match self.create_run(&payload).await {
            Ok(run) => run,
            Err(err) => {
                warn!(error = %err, "submission failed");
                self.fail(err.to_string());
                return Err(err.into());
            }
        };

        // New attempt: anything still in flight for the old one is stale.
        self.generation += 1;
        self.release_capture();

        let request = CaptureRequest::new(run.sdk_token.clone(), run.id.clone());
        match self.capture_sdk.acquire(&request) {
            Ok(handle) => {
                info!(run = %run.id.0, "capture widget mounted");
                self.capture = Some(handle);
                self.run = Some(run);
                self.error = None;
                self.view = ViewState::Capture;
                Ok(())
            }
            Err(err) => {
                self.fail(err.to_string());
                Err(err.into())
            }
        }
    }

    async fn create_run(&self, payload: &super::domain::ApplicantPayload) -> Result<VerificationRun, BackendError> {
        let applicant = self.backend.create_applicant(payload).await?;
        self.backend.create_run(&self.workflow_id, &applicant).await
    }

    /// The capture widget reported completion; move to the pending screen.
    ///
    /// Returns the ticket the embedder passes to the poller and then back to
    /// [`Session::apply_poll`]. Returns `None` when no capture is in
    /// progress (e.g. a late callback after cleanup).
    pub fn capture_completed(&mut self) -> Option<PollTicket> {
        if self.view != ViewState::Capture {
            return None;
        }
        let run_id = self.run.as_ref()?.id.clone();
        self.view = ViewState::Pending;
        Some(PollTicket {
            run_id,
            generation: self.generation,
        })
    }

    /// The capture widget reported an error.
    pub fn capture_failed(&mut self, message: impl Into<String>) {
        self.fail(message.into());
    }

    /// Apply a poll outcome, fetching the full run record on success.
    ///
    /// An outcome stamped with an older generation belongs to a session the
    /// user has since reset; it is discarded without touching the state. The
    /// run-record fetch is required; a fresh webhook-record fetch is
    /// best-effort, falling back to the record the poller already observed.
    pub async fn apply_poll(
        &mut self,
        ticket: PollTicket,
        outcome: PollOutcome,
    ) -> Result<(), SessionError> {
        if ticket.generation != self.generation {
            debug!(run = %ticket.run_id.0, "discarding poll outcome for stale session");
            return Ok(());
        }

        match outcome {
            PollOutcome::Terminal(record) => {
                let run_record = match self.backend.fetch_run(&ticket.run_id).await {
                    Ok(run_record) => run_record,
                    Err(err) => {
                        warn!(error = %err, "run record fetch failed after completion");
                        self.fail(err.to_string());
                        return Err(err.into());
                    }
                };
                let completion = match self.backend.fetch_completion(&ticket.run_id).await {
                    Ok(fresh) => fresh,
                    Err(err) => {
                        debug!(error = %err, "webhook refetch failed; using polled record");
                        record
                    }
                };

                let result = FinalResult::build(&run_record, Some(&completion), &self.draft);
                info!(run = %ticket.run_id.0, status = %result.status, "verification finished");
                self.result = Some(result);
                self.error = None;
                self.view = ViewState::Final;
                Ok(())
            }
            PollOutcome::TimedOut => {
                self.fail(TIMEOUT_MESSAGE.to_string());
                Err(SessionError::PollTimeout)
            }
            PollOutcome::Cancelled => {
                // Cancellation always follows a reset, so the generation
                // check above has normally consumed it already.
                debug!(run = %ticket.run_id.0, "poll cancelled");
                Ok(())
            }
        }
    }

    /// The user chose to try again from the error (or final) screen.
    ///
    /// The draft is kept so the applicant does not retype everything.
    pub fn retry(&mut self) {
        if matches!(self.view, ViewState::Error | ViewState::Final) {
            self.error = None;
            self.view = ViewState::Form;
        }
    }

    /// Full cleanup back to the home screen, from any state.
    ///
    /// Releases the capture handle (a no-op when none is live), clears the
    /// draft and result, and invalidates any in-flight poll.
    pub fn close(&mut self) {
        self.generation += 1;
        self.release_capture();
        self.draft = ApplicantDraft::default();
        self.run = None;
        self.error = None;
        self.result = None;
        self.view = ViewState::Home;
    }

    fn fail(&mut self, message: String) {
        self.error = Some(message);
        self.view = ViewState::Error;
    }

    fn release_capture(&mut self) {
        if let Some(handle) = self.capture.take() {
            self.capture_sdk.release(handle);
        }
    }
}

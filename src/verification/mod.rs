//! Identity-verification onboarding flow: applicant intake, capture hand-off,
//! completion polling, and result presentation.
//!
//! The session state machine owns screen transitions and resource cleanup;
//! the completion poller waits for the backend's webhook-fed status endpoint
//! to reach a terminal state. Everything network-facing sits behind the
//! [`VerificationBackend`] trait so the flow can be driven end-to-end against
//! in-memory fakes.

pub mod backend;
pub mod capture;
pub mod client;
pub mod domain;
pub(crate) mod intake;
pub mod poller;
pub mod session;
pub mod view;

#[cfg(test)]
mod tests;

pub use backend::{BackendError, VerificationBackend};
pub use capture::{CaptureError, CaptureRequest, CaptureSdk, DEFAULT_MOUNT_ID};
pub use client::HttpBackend;
pub use domain::{
    ApplicantDraft, ApplicantId, ApplicantPayload, CheckBreakdown, CompletionRecord,
    OutputAddress, RunId, RunRecord, StructuredAddress, VerificationOutput, VerificationRun,
};
pub use intake::{IntakeGuard, IntakePolicy, IntakeViolation};
pub use poller::{
    await_completion, PollOutcome, PollSettings, TerminalPolicy, TIMEOUT_MESSAGE,
};
pub use session::{PollTicket, Session, SessionError, ViewState};
pub use view::{FinalResult, PLACEHOLDER};

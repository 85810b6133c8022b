use async_trait::async_trait;

use super::domain::{
    ApplicantId, ApplicantPayload, CompletionRecord, RunId, RunRecord, VerificationRun,
};

/// Failure modes for a single backend call.
///
/// `Api` carries the backend's own `error` body field when one was present so
/// the session can surface it verbatim; the other variants cover transport
/// drops and undecodable bodies.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Backend collaborator abstraction so the session and poller can be
/// exercised against in-memory fakes.
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// `POST /api/applicants`
    async fn create_applicant(
        &self,
        payload: &ApplicantPayload,
    ) -> Result<ApplicantId, BackendError>;

    /// `POST /api/workflow_runs`
    async fn create_run(
        &self,
        workflow_id: &str,
        applicant: &ApplicantId,
    ) -> Result<VerificationRun, BackendError>;

    /// `GET /api/workflow_runs/{id}`
    async fn fetch_run(&self, run: &RunId) -> Result<RunRecord, BackendError>;

    /// `GET /api/webhook_runs/{id}`
    async fn fetch_completion(&self, run: &RunId) -> Result<CompletionRecord, BackendError>;
}

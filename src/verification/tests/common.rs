use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::verification::backend::{BackendError, VerificationBackend};
use crate::verification::capture::{CaptureError, CaptureRequest, CaptureSdk};
use crate::verification::domain::{
    ApplicantDraft, ApplicantId, ApplicantPayload, CompletionRecord, OutputAddress, RunId,
    RunRecord, VerificationOutput, VerificationRun,
};

/// Backend fake driven by scripted per-endpoint response queues.
///
/// An empty queue yields a benign default for the creation/run endpoints and
/// a transport error for the webhook endpoint (no callback data yet), which
/// is what the poller sees on a quiet backend.
#[derive(Default)]
pub(super) struct ScriptedBackend {
    applicant_responses: Mutex<VecDeque<Result<ApplicantId, BackendError>>>,
    run_responses: Mutex<VecDeque<Result<VerificationRun, BackendError>>>,
    run_records: Mutex<VecDeque<Result<RunRecord, BackendError>>>,
    completions: Mutex<VecDeque<Result<CompletionRecord, BackendError>>>,
    created_payloads: Mutex<Vec<ApplicantPayload>>,
    applicant_calls: AtomicUsize,
    run_calls: AtomicUsize,
    record_calls: AtomicUsize,
    completion_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(super) fn push_applicant(&self, response: Result<ApplicantId, BackendError>) {
        self.applicant_responses.lock().expect("lock").push_back(response);
    }

    pub(super) fn push_run(&self, response: Result<VerificationRun, BackendError>) {
        self.run_responses.lock().expect("lock").push_back(response);
    }

    pub(super) fn push_record(&self, response: Result<RunRecord, BackendError>) {
        self.run_records.lock().expect("lock").push_back(response);
    }

    pub(super) fn push_completion(&self, response: Result<CompletionRecord, BackendError>) {
        self.completions.lock().expect("lock").push_back(response);
    }

    pub(super) fn applicant_calls(&self) -> usize {
        self.applicant_calls.load(Ordering::Relaxed)
    }

    pub(super) fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::Relaxed)
    }

    pub(super) fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::Relaxed)
    }

    pub(super) fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::Relaxed)
    }

    pub(super) fn created_payloads(&self) -> Vec<ApplicantPayload> {
        self.created_payloads.lock().expect("lock").clone()
    }
}

#[async_trait]
impl VerificationBackend for ScriptedBackend {
    async fn create_applicant(
        &self,
        payload: &ApplicantPayload,
    ) -> Result<ApplicantId, BackendError> {
        self.applicant_calls.fetch_add(1, Ordering::Relaxed);
        self.created_payloads
            .lock()
            .expect("lock")
            .push(payload.clone());
        self.applicant_responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(ApplicantId("applicant-1".to_string())))
    }

    async fn create_run(
        &self,
        workflow_id: &str,
        _applicant: &ApplicantId,
    ) -> Result<VerificationRun, BackendError> {
        self.run_calls.fetch_add(1, Ordering::Relaxed);
        self.run_responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| {
                Ok(VerificationRun {
                    id: RunId("run-1".to_string()),
                    sdk_token: "sdk-token-1".to_string(),
                    workflow_id: workflow_id.to_string(),
                })
            })
    }

    async fn fetch_run(&self, _run: &RunId) -> Result<RunRecord, BackendError> {
        self.record_calls.fetch_add(1, Ordering::Relaxed);
        self.run_records
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(RunRecord::default()))
    }

    async fn fetch_completion(&self, _run: &RunId) -> Result<CompletionRecord, BackendError> {
        self.completion_calls.fetch_add(1, Ordering::Relaxed);
        self.completions
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no webhook data yet".to_string())))
    }
}

/// Capture fake tracking acquire/release pairing.
#[derive(Default)]
pub(super) struct TestCapture {
    next_handle: AtomicUsize,
    released: Mutex<Vec<usize>>,
    fail_acquire: Mutex<Option<String>>,
    last_request: Mutex<Option<CaptureRequest>>,
}

impl TestCapture {
    pub(super) fn fail_next_acquire(&self, message: &str) {
        *self.fail_acquire.lock().expect("lock") = Some(message.to_string());
    }

    pub(super) fn acquired(&self) -> usize {
        self.next_handle.load(Ordering::Relaxed)
    }

    pub(super) fn released(&self) -> Vec<usize> {
        self.released.lock().expect("lock").clone()
    }

    pub(super) fn live(&self) -> usize {
        self.acquired() - self.released().len()
    }

    pub(super) fn last_request(&self) -> Option<CaptureRequest> {
        self.last_request.lock().expect("lock").clone()
    }
}

impl CaptureSdk for TestCapture {
    type Handle = usize;

    fn acquire(&self, request: &CaptureRequest) -> Result<Self::Handle, CaptureError> {
        if let Some(message) = self.fail_acquire.lock().expect("lock").take() {
            return Err(CaptureError::Init(message));
        }
        *self.last_request.lock().expect("lock") = Some(request.clone());
        Ok(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn release(&self, handle: Self::Handle) {
        self.released.lock().expect("lock").push(handle);
    }
}

pub(super) fn valid_draft() -> ApplicantDraft {
    ApplicantDraft {
        first_name: "Ana".to_string(),
        last_name: "Pop".to_string(),
        email: "ana.pop@example.com".to_string(),
        town: "Bucharest".to_string(),
        address: "Street 123, Building X, Apt 10".to_string(),
        ..ApplicantDraft::default()
    }
}

pub(super) fn us_draft(region: &str) -> ApplicantDraft {
    ApplicantDraft {
        country: "USA".to_string(),
        town: "Sacramento".to_string(),
        region: region.to_string(),
        ..valid_draft()
    }
}

pub(super) fn completion(status: &str) -> CompletionRecord {
    CompletionRecord {
        status: Some(status.to_string()),
        ..CompletionRecord::default()
    }
}

pub(super) fn approved_completion() -> CompletionRecord {
    CompletionRecord {
        status: Some("approved".to_string()),
        output: Some(approved_output()),
        raw_payload: json!({"payload": {"resource": {"id": "run-1"}}}),
        ..CompletionRecord::default()
    }
}

pub(super) fn approved_output() -> VerificationOutput {
    VerificationOutput {
        first_name: Some("Ana".to_string()),
        last_name: Some("Pop".to_string()),
        dob: Some("1990-04-12".to_string()),
        document_type: Some("passport".to_string()),
        document_number: Some("X1234567".to_string()),
        date_expiry: Some("2030-04-12".to_string()),
        sub_result: Some("clear".to_string()),
        address: Some(OutputAddress::Flat("Street 123, Bucharest".to_string())),
        ..VerificationOutput::default()
    }
}

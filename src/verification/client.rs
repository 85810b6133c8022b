use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::BackendConfig;

use super::backend::{BackendError, VerificationBackend};
use super::domain::{
    ApplicantId, ApplicantPayload, CompletionRecord, RunId, RunRecord, VerificationRun,
};

/// Message used when a non-2xx response carries no `error` field.
const GENERIC_FAILURE: &str = "Request failed";

/// JSON-over-HTTP implementation of [`VerificationBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    origin: String,
}

#[derive(Debug, Deserialize)]
struct CreatedApplicant {
    id: ApplicantId,
}

#[derive(Debug, Deserialize)]
struct CreatedRun {
    id: RunId,
    sdk_token: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: config.api_origin.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        decode(response).await
    }
}

/// Decode a response, mapping non-2xx statuses to the body's `error` field.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        debug!(status = status.as_u16(), %message, "backend call rejected");
        return Err(BackendError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| BackendError::Decode(err.to_string()))
}

#[async_trait]
impl VerificationBackend for HttpBackend {
    async fn create_applicant(
        &self,
        payload: &ApplicantPayload,
    ) -> Result<ApplicantId, BackendError> {
        let body = serde_json::to_value(payload)
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        let created: CreatedApplicant = self.post_json("/api/applicants", &body).await?;
        Ok(created.id)
    }

    async fn create_run(
        &self,
        workflow_id: &str,
        applicant: &ApplicantId,
    ) -> Result<VerificationRun, BackendError> {
        let body = json!({
            "workflow_id": workflow_id,
            "applicant_id": applicant.0,
        });
        let created: CreatedRun = self.post_json("/api/workflow_runs", &body).await?;
        Ok(VerificationRun {
            id: created.id,
            sdk_token: created.sdk_token,
            workflow_id: workflow_id.to_string(),
        })
    }

    async fn fetch_run(&self, run: &RunId) -> Result<RunRecord, BackendError> {
        self.get_json(&format!("/api/workflow_runs/{}", run.0)).await
    }

    async fn fetch_completion(&self, run: &RunId) -> Result<CompletionRecord, BackendError> {
        self.get_json(&format!("/api/webhook_runs/{}", run.0)).await
    }
}

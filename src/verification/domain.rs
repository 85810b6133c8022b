use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for backend applicant records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Identifier wrapper for verification runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

/// Fields entered by the applicant before submission.
///
/// Created empty at session start, mutated by user input, and cleared when the
/// session is torn down. Validation happens in [`crate::verification::intake`]
/// before anything leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// ISO3 country code.
    pub country: String,
    pub town: String,
    pub address: String,
    /// Region or state; must be a two-letter USPS code for US addresses.
    pub region: String,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub us_citizen: Option<bool>,
}

impl Default for ApplicantDraft {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: None,
            country: "ROU".to_string(),
            town: String::new(),
            address: String::new(),
            region: String::new(),
            postcode: None,
            us_citizen: None,
        }
    }
}

/// Normalized payload posted to the applicant-creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub country: String,
    pub town: String,
    pub address: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub us_citizen: Option<bool>,
}

/// One verification attempt scoped to an applicant and a workflow definition.
///
/// Immutable once created; discarded on cleanup or when a new attempt starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRun {
    pub id: RunId,
    /// Opaque token consumed by the embedded capture widget.
    pub sdk_token: String,
    pub workflow_id: String,
}

/// Run record returned by the run endpoint once processing has produced data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address_formatted: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub date_expiry: Option<String>,
    #[serde(default)]
    pub workflow_run_id: Option<String>,
    #[serde(default)]
    pub dashboard_url: Option<String>,
}

/// Accumulated webhook state for a run, as exposed by the status endpoint.
///
/// The backend absorbs asynchronous callbacks that may arrive in multiple
/// parts; this record is its eventually-consistent view. Immutable once a
/// terminal status has been observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<VerificationOutput>,
    #[serde(default)]
    pub breakdown: Option<CheckBreakdown>,
    /// Raw webhook payload as delivered, kept for diagnostics.
    #[serde(default)]
    pub raw_payload: serde_json::Value,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

/// Structured output extracted from the captured document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutput {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub date_expiry: Option<String>,
    /// Disambiguating sub-result some deployments require before an
    /// approved-like status is treated as final.
    #[serde(default)]
    pub sub_result: Option<String>,
    #[serde(default)]
    pub address: Option<OutputAddress>,
}

/// Address as delivered by the provider: a structured object or a flat string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputAddress {
    Structured(StructuredAddress),
    Flat(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredAddress {
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Per-check authenticity results keyed by check name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckBreakdown(pub BTreeMap<String, String>);

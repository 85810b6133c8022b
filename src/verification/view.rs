use serde::Serialize;
use serde_json::Value;

use super::domain::{
    ApplicantDraft, CompletionRecord, OutputAddress, RunRecord, StructuredAddress,
    VerificationOutput,
};

/// Shown for any display field the records never populated.
pub const PLACEHOLDER: &str = "—";

/// Notice shown when a non-approved result carries no provider error message.
const MANUAL_REVIEW_NOTICE: &str = "Verification requires manual review.";

/// Display-ready reshaping of the run record, completion record, and draft.
///
/// Recomputed whenever the completion record changes; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalResult {
    pub status: String,
    pub full_name: String,
    pub address: String,
    pub gender: String,
    pub dob: String,
    pub document_type: String,
    pub document_number: String,
    pub date_expiry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    /// Provider-supplied failure detail, or a manual-review notice for
    /// non-approved outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl FinalResult {
    /// Merge the fetched records and the submitted draft into display fields.
    pub fn build(
        run: &RunRecord,
        completion: Option<&CompletionRecord>,
        draft: &ApplicantDraft,
    ) -> Self {
        let output = completion.and_then(|record| record.output.as_ref());

        let status = pick([run.status.as_deref(), completion.and_then(|c| c.status.as_deref())])
            .unwrap_or(PLACEHOLDER)
            .to_string();

        let full_name = full_name(run, output, draft).unwrap_or_else(|| PLACEHOLDER.to_string());
        let address = address(run, output).unwrap_or_else(|| PLACEHOLDER.to_string());

        let field = |from_run: Option<&str>, from_output: Option<&str>| {
            pick([from_run, from_output])
                .unwrap_or(PLACEHOLDER)
                .to_string()
        };

        let approved = status.eq_ignore_ascii_case("approved");
        let error_reason = if approved {
            None
        } else {
            completion
                .and_then(provider_error)
                .or_else(|| Some(MANUAL_REVIEW_NOTICE.to_string()))
        };

        Self {
            full_name,
            address,
            gender: field(run.gender.as_deref(), output.and_then(|o| o.gender.as_deref())),
            dob: field(run.dob.as_deref(), output.and_then(|o| o.dob.as_deref())),
            document_type: field(
                run.document_type.as_deref(),
                output.and_then(|o| o.document_type.as_deref()),
            ),
            document_number: field(
                run.document_number.as_deref(),
                output.and_then(|o| o.document_number.as_deref()),
            ),
            date_expiry: field(
                run.date_expiry.as_deref(),
                output.and_then(|o| o.date_expiry.as_deref()),
            ),
            sub_result: output.and_then(|o| o.sub_result.clone()),
            run_id: run.workflow_run_id.clone(),
            dashboard_url: run.dashboard_url.clone(),
            error_reason,
            status,
        }
    }

    pub fn approved(&self) -> bool {
        self.status.eq_ignore_ascii_case("approved")
    }

    /// Label/value pairs in the order the result screen lists them.
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Verification status", self.status.as_str()),
            ("Full name", self.full_name.as_str()),
            ("Address", self.address.as_str()),
            ("Gender", self.gender.as_str()),
            ("Date of birth", self.dob.as_str()),
            ("Document number", self.document_number.as_str()),
            ("Document type", self.document_type.as_str()),
            ("Date of expiry", self.date_expiry.as_str()),
        ]
    }
}

/// First non-empty candidate, trimmed.
fn pick<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Resolution order: run-record name, completion-output name, draft name.
fn full_name(
    run: &RunRecord,
    output: Option<&VerificationOutput>,
    draft: &ApplicantDraft,
) -> Option<String> {
    if let Some(name) = pick([run.full_name.as_deref()]) {
        return Some(name.to_string());
    }
    if let Some(name) = pick([output.and_then(|o| o.full_name.as_deref())]) {
        return Some(name.to_string());
    }

    let joined = join_name(
        pick([run.first_name.as_deref(), output.and_then(|o| o.first_name.as_deref())]),
        pick([run.last_name.as_deref(), output.and_then(|o| o.last_name.as_deref())]),
    );
    if joined.is_some() {
        return joined;
    }

    join_name(Some(draft.first_name.as_str()), Some(draft.last_name.as_str()))
}

/// Join first/last with a single space, omitting empty parts.
fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Precedence: pre-formatted run field, structured output, flat output, flat
/// run field.
fn address(run: &RunRecord, output: Option<&VerificationOutput>) -> Option<String> {
    if let Some(formatted) = pick([run.address_formatted.as_deref()]) {
        return Some(formatted.to_string());
    }

    match output.and_then(|o| o.address.as_ref()) {
        Some(OutputAddress::Structured(structured)) => {
            let formatted = format_structured(structured);
            if !formatted.is_empty() {
                return Some(formatted);
            }
        }
        Some(OutputAddress::Flat(flat)) => {
            if let Some(formatted) = format_flat(flat) {
                return Some(formatted);
            }
        }
        None => {}
    }

    run.address.as_deref().and_then(format_flat)
}

fn format_structured(address: &StructuredAddress) -> String {
    [
        address.line.as_deref(),
        address.town.as_deref(),
        address.region.as_deref(),
        address.postcode.as_deref(),
        address.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Flat strings pass through, except that a leading redundant segment is
/// dropped when the string clearly has more than three comma-separated parts.
fn format_flat(flat: &str) -> Option<String> {
    let segments: Vec<&str> = flat
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    match segments.len() {
        0 => None,
        1..=3 => Some(flat.trim().to_string()),
        _ => Some(segments[1..].join(", ")),
    }
}

/// Dig the provider's error message out of the raw webhook payload.
fn provider_error(record: &CompletionRecord) -> Option<String> {
    ["/payload/resource/error/message", "/resource/error/message"]
        .into_iter()
        .find_map(|pointer| record.raw_payload.pointer(pointer))
        .and_then(Value::as_str)
        .map(str::to_string)
}

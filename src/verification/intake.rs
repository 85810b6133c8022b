use super::domain::{ApplicantDraft, ApplicantPayload};

/// Validation errors raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("first and last name are required")]
    MissingName,
    #[error("State is required for US addresses (use two-letter USPS code, e.g., CA, NY).")]
    UsRegionCode,
    #[error("email is required")]
    MissingEmail,
    #[error("phone number is required")]
    MissingPhone,
}

/// Per-deployment dials for draft validation.
///
/// The duplicated front-end builds disagreed on which contact fields were
/// mandatory; those variation points live here instead of forked code paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePolicy {
    pub us_country_code: String,
    pub require_email: bool,
    pub require_phone: bool,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            us_country_code: "USA".to_string(),
            require_email: false,
            require_phone: false,
        }
    }
}

/// Guard responsible for producing submission payloads from raw drafts.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    policy: IntakePolicy,
}

impl IntakeGuard {
    pub fn with_policy(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Validate and normalize a draft into the payload posted to the backend.
    ///
    /// Country codes are upper-cased; for US addresses the region is
    /// upper-cased and must be exactly two ASCII letters. A rejected draft
    /// never reaches the network.
    pub fn payload_from_draft(
        &self,
        draft: &ApplicantDraft,
    ) -> Result<ApplicantPayload, IntakeViolation> {
        if draft.first_name.trim().is_empty() || draft.last_name.trim().is_empty() {
            return Err(IntakeViolation::MissingName);
        }

        if self.policy.require_email && draft.email.trim().is_empty() {
            return Err(IntakeViolation::MissingEmail);
        }

        if self.policy.require_phone
            && draft
                .phone
                .as_deref()
                .map_or(true, |phone| phone.trim().is_empty())
        {
            return Err(IntakeViolation::MissingPhone);
        }

        let country = draft.country.trim().to_ascii_uppercase();

        let state = if country == self.policy.us_country_code {
            let region = draft.region.trim().to_ascii_uppercase();
            if !is_usps_code(&region) {
                return Err(IntakeViolation::UsRegionCode);
            }
            region
        } else {
            draft.region.trim().to_string()
        };

        Ok(ApplicantPayload {
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|phone| !phone.is_empty())
                .map(str::to_string),
            country,
            town: draft.town.trim().to_string(),
            address: draft.address.trim().to_string(),
            state,
            postcode: draft
                .postcode
                .as_deref()
                .map(str::trim)
                .filter(|postcode| !postcode.is_empty())
                .map(str::to_string),
            us_citizen: draft.us_citizen,
        })
    }
}

fn is_usps_code(value: &str) -> bool {
    value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase())
}

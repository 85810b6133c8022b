//! Client-side orchestration for identity-verification onboarding: applicant
//! intake, capture-widget hand-off, completion polling against a webhook-fed
//! backend, and display-ready result assembly.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod verification;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::PollConfig;

use super::backend::VerificationBackend;
use super::domain::{CompletionRecord, RunId};

/// Message surfaced when the attempt budget runs out.
pub const TIMEOUT_MESSAGE: &str = "Timeout waiting for webhook";

const DEFAULT_MAX_ATTEMPTS: u32 = 100;
const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

/// Attempt budget and spacing for the completion poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl From<&PollConfig> for PollSettings {
    fn from(config: &PollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Terminal-state predicate, injected per deployment.
///
/// The status endpoint is eventually consistent with webhook callbacks that
/// may arrive in multiple parts, so "the status looks final" is not always
/// enough: deployments that set `require_sub_result` also wait for the
/// structured output's sub-result before accepting an approved-like status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalPolicy {
    statuses: Vec<String>,
    require_sub_result: bool,
}

/// Statuses after which no further state change is expected.
const TERMINAL_STATUSES: [&str; 5] = ["approved", "declined", "review", "abandoned", "completed"];

impl Default for TerminalPolicy {
    fn default() -> Self {
        Self::new(TERMINAL_STATUSES, false)
    }
}

impl TerminalPolicy {
    pub fn new<I, S>(statuses: I, require_sub_result: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            statuses: statuses
                .into_iter()
                .map(|status| status.as_ref().to_ascii_lowercase())
                .collect(),
            require_sub_result,
        }
    }

    /// Whether `record` is final and safe to display.
    ///
    /// Status membership is case-insensitive. Outcome-bearing success
    /// statuses (`approved`, `completed`) additionally require a populated
    /// sub-result when the policy demands one; declined/review/abandoned are
    /// final as observed since no further callback changes their meaning.
    pub fn is_terminal(&self, record: &CompletionRecord) -> bool {
        let Some(status) = record.status.as_deref() else {
            return false;
        };
        let status = status.to_ascii_lowercase();
        if !self.statuses.iter().any(|known| *known == status) {
            return false;
        }

        if self.require_sub_result && matches!(status.as_str(), "approved" | "completed") {
            return record
                .output
                .as_ref()
                .and_then(|output| output.sub_result.as_deref())
                .is_some_and(|sub_result| !sub_result.trim().is_empty());
        }

        true
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A terminal record was observed; no further queries were issued.
    Terminal(CompletionRecord),
    /// The attempt budget ran out without a terminal observation.
    TimedOut,
    /// The cancellation token fired before a terminal observation.
    Cancelled,
}

/// Poll the webhook-state endpoint until a terminal record appears.
///
/// Issues at most `settings.max_attempts` sequential queries spaced by
/// `settings.interval`. A failing query (transport or decode) is swallowed
/// and the loop continues; the interval sleep races the cancellation token so
/// a torn-down session stops waiting promptly. Carries no partial data on
/// timeout.
pub async fn await_completion<B>(
    backend: &B,
    run_id: &RunId,
    settings: &PollSettings,
    policy: &TerminalPolicy,
    cancel: &CancellationToken,
) -> PollOutcome
where
    B: VerificationBackend + ?Sized,
{
    for attempt in 1..=settings.max_attempts {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        match backend.fetch_completion(run_id).await {
            Ok(record) if policy.is_terminal(&record) => {
                debug!(run = %run_id.0, attempt, status = ?record.status, "terminal record observed");
                return PollOutcome::Terminal(record);
            }
            Ok(record) => {
                debug!(run = %run_id.0, attempt, status = ?record.status, "not yet terminal");
            }
            Err(err) => {
                debug!(run = %run_id.0, attempt, error = %err, "completion query failed; retrying");
            }
        }

        if attempt < settings.max_attempts {
            tokio::select! {
                () = cancel.cancelled() => return PollOutcome::Cancelled,
                () = tokio::time::sleep(settings.interval) => {}
            }
        }
    }

    debug!(run = %run_id.0, attempts = settings.max_attempts, "poll budget exhausted");
    PollOutcome::TimedOut
}

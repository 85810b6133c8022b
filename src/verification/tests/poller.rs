use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::common::{approved_completion, completion, ScriptedBackend};
use crate::verification::backend::BackendError;
use crate::verification::domain::{CompletionRecord, RunId, VerificationOutput};
use crate::verification::poller::{await_completion, PollOutcome, PollSettings, TerminalPolicy};

fn settings(max_attempts: u32, interval_ms: u64) -> PollSettings {
    PollSettings {
        max_attempts,
        interval: Duration::from_millis(interval_ms),
    }
}

fn run_id() -> RunId {
    RunId("run-1".to_string())
}

#[test]
fn terminal_statuses_match_case_insensitively() {
    let policy = TerminalPolicy::default();

    for status in ["approved", "APPROVED", "Declined", "review", "abandoned", "Completed"] {
        assert!(policy.is_terminal(&completion(status)), "{status} is terminal");
    }
    for status in ["processing", "awaiting_input", ""] {
        assert!(!policy.is_terminal(&completion(status)), "{status} is not terminal");
    }
    assert!(!policy.is_terminal(&CompletionRecord::default()));
}

#[test]
fn sub_result_gate_only_holds_back_success_statuses() {
    let policy = TerminalPolicy::new(
        ["approved", "declined", "review", "abandoned", "completed"],
        true,
    );

    // Approved without (or with a blank) sub-result: callbacks still landing.
    assert!(!policy.is_terminal(&completion("approved")));
    let mut blank = completion("approved");
    blank.output = Some(VerificationOutput {
        sub_result: Some("  ".to_string()),
        ..VerificationOutput::default()
    });
    assert!(!policy.is_terminal(&blank));

    assert!(policy.is_terminal(&approved_completion()));
    assert!(policy.is_terminal(&completion("declined")));
    assert!(policy.is_terminal(&completion("review")));
}

#[tokio::test(start_paused = true)]
async fn poll_returns_on_first_terminal_record() {
    let backend = ScriptedBackend::default();
    backend.push_completion(Ok(completion("processing")));
    backend.push_completion(Ok(completion("processing")));
    backend.push_completion(Ok(approved_completion()));
    // Must never be consumed.
    backend.push_completion(Ok(completion("declined")));

    let cancel = CancellationToken::new();
    let start = Instant::now();
    let outcome = await_completion(
        &backend,
        &run_id(),
        &settings(10, 3000),
        &TerminalPolicy::default(),
        &cancel,
    )
    .await;

    match outcome {
        PollOutcome::Terminal(record) => assert_eq!(record.status.as_deref(), Some("approved")),
        other => panic!("expected terminal outcome, got {other:?}"),
    }
    assert_eq!(backend.completion_calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_millis(6000));
}

#[tokio::test(start_paused = true)]
async fn poll_times_out_after_exact_attempt_budget() {
    let backend = ScriptedBackend::default();
    for _ in 0..8 {
        backend.push_completion(Ok(completion("processing")));
    }

    let cancel = CancellationToken::new();
    let start = Instant::now();
    let outcome = await_completion(
        &backend,
        &run_id(),
        &settings(5, 250),
        &TerminalPolicy::default(),
        &cancel,
    )
    .await;

    assert_eq!(outcome, PollOutcome::TimedOut);
    assert_eq!(backend.completion_calls(), 5);
    // Sleeps happen between attempts, not after the last one.
    assert_eq!(start.elapsed(), Duration::from_millis(4 * 250));
}

#[tokio::test(start_paused = true)]
async fn failed_queries_are_swallowed_and_do_not_abort() {
    let backend = ScriptedBackend::default();
    backend.push_completion(Err(BackendError::Transport("connection reset".to_string())));
    backend.push_completion(Err(BackendError::Decode("unexpected eof".to_string())));
    backend.push_completion(Ok(approved_completion()));

    let cancel = CancellationToken::new();
    let outcome = await_completion(
        &backend,
        &run_id(),
        &settings(10, 1000),
        &TerminalPolicy::default(),
        &cancel,
    )
    .await;

    assert!(matches!(outcome, PollOutcome::Terminal(_)));
    assert_eq!(backend.completion_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_interval_sleep() {
    // Empty queue: every query fails and is swallowed, so only cancellation
    // or the budget can end this poll.
    let backend = ScriptedBackend::default();
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();

    let id = run_id();
    let poll_settings = settings(100, 1000);
    let policy = TerminalPolicy::default();
    let poll = await_completion(&backend, &id, &poll_settings, &policy, &cancel);
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        interrupt.cancel();
    };

    let (outcome, ()) = tokio::join!(poll, trigger);
    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(backend.completion_calls(), 3);
}

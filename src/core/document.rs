//! Document job polling: how long to wait between status checks and the
//! loop that drives a job to a terminal state.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::errors::{Result, TranslationError, UNKNOWN_DOCUMENT_ERROR};
use crate::core::models::{DocumentState, DocumentStatus};

/// Wait used when the server gives no estimate
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Upper bound on the backoff doubling exponent
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Timing between status polls.
///
/// The default follows the server: wait `seconds_remaining` when it is
/// given, otherwise `default_interval`, with no cap. `max_interval` and
/// `backoff` change that timing and are off unless set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub default_interval: Duration,
    pub max_interval: Option<Duration>,
    /// Double the fallback interval after every poll without an estimate
    pub backoff: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            default_interval: DEFAULT_POLL_INTERVAL,
            max_interval: None,
            backoff: false,
        }
    }
}

impl PollPolicy {
    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, cap: Duration) -> Self {
        self.max_interval = Some(cap);
        self
    }

    pub fn with_backoff(mut self, backoff: bool) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay before the next poll.
    ///
    /// `fallback_streak` counts the consecutive polls (including this one)
    /// that came back without a usable estimate. A zero estimate counts as
    /// none so a job stuck at zero is not polled in a tight loop.
    pub fn next_delay(&self, seconds_remaining: Option<u64>, fallback_streak: u32) -> Duration {
        let delay = match seconds_remaining {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ if self.backoff => {
                let shift = fallback_streak.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
                self.default_interval.saturating_mul(1u32 << shift)
            }
            _ => self.default_interval,
        };

        match self.max_interval {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

/// Error for a job the server marked as failed
fn failed(status: &DocumentStatus) -> TranslationError {
    TranslationError::DocumentTranslationFailed {
        document_id: status.document_id.clone(),
        message: status
            .error_message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_DOCUMENT_ERROR.to_string()),
    }
}

/// Poll until the job is done, fails, or `cancel` fires.
///
/// The token is checked before every poll and raced against every sleep.
/// A status of `Error` ends the loop immediately.
pub async fn poll_until_done<F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut poll: F,
) -> Result<DocumentStatus>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<DocumentStatus>>,
{
    let mut polls: u32 = 0;
    let mut fallback_streak: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }

        let status = poll().await?;
        polls += 1;

        match status.status {
            DocumentState::Done => {
                info!(
                    "Document {} translated after {} polls (billed characters: {:?})",
                    status.document_id, polls, status.billed_characters
                );
                return Ok(status);
            }
            DocumentState::Error => {
                warn!("Document {} failed on the server", status.document_id);
                return Err(failed(&status));
            }
            DocumentState::Queued | DocumentState::Translating => {}
        }

        match status.seconds_remaining {
            Some(secs) if secs > 0 => fallback_streak = 0,
            _ => fallback_streak += 1,
        }

        let delay = policy.next_delay(status.seconds_remaining, fallback_streak);
        debug!(
            "Document {} is {}, next poll in {:?}",
            status.document_id, status.status, delay
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
            _ = sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn status(state: DocumentState, seconds_remaining: Option<u64>) -> DocumentStatus {
        DocumentStatus {
            document_id: "DOC".to_string(),
            status: state,
            seconds_remaining,
            billed_characters: None,
            error_message: None,
        }
    }

    /// Replays canned statuses and records when each poll happened
    fn script(
        statuses: Vec<DocumentStatus>,
    ) -> (
        Arc<Mutex<Vec<Instant>>>,
        impl FnMut() -> std::future::Ready<Result<DocumentStatus>>,
    ) {
        let queue = Arc::new(Mutex::new(VecDeque::from(statuses)));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let poll = move || {
            recorded.lock().unwrap().push(Instant::now());
            let next = queue.lock().unwrap().pop_front();
            std::future::ready(next.ok_or(TranslationError::InvalidResponseError {
                message: "script exhausted".to_string(),
            }))
        };
        (calls, poll)
    }

    #[test]
    fn test_default_policy_follows_server_hint() {
        let policy = PollPolicy::default();
        assert_eq!(policy.next_delay(Some(2), 0), Duration::from_millis(2000));
        assert_eq!(policy.next_delay(None, 1), DEFAULT_POLL_INTERVAL);
        assert_eq!(policy.next_delay(None, 5), DEFAULT_POLL_INTERVAL);
        assert_eq!(policy.next_delay(Some(0), 1), DEFAULT_POLL_INTERVAL);
        assert_eq!(policy.next_delay(Some(600), 0), Duration::from_secs(600));
    }

    #[test]
    fn test_cap_and_backoff() {
        let policy = PollPolicy::default()
            .with_max_interval(Duration::from_secs(5))
            .with_backoff(true);
        assert_eq!(policy.next_delay(Some(600), 0), Duration::from_secs(5));
        assert_eq!(policy.next_delay(None, 1), Duration::from_secs(1));
        assert_eq!(policy.next_delay(None, 2), Duration::from_secs(2));
        assert_eq!(policy.next_delay(None, 3), Duration::from_secs(4));
        assert_eq!(policy.next_delay(None, 4), Duration::from_secs(5));
        assert_eq!(policy.next_delay(None, 40), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_hint_before_second_poll() {
        let (calls, poll) = script(vec![
            status(DocumentState::Translating, Some(2)),
            status(DocumentState::Done, None),
        ]);
        let cancel = CancellationToken::new();

        let done = poll_until_done(&PollPolicy::default(), &cancel, poll)
            .await
            .unwrap();

        assert!(done.is_done());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1] - calls[0] >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_without_hint_uses_default_interval() {
        let (calls, poll) = script(vec![
            status(DocumentState::Queued, None),
            status(DocumentState::Queued, None),
            status(DocumentState::Done, None),
        ]);
        let cancel = CancellationToken::new();

        poll_until_done(&PollPolicy::default(), &cancel, poll)
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls[1] - calls[0] >= DEFAULT_POLL_INTERVAL);
        assert!(calls[2] - calls[1] >= DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_state_stops_immediately() {
        let (calls, poll) = script(vec![
            status(DocumentState::Error, None),
            status(DocumentState::Done, None),
        ]);
        let cancel = CancellationToken::new();

        let err = poll_until_done(&PollPolicy::default(), &cancel, poll)
            .await
            .unwrap_err();

        match err {
            TranslationError::DocumentTranslationFailed { document_id, message } => {
                assert_eq!(document_id, "DOC");
                assert_eq!(message, UNKNOWN_DOCUMENT_ERROR);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_message_from_server_is_kept() {
        let mut failed_status = status(DocumentState::Error, None);
        failed_status.error_message = Some("Source and target language are equal.".to_string());
        let (_calls, poll) = script(vec![failed_status]);

        let err = poll_until_done(&PollPolicy::default(), &CancellationToken::new(), poll)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Source and target language are equal."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait_skips_next_poll() {
        let (calls, poll) = script(vec![
            status(DocumentState::Translating, Some(30)),
            status(DocumentState::Done, None),
        ]);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = poll_until_done(&PollPolicy::default(), &cancel, poll)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_cancelled_token_prevents_first_poll() {
        let (calls, poll) = script(vec![status(DocumentState::Done, None)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poll_until_done(&PollPolicy::default(), &cancel, poll)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(calls.lock().unwrap().is_empty());
    }
}

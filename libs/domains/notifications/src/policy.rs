//! Retry policy for event delivery.
//!
//! Delivery is a small state machine:
//!
//! ```text
//! Attempting(n) ──ok──────────────────────────► Delivered
//!      │
//!      └─err─► n < max ──► BackingOff(n, d) ──sleep d──► Attempting(n+1)
//!              n == max ─────────────────────────────► Exhausted
//! ```
//!
//! Each attempt is bounded by the attempt timeout; a timed-out attempt is a
//! failure like any other. Cancellation from either `Attempting` or
//! `BackingOff` goes straight to `Exhausted` with the attempts made so far.

use chrono::{DateTime, Utc};
use core_config::notifier::NotifierConfig;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{NotificationError, TransportError};

/// Retry count and backoff schedule for one envelope.
///
/// Delays grow geometrically with no jitter and no cap, and there is no
/// delay after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: u32,
    attempt_timeout: Duration,
}

impl DeliveryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
    pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: u32,
    ) -> Result<Self, NotificationError> {
        if max_attempts == 0 {
            return Err(NotificationError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if backoff_multiplier == 0 {
            return Err(NotificationError::Config(
                "backoff_multiplier must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            attempt_timeout: Self::DEFAULT_ATTEMPT_TIMEOUT,
        })
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Result<Self, NotificationError> {
        if timeout.is_zero() {
            return Err(NotificationError::Config(
                "attempt_timeout must be greater than zero".to_string(),
            ));
        }
        self.attempt_timeout = timeout;
        Ok(self)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_multiplier(&self) -> u32 {
        self.backoff_multiplier
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Delay slept after failed attempt `attempt` (1-based), if another attempt follows.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        let factor = self
            .backoff_multiplier
            .checked_pow(attempt - 1)
            .unwrap_or(u32::MAX);
        Some(self.initial_delay.saturating_mul(factor))
    }

    /// Total time spent sleeping when every attempt fails.
    pub fn worst_case_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .filter_map(|attempt| self.delay_after(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Longest a delivery can take when every attempt times out.
    pub fn worst_case_duration(&self) -> Duration {
        self.attempt_timeout
            .saturating_mul(self.max_attempts)
            .saturating_add(self.worst_case_backoff())
    }

    /// Fails when a full delivery sequence could outlast `budget`.
    pub fn ensure_fits_within(&self, budget: Duration) -> Result<(), NotificationError> {
        let worst_case = self.worst_case_duration();
        if worst_case > budget {
            return Err(NotificationError::Config(format!(
                "delivery can take up to {:?} ({} attempts of at most {:?} plus {:?} backoff), \
                 more than the {:?} available per request",
                worst_case,
                self.max_attempts,
                self.attempt_timeout,
                self.worst_case_backoff(),
                budget
            )));
        }
        Ok(())
    }

    /// Drives `attempt` until it succeeds, attempts run out, or `cancel` fires.
    ///
    /// `attempt` receives the 1-based attempt number.
    pub async fn run<F, Fut>(&self, cancel: &CancellationToken, attempt: F) -> DeliveryOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), TransportError>>,
    {
        self.run_observed(cancel, attempt, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_failure` with the attempt number
    /// and cause of every failed attempt, timeouts included.
    pub async fn run_observed<F, Fut, O>(
        &self,
        cancel: &CancellationToken,
        mut attempt: F,
        mut on_failure: O,
    ) -> DeliveryOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), TransportError>>,
        O: FnMut(u32, &TransportError),
    {
        let mut state = DeliveryState::Attempting { attempt: 1 };
        let mut last_failure: Option<(TransportError, DateTime<Utc>)> = None;

        loop {
            state = match state {
                DeliveryState::Attempting { attempt: n } => {
                    if cancel.is_cancelled() {
                        DeliveryState::Exhausted {
                            attempts: n - 1,
                            cancelled: true,
                        }
                    } else {
                        let result = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(TransportError::Cancelled),
                            result = tokio::time::timeout(self.attempt_timeout, attempt(n)) => {
                                result.unwrap_or(Err(TransportError::TimedOut(self.attempt_timeout)))
                            }
                        };

                        match result {
                            Ok(()) => DeliveryState::Delivered { attempts: n },
                            Err(TransportError::Cancelled) if cancel.is_cancelled() => {
                                DeliveryState::Exhausted {
                                    attempts: n,
                                    cancelled: true,
                                }
                            }
                            Err(err) => {
                                on_failure(n, &err);
                                last_failure = Some((err, Utc::now()));
                                match self.delay_after(n) {
                                    Some(delay) => DeliveryState::BackingOff { attempt: n, delay },
                                    None => DeliveryState::Exhausted {
                                        attempts: n,
                                        cancelled: false,
                                    },
                                }
                            }
                        }
                    }
                }
                DeliveryState::BackingOff { attempt: n, delay } => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => DeliveryState::Exhausted {
                            attempts: n,
                            cancelled: true,
                        },
                        _ = tokio::time::sleep(delay) => DeliveryState::Attempting { attempt: n + 1 },
                    }
                }
                DeliveryState::Delivered { attempts } => {
                    return DeliveryOutcome::Delivered { attempts };
                }
                DeliveryState::Exhausted {
                    attempts,
                    cancelled,
                } => {
                    let (last_error, last_error_at) =
                        last_failure.unwrap_or_else(|| (TransportError::Cancelled, Utc::now()));
                    return DeliveryOutcome::Exhausted {
                        attempts,
                        last_error,
                        last_error_at,
                        cancelled,
                    };
                }
            };
        }
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            backoff_multiplier: Self::DEFAULT_BACKOFF_MULTIPLIER,
            attempt_timeout: Self::DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl TryFrom<&NotifierConfig> for DeliveryPolicy {
    type Error = NotificationError;

    fn try_from(config: &NotifierConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.max_attempts,
            config.initial_delay,
            config.backoff_multiplier,
        )?
        .with_attempt_timeout(config.attempt_timeout)
    }
}

/// States of a single delivery sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Attempting { attempt: u32 },
    BackingOff { attempt: u32, delay: Duration },
    Delivered { attempts: u32 },
    Exhausted { attempts: u32, cancelled: bool },
}

impl DeliveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryState::Delivered { .. } | DeliveryState::Exhausted { .. }
        )
    }
}

/// Terminal result of [`DeliveryPolicy::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered {
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
        last_error: TransportError,
        last_error_at: DateTime<Utc>,
        cancelled: bool,
    },
}

impl DeliveryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } => *attempts,
            DeliveryOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn failing(msg: &str) -> Result<(), TransportError> {
        Err(TransportError::Publish(msg.to_string()))
    }

    #[test]
    fn test_default_policy() {
        let policy = DeliveryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.initial_delay(), Duration::from_secs(1));
        assert_eq!(policy.backoff_multiplier(), 2);
    }

    #[test]
    fn test_delay_schedule() {
        let policy = DeliveryPolicy::new(4, Duration::from_millis(100), 3).unwrap();
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(300)));
        assert_eq!(policy.delay_after(3), Some(Duration::from_millis(900)));
        assert_eq!(policy.delay_after(4), None);
        assert_eq!(policy.worst_case_backoff(), Duration::from_millis(1300));
    }

    #[test]
    fn test_default_worst_case_backoff_is_three_seconds() {
        assert_eq!(
            DeliveryPolicy::default().worst_case_backoff(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let err = DeliveryPolicy::new(0, Duration::from_secs(1), 2).unwrap_err();
        assert!(matches!(err, NotificationError::Config(_)));
    }

    #[test]
    fn test_from_notifier_config() {
        let config = NotifierConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            backoff_multiplier: 4,
            ..NotifierConfig::default()
        };
        let policy = DeliveryPolicy::try_from(&config).unwrap();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(40)));
        assert_eq!(policy.attempt_timeout(), config.attempt_timeout);
    }

    #[test]
    fn test_rejects_zero_attempt_timeout() {
        let err = DeliveryPolicy::default()
            .with_attempt_timeout(Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, NotificationError::Config(_)));
    }

    #[test]
    fn test_worst_case_duration_includes_attempt_timeouts() {
        // 3 x 2s attempts + 1s + 2s backoff
        let policy = DeliveryPolicy::default();
        assert_eq!(policy.worst_case_duration(), Duration::from_secs(9));

        assert!(policy.ensure_fits_within(Duration::from_secs(9)).is_ok());
        let err = policy
            .ensure_fits_within(Duration::from_secs(2))
            .unwrap_err();
        assert!(matches!(err, NotificationError::Config(_)));
    }

    #[test]
    fn test_terminal_states() {
        assert!(DeliveryState::Delivered { attempts: 1 }.is_terminal());
        assert!(
            DeliveryState::Exhausted {
                attempts: 3,
                cancelled: false
            }
            .is_terminal()
        );
        assert!(!DeliveryState::Attempting { attempt: 1 }.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_sleep() {
        let start = Instant::now();
        let outcome = DeliveryPolicy::default()
            .run(&CancellationToken::new(), |_| async { Ok(()) })
            .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 1 });
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = DeliveryPolicy::default()
            .run(&CancellationToken::new(), move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { if n < 3 { failing("broker busy") } else { Ok(()) } }
            })
            .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_timing_and_last_error() {
        let start = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let outcome = DeliveryPolicy::default()
            .run(&CancellationToken::new(), move |attempt| {
                log.lock().unwrap().push((attempt, start.elapsed()));
                async move { failing(&format!("failure {attempt}")) }
            })
            .await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (1, Duration::ZERO),
                (2, Duration::from_secs(1)),
                (3, Duration::from_secs(3)),
            ]
        );
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        match outcome {
            DeliveryOutcome::Exhausted {
                attempts,
                last_error,
                cancelled,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error.to_string(), "failure 3");
                assert!(!cancelled);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy_never_sleeps() {
        let policy = DeliveryPolicy::new(1, Duration::from_secs(30), 2).unwrap();
        let start = Instant::now();

        let outcome = policy
            .run(&CancellationToken::new(), |_| async { failing("nope") })
            .await;

        assert_eq!(outcome.attempts(), 1);
        assert!(!outcome.is_delivered());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_stops_early() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let outcome = DeliveryPolicy::default()
            .run(&cancel, |_| async { failing("connection refused") })
            .await;

        match outcome {
            DeliveryOutcome::Exhausted {
                attempts,
                last_error,
                cancelled,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error.to_string(), "connection refused");
                assert!(cancelled);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_hanging_attempt() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let outcome = DeliveryPolicy::default()
            .run(&cancel, |_| std::future::pending::<Result<(), TransportError>>())
            .await;

        match outcome {
            DeliveryOutcome::Exhausted {
                attempts,
                last_error,
                cancelled,
                ..
            } => {
                assert_eq!(attempts, 1);
                assert_eq!(last_error, TransportError::Cancelled);
                assert!(cancelled);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_makes_no_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = DeliveryPolicy::default()
            .run(&cancel, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert_eq!(outcome.attempts(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_attempts_time_out_and_exhaust() {
        let policy = DeliveryPolicy::default()
            .with_attempt_timeout(Duration::from_millis(500))
            .unwrap();
        let failures = Arc::new(Mutex::new(Vec::new()));
        let log = failures.clone();
        let start = Instant::now();

        let outcome = policy
            .run_observed(
                &CancellationToken::new(),
                |_| std::future::pending::<Result<(), TransportError>>(),
                move |attempt, err| log.lock().unwrap().push((attempt, err.clone())),
            )
            .await;

        let timed_out = TransportError::TimedOut(Duration::from_millis(500));
        assert_eq!(
            *failures.lock().unwrap(),
            vec![
                (1, timed_out.clone()),
                (2, timed_out.clone()),
                (3, timed_out.clone()),
            ]
        );
        // 3 x 500ms attempts + 1s + 2s backoff
        assert_eq!(start.elapsed(), Duration::from_millis(4500));
        assert_eq!(start.elapsed(), policy.worst_case_duration());

        match outcome {
            DeliveryOutcome::Exhausted {
                attempts,
                last_error,
                cancelled,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, timed_out);
                assert!(!cancelled);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }
}

//! Timeout and retry wrapper around a [`StageInvoker`].
//!
//! A stage call that overruns its timeout is reported exactly like a
//! retryable service failure. Retryable failures are repeated with
//! exponential backoff up to `max_retries` extra attempts. Invalid output
//! is returned immediately.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::workflow::{StageInput, StageResult};
use crate::ports::{InvocationContext, StageInvoker};

/// Bounds for repeating a failed stage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Decorates a [`StageInvoker`] with a per-call timeout and retries.
pub struct ResilientStageInvoker {
    inner: Arc<dyn StageInvoker>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ResilientStageInvoker {
    pub fn new(inner: Arc<dyn StageInvoker>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            inner,
            timeout,
            retry,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn attempt(&self, ctx: &InvocationContext, input: &StageInput) -> StageResult {
        match tokio::time::timeout(self.timeout, self.inner.invoke(ctx, input)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    stage = %input.stage,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Stage call timed out"
                );
                StageResult::service_unavailable(
                    input.stage,
                    true,
                    format!("stage timed out after {}ms", self.timeout.as_millis()),
                )
            }
        }
    }
}

#[async_trait]
impl StageInvoker for ResilientStageInvoker {
    async fn invoke(&self, ctx: &InvocationContext, input: &StageInput) -> StageResult {
        let mut attempts = 1;
        loop {
            tracing::debug!(stage = %input.stage, attempt = attempts, "Invoking stage");
            let result = self.attempt(ctx, input).await;

            if result.is_retryable_failure() && attempts <= self.retry.max_retries {
                let delay = self.retry.delay_for(attempts);
                tracing::info!(
                    stage = %input.stage,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying stage after service failure"
                );
                tokio::time::sleep(delay).await;
                attempts += 1;
                continue;
            }

            return result.with_attempts(attempts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, TurnId};
    use crate::domain::session::Phase;
    use crate::domain::workflow::{StageErrorKind, StageKind, StagePayload};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays scripted results, optionally sleeping before each.
    struct ScriptedInvoker {
        script: Mutex<VecDeque<(Duration, StageResult)>>,
        calls: Mutex<u32>,
    }

    impl ScriptedInvoker {
        fn new(script: Vec<(Duration, StageResult)>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl StageInvoker for ScriptedInvoker {
        async fn invoke(&self, _ctx: &InvocationContext, input: &StageInput) -> StageResult {
            *self.calls.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some((delay, result)) => {
                    tokio::time::sleep(delay).await;
                    result
                }
                None => StageResult::succeeded(input.stage, StagePayload::Text("done".into()), "{}"),
            }
        }
    }

    fn ctx() -> InvocationContext {
        InvocationContext::new(SessionId::new(), TurnId::new())
    }

    fn input() -> StageInput {
        StageInput::new(StageKind::Format, Phase::Selection, "hello")
    }

    fn unavailable() -> StageResult {
        StageResult::service_unavailable(StageKind::Format, true, "503")
    }

    fn ok() -> StageResult {
        StageResult::succeeded(StageKind::Format, StagePayload::Text("hi".into()), "{}")
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        }
    }

    mod backoff {
        use super::*;

        #[test]
        fn delay_doubles_until_cap() {
            let policy = policy(5);

            assert_eq!(policy.delay_for(1), Duration::from_millis(100));
            assert_eq!(policy.delay_for(2), Duration::from_millis(200));
            assert_eq!(policy.delay_for(3), Duration::from_millis(300));
            assert_eq!(policy.delay_for(40), Duration::from_millis(300));
        }

        #[tokio::test(start_paused = true)]
        async fn retries_transient_failures_with_backoff() {
            let inner = ScriptedInvoker::new(vec![
                (Duration::ZERO, unavailable()),
                (Duration::ZERO, unavailable()),
                (Duration::ZERO, ok()),
            ]);
            let invoker = ResilientStageInvoker::new(inner.clone(), Duration::from_secs(5), policy(2));

            let start = Instant::now();
            let result = invoker.invoke(&ctx(), &input()).await;

            assert!(result.success);
            assert_eq!(result.attempts, 3);
            assert_eq!(inner.calls(), 3);
            assert!(start.elapsed() >= Duration::from_millis(300));
        }

        #[tokio::test(start_paused = true)]
        async fn gives_up_after_max_retries() {
            let inner = ScriptedInvoker::new(vec![
                (Duration::ZERO, unavailable()),
                (Duration::ZERO, unavailable()),
                (Duration::ZERO, unavailable()),
            ]);
            let invoker = ResilientStageInvoker::new(inner.clone(), Duration::from_secs(5), policy(1));

            let result = invoker.invoke(&ctx(), &input()).await;

            assert_eq!(result.error_kind(), Some(StageErrorKind::ServiceUnavailable));
            assert_eq!(result.attempts, 2);
            assert_eq!(inner.calls(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn invalid_output_is_never_retried() {
            let inner = ScriptedInvoker::new(vec![(
                Duration::ZERO,
                StageResult::invalid_output(StageKind::Format, "nonsense", "no record"),
            )]);
            let invoker = ResilientStageInvoker::new(inner.clone(), Duration::from_secs(5), policy(3));

            let result = invoker.invoke(&ctx(), &input()).await;

            assert_eq!(result.error_kind(), Some(StageErrorKind::InvalidOutput));
            assert_eq!(inner.calls(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn non_retryable_service_failure_is_returned_immediately() {
            let inner = ScriptedInvoker::new(vec![(
                Duration::ZERO,
                StageResult::service_unavailable(StageKind::Format, false, "bad key"),
            )]);
            let invoker = ResilientStageInvoker::new(inner.clone(), Duration::from_secs(5), policy(3));

            invoker.invoke(&ctx(), &input()).await;

            assert_eq!(inner.calls(), 1);
        }
    }

    mod timeouts {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn overrun_is_a_retryable_service_failure() {
            let inner = ScriptedInvoker::new(vec![(Duration::from_secs(60), ok())]);
            let invoker = ResilientStageInvoker::new(inner, Duration::from_secs(1), RetryPolicy::none());

            let result = invoker.invoke(&ctx(), &input()).await;

            assert_eq!(result.error_kind(), Some(StageErrorKind::ServiceUnavailable));
            assert!(result.is_retryable_failure());
            assert_eq!(result.attempts, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn timed_out_call_is_retried() {
            let inner = ScriptedInvoker::new(vec![
                (Duration::from_secs(60), ok()),
                (Duration::ZERO, ok()),
            ]);
            let invoker = ResilientStageInvoker::new(inner.clone(), Duration::from_secs(1), policy(1));

            let result = invoker.invoke(&ctx(), &input()).await;

            assert!(result.success);
            assert_eq!(result.attempts, 2);
            assert_eq!(inner.calls(), 2);
        }
    }
}

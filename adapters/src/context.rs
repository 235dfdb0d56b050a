//! Per-call context: deadline and cancellation

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied deadline and cancellation signal
///
/// Every adapter operation runs its network I/O through [`RequestContext::run`], so
/// an expired deadline or a cancelled token aborts the in-flight HTTP call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Context without deadline or cancellation
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// Same context with an additional deadline (the earlier one wins)
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Attach a cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the context is already cancelled or past its deadline
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drive `fut` until it completes, the deadline passes or the context is cancelled
    pub async fn run<T, F>(&self, provider: &str, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(format!("{} {}", provider, operation)));
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = self.cancel.cancelled() => {
                Err(Error::Cancelled(format!("{} {}", provider, operation)))
            }
            _ = deadline => Err(Error::Transport {
                provider: provider.to_string(),
                message: format!("deadline exceeded during {}", operation),
                timeout: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_context_aborts() {
        let token = CancellationToken::new();
        let ctx = RequestContext::background().with_cancellation(token.clone());

        let call = ctx.run("SICOOB", "query_boleto", async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });
        token.cancel();

        assert!(matches!(call.await, Err(Error::Cancelled(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_maps_to_transport_timeout() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(50));

        let result = ctx
            .run("SICREDI", "list_boletos", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        match result {
            Err(Error::Transport { timeout, .. }) => assert!(timeout),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(60))
            .deadline(Instant::now() + Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(ctx.is_done());
    }
}

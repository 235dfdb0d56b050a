//! OAuth2 token lifecycle
//!
//! [`TokenManager`] owns one adapter's token pair. Reads go through a shared lock;
//! a caller that finds the token missing or stale upgrades to the exclusive lock,
//! re-checks, and performs the single network call while holding it. Callers that
//! arrive meanwhile wait on the lock and then see the fresh token.
//!
//! ```text
//!  Unauthenticated ──authenticate──► Valid ──(expires_at − 30s)──► NearExpiry
//!        ▲                             ▲                              │
//!        │                             └────────── refresh ◄──────────┤
//!        │                                                            │
//!        └──── RefreshFailed / Expired (refresh_expires_at − 30s) ◄───┘
//! ```

use crate::clock::Clock;
use crate::context::RequestContext;
use crate::metrics::TOKEN_REQUESTS_TOTAL;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Safety margin applied to both expiry timestamps
pub const TOKEN_EXPIRY_SKEW_SECONDS: i64 = 30;

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    /// Access token
    pub access_token: String,
    /// Token type (usually "Bearer")
    #[serde(default)]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token (password grant only)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Refresh token lifetime in seconds
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    /// Granted scope
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token held in memory by a [`TokenManager`]
#[derive(Clone)]
pub struct Token {
    /// Access token
    pub access_token: String,
    /// Refresh token, when the grant type issues one
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    /// Refresh token expiry
    pub refresh_expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// Token lifecycle state at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token held
    Unauthenticated,
    /// Access token usable
    Valid,
    /// Access token stale, refresh token still usable
    NearExpiry,
    /// Both tokens stale (or no refresh token)
    Expired,
}

impl Token {
    /// Build a token from a grant received at `now`
    pub fn from_grant(grant: TokenGrant, now: DateTime<Utc>) -> Self {
        let refresh_expires_at = match (&grant.refresh_token, grant.refresh_expires_in) {
            (Some(_), Some(secs)) => Some(now + Duration::seconds(secs)),
            _ => None,
        };
        let refresh_token = grant.refresh_token.filter(|_| refresh_expires_at.is_some());

        Self {
            access_token: grant.access_token,
            refresh_token,
            expires_at: now + Duration::seconds(grant.expires_in),
            refresh_expires_at,
        }
    }

    /// Classify the token at `now`
    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        let skew = Duration::seconds(TOKEN_EXPIRY_SKEW_SECONDS);
        if now < self.expires_at - skew {
            return TokenState::Valid;
        }
        match (&self.refresh_token, self.refresh_expires_at) {
            (Some(_), Some(refresh_at)) if now < refresh_at - skew => TokenState::NearExpiry,
            _ => TokenState::Expired,
        }
    }
}

/// Classify an optional token
pub fn token_state(token: Option<&Token>, now: DateTime<Utc>) -> TokenState {
    token.map_or(TokenState::Unauthenticated, |t| t.state(now))
}

/// Transport for the token endpoint
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Full authentication with the configured grant
    async fn authenticate(&self) -> Result<TokenGrant>;

    /// Exchange a refresh token for a new pair
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}

/// Owns and renews one adapter's token
pub struct TokenManager {
    provider: String,
    source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock>,
    token: RwLock<Option<Token>>,
}

impl TokenManager {
    /// Create an unauthenticated manager
    pub fn new(provider: impl Into<String>, source: Arc<dyn TokenSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider: provider.into(),
            source,
            clock,
            token: RwLock::new(None),
        }
    }

    /// Current state without touching the network
    pub async fn state(&self) -> TokenState {
        let token = self.token.read().await;
        token_state(token.as_ref(), self.clock.now())
    }

    /// Snapshot of the held token
    pub async fn current(&self) -> Option<Token> {
        self.token.read().await.clone()
    }

    /// Make sure a usable access token is held
    pub async fn ensure_valid_token(&self, ctx: &RequestContext) -> Result<()> {
        self.access_token(ctx).await.map(|_| ())
    }

    /// Usable access token, renewing it when stale
    pub async fn access_token(&self, ctx: &RequestContext) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(current) = token.as_ref() {
                if current.state(self.clock.now()) == TokenState::Valid {
                    return Ok(current.access_token.clone());
                }
            }
        }

        let mut slot = self.token.write().await;
        // Another caller may have renewed the token while we waited for the lock
        let state = token_state(slot.as_ref(), self.clock.now());
        match state {
            TokenState::Valid => {}
            TokenState::NearExpiry => {
                let refresh_token = slot
                    .as_ref()
                    .and_then(|t| t.refresh_token.clone())
                    .unwrap_or_default();
                match self.refresh_locked(ctx, &refresh_token).await {
                    Ok(token) => *slot = Some(token),
                    Err(Error::Authentication { status, .. }) => {
                        warn!(
                            "Refresh rejected by {} (HTTP {}), re-authenticating",
                            self.provider, status
                        );
                        *slot = None;
                        *slot = Some(self.authenticate_locked(ctx).await?);
                    }
                    Err(e) => return Err(e),
                }
            }
            TokenState::Unauthenticated | TokenState::Expired => {
                *slot = None;
                *slot = Some(self.authenticate_locked(ctx).await?);
            }
        }

        slot.as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| Error::Config(format!("{} token slot empty after renewal", self.provider)))
    }

    /// Discard any held token and authenticate from scratch
    pub async fn authenticate(&self, ctx: &RequestContext) -> Result<()> {
        let mut slot = self.token.write().await;
        *slot = None;
        *slot = Some(self.authenticate_locked(ctx).await?);
        Ok(())
    }

    /// Drop the held token
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    /// Drop the held token only if it is still the `rejected` one
    ///
    /// Returns whether the slot was cleared. A token renewed by another caller
    /// after `rejected` was sent is kept.
    pub async fn invalidate_if(&self, rejected: &str) -> bool {
        let mut slot = self.token.write().await;
        match slot.as_ref() {
            Some(current) if current.access_token == rejected => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    async fn authenticate_locked(&self, ctx: &RequestContext) -> Result<Token> {
        debug!("Authenticating with {}", self.provider);
        let result = ctx
            .run(&self.provider, "authenticate", self.source.authenticate())
            .await;
        self.record("authenticate", &result);
        let grant = result?;
        let token = Token::from_grant(grant, self.clock.now());
        info!(
            "Authenticated with {}, access token valid until {}",
            self.provider, token.expires_at
        );
        Ok(token)
    }

    async fn refresh_locked(&self, ctx: &RequestContext, refresh_token: &str) -> Result<Token> {
        debug!("Refreshing {} access token", self.provider);
        let result = ctx
            .run(&self.provider, "refresh", self.source.refresh(refresh_token))
            .await;
        self.record("refresh", &result);
        let token = Token::from_grant(result?, self.clock.now());
        info!(
            "Refreshed {} access token, valid until {}",
            self.provider, token.expires_at
        );
        Ok(token)
    }

    fn record(&self, grant: &str, result: &Result<TokenGrant>) {
        let outcome = if result.is_ok() { "success" } else { "failure" };
        TOKEN_REQUESTS_TOTAL
            .with_label_values(&[&self.provider, grant, outcome])
            .inc();
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted token endpoint counting its calls
    struct FakeSource {
        auth_calls: AtomicU32,
        refresh_calls: AtomicU32,
        issue_refresh: bool,
        refresh_status: Mutex<Option<u16>>,
        auth_status: Option<u16>,
        latency: std::time::Duration,
    }

    impl FakeSource {
        fn client_credentials() -> Self {
            Self {
                auth_calls: AtomicU32::new(0),
                refresh_calls: AtomicU32::new(0),
                issue_refresh: false,
                refresh_status: Mutex::new(None),
                auth_status: None,
                latency: std::time::Duration::ZERO,
            }
        }

        fn password() -> Self {
            Self {
                issue_refresh: true,
                ..Self::client_credentials()
            }
        }

        fn grant(&self, n: u32) -> TokenGrant {
            TokenGrant {
                access_token: format!("access-{}", n),
                token_type: "Bearer".into(),
                expires_in: 300,
                refresh_token: self.issue_refresh.then(|| format!("refresh-{}", n)),
                refresh_expires_in: self.issue_refresh.then_some(1800),
                scope: None,
            }
        }

        fn auths(&self) -> u32 {
            self.auth_calls.load(Ordering::SeqCst)
        }

        fn refreshes(&self) -> u32 {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for FakeSource {
        async fn authenticate(&self) -> Result<TokenGrant> {
            let n = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if let Some(status) = self.auth_status {
                return Err(Error::Authentication {
                    provider: "FAKE".into(),
                    status,
                    body: r#"{"error":"invalid_client"}"#.into(),
                });
            }
            Ok(TokenGrant {
                expires_in: if self.issue_refresh { 300 } else { 3600 },
                ..self.grant(n)
            })
        }

        async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
            let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
            assert!(refresh_token.starts_with("refresh-"));
            if let Some(status) = *self.refresh_status.lock().unwrap() {
                return Err(Error::Authentication {
                    provider: "FAKE".into(),
                    status,
                    body: "expired".into(),
                });
            }
            Ok(self.grant(100 + n))
        }
    }

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn manager(source: Arc<FakeSource>) -> (TokenManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        (TokenManager::new("FAKE", source, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_first_call_authenticates_then_reuses() {
        let source = Arc::new(FakeSource::client_credentials());
        let (tokens, clock) = manager(source.clone());
        let ctx = RequestContext::background();

        assert_eq!(tokens.state().await, TokenState::Unauthenticated);
        assert_eq!(tokens.access_token(&ctx).await.unwrap(), "access-1");

        clock.advance(Duration::seconds(3000));
        assert_eq!(tokens.access_token(&ctx).await.unwrap(), "access-1");
        assert_eq!(source.auths(), 1);
    }

    #[tokio::test]
    async fn test_client_credentials_reauthenticates_after_expiry() {
        let source = Arc::new(FakeSource::client_credentials());
        let (tokens, clock) = manager(source.clone());
        let ctx = RequestContext::background();

        tokens.ensure_valid_token(&ctx).await.unwrap();
        clock.advance(Duration::seconds(3601));
        tokens.ensure_valid_token(&ctx).await.unwrap();

        assert_eq!(source.auths(), 2);
        assert_eq!(source.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_skew_triggers_renewal_before_expiry() {
        let source = Arc::new(FakeSource::client_credentials());
        let (tokens, clock) = manager(source.clone());
        let ctx = RequestContext::background();

        tokens.ensure_valid_token(&ctx).await.unwrap();
        clock.advance(Duration::seconds(3600 - 30));
        assert_eq!(tokens.state().await, TokenState::Expired);
        tokens.ensure_valid_token(&ctx).await.unwrap();
        assert_eq!(source.auths(), 2);
    }

    #[tokio::test]
    async fn test_near_expiry_refreshes_once() {
        let source = Arc::new(FakeSource::password());
        let (tokens, clock) = manager(source.clone());
        let ctx = RequestContext::background();

        tokens.ensure_valid_token(&ctx).await.unwrap();
        clock.advance(Duration::seconds(301));
        assert_eq!(tokens.state().await, TokenState::NearExpiry);

        assert_eq!(tokens.access_token(&ctx).await.unwrap(), "access-101");
        assert_eq!(tokens.access_token(&ctx).await.unwrap(), "access-101");
        assert_eq!(source.auths(), 1);
        assert_eq!(source.refreshes(), 1);
    }

    #[tokio::test]
    async fn test_both_expired_reauthenticates() {
        let source = Arc::new(FakeSource::password());
        let (tokens, clock) = manager(source.clone());
        let ctx = RequestContext::background();

        tokens.ensure_valid_token(&ctx).await.unwrap();
        clock.advance(Duration::seconds(1800));
        assert_eq!(tokens.state().await, TokenState::Expired);

        assert_eq!(tokens.access_token(&ctx).await.unwrap(), "access-2");
        assert_eq!(source.auths(), 2);
        assert_eq!(source.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_rejected_refresh_falls_back_to_authentication() {
        let source = Arc::new(FakeSource::password());
        let (tokens, clock) = manager(source.clone());
        let ctx = RequestContext::background();

        tokens.ensure_valid_token(&ctx).await.unwrap();
        *source.refresh_status.lock().unwrap() = Some(401);
        clock.advance(Duration::seconds(400));

        assert_eq!(tokens.access_token(&ctx).await.unwrap(), "access-2");
        assert_eq!(source.refreshes(), 1);
        assert_eq!(source.auths(), 2);
    }

    #[tokio::test]
    async fn test_authentication_failure_is_not_retried() {
        let source = Arc::new(FakeSource {
            auth_status: Some(401),
            ..FakeSource::client_credentials()
        });
        let (tokens, _clock) = manager(source.clone());

        let err = tokens
            .ensure_valid_token(&RequestContext::background())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { status: 401, .. }));
        assert_eq!(source.auths(), 1);
        assert_eq!(tokens.state().await, TokenState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_authentication() {
        let source = Arc::new(FakeSource {
            latency: std::time::Duration::from_millis(50),
            ..FakeSource::client_credentials()
        });
        let (tokens, _clock) = manager(source.clone());
        let tokens = Arc::new(tokens);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let tokens = tokens.clone();
            handles.push(tokio::spawn(async move {
                tokens.access_token(&RequestContext::background()).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "access-1");
        }
        assert_eq!(source.auths(), 1);
    }

    #[tokio::test]
    async fn test_forced_authentication_replaces_token() {
        let source = Arc::new(FakeSource::password());
        let (tokens, _clock) = manager(source.clone());
        let ctx = RequestContext::background();

        tokens.ensure_valid_token(&ctx).await.unwrap();
        tokens.authenticate(&ctx).await.unwrap();
        assert_eq!(tokens.current().await.unwrap().access_token, "access-2");
    }

    #[tokio::test]
    async fn test_invalidate_if_keeps_a_renewed_token() {
        let source = Arc::new(FakeSource::client_credentials());
        let (tokens, _clock) = manager(source.clone());
        let ctx = RequestContext::background();

        let stale = tokens.access_token(&ctx).await.unwrap();
        tokens.authenticate(&ctx).await.unwrap();

        assert!(!tokens.invalidate_if(&stale).await);
        assert_eq!(tokens.state().await, TokenState::Valid);
        assert!(tokens.invalidate_if("access-2").await);
        assert_eq!(tokens.state().await, TokenState::Unauthenticated);

        tokens.ensure_valid_token(&ctx).await.unwrap();
        tokens.invalidate().await;
        assert_eq!(tokens.state().await, TokenState::Unauthenticated);
        assert_eq!(source.auths(), 3);
    }

    #[test]
    fn test_grant_without_refresh_lifetime_is_not_refreshable() {
        let grant = TokenGrant {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            expires_in: 60,
            refresh_token: Some("r".into()),
            refresh_expires_in: None,
            scope: None,
        };
        let token = Token::from_grant(grant, start());
        assert!(token.refresh_token.is_none());
        assert_eq!(token.state(start() + Duration::seconds(45)), TokenState::Expired);
    }
}

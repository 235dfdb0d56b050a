//! Authenticated request execution and response classification

use crate::config::{Environment, TlsIdentity};
use crate::context::RequestContext;
use crate::envelope;
use crate::metrics::{PROVIDER_REQUESTS_TOTAL, PROVIDER_REQUEST_DURATION};
use crate::token::TokenManager;
use crate::{Error, Result};
use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Base URL an endpoint is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// Boleto API
    Api,
    /// PIX API
    Pix,
}

/// Request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No body
    Empty,
    /// Pre-encoded JSON
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

/// Expected response media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// `application/json`
    Json,
    /// `application/pdf` (a JSON envelope is accepted too)
    Pdf,
}

/// One provider endpoint call
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Operation name for logs and metrics
    pub operation: &'static str,
    /// HTTP method
    pub method: Method,
    /// Base URL
    pub base: Base,
    /// Path relative to the base URL
    pub path: String,
    /// Query string pairs
    pub query: Vec<(&'static str, String)>,
    /// Body
    pub payload: Payload,
    /// Status codes treated as success
    pub success: &'static [u16],
    /// Expected response type
    pub accept: Accept,
    /// Safe to replay on transport failure
    pub idempotent: bool,
}

impl Endpoint {
    /// Idempotent `GET` expecting 200
    pub fn get(operation: &'static str, base: Base, path: impl Into<String>) -> Self {
        Self {
            operation,
            method: Method::GET,
            base,
            path: path.into(),
            query: Vec::new(),
            payload: Payload::Empty,
            success: &[200],
            accept: Accept::Json,
            idempotent: true,
        }
    }

    /// State-changing call with a JSON body, expecting 200
    pub fn json<T: Serialize + ?Sized>(
        operation: &'static str,
        method: Method,
        base: Base,
        path: impl Into<String>,
        body: &T,
    ) -> Result<Self> {
        Ok(Self {
            operation,
            method,
            base,
            path: path.into(),
            query: Vec::new(),
            payload: Payload::Json(serde_json::to_vec(body)?),
            success: &[200],
            accept: Accept::Json,
            idempotent: false,
        })
    }

    /// Add a query pair
    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// Replace the success set
    pub fn success(mut self, codes: &'static [u16]) -> Self {
        self.success = codes;
        self
    }

    /// Expect a PDF
    pub fn pdf(mut self) -> Self {
        self.accept = Accept::Pdf;
        self
    }
}

/// Successful response
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status
    pub status: u16,
    /// Content type header
    pub content_type: Option<String>,
    /// Raw body
    pub body: Bytes,
}

impl Response {
    /// Decode the JSON body
    pub fn json<T: DeserializeOwned>(&self, provider: &str) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            warn!("Undecodable {} response body: {}", provider, e);
            Error::Serialization(format!("{} response: {}", provider, e))
        })
    }

    /// Whether the body is empty or whitespace
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Whether the server labelled the body as PDF
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/pdf"))
            || self.body.starts_with(b"%PDF")
    }
}

/// Static settings of one executor
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Provider name
    pub provider: String,
    /// Boleto API base URL
    pub api_url: String,
    /// PIX API base URL
    pub pix_url: String,
    /// Headers added to every call
    pub headers: HeaderMap,
    /// Retries for idempotent endpoints on transport failures
    pub max_retries: u32,
}

/// Builds, sends and classifies authenticated provider requests
pub struct RequestExecutor {
    settings: ExecutorSettings,
    client: Client,
    tokens: Arc<TokenManager>,
}

impl RequestExecutor {
    /// Create an executor sharing `client` with the token endpoint
    pub fn new(settings: ExecutorSettings, client: Client, tokens: Arc<TokenManager>) -> Self {
        Self {
            settings,
            client,
            tokens,
        }
    }

    /// Provider name
    pub fn provider(&self) -> &str {
        &self.settings.provider
    }

    /// Token manager
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Execute `endpoint`, retrying idempotent calls on transport failures
    pub async fn execute(&self, ctx: &RequestContext, endpoint: Endpoint) -> Result<Response> {
        let retries = if endpoint.idempotent {
            self.settings.max_retries
        } else {
            0
        };
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_interval(Duration::from_secs(5))
            .with_max_elapsed_time(None)
            .build();

        let mut attempt = 0;
        loop {
            let start = Instant::now();
            let result = self.send_once(ctx, &endpoint).await;
            self.record(&endpoint, start, &result);

            match result {
                Err(e) if e.is_retryable() && attempt < retries && !ctx.is_done() => {
                    attempt += 1;
                    let delay = backoff.next_backoff().unwrap_or(Duration::from_secs(5));
                    warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        self.provider(),
                        endpoint.operation,
                        e,
                        attempt,
                        retries,
                        delay
                    );
                    ctx.run(self.provider(), endpoint.operation, async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                }
                other => return other,
            }
        }
    }

    async fn send_once(&self, ctx: &RequestContext, endpoint: &Endpoint) -> Result<Response> {
        let provider = self.provider();
        let token = self.tokens.access_token(ctx).await?;

        let base = match endpoint.base {
            Base::Api => &self.settings.api_url,
            Base::Pix => &self.settings.pix_url,
        };
        let url = format!("{}{}", base, endpoint.path);
        let accept = match endpoint.accept {
            Accept::Json => HeaderValue::from_static("application/json"),
            Accept::Pdf => HeaderValue::from_static("application/pdf, application/json"),
        };

        let mut request = self
            .client
            .request(endpoint.method.clone(), &url)
            .headers(self.settings.headers.clone())
            .header(ACCEPT, accept)
            .bearer_auth(&token);
        if !endpoint.query.is_empty() {
            request = request.query(&endpoint.query);
        }
        request = match &endpoint.payload {
            Payload::Empty => request,
            Payload::Json(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone()),
            Payload::Form(pairs) => request.form(pairs),
        };

        debug!("{} {} {}", provider, endpoint.method, url);

        let response = ctx
            .run(provider, endpoint.operation, async {
                let response = request
                    .send()
                    .await
                    .map_err(|e| Error::transport(provider, e))?;
                let status = response.status().as_u16();
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| Error::transport(provider, e))?;
                Ok(Response {
                    status,
                    content_type,
                    body,
                })
            })
            .await?;

        if endpoint.success.contains(&response.status) {
            return Ok(response);
        }

        if response.status == 401 {
            if self.tokens.invalidate_if(&token).await {
                info!("{} rejected the access token, discarding it", provider);
            } else {
                debug!("{} rejected an access token already replaced", provider);
            }
        }
        Err(envelope::classify(provider, response.status, &response.body))
    }

    fn record(&self, endpoint: &Endpoint, start: Instant, result: &Result<Response>) {
        let outcome = match result {
            Ok(_) => "success",
            Err(e) => match e.category() {
                crate::ErrorCategory::Transport => "transport_error",
                crate::ErrorCategory::Auth => "auth_error",
                _ => "provider_error",
            },
        };
        PROVIDER_REQUEST_DURATION
            .with_label_values(&[self.provider(), endpoint.operation])
            .observe(start.elapsed().as_secs_f64());
        PROVIDER_REQUESTS_TOTAL
            .with_label_values(&[self.provider(), endpoint.operation, outcome])
            .inc();
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("provider", &self.settings.provider)
            .field("api_url", &self.settings.api_url)
            .field("pix_url", &self.settings.pix_url)
            .field("max_retries", &self.settings.max_retries)
            .finish_non_exhaustive()
    }
}

/// HTTP client with the provider timeout and, in production, the mTLS identity
pub fn build_client(
    provider: &str,
    timeout: Duration,
    environment: Environment,
    tls: Option<&TlsIdentity>,
) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .min_tls_version(reqwest::tls::Version::TLS_1_2);

    match (environment, tls) {
        (Environment::Production, Some(identity)) => {
            info!("Loading {} client certificate for mutual TLS", provider);
            builder = builder.identity(identity.load()?);
        }
        (Environment::Sandbox, Some(_)) => {
            warn!(
                "{} client certificate configured but ignored outside production",
                provider
            );
        }
        _ => {}
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("{} HTTP client: {}", provider, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_builders() {
        let endpoint = Endpoint::get("query_boleto", Base::Api, "/boletos")
            .query("nossoNumero", "123")
            .success(&[200, 206]);
        assert!(endpoint.idempotent);
        assert_eq!(endpoint.query, vec![("nossoNumero", "123".to_string())]);
        assert_eq!(endpoint.success, &[200, 206]);

        let body = serde_json::json!({"seuNumero": "A1"});
        let endpoint =
            Endpoint::json("change_their_number", Method::PATCH, Base::Api, "/x", &body).unwrap();
        assert!(!endpoint.idempotent);
        assert_eq!(endpoint.payload, Payload::Json(br#"{"seuNumero":"A1"}"#.to_vec()));
    }

    #[test]
    fn test_pdf_detection() {
        let response = Response {
            status: 200,
            content_type: None,
            body: Bytes::from_static(b"%PDF-1.4 ..."),
        };
        assert!(response.is_pdf());
        assert!(!response.is_empty());
    }

    #[test]
    fn test_sandbox_ignores_identity() {
        let identity = TlsIdentity {
            cert_path: "/nonexistent/cert.pem".into(),
            key_path: "/nonexistent/key.pem".into(),
        };
        assert!(build_client(
            "SICOOB",
            Duration::from_secs(5),
            Environment::Sandbox,
            Some(&identity)
        )
        .is_ok());
        assert!(matches!(
            build_client(
                "SICOOB",
                Duration::from_secs(5),
                Environment::Production,
                Some(&identity)
            ),
            Err(Error::Config(_))
        ));
    }
}

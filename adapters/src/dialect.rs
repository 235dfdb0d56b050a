//! Provider wire dialects
//!
//! A [`Dialect`] knows one bank's paths, body shapes and response formats. Token
//! handling, header injection, error classification and retries live in the shared
//! [`RequestExecutor`]; the generic adapter drives both.

use crate::config::{Environment, TlsIdentity};
use crate::context::RequestContext;
use crate::http::{Endpoint, ExecutorSettings, RequestExecutor, Response};
use crate::instruction::{InstructionCommand, InstructionRoute};
use crate::oauth::Grant;
use crate::types::{Boleto, BoletoReceipt, InstructionReceipt, ListQuery, NewBoleto, ProviderKind};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Everything needed to wire a dialect to the network
#[derive(Debug, Clone)]
pub struct Connection {
    /// Token endpoint
    pub token_url: String,
    /// Grant used for full authentication
    pub grant: Grant,
    /// Extra headers on token requests
    pub token_headers: HeaderMap,
    /// Executor settings (base URLs, per-call headers, retries)
    pub executor: ExecutorSettings,
    /// Request timeout
    pub timeout: Duration,
    /// Environment
    pub environment: Environment,
    /// mTLS identity
    pub tls: Option<TlsIdentity>,
}

/// Bank-specific operation mappings
#[async_trait]
pub trait Dialect: Send + Sync + 'static {
    /// Provider served by this dialect
    fn kind(&self) -> ProviderKind;

    /// Register a boleto
    async fn create_boleto(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        boleto: &NewBoleto,
    ) -> Result<BoletoReceipt>;

    /// Look up one boleto by our-number
    async fn query_boleto(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        our_number: &str,
    ) -> Result<Boleto>;

    /// List boletos, in provider order
    async fn list_boletos(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        query: &ListQuery,
    ) -> Result<Vec<Boleto>>;

    /// Instruction route table
    fn instruction_routes(&self) -> &'static [InstructionRoute];

    /// Endpoint executing `command` through `route`
    fn instruction_endpoint(
        &self,
        route: &InstructionRoute,
        command: &InstructionCommand,
    ) -> Result<Endpoint>;

    /// Decode an instruction acknowledgement
    fn decode_instruction(&self, response: &Response) -> Result<InstructionReceipt>;

    /// Printable PDF of a boleto
    async fn print_boleto_pdf(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        our_number: &str,
    ) -> Result<Bytes>;
}

/// Append a header, mapping an invalid name or value to a configuration error
pub(crate) fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::Config(format!("invalid header name {:?}", name)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::Config(format!("invalid value for header {}", name)))?;
    headers.insert(header, value);
    Ok(())
}

/// Choose the override or the environment's default URL
pub(crate) fn pick_url(
    override_url: Option<&String>,
    environment: Environment,
    production: &str,
    sandbox: &str,
) -> String {
    let url = match (override_url, environment) {
        (Some(url), _) => url.as_str(),
        (None, Environment::Production) => production,
        (None, Environment::Sandbox) => sandbox,
    };
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_url_prefers_override() {
        let custom = "http://127.0.0.1:9000/".to_string();
        assert_eq!(
            pick_url(Some(&custom), Environment::Production, "https://p", "https://s"),
            "http://127.0.0.1:9000"
        );
        assert_eq!(pick_url(None, Environment::Sandbox, "https://p", "https://s"), "https://s");
    }

    #[test]
    fn test_invalid_header_value() {
        let mut headers = HeaderMap::new();
        assert!(insert_header(&mut headers, "x-api-key", "ok").is_ok());
        assert!(insert_header(&mut headers, "x-api-key", "bad\nvalue").is_err());
    }

    #[test]
    fn test_header_names_are_normalized_or_rejected() {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "X-Sicoob-ClientId", "abc").unwrap();
        assert_eq!(headers.get("x-sicoob-clientid").unwrap(), "abc");

        let err = insert_header(&mut headers, "bad header", "abc").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

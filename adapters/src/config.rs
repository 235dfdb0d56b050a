//! Provider configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Provider environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Homologation / sandbox
    #[default]
    Sandbox,
    /// Production
    Production,
}

impl std::str::FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "homologacao" | "homologation" => Ok(Environment::Sandbox),
            "production" | "producao" => Ok(Environment::Production),
            other => Err(Error::Config(format!("unknown environment: {}", other))),
        }
    }
}

/// Client certificate pair for mutual TLS (PEM files)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsIdentity {
    /// Certificate chain (PEM)
    pub cert_path: PathBuf,
    /// Private key (PEM)
    pub key_path: PathBuf,
}

impl TlsIdentity {
    /// Load the pair as a reqwest identity
    pub fn load(&self) -> Result<reqwest::Identity> {
        let mut pem = std::fs::read(&self.cert_path).map_err(|e| {
            Error::Config(format!("failed to read certificate {:?}: {}", self.cert_path, e))
        })?;
        let key = std::fs::read(&self.key_path).map_err(|e| {
            Error::Config(format!("failed to read private key {:?}: {}", self.key_path, e))
        })?;
        pem.push(b'\n');
        pem.extend_from_slice(&key);
        reqwest::Identity::from_pem(&pem)
            .map_err(|e| Error::Config(format!("invalid client certificate: {}", e)))
    }
}

/// URL overrides (sandboxes, proxies, tests)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointOverrides {
    /// Token endpoint
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Boleto API base URL
    #[serde(default)]
    pub api_url: Option<String>,
    /// PIX API base URL
    #[serde(default)]
    pub pix_url: Option<String>,
}

/// Transport settings shared by all providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Retries for idempotent reads on transport failures
    #[serde(default)]
    pub max_retries: u32,
}

fn default_timeout_seconds() -> u64 {
    crate::DEFAULT_REQUEST_TIMEOUT_SECONDS
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_retries: 0,
        }
    }
}

impl HttpConfig {
    /// Timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Sicoob credentials (client-credentials grant)
#[derive(Clone, Serialize, Deserialize)]
pub struct SicoobConfig {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: String,
    /// Optional API gateway key (`x-api-key`)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Contract number
    pub contract_number: String,
    /// Cooperative code (4 digits)
    #[serde(default)]
    pub cooperative: String,
    /// Environment
    #[serde(default)]
    pub environment: Environment,
    /// mTLS pair, used in production only
    #[serde(default)]
    pub tls: Option<TlsIdentity>,
    /// Transport settings
    #[serde(default)]
    pub http: HttpConfig,
    /// URL overrides
    #[serde(default)]
    pub endpoints: EndpointOverrides,
}

impl std::fmt::Debug for SicoobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SicoobConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("contract_number", &self.contract_number)
            .field("cooperative", &self.cooperative)
            .field("environment", &self.environment)
            .field("tls", &self.tls)
            .field("http", &self.http)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl SicoobConfig {
    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("sicoob: client_id is required".into()));
        }
        if self.contract_number.trim().is_empty() {
            return Err(Error::Config("sicoob: contract_number is required".into()));
        }
        if !self.cooperative.is_empty() && !is_digits(&self.cooperative, 4) {
            return Err(Error::Config("sicoob: cooperative must have 4 digits".into()));
        }
        Ok(())
    }

    /// Load from `SICOOB_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            client_id: require_env("SICOOB_CLIENT_ID")?,
            client_secret: std::env::var("SICOOB_CLIENT_SECRET").unwrap_or_default(),
            api_key: std::env::var("SICOOB_API_KEY").ok(),
            contract_number: require_env("SICOOB_CONTRACT_NUMBER")?,
            cooperative: std::env::var("SICOOB_COOPERATIVE").unwrap_or_default(),
            environment: env_environment("SICOOB_ENVIRONMENT")?,
            tls: env_tls("SICOOB_CERT_PATH", "SICOOB_KEY_PATH"),
            http: env_http("SICOOB")?,
            endpoints: env_endpoints("SICOOB"),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Sicredi credentials (password grant with refresh)
#[derive(Clone, Serialize, Deserialize)]
pub struct SicrediConfig {
    /// Developer portal key (`x-api-key`)
    pub api_key: String,
    /// Beneficiary code + cooperative code
    pub username: String,
    /// Access code generated in internet banking
    pub password: String,
    /// Cooperative (4 digits)
    pub cooperative: String,
    /// Branch / posto (2 digits)
    pub branch: String,
    /// Beneficiary code (5 digits)
    pub beneficiary_code: String,
    /// Environment
    #[serde(default)]
    pub environment: Environment,
    /// mTLS pair, used in production only
    #[serde(default)]
    pub tls: Option<TlsIdentity>,
    /// Transport settings
    #[serde(default)]
    pub http: HttpConfig,
    /// URL overrides
    #[serde(default)]
    pub endpoints: EndpointOverrides,
}

impl std::fmt::Debug for SicrediConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SicrediConfig")
            .field("api_key", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("cooperative", &self.cooperative)
            .field("branch", &self.branch)
            .field("beneficiary_code", &self.beneficiary_code)
            .field("environment", &self.environment)
            .field("tls", &self.tls)
            .field("http", &self.http)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl SicrediConfig {
    /// Check required fields and code formats
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_key", &self.api_key),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("sicredi: {} is required", name)));
            }
        }
        if !is_digits(&self.cooperative, 4) {
            return Err(Error::Config("sicredi: cooperative must have 4 digits".into()));
        }
        if !is_digits(&self.branch, 2) {
            return Err(Error::Config("sicredi: branch must have 2 digits".into()));
        }
        if !is_digits(&self.beneficiary_code, 5) {
            return Err(Error::Config("sicredi: beneficiary_code must have 5 digits".into()));
        }
        Ok(())
    }

    /// Load from `SICREDI_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            api_key: require_env("SICREDI_API_KEY")?,
            username: require_env("SICREDI_USERNAME")?,
            password: require_env("SICREDI_PASSWORD")?,
            cooperative: require_env("SICREDI_COOPERATIVE")?,
            branch: require_env("SICREDI_BRANCH")?,
            beneficiary_code: require_env("SICREDI_BENEFICIARY_CODE")?,
            environment: env_environment("SICREDI_ENVIRONMENT")?,
            tls: env_tls("SICREDI_CERT_PATH", "SICREDI_KEY_PATH"),
            http: env_http("SICREDI")?,
            endpoints: env_endpoints("SICREDI"),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Top-level configuration: every configured provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sicoob adapter
    #[serde(default)]
    pub sicoob: Option<SicoobConfig>,
    /// Sicredi adapter
    #[serde(default)]
    pub sicredi: Option<SicrediConfig>,
}

impl Config {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables; a provider is enabled by its first variable
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if std::env::var("SICOOB_CLIENT_ID").is_ok() {
            config.sicoob = Some(SicoobConfig::from_env()?);
        }

        if std::env::var("SICREDI_API_KEY").is_ok() {
            config.sicredi = Some(SicrediConfig::from_env()?);
        }

        Ok(config)
    }

    /// Validate every configured provider
    pub fn validate(&self) -> Result<()> {
        if let Some(sicoob) = &self.sicoob {
            sicoob.validate()?;
        }
        if let Some(sicredi) = &self.sicredi {
            sicredi.validate()?;
        }
        Ok(())
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
}

fn env_environment(name: &str) -> Result<Environment> {
    match std::env::var(name) {
        Ok(value) => value.parse(),
        Err(_) => Ok(Environment::default()),
    }
}

fn env_tls(cert: &str, key: &str) -> Option<TlsIdentity> {
    match (std::env::var(cert), std::env::var(key)) {
        (Ok(cert_path), Ok(key_path)) => Some(TlsIdentity {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        }),
        _ => None,
    }
}

fn env_http(prefix: &str) -> Result<HttpConfig> {
    let mut http = HttpConfig::default();
    if let Ok(value) = std::env::var(format!("{}_TIMEOUT_SECONDS", prefix)) {
        http.timeout_seconds = value
            .parse()
            .map_err(|e| Error::Config(format!("{}_TIMEOUT_SECONDS: {}", prefix, e)))?;
    }
    if let Ok(value) = std::env::var(format!("{}_MAX_RETRIES", prefix)) {
        http.max_retries = value
            .parse()
            .map_err(|e| Error::Config(format!("{}_MAX_RETRIES: {}", prefix, e)))?;
    }
    Ok(http)
}

fn env_endpoints(prefix: &str) -> EndpointOverrides {
    EndpointOverrides {
        auth_url: std::env::var(format!("{}_AUTH_URL", prefix)).ok(),
        api_url: std::env::var(format!("{}_API_URL", prefix)).ok(),
        pix_url: std::env::var(format!("{}_PIX_URL", prefix)).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[sicoob]
client_id = "9b5e603e428cc477a2841e2683c92d21"
client_secret = "s3cr3t"
contract_number = "25546454"
cooperative = "3069"
environment = "production"

[sicoob.tls]
cert_path = "/etc/cobranca/sicoob.crt"
key_path = "/etc/cobranca/sicoob.key"

[sicredi]
api_key = "portal-key"
username = "123456789"
password = "codigo-acesso"
cooperative = "0100"
branch = "02"
beneficiary_code = "12345"

[sicredi.http]
timeout_seconds = 10
max_retries = 2
"#;

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        config.validate().unwrap();

        let sicoob = config.sicoob.unwrap();
        assert_eq!(sicoob.environment, Environment::Production);
        assert_eq!(sicoob.http.timeout_seconds, 30);
        assert!(sicoob.tls.is_some());

        let sicredi = config.sicredi.unwrap();
        assert_eq!(sicredi.environment, Environment::Sandbox);
        assert_eq!(sicredi.http.timeout(), Duration::from_secs(10));
        assert_eq!(sicredi.http.max_retries, 2);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cr3t"));
        assert!(!rendered.contains("codigo-acesso"));
        assert!(!rendered.contains("portal-key"));
    }

    #[test]
    fn test_rejects_malformed_codes() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        if let Some(sicredi) = config.sicredi.as_mut() {
            sicredi.branch = "2".into();
        }
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_environment_aliases() {
        assert_eq!("producao".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
    }
}

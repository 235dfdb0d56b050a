//! Provider check binary
//!
//! Loads the provider configuration and authenticates with every configured bank.

use anyhow::{bail, Context};
use cobranca_adapters::{Config, ProviderRegistry, RequestContext};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    if dotenvy::dotenv().is_ok() {
        info!("Loaded variables from .env");
    }

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("COBRANCA_CONFIG").ok());
    let config = match config_path {
        Some(path) => {
            info!("Loading config from: {}", path);
            Config::from_file(&path).with_context(|| format!("loading {}", path))?
        }
        None => {
            info!("Loading config from environment variables");
            Config::from_env().context("loading provider variables")?
        }
    };

    let registry = ProviderRegistry::from_config(&config).await?;
    let providers = registry.providers().await;
    if providers.is_empty() {
        warn!("No provider configured");
        bail!("set SICOOB_* or SICREDI_* variables, or pass a config file");
    }

    let ctx = RequestContext::with_timeout(Duration::from_secs(
        cobranca_adapters::DEFAULT_REQUEST_TIMEOUT_SECONDS * 2,
    ));
    let report = registry.health_report(&ctx).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let failed = report.iter().filter(|h| !h.healthy).count();
    if failed > 0 {
        error!("{} of {} providers unhealthy", failed, report.len());
        bail!("{} provider(s) failed the health check", failed);
    }

    info!("All {} providers healthy", report.len());
    Ok(())
}

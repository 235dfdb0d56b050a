//! # Cobrança Adapters
//!
//! Adapter layer for Brazilian boleto and PIX charge providers:
//! - OAuth2 token lifecycle with 30 s expiry skew and single-flight renewal
//! - Shared request executor with provider error normalization
//! - Boleto issuance, lookup, listing, instruction commands and PDF
//! - Immediate PIX charges and webhook registration
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        Provider Registry (health, lookup)           │
//! └────────────┬────────────────────────────────────────┘
//!              │
//!     ┌────────┴─────────────┐
//!     │                      │
//! ┌───▼──────────┐    ┌──────▼───────┐
//! │    Sicoob    │    │   Sicredi    │
//! │   Dialect    │    │   Dialect    │
//! └───┬──────────┘    └──────┬───────┘
//!     │                      │
//!     └────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────────────────────────────┐
//! │  BankAdapter: RequestExecutor + TokenManager     │
//! └──────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod adapter;
pub mod clock;
pub mod config;
pub mod context;
pub mod dialect;
pub mod envelope;
pub mod error;
pub mod http;
pub mod instruction;
pub mod manager;
pub mod metrics;
pub mod oauth;
pub mod pix;
pub mod sicoob;
pub mod sicredi;
pub mod token;
pub mod types;
pub mod wire;

pub use adapter::{BankAdapter, ProviderAdapter};
pub use config::{Config, Environment, SicoobConfig, SicrediConfig};
pub use context::RequestContext;
pub use error::{Error, ErrorCategory, ProviderError, Result};
pub use instruction::{InstructionCommand, InstructionKind};
pub use manager::{ProviderHealth, ProviderRegistry};
pub use pix::{PixCharge, PixChargeRequest};
pub use sicoob::SicoobAdapter;
pub use sicredi::SicrediAdapter;
pub use token::{TokenManager, TokenState};
pub use types::*;

/// Default request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

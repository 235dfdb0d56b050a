//! Provider adapter interface

use crate::clock::Clock;
use crate::context::RequestContext;
use crate::dialect::{Connection, Dialect};
use crate::http::{build_client, RequestExecutor};
use crate::instruction::{InstructionCommand, InstructionRoute};
use crate::oauth::OAuthClient;
use crate::pix::{self, PixCharge, PixChargeRequest};
use crate::token::{TokenManager, TokenState};
use crate::types::*;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Boleto and PIX operations offered by every provider
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider kind
    fn kind(&self) -> ProviderKind;

    /// Provider name for logs and reports
    fn provider_name(&self) -> &str;

    /// Authenticate from scratch, replacing any held token
    async fn authenticate(&self, ctx: &RequestContext) -> Result<()>;

    /// Make sure a usable token is held, renewing it when needed
    async fn ensure_valid_token(&self, ctx: &RequestContext) -> Result<()>;

    /// Register a boleto
    async fn create_boleto(&self, ctx: &RequestContext, boleto: &NewBoleto) -> Result<BoletoReceipt>;

    /// Look up a boleto by our-number
    async fn query_boleto(&self, ctx: &RequestContext, our_number: &str) -> Result<Boleto>;

    /// List boletos, open first then by ascending due date
    async fn list_boletos(&self, ctx: &RequestContext, query: &ListQuery) -> Result<Vec<Boleto>>;

    /// Run an instruction command
    async fn execute_instruction(
        &self,
        ctx: &RequestContext,
        command: &InstructionCommand,
    ) -> Result<InstructionReceipt>;

    /// Write off ("baixar") a boleto
    async fn write_off_boleto(&self, ctx: &RequestContext, our_number: &str) -> Result<InstructionReceipt> {
        self.execute_instruction(ctx, &InstructionCommand::write_off(our_number))
            .await
    }

    /// Move the due date
    async fn change_due_date(
        &self,
        ctx: &RequestContext,
        our_number: &str,
        due_date: NaiveDate,
    ) -> Result<InstructionReceipt> {
        let command = InstructionCommand::change_due_date(our_number, due_date)?;
        self.execute_instruction(ctx, &command).await
    }

    /// Replace discount tier values, tier 1 first
    async fn change_discount(
        &self,
        ctx: &RequestContext,
        our_number: &str,
        values: &[Decimal],
    ) -> Result<InstructionReceipt> {
        let command = InstructionCommand::change_discount(our_number, values)?;
        self.execute_instruction(ctx, &command).await
    }

    /// Replace discount tier cutoff dates, tier 1 first
    async fn change_discount_dates(
        &self,
        ctx: &RequestContext,
        our_number: &str,
        dates: &[NaiveDate],
    ) -> Result<InstructionReceipt> {
        let command = InstructionCommand::change_discount_dates(our_number, dates)?;
        self.execute_instruction(ctx, &command).await
    }

    /// Change the late interest value or rate
    async fn change_interest(
        &self,
        ctx: &RequestContext,
        our_number: &str,
        value: Decimal,
    ) -> Result<InstructionReceipt> {
        let command = InstructionCommand::change_interest(our_number, value)?;
        self.execute_instruction(ctx, &command).await
    }

    /// Change the caller's reference
    async fn change_their_number(
        &self,
        ctx: &RequestContext,
        our_number: &str,
        their_number: &str,
    ) -> Result<InstructionReceipt> {
        let command = InstructionCommand::change_their_number(our_number, their_number)?;
        self.execute_instruction(ctx, &command).await
    }

    /// Printable PDF
    async fn print_boleto_pdf(&self, ctx: &RequestContext, our_number: &str) -> Result<Bytes>;

    /// Create an immediate PIX charge
    async fn create_pix_charge(&self, ctx: &RequestContext, request: &PixChargeRequest) -> Result<PixCharge>;

    /// Look up a PIX charge
    async fn query_pix_charge(&self, ctx: &RequestContext, txid: &str) -> Result<PixCharge>;

    /// Register the PIX notification URL for `key`
    async fn register_pix_webhook(&self, ctx: &RequestContext, key: &str, webhook_url: &str) -> Result<()>;

    /// Obtain or hold a valid token without any business call
    async fn health_check(&self, ctx: &RequestContext) -> Result<()> {
        self.ensure_valid_token(ctx).await
    }
}

/// Adapter driving one provider dialect through the shared executor
pub struct BankAdapter<D: Dialect> {
    dialect: D,
    exec: RequestExecutor,
}

impl<D: Dialect> BankAdapter<D> {
    /// Wire `dialect` to its token endpoint and API
    pub fn from_connection(dialect: D, connection: Connection, clock: Arc<dyn Clock>) -> Result<Self> {
        let provider = connection.executor.provider.clone();
        let client = build_client(
            &provider,
            connection.timeout,
            connection.environment,
            connection.tls.as_ref(),
        )?;
        let source = OAuthClient::new(
            provider.clone(),
            connection.token_url,
            connection.grant,
            connection.token_headers,
            client.clone(),
        );
        let tokens = Arc::new(TokenManager::new(provider, Arc::new(source), clock));
        info!(
            "{} adapter ready ({:?})",
            connection.executor.provider, connection.environment
        );

        Ok(Self {
            dialect,
            exec: RequestExecutor::new(connection.executor, client, tokens),
        })
    }

    /// Wire dialect
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Shared executor
    pub fn executor(&self) -> &RequestExecutor {
        &self.exec
    }

    /// Token state without touching the network
    pub async fn token_state(&self) -> TokenState {
        self.exec.tokens().state().await
    }
}

impl<D: Dialect + std::fmt::Debug> std::fmt::Debug for BankAdapter<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankAdapter")
            .field("dialect", &self.dialect)
            .field("exec", &self.exec)
            .finish()
    }
}

#[async_trait]
impl<D: Dialect> ProviderAdapter for BankAdapter<D> {
    fn kind(&self) -> ProviderKind {
        self.dialect.kind()
    }

    fn provider_name(&self) -> &str {
        self.exec.provider()
    }

    async fn authenticate(&self, ctx: &RequestContext) -> Result<()> {
        self.exec.tokens().authenticate(ctx).await
    }

    async fn ensure_valid_token(&self, ctx: &RequestContext) -> Result<()> {
        self.exec.tokens().ensure_valid_token(ctx).await
    }

    async fn create_boleto(&self, ctx: &RequestContext, boleto: &NewBoleto) -> Result<BoletoReceipt> {
        boleto.check()?;
        self.dialect.create_boleto(&self.exec, ctx, boleto).await
    }

    async fn query_boleto(&self, ctx: &RequestContext, our_number: &str) -> Result<Boleto> {
        self.dialect.query_boleto(&self.exec, ctx, our_number).await
    }

    async fn list_boletos(&self, ctx: &RequestContext, query: &ListQuery) -> Result<Vec<Boleto>> {
        let mut boletos = self.dialect.list_boletos(&self.exec, ctx, query).await?;
        order_listing(&mut boletos);
        Ok(boletos)
    }

    async fn execute_instruction(
        &self,
        ctx: &RequestContext,
        command: &InstructionCommand,
    ) -> Result<InstructionReceipt> {
        command.check()?;
        let route = InstructionRoute::lookup(
            self.dialect.instruction_routes(),
            self.provider_name(),
            command.kind(),
        )?;
        let endpoint = self.dialect.instruction_endpoint(route, command)?;
        let response = self.exec.execute(ctx, endpoint).await?;
        let receipt = self.dialect.decode_instruction(&response)?;
        info!(
            "{} accepted {} for boleto {}",
            self.provider_name(),
            command.kind(),
            command.our_number()
        );
        Ok(receipt)
    }

    async fn print_boleto_pdf(&self, ctx: &RequestContext, our_number: &str) -> Result<Bytes> {
        self.dialect.print_boleto_pdf(&self.exec, ctx, our_number).await
    }

    async fn create_pix_charge(&self, ctx: &RequestContext, request: &PixChargeRequest) -> Result<PixCharge> {
        pix::create_charge(&self.exec, ctx, request).await
    }

    async fn query_pix_charge(&self, ctx: &RequestContext, txid: &str) -> Result<PixCharge> {
        pix::query_charge(&self.exec, ctx, txid).await
    }

    async fn register_pix_webhook(&self, ctx: &RequestContext, key: &str, webhook_url: &str) -> Result<()> {
        pix::register_webhook(&self.exec, ctx, key, webhook_url).await
    }
}

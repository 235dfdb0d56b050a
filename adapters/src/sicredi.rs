//! Sicredi adapter (API Parceiro, Cobrança Boleto v1)
//!
//! Password grant with refresh. Every business call carries the portal key and the
//! cooperative, branch and beneficiary codes as headers.

use crate::adapter::BankAdapter;
use crate::clock::{Clock, SystemClock};
use crate::config::SicrediConfig;
use crate::context::RequestContext;
use crate::dialect::{insert_header, pick_url, Connection, Dialect};
use crate::http::{Base, Endpoint, ExecutorSettings, RequestExecutor, Response};
use crate::instruction::{check_path_id, InstructionCommand, InstructionField, InstructionKind, InstructionRoute};
use crate::oauth::Grant;
use crate::types::*;
use crate::wire::{amount, amount_number, amount_opt, date_opt, id_text, rate_number};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::header::HeaderMap;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Production token endpoint
pub const PRODUCTION_AUTH_URL: &str = "https://api-parceiro.sicredi.com.br/auth/openapi/token";
/// Sandbox token endpoint
pub const SANDBOX_AUTH_URL: &str = "https://api-parceiro.sicredi.com.br/sb/auth/openapi/token";
/// Production boleto API base
pub const PRODUCTION_API_URL: &str = "https://api-parceiro.sicredi.com.br/cobranca/boleto/v1";
/// Sandbox boleto API base
pub const SANDBOX_API_URL: &str = "https://api-parceiro.sicredi.com.br/sb/cobranca/boleto/v1";
/// Production PIX API base
pub const PRODUCTION_PIX_URL: &str = "https://api-pix.sicredi.com.br/api/v2";
/// Sandbox PIX API base
pub const SANDBOX_PIX_URL: &str = "https://api-pix-h.sicredi.com.br/api/v2";

/// Token scope
pub const SCOPE: &str = "cobranca";
/// Value of the `context` header on token requests
pub const AUTH_CONTEXT: &str = "COBRANCA";

/// Longest range served by the settled-by-day listing
pub const MAX_LISTING_DAYS: i64 = 31;
/// Message lines accepted on a Sicredi slip
pub const MAX_SICREDI_MESSAGES: usize = 4;

const MAX_PAGES_PER_DAY: u32 = 100;
const SICREDI_SUCCESS: &[u16] = &[200, 202];

static ROUTES: [InstructionRoute; 6] = [
    InstructionRoute {
        kind: InstructionKind::WriteOff,
        segment: "baixa",
        method: Method::PATCH,
        success: SICREDI_SUCCESS,
        keys: &[],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeDueDate,
        segment: "data-vencimento",
        method: Method::PATCH,
        success: SICREDI_SUCCESS,
        keys: &[(InstructionField::DueDate, "dataVencimento")],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeDiscount,
        segment: "desconto",
        method: Method::PATCH,
        success: SICREDI_SUCCESS,
        keys: &[
            (InstructionField::Discount1, "valorDesconto1"),
            (InstructionField::Discount2, "valorDesconto2"),
            (InstructionField::Discount3, "valorDesconto3"),
        ],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeDiscountDates,
        segment: "data-desconto",
        method: Method::PATCH,
        success: SICREDI_SUCCESS,
        keys: &[
            (InstructionField::DiscountDate1, "data1"),
            (InstructionField::DiscountDate2, "data2"),
            (InstructionField::DiscountDate3, "data3"),
        ],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeInterest,
        segment: "juros",
        method: Method::PATCH,
        success: SICREDI_SUCCESS,
        keys: &[(InstructionField::InterestValue, "valorOuPercentual")],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeTheirNumber,
        segment: "seu-numero",
        method: Method::PATCH,
        success: SICREDI_SUCCESS,
        keys: &[(InstructionField::TheirNumber, "seuNumero")],
    },
];

/// Sicredi adapter
pub type SicrediAdapter = BankAdapter<SicrediDialect>;

impl BankAdapter<SicrediDialect> {
    /// Create an adapter from its configuration
    pub fn new(config: SicrediConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an adapter driven by `clock`
    pub fn with_clock(config: SicrediConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let (dialect, connection) = SicrediDialect::connection(&config)?;
        BankAdapter::from_connection(dialect, connection, clock)
    }
}

/// Sicredi paths and payloads
#[derive(Debug, Clone)]
pub struct SicrediDialect {
    beneficiary_code: String,
}

impl SicrediDialect {
    /// Dialect plus connection parts for `config`
    pub fn connection(config: &SicrediConfig) -> Result<(Self, Connection)> {
        let endpoints = &config.endpoints;

        let mut token_headers = HeaderMap::new();
        insert_header(&mut token_headers, "x-api-key", &config.api_key)?;
        insert_header(&mut token_headers, "context", AUTH_CONTEXT)?;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "x-api-key", &config.api_key)?;
        insert_header(&mut headers, "cooperativa", &config.cooperative)?;
        insert_header(&mut headers, "posto", &config.branch)?;
        insert_header(&mut headers, "codigobeneficiario", &config.beneficiary_code)?;

        let connection = Connection {
            token_url: pick_url(
                endpoints.auth_url.as_ref(),
                config.environment,
                PRODUCTION_AUTH_URL,
                SANDBOX_AUTH_URL,
            ),
            grant: Grant::Password {
                username: config.username.clone(),
                password: config.password.clone(),
                scope: SCOPE.to_string(),
            },
            token_headers,
            executor: ExecutorSettings {
                provider: ProviderKind::Sicredi.name().to_string(),
                api_url: pick_url(
                    endpoints.api_url.as_ref(),
                    config.environment,
                    PRODUCTION_API_URL,
                    SANDBOX_API_URL,
                ),
                pix_url: pick_url(
                    endpoints.pix_url.as_ref(),
                    config.environment,
                    PRODUCTION_PIX_URL,
                    SANDBOX_PIX_URL,
                ),
                headers,
                max_retries: config.http.max_retries,
            },
            timeout: config.http.timeout(),
            environment: config.environment,
            tls: config.tls.clone(),
        };

        Ok((
            Self {
                beneficiary_code: config.beneficiary_code.clone(),
            },
            connection,
        ))
    }
}

fn person_type(kind: PersonType) -> &'static str {
    match kind {
        PersonType::Individual => "PESSOA_FISICA",
        PersonType::Company => "PESSOA_JURIDICA",
    }
}

fn value_kind(percentage: bool) -> &'static str {
    if percentage {
        "PERCENTUAL"
    } else {
        "VALOR"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayerWire<'a> {
    tipo_pessoa: &'static str,
    documento: &'a str,
    nome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    endereco: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidade: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uf: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cep: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    telefone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

impl<'a> PayerWire<'a> {
    fn new(payer: &'a Payer) -> Self {
        Self {
            tipo_pessoa: person_type(payer.person_type),
            documento: &payer.tax_id,
            nome: &payer.name,
            endereco: payer.address.as_deref(),
            cidade: payer.city.as_deref(),
            uf: payer.state.as_deref(),
            cep: payer.postal_code.as_deref(),
            telefone: payer.phone.as_deref(),
            email: payer.email.as_deref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalBeneficiaryWire<'a> {
    tipo_pessoa: &'static str,
    documento: &'a str,
    nome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    logradouro: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidade: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uf: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cep: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    telefone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

impl<'a> FinalBeneficiaryWire<'a> {
    fn new(party: &'a Payer) -> Self {
        Self {
            tipo_pessoa: person_type(party.person_type),
            documento: &party.tax_id,
            nome: &party.name,
            logradouro: party.address.as_deref(),
            cidade: party.city.as_deref(),
            uf: party.state.as_deref(),
            cep: party.postal_code.as_deref(),
            telefone: party.phone.as_deref(),
            email: party.email.as_deref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoletoWire<'a> {
    tipo_cobranca: &'static str,
    codigo_beneficiario: &'a str,
    pagador: PayerWire<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beneficiario_final: Option<FinalBeneficiaryWire<'a>>,
    especie_documento: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    nosso_numero: Option<&'a str>,
    seu_numero: &'a str,
    data_vencimento: NaiveDate,
    #[serde(with = "amount")]
    valor: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    dias_protesto_auto: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validade_apos_vencimento: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo_desconto: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_desconto1: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_desconto1: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_desconto2: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_desconto2: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_desconto3: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_desconto3: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo_juros: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    juros: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multa: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mensagens: Option<&'a [String]>,
}

impl<'a> BoletoWire<'a> {
    fn new(beneficiary_code: &'a str, boleto: &'a NewBoleto) -> Result<Self> {
        if boleto.messages.len() > MAX_SICREDI_MESSAGES {
            return Err(Error::Validation(format!(
                "Sicredi accepts at most {} message lines",
                MAX_SICREDI_MESSAGES
            )));
        }

        let discount_kind = boleto.discounts.as_ref().map(|d| d.kind);
        let tiers = boleto.discount_tiers();
        let tier_value = |i: usize| -> Result<Option<Number>> {
            match (tiers.get(i), discount_kind) {
                (Some(tier), Some(DiscountKind::FixedAmount)) => amount_number(tier.amount).map(Some),
                (Some(tier), Some(DiscountKind::Percentage)) => rate_number(tier.amount).map(Some),
                _ => Ok(None),
            }
        };
        let tier_date = |i: usize| tiers.get(i).map(|t| t.until);

        let (tipo_juros, juros) = match boleto.interest.filter(ChargePolicy::is_active) {
            Some(policy) if policy.kind == ChargeKind::Percentage => {
                (Some(value_kind(true)), Some(rate_number(policy.value)?))
            }
            Some(policy) => (Some(value_kind(false)), Some(amount_number(policy.value)?)),
            None => (None, None),
        };

        let multa = match boleto.fine.filter(ChargePolicy::is_active) {
            Some(policy) if policy.kind == ChargeKind::Percentage => Some(rate_number(policy.value)?),
            Some(_) => {
                return Err(Error::Validation(
                    "Sicredi fines must be a percentage".into(),
                ))
            }
            None => None,
        };

        Ok(Self {
            tipo_cobranca: if boleto.hybrid_pix { "HIBRIDO" } else { "NORMAL" },
            codigo_beneficiario: beneficiary_code,
            pagador: PayerWire::new(&boleto.payer),
            beneficiario_final: boleto.final_beneficiary.as_ref().map(FinalBeneficiaryWire::new),
            especie_documento: boleto.species.sicredi_code(),
            nosso_numero: boleto.our_number.as_deref(),
            seu_numero: &boleto.their_number,
            data_vencimento: boleto.due_date,
            valor: boleto.amount,
            dias_protesto_auto: boleto.protest_days,
            validade_apos_vencimento: boleto.pix_validity_days,
            tipo_desconto: discount_kind.map(|k| value_kind(k == DiscountKind::Percentage)),
            valor_desconto1: tier_value(0)?,
            data_desconto1: tier_date(0),
            valor_desconto2: tier_value(1)?,
            data_desconto2: tier_date(1),
            valor_desconto3: tier_value(2)?,
            data_desconto3: tier_date(2),
            tipo_juros,
            juros,
            multa,
            mensagens: (!boleto.messages.is_empty()).then_some(boleto.messages.as_slice()),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedWire {
    #[serde(deserialize_with = "id_text::deserialize")]
    nosso_numero: String,
    linha_digitavel: String,
    codigo_barras: String,
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default, alias = "txId")]
    txid: Option<String>,
}

#[derive(Deserialize, Default)]
struct PayerReply {
    #[serde(default)]
    documento: Option<String>,
    #[serde(default)]
    nome: Option<String>,
}

#[derive(Deserialize)]
struct SettlementReply {
    #[serde(default, deserialize_with = "date_opt::deserialize")]
    data: Option<NaiveDate>,
    #[serde(default, deserialize_with = "amount_opt::deserialize")]
    valor: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordWire {
    #[serde(deserialize_with = "id_text::deserialize")]
    nosso_numero: String,
    #[serde(default)]
    seu_numero: Option<String>,
    #[serde(deserialize_with = "amount::deserialize")]
    valor_nominal: Decimal,
    #[serde(default, deserialize_with = "date_opt::deserialize")]
    data_emissao: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date_opt::deserialize")]
    data_vencimento: Option<NaiveDate>,
    #[serde(default)]
    situacao: Option<String>,
    #[serde(default)]
    linha_digitavel: Option<String>,
    #[serde(default)]
    codigo_barras: Option<String>,
    #[serde(default)]
    codigo_qr_code: Option<String>,
    #[serde(default, alias = "txid")]
    tx_id: Option<String>,
    #[serde(default)]
    pagador: Option<PayerReply>,
    #[serde(default)]
    dados_liquidacao: Option<SettlementReply>,
}

impl From<RecordWire> for Boleto {
    fn from(wire: RecordWire) -> Self {
        let payer = wire.pagador.unwrap_or_default();
        let (paid_on, paid_amount) = wire
            .dados_liquidacao
            .map_or((None, None), |s| (s.data, s.valor));
        Boleto {
            provider: ProviderKind::Sicredi,
            our_number: wire.nosso_numero,
            their_number: wire.seu_numero.filter(|s| !s.is_empty()),
            amount: wire.valor_nominal,
            issue_date: wire.data_emissao,
            due_date: wire.data_vencimento,
            status: BoletoStatus::parse(wire.situacao.as_deref().unwrap_or_default()),
            digit_line: wire.linha_digitavel.filter(|s| !s.is_empty()),
            barcode: wire.codigo_barras.filter(|s| !s.is_empty()),
            pix_payload: wire.codigo_qr_code.filter(|s| !s.is_empty()),
            txid: wire.tx_id.filter(|s| !s.is_empty()),
            payer_name: payer.nome,
            payer_tax_id: payer.documento,
            paid_on,
            paid_amount,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettledWire {
    #[serde(deserialize_with = "id_text::deserialize")]
    nosso_numero: String,
    #[serde(default)]
    seu_numero: Option<String>,
    #[serde(default, deserialize_with = "date_opt::deserialize")]
    data_pagamento: Option<NaiveDate>,
    #[serde(deserialize_with = "amount::deserialize")]
    valor: Decimal,
    #[serde(default, deserialize_with = "amount_opt::deserialize")]
    valor_liquidado: Option<Decimal>,
}

impl SettledWire {
    fn into_boleto(self, day: NaiveDate) -> Boleto {
        Boleto {
            provider: ProviderKind::Sicredi,
            our_number: self.nosso_numero,
            their_number: self.seu_numero.filter(|s| !s.is_empty()),
            amount: self.valor,
            issue_date: None,
            due_date: None,
            status: BoletoStatus::Paid,
            digit_line: None,
            barcode: None,
            pix_payload: None,
            txid: None,
            payer_name: None,
            payer_tax_id: None,
            paid_on: self.data_pagamento.or(Some(day)),
            paid_amount: self.valor_liquidado,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettledPage {
    #[serde(default)]
    items: Vec<SettledWire>,
    #[serde(default)]
    has_next: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandReply {
    #[serde(default, deserialize_with = "id_text::deserialize_opt")]
    transaction_id: Option<String>,
    #[serde(default)]
    status_comando: Option<String>,
    #[serde(default)]
    data_hora_registro: Option<String>,
}

/// `dd/MM/yyyy`, the format of the settled-by-day listing
fn listing_day(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}

impl SicrediDialect {
    async fn settled_on(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        day: NaiveDate,
    ) -> Result<Vec<Boleto>> {
        let mut boletos = Vec::new();
        for page in 0..MAX_PAGES_PER_DAY {
            let mut endpoint = Endpoint::get("list_boletos", Base::Api, "/boletos/liquidados/dia")
                .query("codigoBeneficiario", self.beneficiary_code.as_str())
                .query("dia", listing_day(day));
            if page > 0 {
                endpoint = endpoint.query("pagina", page.to_string());
            }

            let response = exec.execute(ctx, endpoint).await?;
            if response.is_empty() {
                break;
            }
            let page: SettledPage = response.json(ProviderKind::Sicredi.name())?;
            boletos.extend(page.items.into_iter().map(|item| item.into_boleto(day)));
            if !page.has_next {
                return Ok(boletos);
            }
        }
        if !boletos.is_empty() {
            warn!(
                "Sicredi settled listing for {} stopped after {} pages",
                day, MAX_PAGES_PER_DAY
            );
        }
        Ok(boletos)
    }
}

#[async_trait]
impl Dialect for SicrediDialect {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sicredi
    }

    async fn create_boleto(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        boleto: &NewBoleto,
    ) -> Result<BoletoReceipt> {
        let body = BoletoWire::new(&self.beneficiary_code, boleto)?;
        let endpoint = Endpoint::json("create_boleto", Method::POST, Base::Api, "/boletos", &body)?
            .success(&[200, 201, 202]);

        let response = exec.execute(ctx, endpoint).await?;
        let created: CreatedWire = response.json(ProviderKind::Sicredi.name())?;
        info!("Sicredi boleto {} registered", created.nosso_numero);

        Ok(BoletoReceipt {
            our_number: created.nosso_numero,
            their_number: Some(boleto.their_number.clone()),
            digit_line: created.linha_digitavel,
            barcode: created.codigo_barras,
            pix_payload: created.qr_code.filter(|s| !s.is_empty()),
            txid: created.txid.filter(|s| !s.is_empty()),
        })
    }

    async fn query_boleto(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        our_number: &str,
    ) -> Result<Boleto> {
        check_path_id("our number", our_number)?;
        let endpoint = Endpoint::get("query_boleto", Base::Api, "/boletos")
            .query("codigoBeneficiario", self.beneficiary_code.as_str())
            .query("nossoNumero", our_number);

        let response = exec.execute(ctx, endpoint).await?;
        if response.is_empty() {
            return Err(Error::NotFound {
                provider: ProviderKind::Sicredi.name().to_string(),
                resource: format!("boleto {}", our_number),
            });
        }
        let record: RecordWire = response.json(ProviderKind::Sicredi.name())?;
        Ok(record.into())
    }

    async fn list_boletos(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        query: &ListQuery,
    ) -> Result<Vec<Boleto>> {
        let period = query.period.ok_or_else(|| {
            Error::Validation("Sicredi listings require a date range".into())
        })?;
        if period.days() > MAX_LISTING_DAYS {
            return Err(Error::Validation(format!(
                "Sicredi listings cover at most {} days, got {}",
                MAX_LISTING_DAYS,
                period.days()
            )));
        }
        match &query.status {
            None | Some(BoletoStatus::Paid) => {}
            Some(other) => {
                return Err(Error::Validation(format!(
                    "Sicredi only lists settled boletos, not {:?}",
                    other
                )))
            }
        }

        let mut boletos = Vec::new();
        for day in period.iter_days() {
            boletos.extend(self.settled_on(exec, ctx, day).await?);
        }
        debug!("Sicredi listed {} settled boletos", boletos.len());
        Ok(boletos)
    }

    fn instruction_routes(&self) -> &'static [InstructionRoute] {
        &ROUTES
    }

    fn instruction_endpoint(
        &self,
        route: &InstructionRoute,
        command: &InstructionCommand,
    ) -> Result<Endpoint> {
        let body = route.render_body(command, Map::new())?;
        Ok(Endpoint::json(
            command.kind().name(),
            route.method.clone(),
            Base::Api,
            route.path(command),
            &body,
        )?
        .success(route.success))
    }

    fn decode_instruction(&self, response: &Response) -> Result<InstructionReceipt> {
        if response.is_empty() {
            return Ok(InstructionReceipt::default());
        }
        let reply: CommandReply = response.json(ProviderKind::Sicredi.name())?;
        Ok(InstructionReceipt {
            transaction_id: reply.transaction_id,
            status: reply.status_comando,
            registered_at: reply.data_hora_registro,
        })
    }

    async fn print_boleto_pdf(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        our_number: &str,
    ) -> Result<Bytes> {
        let boleto = self.query_boleto(exec, ctx, our_number).await?;
        let digit_line = boleto.digit_line.ok_or_else(|| Error::NotFound {
            provider: ProviderKind::Sicredi.name().to_string(),
            resource: format!("digit line of boleto {}", our_number),
        })?;

        let endpoint = Endpoint::get("print_boleto_pdf", Base::Api, "/boletos/pdf")
            .query("linhaDigitavel", digit_line)
            .success(&[200, 201])
            .pdf();
        let response = exec.execute(ctx, endpoint).await?;
        if !response.is_pdf() {
            return Err(Error::Serialization(format!(
                "Sicredi PDF endpoint returned {}",
                response.content_type.as_deref().unwrap_or("an unlabelled body")
            )));
        }
        Ok(response.body)
    }
}

//! Sicoob adapter (Cobrança Bancária v2 + PIX)
//!
//! Client-credentials grant, mutual TLS in production and an `x-sicoob-clientid`
//! header on every business call.

use crate::adapter::BankAdapter;
use crate::clock::{Clock, SystemClock};
use crate::config::SicoobConfig;
use crate::context::RequestContext;
use crate::dialect::{insert_header, pick_url, Connection, Dialect};
use crate::http::{Base, Endpoint, ExecutorSettings, RequestExecutor, Response};
use crate::instruction::{check_path_id, InstructionCommand, InstructionField, InstructionKind, InstructionRoute};
use crate::oauth::Grant;
use crate::types::*;
use crate::wire::{amount, amount_number, amount_opt, date_opt, id_text, rate_number};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use chrono::{Duration, NaiveDate};
use reqwest::header::HeaderMap;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Production token endpoint
pub const PRODUCTION_AUTH_URL: &str =
    "https://auth.sicoob.com.br/auth/realms/cooperado/protocol/openid-connect/token";
/// Sandbox token endpoint
pub const SANDBOX_AUTH_URL: &str = "https://sandbox.sicoob.com.br/sicoob/sandbox/oauth/token";
/// Production API base
pub const PRODUCTION_API_URL: &str = "https://api.sicoob.com.br";
/// Sandbox API base
pub const SANDBOX_API_URL: &str = "https://sandbox.sicoob.com.br/sicoob/sandbox";

/// Scopes requested on every authentication
pub const SCOPE: &str = "cobranca_boletos_consultar cobranca_boletos_incluir cobranca_boletos_alterar cobranca_pagadores_consultar cob.read cob.write pix.read pix.write";

const BOLETO_ROOT: &str = "/cobranca-bancaria/v2";
const PIX_PATH: &str = "/pix/api/v2";

const SICOOB_SUCCESS: &[u16] = &[200, 204];

static ROUTES: [InstructionRoute; 6] = [
    InstructionRoute {
        kind: InstructionKind::WriteOff,
        segment: "baixar",
        method: Method::PATCH,
        success: SICOOB_SUCCESS,
        keys: &[],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeDueDate,
        segment: "prorrogacoes",
        method: Method::PATCH,
        success: SICOOB_SUCCESS,
        keys: &[(InstructionField::DueDate, "dataVencimento")],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeDiscount,
        segment: "descontos",
        method: Method::PATCH,
        success: SICOOB_SUCCESS,
        keys: &[
            (InstructionField::Discount1, "valorPrimeiroDesconto"),
            (InstructionField::Discount2, "valorSegundoDesconto"),
            (InstructionField::Discount3, "valorTerceiroDesconto"),
        ],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeDiscountDates,
        segment: "descontos",
        method: Method::PATCH,
        success: SICOOB_SUCCESS,
        keys: &[
            (InstructionField::DiscountDate1, "dataPrimeiroDesconto"),
            (InstructionField::DiscountDate2, "dataSegundoDesconto"),
            (InstructionField::DiscountDate3, "dataTerceiroDesconto"),
        ],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeInterest,
        segment: "encargos/juros-mora",
        method: Method::PATCH,
        success: SICOOB_SUCCESS,
        keys: &[(InstructionField::InterestValue, "valorJurosMora")],
    },
    InstructionRoute {
        kind: InstructionKind::ChangeTheirNumber,
        segment: "seu-numero",
        method: Method::PATCH,
        success: SICOOB_SUCCESS,
        keys: &[(InstructionField::TheirNumber, "seuNumero")],
    },
];

/// Sicoob adapter
pub type SicoobAdapter = BankAdapter<SicoobDialect>;

impl BankAdapter<SicoobDialect> {
    /// Create an adapter from its configuration
    pub fn new(config: SicoobConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an adapter driven by `clock`
    pub fn with_clock(config: SicoobConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let (dialect, connection) = SicoobDialect::connection(&config)?;
        BankAdapter::from_connection(dialect, connection, clock)
    }
}

/// Sicoob paths and payloads
#[derive(Debug, Clone)]
pub struct SicoobDialect {
    contract_number: String,
}

impl SicoobDialect {
    /// Dialect plus connection parts for `config`
    pub fn connection(config: &SicoobConfig) -> Result<(Self, Connection)> {
        let endpoints = &config.endpoints;
        let api_url = pick_url(
            endpoints.api_url.as_ref(),
            config.environment,
            PRODUCTION_API_URL,
            SANDBOX_API_URL,
        );
        let pix_url = match &endpoints.pix_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}{}", api_url, PIX_PATH),
        };

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "x-sicoob-clientid", &config.client_id)?;
        if let Some(key) = &config.api_key {
            insert_header(&mut headers, "x-api-key", key)?;
        }

        let connection = Connection {
            token_url: pick_url(
                endpoints.auth_url.as_ref(),
                config.environment,
                PRODUCTION_AUTH_URL,
                SANDBOX_AUTH_URL,
            ),
            grant: Grant::ClientCredentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                scope: SCOPE.to_string(),
            },
            token_headers: HeaderMap::new(),
            executor: ExecutorSettings {
                provider: ProviderKind::Sicoob.name().to_string(),
                api_url,
                pix_url,
                headers,
                max_retries: config.http.max_retries,
            },
            timeout: config.http.timeout(),
            environment: config.environment,
            tls: config.tls.clone(),
        };

        Ok((
            Self {
                contract_number: config.contract_number.clone(),
            },
            connection,
        ))
    }

    fn boletos_path(&self) -> String {
        format!("{}/boletos", BOLETO_ROOT)
    }
}

fn check_our_number(our_number: &str) -> Result<()> {
    if our_number.is_empty() || !our_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Validation(format!(
            "Sicoob our number must be numeric: {:?}",
            our_number
        )));
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayerWire<'a> {
    tipo_pessoa: &'static str,
    cpf_cnpj: &'a str,
    nome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    endereco: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bairro: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidade: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uf: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cep: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    telefone: Option<&'a str>,
}

impl<'a> PayerWire<'a> {
    fn new(payer: &'a Payer) -> Self {
        Self {
            tipo_pessoa: match payer.person_type {
                PersonType::Individual => "FISICA",
                PersonType::Company => "JURIDICA",
            },
            cpf_cnpj: &payer.tax_id,
            nome: &payer.name,
            endereco: payer.address.as_deref(),
            bairro: payer.neighborhood.as_deref(),
            cidade: payer.city.as_deref(),
            uf: payer.state.as_deref(),
            cep: payer.postal_code.as_deref(),
            email: payer.email.as_deref(),
            telefone: payer.phone.as_deref(),
        }
    }
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct ChargeWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor: Option<Number>,
}

fn charge_wire(policy: Option<&ChargePolicy>, due_date: NaiveDate) -> Result<ChargeWire> {
    let Some(policy) = policy else {
        return Ok(ChargeWire::default());
    };
    let (tipo, valor) = match policy.kind {
        _ if !policy.is_active() => {
            return Ok(ChargeWire {
                tipo: Some(0),
                ..ChargeWire::default()
            })
        }
        ChargeKind::FixedAmount => (1, amount_number(policy.value)?),
        ChargeKind::Percentage => (2, rate_number(policy.value)?),
        ChargeKind::Exempt => (0, Number::from(0)),
    };
    Ok(ChargeWire {
        tipo: Some(tipo),
        data: Some(policy.from.unwrap_or(due_date + Duration::days(1))),
        valor: Some(valor),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoletoWire<'a> {
    numero_contrato: &'a str,
    modalidade_partilha: u8,
    tipo_cobranca: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    nosso_numero: Option<Number>,
    seu_numero: &'a str,
    #[serde(with = "amount")]
    valor: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_emissao: Option<NaiveDate>,
    data_vencimento: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_limite_pagamento: Option<NaiveDate>,
    especie_documento: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo_desconto: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_primeiro_desconto: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_primeiro_desconto: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_segundo_desconto: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_segundo_desconto: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_terceiro_desconto: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_terceiro_desconto: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo_multa: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_multa: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_multa: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo_juros_mora: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_juros_mora: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor_juros_mora: Option<Number>,
    pagador: PayerWire<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mensagem1: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mensagem2: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mensagem3: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mensagem4: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mensagem5: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    gerar_pix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    numero_dias_protesto: Option<u32>,
}

impl<'a> BoletoWire<'a> {
    fn new(contract_number: &'a str, boleto: &'a NewBoleto) -> Result<Self> {
        let species = boleto.species.sicoob_code().ok_or_else(|| {
            Error::Validation(format!(
                "document species {:?} is not accepted by Sicoob",
                boleto.species
            ))
        })?;
        let nosso_numero = match &boleto.our_number {
            Some(n) => {
                check_our_number(n)?;
                Some(Number::from_str(n).map_err(|e| Error::Serialization(e.to_string()))?)
            }
            None => None,
        };

        let tiers = boleto.discount_tiers();
        let tier_value = |i: usize| -> Result<Option<Number>> {
            match (tiers.get(i), boleto.discounts.as_ref().map(|d| d.kind)) {
                (Some(tier), Some(DiscountKind::FixedAmount)) => amount_number(tier.amount).map(Some),
                (Some(tier), Some(DiscountKind::Percentage)) => rate_number(tier.amount).map(Some),
                _ => Ok(None),
            }
        };
        let tier_date = |i: usize| tiers.get(i).map(|t| t.until);

        let fine = charge_wire(boleto.fine.as_ref(), boleto.due_date)?;
        let interest = charge_wire(boleto.interest.as_ref(), boleto.due_date)?;
        let message = |i: usize| boleto.messages.get(i).map(String::as_str);

        Ok(Self {
            numero_contrato: contract_number,
            // sem partilha, cobranca simples
            modalidade_partilha: 1,
            tipo_cobranca: 1,
            nosso_numero,
            seu_numero: &boleto.their_number,
            valor: boleto.amount,
            data_emissao: boleto.issue_date,
            data_vencimento: boleto.due_date,
            data_limite_pagamento: boleto
                .pix_validity_days
                .map(|days| boleto.due_date + Duration::days(i64::from(days))),
            especie_documento: species,
            tipo_desconto: boleto.discounts.as_ref().map(|d| match d.kind {
                DiscountKind::FixedAmount => 1,
                DiscountKind::Percentage => 2,
            }),
            data_primeiro_desconto: tier_date(0),
            valor_primeiro_desconto: tier_value(0)?,
            data_segundo_desconto: tier_date(1),
            valor_segundo_desconto: tier_value(1)?,
            data_terceiro_desconto: tier_date(2),
            valor_terceiro_desconto: tier_value(2)?,
            tipo_multa: fine.tipo,
            data_multa: fine.data,
            valor_multa: fine.valor,
            tipo_juros_mora: interest.tipo,
            data_juros_mora: interest.data,
            valor_juros_mora: interest.valor,
            pagador: PayerWire::new(&boleto.payer),
            mensagem1: message(0),
            mensagem2: message(1),
            mensagem3: message(2),
            mensagem4: message(3),
            mensagem5: message(4),
            gerar_pix: boleto.hybrid_pix,
            numero_dias_protesto: boleto.protest_days,
        })
    }
}

#[derive(Deserialize)]
struct Wrapped<T> {
    resultado: T,
}

/// Decode `{"resultado": T}`, falling back to a bare `T`
fn unwrap_result<T: DeserializeOwned>(response: &Response) -> Result<T> {
    if let Ok(wrapped) = serde_json::from_slice::<Wrapped<T>>(&response.body) {
        return Ok(wrapped.resultado);
    }
    response.json(ProviderKind::Sicoob.name())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedWire {
    #[serde(deserialize_with = "id_text::deserialize")]
    nosso_numero: String,
    #[serde(default)]
    seu_numero: Option<String>,
    linha_digitavel: String,
    codigo_barras: String,
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default, alias = "txid")]
    tx_id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PayerReply {
    #[serde(default, alias = "numeroCpfCnpj")]
    cpf_cnpj: Option<String>,
    #[serde(default)]
    nome: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordWire {
    #[serde(deserialize_with = "id_text::deserialize")]
    nosso_numero: String,
    #[serde(default)]
    seu_numero: Option<String>,
    #[serde(deserialize_with = "amount::deserialize")]
    valor: Decimal,
    #[serde(default, deserialize_with = "date_opt::deserialize")]
    data_emissao: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date_opt::deserialize")]
    data_vencimento: Option<NaiveDate>,
    #[serde(default, alias = "situacaoBoleto")]
    situacao: Option<String>,
    #[serde(default)]
    linha_digitavel: Option<String>,
    #[serde(default)]
    codigo_barras: Option<String>,
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default, alias = "txid")]
    tx_id: Option<String>,
    #[serde(default)]
    pagador: Option<PayerReply>,
    #[serde(default, deserialize_with = "date_opt::deserialize")]
    data_liquidacao: Option<NaiveDate>,
    #[serde(default, deserialize_with = "amount_opt::deserialize")]
    valor_liquidado: Option<Decimal>,
}

impl From<RecordWire> for Boleto {
    fn from(wire: RecordWire) -> Self {
        let payer = wire.pagador.unwrap_or_default();
        Boleto {
            provider: ProviderKind::Sicoob,
            our_number: wire.nosso_numero,
            their_number: wire.seu_numero.filter(|s| !s.is_empty()),
            amount: wire.valor,
            issue_date: wire.data_emissao,
            due_date: wire.data_vencimento,
            status: BoletoStatus::parse(wire.situacao.as_deref().unwrap_or_default()),
            digit_line: wire.linha_digitavel,
            barcode: wire.codigo_barras,
            pix_payload: wire.qr_code,
            txid: wire.tx_id,
            payer_name: payer.nome,
            payer_tax_id: payer.cpf_cnpj,
            paid_on: wire.data_liquidacao,
            paid_amount: wire.valor_liquidado,
        }
    }
}

fn decode_records(response: &Response) -> Result<Vec<RecordWire>> {
    if response.is_empty() {
        return Ok(Vec::new());
    }
    if let Ok(list) = serde_json::from_slice::<Wrapped<Vec<RecordWire>>>(&response.body) {
        return Ok(list.resultado);
    }
    unwrap_result::<RecordWire>(response).map(|one| vec![one])
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PdfWire {
    pdf_boleto: String,
}

#[async_trait]
impl Dialect for SicoobDialect {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sicoob
    }

    async fn create_boleto(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        boleto: &NewBoleto,
    ) -> Result<BoletoReceipt> {
        let body = BoletoWire::new(&self.contract_number, boleto)?;
        let endpoint = Endpoint::json("create_boleto", Method::POST, Base::Api, self.boletos_path(), &body)?
            .success(&[200, 201]);

        let response = exec.execute(ctx, endpoint).await?;
        let created: CreatedWire = unwrap_result(&response)?;
        info!("Sicoob boleto {} registered", created.nosso_numero);

        Ok(BoletoReceipt {
            our_number: created.nosso_numero,
            their_number: created.seu_numero.or_else(|| Some(boleto.their_number.clone())),
            digit_line: created.linha_digitavel,
            barcode: created.codigo_barras,
            pix_payload: created.qr_code,
            txid: created.tx_id,
        })
    }

    async fn query_boleto(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        our_number: &str,
    ) -> Result<Boleto> {
        check_our_number(our_number)?;
        let endpoint = Endpoint::get("query_boleto", Base::Api, self.boletos_path())
            .query("numeroContrato", self.contract_number.as_str())
            .query("nossoNumero", our_number);

        let response = exec.execute(ctx, endpoint).await?;
        decode_records(&response)?
            .into_iter()
            .next()
            .map(Boleto::from)
            .ok_or_else(|| Error::NotFound {
                provider: ProviderKind::Sicoob.name().to_string(),
                resource: format!("boleto {}", our_number),
            })
    }

    async fn list_boletos(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        query: &ListQuery,
    ) -> Result<Vec<Boleto>> {
        let period = query.period.ok_or_else(|| {
            Error::Validation("Sicoob listings require a date range".into())
        })?;
        let mut endpoint = Endpoint::get("list_boletos", Base::Api, self.boletos_path())
            .query("numeroContrato", self.contract_number.as_str())
            .query("dataInicio", period.from.format("%Y-%m-%d").to_string())
            .query("dataFim", period.to.format("%Y-%m-%d").to_string());
        if let Some(status) = &query.status {
            endpoint = endpoint.query("situacao", status.wire_filter());
        }

        let response = exec.execute(ctx, endpoint).await?;
        let boletos: Vec<Boleto> = decode_records(&response)?
            .into_iter()
            .map(Boleto::from)
            .filter(|b| query.matches(b))
            .collect();
        debug!("Sicoob listed {} boletos", boletos.len());
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
        check_our_number(command.our_number())?;
        let mut base = Map::new();
        base.insert(
            "numeroContrato".to_string(),
            Value::String(self.contract_number.clone()),
        );
        let body = route.render_body(command, base)?;
        Ok(Endpoint::json(
            command.kind().name(),
            route.method.clone(),
            Base::Api,
            format!("{}{}", BOLETO_ROOT, route.path(command)),
            &body,
        )?
        .success(route.success))
    }

    fn decode_instruction(&self, _response: &Response) -> Result<InstructionReceipt> {
        Ok(InstructionReceipt::default())
    }

    async fn print_boleto_pdf(
        &self,
        exec: &RequestExecutor,
        ctx: &RequestContext,
        our_number: &str,
    ) -> Result<Bytes> {
        check_our_number(our_number)?;
        check_path_id("our number", our_number)?;
        let endpoint = Endpoint::get(
            "print_boleto_pdf",
            Base::Api,
            format!("{}/{}/segunda-via", self.boletos_path(), our_number),
        )
        .query("numeroContrato", self.contract_number.as_str())
        .query("gerarPdf", "true")
        .pdf();

        let response = exec.execute(ctx, endpoint).await?;
        if response.is_pdf() {
            return Ok(response.body);
        }

        let pdf: PdfWire = unwrap_result(&response)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(pdf.pdf_boleto.trim())
            .map_err(|e| Error::Serialization(format!("Sicoob PDF payload: {}", e)))?;
        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn boleto() -> NewBoleto {
        NewBoleto::new(
            "NF-001234",
            dec!(150.00),
            date(2026, 2, 28),
            DocumentSpecies::CommercialInvoice,
            Payer::new("12345678909", "JOAO DA SILVA"),
        )
    }

    fn encode(boleto: &NewBoleto) -> String {
        serde_json::to_string(&BoletoWire::new("25546454", boleto).unwrap()).unwrap()
    }

    #[test]
    fn test_plain_boleto_omits_optional_fields() {
        let json = encode(&boleto());
        assert!(json.contains(r#""valor":150.00"#));
        assert!(json.contains(r#""dataVencimento":"2026-02-28""#));
        assert!(json.contains(r#""especieDocumento":"DM""#));
        assert!(json.contains(r#""tipoPessoa":"FISICA""#));
        assert!(json.contains(r#""modalidadePartilha":1,"tipoCobranca":1"#));
        assert!(!json.contains(r#""modalidade":"#));
        for absent in ["Desconto", "Multa", "JurosMora", "gerarPix", "nossoNumero", "mensagem1"] {
            assert!(!json.contains(absent), "{} should be omitted: {}", absent, json);
        }
    }

    #[test]
    fn test_charges_and_discounts() {
        let boleto = boleto()
            .with_discounts(
                DiscountKind::FixedAmount,
                vec![
                    DiscountTier {
                        amount: dec!(10),
                        until: date(2026, 2, 10),
                    },
                    DiscountTier {
                        amount: dec!(5),
                        until: date(2026, 2, 20),
                    },
                ],
            )
            .with_charges(Some(ChargePolicy::percentage(dec!(1))), Some(ChargePolicy::fixed(dec!(3))));
        let json = encode(&boleto);
        assert!(json.contains(r#""tipoDesconto":1"#));
        assert!(json.contains(r#""valorPrimeiroDesconto":10.00"#));
        assert!(json.contains(r#""dataSegundoDesconto":"2026-02-20""#));
        assert!(!json.contains("Terceiro"));
        assert!(json.contains(r#""tipoJurosMora":2"#));
        assert!(json.contains(r#""dataJurosMora":"2026-03-01""#));
        assert!(json.contains(r#""tipoMulta":1,"dataMulta":"2026-03-01","valorMulta":3.00"#));
    }

    #[test]
    fn test_unsupported_species_rejected() {
        let mut boleto = boleto();
        boleto.species = DocumentSpecies::CreditCard;
        assert!(matches!(
            BoletoWire::new("1", &boleto),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_record_decoding() {
        let response = Response {
            status: 200,
            content_type: Some("application/json".into()),
            body: Bytes::from_static(
                br#"{"resultado":[{"nossoNumero":123,"seuNumero":"NF-1","valor":150.0,
                    "dataVencimento":"2026-02-28","situacaoBoleto":"Em Aberto",
                    "pagador":{"numeroCpfCnpj":"12345678909","nome":"JOAO"}}]}"#,
            ),
        };
        let records = decode_records(&response).unwrap();
        let boleto = Boleto::from(records.into_iter().next().unwrap());
        assert_eq!(boleto.our_number, "123");
        assert_eq!(boleto.amount, dec!(150.00));
        assert_eq!(boleto.status, BoletoStatus::Open);
        assert_eq!(boleto.payer_tax_id.as_deref(), Some("12345678909"));
    }
}

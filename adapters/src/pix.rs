//! PIX immediate charges ("cobrança imediata", BACEN API v2)
//!
//! Both providers expose the standard BACEN surface under their PIX base URL:
//! `PUT /cob/{txid}` (or `POST /cob` to let the bank pick the txid),
//! `GET /cob/{txid}` and `PUT /webhook/{chave}`.

use crate::context::RequestContext;
use crate::http::{Base, Endpoint, RequestExecutor};
use crate::types::check_amount;
use crate::wire::amount_str;
use crate::{Error, Result};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Default charge lifetime (seconds)
pub const DEFAULT_EXPIRATION_SECONDS: u32 = 3600;

const MAX_PAYER_REQUEST_LEN: usize = 140;
const MAX_KEY_LEN: usize = 77;

/// Random txid (32 alphanumerics)
pub fn generate_txid() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A txid must be 26 to 35 ASCII alphanumerics
pub fn check_txid(txid: &str) -> Result<()> {
    if !(26..=35).contains(&txid.len()) || !txid.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::Validation(format!(
            "txid must be 26 to 35 alphanumeric characters: {:?}",
            txid
        )));
    }
    Ok(())
}

/// Charge debtor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixDebtor {
    /// CPF (11 digits) or CNPJ (14 digits)
    pub tax_id: String,
    /// Name
    pub name: String,
}

/// Immediate charge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixChargeRequest {
    /// Caller-chosen txid; the bank assigns one when absent
    pub txid: Option<String>,
    /// Lifetime in seconds
    pub expiration_seconds: u32,
    /// Debtor
    pub debtor: Option<PixDebtor>,
    /// Value
    pub amount: Decimal,
    /// Receiving PIX key
    pub key: String,
    /// Message shown to the payer
    pub payer_request: Option<String>,
    /// Extra name/value pairs
    pub additional_info: Vec<(String, String)>,
}

impl PixChargeRequest {
    /// Charge for `amount` to `key` with the default lifetime
    pub fn new(key: impl Into<String>, amount: Decimal) -> Self {
        Self {
            txid: None,
            expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            debtor: None,
            amount,
            key: key.into(),
            payer_request: None,
            additional_info: Vec::new(),
        }
    }

    /// Check the request before it is encoded
    pub fn check(&self) -> Result<()> {
        check_amount("pix value", self.amount)?;
        check_key(&self.key)?;
        if let Some(txid) = &self.txid {
            check_txid(txid)?;
        }
        if self.expiration_seconds == 0 {
            return Err(Error::Validation("expiration must be positive".into()));
        }
        if let Some(text) = &self.payer_request {
            if text.chars().count() > MAX_PAYER_REQUEST_LEN {
                return Err(Error::Validation(format!(
                    "payer request longer than {} characters",
                    MAX_PAYER_REQUEST_LEN
                )));
            }
        }
        if let Some(debtor) = &self.debtor {
            if debtor.name.trim().is_empty() {
                return Err(Error::Validation("debtor name is required".into()));
            }
            debtor_ids(&debtor.tax_id)?;
        }
        Ok(())
    }
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"@.+_-".contains(&b));
    if !valid {
        return Err(Error::Validation(format!("invalid PIX key: {:?}", key)));
    }
    Ok(())
}

fn debtor_ids(tax_id: &str) -> Result<(Option<String>, Option<String>)> {
    if !tax_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Validation("debtor tax id must be digits only".into()));
    }
    match tax_id.len() {
        11 => Ok((Some(tax_id.to_string()), None)),
        14 => Ok((None, Some(tax_id.to_string()))),
        _ => Err(Error::Validation(
            "debtor tax id must be a CPF (11) or CNPJ (14)".into(),
        )),
    }
}

/// Charge as reported by the bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixCharge {
    /// Transaction id
    pub txid: String,
    /// Payload location URL
    pub location: Option<String>,
    /// Charge status (`ATIVA`, `CONCLUIDA`, ...)
    pub status: Option<String>,
    /// Copy-paste payload (EMV)
    pub copy_paste: Option<String>,
    /// Value
    pub amount: Option<Decimal>,
    /// Creation timestamp as sent by the bank
    pub created_at: Option<String>,
    /// Lifetime in seconds
    pub expiration_seconds: Option<u32>,
    /// Revision
    pub revision: Option<u32>,
}

#[derive(Serialize)]
struct CobCalendar {
    expiracao: u32,
}

#[derive(Serialize)]
struct CobDebtor {
    #[serde(skip_serializing_if = "Option::is_none")]
    cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cnpj: Option<String>,
    nome: String,
}

#[derive(Serialize)]
struct CobValue {
    #[serde(with = "amount_str")]
    original: Decimal,
}

#[derive(Serialize)]
struct CobInfo<'a> {
    nome: &'a str,
    valor: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CobRequest<'a> {
    calendario: CobCalendar,
    #[serde(skip_serializing_if = "Option::is_none")]
    devedor: Option<CobDebtor>,
    valor: CobValue,
    chave: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    solicitacao_pagador: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    info_adicionais: Vec<CobInfo<'a>>,
}

impl<'a> CobRequest<'a> {
    fn from_request(request: &'a PixChargeRequest) -> Result<Self> {
        let devedor = match &request.debtor {
            Some(debtor) => {
                let (cpf, cnpj) = debtor_ids(&debtor.tax_id)?;
                Some(CobDebtor {
                    cpf,
                    cnpj,
                    nome: debtor.name.clone(),
                })
            }
            None => None,
        };
        Ok(Self {
            calendario: CobCalendar {
                expiracao: request.expiration_seconds,
            },
            devedor,
            valor: CobValue {
                original: request.amount,
            },
            chave: &request.key,
            solicitacao_pagador: request.payer_request.as_deref(),
            info_adicionais: request
                .additional_info
                .iter()
                .map(|(nome, valor)| CobInfo { nome, valor })
                .collect(),
        })
    }
}

#[derive(Deserialize, Default)]
struct CobCalendarReply {
    #[serde(default)]
    criacao: Option<String>,
    #[serde(default)]
    expiracao: Option<u32>,
}

#[derive(Deserialize)]
struct CobValueReply {
    #[serde(with = "amount_str")]
    original: Decimal,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CobReply {
    txid: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    pix_copia_e_cola: Option<String>,
    #[serde(default)]
    valor: Option<CobValueReply>,
    #[serde(default)]
    calendario: Option<CobCalendarReply>,
    #[serde(default)]
    revisao: Option<u32>,
}

impl From<CobReply> for PixCharge {
    fn from(reply: CobReply) -> Self {
        let calendario = reply.calendario.unwrap_or_default();
        Self {
            txid: reply.txid,
            location: reply.location,
            status: reply.status,
            copy_paste: reply.pix_copia_e_cola,
            amount: reply.valor.map(|v| v.original),
            created_at: calendario.criacao,
            expiration_seconds: calendario.expiracao,
            revision: reply.revisao,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookBody<'a> {
    webhook_url: &'a str,
}

/// Create an immediate charge
pub async fn create_charge(
    exec: &RequestExecutor,
    ctx: &RequestContext,
    request: &PixChargeRequest,
) -> Result<PixCharge> {
    request.check()?;
    let body = CobRequest::from_request(request)?;
    let (method, path) = match &request.txid {
        Some(txid) => (Method::PUT, format!("/cob/{}", txid)),
        None => (Method::POST, "/cob".to_string()),
    };
    let endpoint =
        Endpoint::json("create_pix_charge", method, Base::Pix, path, &body)?.success(&[200, 201]);

    let response = exec.execute(ctx, endpoint).await?;
    let charge: PixCharge = response.json::<CobReply>(exec.provider())?.into();
    info!(
        "{} PIX charge {} created ({})",
        exec.provider(),
        charge.txid,
        charge.status.as_deref().unwrap_or("no status")
    );
    Ok(charge)
}

/// Look up a charge by txid
pub async fn query_charge(exec: &RequestExecutor, ctx: &RequestContext, txid: &str) -> Result<PixCharge> {
    check_txid(txid)?;
    let endpoint = Endpoint::get("query_pix_charge", Base::Pix, format!("/cob/{}", txid));
    let response = exec.execute(ctx, endpoint).await?;
    Ok(response.json::<CobReply>(exec.provider())?.into())
}

/// Register the notification URL for a PIX key
pub async fn register_webhook(
    exec: &RequestExecutor,
    ctx: &RequestContext,
    key: &str,
    webhook_url: &str,
) -> Result<()> {
    check_key(key)?;
    let url = reqwest::Url::parse(webhook_url)
        .map_err(|e| Error::Validation(format!("invalid webhook URL: {}", e)))?;
    if url.scheme() != "https" {
        return Err(Error::Validation("webhook URL must use https".into()));
    }

    let endpoint = Endpoint::json(
        "register_pix_webhook",
        Method::PUT,
        Base::Pix,
        format!("/webhook/{}", key),
        &WebhookBody { webhook_url },
    )?
    .success(&[200, 201, 204]);

    exec.execute(ctx, endpoint).await?;
    info!("{} webhook registered for PIX key {}", exec.provider(), key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_generated_txid_is_valid() {
        let txid = generate_txid();
        assert_eq!(txid.len(), 32);
        assert!(check_txid(&txid).is_ok());
        assert!(check_txid("short").is_err());
        assert!(check_txid("abc-def-ghi-jkl-mno-pqr-stu-vw").is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let mut request = PixChargeRequest::new("financeiro@empresa.com.br", dec!(10));
        request.debtor = Some(PixDebtor {
            tax_id: "12345678000199".into(),
            name: "EMPRESA LTDA".into(),
        });
        request.payer_request = Some("Pedido 42".into());

        let body = serde_json::to_string(&CobRequest::from_request(&request).unwrap()).unwrap();
        assert_eq!(
            body,
            r#"{"calendario":{"expiracao":3600},"devedor":{"cnpj":"12345678000199","nome":"EMPRESA LTDA"},"valor":{"original":"10.00"},"chave":"financeiro@empresa.com.br","solicitacaoPagador":"Pedido 42"}"#
        );
    }

    #[test]
    fn test_request_validation() {
        let mut request = PixChargeRequest::new("chave-aleatoria", dec!(0));
        assert!(request.check().is_err());

        request.amount = dec!(25.90);
        request.debtor = Some(PixDebtor {
            tax_id: "123".into(),
            name: "X".into(),
        });
        assert!(request.check().is_err());

        request.debtor = None;
        assert!(request.check().is_ok());

        request.key = "bad key/with slash".into();
        assert!(request.check().is_err());
    }

    #[test]
    fn test_reply_decoding() {
        let reply: CobReply = serde_json::from_str(
            r#"{"txid":"7978c0c97ea847e78e8849634473c1f1","revisao":0,"status":"ATIVA",
                "calendario":{"criacao":"2026-02-01T12:00:00Z","expiracao":3600},
                "valor":{"original":"37.50"},"pixCopiaECola":"00020101021226..."}"#,
        )
        .unwrap();
        let charge = PixCharge::from(reply);
        assert_eq!(charge.amount, Some(dec!(37.50)));
        assert_eq!(charge.status.as_deref(), Some("ATIVA"));
        assert_eq!(charge.expiration_seconds, Some(3600));
        assert!(charge.location.is_none());
    }
}

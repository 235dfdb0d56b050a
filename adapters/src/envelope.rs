//! Provider error envelope decoding

use crate::error::{Error, ProviderError};
use crate::wire::id_text;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

/// `{"codigo": "404", "mensagem": "...", "detalhes": "..."}`
#[derive(Debug, Deserialize)]
struct CodeMessage {
    #[serde(deserialize_with = "id_text::deserialize")]
    codigo: String,
    mensagem: String,
    #[serde(default)]
    detalhes: Option<serde_json::Value>,
}

/// `{"mensagens": [{"codigo": "...", "mensagem": "..."}]}`
#[derive(Debug, Deserialize)]
struct MessageList {
    mensagens: Vec<CodeMessage>,
}

/// `{"status": 400, "message": "...", "error": "Bad Request"}`
#[derive(Debug, Deserialize)]
struct StatusMessage {
    #[serde(deserialize_with = "id_text::deserialize")]
    status: String,
    message: String,
    #[serde(default)]
    error: Option<String>,
}

/// `{"error": "invalid_grant", "error_description": "..."}`
#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Option<T> {
    serde_json::from_slice(body).ok()
}

fn detail_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decode any known envelope into a [`ProviderError`]
pub fn decode(provider: &str, status: u16, body: &[u8]) -> Option<ProviderError> {
    let build = |code: String, message: String, detail: Option<String>| ProviderError {
        code,
        message,
        detail,
        http_status: status,
        provider_name: provider.to_string(),
    };

    if let Some(env) = parse::<CodeMessage>(body).filter(|e| !e.mensagem.is_empty()) {
        let detail = env.detalhes.as_ref().and_then(detail_text);
        return Some(build(env.codigo, env.mensagem, detail));
    }

    if let Some(mut env) = parse::<MessageList>(body).filter(|e| !e.mensagens.is_empty()) {
        let first = env.mensagens.remove(0);
        let rest: Vec<String> = env
            .mensagens
            .iter()
            .map(|m| format!("[{}] {}", m.codigo, m.mensagem))
            .collect();
        let detail = if rest.is_empty() {
            first.detalhes.as_ref().and_then(detail_text)
        } else {
            Some(rest.join("; "))
        };
        return Some(build(first.codigo, first.mensagem, detail));
    }

    if let Some(env) = parse::<StatusMessage>(body).filter(|e| !e.message.is_empty()) {
        return Some(build(env.status, env.message, env.error.filter(|e| !e.is_empty())));
    }

    if let Some(env) = parse::<OAuthError>(body) {
        let message = env.error_description.unwrap_or_else(|| env.error.clone());
        return Some(build(env.error, message, None));
    }

    None
}

/// Classify a non-success response
pub fn classify(provider: &str, status: u16, body: &[u8]) -> Error {
    match decode(provider, status, body) {
        Some(err) => {
            warn!("{} rejected request: {}", provider, err);
            Error::ProviderApi(err)
        }
        None => {
            let body = String::from_utf8_lossy(body).into_owned();
            warn!(
                "{} answered HTTP {} with an undecodable body ({} bytes)",
                provider,
                status,
                body.len()
            );
            Error::UndecodedProvider {
                provider: provider.to_string(),
                status,
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sicoob_envelope() {
        let body = r#"{"codigo":"404","mensagem":"boleto não encontrado"}"#;
        let err = decode("SICOOB", 404, body.as_bytes()).unwrap();
        assert_eq!(err.code, "404");
        assert_eq!(err.message, "boleto não encontrado");
        assert_eq!(err.detail, None);
        assert_eq!(err.http_status, 404);
    }

    #[test]
    fn test_numeric_code_and_detail() {
        let body = r#"{"codigo":5001,"mensagem":"Contrato inválido","detalhes":"numeroContrato"}"#;
        let err = decode("SICOOB", 400, body.as_bytes()).unwrap();
        assert_eq!(err.code, "5001");
        assert_eq!(err.detail.as_deref(), Some("numeroContrato"));
    }

    #[test]
    fn test_message_list() {
        let body = r#"{"mensagens":[{"codigo":"4001","mensagem":"Valor inválido"},{"codigo":"4002","mensagem":"Data inválida"}]}"#;
        let err = decode("SICOOB", 422, body.as_bytes()).unwrap();
        assert_eq!(err.code, "4001");
        assert_eq!(err.detail.as_deref(), Some("[4002] Data inválida"));
    }

    #[test]
    fn test_sicredi_envelope() {
        let body = r#"{"status":400,"message":"Campo seuNumero obrigatório","error":"Bad Request"}"#;
        let err = decode("SICREDI", 400, body.as_bytes()).unwrap();
        assert_eq!(err.code, "400");
        assert_eq!(err.message, "Campo seuNumero obrigatório");
        assert_eq!(err.detail.as_deref(), Some("Bad Request"));
    }

    #[test]
    fn test_undecodable_body_keeps_status_and_text() {
        match classify("SICREDI", 502, b"<html>Bad Gateway</html>") {
            Error::UndecodedProvider { status, body, .. } => {
                assert_eq!(status, 502);
                assert!(body.contains("Bad Gateway"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

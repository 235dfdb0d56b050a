//! Serde helpers shared by provider payloads
//!
//! Amounts travel as JSON numbers with exactly two fraction digits (`150.00`), PIX
//! values as decimal strings (`"150.00"`). The crate enables serde_json's
//! `arbitrary_precision`, so a [`serde_json::Number`] built from text is written back
//! verbatim and never goes through `f64`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;

/// Fraction digits of every monetary amount sent to a provider
pub const AMOUNT_SCALE: u32 = 2;

/// Rescale an amount to exactly two fraction digits
pub fn to_wire_scale(amount: Decimal) -> Decimal {
    let mut value = amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(AMOUNT_SCALE);
    value
}

/// True when the amount has no digits beyond the cent
pub fn has_cent_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= AMOUNT_SCALE
}

/// Rate with its own precision but never fewer than two fraction digits (`2.00`, `0.033`)
pub fn to_rate_scale(rate: Decimal) -> Decimal {
    let mut value = rate.normalize();
    if value.scale() < AMOUNT_SCALE {
        value.rescale(AMOUNT_SCALE);
    }
    value
}

/// Exact JSON number for an amount
pub fn amount_number(amount: Decimal) -> crate::Result<serde_json::Number> {
    serde_json::Number::from_str(&to_wire_scale(amount).to_string())
        .map_err(|e| crate::Error::Serialization(format!("amount {}: {}", amount, e)))
}

/// Exact JSON number for a rate or percentage
pub fn rate_number(rate: Decimal) -> crate::Result<serde_json::Number> {
    serde_json::Number::from_str(&to_rate_scale(rate).to_string())
        .map_err(|e| crate::Error::Serialization(format!("rate {}: {}", rate, e)))
}

fn number<E: ser::Error>(text: &str) -> std::result::Result<serde_json::Number, E> {
    serde_json::Number::from_str(text).map_err(E::custom)
}

fn decimal_from_value<E: de::Error>(value: Value) -> std::result::Result<Decimal, E> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(E::custom)
        }
        Value::String(s) => Decimal::from_str(s.trim()).map_err(E::custom),
        other => Err(E::custom(format!("expected a decimal amount, found {}", other))),
    }
}

/// Amount as a JSON number with two fraction digits
pub mod amount {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        number::<S::Error>(&to_wire_scale(*value).to_string())?.serialize(serializer)
    }

    /// Deserialize from a number or a numeric string
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        decimal_from_value(Value::deserialize(deserializer)?)
    }
}

/// Optional amount; pair with `skip_serializing_if = "Option::is_none"`
pub mod amount_opt {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => amount::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize, mapping `null` to `None`
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decimal_from_value(value).map(Some),
        }
    }
}

/// Amount as a decimal string (`"10.00"`), used by the PIX API
pub mod amount_str {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_wire_scale(*value).to_string())
    }

    /// Deserialize from a string or a number
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        decimal_from_value(Value::deserialize(deserializer)?)
    }
}

/// Optional rate or percentage, written with its own precision (`0.033`)
pub mod rate_opt {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => number::<S::Error>(&to_rate_scale(*v).to_string())?.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// Optional calendar date, tolerant of a trailing time component
pub mod date_opt {
    use super::*;
    use chrono::NaiveDate;

    /// Deserialize `YYYY-MM-DD` or `YYYY-MM-DDThh:mm:ss...`
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => {
                let day = text.get(..10).unwrap_or(text);
                NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map(Some)
                    .map_err(de::Error::custom)
            }
        }
    }
}

/// Identifier that some providers send as a number and others as a string
pub mod id_text {
    use super::*;

    /// Deserialize a number or string into its text form
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(de::Error::custom(format!("expected an identifier, found {}", other))),
        }
    }

    /// Optional variant
    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(de::Error::custom(format!(
                "expected an identifier, found {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Priced {
        #[serde(with = "amount")]
        valor: Decimal,
        #[serde(
            default,
            with = "amount_opt",
            skip_serializing_if = "Option::is_none"
        )]
        desconto: Option<Decimal>,
    }

    #[test]
    fn test_amount_has_two_fraction_digits() {
        let priced = Priced {
            valor: dec!(150),
            desconto: None,
        };
        let json = serde_json::to_string(&priced).unwrap();
        assert_eq!(json, r#"{"valor":150.00}"#);
    }

    #[test]
    fn test_amount_keeps_cents_from_provider_text() {
        let priced: Priced = serde_json::from_str(r#"{"valor":99.90,"desconto":"5.5"}"#).unwrap();
        assert_eq!(priced.valor, dec!(99.90));
        assert_eq!(priced.desconto, Some(dec!(5.50)));
    }

    #[test]
    fn test_wire_scale_rounds_half_away_from_zero() {
        assert_eq!(to_wire_scale(dec!(10.005)).to_string(), "10.01");
        assert_eq!(to_wire_scale(dec!(7)).to_string(), "7.00");
        assert!(has_cent_precision(dec!(1.10)));
        assert!(has_cent_precision(dec!(1.100)));
        assert!(!has_cent_precision(dec!(1.001)));
        assert_eq!(to_rate_scale(dec!(0.033)).to_string(), "0.033");
        assert_eq!(to_rate_scale(dec!(2)).to_string(), "2.00");
    }

    #[test]
    fn test_pix_amount_is_string() {
        #[derive(Serialize)]
        struct Valor {
            #[serde(with = "amount_str")]
            original: Decimal,
        }
        let json = serde_json::to_string(&Valor { original: dec!(37.5) }).unwrap();
        assert_eq!(json, r#"{"original":"37.50"}"#);
    }

    #[test]
    fn test_date_accepts_timestamp_suffix() {
        #[derive(Deserialize)]
        struct Dated {
            #[serde(default, deserialize_with = "date_opt::deserialize")]
            data: Option<chrono::NaiveDate>,
        }
        let dated: Dated = serde_json::from_str(r#"{"data":"2026-02-28T00:00:00-03:00"}"#).unwrap();
        assert_eq!(dated.data, chrono::NaiveDate::from_ymd_opt(2026, 2, 28));
        let empty: Dated = serde_json::from_str(r#"{"data":""}"#).unwrap();
        assert!(empty.data.is_none());
    }
}

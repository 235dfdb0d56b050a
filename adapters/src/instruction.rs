//! Instruction commands ("comandos de instrução")
//!
//! Every post-issuance change to a boleto is an [`InstructionCommand`]: a kind, the
//! target our-number and a closed set of typed fields. Providers map kinds to URL
//! segments and fields to wire keys through an [`InstructionRoute`] table, so a new
//! command is a new table row rather than a new code path.

use crate::wire::{has_cent_precision, rate_number};
use crate::{Error, Result};
use chrono::NaiveDate;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Write off ("baixa")
    WriteOff,
    /// Change the due date
    ChangeDueDate,
    /// Change discount tier values
    ChangeDiscount,
    /// Change discount tier cutoff dates
    ChangeDiscountDates,
    /// Change the interest value or rate
    ChangeInterest,
    /// Change the caller's reference
    ChangeTheirNumber,
}

impl InstructionKind {
    /// Name used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            InstructionKind::WriteOff => "write_off",
            InstructionKind::ChangeDueDate => "change_due_date",
            InstructionKind::ChangeDiscount => "change_discount",
            InstructionKind::ChangeDiscountDates => "change_discount_dates",
            InstructionKind::ChangeInterest => "change_interest",
            InstructionKind::ChangeTheirNumber => "change_their_number",
        }
    }

    /// Fields the command accepts
    pub fn fields(&self) -> &'static [InstructionField] {
        use InstructionField::*;
        match self {
            InstructionKind::WriteOff => &[],
            InstructionKind::ChangeDueDate => &[DueDate],
            InstructionKind::ChangeDiscount => &[Discount1, Discount2, Discount3],
            InstructionKind::ChangeDiscountDates => &[DiscountDate1, DiscountDate2, DiscountDate3],
            InstructionKind::ChangeInterest => &[InterestValue],
            InstructionKind::ChangeTheirNumber => &[TheirNumber],
        }
    }

    fn requires_all(&self) -> bool {
        matches!(
            self,
            InstructionKind::ChangeDueDate
                | InstructionKind::ChangeInterest
                | InstructionKind::ChangeTheirNumber
        )
    }
}

impl std::fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed set of command fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InstructionField {
    /// New due date
    DueDate,
    /// Tier 1 discount value
    Discount1,
    /// Tier 2 discount value
    Discount2,
    /// Tier 3 discount value
    Discount3,
    /// Tier 1 cutoff date
    DiscountDate1,
    /// Tier 2 cutoff date
    DiscountDate2,
    /// Tier 3 cutoff date
    DiscountDate3,
    /// Interest value or rate
    InterestValue,
    /// New caller's reference
    TheirNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Date,
    Amount,
    Text,
}

impl InstructionField {
    const DISCOUNTS: [InstructionField; 3] = [
        InstructionField::Discount1,
        InstructionField::Discount2,
        InstructionField::Discount3,
    ];

    const DISCOUNT_DATES: [InstructionField; 3] = [
        InstructionField::DiscountDate1,
        InstructionField::DiscountDate2,
        InstructionField::DiscountDate3,
    ];

    fn value_type(&self) -> ValueType {
        match self {
            InstructionField::DueDate
            | InstructionField::DiscountDate1
            | InstructionField::DiscountDate2
            | InstructionField::DiscountDate3 => ValueType::Date,
            InstructionField::Discount1
            | InstructionField::Discount2
            | InstructionField::Discount3
            | InstructionField::InterestValue => ValueType::Amount,
            InstructionField::TheirNumber => ValueType::Text,
        }
    }
}

/// Typed field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionValue {
    /// Calendar date, sent as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Amount or rate, sent with at least two fraction digits
    Amount(Decimal),
    /// Free text
    Text(String),
}

impl InstructionValue {
    fn value_type(&self) -> ValueType {
        match self {
            InstructionValue::Date(_) => ValueType::Date,
            InstructionValue::Amount(_) => ValueType::Amount,
            InstructionValue::Text(_) => ValueType::Text,
        }
    }

    /// Wire value; `None` for zero amounts and empty text, which providers reject
    fn to_wire(&self) -> Result<Option<Value>> {
        Ok(match self {
            InstructionValue::Date(d) => Some(Value::String(d.format("%Y-%m-%d").to_string())),
            InstructionValue::Amount(a) if a.is_zero() => None,
            InstructionValue::Amount(a) => Some(Value::Number(rate_number(*a)?)),
            InstructionValue::Text(t) if t.trim().is_empty() => None,
            InstructionValue::Text(t) => Some(Value::String(t.clone())),
        })
    }
}

/// A typed change addressed to one boleto
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionCommand {
    kind: InstructionKind,
    our_number: String,
    fields: BTreeMap<InstructionField, InstructionValue>,
}

impl InstructionCommand {
    /// Empty command for `our_number`
    pub fn new(kind: InstructionKind, our_number: impl Into<String>) -> Self {
        Self {
            kind,
            our_number: our_number.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, rejecting fields outside the kind's set and mistyped values
    pub fn with(mut self, field: InstructionField, value: InstructionValue) -> Result<Self> {
        if !self.kind.fields().contains(&field) {
            return Err(Error::Validation(format!(
                "field {:?} is not valid for {}",
                field, self.kind
            )));
        }
        if field.value_type() != value.value_type() {
            return Err(Error::Validation(format!(
                "field {:?} expects a {:?} value",
                field,
                field.value_type()
            )));
        }
        if let InstructionValue::Amount(amount) = &value {
            if amount.is_sign_negative() {
                return Err(Error::Validation(format!("field {:?} must not be negative", field)));
            }
            if field != InstructionField::InterestValue && !has_cent_precision(*amount) {
                return Err(Error::Validation(format!(
                    "field {:?} has more than two fraction digits",
                    field
                )));
            }
        }
        self.fields.insert(field, value);
        Ok(self)
    }

    /// Write off
    pub fn write_off(our_number: impl Into<String>) -> Self {
        Self::new(InstructionKind::WriteOff, our_number)
    }

    /// New due date
    pub fn change_due_date(our_number: impl Into<String>, due_date: NaiveDate) -> Result<Self> {
        Self::new(InstructionKind::ChangeDueDate, our_number)
            .with(InstructionField::DueDate, InstructionValue::Date(due_date))
    }

    /// New discount values, tier 1 first
    pub fn change_discount(our_number: impl Into<String>, values: &[Decimal]) -> Result<Self> {
        if values.len() > InstructionField::DISCOUNTS.len() {
            return Err(Error::Validation("at most 3 discount values".into()));
        }
        values.iter().zip(InstructionField::DISCOUNTS).try_fold(
            Self::new(InstructionKind::ChangeDiscount, our_number),
            |cmd, (value, field)| cmd.with(field, InstructionValue::Amount(*value)),
        )
    }

    /// New discount cutoff dates, tier 1 first
    pub fn change_discount_dates(our_number: impl Into<String>, dates: &[NaiveDate]) -> Result<Self> {
        if dates.len() > InstructionField::DISCOUNT_DATES.len() {
            return Err(Error::Validation("at most 3 discount dates".into()));
        }
        dates.iter().zip(InstructionField::DISCOUNT_DATES).try_fold(
            Self::new(InstructionKind::ChangeDiscountDates, our_number),
            |cmd, (date, field)| cmd.with(field, InstructionValue::Date(*date)),
        )
    }

    /// New interest value or rate
    pub fn change_interest(our_number: impl Into<String>, value: Decimal) -> Result<Self> {
        Self::new(InstructionKind::ChangeInterest, our_number)
            .with(InstructionField::InterestValue, InstructionValue::Amount(value))
    }

    /// New caller's reference
    pub fn change_their_number(
        our_number: impl Into<String>,
        their_number: impl Into<String>,
    ) -> Result<Self> {
        Self::new(InstructionKind::ChangeTheirNumber, our_number).with(
            InstructionField::TheirNumber,
            InstructionValue::Text(their_number.into()),
        )
    }

    /// Command kind
    pub fn kind(&self) -> InstructionKind {
        self.kind
    }

    /// Target boleto
    pub fn our_number(&self) -> &str {
        &self.our_number
    }

    /// Value of a field
    pub fn get(&self, field: InstructionField) -> Option<&InstructionValue> {
        self.fields.get(&field)
    }

    /// Check the target and required fields before anything is sent
    pub fn check(&self) -> Result<()> {
        check_path_id("our number", &self.our_number)?;

        let required = self.kind.fields();
        if self.kind.requires_all() {
            if let Some(missing) = required.iter().find(|f| !self.fields.contains_key(*f)) {
                return Err(Error::Validation(format!(
                    "{} requires field {:?}",
                    self.kind, missing
                )));
            }
        } else if !required.is_empty() && self.fields.is_empty() {
            return Err(Error::Validation(format!(
                "{} requires at least one field",
                self.kind
            )));
        }

        if let Some(InstructionValue::Text(text)) = self.fields.get(&InstructionField::TheirNumber) {
            if text.trim().is_empty() || text.chars().count() > 15 {
                return Err(Error::Validation(
                    "their number must have 1 to 15 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Reject identifiers that would not form a single URL path segment
pub fn check_path_id(what: &str, id: &str) -> Result<()> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(Error::Validation(format!("invalid {}: {:?}", what, id)));
    }
    Ok(())
}

/// How one provider executes one command kind
#[derive(Debug)]
pub struct InstructionRoute {
    /// Command kind
    pub kind: InstructionKind,
    /// Path segment(s) after `/boletos/{our_number}/`
    pub segment: &'static str,
    /// HTTP method
    pub method: Method,
    /// Accepted status codes
    pub success: &'static [u16],
    /// Field to wire key mapping
    pub keys: &'static [(InstructionField, &'static str)],
}

impl InstructionRoute {
    /// Find the route for `kind`
    pub fn lookup<'a>(
        routes: &'a [InstructionRoute],
        provider: &str,
        kind: InstructionKind,
    ) -> Result<&'a InstructionRoute> {
        routes.iter().find(|r| r.kind == kind).ok_or_else(|| {
            Error::Validation(format!("{} does not support {}", provider, kind))
        })
    }

    /// Request path for `command`
    pub fn path(&self, command: &InstructionCommand) -> String {
        format!("/boletos/{}/{}", command.our_number(), self.segment)
    }

    /// JSON body: `base` entries plus the command's mapped fields, zero values omitted
    pub fn render_body(
        &self,
        command: &InstructionCommand,
        base: Map<String, Value>,
    ) -> Result<Value> {
        let mut body = base;
        for (field, value) in &command.fields {
            let key = self
                .keys
                .iter()
                .find(|(f, _)| f == field)
                .map(|(_, key)| *key)
                .ok_or_else(|| {
                    Error::Validation(format!("field {:?} has no wire mapping", field))
                })?;
            if let Some(wire) = value.to_wire()? {
                body.insert(key.to_string(), wire);
            }
        }
        Ok(Value::Object(body))
    }
}

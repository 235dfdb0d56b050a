//! Shared types for adapters

use crate::wire::has_cent_precision;
use crate::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum number of discount tiers on a boleto
pub const MAX_DISCOUNT_TIERS: usize = 3;

/// Maximum number of free-text message lines on a boleto
pub const MAX_MESSAGE_LINES: usize = 5;

/// Maximum characters per message line
pub const MAX_MESSAGE_LEN: usize = 80;

/// Banking provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Sicoob (client-credentials, mTLS)
    Sicoob,
    /// Sicredi (password grant with refresh)
    Sicredi,
}

impl ProviderKind {
    /// Name used in errors, logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Sicoob => "SICOOB",
            ProviderKind::Sicredi => "SICREDI",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SICOOB" => Ok(ProviderKind::Sicoob),
            "SICREDI" => Ok(ProviderKind::Sicredi),
            other => Err(Error::Validation(format!("unknown provider: {}", other))),
        }
    }
}

/// Legal nature of a party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonType {
    /// Natural person (CPF, 11 digits)
    Individual,
    /// Legal entity (CNPJ, 14 digits)
    Company,
}

impl PersonType {
    /// Infer from a tax id's digit count
    pub fn from_tax_id(tax_id: &str) -> Option<Self> {
        match tax_id.chars().filter(char::is_ascii_digit).count() {
            11 => Some(PersonType::Individual),
            14 => Some(PersonType::Company),
            _ => None,
        }
    }

    fn tax_id_len(&self) -> usize {
        match self {
            PersonType::Individual => 11,
            PersonType::Company => 14,
        }
    }
}

/// Payer (or final beneficiary) of a boleto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Payer {
    /// Person type
    pub person_type: PersonType,
    /// CPF or CNPJ, digits only
    pub tax_id: String,
    /// Name
    #[validate(length(min = 1, max = 60))]
    pub name: String,
    /// Street address
    #[validate(length(max = 60))]
    pub address: Option<String>,
    /// Neighborhood
    pub neighborhood: Option<String>,
    /// City
    pub city: Option<String>,
    /// State (UF, 2 letters)
    #[validate(length(equal = 2))]
    pub state: Option<String>,
    /// Postal code (CEP, 8 digits)
    #[validate(length(equal = 8))]
    pub postal_code: Option<String>,
    /// E-mail
    #[validate(email)]
    pub email: Option<String>,
    /// Phone
    pub phone: Option<String>,
}

impl Payer {
    /// Payer with only the required fields; the person type follows the tax id
    pub fn new(tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        let tax_id = tax_id.into();
        Self {
            person_type: PersonType::from_tax_id(&tax_id).unwrap_or(PersonType::Individual),
            tax_id,
            name: name.into(),
            address: None,
            neighborhood: None,
            city: None,
            state: None,
            postal_code: None,
            email: None,
            phone: None,
        }
    }

    /// Validate field formats and the tax id against the person type
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        let digits = self.tax_id.len();
        if digits != self.person_type.tax_id_len() || !self.tax_id.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::Validation(format!(
                "tax id must have {} digits for {:?}",
                self.person_type.tax_id_len(),
                self.person_type
            )));
        }
        Ok(())
    }
}

/// Document species ("espécie do documento")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentSpecies {
    /// Duplicata mercantil por indicação
    CommercialInvoice,
    /// Duplicata rural
    RuralInvoice,
    /// Nota promissória
    PromissoryNote,
    /// Nota promissória rural
    RuralPromissoryNote,
    /// Nota de seguros
    InsuranceNote,
    /// Recibo
    Receipt,
    /// Letra de câmbio
    BillOfExchange,
    /// Nota de débito
    DebitNote,
    /// Duplicata de serviço por indicação
    ServiceInvoice,
    /// Boleto proposta
    Proposal,
    /// Cartão de crédito
    CreditCard,
    /// Outros
    Other,
}

impl DocumentSpecies {
    const ALL: [DocumentSpecies; 12] = [
        DocumentSpecies::CommercialInvoice,
        DocumentSpecies::RuralInvoice,
        DocumentSpecies::PromissoryNote,
        DocumentSpecies::RuralPromissoryNote,
        DocumentSpecies::InsuranceNote,
        DocumentSpecies::Receipt,
        DocumentSpecies::BillOfExchange,
        DocumentSpecies::DebitNote,
        DocumentSpecies::ServiceInvoice,
        DocumentSpecies::Proposal,
        DocumentSpecies::CreditCard,
        DocumentSpecies::Other,
    ];

    /// Sicoob short code, `None` when Sicoob does not accept the species
    pub fn sicoob_code(&self) -> Option<&'static str> {
        match self {
            DocumentSpecies::CommercialInvoice => Some("DM"),
            DocumentSpecies::RuralInvoice => Some("DR"),
            DocumentSpecies::PromissoryNote => Some("NP"),
            DocumentSpecies::RuralPromissoryNote => Some("NR"),
            DocumentSpecies::InsuranceNote => Some("NS"),
            DocumentSpecies::Receipt => Some("RC"),
            DocumentSpecies::BillOfExchange => Some("LC"),
            DocumentSpecies::DebitNote => Some("ND"),
            DocumentSpecies::ServiceInvoice => Some("DS"),
            DocumentSpecies::Other => Some("OU"),
            DocumentSpecies::Proposal | DocumentSpecies::CreditCard => None,
        }
    }

    /// Sicredi enumeration name
    pub fn sicredi_code(&self) -> &'static str {
        match self {
            DocumentSpecies::CommercialInvoice => "DUPLICATA_MERCANTIL_INDICACAO",
            DocumentSpecies::RuralInvoice => "DUPLICATA_RURAL",
            DocumentSpecies::PromissoryNote => "NOTA_PROMISSORIA",
            DocumentSpecies::RuralPromissoryNote => "NOTA_PROMISSORIA_RURAL",
            DocumentSpecies::InsuranceNote => "NOTA_SEGUROS",
            DocumentSpecies::Receipt => "RECIBO",
            DocumentSpecies::BillOfExchange => "LETRA_CAMBIO",
            DocumentSpecies::DebitNote => "NOTA_DEBITO",
            DocumentSpecies::ServiceInvoice => "DUPLICATA_SERVICO_INDICACAO",
            DocumentSpecies::Proposal => "BOLETO_PROPOSTA",
            DocumentSpecies::CreditCard => "CARTAO_CREDITO",
            DocumentSpecies::Other => "OUTROS",
        }
    }
}

impl std::str::FromStr for DocumentSpecies {
    type Err = Error;

    /// Accepts either provider's code
    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|species| species.sicredi_code() == code || species.sicoob_code() == Some(code.as_str()))
            .ok_or_else(|| Error::Validation(format!("unsupported document species: {}", s)))
    }
}

/// How discount tier values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountKind {
    /// Fixed amount in BRL
    FixedAmount,
    /// Percentage of the face value
    Percentage,
}

/// One discount tier: `amount` applies when paid on or before `until`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTier {
    /// Discount value (BRL or percent)
    pub amount: Decimal,
    /// Last day the tier applies
    pub until: NaiveDate,
}

/// Up to three ordered discount tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountSchedule {
    /// Interpretation of every tier
    pub kind: DiscountKind,
    /// Tiers in input order (tier 1 first)
    pub tiers: Vec<DiscountTier>,
}

/// Interest or fine interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeKind {
    /// No charge
    Exempt,
    /// Fixed amount (per day for interest)
    FixedAmount,
    /// Percentage (monthly for interest)
    Percentage,
}

/// Late-payment interest or fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargePolicy {
    /// Interpretation of `value`
    pub kind: ChargeKind,
    /// Amount or rate
    pub value: Decimal,
    /// First day the charge applies; defaults to the day after the due date
    pub from: Option<NaiveDate>,
}

impl ChargePolicy {
    /// Fixed amount policy
    pub fn fixed(value: Decimal) -> Self {
        Self {
            kind: ChargeKind::FixedAmount,
            value,
            from: None,
        }
    }

    /// Percentage policy
    pub fn percentage(value: Decimal) -> Self {
        Self {
            kind: ChargeKind::Percentage,
            value,
            from: None,
        }
    }

    /// Whether the policy results in a charge on the wire
    pub fn is_active(&self) -> bool {
        self.kind != ChargeKind::Exempt && !self.value.is_zero()
    }
}

/// Boleto issuance request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewBoleto {
    /// Caller's reference ("seu número")
    #[validate(length(min = 1, max = 15))]
    pub their_number: String,
    /// Issuer number, generated by the bank when absent
    pub our_number: Option<String>,
    /// Face value
    pub amount: Decimal,
    /// Issue date; the bank uses today when absent
    pub issue_date: Option<NaiveDate>,
    /// Due date
    pub due_date: NaiveDate,
    /// Document species
    pub species: DocumentSpecies,
    /// Payer
    pub payer: Payer,
    /// Final beneficiary (guarantor), Sicredi only
    pub final_beneficiary: Option<Payer>,
    /// Discount schedule
    pub discounts: Option<DiscountSchedule>,
    /// Late interest
    pub interest: Option<ChargePolicy>,
    /// Late fine
    pub fine: Option<ChargePolicy>,
    /// Free-text lines printed on the slip
    pub messages: Vec<String>,
    /// Also issue a PIX QR payload (hybrid boleto)
    pub hybrid_pix: bool,
    /// Days the PIX payload stays payable after the due date
    pub pix_validity_days: Option<u32>,
    /// Automatic protest after this many days
    pub protest_days: Option<u32>,
}

impl NewBoleto {
    /// Plain boleto without discounts or charges
    pub fn new(
        their_number: impl Into<String>,
        amount: Decimal,
        due_date: NaiveDate,
        species: DocumentSpecies,
        payer: Payer,
    ) -> Self {
        Self {
            their_number: their_number.into(),
            our_number: None,
            amount,
            issue_date: None,
            due_date,
            species,
            payer,
            final_beneficiary: None,
            discounts: None,
            interest: None,
            fine: None,
            messages: Vec::new(),
            hybrid_pix: false,
            pix_validity_days: None,
            protest_days: None,
        }
    }

    /// Attach a discount schedule
    pub fn with_discounts(mut self, kind: DiscountKind, tiers: Vec<DiscountTier>) -> Self {
        self.discounts = Some(DiscountSchedule { kind, tiers });
        self
    }

    /// Attach interest and fine policies
    pub fn with_charges(mut self, interest: Option<ChargePolicy>, fine: Option<ChargePolicy>) -> Self {
        self.interest = interest;
        self.fine = fine;
        self
    }

    /// Discount tiers, empty when no schedule is set
    pub fn discount_tiers(&self) -> &[DiscountTier] {
        self.discounts
            .as_ref()
            .map(|d| d.tiers.as_slice())
            .unwrap_or(&[])
    }

    /// Validate every invariant before anything is serialized
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.payer.check()?;
        if let Some(beneficiary) = &self.final_beneficiary {
            beneficiary.check()?;
        }

        check_amount("amount", self.amount)?;

        if let Some(issue) = self.issue_date {
            if issue > self.due_date {
                return Err(Error::Validation(format!(
                    "issue date {} is after due date {}",
                    issue, self.due_date
                )));
            }
        }

        if let Some(schedule) = &self.discounts {
            if schedule.tiers.is_empty() || schedule.tiers.len() > MAX_DISCOUNT_TIERS {
                return Err(Error::Validation(format!(
                    "discount schedule must have 1 to {} tiers",
                    MAX_DISCOUNT_TIERS
                )));
            }
            for (i, tier) in schedule.tiers.iter().enumerate() {
                check_amount("discount", tier.amount)?;
                if tier.until > self.due_date {
                    return Err(Error::Validation(format!(
                        "discount {} cutoff {} is after due date {}",
                        i + 1,
                        tier.until,
                        self.due_date
                    )));
                }
                if schedule.kind == DiscountKind::FixedAmount && tier.amount >= self.amount {
                    return Err(Error::Validation(format!(
                        "discount {} is not below the face value",
                        i + 1
                    )));
                }
            }
        }

        for policy in [self.interest, self.fine].iter().flatten() {
            if policy.value.is_sign_negative() {
                return Err(Error::Validation("interest and fine must not be negative".into()));
            }
        }

        if self.messages.len() > MAX_MESSAGE_LINES {
            return Err(Error::Validation(format!(
                "at most {} message lines",
                MAX_MESSAGE_LINES
            )));
        }
        if let Some(line) = self.messages.iter().find(|m| m.chars().count() > MAX_MESSAGE_LEN) {
            return Err(Error::Validation(format!(
                "message line longer than {} characters: {}",
                MAX_MESSAGE_LEN, line
            )));
        }

        Ok(())
    }
}

/// Reject non-positive amounts and sub-cent precision
pub fn check_amount(field: &str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation(format!("{} must be greater than zero", field)));
    }
    if !has_cent_precision(amount) {
        return Err(Error::Validation(format!(
            "{} has more than two fraction digits: {}",
            field, amount
        )));
    }
    Ok(())
}

/// Identifiers returned when a boleto is registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoletoReceipt {
    /// Issuer number
    pub our_number: String,
    /// Caller's reference
    pub their_number: Option<String>,
    /// Digit line
    pub digit_line: String,
    /// Barcode
    pub barcode: String,
    /// PIX copy-paste payload (hybrid boletos)
    pub pix_payload: Option<String>,
    /// PIX transaction id (hybrid boletos)
    pub txid: Option<String>,
}

/// Normalized boleto status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoletoStatus {
    /// Registered and awaiting payment (includes pending and overdue)
    Open,
    /// Settled
    Paid,
    /// Written off ("baixado")
    WrittenOff,
    /// Cancelled
    Cancelled,
    /// Sent to protest
    Protested,
    /// Status text not recognized
    Other(String),
}

impl BoletoStatus {
    /// Map a provider status text
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_uppercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "EM_ABERTO" | "ABERTO" | "PENDENTE" | "EM_CARTEIRA" | "EM_CARTEIRA_PIX" | "VENCIDO"
            | "A_VENCER" | "NORMAL" => BoletoStatus::Open,
            "LIQUIDADO" | "PAGO" | "LIQUIDADO_PIX" => BoletoStatus::Paid,
            "BAIXADO" | "BAIXADO_POR_SOLICITACAO" | "BAIXA" => BoletoStatus::WrittenOff,
            "CANCELADO" => BoletoStatus::Cancelled,
            "PROTESTADO" | "EM_CARTORIO" => BoletoStatus::Protested,
            _ => BoletoStatus::Other(raw.trim().to_string()),
        }
    }

    /// Still payable
    pub fn is_open(&self) -> bool {
        matches!(self, BoletoStatus::Open)
    }

    /// Filter value sent to providers that filter by status
    pub fn wire_filter(&self) -> &str {
        match self {
            BoletoStatus::Open => "EM_ABERTO",
            BoletoStatus::Paid => "LIQUIDADO",
            BoletoStatus::WrittenOff => "BAIXADO",
            BoletoStatus::Cancelled => "CANCELADO",
            BoletoStatus::Protested => "PROTESTADO",
            BoletoStatus::Other(raw) => raw,
        }
    }
}

/// Boleto as reported by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boleto {
    /// Provider that holds the boleto
    pub provider: ProviderKind,
    /// Issuer number
    pub our_number: String,
    /// Caller's reference
    pub their_number: Option<String>,
    /// Face value
    pub amount: Decimal,
    /// Issue date
    pub issue_date: Option<NaiveDate>,
    /// Due date (absent on some settlement listings)
    pub due_date: Option<NaiveDate>,
    /// Status
    pub status: BoletoStatus,
    /// Digit line
    pub digit_line: Option<String>,
    /// Barcode
    pub barcode: Option<String>,
    /// PIX copy-paste payload
    pub pix_payload: Option<String>,
    /// PIX transaction id
    pub txid: Option<String>,
    /// Payer name
    pub payer_name: Option<String>,
    /// Payer tax id
    pub payer_tax_id: Option<String>,
    /// Settlement date
    pub paid_on: Option<NaiveDate>,
    /// Settled amount
    pub paid_amount: Option<Decimal>,
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day
    pub from: NaiveDate,
    /// Last day
    pub to: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `from > to`
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::Validation(format!(
                "date range starts after it ends: {} > {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Number of days covered
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Every day in the range
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }
}

/// Listing filter: a date range and/or a status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Due (or settlement) date range
    pub period: Option<DateRange>,
    /// Status filter
    pub status: Option<BoletoStatus>,
}

impl ListQuery {
    /// Filter by period
    pub fn between(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        Ok(Self {
            period: Some(DateRange::new(from, to)?),
            status: None,
        })
    }

    /// Add a status filter
    pub fn with_status(mut self, status: BoletoStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether a record passes the status filter
    pub fn matches(&self, boleto: &Boleto) -> bool {
        self.status.as_ref().map_or(true, |s| *s == boleto.status)
    }
}

/// Order a listing: open items first, then ascending due date, undated last
///
/// The sort is stable, so records that compare equal keep the provider's order.
pub fn order_listing(boletos: &mut [Boleto]) {
    boletos.sort_by_key(|b| (!b.status.is_open(), b.due_date.is_none(), b.due_date));
}

/// Provider acknowledgement of an instruction command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionReceipt {
    /// Provider transaction id
    pub transaction_id: Option<String>,
    /// Command status reported by the provider
    pub status: Option<String>,
    /// Registration timestamp as sent by the provider
    pub registered_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> NewBoleto {
        NewBoleto::new(
            "NF-001234",
            dec!(150.00),
            date(2026, 2, 28),
            DocumentSpecies::CommercialInvoice,
            Payer::new("12345678909", "JOAO DA SILVA"),
        )
    }

    fn record(status: &str, due: Option<NaiveDate>) -> Boleto {
        Boleto {
            provider: ProviderKind::Sicoob,
            our_number: status.to_string(),
            their_number: None,
            amount: dec!(10),
            issue_date: None,
            due_date: due,
            status: BoletoStatus::parse(status),
            digit_line: None,
            barcode: None,
            pix_payload: None,
            txid: None,
            payer_name: None,
            payer_tax_id: None,
            paid_on: None,
            paid_amount: None,
        }
    }

    #[test]
    fn test_valid_boleto_passes() {
        assert!(sample().check().is_ok());
    }

    #[test]
    fn test_amount_must_be_positive_with_cents() {
        let mut boleto = sample();
        boleto.amount = Decimal::ZERO;
        assert!(matches!(boleto.check(), Err(Error::Validation(_))));

        boleto.amount = dec!(10.001);
        assert!(matches!(boleto.check(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_discount_cutoff_after_due_date_rejected() {
        let boleto = sample().with_discounts(
            DiscountKind::FixedAmount,
            vec![DiscountTier {
                amount: dec!(5),
                until: date(2026, 3, 1),
            }],
        );
        assert!(matches!(boleto.check(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_at_most_three_tiers() {
        let tier = DiscountTier {
            amount: dec!(1),
            until: date(2026, 2, 1),
        };
        let boleto = sample().with_discounts(DiscountKind::Percentage, vec![tier; 4]);
        assert!(boleto.check().is_err());
    }

    #[test]
    fn test_tax_id_must_match_person_type() {
        let mut boleto = sample();
        boleto.payer.person_type = PersonType::Company;
        assert!(boleto.check().is_err());
        assert_eq!(PersonType::from_tax_id("12345678000199"), Some(PersonType::Company));
    }

    #[test]
    fn test_species_codes() {
        assert_eq!(
            "DM".parse::<DocumentSpecies>().unwrap(),
            DocumentSpecies::CommercialInvoice
        );
        assert_eq!(
            "duplicata_servico_indicacao".parse::<DocumentSpecies>().unwrap(),
            DocumentSpecies::ServiceInvoice
        );
        assert!("XX".parse::<DocumentSpecies>().is_err());
        assert_eq!(DocumentSpecies::CreditCard.sicoob_code(), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(BoletoStatus::parse("EM_ABERTO"), BoletoStatus::Open);
        assert_eq!(BoletoStatus::parse("Em Carteira"), BoletoStatus::Open);
        assert_eq!(BoletoStatus::parse("PENDENTE"), BoletoStatus::Open);
        assert_eq!(BoletoStatus::parse("LIQUIDADO"), BoletoStatus::Paid);
        assert_eq!(
            BoletoStatus::parse("EM_ANALISE"),
            BoletoStatus::Other("EM_ANALISE".into())
        );
    }

    #[test]
    fn test_listing_order_open_first_then_due_date() {
        let mut list = vec![
            record("LIQUIDADO", Some(date(2026, 1, 10))),
            record("PENDENTE", Some(date(2026, 3, 1))),
            record("BAIXADO", None),
            record("EM_ABERTO", Some(date(2026, 2, 15))),
        ];
        order_listing(&mut list);
        let order: Vec<&str> = list.iter().map(|b| b.our_number.as_str()).collect();
        assert_eq!(order, vec!["EM_ABERTO", "PENDENTE", "LIQUIDADO", "BAIXADO"]);
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(date(2026, 2, 27), date(2026, 3, 2)).unwrap();
        assert_eq!(range.days(), 4);
        assert_eq!(range.iter_days().last(), Some(date(2026, 3, 2)));
        assert!(DateRange::new(date(2026, 3, 2), date(2026, 3, 1)).is_err());
    }
}

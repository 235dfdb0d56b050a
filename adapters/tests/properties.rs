//! Property-based tests for adapter invariants
//!
//! - Amounts survive the wire encoding to the cent
//! - Token state honours the 30 s skew on both expiries
//! - Listing order: open first, ascending due date, stable
//! - Discount tiers keep their input order

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use cobranca_adapters::instruction::{InstructionField, InstructionValue};
use cobranca_adapters::token::{Token, TokenGrant, TOKEN_EXPIRY_SKEW_SECONDS};
use cobranca_adapters::wire;
use cobranca_adapters::{order_listing, Boleto, BoletoStatus, InstructionCommand, ProviderKind, TokenState};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct Priced {
    #[serde(with = "wire::amount")]
    valor: Decimal,
}

/// Strategy for generating valid amounts (positive, cent precision)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_00i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn status_strategy() -> impl Strategy<Value = BoletoStatus> {
    prop_oneof![
        Just(BoletoStatus::Open),
        Just(BoletoStatus::Paid),
        Just(BoletoStatus::WrittenOff),
        Just(BoletoStatus::Cancelled),
    ]
}

fn boleto_strategy() -> impl Strategy<Value = (BoletoStatus, Option<u32>)> {
    (status_strategy(), proptest::option::of(0u32..365))
}

fn boleto(index: usize, status: BoletoStatus, due_offset: Option<u32>) -> Boleto {
    let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    Boleto {
        provider: ProviderKind::Sicoob,
        our_number: index.to_string(),
        their_number: None,
        amount: Decimal::new(1000, 2),
        issue_date: None,
        due_date: due_offset.map(|d| base + Duration::days(i64::from(d))),
        status,
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

fn grant(expires_in: i64, refresh_expires_in: Option<i64>) -> TokenGrant {
    TokenGrant {
        access_token: "tok".into(),
        token_type: "Bearer".into(),
        expires_in,
        refresh_token: refresh_expires_in.map(|_| "refresh".into()),
        refresh_expires_in,
        scope: None,
    }
}

proptest! {
    #[test]
    fn prop_amount_round_trips_to_the_cent(amount in amount_strategy()) {
        let json = serde_json::to_string(&Priced { valor: amount }).unwrap();
        let fraction = json.trim_end_matches('}').rsplit('.').next().unwrap();
        prop_assert_eq!(fraction.len(), 2);

        let back: Priced = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.valor, amount);
    }

    #[test]
    fn prop_wire_scale_is_idempotent(mantissa in -10_000_000i64..10_000_000i64, scale in 0u32..6) {
        let amount = Decimal::new(mantissa, scale);
        let once = wire::to_wire_scale(amount);
        prop_assert_eq!(once.scale(), wire::AMOUNT_SCALE);
        prop_assert_eq!(wire::to_wire_scale(once), once);
        prop_assert!((once - amount).abs() <= Decimal::new(5, 3));
    }

    #[test]
    fn prop_access_token_skew(expires_in in 31i64..100_000, elapsed in 0i64..200_000) {
        let issued = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let token = Token::from_grant(grant(expires_in, None), issued);
        let state = token.state(issued + Duration::seconds(elapsed));

        if elapsed < expires_in - TOKEN_EXPIRY_SKEW_SECONDS {
            prop_assert_eq!(state, TokenState::Valid);
        } else {
            prop_assert_eq!(state, TokenState::Expired);
        }
    }

    #[test]
    fn prop_refresh_window(
        expires_in in 31i64..3_600,
        extra in 1i64..10_000,
        elapsed in 0i64..20_000,
    ) {
        let refresh_in = expires_in + extra;
        let issued = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let token = Token::from_grant(grant(expires_in, Some(refresh_in)), issued);
        let state = token.state(issued + Duration::seconds(elapsed));

        let expected = if elapsed < expires_in - TOKEN_EXPIRY_SKEW_SECONDS {
            TokenState::Valid
        } else if elapsed < refresh_in - TOKEN_EXPIRY_SKEW_SECONDS {
            TokenState::NearExpiry
        } else {
            TokenState::Expired
        };
        prop_assert_eq!(state, expected);
    }

    #[test]
    fn prop_listing_order(items in prop::collection::vec(boleto_strategy(), 0..40)) {
        let mut boletos: Vec<Boleto> = items
            .iter()
            .enumerate()
            .map(|(i, (status, due))| boleto(i, status.clone(), *due))
            .collect();
        order_listing(&mut boletos);
        prop_assert_eq!(boletos.len(), items.len());

        for pair in boletos.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            // open never follows closed
            prop_assert!(a.status.is_open() || !b.status.is_open());
            if a.status.is_open() == b.status.is_open() {
                match (a.due_date, b.due_date) {
                    (Some(x), Some(y)) => {
                        prop_assert!(x <= y);
                        if x == y {
                            let (ia, ib): (usize, usize) =
                                (a.our_number.parse().unwrap(), b.our_number.parse().unwrap());
                            prop_assert!(ia < ib, "sort must be stable");
                        }
                    }
                    (None, Some(_)) => prop_assert!(false, "undated before dated"),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn prop_discount_tiers_keep_order(values in prop::collection::vec(amount_strategy(), 1..=3)) {
        let cmd = InstructionCommand::change_discount("123456", &values).unwrap();
        let fields = [
            InstructionField::Discount1,
            InstructionField::Discount2,
            InstructionField::Discount3,
        ];
        for (value, field) in values.iter().zip(fields) {
            prop_assert_eq!(cmd.get(field), Some(&InstructionValue::Amount(*value)));
        }
        prop_assert!(cmd.check().is_ok());
    }

    #[test]
    fn prop_status_parse_ignores_case(
        raw in prop_oneof![
            Just("EM_ABERTO"), Just("Em Aberto"), Just("pendente"),
            Just("LIQUIDADO"), Just("baixado"), Just("Protestado")
        ]
    ) {
        prop_assert_eq!(
            BoletoStatus::parse(raw),
            BoletoStatus::parse(&raw.to_lowercase())
        );
        prop_assert!(!matches!(BoletoStatus::parse(raw), BoletoStatus::Other(_)));
    }
}

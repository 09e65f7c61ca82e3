//! Sponsorship Pricing
//!
//! Fixed price table per sponsorship mode. Amounts are computed once, when the
//! subject is loaded, and never re-derived downstream.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::DogSize;

/// Specific-dog sponsorship: one-time, five weeks
pub const SPECIFIC_PRICE: Decimal = dec!(59.99);
pub const SIZED_SMALL_PRICE: Decimal = dec!(9.99);
pub const SIZED_MEDIUM_PRICE: Decimal = dec!(15.99);
/// Large, unknown and unrecognised sizes all land on the top tier
pub const SIZED_LARGE_PRICE: Decimal = dec!(20.99);
pub const RANDOM_PRICE: Decimal = dec!(9.90);
/// Weekly fee used when an adoption carries none, or a zero fee
pub const DEFAULT_WEEKLY_FEE: Decimal = dec!(9.90);

pub const SPECIFIC_DURATION: &str = "5 weeks";
pub const WEEKLY_DURATION: &str = "per week";

/// Inputs the price depends on, per mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PricingBasis {
    Specific,
    Sized(Option<DogSize>),
    Random,
    Renewal {
        weekly_fee: Option<Decimal>,
        weeks: u32,
    },
}

/// Resolved price and the duration it covers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub amount: Decimal,
    pub duration_label: String,
}

impl Quote {
    /// Two-decimal currency display, e.g. `$29.70`
    pub fn display_amount(&self) -> String {
        format!("${:.2}", self.amount.round_dp(2))
    }

    /// Amount in integer cents
    pub fn amount_cents(&self) -> i64 {
        use rust_decimal::prelude::ToPrimitive;
        (self.amount.round_dp(2) * dec!(100)).to_i64().unwrap_or(0)
    }
}

/// Resolve the price table entry for a basis
///
/// Returns `None` when a renewal total does not fit in a `Decimal`.
pub fn resolve(basis: &PricingBasis) -> Option<Quote> {
    let quote = match basis {
        PricingBasis::Specific => Quote {
            amount: SPECIFIC_PRICE,
            duration_label: SPECIFIC_DURATION.into(),
        },
        PricingBasis::Sized(size) => {
            let amount = match size {
                Some(DogSize::Small) => SIZED_SMALL_PRICE,
                Some(DogSize::Medium) => SIZED_MEDIUM_PRICE,
                _ => SIZED_LARGE_PRICE,
            };
            Quote {
                amount,
                duration_label: WEEKLY_DURATION.into(),
            }
        }
        PricingBasis::Random => Quote {
            amount: RANDOM_PRICE,
            duration_label: WEEKLY_DURATION.into(),
        },
        PricingBasis::Renewal { weekly_fee, weeks } => {
            let fee = weekly_fee
                .filter(|fee| !fee.is_zero())
                .unwrap_or(DEFAULT_WEEKLY_FEE);
            Quote {
                amount: fee.checked_mul(Decimal::from(*weeks))?,
                duration_label: weeks_label(*weeks),
            }
        }
    };
    Some(quote)
}

/// "1 week", "3 weeks"
pub fn weeks_label(weeks: u32) -> String {
    if weeks == 1 {
        "1 week".into()
    } else {
        format!("{weeks} weeks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_price() {
        let quote = resolve(&PricingBasis::Specific).unwrap();
        assert_eq!(quote.amount, dec!(59.99));
        assert_eq!(quote.duration_label, "5 weeks");
    }

    #[test]
    fn test_sized_tiers() {
        let small = resolve(&PricingBasis::Sized(Some(DogSize::Small))).unwrap();
        let medium = resolve(&PricingBasis::Sized(Some(DogSize::Medium))).unwrap();
        let large = resolve(&PricingBasis::Sized(Some(DogSize::Large))).unwrap();
        let odd = resolve(&PricingBasis::Sized(Some(DogSize::Other("XL".into())))).unwrap();
        let unknown = resolve(&PricingBasis::Sized(None)).unwrap();

        assert_eq!(small.amount, dec!(9.99));
        assert_eq!(medium.amount, dec!(15.99));
        assert_eq!(large.amount, dec!(20.99));
        assert_eq!(odd.amount, dec!(20.99));
        assert_eq!(unknown.amount, dec!(20.99));
        assert_eq!(medium.duration_label, "per week");
    }

    #[test]
    fn test_random_price() {
        let quote = resolve(&PricingBasis::Random).unwrap();
        assert_eq!(quote.amount, dec!(9.90));
        assert_eq!(quote.duration_label, "per week");
    }

    #[test]
    fn test_renewal_multiplies_weekly_fee() {
        let quote = resolve(&PricingBasis::Renewal {
            weekly_fee: Some(dec!(9.90)),
            weeks: 3,
        })
        .unwrap();
        assert_eq!(quote.amount, dec!(29.70));
        assert_eq!(quote.duration_label, "3 weeks");
        assert_eq!(quote.display_amount(), "$29.70");

        let quote = resolve(&PricingBasis::Renewal {
            weekly_fee: Some(dec!(12.00)),
            weeks: 2,
        })
        .unwrap();
        assert_eq!(quote.amount, dec!(24.00));
        assert_eq!(quote.duration_label, "2 weeks");
    }

    #[test]
    fn test_renewal_defaults_fee_and_singular_label() {
        let quote = resolve(&PricingBasis::Renewal {
            weekly_fee: None,
            weeks: 1,
        })
        .unwrap();
        assert_eq!(quote.amount, dec!(9.90));
        assert_eq!(quote.duration_label, "1 week");
    }

    #[test]
    fn test_renewal_zero_fee_uses_default() {
        let quote = resolve(&PricingBasis::Renewal {
            weekly_fee: Some(Decimal::ZERO),
            weeks: 2,
        })
        .unwrap();
        assert_eq!(quote.amount, dec!(19.80));
    }

    #[test]
    fn test_renewal_overflow_is_unpriced() {
        let quote = resolve(&PricingBasis::Renewal {
            weekly_fee: Some(Decimal::MAX),
            weeks: u32::MAX,
        });
        assert!(quote.is_none());
    }

    #[test]
    fn test_amount_cents() {
        let quote = resolve(&PricingBasis::Specific).unwrap();
        assert_eq!(quote.amount_cents(), 5999);
        assert_eq!(quote.display_amount(), "$59.99");
    }
}

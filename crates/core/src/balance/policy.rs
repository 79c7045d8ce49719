//! Fee and tax policy.
//!
//! Pure, deterministic functions of a project snapshot. Amounts are rounded
//! to two decimal places with Banker's Rounding (`MidpointNearestEven`);
//! nothing here touches the store.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Registered account classification of a project owner.
///
/// Governs whether income-tax withholding applies to the project's pledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// An individual; IRRF withholding applies.
    NaturalPerson,
    /// A registered company; no IRRF withholding.
    LegalEntity,
}

/// Fee and tax policy for project funding.
///
/// All functions return non-negative magnitudes except `chargeback_amount`,
/// which is already signed for posting; callers negate fee/tax magnitudes
/// when building debit entries.
pub struct FeePolicy;

impl FeePolicy {
    /// Monetary scale: two decimal places.
    const SCALE: u32 = 2;

    /// Platform service fee on a successful project's paid pledges.
    ///
    /// `paid_pledged × rate`, rounded with Banker's Rounding. Always ≥ 0 for
    /// non-negative inputs.
    #[must_use]
    pub fn service_fee(paid_pledged: Decimal, rate: Decimal) -> Decimal {
        Self::round(paid_pledged * rate)
    }

    /// Platform fee on a single contribution's value.
    ///
    /// Used for contributions confirmed after their project finished.
    #[must_use]
    pub fn contribution_fee(value: Decimal, rate: Decimal) -> Decimal {
        Self::round(value * rate)
    }

    /// The signed amount reversing a charged-back contribution.
    ///
    /// The owner had received the contribution net of the platform fee, so
    /// the reversal is `-(value - contribution_fee)`. Strictly negative for
    /// positive values and rates below 1.
    #[must_use]
    pub fn chargeback_amount(value: Decimal, rate: Decimal) -> Decimal {
        -(value - Self::contribution_fee(value, rate))
    }

    /// Income-tax withholding for a project owner.
    ///
    /// Returns the declared withholding only for natural-person owners with a
    /// positive amount; legal entities (and zero withholdings) post no entry.
    #[must_use]
    pub fn irrf_tax(owner_account_type: AccountType, declared_tax: Decimal) -> Option<Decimal> {
        match owner_account_type {
            AccountType::NaturalPerson if declared_tax > Decimal::ZERO => Some(declared_tax),
            AccountType::NaturalPerson | AccountType::LegalEntity => None,
        }
    }

    /// Rounds a policy amount to the monetary scale using Banker's Rounding.
    #[must_use]
    pub fn round(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointNearestEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_service_fee() {
        assert_eq!(FeePolicy::service_fee(dec!(200), dec!(0.13)), dec!(26.00));
        assert_eq!(FeePolicy::service_fee(dec!(0), dec!(0.13)), dec!(0.00));
    }

    #[test]
    fn test_service_fee_bankers_rounding() {
        // 15.25 * 0.1 = 1.525 -> nearest even at 2 dp is 1.52
        assert_eq!(FeePolicy::service_fee(dec!(15.25), dec!(0.1)), dec!(1.52));
        // 15.75 * 0.1 = 1.575 -> nearest even at 2 dp is 1.58
        assert_eq!(FeePolicy::service_fee(dec!(15.75), dec!(0.1)), dec!(1.58));
    }

    #[test]
    fn test_contribution_fee() {
        assert_eq!(FeePolicy::contribution_fee(dec!(50), dec!(0.13)), dec!(6.50));
    }

    #[test]
    fn test_chargeback_amount_is_net_reversal() {
        // Owner received 200 - 26 = 174; the chargeback takes it back.
        assert_eq!(
            FeePolicy::chargeback_amount(dec!(200), dec!(0.13)),
            dec!(-174.00)
        );
    }

    #[test]
    fn test_chargeback_amount_zero_value() {
        assert_eq!(FeePolicy::chargeback_amount(dec!(0), dec!(0.13)), dec!(0.00));
    }

    #[test]
    fn test_irrf_tax_natural_person() {
        assert_eq!(
            FeePolicy::irrf_tax(AccountType::NaturalPerson, dec!(4.60)),
            Some(dec!(4.60))
        );
    }

    #[test]
    fn test_irrf_tax_legal_entity_never_applies() {
        assert_eq!(FeePolicy::irrf_tax(AccountType::LegalEntity, dec!(4.60)), None);
    }

    #[test]
    fn test_irrf_tax_zero_withholding_posts_nothing() {
        assert_eq!(FeePolicy::irrf_tax(AccountType::NaturalPerson, dec!(0)), None);
    }
}

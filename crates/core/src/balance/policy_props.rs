//! Property-based tests for the fee/tax policy and posting planners.
//!
//! - Fee bounds: fees never exceed the principal they are charged on
//! - Chargeback complement: fee + reversed net = principal, exactly
//! - Reversal involution: expiring an expiration restores the amount
//! - Plan validity: every planner output passes entry validation

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use catarse_shared::types::{
    BalanceTransactionId, ContributionId, PaymentId, ProjectId, UserId,
};

use super::entry::BalanceEntry;
use super::event::BalanceEvent;
use super::policy::{AccountType, FeePolicy};
use super::posting::{ContributionSnapshot, PaymentSnapshot, PostingPlanner, ProjectSnapshot};
use super::validation::{validate_new_entries, validate_new_entry};

/// Strategy for monetary principals (1.00 to 100,000.00).
fn principal() -> impl Strategy<Value = Decimal> {
    (100i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for platform fee rates (0.01 to 0.30).
fn fee_rate() -> impl Strategy<Value = Decimal> {
    (1i64..=30i64).prop_map(|pct| Decimal::new(pct, 2))
}

/// Strategy for owner account types.
fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::NaturalPerson),
        Just(AccountType::LegalEntity),
    ]
}

fn make_project(
    paid_pledged: Decimal,
    rate: Decimal,
    irrf_tax: Decimal,
    owner_account_type: AccountType,
) -> ProjectSnapshot {
    ProjectSnapshot {
        id: ProjectId::new(),
        owner_id: UserId::new(),
        owner_account_type,
        paid_pledged,
        service_fee_rate: rate,
        irrf_tax,
        successfully_finished: true,
    }
}

fn make_contribution(project: &ProjectSnapshot, value: Decimal) -> ContributionSnapshot {
    ContributionSnapshot {
        id: ContributionId::new(),
        project_id: project.id,
        value,
        confirmed: true,
        balance_refunded: false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Fee bounds
    // =========================================================================

    /// *For any* principal and rate below 1, the service fee is non-negative
    /// and strictly smaller than the principal.
    #[test]
    fn prop_service_fee_bounded(paid in principal(), rate in fee_rate()) {
        let fee = FeePolicy::service_fee(paid, rate);
        prop_assert!(fee >= Decimal::ZERO);
        prop_assert!(fee < paid, "fee {fee} should stay below principal {paid}");
    }

    /// *For any* contribution value and rate, the contribution fee matches the
    /// service fee computation: the two share one rounding rule.
    #[test]
    fn prop_contribution_fee_matches_service_fee(value in principal(), rate in fee_rate()) {
        prop_assert_eq!(
            FeePolicy::contribution_fee(value, rate),
            FeePolicy::service_fee(value, rate)
        );
    }

    // =========================================================================
    // Chargeback complement
    // =========================================================================

    /// *For any* contribution, the fee plus the reversed net amount equals the
    /// contribution value exactly (the rounding applies once, to the fee).
    #[test]
    fn prop_chargeback_complements_fee(value in principal(), rate in fee_rate()) {
        let fee = FeePolicy::contribution_fee(value, rate);
        let chargeback = FeePolicy::chargeback_amount(value, rate);

        prop_assert!(chargeback < Decimal::ZERO);
        prop_assert_eq!(fee + (-chargeback), value);
    }

    // =========================================================================
    // Reversal involution
    // =========================================================================

    /// *For any* refund entry, expiring it negates the amount, and negating the
    /// reversal restores the original amount with all references intact.
    #[test]
    fn prop_expiration_reversal_involution(value in principal()) {
        let original = BalanceEntry {
            id: BalanceTransactionId::new(),
            project_id: Some(ProjectId::new()),
            contribution_id: Some(ContributionId::new()),
            user_id: UserId::new(),
            event: BalanceEvent::ContributionRefund,
            amount: value,
            created_at: Utc::now(),
        };

        let reversal = PostingPlanner::expiration_entry(&original);
        prop_assert_eq!(reversal.amount, -original.amount);
        prop_assert_eq!(-reversal.amount, original.amount);
        prop_assert_eq!(reversal.project_id, original.project_id);
        prop_assert_eq!(reversal.contribution_id, original.contribution_id);
        prop_assert_eq!(reversal.user_id, original.user_id);
    }

    // =========================================================================
    // Plan validity
    // =========================================================================

    /// *For any* successfully finished project, the success plan passes entry
    /// validation and posts the IRRF entry only for natural-person owners.
    #[test]
    fn prop_project_success_plan_validates(
        paid in principal(),
        rate in fee_rate(),
        irrf_cents in 1i64..100_000i64,
        owner in account_type(),
    ) {
        let irrf = Decimal::new(irrf_cents, 2);
        let project = make_project(paid, rate, irrf, owner);

        let entries = PostingPlanner::project_success_entries(&project).unwrap();
        prop_assert!(validate_new_entries(&entries).is_ok());

        let has_irrf = entries.iter().any(|e| e.event == BalanceEvent::IrrfTaxProject);
        prop_assert_eq!(has_irrf, owner == AccountType::NaturalPerson);
    }

    /// *For any* confirmed contribution, the late-confirmation plan passes
    /// entry validation and nets to value minus fee.
    #[test]
    fn prop_late_confirmation_plan_validates(value in principal(), rate in fee_rate()) {
        let project = make_project(value, rate, Decimal::ZERO, AccountType::LegalEntity);
        let contribution = make_contribution(&project, value);

        let entries =
            PostingPlanner::late_confirmation_entries(&project, &contribution).unwrap();
        prop_assert!(validate_new_entries(&entries).is_ok());

        let net: Decimal = entries.iter().map(|e| e.amount).sum();
        prop_assert_eq!(net, value - FeePolicy::contribution_fee(value, rate));
    }

    /// *For any* charged-back payment, the chargeback entry passes validation.
    #[test]
    fn prop_chargeback_entry_validates(value in principal(), rate in fee_rate()) {
        let project = make_project(value, rate, Decimal::ZERO, AccountType::LegalEntity);
        let contribution = make_contribution(&project, value);
        let payment = PaymentSnapshot {
            id: PaymentId::new(),
            contribution_id: contribution.id,
            charged_back: true,
        };

        let entry = PostingPlanner::chargeback_entry(&project, &contribution, &payment).unwrap();
        prop_assert!(validate_new_entry(&entry).is_ok());
    }

    /// *For any* confirmed, unrefunded contribution, the refund entry passes
    /// validation and credits the full value.
    #[test]
    fn prop_refund_entry_validates(value in principal(), rate in fee_rate()) {
        let project = make_project(value, rate, Decimal::ZERO, AccountType::LegalEntity);
        let contribution = make_contribution(&project, value);

        let entry = PostingPlanner::refund_entry(&project, &contribution).unwrap();
        prop_assert!(validate_new_entry(&entry).is_ok());
        prop_assert_eq!(entry.amount, value);
    }
}

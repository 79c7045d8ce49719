//! Posting planners.
//!
//! Pure functions from collaborator snapshots to the ledger entries a
//! business operation must insert. Planners check snapshot-level
//! preconditions and compute amounts via [`FeePolicy`]; idempotency guards
//! and persistence stay in the database layer. A `None` return means a
//! precondition is not met and nothing should be posted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catarse_shared::types::{ContributionId, PaymentId, ProjectId, UserId};

use super::entry::{BalanceEntry, NewBalanceEntry};
use super::event::BalanceEvent;
use super::policy::{AccountType, FeePolicy};

/// What the engine reads from a Project before posting.
///
/// Snapshots are taken before the transactional section begins; the engine
/// never mutates the underlying record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// The project.
    pub id: ProjectId,
    /// The project owner: the balance holder all project postings target.
    pub owner_id: UserId,
    /// Owner's registered account classification.
    pub owner_account_type: AccountType,
    /// Aggregate value of paid pledges.
    pub paid_pledged: Decimal,
    /// Platform service fee rate (e.g. 0.13).
    pub service_fee_rate: Decimal,
    /// Pre-computed income-tax withholding for this project.
    pub irrf_tax: Decimal,
    /// True once the project finished in a successful state.
    pub successfully_finished: bool,
}

/// What the engine reads from a Contribution before posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionSnapshot {
    /// The contribution.
    pub id: ContributionId,
    /// The project the contribution belongs to.
    pub project_id: ProjectId,
    /// Pledged value.
    pub value: Decimal,
    /// True once payment was confirmed.
    pub confirmed: bool,
    /// Denormalized marker: the refund has already been posted to the ledger.
    pub balance_refunded: bool,
}

/// What the engine reads from a Payment before posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    /// The payment.
    pub id: PaymentId,
    /// The contribution this payment settles.
    pub contribution_id: ContributionId,
    /// True once the gateway reported a chargeback.
    pub charged_back: bool,
}

/// Builds the ledger entries each posting operation inserts.
///
/// This planner contains pure business logic with no database dependencies;
/// the database layer persists its output atomically.
pub struct PostingPlanner;

impl PostingPlanner {
    /// Entries posted when a project finishes successfully.
    ///
    /// The owner is credited the paid pledges and debited the platform
    /// service fee; natural-person owners are additionally debited the IRRF
    /// withholding. Returns `None` unless the project is successfully
    /// finished.
    #[must_use]
    pub fn project_success_entries(project: &ProjectSnapshot) -> Option<Vec<NewBalanceEntry>> {
        if !project.successfully_finished {
            return None;
        }

        let mut entries = vec![
            NewBalanceEntry::for_project(
                BalanceEvent::SuccessfulProjectPledged,
                project.id,
                project.owner_id,
                project.paid_pledged,
            ),
            NewBalanceEntry::for_project(
                BalanceEvent::CatarseProjectServiceFee,
                project.id,
                project.owner_id,
                -FeePolicy::service_fee(project.paid_pledged, project.service_fee_rate),
            ),
        ];

        if let Some(tax) = FeePolicy::irrf_tax(project.owner_account_type, project.irrf_tax) {
            entries.push(NewBalanceEntry::for_project(
                BalanceEvent::IrrfTaxProject,
                project.id,
                project.owner_id,
                -tax,
            ));
        }

        Some(entries)
    }

    /// Entries posted when a contribution is confirmed after its project
    /// already finished.
    ///
    /// The owner is credited the contribution value and debited the platform
    /// fee on it. Returns `None` unless the contribution belongs to the
    /// project and is confirmed.
    #[must_use]
    pub fn late_confirmation_entries(
        project: &ProjectSnapshot,
        contribution: &ContributionSnapshot,
    ) -> Option<Vec<NewBalanceEntry>> {
        if contribution.project_id != project.id || !contribution.confirmed {
            return None;
        }

        Some(vec![
            NewBalanceEntry::for_contribution(
                BalanceEvent::ProjectContributionConfirmedAfterFinished,
                project.id,
                contribution.id,
                project.owner_id,
                contribution.value,
            ),
            NewBalanceEntry::for_contribution(
                BalanceEvent::CatarseContributionFee,
                project.id,
                contribution.id,
                project.owner_id,
                -FeePolicy::contribution_fee(contribution.value, project.service_fee_rate),
            ),
        ])
    }

    /// Entry reversing a charged-back contribution.
    ///
    /// The owner had received the contribution net of the platform fee; the
    /// chargeback debits that net amount. Returns `None` unless the payment
    /// settles the contribution, the contribution belongs to the project,
    /// and the gateway reported a chargeback.
    #[must_use]
    pub fn chargeback_entry(
        project: &ProjectSnapshot,
        contribution: &ContributionSnapshot,
        payment: &PaymentSnapshot,
    ) -> Option<NewBalanceEntry> {
        if payment.contribution_id != contribution.id
            || contribution.project_id != project.id
            || !payment.charged_back
        {
            return None;
        }

        Some(NewBalanceEntry::for_contribution(
            BalanceEvent::ContributionChargedback,
            project.id,
            contribution.id,
            project.owner_id,
            FeePolicy::chargeback_amount(contribution.value, project.service_fee_rate),
        ))
    }

    /// Entry crediting a refunded contribution back onto the balance.
    ///
    /// Returns `None` unless the contribution belongs to the project, is
    /// confirmed, and has not already been refunded on balance.
    #[must_use]
    pub fn refund_entry(
        project: &ProjectSnapshot,
        contribution: &ContributionSnapshot,
    ) -> Option<NewBalanceEntry> {
        if contribution.project_id != project.id
            || !contribution.confirmed
            || contribution.balance_refunded
        {
            return None;
        }

        Some(NewBalanceEntry::for_contribution(
            BalanceEvent::ContributionRefund,
            project.id,
            contribution.id,
            project.owner_id,
            contribution.value,
        ))
    }

    /// The reversal posted when a refund credit expires.
    ///
    /// Negates the original amount and copies its subject references.
    /// Eligibility is checked separately via [`super::expiration::can_expire`].
    #[must_use]
    pub fn expiration_entry(original: &BalanceEntry) -> NewBalanceEntry {
        NewBalanceEntry {
            project_id: original.project_id,
            contribution_id: original.contribution_id,
            user_id: original.user_id,
            event: BalanceEvent::BalanceExpired,
            amount: -original.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use catarse_shared::types::BalanceTransactionId;

    fn finished_project(account_type: AccountType) -> ProjectSnapshot {
        ProjectSnapshot {
            id: ProjectId::new(),
            owner_id: UserId::new(),
            owner_account_type: account_type,
            paid_pledged: dec!(200),
            service_fee_rate: dec!(0.13),
            irrf_tax: dec!(4.60),
            successfully_finished: true,
        }
    }

    fn confirmed_contribution(project: &ProjectSnapshot, value: Decimal) -> ContributionSnapshot {
        ContributionSnapshot {
            id: ContributionId::new(),
            project_id: project.id,
            value,
            confirmed: true,
            balance_refunded: false,
        }
    }

    #[test]
    fn test_project_success_natural_person_posts_three_entries() {
        let project = finished_project(AccountType::NaturalPerson);
        let entries = PostingPlanner::project_success_entries(&project).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].event, BalanceEvent::SuccessfulProjectPledged);
        assert_eq!(entries[0].amount, dec!(200));
        assert_eq!(entries[1].event, BalanceEvent::CatarseProjectServiceFee);
        assert_eq!(entries[1].amount, dec!(-26.00));
        assert_eq!(entries[2].event, BalanceEvent::IrrfTaxProject);
        assert_eq!(entries[2].amount, dec!(-4.60));
        assert!(entries.iter().all(|e| e.user_id == project.owner_id));
        assert!(entries.iter().all(|e| e.project_id == Some(project.id)));
    }

    #[test]
    fn test_project_success_legal_entity_skips_irrf() {
        let project = finished_project(AccountType::LegalEntity);
        let entries = PostingPlanner::project_success_entries(&project).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.event != BalanceEvent::IrrfTaxProject));
    }

    #[test]
    fn test_project_success_requires_finished_state() {
        let mut project = finished_project(AccountType::NaturalPerson);
        project.successfully_finished = false;
        assert!(PostingPlanner::project_success_entries(&project).is_none());
    }

    #[test]
    fn test_late_confirmation_entries() {
        let project = finished_project(AccountType::NaturalPerson);
        let contribution = confirmed_contribution(&project, dec!(50));
        let entries =
            PostingPlanner::late_confirmation_entries(&project, &contribution).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].event,
            BalanceEvent::ProjectContributionConfirmedAfterFinished
        );
        assert_eq!(entries[0].amount, dec!(50));
        assert_eq!(entries[1].event, BalanceEvent::CatarseContributionFee);
        assert_eq!(entries[1].amount, dec!(-6.50));
        assert!(entries
            .iter()
            .all(|e| e.contribution_id == Some(contribution.id)));
    }

    #[test]
    fn test_late_confirmation_rejects_unconfirmed() {
        let project = finished_project(AccountType::NaturalPerson);
        let mut contribution = confirmed_contribution(&project, dec!(50));
        contribution.confirmed = false;
        assert!(PostingPlanner::late_confirmation_entries(&project, &contribution).is_none());
    }

    #[test]
    fn test_late_confirmation_rejects_foreign_contribution() {
        let project = finished_project(AccountType::NaturalPerson);
        let mut contribution = confirmed_contribution(&project, dec!(50));
        contribution.project_id = ProjectId::new();
        assert!(PostingPlanner::late_confirmation_entries(&project, &contribution).is_none());
    }

    #[test]
    fn test_chargeback_entry_reverses_net_amount() {
        let project = finished_project(AccountType::NaturalPerson);
        let contribution = confirmed_contribution(&project, dec!(200));
        let payment = PaymentSnapshot {
            id: PaymentId::new(),
            contribution_id: contribution.id,
            charged_back: true,
        };

        let entry = PostingPlanner::chargeback_entry(&project, &contribution, &payment).unwrap();
        assert_eq!(entry.event, BalanceEvent::ContributionChargedback);
        assert_eq!(entry.amount, dec!(-174.00));
        assert_eq!(entry.user_id, project.owner_id);
    }

    #[test]
    fn test_chargeback_requires_charged_back_payment() {
        let project = finished_project(AccountType::NaturalPerson);
        let contribution = confirmed_contribution(&project, dec!(200));
        let payment = PaymentSnapshot {
            id: PaymentId::new(),
            contribution_id: contribution.id,
            charged_back: false,
        };
        assert!(PostingPlanner::chargeback_entry(&project, &contribution, &payment).is_none());
    }

    #[test]
    fn test_refund_entry_credits_full_value() {
        let project = finished_project(AccountType::NaturalPerson);
        let contribution = confirmed_contribution(&project, dec!(50));

        let entry = PostingPlanner::refund_entry(&project, &contribution).unwrap();
        assert_eq!(entry.event, BalanceEvent::ContributionRefund);
        assert_eq!(entry.amount, dec!(50));
    }

    #[test]
    fn test_refund_entry_skips_already_refunded() {
        let project = finished_project(AccountType::NaturalPerson);
        let mut contribution = confirmed_contribution(&project, dec!(50));
        contribution.balance_refunded = true;
        assert!(PostingPlanner::refund_entry(&project, &contribution).is_none());
    }

    #[test]
    fn test_refund_entry_requires_confirmation() {
        let project = finished_project(AccountType::NaturalPerson);
        let mut contribution = confirmed_contribution(&project, dec!(50));
        contribution.confirmed = false;
        assert!(PostingPlanner::refund_entry(&project, &contribution).is_none());
    }

    #[test]
    fn test_expiration_entry_negates_and_copies_references() {
        let original = BalanceEntry {
            id: BalanceTransactionId::new(),
            project_id: Some(ProjectId::new()),
            contribution_id: Some(ContributionId::new()),
            user_id: UserId::new(),
            event: BalanceEvent::ContributionRefund,
            amount: dec!(50),
            created_at: Utc::now(),
        };

        let reversal = PostingPlanner::expiration_entry(&original);
        assert_eq!(reversal.event, BalanceEvent::BalanceExpired);
        assert_eq!(reversal.amount, dec!(-50));
        assert_eq!(reversal.project_id, original.project_id);
        assert_eq!(reversal.contribution_id, original.contribution_id);
        assert_eq!(reversal.user_id, original.user_id);
    }
}

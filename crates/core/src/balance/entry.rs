//! Balance ledger entry domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catarse_shared::types::{BalanceTransactionId, ContributionId, ProjectId, UserId};

use super::event::BalanceEvent;

/// A persisted balance ledger entry.
///
/// Entries are created exactly once and never updated or deleted; corrections
/// are modeled as new offsetting entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// Unique identifier for this entry.
    pub id: BalanceTransactionId,
    /// The funding campaign this entry concerns, if any.
    pub project_id: Option<ProjectId>,
    /// The pledge this entry concerns, if any.
    pub contribution_id: Option<ContributionId>,
    /// The balance holder credited or debited.
    pub user_id: UserId,
    /// The business fact this entry records.
    pub event: BalanceEvent,
    /// Signed amount: positive credits the balance, negative debits it.
    pub amount: Decimal,
    /// Immutable creation timestamp, used for aging.
    pub created_at: DateTime<Utc>,
}

impl BalanceEntry {
    /// Returns true if this entry credits the user's balance.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns the entry's age relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// A balance ledger entry waiting to be inserted.
///
/// The store assigns `id` and `created_at` at insertion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBalanceEntry {
    /// The funding campaign this entry concerns, if any.
    pub project_id: Option<ProjectId>,
    /// The pledge this entry concerns, if any.
    pub contribution_id: Option<ContributionId>,
    /// The balance holder credited or debited.
    pub user_id: UserId,
    /// The business fact this entry records.
    pub event: BalanceEvent,
    /// Signed amount: positive credits the balance, negative debits it.
    pub amount: Decimal,
}

impl NewBalanceEntry {
    /// Creates an entry scoped to a project.
    #[must_use]
    pub const fn for_project(
        event: BalanceEvent,
        project_id: ProjectId,
        user_id: UserId,
        amount: Decimal,
    ) -> Self {
        Self {
            project_id: Some(project_id),
            contribution_id: None,
            user_id,
            event,
            amount,
        }
    }

    /// Creates an entry scoped to a contribution within a project.
    #[must_use]
    pub const fn for_contribution(
        event: BalanceEvent,
        project_id: ProjectId,
        contribution_id: ContributionId,
        user_id: UserId,
        amount: Decimal,
    ) -> Self {
        Self {
            project_id: Some(project_id),
            contribution_id: Some(contribution_id),
            user_id,
            event,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn make_entry(amount: Decimal) -> BalanceEntry {
        BalanceEntry {
            id: BalanceTransactionId::new(),
            project_id: Some(ProjectId::new()),
            contribution_id: None,
            user_id: UserId::new(),
            event: BalanceEvent::SuccessfulProjectPledged,
            amount,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_credit() {
        assert!(make_entry(dec!(200)).is_credit());
        assert!(!make_entry(dec!(-26)).is_credit());
    }

    #[test]
    fn test_age() {
        let mut entry = make_entry(dec!(10));
        let now = Utc::now();
        entry.created_at = now - Duration::days(91);
        assert_eq!(entry.age(now), Duration::days(91));
    }

    #[test]
    fn test_for_project_sets_no_contribution() {
        let entry = NewBalanceEntry::for_project(
            BalanceEvent::SuccessfulProjectPledged,
            ProjectId::new(),
            UserId::new(),
            dec!(200),
        );
        assert!(entry.project_id.is_some());
        assert!(entry.contribution_id.is_none());
    }

    #[test]
    fn test_for_contribution_sets_both_references() {
        let entry = NewBalanceEntry::for_contribution(
            BalanceEvent::ContributionRefund,
            ProjectId::new(),
            ContributionId::new(),
            UserId::new(),
            dec!(50),
        );
        assert!(entry.project_id.is_some());
        assert!(entry.contribution_id.is_some());
    }
}

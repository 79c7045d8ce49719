//! Balance event kinds.
//!
//! Every ledger entry is tagged with the business fact it records. The set is
//! closed: the store rejects anything outside it.

use serde::{Deserialize, Serialize};

use catarse_shared::types::{ContributionId, ProjectId};

use super::error::BalanceError;

/// The business fact a balance ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceEvent {
    /// A finished, successful project had its paid pledges credited to the owner.
    SuccessfulProjectPledged,
    /// Platform service fee charged against a successful project's pledges.
    CatarseProjectServiceFee,
    /// Income-tax withholding on a natural-person owner's project.
    IrrfTaxProject,
    /// A contribution confirmed after its project had already finished.
    ProjectContributionConfirmedAfterFinished,
    /// Platform fee charged against a late-confirmed contribution.
    CatarseContributionFee,
    /// A payment was charged back; the net amount previously credited is reversed.
    ContributionChargedback,
    /// A confirmed contribution refunded onto the balance.
    ContributionRefund,
    /// An unclaimed refund credit reversed after the retention window.
    BalanceExpired,
    /// The balance holder requested a withdrawal.
    BalanceTransferRequest,
    /// The balance holder moved balance into a project.
    BalanceTransferProject,
}

/// Which side of the balance an event moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    /// Positive amount: the user's balance increases.
    Credit,
    /// Negative amount: the user's balance decreases.
    Debit,
}

/// The key an idempotency guard is scoped to.
///
/// Guards answer "has this event already been posted for this subject?";
/// the subject is the foreign reference the event is at-most-once per.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// Event posted at most once per project.
    Project(ProjectId),
    /// Event posted at most once per contribution.
    Contribution(ContributionId),
}

impl BalanceEvent {
    /// All event kinds, in wire order.
    pub const ALL: [Self; 10] = [
        Self::SuccessfulProjectPledged,
        Self::CatarseProjectServiceFee,
        Self::IrrfTaxProject,
        Self::ProjectContributionConfirmedAfterFinished,
        Self::CatarseContributionFee,
        Self::ContributionChargedback,
        Self::ContributionRefund,
        Self::BalanceExpired,
        Self::BalanceTransferRequest,
        Self::BalanceTransferProject,
    ];

    /// Returns the snake_case wire name of this event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuccessfulProjectPledged => "successful_project_pledged",
            Self::CatarseProjectServiceFee => "catarse_project_service_fee",
            Self::IrrfTaxProject => "irrf_tax_project",
            Self::ProjectContributionConfirmedAfterFinished => {
                "project_contribution_confirmed_after_finished"
            }
            Self::CatarseContributionFee => "catarse_contribution_fee",
            Self::ContributionChargedback => "contribution_chargedback",
            Self::ContributionRefund => "contribution_refund",
            Self::BalanceExpired => "balance_expired",
            Self::BalanceTransferRequest => "balance_transfer_request",
            Self::BalanceTransferProject => "balance_transfer_project",
        }
    }

    /// Returns the canonical sign of entries posted under this event.
    ///
    /// Pledge, late-confirmation principal, and refund entries credit the
    /// balance; fees, taxes, chargebacks, expirations, and transfers debit it.
    #[must_use]
    pub const fn sign(self) -> Sign {
        match self {
            Self::SuccessfulProjectPledged
            | Self::ProjectContributionConfirmedAfterFinished
            | Self::ContributionRefund => Sign::Credit,
            Self::CatarseProjectServiceFee
            | Self::IrrfTaxProject
            | Self::CatarseContributionFee
            | Self::ContributionChargedback
            | Self::BalanceExpired
            | Self::BalanceTransferRequest
            | Self::BalanceTransferProject => Sign::Debit,
        }
    }

    /// Returns true if entries under this event must reference a project.
    #[must_use]
    pub const fn requires_project_reference(self) -> bool {
        matches!(
            self,
            Self::SuccessfulProjectPledged
                | Self::CatarseProjectServiceFee
                | Self::IrrfTaxProject
                | Self::ProjectContributionConfirmedAfterFinished
                | Self::CatarseContributionFee
        )
    }

    /// Returns true if entries under this event must reference a contribution.
    #[must_use]
    pub const fn requires_contribution_reference(self) -> bool {
        matches!(
            self,
            Self::ProjectContributionConfirmedAfterFinished
                | Self::CatarseContributionFee
                | Self::ContributionChargedback
                | Self::ContributionRefund
                | Self::BalanceExpired
        )
    }
}

impl std::fmt::Display for BalanceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BalanceEvent {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| BalanceError::UnknownEvent(s.to_string()))
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => f.write_str("credit"),
            Self::Debit => f.write_str("debit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wire_names_round_trip() {
        for event in BalanceEvent::ALL {
            assert_eq!(BalanceEvent::from_str(event.as_str()).unwrap(), event);
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(matches!(
            BalanceEvent::from_str("balance_teleported"),
            Err(BalanceError::UnknownEvent(_))
        ));
        assert!(BalanceEvent::from_str("").is_err());
    }

    #[test]
    fn test_principal_events_credit() {
        assert_eq!(BalanceEvent::SuccessfulProjectPledged.sign(), Sign::Credit);
        assert_eq!(
            BalanceEvent::ProjectContributionConfirmedAfterFinished.sign(),
            Sign::Credit
        );
        assert_eq!(BalanceEvent::ContributionRefund.sign(), Sign::Credit);
    }

    #[test]
    fn test_fee_tax_and_reversal_events_debit() {
        assert_eq!(BalanceEvent::CatarseProjectServiceFee.sign(), Sign::Debit);
        assert_eq!(BalanceEvent::IrrfTaxProject.sign(), Sign::Debit);
        assert_eq!(BalanceEvent::CatarseContributionFee.sign(), Sign::Debit);
        assert_eq!(BalanceEvent::ContributionChargedback.sign(), Sign::Debit);
        assert_eq!(BalanceEvent::BalanceExpired.sign(), Sign::Debit);
    }

    #[test]
    fn test_project_scoped_events() {
        assert!(BalanceEvent::SuccessfulProjectPledged.requires_project_reference());
        assert!(BalanceEvent::CatarseProjectServiceFee.requires_project_reference());
        assert!(BalanceEvent::IrrfTaxProject.requires_project_reference());
        assert!(!BalanceEvent::BalanceTransferRequest.requires_project_reference());
    }

    #[test]
    fn test_contribution_scoped_events() {
        assert!(BalanceEvent::ContributionChargedback.requires_contribution_reference());
        assert!(BalanceEvent::ContributionRefund.requires_contribution_reference());
        assert!(BalanceEvent::BalanceExpired.requires_contribution_reference());
        assert!(!BalanceEvent::SuccessfulProjectPledged.requires_contribution_reference());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&BalanceEvent::CatarseProjectServiceFee).unwrap();
        assert_eq!(json, "\"catarse_project_service_fee\"");
    }
}

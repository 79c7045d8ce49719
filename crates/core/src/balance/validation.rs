//! Business rule validation for balance entries.

use rust_decimal::Decimal;

use super::entry::NewBalanceEntry;
use super::error::BalanceError;
use super::event::Sign;

/// Validates an entry before it is persisted.
///
/// Enforces the rules the store cannot express on its own:
/// - the amount is non-zero,
/// - the amount's sign matches the event's canonical sign,
/// - project- and contribution-scoped events carry their references.
///
/// # Errors
///
/// Returns a [`BalanceError`] describing the first violated rule.
pub fn validate_new_entry(entry: &NewBalanceEntry) -> Result<(), BalanceError> {
    if entry.amount.is_zero() {
        return Err(BalanceError::ZeroAmount);
    }

    let sign_ok = match entry.event.sign() {
        Sign::Credit => entry.amount > Decimal::ZERO,
        Sign::Debit => entry.amount < Decimal::ZERO,
    };
    if !sign_ok {
        return Err(BalanceError::SignViolation {
            event: entry.event,
            expected: entry.event.sign(),
            amount: entry.amount,
        });
    }

    if entry.event.requires_project_reference() && entry.project_id.is_none() {
        return Err(BalanceError::MissingProjectReference(entry.event));
    }

    if entry.event.requires_contribution_reference() && entry.contribution_id.is_none() {
        return Err(BalanceError::MissingContributionReference(entry.event));
    }

    Ok(())
}

/// Validates a batch of entries, failing on the first violation.
///
/// # Errors
///
/// Returns the first [`BalanceError`] found.
pub fn validate_new_entries(entries: &[NewBalanceEntry]) -> Result<(), BalanceError> {
    entries.iter().try_for_each(validate_new_entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use catarse_shared::types::{ContributionId, ProjectId, UserId};

    use crate::balance::event::BalanceEvent;

    fn make_entry(event: BalanceEvent, amount: Decimal) -> NewBalanceEntry {
        NewBalanceEntry {
            project_id: Some(ProjectId::new()),
            contribution_id: Some(ContributionId::new()),
            user_id: UserId::new(),
            event,
            amount,
        }
    }

    #[test]
    fn test_valid_credit_entry() {
        let entry = make_entry(BalanceEvent::SuccessfulProjectPledged, dec!(200));
        assert!(validate_new_entry(&entry).is_ok());
    }

    #[test]
    fn test_valid_debit_entry() {
        let entry = make_entry(BalanceEvent::CatarseProjectServiceFee, dec!(-26));
        assert!(validate_new_entry(&entry).is_ok());
    }

    #[test]
    fn test_zero_amount_rejected() {
        let entry = make_entry(BalanceEvent::ContributionRefund, dec!(0));
        assert!(matches!(
            validate_new_entry(&entry),
            Err(BalanceError::ZeroAmount)
        ));
    }

    #[test]
    fn test_positive_fee_rejected() {
        let entry = make_entry(BalanceEvent::CatarseProjectServiceFee, dec!(26));
        assert!(matches!(
            validate_new_entry(&entry),
            Err(BalanceError::SignViolation { .. })
        ));
    }

    #[test]
    fn test_negative_pledge_rejected() {
        let entry = make_entry(BalanceEvent::SuccessfulProjectPledged, dec!(-200));
        assert!(matches!(
            validate_new_entry(&entry),
            Err(BalanceError::SignViolation { .. })
        ));
    }

    #[test]
    fn test_missing_project_reference_rejected() {
        let mut entry = make_entry(BalanceEvent::IrrfTaxProject, dec!(-4.60));
        entry.project_id = None;
        assert!(matches!(
            validate_new_entry(&entry),
            Err(BalanceError::MissingProjectReference(
                BalanceEvent::IrrfTaxProject
            ))
        ));
    }

    #[test]
    fn test_missing_contribution_reference_rejected() {
        let mut entry = make_entry(BalanceEvent::ContributionChargedback, dec!(-174));
        entry.contribution_id = None;
        assert!(matches!(
            validate_new_entry(&entry),
            Err(BalanceError::MissingContributionReference(
                BalanceEvent::ContributionChargedback
            ))
        ));
    }

    #[test]
    fn test_transfer_entries_need_no_references() {
        let mut entry = make_entry(BalanceEvent::BalanceTransferRequest, dec!(-100));
        entry.project_id = None;
        entry.contribution_id = None;
        assert!(validate_new_entry(&entry).is_ok());
    }

    #[test]
    fn test_batch_fails_on_first_violation() {
        let entries = vec![
            make_entry(BalanceEvent::SuccessfulProjectPledged, dec!(200)),
            make_entry(BalanceEvent::CatarseProjectServiceFee, dec!(26)),
        ];
        assert!(matches!(
            validate_new_entries(&entries),
            Err(BalanceError::SignViolation { .. })
        ));
    }

    #[test]
    fn test_empty_batch_is_valid() {
        assert!(validate_new_entries(&[]).is_ok());
    }
}

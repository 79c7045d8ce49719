//! Balance error types for validation and event parsing.

use rust_decimal::Decimal;
use thiserror::Error;

use super::event::{BalanceEvent, Sign};

/// Errors that can occur while building or validating balance entries.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// Event name outside the closed set.
    #[error("Unknown balance event: {0}")]
    UnknownEvent(String),

    /// Entry amount cannot be zero.
    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    /// Entry amount does not match the event's canonical sign.
    #[error("{event} entries must post as a {expected}, got {amount}")]
    SignViolation {
        /// The event being posted.
        event: BalanceEvent,
        /// The sign the event requires.
        expected: Sign,
        /// The offending amount.
        amount: Decimal,
    },

    /// Project-scoped event posted without a project reference.
    #[error("{0} entries must reference a project")]
    MissingProjectReference(BalanceEvent),

    /// Contribution-scoped event posted without a contribution reference.
    #[error("{0} entries must reference a contribution")]
    MissingContributionReference(BalanceEvent),
}

impl BalanceError {
    /// Returns the error code for logs and API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEvent(_) => "UNKNOWN_EVENT",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::SignViolation { .. } => "SIGN_VIOLATION",
            Self::MissingProjectReference(_) => "MISSING_PROJECT_REFERENCE",
            Self::MissingContributionReference(_) => "MISSING_CONTRIBUTION_REFERENCE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BalanceError::UnknownEvent("nope".to_string()).error_code(),
            "UNKNOWN_EVENT"
        );
        assert_eq!(BalanceError::ZeroAmount.error_code(), "ZERO_AMOUNT");
        assert_eq!(
            BalanceError::SignViolation {
                event: BalanceEvent::CatarseProjectServiceFee,
                expected: Sign::Debit,
                amount: dec!(26),
            }
            .error_code(),
            "SIGN_VIOLATION"
        );
    }

    #[test]
    fn test_error_display() {
        let err = BalanceError::SignViolation {
            event: BalanceEvent::CatarseProjectServiceFee,
            expected: Sign::Debit,
            amount: dec!(26),
        };
        assert_eq!(
            err.to_string(),
            "catarse_project_service_fee entries must post as a debit, got 26"
        );

        let err = BalanceError::MissingContributionReference(BalanceEvent::ContributionRefund);
        assert_eq!(
            err.to_string(),
            "contribution_refund entries must reference a contribution"
        );
    }
}

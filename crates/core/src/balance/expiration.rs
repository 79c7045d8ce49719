//! Refund-credit expiration eligibility.
//!
//! A refund credit left unclaimed past the retention window is reversed,
//! unless a balance transfer intervened. The blocking check is scoped to the
//! user, not the originating entry: one transfer (or one prior expiration)
//! forecloses expiration for every refund credit the user holds.

use chrono::{DateTime, Duration, Utc};

use super::entry::BalanceEntry;
use super::event::BalanceEvent;

/// Days an unclaimed refund credit is retained before it may expire.
pub const EXPIRATION_WINDOW_DAYS: i64 = 90;

/// Events whose presence for a user forecloses expiration of their refunds.
pub const BLOCKING_EVENTS: [BalanceEvent; 3] = [
    BalanceEvent::BalanceTransferRequest,
    BalanceEvent::BalanceTransferProject,
    BalanceEvent::BalanceExpired,
];

/// Returns true if `entry` is eligible to expire at `now`.
///
/// Eligible means: the entry is a refund credit, it is strictly older than
/// [`EXPIRATION_WINDOW_DAYS`], and the user has no blocking event
/// (`user_has_blocking_event` is the store-side lookup over
/// [`BLOCKING_EVENTS`], keyed by user).
#[must_use]
pub fn can_expire(entry: &BalanceEntry, now: DateTime<Utc>, user_has_blocking_event: bool) -> bool {
    entry.event == BalanceEvent::ContributionRefund
        && entry.age(now) > Duration::days(EXPIRATION_WINDOW_DAYS)
        && !user_has_blocking_event
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use catarse_shared::types::{BalanceTransactionId, ContributionId, ProjectId, UserId};

    fn refund_entry_aged(days: i64, now: DateTime<Utc>) -> BalanceEntry {
        BalanceEntry {
            id: BalanceTransactionId::new(),
            project_id: Some(ProjectId::new()),
            contribution_id: Some(ContributionId::new()),
            user_id: UserId::new(),
            event: BalanceEvent::ContributionRefund,
            amount: dec!(50),
            created_at: now - Duration::days(days),
        }
    }

    #[test]
    fn test_refund_older_than_window_expires() {
        let now = Utc::now();
        assert!(can_expire(&refund_entry_aged(91, now), now, false));
    }

    #[test]
    fn test_recent_refund_does_not_expire() {
        let now = Utc::now();
        assert!(!can_expire(&refund_entry_aged(10, now), now, false));
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!can_expire(&refund_entry_aged(90, now), now, false));
    }

    #[test]
    fn test_transfer_event_blocks_every_refund_entry_of_the_user() {
        // The blocking lookup is keyed by user, not by the entry it logically
        // offsets: any blocking event for the user forecloses all their
        // refund expirations, however old the credits are.
        let now = Utc::now();
        assert!(!can_expire(&refund_entry_aged(91, now), now, true));
        assert!(!can_expire(&refund_entry_aged(400, now), now, true));
    }

    #[test]
    fn test_only_refund_entries_expire() {
        let now = Utc::now();
        let mut entry = refund_entry_aged(91, now);
        entry.event = BalanceEvent::SuccessfulProjectPledged;
        assert!(!can_expire(&entry, now, false));

        entry.event = BalanceEvent::BalanceExpired;
        assert!(!can_expire(&entry, now, false));
    }

    #[test]
    fn test_blocking_events_cover_transfers_and_expirations() {
        assert!(BLOCKING_EVENTS.contains(&BalanceEvent::BalanceTransferRequest));
        assert!(BLOCKING_EVENTS.contains(&BalanceEvent::BalanceTransferProject));
        assert!(BLOCKING_EVENTS.contains(&BalanceEvent::BalanceExpired));
    }
}

//! Balance transaction store and query facade.
//!
//! The ledger is append-only: this repository inserts entries and answers
//! the guard and facade queries the posting engine and surrounding
//! application need. Updates and deletes are rejected by the store itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use catarse_core::balance::{
    BalanceEntry, BalanceEvent, NewBalanceEntry, Subject, BLOCKING_EVENTS,
};
use catarse_shared::types::{BalanceTransactionId, ContributionId, ProjectId, UserId};

use crate::entities::{balance_transactions, sea_orm_active_enums};

impl From<balance_transactions::Model> for BalanceEntry {
    fn from(model: balance_transactions::Model) -> Self {
        Self {
            id: BalanceTransactionId::from_uuid(model.id),
            project_id: model.project_id.map(ProjectId::from_uuid),
            contribution_id: model.contribution_id.map(ContributionId::from_uuid),
            user_id: UserId::from_uuid(model.user_id),
            event: model.event.into(),
            amount: model.amount,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Repository for the balance ledger store.
#[derive(Debug, Clone)]
pub struct BalanceTransactionRepository {
    db: DatabaseConnection,
}

impl BalanceTransactionRepository {
    /// Creates a new balance transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<balance_transactions::Model>, DbErr> {
        balance_transactions::Entity::find_by_id(id).one(&self.db).await
    }

    /// Idempotency guard: has `event` already been posted for `subject`?
    ///
    /// One indexed lookup, no side effects. Every posting operation checks
    /// this before inserting; the store's partial unique indexes are the
    /// backstop for concurrent callers racing past it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn exists(&self, event: BalanceEvent, subject: Subject) -> Result<bool, DbErr> {
        let query = balance_transactions::Entity::find()
            .filter(balance_transactions::Column::Event.eq(sea_orm_active_enums::BalanceEvent::from(event)));

        let query = match subject {
            Subject::Project(project_id) => query
                .filter(balance_transactions::Column::ProjectId.eq(project_id.into_inner())),
            Subject::Contribution(contribution_id) => query.filter(
                balance_transactions::Column::ContributionId.eq(contribution_id.into_inner()),
            ),
        };

        Ok(query.limit(1).one(&self.db).await?.is_some())
    }

    /// Inserts a batch of entries within an open transaction.
    ///
    /// Assigns IDs (UUID v7) and creation timestamps; callers commit or roll
    /// back the transaction as one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails, including unique-index violations
    /// raised when a concurrent caller already posted a guarded event.
    pub async fn insert_all(
        &self,
        txn: &DatabaseTransaction,
        entries: &[NewBalanceEntry],
    ) -> Result<Vec<balance_transactions::Model>, DbErr> {
        let now = Utc::now().into();
        let mut inserted = Vec::with_capacity(entries.len());

        for entry in entries {
            let model = balance_transactions::ActiveModel {
                id: Set(Uuid::now_v7()),
                project_id: Set(entry.project_id.map(ProjectId::into_inner)),
                contribution_id: Set(entry.contribution_id.map(ContributionId::into_inner)),
                user_id: Set(entry.user_id.into_inner()),
                event: Set(entry.event.into()),
                amount: Set(entry.amount),
                created_at: Set(now),
            };
            inserted.push(model.insert(txn).await?);
        }

        Ok(inserted)
    }

    /// Query facade: has this contribution been refunded on the ledger?
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn refunded_on_ledger(&self, contribution_id: Uuid) -> Result<bool, DbErr> {
        self.exists(
            BalanceEvent::ContributionRefund,
            Subject::Contribution(ContributionId::from_uuid(contribution_id)),
        )
        .await
    }

    /// Returns true if the user has any expiration-blocking event
    /// (transfer request, transfer to project, or a prior expiration).
    ///
    /// The lookup is keyed by user, not by originating entry: one blocking
    /// event forecloses expiration for all of the user's refund credits.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_has_blocking_event(&self, user_id: Uuid) -> Result<bool, DbErr> {
        let blocking: Vec<sea_orm_active_enums::BalanceEvent> = BLOCKING_EVENTS
            .into_iter()
            .map(sea_orm_active_enums::BalanceEvent::from)
            .collect();

        Ok(balance_transactions::Entity::find()
            .filter(balance_transactions::Column::UserId.eq(user_id))
            .filter(balance_transactions::Column::Event.is_in(blocking))
            .limit(1)
            .one(&self.db)
            .await?
            .is_some())
    }

    /// Refund entries created at or before `cutoff`, oldest first.
    ///
    /// These are the candidates the expiration sweep examines; eligibility
    /// is decided per entry by the posting engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn expiration_candidates(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<balance_transactions::Model>, DbErr> {
        balance_transactions::Entity::find()
            .filter(
                balance_transactions::Column::Event
                    .eq(sea_orm_active_enums::BalanceEvent::ContributionRefund),
            )
            .filter(balance_transactions::Column::CreatedAt.lte(cutoff))
            .order_by_asc(balance_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Current balance of a user: the sum of their signed entry amounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_balance(&self, user_id: Uuid) -> Result<Decimal, DbErr> {
        let total: Option<Option<Decimal>> = balance_transactions::Entity::find()
            .select_only()
            .column_as(balance_transactions::Column::Amount.sum(), "total")
            .filter(balance_transactions::Column::UserId.eq(user_id))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// All entries for a user, newest first (balance statement).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<balance_transactions::Model>, DbErr> {
        balance_transactions::Entity::find()
            .filter(balance_transactions::Column::UserId.eq(user_id))
            .order_by_desc(balance_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}

//! The posting engine.
//!
//! Each operation translates one domain event into its ledger consequences,
//! exactly once per subject. Operations are idempotent under at-least-once
//! delivery: re-invocations and concurrent duplicates collapse to a no-op
//! result, never an error. Collaborator snapshots are read before the
//! transactional section begins; multi-row effects commit as one unit.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use catarse_core::balance::{
    can_expire, validate_new_entries, validate_new_entry, BalanceEntry, BalanceError,
    BalanceEvent, ContributionSnapshot, NewBalanceEntry, PaymentSnapshot, PostingPlanner,
    ProjectSnapshot, Subject, EXPIRATION_WINDOW_DAYS,
};
use catarse_shared::types::{ContributionId, PaymentId, ProjectId, UserId};

use crate::entities::{
    balance_transactions, contributions, payments, projects, sea_orm_active_enums, users,
};
use crate::repositories::balance::BalanceTransactionRepository;

/// Error types for posting operations.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// Project not found.
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    /// Project owner not found.
    #[error("Project owner not found: {0}")]
    OwnerNotFound(Uuid),

    /// Contribution not found.
    #[error("Contribution not found: {0}")]
    ContributionNotFound(Uuid),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(Uuid),

    /// Balance transaction not found.
    #[error("Balance transaction not found: {0}")]
    EntryNotFound(Uuid),

    /// An entry failed validation before persistence.
    #[error("Validation error: {0}")]
    Validation(#[from] BalanceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Returns true if the error is a unique-index violation.
///
/// Guarded events carry partial unique indexes; a concurrent caller racing
/// past the guard check fails here and the operation no-ops.
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// The posting engine: guards + policy + store, one transaction per posting.
#[derive(Debug, Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
    store: BalanceTransactionRepository,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let store = BalanceTransactionRepository::new(db.clone());
        Self { db, store }
    }

    /// Returns the underlying store and query facade.
    #[must_use]
    pub const fn store(&self) -> &BalanceTransactionRepository {
        &self.store
    }

    /// Posts the financial consequences of a successfully finished project.
    ///
    /// Credits the owner the paid pledges and debits the platform service
    /// fee (plus the IRRF withholding for natural-person owners) as one
    /// atomic unit. Returns `false` without posting when the project is not
    /// successfully finished or the event was already posted.
    ///
    /// # Errors
    ///
    /// Returns an error if the project or its owner does not exist, an entry
    /// fails validation, or the store fails.
    pub async fn post_project_success(&self, project_id: Uuid) -> Result<bool, PostingError> {
        let project = self.project_snapshot(project_id).await?;

        if self
            .store
            .exists(
                BalanceEvent::SuccessfulProjectPledged,
                Subject::Project(project.id),
            )
            .await?
        {
            debug!(%project_id, "project success already posted");
            return Ok(false);
        }

        let Some(entries) = PostingPlanner::project_success_entries(&project) else {
            debug!(%project_id, "project is not successfully finished");
            return Ok(false);
        };
        validate_new_entries(&entries)?;

        match self.insert_atomic(&entries).await? {
            Some(models) => {
                info!(%project_id, entries = models.len(), "posted project success");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Posts a contribution confirmed after its project already finished.
    ///
    /// Requires the project's success entry to exist (the money arrived
    /// late). Credits the owner the contribution value and debits the
    /// platform fee on it, atomically. Returns `false` without posting when
    /// a precondition fails or the event was already posted.
    ///
    /// # Errors
    ///
    /// Returns an error if the project, owner, or contribution does not
    /// exist, an entry fails validation, or the store fails.
    pub async fn post_late_confirmation(
        &self,
        project_id: Uuid,
        contribution_id: Uuid,
    ) -> Result<bool, PostingError> {
        let project = self.project_snapshot(project_id).await?;
        let contribution = contribution_snapshot(&self.contribution_model(contribution_id).await?);

        if !self
            .store
            .exists(
                BalanceEvent::SuccessfulProjectPledged,
                Subject::Project(project.id),
            )
            .await?
        {
            debug!(%project_id, "project has no success entry yet");
            return Ok(false);
        }

        if self
            .store
            .exists(
                BalanceEvent::ProjectContributionConfirmedAfterFinished,
                Subject::Contribution(contribution.id),
            )
            .await?
        {
            debug!(%contribution_id, "late confirmation already posted");
            return Ok(false);
        }

        let Some(entries) = PostingPlanner::late_confirmation_entries(&project, &contribution)
        else {
            debug!(%contribution_id, "contribution not eligible for late confirmation");
            return Ok(false);
        };
        validate_new_entries(&entries)?;

        match self.insert_atomic(&entries).await? {
            Some(models) => {
                info!(%project_id, %contribution_id, entries = models.len(), "posted late confirmation");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Posts the reversal of a charged-back payment.
    ///
    /// Requires the owning project's success entry to exist; debits the
    /// owner the net amount previously received for the contribution.
    /// Returns `false` without posting when a precondition fails or the
    /// event was already posted.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment, contribution, project, or owner does
    /// not exist, the entry fails validation, or the store fails.
    pub async fn post_chargeback(&self, payment_id: Uuid) -> Result<bool, PostingError> {
        let payment_model = payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await?
            .ok_or(PostingError::PaymentNotFound(payment_id))?;
        let contribution_model = self.contribution_model(payment_model.contribution_id).await?;
        let project = self.project_snapshot(contribution_model.project_id).await?;
        let contribution = contribution_snapshot(&contribution_model);
        let payment = payment_snapshot(&payment_model);

        if !self
            .store
            .exists(
                BalanceEvent::SuccessfulProjectPledged,
                Subject::Project(project.id),
            )
            .await?
        {
            debug!(%payment_id, "project never received the successful-pledge event");
            return Ok(false);
        }

        if self
            .store
            .exists(
                BalanceEvent::ContributionChargedback,
                Subject::Contribution(contribution.id),
            )
            .await?
        {
            debug!(%payment_id, "chargeback already posted");
            return Ok(false);
        }

        let Some(entry) = PostingPlanner::chargeback_entry(&project, &contribution, &payment)
        else {
            debug!(%payment_id, "payment is not charged back");
            return Ok(false);
        };
        validate_new_entry(&entry)?;

        match self.insert_atomic(std::slice::from_ref(&entry)).await? {
            Some(_) => {
                info!(%payment_id, contribution_id = %contribution.id, "posted chargeback");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Posts the refund of a confirmed contribution onto the balance.
    ///
    /// Inserts the `contribution_refund` entry and sets the contribution's
    /// `balance_refunded` marker in the same transaction: both or neither.
    /// Returns `None` without posting when the contribution is not confirmed
    /// or was already refunded (marker set or entry present).
    ///
    /// # Errors
    ///
    /// Returns an error if the contribution, project, or owner does not
    /// exist, the entry fails validation, or the store fails.
    pub async fn post_refund(
        &self,
        contribution_id: Uuid,
    ) -> Result<Option<balance_transactions::Model>, PostingError> {
        let contribution_model = self.contribution_model(contribution_id).await?;
        let project = self.project_snapshot(contribution_model.project_id).await?;
        let contribution = contribution_snapshot(&contribution_model);

        if contribution.balance_refunded
            || self
                .store
                .exists(
                    BalanceEvent::ContributionRefund,
                    Subject::Contribution(contribution.id),
                )
                .await?
        {
            debug!(%contribution_id, "refund already posted");
            return Ok(None);
        }

        let Some(entry) = PostingPlanner::refund_entry(&project, &contribution) else {
            debug!(%contribution_id, "contribution not eligible for refund");
            return Ok(None);
        };
        validate_new_entry(&entry)?;

        let txn = self.db.begin().await?;
        let result = self
            .store
            .insert_all(&txn, std::slice::from_ref(&entry))
            .await;

        match result {
            Ok(mut models) => {
                let mut active: contributions::ActiveModel = contribution_model.into();
                active.balance_refunded = Set(true);
                active.updated_at = Set(Utc::now().into());
                active.update(&txn).await?;

                txn.commit().await?;
                info!(%contribution_id, "posted refund");
                Ok(models.pop())
            }
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Expires an aged, unclaimed refund credit.
    ///
    /// Posts the reversal entry per the retention policy. Returns `None`
    /// without posting when the entry is not eligible (wrong kind, too
    /// young, blocked by a transfer) or a reversal already references it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist, the reversal fails
    /// validation, or the store fails.
    pub async fn post_expiration(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<balance_transactions::Model>, PostingError> {
        self.post_expiration_at(entry_id, Utc::now()).await
    }

    /// Query facade: is this entry eligible to expire right now?
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the store fails.
    pub async fn can_expire(&self, entry_id: Uuid) -> Result<bool, PostingError> {
        let model = self
            .store
            .find_by_id(entry_id)
            .await?
            .ok_or(PostingError::EntryNotFound(entry_id))?;
        self.is_expirable(&model, Utc::now()).await
    }

    /// The expiration sweep: expires every eligible refund credit.
    ///
    /// Finds refund entries at or past the retention window and posts a
    /// reversal for each eligible one. Returns the number of entries
    /// expired. Safe to re-run: already-expired and blocked entries no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, PostingError> {
        let cutoff = now - Duration::days(EXPIRATION_WINDOW_DAYS);
        let candidates = self.store.expiration_candidates(cutoff).await?;
        let total = candidates.len();

        let mut expired = 0;
        for candidate in candidates {
            if self.post_expiration_at(candidate.id, now).await?.is_some() {
                expired += 1;
            }
        }

        info!(candidates = total, expired, "expiration sweep finished");
        Ok(expired)
    }

    async fn post_expiration_at(
        &self,
        entry_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<balance_transactions::Model>, PostingError> {
        let model = self
            .store
            .find_by_id(entry_id)
            .await?
            .ok_or(PostingError::EntryNotFound(entry_id))?;

        if !self.is_expirable(&model, now).await? {
            debug!(%entry_id, "entry is not eligible to expire");
            return Ok(None);
        }

        // Independent of the eligibility check above: a reversal may already
        // reference this entry through its contribution.
        let Some(contribution_id) = model.contribution_id else {
            return Ok(None);
        };
        if self
            .store
            .exists(
                BalanceEvent::BalanceExpired,
                Subject::Contribution(ContributionId::from_uuid(contribution_id)),
            )
            .await?
        {
            debug!(%entry_id, "expiration already posted");
            return Ok(None);
        }

        let original = BalanceEntry::from(model);
        let reversal = PostingPlanner::expiration_entry(&original);
        validate_new_entry(&reversal)?;

        match self.insert_atomic(std::slice::from_ref(&reversal)).await? {
            Some(mut models) => {
                info!(%entry_id, user_id = %original.user_id, "expired refund credit");
                Ok(models.pop())
            }
            None => Ok(None),
        }
    }

    /// Pure eligibility over the entry and its sibling entries.
    async fn is_expirable(
        &self,
        model: &balance_transactions::Model,
        now: DateTime<Utc>,
    ) -> Result<bool, PostingError> {
        let entry = BalanceEntry::from(model.clone());
        let blocked = self.store.user_has_blocking_event(model.user_id).await?;
        Ok(can_expire(&entry, now, blocked))
    }

    /// Inserts entries in one transaction, collapsing guarded-uniqueness
    /// races to `None`.
    async fn insert_atomic(
        &self,
        entries: &[NewBalanceEntry],
    ) -> Result<Option<Vec<balance_transactions::Model>>, PostingError> {
        let txn = self.db.begin().await?;

        match self.store.insert_all(&txn, entries).await {
            Ok(models) => {
                txn.commit().await?;
                Ok(Some(models))
            }
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Reads the project snapshot the planners consume.
    async fn project_snapshot(&self, project_id: Uuid) -> Result<ProjectSnapshot, PostingError> {
        let project = projects::Entity::find_by_id(project_id)
            .one(&self.db)
            .await?
            .ok_or(PostingError::ProjectNotFound(project_id))?;
        let owner = users::Entity::find_by_id(project.user_id)
            .one(&self.db)
            .await?
            .ok_or(PostingError::OwnerNotFound(project.user_id))?;

        Ok(ProjectSnapshot {
            id: ProjectId::from_uuid(project.id),
            owner_id: UserId::from_uuid(project.user_id),
            owner_account_type: owner.account_type.into(),
            paid_pledged: project.paid_pledged,
            service_fee_rate: project.service_fee,
            irrf_tax: project.irrf_tax,
            successfully_finished: project.state == sea_orm_active_enums::ProjectState::Successful,
        })
    }

    async fn contribution_model(
        &self,
        contribution_id: Uuid,
    ) -> Result<contributions::Model, PostingError> {
        contributions::Entity::find_by_id(contribution_id)
            .one(&self.db)
            .await?
            .ok_or(PostingError::ContributionNotFound(contribution_id))
    }
}

fn contribution_snapshot(model: &contributions::Model) -> ContributionSnapshot {
    ContributionSnapshot {
        id: ContributionId::from_uuid(model.id),
        project_id: ProjectId::from_uuid(model.project_id),
        value: model.value,
        confirmed: model.state == sea_orm_active_enums::ContributionState::Confirmed,
        balance_refunded: model.balance_refunded,
    }
}

fn payment_snapshot(model: &payments::Model) -> PaymentSnapshot {
    PaymentSnapshot {
        id: PaymentId::from_uuid(model.id),
        contribution_id: ContributionId::from_uuid(model.contribution_id),
        charged_back: model.state == sea_orm_active_enums::PaymentState::Chargeback,
    }
}

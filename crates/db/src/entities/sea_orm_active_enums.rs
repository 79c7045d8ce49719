//! `SeaORM` active enums mapping the PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Owner account classification (`account_type`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "natural_person")]
    NaturalPerson,
    #[sea_orm(string_value = "legal_entity")]
    LegalEntity,
}

/// Project lifecycle state (`project_state`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "project_state")]
pub enum ProjectState {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "online")]
    Online,
    #[sea_orm(string_value = "waiting_funds")]
    WaitingFunds,
    #[sea_orm(string_value = "successful")]
    Successful,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Contribution lifecycle state (`contribution_state`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "contribution_state")]
pub enum ContributionState {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

/// Payment lifecycle state (`payment_state`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_state")]
pub enum PaymentState {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "refunded")]
    Refunded,
    #[sea_orm(string_value = "chargeback")]
    Chargeback,
}

/// Balance ledger event kind (`balance_event`).
///
/// The closed set of business facts a ledger entry can record; the database
/// enum rejects anything outside it.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "balance_event")]
pub enum BalanceEvent {
    #[sea_orm(string_value = "successful_project_pledged")]
    SuccessfulProjectPledged,
    #[sea_orm(string_value = "catarse_project_service_fee")]
    CatarseProjectServiceFee,
    #[sea_orm(string_value = "irrf_tax_project")]
    IrrfTaxProject,
    #[sea_orm(string_value = "project_contribution_confirmed_after_finished")]
    ProjectContributionConfirmedAfterFinished,
    #[sea_orm(string_value = "catarse_contribution_fee")]
    CatarseContributionFee,
    #[sea_orm(string_value = "contribution_chargedback")]
    ContributionChargedback,
    #[sea_orm(string_value = "contribution_refund")]
    ContributionRefund,
    #[sea_orm(string_value = "balance_expired")]
    BalanceExpired,
    #[sea_orm(string_value = "balance_transfer_request")]
    BalanceTransferRequest,
    #[sea_orm(string_value = "balance_transfer_project")]
    BalanceTransferProject,
}

impl From<catarse_core::balance::BalanceEvent> for BalanceEvent {
    fn from(event: catarse_core::balance::BalanceEvent) -> Self {
        use catarse_core::balance::BalanceEvent as Core;
        match event {
            Core::SuccessfulProjectPledged => Self::SuccessfulProjectPledged,
            Core::CatarseProjectServiceFee => Self::CatarseProjectServiceFee,
            Core::IrrfTaxProject => Self::IrrfTaxProject,
            Core::ProjectContributionConfirmedAfterFinished => {
                Self::ProjectContributionConfirmedAfterFinished
            }
            Core::CatarseContributionFee => Self::CatarseContributionFee,
            Core::ContributionChargedback => Self::ContributionChargedback,
            Core::ContributionRefund => Self::ContributionRefund,
            Core::BalanceExpired => Self::BalanceExpired,
            Core::BalanceTransferRequest => Self::BalanceTransferRequest,
            Core::BalanceTransferProject => Self::BalanceTransferProject,
        }
    }
}

impl From<BalanceEvent> for catarse_core::balance::BalanceEvent {
    fn from(event: BalanceEvent) -> Self {
        use catarse_core::balance::BalanceEvent as Core;
        match event {
            BalanceEvent::SuccessfulProjectPledged => Core::SuccessfulProjectPledged,
            BalanceEvent::CatarseProjectServiceFee => Core::CatarseProjectServiceFee,
            BalanceEvent::IrrfTaxProject => Core::IrrfTaxProject,
            BalanceEvent::ProjectContributionConfirmedAfterFinished => {
                Core::ProjectContributionConfirmedAfterFinished
            }
            BalanceEvent::CatarseContributionFee => Core::CatarseContributionFee,
            BalanceEvent::ContributionChargedback => Core::ContributionChargedback,
            BalanceEvent::ContributionRefund => Core::ContributionRefund,
            BalanceEvent::BalanceExpired => Core::BalanceExpired,
            BalanceEvent::BalanceTransferRequest => Core::BalanceTransferRequest,
            BalanceEvent::BalanceTransferProject => Core::BalanceTransferProject,
        }
    }
}

impl From<AccountType> for catarse_core::balance::AccountType {
    fn from(account_type: AccountType) -> Self {
        match account_type {
            AccountType::NaturalPerson => Self::NaturalPerson,
            AccountType::LegalEntity => Self::LegalEntity,
        }
    }
}

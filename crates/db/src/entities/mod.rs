//! `SeaORM` entity definitions for the balance ledger schema.

pub mod balance_transactions;
pub mod contributions;
pub mod payments;
pub mod projects;
pub mod sea_orm_active_enums;
pub mod users;

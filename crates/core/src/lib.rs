//! Core business logic for the Catarse balance ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, fee/tax policy, posting rules, and validation live here.
//!
//! # Modules
//!
//! - `balance` - Balance ledger posting logic

pub mod balance;

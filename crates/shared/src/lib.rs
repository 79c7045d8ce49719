//! Shared types and configuration for the Catarse balance ledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;

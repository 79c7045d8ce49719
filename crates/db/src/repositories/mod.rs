//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod balance;
pub mod posting;

pub use balance::BalanceTransactionRepository;
pub use posting::{PostingError, PostingRepository};

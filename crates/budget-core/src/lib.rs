//! Core types and traits for budget storage backends.
//!
//! This crate provides the `Entity` contract, the domain models and the
//! store traits, so storage engines can live in separate crates.

pub mod models;
pub mod money;
pub mod storage;

// Re-export key types at crate root for convenience
pub use models::{
    Account, AccountStatus, AccountWithBalance, Category, CreateTransactionArgs,
    CreateTransferTransactionsArgs, GetTransactionsArgs, Transaction, TransactionExtra,
    TransactionFlags, TransactionType, TransferExtra, UpdateCategoryArgs,
};
pub use money::{Currency, Money, MoneyError};
pub use storage::{AccountStore, CategoryStore, Entity, ErrorKind, StoreError, TransactionStore};

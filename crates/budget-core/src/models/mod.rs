mod account;
mod category;
mod transaction;

pub use account::{Account, AccountStatus, AccountWithBalance};
pub use category::{Category, UpdateCategoryArgs};
pub use transaction::{
    CreateTransactionArgs, CreateTransferTransactionsArgs, GetTransactionsArgs, Transaction,
    TransactionExtra, TransactionFlags, TransactionType, TransferExtra,
};

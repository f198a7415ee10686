//! Ledger, account and category operations on top of the store traits.

mod accounts;
mod categories;
mod transactions;

use std::sync::Arc;

use budget_core::{AccountStore, CategoryStore, TransactionStore};
use budget_redb::RedbStorage;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct Service {
    accounts: Arc<dyn AccountStore>,
    categories: Arc<dyn CategoryStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl Service {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        categories: Arc<dyn CategoryStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            accounts,
            categories,
            transactions,
        }
    }

    pub fn from_storage(storage: &RedbStorage) -> Self {
        Self::new(storage.accounts(), storage.categories(), storage.transactions())
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

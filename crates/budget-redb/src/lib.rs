//! redb storage backend for budget.
//!
//! All stores share one database file. Each entity class lives in its own
//! table, keyed by the raw bytes of the entity id with JSON values.

mod base;

pub mod accounts;
pub mod categories;
pub mod transactions;

use std::{path::Path, sync::Arc};

use budget_core::{AccountStore, CategoryStore, StoreError, TransactionStore};
use redb::{backends::InMemoryBackend, Database};

pub use accounts::RedbAccountStore;
pub use base::{BaseStore, DecodeFn, EncodeFn};
pub use categories::RedbCategoryStore;
pub use transactions::RedbTransactionStore;

/// Path accepted by [`RedbStorage::new`] for a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

pub struct RedbStorage {
    accounts: Arc<RedbAccountStore>,
    categories: Arc<RedbCategoryStore>,
    transactions: Arc<RedbTransactionStore>,
}

impl RedbStorage {
    /// Opens the database at `path`, creating the file and tables if needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY {
            return Self::in_memory();
        }

        let db = Database::create(path)
            .map_err(|e| StoreError::engine(format!("couldn't open database {}", path.display()), e))?;
        tracing::info!(path = %path.display(), "Database opened");
        Self::from_database(db)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(|e| StoreError::engine("couldn't create in-memory database", e))?;
        Self::from_database(db)
    }

    pub fn from_database(db: Database) -> Result<Self, StoreError> {
        let db = Arc::new(db);
        Ok(Self {
            accounts: Arc::new(RedbAccountStore::new(db.clone())?),
            categories: Arc::new(RedbCategoryStore::new(db.clone())?),
            transactions: Arc::new(RedbTransactionStore::new(db)?),
        })
    }

    pub fn accounts(&self) -> Arc<dyn AccountStore> {
        self.accounts.clone()
    }

    pub fn categories(&self) -> Arc<dyn CategoryStore> {
        self.categories.clone()
    }

    pub fn transactions(&self) -> Arc<dyn TransactionStore> {
        self.transactions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_core::{Account, AccountStatus, Category, GetTransactionsArgs};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn account() -> Account {
        let now = OffsetDateTime::now_utc();
        Account {
            id: Uuid::new_v4(),
            name: "Cash".to_string(),
            currency: "EUR".parse().unwrap(),
            status: AccountStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.db");
        let acc = account();
        let category = Category {
            id: Uuid::new_v4(),
            parent_id: Uuid::nil(),
            name: "Food".to_string(),
            deleted_at: None,
        };

        {
            let storage = RedbStorage::new(&path).unwrap();
            storage.accounts().create(&acc).unwrap();
            storage.categories().create(&category).unwrap();
        }

        let storage = RedbStorage::new(&path).unwrap();
        assert_eq!(storage.accounts().get_by_id(acc.id).unwrap(), acc);
        assert_eq!(storage.categories().get_all(false).unwrap(), vec![category]);
        assert!(storage
            .transactions()
            .get(&GetTransactionsArgs::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_memory_path() {
        let storage = RedbStorage::new(IN_MEMORY).unwrap();
        let acc = account();
        storage.accounts().create(&acc).unwrap();
        assert_eq!(storage.accounts().get_all().unwrap(), vec![acc]);
    }

    #[test]
    fn test_tables_are_separate() {
        let storage = RedbStorage::in_memory().unwrap();
        let acc = account();
        storage.accounts().create(&acc).unwrap();

        assert!(storage.categories().get_by_id(acc.id).unwrap_err().is_not_found());
        assert!(storage.transactions().get_by_id(acc.id).unwrap_err().is_not_found());
    }
}

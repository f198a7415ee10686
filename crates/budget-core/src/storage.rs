use uuid::Uuid;

use crate::models::{Account, Category, GetTransactionsArgs, Transaction};

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A record that can be persisted by a store.
pub trait Entity {
    /// Entity class used in error messages ("account", "category", ...).
    const ENTITY_NAME: &'static str;

    fn id(&self) -> Uuid;

    fn is_deleted(&self) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} with id {id} is not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("{entity} with id {id} already exists")]
    AlreadyExists { entity: &'static str, id: Uuid },
    #[error("couldn't decode {entity}: {source}")]
    Decode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("couldn't encode {entity}: {source}")]
    Encode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {source}")]
    Engine {
        context: String,
        #[source]
        source: BoxError,
    },
}

/// Coarse classification callers use to pick a response (404, 409, 400, 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    /// A computed amount doesn't fit in minor units.
    OutOfRange,
    Internal,
}

impl StoreError {
    pub fn not_found<T: Entity>(id: Uuid) -> Self {
        StoreError::NotFound { entity: T::ENTITY_NAME, id }
    }

    pub fn already_exists<T: Entity>(id: Uuid) -> Self {
        StoreError::AlreadyExists { entity: T::ENTITY_NAME, id }
    }

    pub fn engine(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::Engine {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StoreError::Decode { .. } | StoreError::Encode { .. } | StoreError::Engine { .. } => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }
}

pub trait AccountStore: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> Result<Account, StoreError>;
    /// All accounts ordered by creation time.
    fn get_all(&self) -> Result<Vec<Account>, StoreError>;
    fn create(&self, account: &Account) -> Result<(), StoreError>;
    fn update(&self, account: &Account) -> Result<(), StoreError>;
}

pub trait CategoryStore: Send + Sync {
    /// Returns the category even if it was soft-deleted.
    fn get_by_id(&self, id: Uuid) -> Result<Category, StoreError>;
    /// Categories ordered by parent id, then name.
    fn get_all(&self, include_deleted: bool) -> Result<Vec<Category>, StoreError>;
    fn create(&self, category: &Category) -> Result<(), StoreError>;
    fn update(&self, category: &Category) -> Result<(), StoreError>;
}

pub trait TransactionStore: Send + Sync {
    /// Returns the transaction even if it was soft-deleted.
    fn get_by_id(&self, id: Uuid) -> Result<Transaction, StoreError>;
    /// Transactions matching `args`, ordered by creation time.
    fn get(&self, args: &GetTransactionsArgs) -> Result<Vec<Transaction>, StoreError>;
    /// Persists all transactions or none of them.
    fn create(&self, transactions: &[Transaction]) -> Result<(), StoreError>;
    fn update(&self, transaction: &Transaction) -> Result<(), StoreError>;
}

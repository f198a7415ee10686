use budget_core::{ErrorKind, StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("balance of account {account_id} is out of range")]
    BalanceOutOfRange { account_id: Uuid },
}

impl ServiceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ServiceError::InvalidInput(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Store { source, .. } => source.kind(),
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::BalanceOutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Attaches a context message to store errors.
pub trait StoreResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, StoreError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| ServiceError::Store {
            context: context.into(),
            source,
        })
    }
}

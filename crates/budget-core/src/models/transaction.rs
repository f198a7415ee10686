use std::{fmt::Display, ops::BitOr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{money::Money, storage::Entity};

/// Direction of a transaction. Types written by newer versions are kept
/// verbatim in `Other` and ignored by balance calculation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Add,
    Withdraw,
    Other(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Add => "add",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TransactionType::Other(_))
    }
}

impl From<String> for TransactionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "add" => TransactionType::Add,
            "withdraw" => TransactionType::Withdraw,
            _ => TransactionType::Other(value),
        }
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        value.as_str().to_string()
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionFlags(u32);

impl TransactionFlags {
    pub const NONE: TransactionFlags = TransactionFlags(0);
    pub const TRANSFER: TransactionFlags = TransactionFlags(1);

    pub const fn contains(self, other: TransactionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_transfer(self) -> bool {
        self.contains(TransactionFlags::TRANSFER)
    }
}

impl BitOr for TransactionFlags {
    type Output = TransactionFlags;

    fn bitor(self, rhs: TransactionFlags) -> TransactionFlags {
        TransactionFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferExtra {
    pub transfer_id: Uuid,
}

/// Payload attached to a transaction. The variant is selected by the
/// transaction flags, not by a tag inside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TransactionExtra {
    Transfer(TransferExtra),
}

impl TransactionExtra {
    pub fn encode(extra: Option<&TransactionExtra>) -> Result<serde_json::Value, serde_json::Error> {
        match extra {
            Some(TransactionExtra::Transfer(transfer)) => serde_json::to_value(transfer),
            None => Ok(serde_json::Value::Null),
        }
    }

    pub fn decode(
        raw: serde_json::Value,
        flags: TransactionFlags,
    ) -> Result<Option<TransactionExtra>, serde_json::Error> {
        if flags.is_transfer() {
            let transfer: TransferExtra = serde_json::from_value(raw)?;
            return Ok(Some(TransactionExtra::Transfer(transfer)));
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub flags: TransactionFlags,
    pub name: String,
    pub description: String,
    pub amount: Money,
    pub extra: Option<TransactionExtra>,
    pub category_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Transaction {
    pub fn transfer_id(&self) -> Option<Uuid> {
        match &self.extra {
            Some(TransactionExtra::Transfer(t)) => Some(t.transfer_id),
            None => None,
        }
    }

    /// Account balance after this transaction. Unknown types leave it
    /// unchanged; `None` means the result is out of range.
    pub fn apply_to_balance(&self, balance: Money) -> Option<Money> {
        match self.transaction_type {
            TransactionType::Add => balance.checked_add(self.amount),
            TransactionType::Withdraw => balance.checked_sub(self.amount),
            TransactionType::Other(_) => Some(balance),
        }
    }
}

impl Entity for Transaction {
    const ENTITY_NAME: &'static str = "transaction";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTransactionsArgs {
    pub include_deleted: bool,
    /// Empty means all accounts.
    pub account_ids: Vec<Uuid>,
    /// Empty means all categories.
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTransactionArgs {
    pub account_id: Uuid,
    pub transaction_type: TransactionType,
    pub name: String,
    pub description: String,
    pub amount: Money,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTransferTransactionsArgs {
    pub from_account_id: Uuid,
    pub from_amount: Money,
    pub to_account_id: Uuid,
    pub to_amount: Money,
}

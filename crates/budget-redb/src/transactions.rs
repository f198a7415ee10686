use std::sync::Arc;

use budget_core::{
    Entity, GetTransactionsArgs, Money, StoreError, Transaction, TransactionExtra, TransactionFlags,
    TransactionStore, TransactionType,
};
use redb::Database;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::base::BaseStore;

pub const TABLE_NAME: &str = "transactions";

pub struct RedbTransactionStore {
    base: BaseStore<Transaction>,
}

impl RedbTransactionStore {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let base = BaseStore::new(db, TABLE_NAME, encode_transaction, decode_transaction);
        base.init()?;
        Ok(Self { base })
    }
}

impl TransactionStore for RedbTransactionStore {
    fn get_by_id(&self, id: Uuid) -> Result<Transaction, StoreError> {
        self.base.get_by_id(id)
    }

    fn get(&self, args: &GetTransactionsArgs) -> Result<Vec<Transaction>, StoreError> {
        self.base.get_all(
            |t| !is_selected(t, args),
            |transactions| {
                transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            },
        )
    }

    fn create(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        self.base.create(transactions)
    }

    fn update(&self, transaction: &Transaction) -> Result<(), StoreError> {
        self.base.update(transaction)
    }
}

fn is_selected(t: &Transaction, args: &GetTransactionsArgs) -> bool {
    if t.is_deleted() && !args.include_deleted {
        return false;
    }
    if !args.account_ids.is_empty() && !args.account_ids.contains(&t.account_id) {
        return false;
    }
    if !args.category_ids.is_empty() && !args.category_ids.contains(&t.category_id) {
        return false;
    }
    true
}

/// On-disk shape of a transaction. `extra` is kept raw until the flags are
/// known, they decide how it is interpreted.
#[derive(Serialize, Deserialize)]
struct RedbTransaction {
    id: Uuid,
    account_id: Uuid,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    #[serde(default)]
    flags: TransactionFlags,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    amount: Money,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    extra: serde_json::Value,
    #[serde(default)]
    category_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    deleted_at: Option<OffsetDateTime>,
}

fn encode_transaction(t: &Transaction) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&RedbTransaction {
        id: t.id,
        account_id: t.account_id,
        transaction_type: t.transaction_type.clone(),
        flags: t.flags,
        name: t.name.clone(),
        description: t.description.clone(),
        amount: t.amount,
        extra: TransactionExtra::encode(t.extra.as_ref())?,
        category_id: t.category_id,
        created_at: t.created_at,
        deleted_at: t.deleted_at,
    })
}

fn decode_transaction(data: &[u8]) -> Result<Transaction, serde_json::Error> {
    let t: RedbTransaction = serde_json::from_slice(data)?;
    let extra = TransactionExtra::decode(t.extra, t.flags)?;
    Ok(Transaction {
        id: t.id,
        account_id: t.account_id,
        transaction_type: t.transaction_type,
        flags: t.flags,
        name: t.name,
        description: t.description,
        amount: t.amount,
        extra,
        category_id: t.category_id,
        created_at: t.created_at,
        deleted_at: t.deleted_at,
    })
}

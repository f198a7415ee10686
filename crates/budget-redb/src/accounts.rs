use std::sync::Arc;

use budget_core::{Account, AccountStatus, AccountStore, Currency, StoreError};
use redb::Database;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::base::BaseStore;

pub const TABLE_NAME: &str = "accounts";

pub struct RedbAccountStore {
    base: BaseStore<Account>,
}

impl RedbAccountStore {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let base = BaseStore::new(db, TABLE_NAME, encode_account, decode_account);
        base.init()?;
        Ok(Self { base })
    }
}

impl AccountStore for RedbAccountStore {
    fn get_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        self.base.get_by_id(id)
    }

    fn get_all(&self) -> Result<Vec<Account>, StoreError> {
        self.base.get_all(
            |_| false,
            |accounts| accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
        )
    }

    fn create(&self, account: &Account) -> Result<(), StoreError> {
        self.base.create(std::slice::from_ref(account))
    }

    fn update(&self, account: &Account) -> Result<(), StoreError> {
        self.base.update(account)
    }
}

/// On-disk shape of an account. Records written before accounts had names
/// or an update time decode with an empty name and `updated_at = created_at`.
#[derive(Serialize, Deserialize)]
struct RedbAccount {
    id: Uuid,
    #[serde(default)]
    name: String,
    currency: Currency,
    status: AccountStatus,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
}

fn encode_account(acc: &Account) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&RedbAccount {
        id: acc.id,
        name: acc.name.clone(),
        currency: acc.currency,
        status: acc.status,
        created_at: acc.created_at,
        updated_at: Some(acc.updated_at),
    })
}

fn decode_account(data: &[u8]) -> Result<Account, serde_json::Error> {
    let acc: RedbAccount = serde_json::from_slice(data)?;
    Ok(Account {
        id: acc.id,
        name: acc.name,
        currency: acc.currency,
        status: acc.status,
        created_at: acc.created_at,
        updated_at: acc.updated_at.unwrap_or(acc.created_at),
    })
}

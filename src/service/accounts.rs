use budget_core::{Account, AccountStatus, AccountWithBalance, Currency, Money};
use uuid::Uuid;

use super::{now, Service};
use crate::error::{Result, ServiceError, StoreResultExt};

impl Service {
    /// Opens a new account. A blank name falls back to "<CUR> account".
    pub fn create_account(&self, name: &str, currency: Currency) -> Result<Account> {
        let name = match name.trim() {
            "" => format!("{} account", currency.code()),
            name => name.to_string(),
        };
        let created_at = now();
        let acc = Account {
            id: Uuid::new_v4(),
            name,
            currency,
            status: AccountStatus::Open,
            created_at,
            updated_at: created_at,
        };
        self.accounts.create(&acc).context("couldn't save new account")?;

        tracing::info!(id = %acc.id, currency = %acc.currency, "Account created");
        Ok(acc)
    }

    pub fn get_account(&self, id: Uuid) -> Result<AccountWithBalance> {
        let account = self.accounts.get_by_id(id).context("couldn't get account")?;
        let balance = self
            .calculate_account_balances(&[id])?
            .remove(&id)
            .unwrap_or(Money::ZERO);
        Ok(AccountWithBalance { account, balance })
    }

    /// All accounts in creation order with their balances.
    pub fn get_accounts(&self) -> Result<Vec<AccountWithBalance>> {
        let accounts = self
            .accounts
            .get_all()
            .context("couldn't get all accounts from store")?;

        let ids: Vec<Uuid> = accounts.iter().map(|acc| acc.id).collect();
        let mut balances = self.calculate_account_balances(&ids)?;

        Ok(accounts
            .into_iter()
            .map(|account| {
                let balance = balances.remove(&account.id).unwrap_or(Money::ZERO);
                AccountWithBalance { account, balance }
            })
            .collect())
    }

    pub fn close_account(&self, id: Uuid) -> Result<Account> {
        let mut acc = self.accounts.get_by_id(id).context("couldn't get account")?;
        if !acc.is_open() {
            return Err(ServiceError::invalid_input(format!("account {} is already closed", id)));
        }

        acc.status = AccountStatus::Closed;
        acc.updated_at = now();
        self.save_account(&acc)?;

        tracing::info!(%id, "Account closed");
        Ok(acc)
    }

    pub fn rename_account(&self, id: Uuid, name: &str) -> Result<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid_input("account name can't be empty"));
        }

        let mut acc = self.accounts.get_by_id(id).context("couldn't get account")?;
        acc.name = name.to_string();
        acc.updated_at = now();
        self.save_account(&acc)?;

        tracing::info!(%id, name, "Account renamed");
        Ok(acc)
    }

    fn save_account(&self, acc: &Account) -> Result<()> {
        self.accounts.update(acc).context("couldn't update account")
    }
}

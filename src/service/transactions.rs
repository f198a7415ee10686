use std::collections::HashMap;

use budget_core::{
    CreateTransactionArgs, CreateTransferTransactionsArgs, Entity, GetTransactionsArgs, Money,
    StoreError, Transaction, TransactionExtra, TransactionFlags, TransactionType, TransferExtra,
};
use uuid::Uuid;

use super::{now, Service};
use crate::error::{Result, ServiceError, StoreResultExt};

impl Service {
    pub fn get_transactions(&self, args: &GetTransactionsArgs) -> Result<Vec<Transaction>> {
        self.transactions.get(args).context("couldn't get transactions")
    }

    /// Returns the transaction even if it was deleted.
    pub fn get_transaction(&self, id: Uuid) -> Result<Transaction> {
        self.transactions
            .get_by_id(id)
            .context("couldn't get transaction")
    }

    /// Folds the non-deleted log into a balance per requested account.
    /// Every requested account is present in the result, at zero if it has
    /// no transactions.
    pub fn calculate_account_balances(&self, account_ids: &[Uuid]) -> Result<HashMap<Uuid, Money>> {
        let mut res: HashMap<Uuid, Money> = account_ids.iter().map(|id| (*id, Money::ZERO)).collect();
        if res.is_empty() {
            return Ok(res);
        }

        let transactions = self.get_transactions(&GetTransactionsArgs {
            include_deleted: false,
            account_ids: account_ids.to_vec(),
            category_ids: Vec::new(),
        })?;

        for t in &transactions {
            let Some(balance) = res.get_mut(&t.account_id) else {
                continue;
            };
            *balance = t.apply_to_balance(*balance).ok_or_else(|| {
                tracing::error!(account_id = %t.account_id, transaction_id = %t.id, "Balance overflow");
                ServiceError::BalanceOutOfRange {
                    account_id: t.account_id,
                }
            })?;
        }
        Ok(res)
    }

    pub fn create_transaction(&self, args: CreateTransactionArgs) -> Result<Transaction> {
        if !args.transaction_type.is_known() {
            return Err(ServiceError::invalid_input(format!(
                "unknown transaction type {:?}",
                args.transaction_type.as_str()
            )));
        }
        if args.amount.is_negative() {
            return Err(ServiceError::invalid_input("amount can't be negative"));
        }

        self.accounts
            .get_by_id(args.account_id)
            .context("couldn't get account by id")?;
        self.check_category_usable(args.category_id)?;

        let t = Transaction {
            id: Uuid::new_v4(),
            account_id: args.account_id,
            transaction_type: args.transaction_type,
            flags: TransactionFlags::NONE,
            name: args.name.trim().to_string(),
            description: args.description.trim().to_string(),
            amount: args.amount,
            extra: None,
            category_id: args.category_id,
            created_at: now(),
            deleted_at: None,
        };
        self.transactions
            .create(std::slice::from_ref(&t))
            .context("couldn't save new transaction")?;

        tracing::info!(
            id = %t.id,
            account_id = %t.account_id,
            kind = %t.transaction_type,
            amount = t.amount.minor_units(),
            "Transaction created"
        );
        Ok(t)
    }

    /// Creates the withdraw leg on the source account and the add leg on the
    /// destination account. Both legs are written in one batch, so either
    /// both are stored or neither is.
    pub fn create_transfer_transactions(
        &self,
        args: CreateTransferTransactionsArgs,
    ) -> Result<[Transaction; 2]> {
        if args.from_account_id == args.to_account_id {
            return Err(ServiceError::invalid_input("can't transfer to the same account"));
        }
        if args.from_amount.is_negative() || args.to_amount.is_negative() {
            return Err(ServiceError::invalid_input("transfer amounts can't be negative"));
        }

        let from = self
            .accounts
            .get_by_id(args.from_account_id)
            .context("couldn't get 'from' account")?;
        let to = self
            .accounts
            .get_by_id(args.to_account_id)
            .context("couldn't get 'to' account")?;

        let transfer_id = Uuid::new_v4();
        let extra = TransactionExtra::Transfer(TransferExtra { transfer_id });
        let created_at = now();

        let name = format!("Transfer {}", transfer_id);
        let description = format!(
            "Transfer of {} {} to {} {}",
            args.from_amount.format(from.currency),
            from.currency,
            args.to_amount.format(to.currency),
            to.currency,
        );

        let leg = |account_id, transaction_type, amount| Transaction {
            id: Uuid::new_v4(),
            account_id,
            transaction_type,
            flags: TransactionFlags::TRANSFER,
            name: name.clone(),
            description: description.clone(),
            amount,
            extra: Some(extra.clone()),
            category_id: Uuid::nil(),
            created_at,
            deleted_at: None,
        };
        let legs = [
            leg(from.id, TransactionType::Withdraw, args.from_amount),
            leg(to.id, TransactionType::Add, args.to_amount),
        ];

        self.transactions
            .create(&legs)
            .context("couldn't save transfer transactions")?;

        tracing::info!(
            %transfer_id,
            from = %from.id,
            to = %to.id,
            "Transfer created"
        );
        Ok(legs)
    }

    /// Soft-deletes a transaction. Transfer legs are refused: removing one
    /// leg would unbalance the pair.
    pub fn delete_transaction(&self, id: Uuid) -> Result<()> {
        let mut t = self.get_transaction(id)?;
        if t.is_deleted() {
            return Err(StoreError::not_found::<Transaction>(id)).context("couldn't get transaction");
        }
        if t.flags.is_transfer() {
            return Err(ServiceError::invalid_input("transfer transactions can't be deleted"));
        }

        t.deleted_at = Some(now());
        self.transactions
            .update(&t)
            .context("couldn't update transaction for deletion")?;

        tracing::info!(%id, "Transaction deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_utils::*;
    use budget_core::ErrorKind;

    fn args(account_id: Uuid, transaction_type: TransactionType, amount: i64) -> CreateTransactionArgs {
        CreateTransactionArgs {
            account_id,
            transaction_type,
            name: "Groceries".to_string(),
            description: String::new(),
            amount: Money::from_minor(amount),
            category_id: Uuid::nil(),
        }
    }

    #[test]
    fn test_balance_fold() {
        let service = service();
        let acc1 = open_account(&service, "USD");
        let acc2 = open_account(&service, "USD");

        service.create_transaction(args(acc1.id, TransactionType::Add, 500)).unwrap();
        service.create_transaction(args(acc1.id, TransactionType::Withdraw, 200)).unwrap();
        service.create_transaction(args(acc1.id, TransactionType::Add, 100)).unwrap();

        let balances = service.calculate_account_balances(&[acc1.id, acc2.id]).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[&acc1.id], Money::from_minor(400));
        assert_eq!(balances[&acc2.id], Money::ZERO);
    }

    #[test]
    fn test_balance_out_of_range() {
        let service = service();
        let acc = open_account(&service, "USD");
        let other = open_account(&service, "USD");
        let max = Money::parse("92233720368547758.07", usd()).unwrap();

        service.create_transaction(args(acc.id, TransactionType::Add, max.minor_units())).unwrap();
        service.create_transaction(args(acc.id, TransactionType::Add, max.minor_units())).unwrap();
        service.create_transaction(args(other.id, TransactionType::Add, 10)).unwrap();

        let err = service.calculate_account_balances(&[acc.id]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert!(matches!(err, ServiceError::BalanceOutOfRange { account_id } if account_id == acc.id));
        assert_eq!(service.get_account(acc.id).unwrap_err().kind(), ErrorKind::OutOfRange);

        let balances = service.calculate_account_balances(&[other.id]).unwrap();
        assert_eq!(balances[&other.id], Money::from_minor(10));
    }

    #[test]
    fn test_balance_ignores_deleted_and_unrequested() {
        let service = service();
        let acc1 = open_account(&service, "USD");
        let acc2 = open_account(&service, "USD");

        let t = service.create_transaction(args(acc1.id, TransactionType::Add, 300)).unwrap();
        service.create_transaction(args(acc1.id, TransactionType::Add, 50)).unwrap();
        service.create_transaction(args(acc2.id, TransactionType::Add, 999)).unwrap();
        service.delete_transaction(t.id).unwrap();

        let balances = service.calculate_account_balances(&[acc1.id]).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[&acc1.id], Money::from_minor(50));
    }

    #[test]
    fn test_balance_for_no_accounts() {
        let service = service();
        assert!(service.calculate_account_balances(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_create_transaction_validation() {
        let service = service();
        let acc = open_account(&service, "USD");

        let err = service
            .create_transaction(args(acc.id, TransactionType::Other("refund".into()), 10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = service
            .create_transaction(args(acc.id, TransactionType::Add, -10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = service
            .create_transaction(args(Uuid::new_v4(), TransactionType::Add, 10))
            .unwrap_err();
        assert!(err.is_not_found());

        let mut with_category = args(acc.id, TransactionType::Add, 10);
        with_category.category_id = Uuid::new_v4();
        let err = service.create_transaction(with_category).unwrap_err();
        assert!(err.is_not_found());

        assert!(service
            .get_transactions(&GetTransactionsArgs::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_create_transaction_with_category() {
        let service = service();
        let acc = open_account(&service, "USD");
        let food = service.create_category("Food", root()).unwrap();

        let mut a = args(acc.id, TransactionType::Withdraw, 1250);
        a.category_id = food.id;
        a.name = "  Lunch ".to_string();
        let t = service.create_transaction(a).unwrap();

        assert_eq!(t.name, "Lunch");
        assert_eq!(service.get_transaction(t.id).unwrap(), t);

        let by_category = service
            .get_transactions(&GetTransactionsArgs {
                category_ids: vec![food.id],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_category, vec![t]);
    }

    #[test]
    fn test_create_transfer() {
        let service = service();
        let from = open_account(&service, "USD");
        let to = open_account(&service, "EUR");

        let [withdraw, add] = service
            .create_transfer_transactions(CreateTransferTransactionsArgs {
                from_account_id: from.id,
                from_amount: Money::from_minor(1000),
                to_account_id: to.id,
                to_amount: Money::from_minor(920),
            })
            .unwrap();

        assert_eq!(withdraw.account_id, from.id);
        assert_eq!(withdraw.transaction_type, TransactionType::Withdraw);
        assert_eq!(add.account_id, to.id);
        assert_eq!(add.transaction_type, TransactionType::Add);
        assert!(withdraw.flags.is_transfer() && add.flags.is_transfer());

        let transfer_id = withdraw.transfer_id().unwrap();
        assert_eq!(add.transfer_id(), Some(transfer_id));
        assert_eq!(withdraw.name, format!("Transfer {}", transfer_id));
        assert_eq!(withdraw.description, "Transfer of 10.00 USD to 9.20 EUR");

        let balances = service.calculate_account_balances(&[from.id, to.id]).unwrap();
        assert_eq!(balances[&from.id], Money::from_minor(-1000));
        assert_eq!(balances[&to.id], Money::from_minor(920));
    }

    #[test]
    fn test_create_transfer_validation() {
        let service = service();
        let acc = open_account(&service, "USD");
        let other = open_account(&service, "USD");

        let transfer = |from, to, amount| CreateTransferTransactionsArgs {
            from_account_id: from,
            from_amount: Money::from_minor(amount),
            to_account_id: to,
            to_amount: Money::from_minor(amount),
        };

        let err = service.create_transfer_transactions(transfer(acc.id, acc.id, 10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = service.create_transfer_transactions(transfer(acc.id, other.id, -10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = service
            .create_transfer_transactions(transfer(acc.id, Uuid::new_v4(), 10))
            .unwrap_err();
        assert!(err.is_not_found());

        assert!(service
            .get_transactions(&GetTransactionsArgs::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_transaction() {
        let service = service();
        let acc = open_account(&service, "USD");
        let t = service.create_transaction(args(acc.id, TransactionType::Add, 10)).unwrap();

        service.delete_transaction(t.id).unwrap();
        assert!(service
            .get_transactions(&GetTransactionsArgs::default())
            .unwrap()
            .is_empty());

        let all = service
            .get_transactions(&GetTransactionsArgs {
                include_deleted: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].deleted_at.is_some());
        assert!(service.get_transaction(t.id).unwrap().is_deleted());

        let err = service.delete_transaction(t.id).unwrap_err();
        assert!(err.is_not_found());
        assert!(service.delete_transaction(Uuid::new_v4()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_transfer_leg_refused() {
        let service = service();
        let from = open_account(&service, "USD");
        let to = open_account(&service, "USD");
        let [withdraw, _] = service
            .create_transfer_transactions(CreateTransferTransactionsArgs {
                from_account_id: from.id,
                from_amount: Money::from_minor(10),
                to_account_id: to.id,
                to_amount: Money::from_minor(10),
            })
            .unwrap();

        let err = service.delete_transaction(withdraw.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!service.get_transaction(withdraw.id).unwrap().is_deleted());
    }
}

use std::collections::HashMap;

use anyhow::{bail, Context};
use budget_core::{
    Account, AccountWithBalance, Category, CreateTransactionArgs, CreateTransferTransactionsArgs, Currency,
    GetTransactionsArgs, Money, Transaction, TransactionType, UpdateCategoryArgs,
};
use clap::{Subcommand, ValueEnum};
use prettytable::{row, Table};
use uuid::Uuid;

use crate::{error::ServiceError, service::Service};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage accounts
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Record and inspect transactions
    #[command(subcommand)]
    Tx(TxCommand),
    /// Show balances of all accounts
    Balance,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    Create {
        /// ISO 4217 currency code
        currency: String,
        #[arg(short, long, default_value = "")]
        name: String,
    },
    List,
    Show {
        id: Uuid,
    },
    Close {
        id: Uuid,
    },
    Rename {
        id: Uuid,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    Create {
        name: String,
        /// Parent category, omit for a root category
        #[arg(short, long)]
        parent: Option<Uuid>,
    },
    List,
    Rename {
        id: Uuid,
        name: String,
    },
    /// Move a category under another one, or to the root without --parent
    Move {
        id: Uuid,
        #[arg(short, long)]
        parent: Option<Uuid>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    Add {
        #[arg(short, long)]
        account: Uuid,
        #[arg(short = 't', long = "type", value_enum)]
        kind: TxKind,
        /// Decimal amount in the account currency, e.g. 12.50
        amount: String,
        #[arg(short, long, default_value = "")]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        category: Option<Uuid>,
    },
    Transfer {
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
        /// Amount leaving the source account
        amount: String,
        /// Amount reaching the destination account, defaults to `amount`
        #[arg(long)]
        to_amount: Option<String>,
    },
    List {
        #[arg(short, long)]
        account: Vec<Uuid>,
        #[arg(short, long)]
        category: Vec<Uuid>,
        #[arg(long)]
        include_deleted: bool,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKind {
    Add,
    Withdraw,
}

impl From<TxKind> for TransactionType {
    fn from(kind: TxKind) -> Self {
        match kind {
            TxKind::Add => TransactionType::Add,
            TxKind::Withdraw => TransactionType::Withdraw,
        }
    }
}

/// How listings are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

pub fn run(command: Command, service: &Service, output: Output) -> anyhow::Result<()> {
    let res = dispatch(command, service, output);
    if let Err(err) = &res {
        if let Some(ServiceError::InvalidInput(reason)) = err.downcast_ref::<ServiceError>() {
            tracing::warn!(%reason, "Request rejected");
        }
    }
    res
}

fn dispatch(command: Command, service: &Service, output: Output) -> anyhow::Result<()> {
    match command {
        Command::Account(cmd) => run_account(cmd, service, output),
        Command::Category(cmd) => run_category(cmd, service, output),
        Command::Tx(cmd) => run_tx(cmd, service, output),
        Command::Balance if output == Output::Json => print_json(&open_balances(service)?),
        Command::Balance => {
            let mut table = Table::new();
            table.add_row(row!["Account", "Currency", "Balance"]);
            for acc in open_balances(service)? {
                table.add_row(row![
                    acc.account.name,
                    acc.account.currency,
                    r->acc.balance.format(acc.account.currency)
                ]);
            }
            table.printstd();
            Ok(())
        }
    }
}

/// Balances of the accounts that are still open.
fn open_balances(service: &Service) -> anyhow::Result<Vec<AccountWithBalance>> {
    let mut accounts = service.get_accounts()?;
    accounts.retain(|acc| acc.account.is_open());
    Ok(accounts)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_account(cmd: AccountCommand, service: &Service, output: Output) -> anyhow::Result<()> {
    match cmd {
        AccountCommand::Create { currency, name } => {
            let currency: Currency = currency.parse()?;
            let acc = service.create_account(&name, currency)?;
            println!("{}", acc.id);
        }
        AccountCommand::List if output == Output::Json => print_json(&service.get_accounts()?)?,
        AccountCommand::List => {
            let mut table = Table::new();
            table.add_row(row!["ID", "Name", "Currency", "Status", "Balance", "Created"]);
            for acc in service.get_accounts()? {
                let status = if acc.account.is_open() { "open" } else { "closed" };
                table.add_row(row![
                    acc.account.id,
                    acc.account.name,
                    acc.account.currency,
                    status,
                    r->acc.balance.format(acc.account.currency),
                    acc.account.created_at.date()
                ]);
            }
            table.printstd();
        }
        AccountCommand::Show { id } if output == Output::Json => print_json(&service.get_account(id)?)?,
        AccountCommand::Show { id } => {
            let acc = service.get_account(id)?;
            let mut table = Table::new();
            table.add_row(row!["ID", acc.account.id]);
            table.add_row(row!["Name", acc.account.name]);
            table.add_row(row!["Currency", acc.account.currency.name()]);
            table.add_row(row!["Open", acc.account.is_open()]);
            table.add_row(row!["Balance", acc.balance.format(acc.account.currency)]);
            table.add_row(row!["Updated", acc.account.updated_at.date()]);
            table.printstd();
        }
        AccountCommand::Close { id } => {
            service.close_account(id)?;
        }
        AccountCommand::Rename { id, name } => {
            service.rename_account(id, &name)?;
        }
    }
    Ok(())
}

fn run_category(cmd: CategoryCommand, service: &Service, output: Output) -> anyhow::Result<()> {
    match cmd {
        CategoryCommand::Create { name, parent } => {
            let category = service.create_category(&name, parent.unwrap_or_else(Uuid::nil))?;
            println!("{}", category.id);
        }
        CategoryCommand::List if output == Output::Json => print_json(&service.get_categories()?)?,
        CategoryCommand::List => {
            let categories = service.get_categories()?;
            let mut table = Table::new();
            table.add_row(row!["ID", "Name", "Parent"]);
            for category in &categories {
                table.add_row(row![category.id, category.name, parent_name(category, &categories)]);
            }
            table.printstd();
        }
        CategoryCommand::Rename { id, name } => {
            service.update_category(
                id,
                UpdateCategoryArgs {
                    name: Some(name),
                    parent_id: None,
                },
            )?;
        }
        CategoryCommand::Move { id, parent } => {
            service.update_category(
                id,
                UpdateCategoryArgs {
                    name: None,
                    parent_id: Some(parent.unwrap_or_else(Uuid::nil)),
                },
            )?;
        }
        CategoryCommand::Delete { id } => {
            service.delete_category(id)?;
        }
    }
    Ok(())
}

fn parent_name<'a>(category: &Category, categories: &'a [Category]) -> &'a str {
    if category.is_root() {
        return "";
    }
    categories
        .iter()
        .find(|c| c.id == category.parent_id)
        .map_or("?", |c| c.name.as_str())
}

fn run_tx(cmd: TxCommand, service: &Service, output: Output) -> anyhow::Result<()> {
    match cmd {
        TxCommand::Add {
            account,
            kind,
            amount,
            name,
            description,
            category,
        } => {
            let acc = service.get_account(account)?.account;
            let t = service.create_transaction(CreateTransactionArgs {
                account_id: acc.id,
                transaction_type: kind.into(),
                name,
                description,
                amount: parse_amount(&amount, &acc)?,
                category_id: category.unwrap_or_else(Uuid::nil),
            })?;
            println!("{}", t.id);
        }
        TxCommand::Transfer {
            from,
            to,
            amount,
            to_amount,
        } => {
            let from = service.get_account(from)?.account;
            let to = service.get_account(to)?.account;
            let from_amount = parse_amount(&amount, &from)?;
            let to_amount = parse_amount(to_amount.as_deref().unwrap_or(&amount), &to)?;
            if from.currency != to.currency && to_amount == from_amount && to_amount != Money::ZERO {
                tracing::warn!(
                    from = %from.currency,
                    to = %to.currency,
                    "Transfer between currencies uses the same amount on both sides"
                );
            }

            let [withdraw, _] = service.create_transfer_transactions(CreateTransferTransactionsArgs {
                from_account_id: from.id,
                from_amount,
                to_account_id: to.id,
                to_amount,
            })?;
            if let Some(transfer_id) = withdraw.transfer_id() {
                println!("{}", transfer_id);
            }
        }
        TxCommand::List {
            account,
            category,
            include_deleted,
        } => {
            let transactions = service.get_transactions(&GetTransactionsArgs {
                include_deleted,
                account_ids: account,
                category_ids: category,
            })?;
            if output == Output::Json {
                return print_json(&transactions);
            }

            let currencies: HashMap<Uuid, Currency> = service
                .get_accounts()?
                .into_iter()
                .map(|acc| (acc.account.id, acc.account.currency))
                .collect();
            print_transactions(&transactions, &currencies)?;
        }
        TxCommand::Delete { id } => {
            service.delete_transaction(id)?;
        }
    }
    Ok(())
}

fn print_transactions(
    transactions: &[Transaction],
    currencies: &HashMap<Uuid, Currency>,
) -> anyhow::Result<()> {
    let mut table = Table::new();
    table.add_row(row!["ID", "Date", "Account", "Type", "Amount", "Name", "Deleted"]);
    for t in transactions {
        let currency = currencies
            .get(&t.account_id)
            .with_context(|| format!("transaction {} refers to unknown account {}", t.id, t.account_id))?;
        table.add_row(row![
            t.id,
            t.created_at.date(),
            t.account_id,
            t.transaction_type,
            r->format!("{} {}", t.amount.format(*currency), currency),
            t.name,
            if t.deleted_at.is_some() { "yes" } else { "" }
        ]);
    }
    table.printstd();
    Ok(())
}

fn parse_amount(amount: &str, acc: &Account) -> anyhow::Result<Money> {
    let money = Money::parse(amount, acc.currency)
        .with_context(|| format!("couldn't parse amount for account {:?}", acc.name))?;
    if money.is_negative() {
        bail!("amount {} must not be negative", amount);
    }
    Ok(money)
}

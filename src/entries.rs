// 📝 Entry Forms - manual transactions and the fixed payday template

use crate::config::Config;
use crate::error::EntryError;
use crate::ledger::{append_transactions, Category, Ledger, Transaction, TransactionType};
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIN_AMOUNT: f64 = 0.01;

pub const SALARY_DESCRIPTION: &str = "Monthly Salary";
pub const VOUCHER_DESCRIPTION: &str = "Meal Voucher";

/// What the manual form offers; "extra income" is stored as plain Income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Expense,
    ExtraIncome,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Expense => "Expense",
            EntryKind::ExtraIncome => "Income (Extra)",
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            EntryKind::Expense => TransactionType::Expense,
            EntryKind::ExtraIncome => TransactionType::Income,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            EntryKind::Expense => EntryKind::ExtraIncome,
            EntryKind::ExtraIncome => EntryKind::Expense,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryForm {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub description: String,
}

impl EntryForm {
    /// Blank form: today, expense, minimum amount, first category
    pub fn blank(today: NaiveDate) -> Self {
        EntryForm {
            date: today,
            kind: EntryKind::Expense,
            amount: MIN_AMOUNT,
            category: Category::FORM[0],
            description: String::new(),
        }
    }

    /// Validate the input constraints and produce the ledger row
    pub fn to_transaction(&self) -> Result<Transaction, EntryError> {
        let amount = round_cents(self.amount);
        if !amount.is_finite() || amount < MIN_AMOUNT {
            return Err(EntryError::AmountTooSmall(self.amount));
        }

        Ok(Transaction::new(
            self.date,
            self.category,
            self.description.trim(),
            amount,
            self.kind.transaction_type(),
        ))
    }
}

/// The form works to two decimals
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Salary + meal voucher, both dated `date`
pub fn payday_rows(date: NaiveDate, config: &Config) -> [Transaction; 2] {
    [
        Transaction::new(
            date,
            Category::Salary,
            SALARY_DESCRIPTION,
            config.salary,
            TransactionType::Income,
        ),
        Transaction::new(
            date,
            Category::Benefits,
            VOUCHER_DESCRIPTION,
            config.meal_voucher,
            TransactionType::Income,
        ),
    ]
}

/// Append the payday template to the ledger file; returns the reloaded ledger
pub fn record_payday(path: &Path, date: NaiveDate, config: &Config) -> Result<Ledger> {
    let rows = payday_rows(date, config);
    let ledger = append_transactions(path, &rows)?;
    log::info!(
        "Payday recorded for {}: salary {:.2}, voucher {:.2}",
        date,
        config.salary,
        config.meal_voucher
    );
    Ok(ledger)
}

/// Validate and append one manual entry; returns the reloaded ledger
pub fn record_entry(path: &Path, form: &EntryForm) -> Result<Ledger> {
    let tx = form.to_transaction()?;
    let ledger = append_transactions(path, std::slice::from_ref(&tx))?;
    log::info!(
        "Recorded {} {:.2} ({}) on {}",
        tx.transaction_type,
        tx.amount,
        tx.category,
        tx.date
    );
    Ok(ledger)
}

// 📊 Aggregator - sums per type, category, month and year
//
// Everything here is a pure function of a row set. Months and years only
// appear in the output when they have at least one row.

use crate::ledger::{Category, Ledger, Transaction, TransactionType};
use crate::query::month_name;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl Totals {
    fn add(&mut self, tx: &Transaction) {
        match tx.transaction_type {
            TransactionType::Income => self.income += tx.amount,
            TransactionType::Expense => self.expense += tx.amount,
        }
        self.balance = self.income - self.expense;
    }
}

/// Income, expense and net balance of any row set
pub fn totals<'a, I>(rows: I) -> Totals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals = Totals::default();
    for tx in rows {
        totals.add(tx);
    }
    totals
}

// ============================================================================
// EXPENSE COMPOSITION (donut)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub amount: f64,
    /// Fraction of total expense (0.0 - 1.0)
    pub share: f64,
}

/// Expense sums per category, largest first
pub fn expense_by_category<'a, I>(rows: I) -> Vec<CategoryShare>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut sums: BTreeMap<Category, f64> = BTreeMap::new();
    for tx in rows.into_iter().filter(|tx| tx.is_expense()) {
        *sums.entry(tx.category).or_insert(0.0) += tx.amount;
    }

    let total: f64 = sums.values().sum();

    let mut shares: Vec<CategoryShare> = sums
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category,
            amount,
            share: if total > 0.0 { amount / total } else { 0.0 },
        })
        .collect();

    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares
}

// ============================================================================
// PERIOD SUMMARIES (bar + line, cumulative area)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: u32,
    pub month_name: &'static str,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    /// Running sum of `balance` over the listed months
    pub cumulative: f64,
}

/// One entry per month of `year` that has data, ascending
pub fn monthly_summary(ledger: &Ledger, year: i32) -> Vec<MonthSummary> {
    let mut by_month: BTreeMap<u32, Totals> = BTreeMap::new();
    for tx in ledger.iter().filter(|tx| tx.date.year() == year) {
        by_month.entry(tx.date.month()).or_default().add(tx);
    }

    let mut cumulative = 0.0;
    by_month
        .into_iter()
        .map(|(month, t)| {
            cumulative += t.balance;
            MonthSummary {
                month,
                month_name: month_name(month),
                income: t.income,
                expense: t.expense,
                balance: t.balance,
                cumulative,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub cumulative: f64,
}

/// One entry per year with data, ascending, cumulative across years
pub fn yearly_summary(ledger: &Ledger) -> Vec<YearSummary> {
    let mut by_year: BTreeMap<i32, Totals> = BTreeMap::new();
    for tx in ledger.iter() {
        by_year.entry(tx.date.year()).or_default().add(tx);
    }

    let mut cumulative = 0.0;
    by_year
        .into_iter()
        .map(|(year, t)| {
            cumulative += t.balance;
            YearSummary {
                year,
                income: t.income,
                expense: t.expense,
                balance: t.balance,
                cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::tx;
    use crate::query::by_month;

    fn sample() -> Ledger {
        Ledger::new(vec![
            tx("2024-01-05", Category::Salary, "Monthly Salary", 3800.0, TransactionType::Income),
            tx("2024-01-05", Category::Benefits, "Meal Voucher", 350.0, TransactionType::Income),
            tx("2024-01-10", Category::Housing, "Rent", 1500.0, TransactionType::Expense),
            tx("2024-01-12", Category::Food, "Market", 400.0, TransactionType::Expense),
            tx("2024-01-20", Category::Food, "Pizza", 100.0, TransactionType::Expense),
            tx("2024-03-01", Category::Leisure, "Trip", 2500.0, TransactionType::Expense),
            tx("2023-12-24", Category::Salary, "Bonus", 1000.0, TransactionType::Income),
        ])
    }

    #[test]
    fn test_month_totals() {
        let ledger = sample();
        let t = totals(by_month(&ledger, 2024, 1));

        assert_eq!(t.income, 4150.0);
        assert_eq!(t.expense, 2000.0);
        assert_eq!(t.balance, 2150.0);
    }

    #[test]
    fn test_empty_totals_are_zero() {
        let t = totals(Vec::<&Transaction>::new());
        assert_eq!(t, Totals::default());
    }

    #[test]
    fn test_expense_by_category() {
        let ledger = sample();
        let shares = expense_by_category(by_month(&ledger, 2024, 1));

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, Category::Housing);
        assert_eq!(shares[0].amount, 1500.0);
        assert_eq!(shares[0].share, 0.75);
        assert_eq!(shares[1].category, Category::Food);
        assert_eq!(shares[1].amount, 500.0);

        // Income-only months have no slices
        let none = expense_by_category(by_month(&ledger, 2023, 12));
        assert!(none.is_empty());
    }

    #[test]
    fn test_monthly_summary_running_balance() {
        let ledger = sample();
        let months = monthly_summary(&ledger, 2024);

        // February has no rows and is skipped
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, 1);
        assert_eq!(months[0].month_name, "January");
        assert_eq!(months[0].balance, 2150.0);
        assert_eq!(months[0].cumulative, 2150.0);
        assert_eq!(months[1].month, 3);
        assert_eq!(months[1].balance, -2500.0);
        assert_eq!(months[1].cumulative, -350.0);
    }

    #[test]
    fn test_yearly_summary() {
        let years = yearly_summary(&sample());

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2023);
        assert_eq!(years[0].balance, 1000.0);
        assert_eq!(years[1].year, 2024);
        assert_eq!(years[1].balance, -350.0);
        assert_eq!(years[1].cumulative, 650.0);
    }
}

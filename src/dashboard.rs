// 📈 Dashboard - everything the dashboard page shows for one year/month selection
//
// Built once per render from the ledger; the TUI, the JSON API and the SVG
// renderer all read from the same bundle.

use crate::aggregate::{
    expense_by_category, monthly_summary, totals, yearly_summary, CategoryShare, MonthSummary,
    Totals, YearSummary,
};
use crate::config::Config;
use crate::ledger::Ledger;
use crate::query::{available_years, by_month, Selection};
use serde::Serialize;

pub const EMPTY_LEDGER_MESSAGE: &str = "Add data to see the dashboard.";
pub const NO_YEAR_DATA_MESSAGE: &str = "No data for this year.";

pub fn no_expenses_message(month_name: &str) -> String {
    format!("No expenses recorded in {}.", month_name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: &'static str,
    pub value: f64,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub selection: Selection,
    pub title: String,
    pub years: Vec<i32>,
    pub ledger_empty: bool,
    pub month_totals: Totals,
    pub kpis: Vec<Kpi>,
    /// Expense composition of the selected month (donut)
    pub expense_slices: Vec<CategoryShare>,
    /// Months of the selected year with data (bars, balance line, cumulative area)
    pub monthly: Vec<MonthSummary>,
    pub yearly: Vec<YearSummary>,
}

impl Dashboard {
    pub fn build(ledger: &Ledger, selection: Selection, config: &Config) -> Self {
        let month_rows = by_month(ledger, selection.year, selection.month);
        let month_totals = totals(month_rows.iter().copied());
        let expense_slices = expense_by_category(month_rows.iter().copied());

        let kpis = vec![
            Kpi {
                label: "Income",
                value: month_totals.income,
                formatted: config.money(month_totals.income),
            },
            Kpi {
                label: "Expenses",
                value: month_totals.expense,
                formatted: config.money(month_totals.expense),
            },
            Kpi {
                label: "Net Balance",
                value: month_totals.balance,
                formatted: config.money(month_totals.balance),
            },
        ];

        Dashboard {
            selection,
            title: format!("Detailed view: {}/{}", selection.month_name(), selection.year),
            years: available_years(ledger),
            ledger_empty: ledger.is_empty(),
            month_totals,
            kpis,
            expense_slices,
            monthly: monthly_summary(ledger, selection.year),
            yearly: yearly_summary(ledger),
        }
    }

    /// Message shown in place of the donut, if any
    pub fn donut_notice(&self) -> Option<String> {
        if self.ledger_empty {
            Some(EMPTY_LEDGER_MESSAGE.to_string())
        } else if self.expense_slices.is_empty() {
            Some(no_expenses_message(self.selection.month_name()))
        } else {
            None
        }
    }

    /// Message shown in place of the annual charts, if any
    pub fn annual_notice(&self) -> Option<&'static str> {
        if self.ledger_empty {
            Some(EMPTY_LEDGER_MESSAGE)
        } else if self.monthly.is_empty() {
            Some(NO_YEAR_DATA_MESSAGE)
        } else {
            None
        }
    }

    /// One formatted line per year with data: year, income, expense, balance, running balance
    pub fn year_overview(&self, config: &Config) -> Vec<String> {
        self.yearly
            .iter()
            .map(|y| {
                format!(
                    "{:<6} {:>16} {:>16} {:>16} {:>16}",
                    y.year,
                    config.money(y.income),
                    config.money(y.expense),
                    config.money(y.balance),
                    config.money(y.cumulative)
                )
            })
            .collect()
    }
}

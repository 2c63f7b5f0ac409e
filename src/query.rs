// 🔎 Filter / Query - year, month and text subsets of the ledger

use crate::error::EntryError;
use crate::ledger::{Ledger, Transaction};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Month number (1-12) to its name
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("?")
}

/// Month name (case-insensitive, full or three-letter) to its number
pub fn parse_month(name: &str) -> Result<u32, EntryError> {
    let wanted = name.trim().to_lowercase();
    if let Ok(n) = wanted.parse::<u32>() {
        if (1..=12).contains(&n) {
            return Ok(n);
        }
    }

    MONTH_NAMES
        .iter()
        .position(|m| {
            let m = m.to_lowercase();
            m == wanted || (wanted.len() == 3 && m.starts_with(&wanted))
        })
        .map(|i| i as u32 + 1)
        .ok_or_else(|| EntryError::UnknownMonth(name.to_string()))
}

/// Distinct years with data, ascending
pub fn available_years(ledger: &Ledger) -> Vec<i32> {
    let mut years: Vec<i32> = ledger.iter().map(|tx| tx.date.year()).collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Distinct months with data in `year`, ascending
pub fn months_in_year(ledger: &Ledger, year: i32) -> Vec<u32> {
    let mut months: Vec<u32> = ledger
        .iter()
        .filter(|tx| tx.date.year() == year)
        .map(|tx| tx.date.month())
        .collect();
    months.sort_unstable();
    months.dedup();
    months
}

/// Rows of one month of one year
pub fn by_month(ledger: &Ledger, year: i32, month: u32) -> Vec<&Transaction> {
    ledger
        .iter()
        .filter(|tx| tx.date.year() == year && tx.date.month() == month)
        .collect()
}

// ============================================================================
// SELECTION (dashboard year/month)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub year: i32,
    pub month: u32,
}

impl Selection {
    /// Most recent year with data (or this year), and the current month
    pub fn default_for(ledger: &Ledger, today: NaiveDate) -> Self {
        let year = available_years(ledger)
            .last()
            .copied()
            .unwrap_or_else(|| today.year());

        Selection {
            year,
            month: today.month(),
        }
    }

    pub fn today(ledger: &Ledger) -> Self {
        Self::default_for(ledger, Local::now().date_naive())
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }

    pub fn next_month(&mut self) {
        self.month = if self.month >= 12 { 1 } else { self.month + 1 };
    }

    pub fn previous_month(&mut self) {
        self.month = if self.month <= 1 { 12 } else { self.month - 1 };
    }

    /// Step through the years that have data, wrapping around
    pub fn cycle_year(&mut self, years: &[i32], forward: bool) {
        if years.is_empty() {
            return;
        }
        let pos = years.iter().position(|y| *y == self.year);
        let next = match (pos, forward) {
            (None, _) => years.len() - 1,
            (Some(i), true) => (i + 1) % years.len(),
            (Some(0), false) => years.len() - 1,
            (Some(i), false) => i - 1,
        };
        self.year = years[next];
    }
}

// ============================================================================
// FILTER (statement / editable grid)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub year: i32,

    /// None = every month ("All")
    #[serde(default)]
    pub month: Option<u32>,

    /// Case-insensitive substring of Description or Category
    #[serde(default)]
    pub text: Option<String>,
}

impl Filter {
    pub fn year(year: i32) -> Self {
        Filter {
            year,
            month: None,
            text: None,
        }
    }

    pub fn with_month(mut self, month: Option<u32>) -> Self {
        self.month = month;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        self
    }

    /// Most recent year first, as the statement page offers it
    pub fn default_for(ledger: &Ledger, today: NaiveDate) -> Self {
        let year = available_years(ledger)
            .last()
            .copied()
            .unwrap_or_else(|| today.year());
        Filter::year(year)
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if tx.date.year() != self.year {
            return false;
        }

        if let Some(month) = self.month {
            if tx.date.month() != month {
                return false;
            }
        }

        match self.text.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                tx.description.to_lowercase().contains(&needle)
                    || tx.category.label().to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    /// Matching rows with their position in the ledger
    pub fn apply<'a>(&self, ledger: &'a Ledger) -> Vec<(usize, &'a Transaction)> {
        ledger
            .iter()
            .enumerate()
            .filter(|(_, tx)| self.matches(tx))
            .collect()
    }

    /// Month choices for this filter's year: None ("All") then the months with data
    pub fn month_options(&self, ledger: &Ledger) -> Vec<Option<u32>> {
        std::iter::once(None)
            .chain(months_in_year(ledger, self.year).into_iter().map(Some))
            .collect()
    }

    pub fn describe(&self) -> String {
        let month = self.month.map(month_name).unwrap_or("All");
        match self.text.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                format!("{} / {} / \"{}\"", self.year, month, text.trim())
            }
            _ => format!("{} / {}", self.year, month),
        }
    }
}

/// Newest first; ties keep their ledger order
pub fn sort_for_display(rows: &mut [Transaction]) {
    rows.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::tx;
    use crate::ledger::{Category, TransactionType};

    fn sample() -> Ledger {
        Ledger::new(vec![
            tx("2023-11-20", Category::Food, "Market", 200.0, TransactionType::Expense),
            tx("2024-01-05", Category::Salary, "Monthly Salary", 3800.0, TransactionType::Income),
            tx("2024-01-09", Category::Transport, "Uber to work", 25.0, TransactionType::Expense),
            tx("2024-03-02", Category::Food, "Pizza", 60.0, TransactionType::Expense),
            tx("2024-03-15", Category::Leisure, "Cinema", 40.0, TransactionType::Expense),
        ])
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_available_years_and_months() {
        let ledger = sample();
        assert_eq!(available_years(&ledger), vec![2023, 2024]);
        assert_eq!(months_in_year(&ledger, 2024), vec![1, 3]);
        assert!(months_in_year(&ledger, 2022).is_empty());
    }

    #[test]
    fn test_month_subsets() {
        let ledger = sample();
        assert_eq!(by_month(&ledger, 2024, 3).len(), 2);
        assert!(by_month(&ledger, 2024, 2).is_empty());
    }

    #[test]
    fn test_text_filter_matches_description_or_category() {
        let ledger = sample();

        let uber = Filter::year(2024).with_text("UBER");
        let rows = uber.apply(&ledger);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, 2);

        // "food" only appears as a category label
        let food = Filter::year(2024).with_text("food");
        assert_eq!(food.apply(&ledger).len(), 1);

        let blank = Filter::year(2024).with_text("   ");
        assert_eq!(blank.text, None);
        assert_eq!(blank.apply(&ledger).len(), 4);
    }

    #[test]
    fn test_month_filter_and_options() {
        let ledger = sample();
        let filter = Filter::year(2024).with_month(Some(3));

        let positions: Vec<usize> = filter.apply(&ledger).into_iter().map(|(i, _)| i).collect();
        assert_eq!(positions, vec![3, 4]);
        assert_eq!(filter.month_options(&ledger), vec![None, Some(1), Some(3)]);
    }

    #[test]
    fn test_default_selection() {
        let ledger = sample();
        let sel = Selection::default_for(&ledger, date("2025-06-10"));
        assert_eq!(sel, Selection { year: 2024, month: 6 });

        let empty = Selection::default_for(&Ledger::default(), date("2025-06-10"));
        assert_eq!(empty, Selection { year: 2025, month: 6 });
    }

    #[test]
    fn test_selection_navigation() {
        let mut sel = Selection { year: 2024, month: 12 };
        sel.next_month();
        assert_eq!(sel.month, 1);
        sel.previous_month();
        assert_eq!(sel.month, 12);

        let years = [2022, 2023, 2024];
        sel.cycle_year(&years, true);
        assert_eq!(sel.year, 2022);
        sel.cycle_year(&years, false);
        assert_eq!(sel.year, 2024);
    }

    #[test]
    fn test_sort_for_display_newest_first() {
        let mut rows: Vec<Transaction> = sample().transactions;
        sort_for_display(&mut rows);
        assert_eq!(rows[0].description, "Cinema");
        assert_eq!(rows[4].description, "Market");
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "?");
        assert_eq!(parse_month("march"), Ok(3));
        assert_eq!(parse_month("Sep"), Ok(9));
        assert_eq!(parse_month("7"), Ok(7));
        assert!(parse_month("Smarch").is_err());
    }
}

// ✏️ Editor - the filtered, editable grid and its merge-save
//
// The grid holds a copy of the rows a filter selected, and remembers where in
// the ledger they came from. Saving drops exactly those rows and appends the
// grid rows in their place. Rows added to the file after the grid was opened
// are never touched.

use crate::error::EntryError;
use crate::ledger::{
    load_ledger, parse_amount, parse_date, save_ledger, Category, Ledger, Transaction,
    TransactionType, DATE_FORMAT,
};
use crate::query::{sort_for_display, Filter};
use anyhow::{bail, Result};
use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    Date,
    Category,
    Description,
    Amount,
    Type,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Date,
        Column::Category,
        Column::Description,
        Column::Amount,
        Column::Type,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::Category => "Category",
            Column::Description => "Description",
            Column::Amount => "Amount",
            Column::Type => "Type",
        }
    }

    /// Cell contents as the grid shows (and pre-fills) them
    pub fn text(&self, tx: &Transaction) -> String {
        match self {
            Column::Date => tx.date.format(DATE_FORMAT).to_string(),
            Column::Category => tx.category.label().to_string(),
            Column::Description => tx.description.clone(),
            Column::Amount => format!("{:.2}", tx.amount),
            Column::Type => tx.transaction_type.as_str().to_string(),
        }
    }

    /// Coerce `text` into this column of `tx`; on error `tx` is unchanged
    pub fn set(&self, tx: &mut Transaction, text: &str) -> Result<(), EntryError> {
        match self {
            Column::Date => tx.date = parse_date(text)?,
            Column::Category => tx.category = text.parse::<Category>()?,
            Column::Description => tx.description = text.to_string(),
            Column::Amount => tx.amount = parse_amount(text)?,
            Column::Type => tx.transaction_type = text.parse::<TransactionType>()?,
        }
        Ok(())
    }
}

/// Replace the rows `filter` selects in `ledger` with `edited`
pub fn merge_save(ledger: &Ledger, filter: &Filter, edited: Vec<Transaction>) -> Ledger {
    let positions: Vec<usize> = filter.apply(ledger).into_iter().map(|(i, _)| i).collect();
    log::debug!("Merge-save [{}]", filter.describe());
    replace_rows(ledger, &positions, edited)
}

/// Drop the rows at `positions`, then append `edited`
pub fn replace_rows(ledger: &Ledger, positions: &[usize], edited: Vec<Transaction>) -> Ledger {
    let drop: HashSet<usize> = positions.iter().copied().collect();

    let mut kept: Vec<Transaction> = ledger
        .iter()
        .enumerate()
        .filter(|(i, _)| !drop.contains(i))
        .map(|(_, tx)| tx.clone())
        .collect();

    log::debug!(
        "Replacing {} of {} rows with {}",
        ledger.len() - kept.len(),
        ledger.len(),
        edited.len()
    );

    kept.extend(edited);
    Ledger::new(kept)
}

// ============================================================================
// EDIT SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct EditSession {
    pub filter: Filter,
    pub rows: Vec<Transaction>,
    /// Ledger position and content of every row the filter selected at open
    opened: Vec<(usize, Transaction)>,
    dirty: bool,
}

impl EditSession {
    /// Snapshot the rows `filter` selects, newest first
    pub fn open(ledger: &Ledger, filter: Filter) -> Self {
        let opened: Vec<(usize, Transaction)> = filter
            .apply(ledger)
            .into_iter()
            .map(|(i, tx)| (i, tx.clone()))
            .collect();

        let mut rows: Vec<Transaction> = opened.iter().map(|(_, tx)| tx.clone()).collect();
        sort_for_display(&mut rows);

        EditSession {
            filter,
            rows,
            opened,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// "Showing N records."
    pub fn caption(&self) -> String {
        format!("Showing {} records.", self.rows.len())
    }

    pub fn set_cell(&mut self, row: usize, column: Column, text: &str) -> Result<(), EntryError> {
        let tx = self.rows.get_mut(row).ok_or(EntryError::NoSuchRow(row))?;
        column.set(tx, text)?;
        self.dirty = true;
        Ok(())
    }

    pub fn delete_row(&mut self, row: usize) -> Result<Transaction, EntryError> {
        if row >= self.rows.len() {
            return Err(EntryError::NoSuchRow(row));
        }
        self.dirty = true;
        Ok(self.rows.remove(row))
    }

    /// New rows go on top of the grid
    pub fn insert_row(&mut self, tx: Transaction) {
        self.rows.insert(0, tx);
        self.dirty = true;
    }

    /// Ledger with this grid merged in (nothing is written).
    ///
    /// Only the rows the grid was opened with are replaced; rows appended to
    /// `ledger` since then are kept. Fails if an opened row has moved or changed.
    pub fn merged(&self, ledger: &Ledger) -> Result<Ledger> {
        for (i, original) in &self.opened {
            if ledger.transactions.get(*i) != Some(original) {
                bail!(
                    "The ledger changed on disk since the table was opened (row {}); reload and edit again",
                    i + 1
                );
            }
        }

        let positions: Vec<usize> = self.opened.iter().map(|(i, _)| *i).collect();
        Ok(replace_rows(ledger, &positions, self.rows.clone()))
    }

    /// Merge into the persisted ledger and write it back; returns the new ledger
    pub fn save(&mut self, path: &Path) -> Result<Ledger> {
        let ledger = load_ledger(path)?;
        let merged = self.merged(&ledger)?;
        save_ledger(path, &merged)?;

        self.dirty = false;
        log::info!(
            "Saved grid [{}]: {} rows, ledger now {}",
            self.filter.describe(),
            self.rows.len(),
            merged.len()
        );

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{temp_ledger_path, tx};

    fn sample() -> Ledger {
        Ledger::new(vec![
            tx("2024-01-05", Category::Salary, "Monthly Salary", 3800.0, TransactionType::Income),
            tx("2024-02-03", Category::Food, "Pizza", 50.0, TransactionType::Expense),
            tx("2024-02-10", Category::Transport, "Uber", 20.0, TransactionType::Expense),
            tx("2023-02-10", Category::Transport, "Uber", 18.0, TransactionType::Expense),
        ])
    }

    #[test]
    fn test_open_snapshots_filtered_rows_newest_first() {
        let session = EditSession::open(&sample(), Filter::year(2024).with_month(Some(2)));

        assert_eq!(session.len(), 2);
        assert_eq!(session.rows[0].description, "Uber");
        assert_eq!(session.rows[1].description, "Pizza");
        assert_eq!(session.caption(), "Showing 2 records.");
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_merge_leaves_unfiltered_rows_untouched() {
        let ledger = sample();
        let filter = Filter::year(2024).with_text("uber");
        let mut session = EditSession::open(&ledger, filter);

        session.set_cell(0, Column::Amount, "abc").unwrap_err();
        session.set_cell(0, Column::Amount, "25.00").unwrap();
        let merged = session.merged(&ledger).unwrap();

        assert_eq!(merged.len(), 4);
        // The 2023 Uber ride is outside the filter
        assert!(merged.iter().any(|t| t.date.to_string() == "2023-02-10" && t.amount == 18.0));
        assert!(merged.iter().any(|t| t.date.to_string() == "2024-02-10" && t.amount == 25.0));
    }

    #[test]
    fn test_delete_and_insert_rows() {
        let ledger = sample();
        let mut session = EditSession::open(&ledger, Filter::year(2024));

        let removed = session.delete_row(2).unwrap();
        assert_eq!(removed.description, "Monthly Salary");
        assert_eq!(session.delete_row(9), Err(EntryError::NoSuchRow(9)));

        session.insert_row(tx("2024-03-01", Category::Health, "Dentist", 120.0, TransactionType::Expense));
        assert!(session.is_dirty());

        let merged = session.merged(&ledger).unwrap();
        assert_eq!(merged.len(), 4);
        assert!(!merged.iter().any(|t| t.description == "Monthly Salary"));
        assert!(merged.iter().any(|t| t.description == "Dentist"));
    }

    #[test]
    fn test_invalid_cell_keeps_value() {
        let mut session = EditSession::open(&sample(), Filter::year(2024));
        let before = session.rows[0].clone();

        assert!(session.set_cell(0, Column::Date, "yesterday").is_err());
        assert!(session.set_cell(0, Column::Category, "Groceries").is_err());
        assert!(session.set_cell(0, Column::Type, "Transfer").is_err());
        assert_eq!(session.rows[0], before);
        assert!(!session.is_dirty());

        session.set_cell(0, Column::Type, "income").unwrap();
        assert_eq!(session.rows[0].transaction_type, TransactionType::Income);
    }

    #[test]
    fn test_edit_moving_row_out_of_filter_is_kept() {
        let ledger = sample();
        let mut session = EditSession::open(&ledger, Filter::year(2024).with_month(Some(1)));

        session.set_cell(0, Column::Date, "2024-04-05").unwrap();
        let merged = session.merged(&ledger).unwrap();

        assert_eq!(merged.len(), 4);
        assert!(merged.iter().any(|t| t.description == "Monthly Salary" && t.date.to_string() == "2024-04-05"));
    }

    #[test]
    fn test_save_persists_merge() {
        let path = temp_ledger_path("editor");
        save_ledger(&path, &sample()).unwrap();

        let ledger = load_ledger(&path).unwrap();
        let mut session = EditSession::open(&ledger, Filter::year(2023));
        session.set_cell(0, Column::Description, "Uber airport").unwrap();
        let saved = session.save(&path).unwrap();

        assert!(!session.is_dirty());
        assert_eq!(saved, load_ledger(&path).unwrap());
        assert!(saved.iter().any(|t| t.description == "Uber airport"));
        assert_eq!(saved.len(), 4);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_keeps_rows_appended_after_open() {
        let path = temp_ledger_path("editor-append");
        save_ledger(&path, &sample()).unwrap();

        let ledger = load_ledger(&path).unwrap();
        let mut session = EditSession::open(&ledger, Filter::year(2024));
        session.set_cell(0, Column::Amount, "22.00").unwrap();

        // Matches the filter, but was not part of the grid
        crate::ledger::append_transactions(
            &path,
            &[tx("2024-02-15", Category::Benefits, "Meal Voucher", 350.0, TransactionType::Income)],
        )
        .unwrap();

        let saved = session.save(&path).unwrap();
        assert_eq!(saved.len(), 5);
        assert!(saved.iter().any(|t| t.description == "Meal Voucher"));
        assert!(saved.iter().any(|t| t.description == "Uber" && t.amount == 22.0));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_refuses_when_opened_rows_changed() {
        let path = temp_ledger_path("editor-changed");
        save_ledger(&path, &sample()).unwrap();

        let ledger = load_ledger(&path).unwrap();
        let mut session = EditSession::open(&ledger, Filter::year(2024));
        session.delete_row(0).unwrap();

        // Someone else rewrote the file in the meantime
        save_ledger(&path, &Ledger::new(ledger.transactions[1..].to_vec())).unwrap();

        assert!(session.save(&path).is_err());
        assert!(session.is_dirty());
        assert_eq!(load_ledger(&path).unwrap().len(), 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_merge_save_by_filter() {
        let merged = merge_save(&sample(), &Filter::year(2023), vec![]);
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|t| t.date.to_string().starts_with("2024")));
    }

    #[test]
    fn test_column_text() {
        let row = tx("2024-02-03", Category::FixedBills, "Power", 80.5, TransactionType::Expense);
        let cells: Vec<String> = Column::ALL.iter().map(|c| c.text(&row)).collect();
        assert_eq!(cells, vec!["2024-02-03", "Fixed Bills", "Power", "80.50", "Expense"]);
    }
}

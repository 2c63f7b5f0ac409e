// Finance Dashboard - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod error;
pub mod ledger;
pub mod config;
pub mod query;      // Year/month/text selection over the ledger
pub mod aggregate;  // Totals, category shares, monthly and yearly series
pub mod entries;    // Payday template + manual entry form
pub mod editor;     // Editable statement grid with merge-save
pub mod dashboard;
pub mod charts;     // SVG rendering

#[cfg(feature = "server")]
pub mod api;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::EntryError;
pub use ledger::{
    Transaction, TransactionType, Category, Ledger,
    load_ledger, save_ledger, append_transactions,
};
pub use config::{Config, format_money};
pub use query::{Filter, Selection, available_years, months_in_year, month_name, parse_month};
pub use aggregate::{
    Totals, CategoryShare, MonthSummary, YearSummary,
    totals, expense_by_category, monthly_summary, yearly_summary,
};
pub use entries::{EntryForm, EntryKind, payday_rows, record_payday, record_entry};
pub use editor::{Column, EditSession, merge_save};
pub use dashboard::Dashboard;
pub use charts::{ChartKind, export_all};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

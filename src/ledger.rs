// 📒 Ledger Store - the single flat table of transactions, persisted as CSV
//
// Columns: Date, Category, Description, Amount, Type
// The table is unordered on disk; ordering only happens at render time.

use crate::error::EntryError;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Header row written at the top of every ledger file
pub const COLUMNS: [&str; 5] = ["Date", "Category", "Description", "Amount", "Type"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// TRANSACTION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = EntryError;

    /// Case-insensitive; also accepts the Portuguese labels older files use
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "receita" => Ok(TransactionType::Income),
            "expense" | "despesa" => Ok(TransactionType::Expense),
            _ => Err(EntryError::UnknownType(s.to_string())),
        }
    }
}

impl TryFrom<String> for TransactionType {
    type Error = EntryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// CATEGORY (fixed label set)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    // Template income
    Salary,
    Benefits,

    // Variable entries
    FixedBills,
    Housing,
    Food,
    Transport,
    Leisure,
    Education,
    Investments,
    Health,
    Loans,
    Other,
}

impl Category {
    /// Every label, in the order the entry form offers them
    pub const ALL: [Category; 12] = [
        Category::FixedBills,
        Category::Housing,
        Category::Food,
        Category::Transport,
        Category::Leisure,
        Category::Education,
        Category::Investments,
        Category::Health,
        Category::Loans,
        Category::Other,
        Category::Salary,
        Category::Benefits,
    ];

    /// Categories offered by the manual entry form
    pub const FORM: [Category; 10] = [
        Category::FixedBills,
        Category::Housing,
        Category::Food,
        Category::Transport,
        Category::Leisure,
        Category::Education,
        Category::Investments,
        Category::Health,
        Category::Loans,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Salary => "Salary",
            Category::Benefits => "Benefits",
            Category::FixedBills => "Fixed Bills",
            Category::Housing => "Housing",
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Leisure => "Leisure",
            Category::Education => "Education",
            Category::Investments => "Investments",
            Category::Health => "Health",
            Category::Loans => "Loans",
            Category::Other => "Other",
        }
    }

    /// Portuguese label used by older `financas.csv` files
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Category::Salary => "Salário",
            Category::Benefits => "Benefícios",
            Category::FixedBills => "Contas Fixas",
            Category::Housing => "Moradia",
            Category::Food => "Alimentação",
            Category::Transport => "Transporte",
            Category::Leisure => "Lazer",
            Category::Education => "Educação",
            Category::Investments => "Investimentos",
            Category::Health => "Saúde",
            Category::Loans => "Empréstimos",
            Category::Other => "Outros",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = EntryError;

    /// Case-insensitive; the Portuguese labels are accepted too
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .find(|c| c.label().to_lowercase() == wanted || c.legacy_label().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| EntryError::UnknownCategory(s.to_string()))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// One ledger row. Duplicates are allowed and indistinguishable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Date", alias = "Data", with = "date_column")]
    pub date: NaiveDate,

    #[serde(rename = "Category", alias = "Categoria")]
    pub category: Category,

    #[serde(rename = "Description", alias = "Descricao", default)]
    pub description: String,

    #[serde(
        rename = "Amount",
        alias = "Valor",
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub amount: f64,

    #[serde(rename = "Type", alias = "Tipo")]
    pub transaction_type: TransactionType,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        category: Category,
        description: &str,
        amount: f64,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            date,
            category,
            description: description.to_string(),
            amount,
            transaction_type,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }
}

fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", amount))
}

/// Amounts come back either as numbers (JSON clients) or as the text we write
fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    struct AmountVisitor;

    impl<'de> serde::de::Visitor<'de> for AmountVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an amount as a number or text")
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<f64, E> {
            parse_amount(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

/// Parse a date cell; a trailing time part (`2024-03-01 00:00:00`) is dropped
pub fn parse_date(raw: &str) -> Result<NaiveDate, EntryError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| EntryError::InvalidDate(raw.to_string()))
}

/// Parse an amount cell, tolerating a currency prefix and thousands separators
pub fn parse_amount(raw: &str) -> Result<f64, EntryError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(|c: char| c.is_alphabetic() || c == '$')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EntryError::InvalidAmount(raw.to_string()))
}

mod date_column {
    use super::{parse_date, DATE_FORMAT};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// The complete collection of persisted transactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn extend<I: IntoIterator<Item = Transaction>>(&mut self, rows: I) {
        self.transactions.extend(rows);
    }
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// Load the ledger; a missing file is an empty ledger
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        log::info!("No ledger at {:?}, starting empty", path);
        return Ok(Ledger::default());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open ledger file: {:?}", path))?;

    let mut transactions = Vec::new();

    for (i, result) in rdr.deserialize().enumerate() {
        let transaction: Transaction = result
            .with_context(|| format!("Failed to read record {} of {:?}", i + 1, path))?;
        transactions.push(transaction);
    }

    log::debug!("Loaded {} transactions from {:?}", transactions.len(), path);

    Ok(Ledger::new(transactions))
}

/// Overwrite the ledger file with every transaction (header always written)
pub fn save_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create ledger file: {:?}", path))?;

    wtr.write_record(COLUMNS)?;
    for tx in &ledger.transactions {
        wtr.serialize(tx).context("Failed to write transaction")?;
    }
    wtr.flush()?;

    log::info!("Saved {} transactions to {:?}", ledger.len(), path);

    Ok(())
}

/// Append rows to the persisted ledger and return the reloaded ledger
pub fn append_transactions(path: &Path, rows: &[Transaction]) -> Result<Ledger> {
    let mut ledger = load_ledger(path)?;
    ledger.extend(rows.iter().cloned());
    save_ledger(path, &ledger)?;

    load_ledger(path)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Unique scratch file under the system temp dir
    pub(crate) fn temp_ledger_path(tag: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "finance-dashboard-{}-{}-{}.csv",
            tag,
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    /// Helper function to build test transactions
    pub(crate) fn tx(
        date: &str,
        category: Category,
        description: &str,
        amount: f64,
        transaction_type: TransactionType,
    ) -> Transaction {
        Transaction::new(
            parse_date(date).unwrap(),
            category,
            description,
            amount,
            transaction_type,
        )
    }

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let path = temp_ledger_path("missing");
        let ledger = load_ledger(&path).unwrap();

        assert!(ledger.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_save_then_load_preserves_rows() {
        let path = temp_ledger_path("save");
        let ledger = Ledger::new(vec![
            tx("2024-03-05", Category::Food, "Pizza", 42.5, TransactionType::Expense),
            tx("2024-03-05", Category::Food, "Pizza", 42.5, TransactionType::Expense),
            tx("2024-03-01", Category::Salary, "Monthly Salary", 3800.0, TransactionType::Income),
        ]);

        save_ledger(&path, &ledger).unwrap();
        let loaded = load_ledger(&path).unwrap();

        // Duplicates survive untouched
        assert_eq!(loaded, ledger);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_format() {
        let path = temp_ledger_path("format");
        let ledger = Ledger::new(vec![tx(
            "2024-01-10",
            Category::FixedBills,
            "Internet, fiber",
            99.9,
            TransactionType::Expense,
        )]);

        save_ledger(&path, &ledger).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert_eq!(
            content,
            "Date,Category,Description,Amount,Type\n2024-01-10,Fixed Bills,\"Internet, fiber\",99.90,Expense\n"
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_empty_ledger_still_writes_header() {
        let path = temp_ledger_path("header");
        save_ledger(&path, &Ledger::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Date,Category,Description,Amount,Type\n");
        assert!(load_ledger(&path).unwrap().is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_coerces_legacy_cells() {
        let path = temp_ledger_path("legacy");
        std::fs::write(
            &path,
            "Date,Category,Description,Amount,Type\n\
             2023-12-01 00:00:00,salary,Monthly Salary,3800,Receita\n\
             2023-12-02,Food,,12.345,despesa\n",
        )
        .unwrap();

        let ledger = load_ledger(&path).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.transactions[0].date, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(ledger.transactions[0].category, Category::Salary);
        assert_eq!(ledger.transactions[0].transaction_type, TransactionType::Income);
        assert_eq!(ledger.transactions[1].description, "");
        assert_eq!(ledger.transactions[1].amount, 12.345);
        assert_eq!(ledger.transactions[1].transaction_type, TransactionType::Expense);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_portuguese_ledger() {
        let path = temp_ledger_path("pt");
        std::fs::write(
            &path,
            "Data,Categoria,Descricao,Valor,Tipo\n\
             2024-01-05,Salário,Salário Mensal,3800.0,Receita\n\
             2024-01-06,Alimentação,Mercado,\"1,234.50\",Despesa\n",
        )
        .unwrap();

        let ledger = load_ledger(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.transactions[0].category, Category::Salary);
        assert_eq!(ledger.transactions[1].category, Category::Food);
        assert_eq!(ledger.transactions[1].amount, 1234.5);
        assert_eq!(ledger.transactions[1].transaction_type, TransactionType::Expense);

        // Rewritten with the English header and labels
        save_ledger(&path, &ledger).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Date,Category,Description,Amount,Type\n"));
        assert!(content.contains("Food,Mercado,1234.50,Expense"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_amount_accepts_number_or_text_in_json() {
        let row: Transaction = serde_json::from_str(
            r#"{"Date":"2024-01-09","Category":"Transport","Description":"Uber","Amount":"25.00","Type":"Expense"}"#,
        )
        .unwrap();
        assert_eq!(row.amount, 25.0);

        let row: Transaction = serde_json::from_str(
            r#"{"Date":"2024-01-09","Category":"Transport","Amount":25,"Type":"Expense"}"#,
        )
        .unwrap();
        assert_eq!(row.amount, 25.0);

        let bad = serde_json::from_str::<Transaction>(
            r#"{"Date":"2024-01-09","Category":"Transport","Amount":"lots","Type":"Expense"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_load_reports_bad_record() {
        let path = temp_ledger_path("bad");
        std::fs::write(
            &path,
            "Date,Category,Description,Amount,Type\n2024-01-01,Food,x,abc,Expense\n",
        )
        .unwrap();

        let err = load_ledger(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("record 1"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_append_transactions() {
        let path = temp_ledger_path("append");

        let first = append_transactions(
            &path,
            &[tx("2024-02-01", Category::Health, "Pharmacy", 30.0, TransactionType::Expense)],
        )
        .unwrap();
        assert_eq!(first.len(), 1);

        let second = append_transactions(
            &path,
            &[tx("2024-02-02", Category::Transport, "Bus", 4.4, TransactionType::Expense)],
        )
        .unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second.transactions[1].description, "Bus");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_parse_amount_coercion() {
        assert_eq!(parse_amount("3800"), Ok(3800.0));
        assert_eq!(parse_amount(" R$ 3,800.50 "), Ok(3800.5));
        assert!(parse_amount("twelve").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.label().parse::<Category>(), Ok(category));
        }
        assert!("Groceries".parse::<Category>().is_err());
        assert_eq!("alimentação".parse::<Category>(), Ok(Category::Food));
        assert_eq!("Contas Fixas".parse::<Category>(), Ok(Category::FixedBills));
        assert_eq!("fixed bills".parse::<Category>(), Ok(Category::FixedBills));
    }
}

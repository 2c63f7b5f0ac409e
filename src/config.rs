// ⚙️ Configuration - defaults, optional JSON file, environment overrides
//
// Precedence (lowest → highest): defaults, config file, FINANCE_* env vars,
// then whatever the binary applies from its own flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "FINANCE_CONFIG";
pub const ENV_DATA_FILE: &str = "FINANCE_DATA_FILE";
pub const ENV_SALARY: &str = "FINANCE_SALARY";
pub const ENV_MEAL_VOUCHER: &str = "FINANCE_MEAL_VOUCHER";
pub const ENV_CURRENCY: &str = "FINANCE_CURRENCY";
pub const ENV_ADDR: &str = "FINANCE_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger CSV file
    pub data_file: PathBuf,

    /// Payday template: monthly salary
    pub salary: f64,

    /// Payday template: meal voucher
    pub meal_voucher: f64,

    /// Prefix used when formatting money
    pub currency_symbol: String,

    /// Bind address for the HTTP server
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: PathBuf::from("financas.csv"),
            salary: 3800.00,
            meal_voucher: 350.00,
            currency_symbol: "R$".to_string(),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Load config from JSON file (missing keys keep their defaults)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Resolve the full layering: explicit file, else $FINANCE_CONFIG, then env overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut config = match file {
            Some(path) => {
                log::debug!("Reading config from {:?}", path);
                Config::from_file(&path)?
            }
            None => Config::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Apply FINANCE_* overrides from any key lookup (env in production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATA_FILE) {
            self.data_file = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_SALARY) {
            self.salary = raw
                .trim()
                .parse()
                .with_context(|| format!("{} is not a number: {:?}", ENV_SALARY, raw))?;
        }
        if let Some(raw) = lookup(ENV_MEAL_VOUCHER) {
            self.meal_voucher = raw
                .trim()
                .parse()
                .with_context(|| format!("{} is not a number: {:?}", ENV_MEAL_VOUCHER, raw))?;
        }
        if let Some(symbol) = lookup(ENV_CURRENCY) {
            self.currency_symbol = symbol;
        }
        if let Some(addr) = lookup(ENV_ADDR) {
            self.server_addr = addr;
        }

        Ok(())
    }

    /// `R$ 3,800.00`
    pub fn money(&self, value: f64) -> String {
        format_money(&self.currency_symbol, value)
    }
}

/// Two decimals with thousands separators, sign before the symbol
pub fn format_money(symbol: &str, value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{} {}.{:02}", sign, symbol, grouped, frac)
}

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use finance_dashboard::aggregate::monthly_summary;
use finance_dashboard::ledger::parse_date;
use finance_dashboard::query::parse_month;
use finance_dashboard::{
    export_all, load_ledger, record_entry, record_payday, Category, Config, Dashboard,
    EditSession, EntryForm, EntryKind, Filter, Selection,
};

#[derive(Parser, Debug)]
#[command(name = "finance-dashboard", version, about = "Personal finance tracker")]
struct Cli {
    /// JSON config file (falls back to $FINANCE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger CSV file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal dashboard (default)
    Ui,

    /// Record salary and meal voucher
    Payday {
        /// Defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Record one expense or extra income
    Add {
        amount: f64,

        #[arg(long, value_parser = parse_category, default_value = "Fixed Bills")]
        category: Category,

        #[arg(long, default_value = "")]
        description: String,

        /// Record as extra income instead of an expense
        #[arg(long)]
        income: bool,

        /// Defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// KPIs, spending breakdown and monthly overview
    Summary {
        #[arg(long)]
        year: Option<i32>,

        /// Name, abbreviation or number
        #[arg(long, value_parser = parse_month)]
        month: Option<u32>,
    },

    /// Statement rows, newest first
    List {
        #[arg(long)]
        year: Option<i32>,

        #[arg(long, value_parser = parse_month)]
        month: Option<u32>,

        /// Matches description or category
        #[arg(long)]
        search: Option<String>,
    },

    /// Write the three dashboard charts as SVG
    ExportCharts {
        #[arg(long, default_value = "charts")]
        out: PathBuf,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, value_parser = parse_month)]
        month: Option<u32>,
    },
}

fn parse_category(raw: &str) -> Result<Category, finance_dashboard::EntryError> {
    raw.parse()
}

fn main() {
    if let Err(err) = run() {
        eprintln!("❌ {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_file = data;
    }

    let command = cli.command.unwrap_or(Command::Ui);

    // Keep the alternate screen clean: only warnings while the TUI runs
    let default_filter = if matches!(command, Command::Ui) { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let today = Local::now().date_naive();

    match command {
        Command::Ui => run_ui_mode(config, today)?,
        Command::Payday { date } => {
            let date = date.unwrap_or(today);
            let ledger = record_payday(&config.data_file, date, &config)?;
            println!("✓ Salary and voucher recorded for {}", date);
            println!("✓ Ledger now holds {} transactions", ledger.len());
        }
        Command::Add {
            amount,
            category,
            description,
            income,
            date,
        } => {
            let form = EntryForm {
                date: date.unwrap_or(today),
                kind: if income {
                    EntryKind::ExtraIncome
                } else {
                    EntryKind::Expense
                },
                amount,
                category,
                description,
            };
            let ledger = record_entry(&config.data_file, &form)?;
            println!(
                "✓ Transaction saved: {} {} {}",
                form.kind.label(),
                config.money(amount),
                category.label()
            );
            println!("✓ Ledger now holds {} transactions", ledger.len());
        }
        Command::Summary { year, month } => run_summary(&config, today, year, month)?,
        Command::List {
            year,
            month,
            search,
        } => run_list(&config, today, year, month, search)?,
        Command::ExportCharts { out, year, month } => {
            let ledger = load_ledger(&config.data_file)?;
            let selection = selection_for(&ledger, today, year, month);
            let dash = Dashboard::build(&ledger, selection, &config);

            for path in export_all(&out, &dash, &config)? {
                println!("✓ {}", path.display());
            }
        }
    }

    Ok(())
}

fn selection_for(
    ledger: &finance_dashboard::Ledger,
    today: NaiveDate,
    year: Option<i32>,
    month: Option<u32>,
) -> Selection {
    let mut selection = Selection::default_for(ledger, today);
    if let Some(year) = year {
        selection.year = year;
    }
    if let Some(month) = month {
        selection.month = month;
    }
    selection
}

fn run_summary(config: &Config, today: NaiveDate, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let ledger = load_ledger(&config.data_file)?;
    let dash = Dashboard::build(&ledger, selection_for(&ledger, today, year, month), config);

    if dash.ledger_empty {
        println!("{}", finance_dashboard::dashboard::EMPTY_LEDGER_MESSAGE);
        return Ok(());
    }

    println!("📊 {}", dash.title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for kpi in &dash.kpis {
        println!("  {:<12} {:>18}", kpi.label, kpi.formatted);
    }

    println!("\n🍩 Spending breakdown ({})", dash.selection.month_name());
    match dash.donut_notice() {
        Some(message) => println!("  {}", message),
        None => {
            for slice in &dash.expense_slices {
                println!(
                    "  {:<12} {:>18} {:>6.1}%",
                    slice.category.label(),
                    config.money(slice.amount),
                    slice.share * 100.0
                );
            }
        }
    }

    println!("\n📅 Monthly overview {}", dash.selection.year);
    match dash.annual_notice() {
        Some(message) => println!("  {}", message),
        None => {
            println!(
                "  {:<10} {:>16} {:>16} {:>16} {:>16}",
                "Month", "Income", "Expense", "Balance", "Cumulative"
            );
            for m in monthly_summary(&ledger, dash.selection.year) {
                println!(
                    "  {:<10} {:>16} {:>16} {:>16} {:>16}",
                    m.month_name,
                    config.money(m.income),
                    config.money(m.expense),
                    config.money(m.balance),
                    config.money(m.cumulative)
                );
            }
        }
    }

    println!("\n🗓️  Year by year");
    println!(
        "  {:<6} {:>16} {:>16} {:>16} {:>16}",
        "Year", "Income", "Expense", "Balance", "Cumulative"
    );
    for line in dash.year_overview(config) {
        println!("  {}", line);
    }

    Ok(())
}

fn run_list(
    config: &Config,
    today: NaiveDate,
    year: Option<i32>,
    month: Option<u32>,
    search: Option<String>,
) -> Result<()> {
    let ledger = load_ledger(&config.data_file)?;

    let mut filter = Filter::default_for(&ledger, today).with_month(month);
    if let Some(year) = year {
        filter.year = year;
    }
    if let Some(text) = search {
        filter = filter.with_text(&text);
    }

    let session = EditSession::open(&ledger, filter);
    println!("🧾 Statement {}", session.filter.describe());
    for tx in &session.rows {
        println!(
            "  {}  {:<12} {:<30} {:>16}  {}",
            tx.date,
            tx.category.label(),
            tx.description,
            config.money(tx.amount),
            tx.transaction_type.as_str()
        );
    }
    println!("{}", session.caption());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: Config, today: NaiveDate) -> Result<()> {
    use finance_dashboard::ui;

    println!("🖥️  Loading Finance Dashboard...\n");
    let ledger = load_ledger(&config.data_file)?;
    println!("✓ Loaded {} transactions from {:?}", ledger.len(), config.data_file);

    let mut app = ui::App::new(config, ledger, today);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: Config, _today: NaiveDate) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin finance-server --features server");
    std::process::exit(1);
}

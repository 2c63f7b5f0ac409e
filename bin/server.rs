// Finance Dashboard - Web Server
// JSON API + SVG charts with Axum

use anyhow::{Context, Result};
use clap::Parser;
use finance_dashboard::api::{router, AppState};
use finance_dashboard::{Config, VERSION};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "finance-server", version, about = "Personal finance dashboard over HTTP")]
struct Args {
    /// JSON config file (falls back to $FINANCE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ledger CSV file
    #[arg(long)]
    data: Option<PathBuf>,

    /// Bind address, e.g. 127.0.0.1:3000
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(data) = args.data {
        config.data_file = data;
    }
    if let Some(addr) = args.addr {
        config.server_addr = addr;
    }

    println!("🌐 Finance Dashboard v{} - Web Server", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config.data_file.exists() {
        println!("✓ Ledger: {:?}", config.data_file);
    } else {
        println!("✓ Ledger: {:?} (will be created on first entry)", config.data_file);
    }

    let addr = config.server_addr.clone();
    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/transactions", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

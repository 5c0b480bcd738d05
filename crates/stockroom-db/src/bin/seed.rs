//! # Seed Data Generator
//!
//! Populates a database with a small demo catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named in stockroom.toml / STOCKROOM_DATABASE_PATH
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/store.db
//!
//! # Read settings from another file
//! cargo run -p stockroom-db --bin seed -- --config ./dev.toml
//! ```
//!
//! ## Generated Data
//! - One product per catalogue entry, each with two lots received from
//!   different suppliers at different costs
//! - One credit client
//! - One sale on account and one partial payment, so balances show up
//!
//! Log verbosity follows `RUST_LOG`.

use std::env;
use std::path::PathBuf;

use stockroom_core::{
    Money, NewClient, NewProduct, NewTransaction, NewTransactionItem, Quantity, TransactionType,
};
use stockroom_db::{Database, DbResult, Settings};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (name, barcode, price in cents, first lot cost in cents)
const CATALOGUE: &[(&str, &str, i64, i64)] = &[
    ("Coffee Beans 1kg", "5901234123457", 1_899, 1_150),
    ("Green Tea 100 bags", "5901234123464", 649, 380),
    ("Oat Milk 1L", "5901234123471", 299, 170),
    ("Brown Sugar 500g", "5901234123488", 249, 120),
    ("Paper Cups x50", "5901234123495", 499, 260),
    ("Espresso Tamper", "5901234123501", 2_450, 1_400),
];

const SUPPLIERS: &[&str] = &["North Wholesale", "Harbor Imports"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (overrides settings)");
                println!("  -c, --config <PATH>    Settings file (default: stockroom.toml)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut settings = match &config_path {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(path) = db_path {
        settings.database_path = path;
    }

    info!(path = %settings.database_path.display(), "Seeding database");

    let db = Database::new(settings.db_config()).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(
            existing,
            "Database already has products; skipping seed to avoid duplicates"
        );
        return Ok(());
    }

    let start = std::time::Instant::now();
    seed(&db).await?;

    info!(elapsed = ?start.elapsed(), "Seed complete");
    db.close().await;
    Ok(())
}

async fn seed(db: &Database) -> DbResult<()> {
    let mut product_ids = Vec::with_capacity(CATALOGUE.len());

    for (idx, (name, barcode, price, cost)) in CATALOGUE.iter().enumerate() {
        let product = db
            .products()
            .create_product(NewProduct {
                name: name.to_string(),
                description: None,
                price: Money::from_cents(*price),
                barcode: Some(barcode.to_string()),
            })
            .await?;

        for (lot_idx, supplier) in SUPPLIERS.iter().enumerate() {
            // second supplier is a little dearer and delivers less
            let unit_cost = Money::from_cents(cost + lot_idx as i64 * cost / 10);
            let quantity = Quantity::from_units(24 - (lot_idx as i64 * 12) + idx as i64);

            db.stock()
                .receive_stock(product.id, supplier, quantity, unit_cost)
                .await?;
        }

        info!(product_id = product.id, name = %product.name, "Product seeded");
        product_ids.push(product.id);
    }

    let client = db
        .clients()
        .create_client(NewClient {
            name: "Riverside Cafe".to_string(),
            contact: Some("orders@riverside.example".to_string()),
            address: Some("12 Quay Street".to_string()),
            credit_limit: Money::from_cents(50_000),
        })
        .await?;

    let mut sale = NewTransaction::new(TransactionType::Sale).for_client(client.id);
    for product_id in product_ids.iter().take(3) {
        sale = sale.item(NewTransactionItem::new(*product_id, Quantity::from_units(2)));
    }
    let committed = db.transactions().commit(sale).await?;

    let half = Money::from_cents(committed.transaction.total_amount.cents() / 2);
    if half.is_positive() {
        db.transactions()
            .record_payment(committed.transaction.id, half)
            .await?;
    }

    let balance = db.clients().outstanding_balance(client.id).await?;
    info!(client_id = client.id, balance = %balance, "Client seeded with an open balance");

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - ERROR: Failures that stop the seed
/// - WARN: Skipped work
/// - INFO: What was created
/// - DEBUG: Repository internals
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

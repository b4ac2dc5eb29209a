//! # Seed Data Generator
//!
//! Populates the database with a demo station for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p posto-db --bin seed
//!
//! # Specify database path
//! cargo run -p posto-db --bin seed -- --db ./data/posto.db
//! ```
//!
//! ## Generated Data
//! - Four fuels (gasoline, additive gasoline, ethanol, diesel S10)
//! - One tank per fuel except additive gasoline, which lives in the
//!   stock registry
//! - Three suppliers

use posto_core::{FuelProduct, Liters, Money, Supplier, Tank};
use posto_db::{Database, DbConfig};
use rust_decimal::Decimal;
use std::env;
use uuid::Uuid;

/// (code, name, cost price, sale price, stock in liters, has tank)
const FUELS: &[(&str, &str, i64, i64, i64, bool)] = &[
    ("GC", "Gasolina Comum", 5_10, 6_29, 7_250, true),
    ("GA", "Gasolina Aditivada", 5_32, 6_49, 1_800, false),
    ("ET", "Etanol Hidratado", 3_80, 4_49, 9_100, true),
    ("S10", "Diesel S10", 5_70, 6_19, 12_400, true),
];

/// Tank capacity in liters.
const TANK_CAPACITY: i64 = 15_000;

/// (name, CNPJ)
const SUPPLIERS: &[(&str, &str)] = &[
    ("Distribuidora Sul", "12.345.678/0001-90"),
    ("Petro Norte", "98.765.432/0001-10"),
    ("Combustíveis Litoral", "11.222.333/0001-44"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./posto_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Posto Back Office Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./posto_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Posto Back Office Seed Data Generator");
    println!("========================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.fuels().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} fuels", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating fuels and tanks...");

    for (code, name, cost_cents, sale_cents, stock, has_tank) in FUELS {
        let fuel = FuelProduct {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            cost_price: Money::new(Decimal::new(*cost_cents, 2)),
            sale_price: Money::new(Decimal::new(*sale_cents, 2)),
            is_active: true,
        };
        db.fuels().insert(&fuel).await?;

        let stock = Liters::new(Decimal::new(*stock, 0));
        if *has_tank {
            let tank = Tank {
                id: Uuid::new_v4().to_string(),
                product_id: fuel.id.clone(),
                name: format!("Tanque {}", code),
                capacity: Liters::new(Decimal::new(TANK_CAPACITY, 0)),
                current_stock: stock,
            };
            db.tanks().insert(&tank).await?;
            println!("  {} {} ({} in {})", code, name, stock, tank.name);
        } else {
            db.tanks().set_stock_level(&fuel.id, stock).await?;
            println!("  {} {} ({} in stock registry)", code, name, stock);
        }
    }

    println!();
    println!("Generating suppliers...");

    for (name, tax_id) in SUPPLIERS {
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            tax_id: Some(tax_id.to_string()),
            is_active: true,
        };
        db.suppliers().insert(&supplier).await?;
        println!("  {} ({})", supplier.name, supplier.id);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

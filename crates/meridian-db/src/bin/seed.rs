//! # Seed Data Generator
//!
//! Populates a development database with an admin account and a small
//! storefront.
//!
//! ## Usage
//! ```bash
//! # Seed ./meridian_dev.db with the default admin
//! cargo run -p meridian-db --bin seed
//!
//! # Choose the database and admin credentials
//! cargo run -p meridian-db --bin seed -- --db ./data/meridian.db \
//!     --admin-email ops@example.com --admin-password 'long-secret-1'
//! ```
//!
//! ## Generated Data
//! - One `super` admin (the only way to create admins)
//! - Categories: Lighting, Furniture, Textiles
//! - A few products per category with stock
//! - Promocodes `WELCOME10` (10%) and `FLAT5` ($5.00)
//! - Shipping rates for a handful of destinations

use std::env;

use chrono::{Duration, Utc};
use meridian_core::{
    Account, AccountProfile, AdminLevel, Category, Discount, DiscountKind, Product, Role, ShippingRate,
};
use meridian_db::credentials::hash_password;
use meridian_db::{Database, DbConfig};
use uuid::Uuid;

const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Lighting",
        &[
            ("Brass Desk Lamp", 4_500, 25),
            ("Paper Pendant Shade", 1_800, 60),
            ("LED Strip 2m", 2_299, 40),
        ],
    ),
    (
        "Furniture",
        &[
            ("Oak Side Table", 12_900, 8),
            ("Folding Chair", 3_450, 30),
        ],
    ),
    (
        "Textiles",
        &[
            ("Linen Throw", 5_900, 15),
            ("Wool Rug 120x180", 18_500, 5),
            ("Cotton Cushion Cover", 1_250, 100),
        ],
    ),
];

const SHIPPING: &[(&str, &str, i64)] = &[
    ("Egypt", "Cairo", 800),
    ("Egypt", "Giza", 900),
    ("Kenya", "Nairobi", 1_500),
    ("Nigeria", "Lagos", 1_400),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./meridian_dev.db");
    let mut admin_email = String::from("admin@meridian.local");
    let mut admin_password = String::from("change-me-now");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-email" => {
                if i + 1 < args.len() {
                    admin_email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Meridian Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>              Database file path (default: ./meridian_dev.db)");
                println!("      --admin-email <EMAIL>    Admin login (default: admin@meridian.local)");
                println!("      --admin-password <PW>    Admin password (default: change-me-now)");
                println!("  -h, --help                   Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Meridian Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let now = Utc::now();

    // Admin
    if db.accounts().count_by_role(Role::Admin).await? == 0 {
        let admin = Account {
            id: Uuid::new_v4().to_string(),
            email: admin_email.clone(),
            username: "admin".to_string(),
            full_name: "Store Administrator".to_string(),
            profile: AccountProfile::Admin {
                level: AdminLevel::Super,
            },
            created_at: now,
        };
        db.accounts().insert(&admin, &hash_password(&admin_password)?).await?;
        println!("✓ Created admin {}", admin_email);
    } else {
        println!("⚠ An admin already exists, leaving accounts alone");
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    let mut generated = 0;
    for (category_idx, (category_name, products)) in CATALOG.iter().enumerate() {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: category_name.to_string(),
            icon: None,
            color: None,
            created_at: now,
        };
        db.categories().insert(&category).await?;

        for (product_idx, (title, price_cents, stock)) in products.iter().enumerate() {
            let product = Product {
                id: Uuid::new_v4().to_string(),
                vendor_id: None,
                category_id: Some(category.id.clone()),
                sku: Some(format!(
                    "{}-{:03}",
                    &category_name[..3].to_uppercase(),
                    category_idx * 100 + product_idx
                )),
                title: title.to_string(),
                description: None,
                image_url: None,
                price_cents: *price_cents,
                count_in_stock: *stock,
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.title, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Generated {} products", generated);

    // Discounts
    for (code, kind, value) in [
        ("WELCOME10", DiscountKind::Percentage, 1_000),
        ("FLAT5", DiscountKind::Fixed, 500),
    ] {
        db.discounts()
            .insert(&Discount {
                id: Uuid::new_v4().to_string(),
                promocode: code.to_string(),
                kind,
                value,
                is_active: true,
                expires_at: now + Duration::days(90),
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ Created promocodes WELCOME10, FLAT5");

    // Shipping
    for (country, region, rate_cents) in SHIPPING {
        db.shipping_rates()
            .insert(&ShippingRate {
                id: Uuid::new_v4().to_string(),
                country: country.to_string(),
                region: region.to_string(),
                rate_cents: *rate_cents,
                created_at: now,
            })
            .await?;
    }
    println!("✓ Created {} shipping rates", SHIPPING.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

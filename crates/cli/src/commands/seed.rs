//! Catalog seeding from a YAML file.
//!
//! Seed file format:
//!
//! ```yaml
//! - name: "Букет «Рассвет»"
//!   composition: "15 пионов, эвкалипт"
//!   description: "Нежный утренний букет"
//!   price: "2500"
//!   photo_url: "https://cdn.example.com/rassvet.jpg"
//!   stock: 10
//!   is_active: true
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::CommandError;

/// One product entry in a seed file.
#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    #[serde(default)]
    composition: Option<String>,
    #[serde(default)]
    description: Option<String>,
    price: Decimal,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    stock: i32,
    #[serde(default = "default_active")]
    is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Insert every product from the seed file.
///
/// # Errors
///
/// Returns an error if the file is unreadable, malformed, or an insert
/// fails.
pub async fn run(file: &Path) -> Result<(), CommandError> {
    let contents = std::fs::read_to_string(file)?;
    let products: Vec<SeedProduct> = serde_yaml::from_str(&contents)?;

    let pool = super::connect().await?;

    tracing::info!(count = products.len(), "Seeding products...");
    for product in &products {
        sqlx::query(
            r"
            INSERT INTO products (name, composition, description, price,
                                  photo_url, stock, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&product.name)
        .bind(&product.composition)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.photo_url)
        .bind(product.stock)
        .bind(product.is_active)
        .execute(&pool)
        .await?;

        tracing::info!(name = %product.name, "seeded");
    }

    tracing::info!("Seeding complete");
    Ok(())
}

//! Product repository for catalog reads.
//!
//! The storefront only reads the catalog; writes happen in the admin panel.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use lepestok_core::{Price, Product, ProductId};

use super::RepositoryError;

/// Repository for catalog read operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, composition, description, price, photo_url,
                   stock, is_active, created_at, updated_at
            FROM products
            WHERE is_active
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, name, composition, description, price, photo_url,
                   stock, is_active, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }
}

/// Map a product row to the domain type.
pub(crate) fn product_from_row(row: &PgRow) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        composition: row.try_get("composition")?,
        description: row.try_get("description")?,
        price: row.try_get::<Price, _>("price")?,
        photo_url: row.try_get("photo_url")?,
        stock: row.try_get("stock")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

//! Product catalog management.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use lepestok_core::{Price, Product, ProductId};

use super::RepositoryError;

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub name: String,
    pub composition: Option<String>,
    pub description: Option<String>,
    pub price: Price,
    pub photo_url: Option<String>,
    pub stock: i32,
    pub is_active: bool,
}

/// Repository for catalog write operations.
pub struct ProductAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products (active and inactive), newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, composition, description, price, photo_url,
                   stock, is_active, created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, form: &ProductForm) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            r"
            INSERT INTO products (name, composition, description, price,
                                  photo_url, stock, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, composition, description, price, photo_url,
                      stock, is_active, created_at, updated_at
            ",
        )
        .bind(&form.name)
        .bind(&form.composition)
        .bind(&form.description)
        .bind(form.price)
        .bind(&form.photo_url)
        .bind(form.stock)
        .bind(form.is_active)
        .fetch_one(self.pool)
        .await?;

        product_from_row(&row)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn update(
        &self,
        id: ProductId,
        form: &ProductForm,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            r"
            UPDATE products
            SET name = $2,
                composition = $3,
                description = $4,
                price = $5,
                photo_url = $6,
                stock = $7,
                is_active = $8,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, composition, description, price, photo_url,
                      stock, is_active, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&form.name)
        .bind(&form.composition)
        .bind(&form.description)
        .bind(form.price)
        .bind(&form.photo_url)
        .bind(form.stock)
        .bind(form.is_active)
        .fetch_optional(self.pool)
        .await?;

        row.as_ref()
            .map(product_from_row)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists, or
    /// `RepositoryError::Conflict` if order lines still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product is referenced by existing orders".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Map a product row to the domain type.
fn product_from_row(row: &PgRow) -> Result<Product, RepositoryError> {
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

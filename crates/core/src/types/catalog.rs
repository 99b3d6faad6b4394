//! Product catalog and cart line records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Price;

/// A catalog product.
///
/// Immutable from the cart's perspective: adding a product to the cart takes
/// a read-only snapshot, and later catalog edits do not rewrite cart lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub composition: Option<String>,
    pub description: Option<String>,
    /// Unit price; non-negative.
    pub price: Price,
    pub photo_url: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of the in-memory cart: a product snapshot and its quantity.
///
/// Invariant: `quantity > 0` for any presented line; a quantity of zero or
/// below means the line is removed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Price of this line (unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.line_total(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product(name: &str, rubles: i64) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.to_owned(),
            composition: None,
            description: None,
            price: Price::from_rubles(rubles),
            photo_url: None,
            stock: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_total() {
        let item = CartItem {
            product: sample_product("Пионы", 500),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Price::from_rubles(1500));
    }
}

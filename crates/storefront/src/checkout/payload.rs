//! Order notification payload.
//!
//! The wire shape is the order-processing service's contract; field naming
//! is uneven (snake_case envelope, camelCase leaves) and must stay exactly
//! as the consumer expects it.

use serde::Serialize;

use lepestok_core::{
    CartItem, Order, OrderDetails, OrderId, Price, TelegramId, TelegramUser, User,
};

/// One order line in the notification.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadItem {
    #[serde(rename = "productId")]
    pub product_id: lepestok_core::ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(rename = "totalPrice")]
    pub total_price: Price,
}

/// The buyer's profile in the notification.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadUser {
    #[serde(rename = "telegramId")]
    pub telegram_id: TelegramId,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "salebotClientId")]
    pub salebot_client_id: Option<String>,
}

/// The complete order notification body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPayload {
    pub client_order_id: OrderId,
    pub items: Vec<PayloadItem>,
    /// Human-readable line summary, one numbered row per item.
    pub order_items_text: String,
    pub user: PayloadUser,
    /// Final total: item subtotal plus delivery cost.
    #[serde(rename = "totalAmount")]
    pub total_amount: Price,
    #[serde(rename = "customerName")]
    pub customer_name: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "deliveryType")]
    pub delivery_type: String,
    #[serde(rename = "deliveryAddress")]
    pub delivery_address: String,
    #[serde(rename = "deliveryCost")]
    pub delivery_cost: Price,
    #[serde(rename = "photoSendTo")]
    pub photo_send_to: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "deliveryDate")]
    pub delivery_date: String,
    #[serde(rename = "deliveryTime")]
    pub delivery_time: String,
}

impl OrderPayload {
    /// Build the notification body for a confirmed order.
    ///
    /// Profile fields prefer the stored user row (it may carry corrected
    /// names and the salebot correlation id) and fall back to the live
    /// Telegram identity.
    #[must_use]
    pub fn build(
        order: &Order,
        items: &[CartItem],
        details: &OrderDetails,
        identity: &TelegramUser,
        stored: Option<&User>,
    ) -> Self {
        let payload_items: Vec<PayloadItem> = items
            .iter()
            .map(|item| PayloadItem {
                product_id: item.product.id,
                name: item.product.name.clone(),
                price: item.product.price,
                quantity: item.quantity,
                total_price: item.line_total(),
            })
            .collect();

        let order_items_text = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                format!(
                    "{}. {} - {} шт. ({})",
                    index + 1,
                    item.product.name,
                    item.quantity,
                    item.line_total()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let subtotal: Price = items.iter().map(CartItem::line_total).sum();

        let user = PayloadUser {
            telegram_id: identity.id,
            first_name: stored
                .and_then(|u| u.firstname.clone())
                .or_else(|| Some(identity.first_name.clone())),
            last_name: stored
                .and_then(|u| u.lastname.clone())
                .or_else(|| identity.last_name.clone()),
            username: stored
                .and_then(|u| u.username.clone())
                .or_else(|| identity.username.clone()),
            salebot_client_id: stored.and_then(|u| u.salebot_client_id.clone()),
        };

        Self {
            client_order_id: order.id,
            items: payload_items,
            order_items_text,
            user,
            total_amount: subtotal + details.delivery_cost,
            customer_name: details.customer_name.clone(),
            phone_number: details.phone_number.clone(),
            delivery_type: details.delivery_type.clone(),
            delivery_address: details.delivery_address.clone().unwrap_or_default(),
            delivery_cost: details.delivery_cost,
            photo_send_to: details.photo_send_to.clone(),
            payment_method: details.payment_method.clone(),
            delivery_date: details.delivery_date.clone().unwrap_or_default(),
            delivery_time: details.delivery_time.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lepestok_core::{OrderStatus, ProductId, Product};

    fn product(name: &str, rubles: i64) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.to_owned(),
            composition: None,
            description: None,
            price: Price::from_rubles(rubles),
            photo_url: None,
            stock: 5,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order() -> Order {
        Order {
            id: OrderId::generate(),
            user_tg_id: "42".to_owned(),
            status: OrderStatus::Editing,
            total_amount: Price::ZERO,
            customer_name: None,
            phone_number: None,
            delivery_type: None,
            delivery_address: None,
            delivery_cost: None,
            photo_send_to: None,
            payment_method: None,
            delivery_date: None,
            delivery_time: None,
            created_at: Utc::now(),
        }
    }

    fn details() -> OrderDetails {
        OrderDetails {
            customer_name: "Анна Петрова".to_owned(),
            phone_number: "+79123456789".to_owned(),
            delivery_type: "Центр".to_owned(),
            delivery_address: Some("ул. Ленина, 1".to_owned()),
            delivery_cost: Price::from_rubles(250),
            photo_send_to: "telegram".to_owned(),
            payment_method: "card".to_owned(),
            delivery_date: Some("2026-03-08".to_owned()),
            delivery_time: Some("12:00-13:00".to_owned()),
        }
    }

    fn identity() -> TelegramUser {
        TelegramUser {
            id: TelegramId::new(42),
            first_name: "Анна".to_owned(),
            last_name: Some("Петрова".to_owned()),
            username: Some("annap".to_owned()),
        }
    }

    #[test]
    fn test_total_is_subtotal_plus_delivery() {
        let items = vec![
            CartItem { product: product("Пионы", 500), quantity: 3 },
            CartItem { product: product("Розы", 1000), quantity: 1 },
        ];
        let payload = OrderPayload::build(&order(), &items, &details(), &identity(), None);

        // 1500 + 1000 items + 250 delivery
        assert_eq!(payload.total_amount, Price::from_rubles(2750));
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items.first().map(|i| i.quantity), Some(3));
    }

    #[test]
    fn test_items_text_is_numbered() {
        let items = vec![
            CartItem { product: product("Пионы", 500), quantity: 2 },
            CartItem { product: product("Тюльпаны", 100), quantity: 5 },
        ];
        let payload = OrderPayload::build(&order(), &items, &details(), &identity(), None);

        let lines: Vec<&str> = payload.order_items_text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first(), Some(&"1. Пионы - 2 шт. (1 000 ₽)"));
        assert_eq!(lines.get(1), Some(&"2. Тюльпаны - 5 шт. (500 ₽)"));
    }

    #[test]
    fn test_wire_field_names() {
        let items = vec![CartItem { product: product("Пионы", 500), quantity: 1 }];
        let payload = OrderPayload::build(&order(), &items, &details(), &identity(), None);
        let json = serde_json::to_value(&payload).expect("serialize");

        assert!(json.get("client_order_id").is_some());
        assert!(json.get("order_items_text").is_some());
        assert!(json.get("totalAmount").is_some());
        assert!(json.get("customerName").is_some());
        assert!(json.pointer("/items/0/productId").is_some());
        assert!(json.pointer("/items/0/totalPrice").is_some());
        assert!(json.pointer("/user/telegramId").is_some());
        assert!(json.pointer("/user/salebotClientId").is_some());
    }

    #[test]
    fn test_stored_profile_preferred_over_identity() {
        let stored = User {
            tg_id: TelegramId::new(42),
            salebot_client_id: Some("sb-99".to_owned()),
            username: Some("anna_stored".to_owned()),
            firstname: Some("Anna".to_owned()),
            lastname: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let items = vec![CartItem { product: product("Пионы", 500), quantity: 1 }];
        let payload =
            OrderPayload::build(&order(), &items, &details(), &identity(), Some(&stored));

        assert_eq!(payload.user.first_name.as_deref(), Some("Anna"));
        assert_eq!(payload.user.username.as_deref(), Some("anna_stored"));
        assert_eq!(payload.user.salebot_client_id.as_deref(), Some("sb-99"));
        // Stored row has no last name; identity fills the gap.
        assert_eq!(payload.user.last_name.as_deref(), Some("Петрова"));
    }
}

//! Delivery options and checkout form rules.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use lepestok_core::{OrderDetails, Price};

/// Delivery type name for in-store pickup (no address, date, or time).
pub const PICKUP: &str = "Самовывоз";

/// A delivery zone with its flat cost.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryOption {
    pub name: &'static str,
    /// Delivery cost in whole rubles.
    pub cost: i64,
    pub requires_address: bool,
}

/// Delivery zones served by the shop.
pub const DELIVERY_OPTIONS: &[DeliveryOption] = &[
    DeliveryOption { name: PICKUP, cost: 0, requires_address: false },
    DeliveryOption { name: "Перемещения", cost: 250, requires_address: true },
    DeliveryOption { name: "Центр", cost: 250, requires_address: true },
    DeliveryOption { name: "Зеленая роща", cost: 250, requires_address: true },
    DeliveryOption { name: "Сипайлово", cost: 300, requires_address: true },
    DeliveryOption { name: "Черниковка", cost: 350, requires_address: true },
    DeliveryOption { name: "Инорс", cost: 350, requires_address: true },
    DeliveryOption { name: "Док", cost: 350, requires_address: true },
    DeliveryOption { name: "Затон", cost: 350, requires_address: true },
    DeliveryOption { name: "Дема", cost: 350, requires_address: true },
    DeliveryOption { name: "Цветы Башкирии", cost: 350, requires_address: true },
    DeliveryOption { name: "8 Марта", cost: 350, requires_address: true },
];

/// Accepted phone formats: +7 912-345-67-89, 8-912-345-67-89,
/// +79123456789, 89123456789.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^(\+7|8)?[\s-]?[489]\d{2}[\s-]?\d{3}[\s-]?\d{2}[\s-]?\d{2}$").unwrap()
});

/// Look up a delivery option by name.
#[must_use]
pub fn find_option(name: &str) -> Option<&'static DeliveryOption> {
    DELIVERY_OPTIONS.iter().find(|option| option.name == name)
}

impl DeliveryOption {
    /// The zone's cost as a price.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::from_rubles(self.cost)
    }
}

/// A checkout form rule violation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("customer name must be at least 2 characters")]
    CustomerNameTooShort,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("unknown delivery type: {0}")]
    UnknownDeliveryType(String),
    #[error("delivery address is required for this delivery type")]
    AddressRequired,
    #[error("delivery date and time are required for courier delivery")]
    DeliverySlotRequired,
}

/// Apply the checkout form rules to collected details.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate(details: &OrderDetails) -> Result<(), ValidationError> {
    if details.customer_name.trim().chars().count() < 2 {
        return Err(ValidationError::CustomerNameTooShort);
    }
    if !PHONE_PATTERN.is_match(details.phone_number.trim()) {
        return Err(ValidationError::InvalidPhone);
    }

    let option = find_option(&details.delivery_type)
        .ok_or_else(|| ValidationError::UnknownDeliveryType(details.delivery_type.clone()))?;

    if option.requires_address
        && details
            .delivery_address
            .as_deref()
            .is_none_or(|address| address.trim().is_empty())
    {
        return Err(ValidationError::AddressRequired);
    }

    // Pickup needs no slot; courier delivery needs both date and time.
    if details.delivery_type != PICKUP
        && (details.delivery_date.is_none() || details.delivery_time.is_none())
    {
        return Err(ValidationError::DeliverySlotRequired);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(delivery_type: &str) -> OrderDetails {
        OrderDetails {
            customer_name: "Иванов Иван".to_owned(),
            phone_number: "+7 912-345-67-89".to_owned(),
            delivery_type: delivery_type.to_owned(),
            delivery_address: Some("ул. Ленина, 1".to_owned()),
            delivery_cost: find_option(delivery_type).map_or(Price::ZERO, DeliveryOption::price),
            photo_send_to: "telegram".to_owned(),
            payment_method: "card".to_owned(),
            delivery_date: Some("2026-03-08".to_owned()),
            delivery_time: Some("12:00-13:00".to_owned()),
        }
    }

    #[test]
    fn test_valid_courier_details() {
        assert_eq!(validate(&details("Центр")), Ok(()));
    }

    #[test]
    fn test_pickup_needs_no_address_or_slot() {
        let mut d = details(PICKUP);
        d.delivery_address = None;
        d.delivery_date = None;
        d.delivery_time = None;
        assert_eq!(validate(&d), Ok(()));
    }

    #[test]
    fn test_short_name_rejected() {
        let mut d = details("Центр");
        d.customer_name = "И".to_owned();
        assert_eq!(validate(&d), Err(ValidationError::CustomerNameTooShort));
    }

    #[test]
    fn test_phone_formats() {
        for phone in ["+79123456789", "89123456789", "8-912-345-67-89"] {
            let mut d = details("Центр");
            d.phone_number = phone.to_owned();
            assert_eq!(validate(&d), Ok(()), "expected {phone} to be accepted");
        }

        let mut d = details("Центр");
        d.phone_number = "12345".to_owned();
        assert_eq!(validate(&d), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn test_unknown_zone_rejected() {
        let d = details("Луна");
        assert!(matches!(
            validate(&d),
            Err(ValidationError::UnknownDeliveryType(_))
        ));
    }

    #[test]
    fn test_missing_address_rejected() {
        let mut d = details("Сипайлово");
        d.delivery_address = Some("   ".to_owned());
        assert_eq!(validate(&d), Err(ValidationError::AddressRequired));
    }

    #[test]
    fn test_missing_slot_rejected() {
        let mut d = details("Центр");
        d.delivery_time = None;
        assert_eq!(validate(&d), Err(ValidationError::DeliverySlotRequired));
    }

    #[test]
    fn test_option_costs() {
        assert_eq!(find_option(PICKUP).map(|o| o.cost), Some(0));
        assert_eq!(find_option("Черниковка").map(|o| o.cost), Some(350));
        assert!(find_option("Марс").is_none());
    }
}

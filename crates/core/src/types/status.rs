//! Order lifecycle status.

use serde::{Deserialize, Serialize};

/// Status of an order row in the remote store.
///
/// Lifecycle: `Editing` (cart being assembled) → `Confirmed` (checkout
/// completed, handed to order processing) → `Paid`. At most one `Editing`
/// order may exist per owning identity; once `Confirmed`, the row is
/// immutable from the storefront's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Editing,
    Confirmed,
    Paid,
}

impl OrderStatus {
    /// The status as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Confirmed => "confirmed",
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editing" => Ok(Self::Editing),
            "confirmed" => Ok(Self::Confirmed),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for status in [OrderStatus::Editing, OrderStatus::Confirmed, OrderStatus::Paid] {
            let parsed: OrderStatus = status.as_str().parse().expect("valid status");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_invalid_status_rejected() {
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Confirmed).expect("serialize");
        assert_eq!(json, "\"confirmed\"");
    }
}

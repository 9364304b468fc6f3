//! Status and role enums.
//!
//! Every enum here is stored as `TEXT` in `SCREAMING_SNAKE_CASE` and parsed
//! back with [`FromStr`](std::str::FromStr).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// Order lifecycle status.
///
/// Transitions are restricted by [`OrderStatus::can_transition_to`]:
///
/// | from         | allowed to                |
/// |--------------|---------------------------|
/// | `ORDERED`    | `PROCESSING`, `CANCELLED` |
/// | `PROCESSING` | `SHIPPED`, `CANCELLED`    |
/// | `SHIPPED`    | `DELIVERED`, `CANCELLED`  |
/// | `DELIVERED`  | terminal                  |
/// | `CANCELLED`  | terminal                  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Ordered,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Ordered,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ORDERED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Same-state transitions are never allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Ordered, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered | Self::Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("order status", s))
    }
}

/// How an order is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    StandardDelivery,
    ExpressDelivery,
}

impl DeliveryMethod {
    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StandardDelivery => "STANDARD_DELIVERY",
            Self::ExpressDelivery => "EXPRESS_DELIVERY",
        }
    }

    /// Delivery charge for orders below the free-delivery threshold.
    #[must_use]
    pub fn flat_rate(self) -> Decimal {
        match self {
            Self::StandardDelivery => Decimal::from(5),
            Self::ExpressDelivery => Decimal::from(8),
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = UnknownVariant;

    /// Accepts the full names and the short aliases `STANDARD` / `EXPRESS`,
    /// ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STANDARD_DELIVERY" | "STANDARD" => Ok(Self::StandardDelivery),
            "EXPRESS_DELIVERY" | "EXPRESS" => Ok(Self::ExpressDelivery),
            _ => Err(UnknownVariant::new("delivery method", s)),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
    Employee,
}

impl Role {
    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Employee => "EMPLOYEE",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "EMPLOYEE" => Ok(Self::Employee),
            _ => Err(UnknownVariant::new("role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        use OrderStatus::*;
        assert!(Ordered.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancel_allowed_until_delivered() {
        use OrderStatus::*;
        for from in [Ordered, Processing, Shipped] {
            assert!(from.can_transition_to(Cancelled), "{from} -> CANCELLED");
        }
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_and_same_state_rejected() {
        for from in OrderStatus::ALL {
            assert!(!from.can_transition_to(from), "{from} -> {from}");
            if from.is_terminal() {
                for to in OrderStatus::ALL {
                    assert!(!from.can_transition_to(to));
                }
            }
        }
    }

    #[test]
    fn test_skipping_and_backwards_rejected() {
        use OrderStatus::*;
        assert!(!Ordered.can_transition_to(Shipped));
        assert!(!Ordered.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Cancelled.can_transition_to(Ordered));
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(" DELIVERED ".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("LOST".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_delivery_method_aliases() {
        assert_eq!(
            "standard".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::StandardDelivery
        );
        assert_eq!(
            "Express_Delivery".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::ExpressDelivery
        );
        let err = "drone".parse::<DeliveryMethod>().unwrap_err();
        assert_eq!(err.to_string(), "invalid delivery method value: drone");
    }

    #[test]
    fn test_flat_rates() {
        assert_eq!(DeliveryMethod::StandardDelivery.flat_rate(), Decimal::from(5));
        assert_eq!(DeliveryMethod::ExpressDelivery.flat_rate(), Decimal::from(8));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&DeliveryMethod::ExpressDelivery).unwrap(),
            "\"EXPRESS_DELIVERY\""
        );
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"EMPLOYEE\"");
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }
}

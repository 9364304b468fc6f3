//! Orders: totals, delivery pricing, order codes and the status log.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DeliveryMethod, OrderId, OrderStatus, ProductId, UserId, round_money};

/// Subtotal at or above which delivery is free.
pub const FREE_DELIVERY_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Prefix of every order code.
pub const ORDER_CODE_PREFIX: &str = "ORD";

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Cannot change order status from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// One line of an order: a product snapshot taken at placement time.
///
/// The same product may appear several times; each occurrence is charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
}

/// Subtotal, delivery cost and total of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub delivery_cost: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Sum `unit_prices` and apply the delivery rule.
    ///
    /// `total` always equals `subtotal + delivery_cost`.
    #[must_use]
    pub fn calculate<I>(unit_prices: I, method: DeliveryMethod) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let subtotal = round_money(unit_prices.into_iter().sum());
        let delivery_cost = delivery_cost(subtotal, method);
        Self {
            subtotal,
            delivery_cost,
            total: round_money(subtotal + delivery_cost),
        }
    }
}

/// Delivery charge for an order with the given subtotal.
///
/// Free from [`FREE_DELIVERY_THRESHOLD`] upwards, otherwise the method's flat
/// rate. The number of items plays no part.
#[must_use]
pub fn delivery_cost(subtotal: Decimal, method: DeliveryMethod) -> Decimal {
    if subtotal >= FREE_DELIVERY_THRESHOLD {
        round_money(Decimal::ZERO)
    } else {
        round_money(method.flat_rate())
    }
}

/// Human-facing order code: `ORD` + id + creation date as `yyyyMMdd` (UTC).
#[must_use]
pub fn order_code(id: OrderId, created_at: DateTime<Utc>) -> String {
    format!(
        "{ORDER_CODE_PREFIX}{id}{}",
        created_at.format("%Y%m%d")
    )
}

fn log_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub code: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub address: String,
    pub delivery_method: DeliveryMethod,
    pub subtotal: Decimal,
    pub delivery_cost: Decimal,
    pub total: Decimal,
    /// Newline-terminated entries; only ever appended to.
    pub update_log: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a freshly placed order.
    ///
    /// `id` must already be reserved so the code can be written together with
    /// the order itself.
    #[must_use]
    pub fn place(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        address: String,
        delivery_method: DeliveryMethod,
        now: DateTime<Utc>,
    ) -> Self {
        let mut order = Self {
            id,
            code: order_code(id, now),
            user_id,
            status: OrderStatus::Ordered,
            items,
            address,
            delivery_method,
            subtotal: Decimal::ZERO,
            delivery_cost: Decimal::ZERO,
            total: Decimal::ZERO,
            update_log: format!("Order created at: {}\n", log_timestamp(now)),
            created_at: now,
            updated_at: now,
        };
        order.calculate_totals();
        order
    }

    /// Recompute subtotal, delivery cost and total from the items.
    pub fn calculate_totals(&mut self) {
        let totals = OrderTotals::calculate(
            self.items.iter().map(|item| item.unit_price),
            self.delivery_method,
        );
        self.subtotal = totals.subtotal;
        self.delivery_cost = totals.delivery_cost;
        self.total = totals.total;
    }

    #[must_use]
    pub const fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            delivery_cost: self.delivery_cost,
            total: self.total,
        }
    }

    /// Move to `next`, appending one line to the update log.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the status table forbids the move. The
    /// order is left untouched in that case.
    pub fn transition_to(
        &mut self,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        self.update_log.push_str(&format!(
            "Status changed to {next} at: {}\n",
            log_timestamp(now)
        ));
        Ok(())
    }

    /// Log entries, oldest first.
    pub fn log_entries(&self) -> impl Iterator<Item = &str> {
        self.update_log.lines().filter(|line| !line.is_empty())
    }
}

//! Order repository.
//!
//! An order and its items are always written together. Placement reserves the
//! id from the `orders` sequence first so the order code is part of the very
//! first insert.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use succulent_shop_core::pagination::PageSpec;
use succulent_shop_core::{
    DeliveryMethod, Order, OrderId, OrderItem, OrderStatus, Page, ProductId, UserId,
};

use super::{PgStore, RepositoryError, count_to_u64, map_constraint, parse_column};

/// Accepted `sortBy` values for order listings.
pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("code", "code"),
    ("status", "status"),
    ("total", "total"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

/// Everything needed to place an order once products are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    /// One entry per requested product id, duplicates included.
    pub items: Vec<OrderItem>,
    pub address: String,
    pub delivery_method: DeliveryMethod,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order, its items and its code in one transaction.
    async fn place(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<Order, RepositoryError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn list(&self, page: &PageSpec) -> Result<Page<Order>, RepositoryError>;

    async fn list_by_user(
        &self,
        user_id: UserId,
        page: &PageSpec,
    ) -> Result<Page<Order>, RepositoryError>;

    /// Store a transitioned order.
    ///
    /// Fails with `Conflict` when the stored status is no longer `previous`,
    /// so two concurrent transitions cannot both append to the log.
    async fn save_transition(
        &self,
        order: &Order,
        previous: OrderStatus,
    ) -> Result<(), RepositoryError>;

    /// Returns `false` when no order had this id.
    async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError>;
}

const ORDER_COLUMNS: &str = "id, code, user_id, status, address, delivery_method, subtotal, \
     delivery_cost, total, update_log, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    code: String,
    user_id: UserId,
    status: String,
    address: String,
    delivery_method: String,
    subtotal: Decimal,
    delivery_cost: Decimal,
    total: Decimal,
    update_log: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    unit_price: Decimal,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: self.id,
            code: self.code,
            user_id: self.user_id,
            status: parse_column(&self.status, "order status")?,
            items,
            address: self.address,
            delivery_method: parse_column(&self.delivery_method, "delivery method")?,
            subtotal: self.subtotal,
            delivery_cost: self.delivery_cost,
            total: self.total,
            update_log: self.update_log,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Attach items to their orders, keeping the order rows' sequence.
async fn with_items(pool: &PgPool, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id.as_i64()).collect();
    let item_rows: Vec<ItemRow> = sqlx::query_as(
        r"
        SELECT order_id, product_id, product_name, unit_price
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id, position
        ",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in item_rows {
        grouped.entry(item.order_id).or_default().push(OrderItem {
            product_id: item.product_id,
            product_name: item.product_name,
            unit_price: item.unit_price,
        });
    }

    rows.into_iter()
        .map(|row| {
            let items = grouped.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect()
}

impl PgStore {
    async fn order_page(
        &self,
        user_id: Option<UserId>,
        page: &PageSpec,
    ) -> Result<Page<Order>, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE $1::BIGINT IS NULL OR user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE $1::BIGINT IS NULL OR user_id = $1 \
             ORDER BY {} {}, id ASC LIMIT $2 OFFSET $3",
            page.sort_column,
            page.direction.as_sql()
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        let orders = with_items(self.pool(), rows).await?;
        Ok(Page::new(orders, page, count_to_u64(total)))
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<Order, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let id: i64 = sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('orders', 'id'))")
            .fetch_one(&mut *tx)
            .await?;
        let placed = Order::place(
            OrderId::new(id),
            order.user_id,
            order.items.clone(),
            order.address.clone(),
            order.delivery_method,
            now,
        );

        sqlx::query(
            r"
            INSERT INTO orders (id, code, user_id, status, address, delivery_method, subtotal,
                                delivery_cost, total, update_log, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(placed.id)
        .bind(&placed.code)
        .bind(placed.user_id)
        .bind(placed.status.as_str())
        .bind(&placed.address)
        .bind(placed.delivery_method.as_str())
        .bind(placed.subtotal)
        .bind(placed.delivery_cost)
        .bind(placed.total)
        .bind(&placed.update_log)
        .bind(placed.created_at)
        .bind(placed.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "order references a user that does not exist"))?;

        for (position, item) in (0_i32..).zip(&placed.items) {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, position, product_id, product_name, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(placed.id)
            .bind(position)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, "order references a product that does not exist"))?;
        }

        tx.commit().await?;
        Ok(placed)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        match row {
            Some(row) => Ok(with_items(self.pool(), vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<Order>, RepositoryError> {
        self.order_page(None, page).await
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        page: &PageSpec,
    ) -> Result<Page<Order>, RepositoryError> {
        self.order_page(Some(user_id), page).await
    }

    async fn save_transition(
        &self,
        order: &Order,
        previous: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, update_log = $3, updated_at = $4
            WHERE id = $1 AND status = $5
            ",
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(&order.update_log)
        .bind(order.updated_at)
        .bind(previous.as_str())
        .execute(self.pool())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(order.id)
            .fetch_one(self.pool())
            .await?;
        if exists {
            Err(RepositoryError::Conflict(
                "order status was changed by another request".to_owned(),
            ))
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_constraint(e, "order is still referenced"))?;
        Ok(result.rows_affected() > 0)
    }
}

//! Order placement and the status lifecycle.

use std::collections::HashMap;

use chrono::Utc;

use succulent_shop_core::requests::OrderRequest;
use succulent_shop_core::{
    Order, OrderId, OrderItem, OrderStatus, Page, PageRequest, Product, ProductId, UserId,
};

use crate::db::{NewOrder, Repositories, orders::SORT_FIELDS};
use crate::error::{AppError, Result};
use crate::services::notifications::{self, enqueue_best_effort};

pub struct OrderService<'a> {
    repos: &'a Repositories,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Place an order and queue its confirmation email.
    ///
    /// Each requested id becomes one item charged at the product's current
    /// display price; repeated ids are charged once per occurrence.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `NotFound` for an unknown user or products,
    /// and repository failures. A failed confirmation enqueue is only logged.
    #[tracing::instrument(skip(self, request), fields(user_id, order_id))]
    pub async fn place(&self, request: &OrderRequest) -> Result<Order> {
        let draft = request.validate()?;
        tracing::Span::current().record("user_id", draft.user_id.as_i64());

        let user = self
            .repos
            .users
            .get(draft.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {}", draft.user_id)))?;

        let items = self.resolve_items(&draft.product_ids).await?;
        let now = Utc::now();
        let order = self
            .repos
            .orders
            .place(
                &NewOrder {
                    user_id: draft.user_id,
                    items,
                    address: draft.address,
                    delivery_method: draft.delivery_method,
                },
                now,
            )
            .await?;

        tracing::Span::current().record("order_id", order.id.as_i64());
        tracing::info!(code = %order.code, total = %order.total, "Order placed");

        enqueue_best_effort(
            self.repos.outbox.as_ref(),
            notifications::order_confirmation(&order, &user),
            now,
        )
        .await;
        Ok(order)
    }

    async fn resolve_items(&self, product_ids: &[ProductId]) -> Result<Vec<OrderItem>> {
        let products = self.repos.products.get_many(product_ids).await?;
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let mut missing: Vec<ProductId> = product_ids
            .iter()
            .filter(|id| !by_id.contains_key(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            let ids: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Err(AppError::NotFound(format!(
                "Products not found for IDs: [{}]",
                ids.join(", ")
            )));
        }

        let items: Vec<OrderItem> = product_ids
            .iter()
            .filter_map(|id| by_id.get(id))
            .map(|product| OrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.display_price(),
            })
            .collect();
        if items.len() != product_ids.len() {
            return Err(AppError::InvalidData(format!(
                "Resolved {} products for {} requested ids",
                items.len(),
                product_ids.len()
            )));
        }
        Ok(items)
    }

    /// Move an order to `next`, append the log line, queue the status email.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidData` for a transition the status table
    /// forbids, and `Conflict` if the order changed status concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> Result<Order> {
        let mut order = self.get(id).await?;
        let previous = order.status;
        let now = Utc::now();
        order.transition_to(next, now)?;
        self.repos.orders.save_transition(&order, previous).await?;
        tracing::info!(code = %order.code, from = %previous, to = %next, "Order status changed");

        match self.repos.users.get(order.user_id).await {
            Ok(Some(user)) => {
                enqueue_best_effort(
                    self.repos.outbox.as_ref(),
                    notifications::status_change(&order, &user),
                    now,
                )
                .await;
            }
            Ok(None) => tracing::warn!(user_id = %order.user_id, "Order owner missing, no email"),
            Err(e) => tracing::error!(error = %e, "Failed to load order owner for email"),
        }
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.repos
            .orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order not found with id: {id}")))
    }

    /// # Errors
    ///
    /// Returns validation errors for bad paging and repository failures.
    pub async fn list(&self, page: &PageRequest) -> Result<Page<Order>> {
        let spec = page.resolve(SORT_FIELDS)?;
        Ok(self.repos.orders.list(&spec).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user.
    pub async fn list_by_user(&self, user_id: UserId, page: &PageRequest) -> Result<Page<Order>> {
        let spec = page.resolve(SORT_FIELDS)?;
        if self.repos.users.get(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User not found with id: {user_id}")));
        }
        Ok(self.repos.orders.list_by_user(user_id, &spec).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Conflict` while referenced.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<()> {
        if !self.repos.orders.delete(id).await? {
            return Err(AppError::NotFound(format!("Order not found with id: {id}")));
        }
        tracing::info!(order_id = %id, "Order deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::DateTime;
    use succulent_shop_core::{NotificationId, Role};

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::{OutboxRepository, RepositoryError};
    use crate::models::{NewNotification, Notification};
    use crate::services::fixtures::{seed_product, seed_user};

    struct BrokenOutbox;

    #[async_trait]
    impl OutboxRepository for BrokenOutbox {
        async fn enqueue(
            &self,
            _notification: &NewNotification,
            _now: DateTime<Utc>,
        ) -> std::result::Result<Notification, RepositoryError> {
            Err(RepositoryError::DataCorruption("outbox offline".to_owned()))
        }

        async fn due(
            &self,
            _now: DateTime<Utc>,
            _limit: i64,
        ) -> std::result::Result<Vec<Notification>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn mark_sent(
            &self,
            _id: NotificationId,
            _now: DateTime<Utc>,
        ) -> std::result::Result<(), RepositoryError> {
            Ok(())
        }

        async fn mark_retry(
            &self,
            _id: NotificationId,
            _error: &str,
            _next_attempt_at: DateTime<Utc>,
        ) -> std::result::Result<(), RepositoryError> {
            Ok(())
        }

        async fn mark_failed(
            &self,
            _id: NotificationId,
            _error: &str,
        ) -> std::result::Result<(), RepositoryError> {
            Ok(())
        }
    }

    fn request(user_id: UserId, product_ids: &[ProductId], method: &str) -> OrderRequest {
        OrderRequest {
            user_id: Some(user_id),
            products_ids: product_ids.to_vec(),
            address: Some("12 Cactus Lane".to_owned()),
            delivery_method: Some(method.to_owned()),
        }
    }

    #[tokio::test]
    async fn test_place_order_computes_totals_and_queues_email() {
        let store = Arc::new(MemoryStore::default());
        let repos = Repositories::from_store(store.clone());
        let user = seed_user(&repos, "buyer@example.com", Role::User).await;
        let a = seed_product(&repos, "Terracotta pot", "60.00").await;
        let b = seed_product(&repos, "Moss frame", "50.00").await;

        let order = OrderService::new(&repos)
            .place(&request(user.id, &[a.id, b.id], "STANDARD_DELIVERY"))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Ordered);
        assert_eq!(order.subtotal.to_string(), "110.00");
        assert_eq!(order.delivery_cost.to_string(), "0.00");
        assert_eq!(order.total, order.subtotal + order.delivery_cost);
        assert!(order.code.starts_with(&format!("ORD{}", order.id)));
        assert_eq!(order.code.len(), format!("ORD{}", order.id).len() + 8);

        let queued = store.notifications().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].recipient, "buyer@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_charged_per_occurrence() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "dup@example.com", Role::User).await;
        let pot = seed_product(&repos, "Pot", "30.00").await;

        let order = OrderService::new(&repos)
            .place(&request(user.id, &[pot.id, pot.id], "express"))
            .await
            .unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal.to_string(), "60.00");
        assert_eq!(order.delivery_cost.to_string(), "8.00");
        assert_eq!(order.total.to_string(), "68.00");
    }

    #[tokio::test]
    async fn test_sale_price_is_charged() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "sale@example.com", Role::User).await;
        let pot = seed_product(&repos, "Pot", "10.00").await;
        repos.products.set_on_sale(pot.id, true).await.unwrap();

        let order = OrderService::new(&repos)
            .place(&request(user.id, &[pot.id], "STANDARD"))
            .await
            .unwrap();
        assert_eq!(order.items[0].unit_price.to_string(), "8.00");
        assert_eq!(order.total.to_string(), "13.00");
    }

    #[tokio::test]
    async fn test_missing_products_are_listed() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "miss@example.com", Role::User).await;
        let pot = seed_product(&repos, "Pot", "10.00").await;

        let err = OrderService::new(&repos)
            .place(&request(
                user.id,
                &[pot.id, ProductId::new(404), ProductId::new(405), ProductId::new(404)],
                "STANDARD",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Products not found for IDs: [404, 405]"));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let repos = Repositories::in_memory();
        let pot = seed_product(&repos, "Pot", "10.00").await;
        let err = OrderService::new(&repos)
            .place(&request(UserId::new(77), &[pot.id], "STANDARD"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_request_reports_all_violations() {
        let repos = Repositories::in_memory();
        let err = OrderService::new(&repos)
            .place(&OrderRequest::default())
            .await
            .unwrap_err();
        let AppError::Validation(validation) = err else {
            panic!("expected validation error");
        };
        assert_eq!(validation.violations.len(), 4);
    }

    #[tokio::test]
    async fn test_outbox_failure_does_not_fail_placement() {
        let mut repos = Repositories::in_memory();
        repos.outbox = Arc::new(BrokenOutbox);
        let user = seed_user(&repos, "quiet@example.com", Role::User).await;
        let pot = seed_product(&repos, "Pot", "10.00").await;

        let order = OrderService::new(&repos)
            .place(&request(user.id, &[pot.id], "STANDARD"))
            .await
            .unwrap();
        assert_eq!(order.total.to_string(), "15.00");
        assert!(repos.orders.get(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_status_transitions_append_log() {
        let store = Arc::new(MemoryStore::default());
        let repos = Repositories::from_store(store.clone());
        let user = seed_user(&repos, "flow@example.com", Role::User).await;
        let pot = seed_product(&repos, "Pot", "10.00").await;
        let service = OrderService::new(&repos);
        let order = service
            .place(&request(user.id, &[pot.id], "STANDARD"))
            .await
            .unwrap();

        service.update_status(order.id, OrderStatus::Processing).await.unwrap();
        let shipped = service.update_status(order.id, OrderStatus::Shipped).await.unwrap();

        let entries: Vec<&str> = shipped.log_entries().collect();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].starts_with("Order created at: "));
        assert!(entries[1].starts_with("Status changed to PROCESSING at: "));
        assert!(entries[2].starts_with("Status changed to SHIPPED at: "));
        assert_eq!(service.get(order.id).await.unwrap().status, OrderStatus::Shipped);
        assert_eq!(store.notifications().await.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_order_untouched() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "stuck@example.com", Role::User).await;
        let pot = seed_product(&repos, "Pot", "10.00").await;
        let service = OrderService::new(&repos);
        let order = service
            .place(&request(user.id, &[pot.id], "STANDARD"))
            .await
            .unwrap();

        let err = service
            .update_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change order status from ORDERED to DELIVERED");

        let stored = service.get(order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Ordered);
        assert_eq!(stored.update_log, order.update_log);
    }

    #[tokio::test]
    async fn test_list_by_user_and_delete() {
        let repos = Repositories::in_memory();
        let user = seed_user(&repos, "lists@example.com", Role::User).await;
        let other = seed_user(&repos, "other@example.com", Role::User).await;
        let pot = seed_product(&repos, "Pot", "10.00").await;
        let service = OrderService::new(&repos);
        let mine = service
            .place(&request(user.id, &[pot.id], "STANDARD"))
            .await
            .unwrap();
        service
            .place(&request(other.id, &[pot.id], "STANDARD"))
            .await
            .unwrap();

        let page = service
            .list_by_user(user.id, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].id, mine.id);

        service.delete(mine.id).await.unwrap();
        assert!(matches!(service.delete(mine.id).await, Err(AppError::NotFound(_))));
        assert_eq!(service.list(&PageRequest::default()).await.unwrap().total_elements, 1);
    }
}

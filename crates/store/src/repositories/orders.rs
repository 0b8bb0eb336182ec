//! Order operations.

use chrono::{DateTime, Utc};

use bloom_core::customer::{Customer, matches_order};
use bloom_core::order::{Order, OrderFilter, filter_orders};
use bloom_core::types::{OrderId, OrderStatus, Phone};

use crate::error::RepositoryError;
use crate::store::Store;

/// Repository for orders.
pub struct OrderRepository<'a> {
    store: &'a Store,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Every order, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn all(&self) -> Result<Vec<Order>, RepositoryError> {
        self.store.all().await
    }

    /// Filtered listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        Ok(filter_orders(self.all().await?, filter))
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        self.store.get(id.as_str()).await
    }

    /// Store a newly placed order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is taken.
    pub async fn create(&self, order: Order) -> Result<Order, RepositoryError> {
        let order = self.store.insert(order).await?;
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order created"
        );
        Ok(order)
    }

    /// Set the status. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let order = self
            .store
            .update(id.as_str(), move |o: &mut Order| {
                o.set_status(status, now);
                Ok(())
            })
            .await?;
        tracing::info!(order_id = %id, status = %status, "Order status set");
        Ok(order)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: &OrderId) -> Result<(), RepositoryError> {
        if self.store.delete::<Order>(id.as_str()).await? {
            tracing::info!(order_id = %id, "Order deleted");
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Public order lookup: the number must match and the phone must be the
    /// buyer's or the recipient's.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn track(
        &self,
        order_number: &str,
        phone: &Phone,
    ) -> Result<Option<Order>, RepositoryError> {
        let order_number = order_number.trim();
        Ok(self.all().await?.into_iter().find(|o| {
            o.order_number.eq_ignore_ascii_case(order_number) && o.has_phone(phone)
        }))
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn for_customer(&self, customer: &Customer) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .all()
            .await?
            .into_iter()
            .filter(|o| matches_order(customer, o))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

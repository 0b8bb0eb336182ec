//! Customer operations.

use chrono::{DateTime, Utc};

use bloom_core::customer::{
    Customer, CustomerAggregate, CustomerUpdate, NewCustomer, matches_order,
};
use bloom_core::order::Order;
use bloom_core::types::CustomerId;

use crate::error::RepositoryError;
use crate::store::Store;

/// Repository for customers.
pub struct CustomerRepository<'a> {
    store: &'a Store,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Customers matching a free-text query, most recent buyers first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self, q: Option<&str>) -> Result<Vec<Customer>, RepositoryError> {
        let mut customers: Vec<Customer> = self
            .store
            .all::<Customer>()
            .await?
            .into_iter()
            .filter(|c| q.is_none_or(|q| c.matches_text(q)))
            .collect();
        customers.sort_by(|a, b| {
            b.last_order_at
                .cmp(&a.last_order_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(customers)
    }

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn get(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        self.store.get(id.as_str()).await
    }

    /// Create a customer from the back-office.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for invalid input.
    pub async fn create(
        &self,
        input: NewCustomer,
        now: DateTime<Utc>,
    ) -> Result<Customer, RepositoryError> {
        let customer = input
            .into_customer(now)
            .map_err(RepositoryError::validation)?;
        self.store.insert(customer).await
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Validation`.
    pub async fn update(
        &self,
        id: &CustomerId,
        update: CustomerUpdate,
        now: DateTime<Utc>,
    ) -> Result<Customer, RepositoryError> {
        self.store
            .update(id.as_str(), move |c: &mut Customer| {
                update.apply(c, now).map_err(RepositoryError::validation)
            })
            .await
    }

    /// Delete a customer. Their orders are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: &CustomerId) -> Result<(), RepositoryError> {
        if self.store.delete::<Customer>(id.as_str()).await? {
            tracing::info!(customer_id = %id, "Customer deleted");
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Find the customer an order belongs to, creating one if needed.
    ///
    /// An existing customer keeps their profile; only missing contact fields
    /// are filled in from the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or write fails.
    pub async fn upsert_from_order(
        &self,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<Customer, RepositoryError> {
        let existing = self
            .store
            .all::<Customer>()
            .await?
            .into_iter()
            .find(|c| matches_order(c, order));

        if let Some(customer) = existing {
            let order = order.clone();
            return self
                .store
                .update(customer.id.as_str(), move |c: &mut Customer| {
                    c.absorb_contact(&order);
                    c.updated_at = now;
                    Ok(())
                })
                .await;
        }

        let customer = self.store.insert(Customer::from_order(order, now)).await?;
        tracing::info!(customer_id = %customer.id, "Customer created from order");
        Ok(customer)
    }

    /// Recompute one customer's aggregates from the order list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn refresh_aggregates(
        &self,
        id: &CustomerId,
        orders: &[Order],
        now: DateTime<Utc>,
    ) -> Result<Customer, RepositoryError> {
        let Some(customer) = self.get(id).await? else {
            return Err(RepositoryError::NotFound);
        };
        let aggregate =
            CustomerAggregate::from_orders(orders.iter().filter(|o| matches_order(&customer, o)));
        self.store
            .update(id.as_str(), move |c: &mut Customer| {
                c.apply_aggregate(aggregate, now);
                Ok(())
            })
            .await
    }

    /// Recompute every customer's aggregates. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn recompute_all(
        &self,
        orders: &[Order],
        now: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut changed = 0;
        for customer in self.store.all::<Customer>().await? {
            let aggregate = CustomerAggregate::from_orders(
                orders.iter().filter(|o| matches_order(&customer, o)),
            );
            let mut probe = customer.clone();
            if !probe.apply_aggregate(aggregate, now) {
                continue;
            }
            match self
                .store
                .update(customer.id.as_str(), move |c: &mut Customer| {
                    c.apply_aggregate(aggregate, now);
                    Ok(())
                })
                .await
            {
                Ok(_) => changed += 1,
                // Deleted while we were iterating.
                Err(RepositoryError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }
        tracing::info!(changed, "Customer aggregates recomputed");
        Ok(changed)
    }
}

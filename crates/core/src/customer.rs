//! Customers and their order aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::Order;
use crate::types::{ContactError, CustomerId, Email, Money, Phone};

/// Customer validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerError {
    #[error("customer name is required")]
    MissingName,
    #[error("a phone number or email is required")]
    MissingContact,
    #[error(transparent)]
    InvalidContact(#[from] ContactError),
}

/// A shop customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub total_orders: u32,
    #[serde(default)]
    pub total_spent: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_order_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// A new customer derived from the contact details on an order.
    #[must_use]
    pub fn from_order(order: &Order, now: DateTime<Utc>) -> Self {
        let mut customer = Self {
            id: CustomerId::generate(),
            name: order.customer.name.clone(),
            email: order.customer.email.clone(),
            phone: Some(order.customer.phone.clone()),
            address: Some(order.shipping_address.one_line()),
            note: None,
            total_orders: 0,
            total_spent: Money::ZERO,
            last_order_at: None,
            created_at: now,
            updated_at: now,
        };
        customer.apply_aggregate(CustomerAggregate::from_orders([order]), now);
        customer
    }

    /// Overwrite the stored aggregates. Returns whether anything changed.
    pub fn apply_aggregate(&mut self, aggregate: CustomerAggregate, now: DateTime<Utc>) -> bool {
        let changed = self.total_orders != aggregate.total_orders
            || self.total_spent != aggregate.total_spent
            || self.last_order_at != aggregate.last_order_at;
        if changed {
            self.total_orders = aggregate.total_orders;
            self.total_spent = aggregate.total_spent;
            self.last_order_at = aggregate.last_order_at;
            self.updated_at = now;
        }
        changed
    }

    /// Fill contact gaps from a newer order, keeping what is already on file.
    pub fn absorb_contact(&mut self, order: &Order) {
        if self.email.is_none() {
            self.email.clone_from(&order.customer.email);
        }
        if self.phone.is_none() {
            self.phone = Some(order.customer.phone.clone());
        }
        if self.address.is_none() {
            self.address = Some(order.shipping_address.one_line());
        }
    }

    /// Case-insensitive search over name, email and phone.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .email
                .as_ref()
                .is_some_and(|e| e.as_str().contains(&needle))
            || self
                .phone
                .as_ref()
                .is_some_and(|p| p.as_str().contains(&needle))
    }
}

/// Whether an order belongs to a customer: same phone or same email.
#[must_use]
pub fn matches_order(customer: &Customer, order: &Order) -> bool {
    if order.customer_id.as_ref() == Some(&customer.id) {
        return true;
    }
    let same_phone = customer
        .phone
        .as_ref()
        .is_some_and(|p| p == &order.customer.phone);
    let same_email = customer
        .email
        .as_ref()
        .zip(order.customer.email.as_ref())
        .is_some_and(|(a, b)| a == b);
    same_phone || same_email
}

/// Order totals for one customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CustomerAggregate {
    pub total_orders: u32,
    pub total_spent: Money,
    pub last_order_at: Option<DateTime<Utc>>,
}

impl CustomerAggregate {
    /// Aggregate over orders, skipping cancelled ones.
    pub fn from_orders<'a, I>(orders: I) -> Self
    where
        I: IntoIterator<Item = &'a Order>,
    {
        orders
            .into_iter()
            .filter(|o| o.status.counts_as_revenue())
            .fold(Self::default(), |acc, order| Self {
                total_orders: acc.total_orders + 1,
                total_spent: acc.total_spent + order.total,
                last_order_at: acc.last_order_at.max(Some(order.created_at)),
            })
    }
}

/// Recompute every customer's aggregates from the full order list.
///
/// Returns the number of customers whose aggregates changed.
pub fn recompute(customers: &mut [Customer], orders: &[Order], now: DateTime<Utc>) -> usize {
    customers
        .iter_mut()
        .map(|customer| {
            let aggregate =
                CustomerAggregate::from_orders(orders.iter().filter(|o| matches_order(customer, o)));
            customer.apply_aggregate(aggregate, now)
        })
        .filter(|changed| *changed)
        .count()
}

/// Input for creating a customer from the back-office.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn parse_contact(
    email: Option<String>,
    phone: Option<String>,
) -> Result<(Option<Email>, Option<Phone>), ContactError> {
    let email = trimmed(email).map(|e| Email::parse(&e)).transpose()?;
    let phone = trimmed(phone).map(|p| Phone::parse(&p)).transpose()?;
    Ok((email, phone))
}

impl NewCustomer {
    /// Validate and build the customer.
    ///
    /// # Errors
    ///
    /// Returns a [`CustomerError`] when the name is empty, no contact is
    /// given, or a contact is malformed.
    pub fn into_customer(self, now: DateTime<Utc>) -> Result<Customer, CustomerError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(CustomerError::MissingName);
        }
        let (email, phone) = parse_contact(self.email, self.phone)?;
        if email.is_none() && phone.is_none() {
            return Err(CustomerError::MissingContact);
        }

        Ok(Customer {
            id: CustomerId::generate(),
            name,
            email,
            phone,
            address: trimmed(self.address),
            note: trimmed(self.note),
            total_orders: 0,
            total_spent: Money::ZERO,
            last_order_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a customer's profile. Aggregates are never patched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub note: Option<String>,
}

impl CustomerUpdate {
    /// Apply the update. An empty string clears an optional field.
    ///
    /// # Errors
    ///
    /// Returns a [`CustomerError`] and leaves the customer untouched when the
    /// result would be invalid.
    pub fn apply(self, customer: &mut Customer, now: DateTime<Utc>) -> Result<(), CustomerError> {
        let mut next = customer.clone();

        if let Some(name) = self.name {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(CustomerError::MissingName);
            }
            next.name = name;
        }
        if let Some(email) = self.email {
            next.email = parse_contact(Some(email), None)?.0;
        }
        if let Some(phone) = self.phone {
            next.phone = parse_contact(None, Some(phone))?.1;
        }
        if next.email.is_none() && next.phone.is_none() {
            return Err(CustomerError::MissingContact);
        }
        if let Some(address) = self.address {
            next.address = trimmed(Some(address));
        }
        if let Some(note) = self.note {
            next.note = trimmed(Some(note));
        }

        next.updated_at = now;
        *customer = next;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::order::tests::placed_order;
    use crate::types::OrderStatus;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_from_order_seeds_aggregates() {
        let order = placed_order(2000, 1, at(2));
        let customer = Customer::from_order(&order, at(2));
        assert_eq!(customer.name, "Mai Tran");
        assert_eq!(customer.total_orders, 1);
        assert_eq!(customer.total_spent, order.total);
        assert_eq!(customer.last_order_at, Some(at(2)));
        assert!(matches_order(&customer, &order));
    }

    #[test]
    fn test_aggregate_skips_cancelled() {
        let a = placed_order(2000, 1, at(2));
        let b = placed_order(3000, 1, at(5));
        let mut c = placed_order(9000, 1, at(7));
        c.set_status(OrderStatus::Cancelled, at(7));

        let agg = CustomerAggregate::from_orders([&a, &b, &c]);
        assert_eq!(agg.total_orders, 2);
        assert_eq!(agg.total_spent, a.total + b.total);
        assert_eq!(agg.last_order_at, Some(at(5)));
    }

    #[test]
    fn test_recompute_counts_changes() {
        let order = placed_order(2000, 2, at(3));
        let mut stale = Customer::from_order(&order, at(3));
        stale.total_orders = 7;

        let stranger = NewCustomer {
            name: "Linh".into(),
            email: Some("linh@example.com".into()),
            phone: None,
            address: None,
            note: None,
        }
        .into_customer(at(1))
        .unwrap();

        let mut customers = vec![stale, stranger];
        assert_eq!(recompute(&mut customers, &[order.clone()], at(4)), 1);
        assert_eq!(customers[0].total_orders, 1);
        assert_eq!(customers[1].total_orders, 0);
        assert_eq!(recompute(&mut customers, &[order], at(4)), 0);
    }

    #[test]
    fn test_new_customer_requires_contact() {
        let input = NewCustomer {
            name: "Linh".into(),
            email: Some(" ".into()),
            phone: None,
            address: None,
            note: None,
        };
        assert_eq!(
            input.into_customer(at(1)),
            Err(CustomerError::MissingContact)
        );
    }

    #[test]
    fn test_update_is_atomic() {
        let order = placed_order(2000, 1, at(2));
        let mut customer = Customer::from_order(&order, at(2));
        let before = customer.clone();

        let bad = CustomerUpdate {
            name: Some("Mai T.".into()),
            phone: Some("nope".into()),
            ..CustomerUpdate::default()
        };
        assert!(bad.apply(&mut customer, at(3)).is_err());
        assert_eq!(customer, before);

        let good = CustomerUpdate {
            note: Some("prefers white lilies".into()),
            ..CustomerUpdate::default()
        };
        good.apply(&mut customer, at(3)).unwrap();
        assert_eq!(customer.note.as_deref(), Some("prefers white lilies"));
        assert_eq!(customer.updated_at, at(3));
    }
}

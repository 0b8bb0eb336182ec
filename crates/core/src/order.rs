//! Orders and checkout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::PricedCart;
use crate::shipping::{Coordinates, ShippingError};
use crate::types::{
    ContactError, CustomerId, Email, Money, OrderId, OrderStatus, PaymentMethod, Phone, ProductId,
};

/// Checkout validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutError {
    #[error("customer name is required")]
    MissingName,
    #[error("delivery address is required")]
    MissingAddress,
    #[error("city is required")]
    MissingCity,
    #[error("invalid contact details: {0}")]
    InvalidContact(#[from] ContactError),
    #[error("invalid delivery location: {0}")]
    InvalidLocation(#[from] ShippingError),
    #[error("delivery date {0} is in the past")]
    DeliveryDateInPast(NaiveDate),
    #[error("the cart is empty")]
    EmptyCart,
}

/// Where an order is delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub phone: Phone,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl ShippingAddress {
    /// Single-line form used for geocoding and display.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            Some(self.line1.as_str()),
            self.line2.as_deref(),
            self.district.as_deref(),
            Some(self.city.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    pub phone: Phone,
}

/// A product line frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// One entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub customer: OrderCustomer,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Human-facing order number: `BL-YYYYMMDD-XXXXXX`.
#[must_use]
pub fn order_number(now: DateTime<Utc>, id: &OrderId) -> String {
    let suffix: String = id
        .as_str()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("BL-{}-{suffix}", now.format("%Y%m%d"))
}

impl Order {
    /// Build a pending order from a validated checkout and priced cart lines.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no lines.
    pub fn place(
        checkout: ValidCheckout,
        cart: &PricedCart,
        shipping_fee: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, CheckoutError> {
        if cart.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items: Vec<OrderItem> = cart
            .lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_total: line.line_total,
            })
            .collect();
        let subtotal: Money = items.iter().map(|i| i.line_total).sum();
        let id = OrderId::generate();

        Ok(Self {
            order_number: order_number(now, &id),
            id,
            customer_id: None,
            customer: checkout.customer,
            shipping_address: checkout.address,
            items,
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
            status: OrderStatus::Pending,
            payment_method: checkout.payment_method,
            note: checkout.note,
            delivery_date: checkout.delivery_date,
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                at: now,
            }],
            created_at: now,
            updated_at: now,
        })
    }

    /// Set the status unconditionally, recording the change.
    ///
    /// Returns `false` (and records nothing) when the status is unchanged.
    pub fn set_status(&mut self, status: OrderStatus, at: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.status_history.push(StatusChange { status, at });
        self.updated_at = at;
        true
    }

    /// Total units across items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether the order was placed with this phone number (customer or recipient).
    #[must_use]
    pub fn has_phone(&self, phone: &Phone) -> bool {
        &self.customer.phone == phone || &self.shipping_address.phone == phone
    }

    /// Case-insensitive search over number, customer name, phone and email.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.order_number.to_lowercase().contains(&needle)
            || self.customer.name.to_lowercase().contains(&needle)
            || self.customer.phone.as_str().contains(&needle)
            || self
                .customer
                .email
                .as_ref()
                .is_some_and(|e| e.as_str().contains(&needle))
    }
}

/// Back-office order listing filter. Dates are inclusive, by creation day (UTC).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub q: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl OrderFilter {
    /// Whether an order passes the filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let day = order.created_at.date_naive();
        self.status.is_none_or(|s| order.status == s)
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
            && self.q.as_deref().is_none_or(|q| order.matches_text(q))
    }
}

/// Filter orders, newest first.
#[must_use]
pub fn filter_orders(orders: Vec<Order>, filter: &OrderFilter) -> Vec<Order> {
    let mut matched: Vec<Order> = orders.into_iter().filter(|o| filter.matches(o)).collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matched
}

/// Checkout form as submitted by the storefront.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Recipient when sending flowers to someone else; defaults to the buyer.
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
}

/// A checkout that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCheckout {
    pub customer: OrderCustomer,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

impl CheckoutRequest {
    /// Validate and normalize the form. `today` is the shop's current date.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckoutError`] found.
    pub fn validate(self, today: NaiveDate) -> Result<ValidCheckout, CheckoutError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(CheckoutError::MissingName);
        }
        let phone = Phone::parse(&self.phone)?;
        let email = non_empty(self.email).map(|e| Email::parse(&e)).transpose()?;

        let line1 = self.address_line1.trim().to_owned();
        if line1.is_empty() {
            return Err(CheckoutError::MissingAddress);
        }
        let city = self.city.trim().to_owned();
        if city.is_empty() {
            return Err(CheckoutError::MissingCity);
        }
        if let Some(coords) = &self.coordinates {
            coords.validate()?;
        }
        if let Some(date) = self.delivery_date
            && date < today
        {
            return Err(CheckoutError::DeliveryDateInPast(date));
        }

        let recipient = non_empty(self.recipient).unwrap_or_else(|| name.clone());
        let recipient_phone = non_empty(self.recipient_phone)
            .map(|p| Phone::parse(&p))
            .transpose()?
            .unwrap_or_else(|| phone.clone());

        Ok(ValidCheckout {
            customer: OrderCustomer { name, email, phone },
            address: ShippingAddress {
                recipient,
                phone: recipient_phone,
                line1,
                line2: non_empty(self.address_line2),
                city,
                district: non_empty(self.district),
                coordinates: self.coordinates,
            },
            payment_method: self.payment_method,
            note: non_empty(self.note),
            delivery_date: self.delivery_date,
        })
    }
}

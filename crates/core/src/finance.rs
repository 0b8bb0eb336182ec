//! Revenue reports and dashboard metrics.
//!
//! Revenue counts every order that is not cancelled, measured on the order
//! total (items plus shipping). Periods are half-open `[from, to)` in UTC.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Product, low_stock};
use crate::chat::Feedback;
use crate::customer::Customer;
use crate::order::Order;
use crate::types::{FeedbackStatus, Money, OrderId, OrderStatus, PaymentMethod, ProductId};

/// Stock level at or below which a product shows up on the dashboard.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Number of products in a report's best-seller list.
pub const TOP_PRODUCTS: usize = 10;

/// Number of orders in the dashboard's recent list.
pub const RECENT_ORDERS: usize = 5;

/// Upper bound on series buckets in a single report (ten years of days).
pub const MAX_BUCKETS: usize = 3660;

/// Report parameter errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinanceError {
    #[error("report period must end after it starts")]
    EmptyPeriod,
    #[error("report period is too long for {0:?} granularity")]
    PeriodTooLong(Granularity),
}

/// A half-open reporting window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl ReportPeriod {
    /// Create a period.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::EmptyPeriod`] unless `from < to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, FinanceError> {
        if from >= to {
            return Err(FinanceError::EmptyPeriod);
        }
        Ok(Self { from, to })
    }

    /// Whole days from `first` through `last`, both inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::EmptyPeriod`] when `last` is before `first`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<Self, FinanceError> {
        let end = last
            .checked_add_days(Days::new(1))
            .ok_or(FinanceError::EmptyPeriod)?;
        Self::new(start_of(first), start_of(end))
    }

    /// The last `days` whole days, ending with today.
    #[must_use]
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let today = now.date_naive();
        let first = today
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(today);
        let end = today.checked_add_days(Days::new(1)).unwrap_or(today);
        Self {
            from: start_of(first),
            to: start_of(end),
        }
    }

    /// Whether an instant falls inside the period.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

/// Series bucket size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

impl Granularity {
    fn bucket_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }

    fn next(self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => bucket.checked_add_days(Days::new(1)),
            Self::Month => bucket.checked_add_months(Months::new(1)),
        }
    }
}

/// Revenue for one bucket of the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    /// First day of the bucket.
    pub start: NaiveDate,
    pub revenue: Money,
    pub order_count: u32,
}

/// Orders per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u32,
}

/// Revenue per payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodRevenue {
    pub payment_method: PaymentMethod,
    pub revenue: Money,
    pub order_count: u32,
}

/// A best-selling product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub revenue: Money,
}

/// Finance report over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceReport {
    pub period: ReportPeriod,
    pub granularity: Granularity,
    pub revenue: Money,
    pub order_count: u32,
    pub average_order_value: Money,
    pub shipping_collected: Money,
    pub series: Vec<SeriesPoint>,
    pub by_status: Vec<StatusCount>,
    pub by_payment_method: Vec<PaymentMethodRevenue>,
    pub top_products: Vec<ProductSales>,
}

fn average(total: Money, count: u32) -> Money {
    if count == 0 {
        Money::ZERO
    } else {
        Money::new(total.amount() / Decimal::from(count))
    }
}

fn empty_series(
    period: ReportPeriod,
    granularity: Granularity,
) -> Result<BTreeMap<NaiveDate, (Money, u32)>, FinanceError> {
    let mut series = BTreeMap::new();
    let mut bucket = granularity.bucket_of(period.from.date_naive());
    while start_of(bucket) < period.to {
        if series.len() >= MAX_BUCKETS {
            return Err(FinanceError::PeriodTooLong(granularity));
        }
        series.insert(bucket, (Money::ZERO, 0));
        let Some(next) = granularity.next(bucket) else {
            break;
        };
        bucket = next;
    }
    Ok(series)
}

impl FinanceReport {
    /// Build a report from all orders; orders outside the period are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::PeriodTooLong`] when the series would exceed
    /// [`MAX_BUCKETS`].
    pub fn build(
        orders: &[Order],
        period: ReportPeriod,
        granularity: Granularity,
    ) -> Result<Self, FinanceError> {
        let mut series = empty_series(period, granularity)?;
        let mut by_status: BTreeMap<OrderStatus, u32> =
            OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut by_method: BTreeMap<PaymentMethod, (Money, u32)> = PaymentMethod::ALL
            .into_iter()
            .map(|m| (m, (Money::ZERO, 0)))
            .collect();
        let mut products: HashMap<&ProductId, ProductSales> = HashMap::new();

        let mut revenue = Money::ZERO;
        let mut shipping_collected = Money::ZERO;
        let mut order_count = 0_u32;

        for order in orders.iter().filter(|o| period.contains(o.created_at)) {
            *by_status.entry(order.status).or_insert(0) += 1;
            if !order.status.counts_as_revenue() {
                continue;
            }

            order_count += 1;
            revenue = revenue + order.total;
            shipping_collected = shipping_collected + order.shipping_fee;

            let bucket = granularity.bucket_of(order.created_at.date_naive());
            if let Some((amount, count)) = series.get_mut(&bucket) {
                *amount = *amount + order.total;
                *count += 1;
            }
            let (amount, count) = by_method
                .entry(order.payment_method)
                .or_insert((Money::ZERO, 0));
            *amount = *amount + order.total;
            *count += 1;

            for item in &order.items {
                let sales = products
                    .entry(&item.product_id)
                    .or_insert_with(|| ProductSales {
                        product_id: item.product_id.clone(),
                        name: item.name.clone(),
                        quantity: 0,
                        revenue: Money::ZERO,
                    });
                sales.quantity += item.quantity;
                sales.revenue = sales.revenue + item.line_total;
            }
        }

        let mut top_products: Vec<ProductSales> = products.into_values().collect();
        top_products.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| b.revenue.cmp(&a.revenue))
                .then_with(|| a.name.cmp(&b.name))
        });
        top_products.truncate(TOP_PRODUCTS);

        Ok(Self {
            period,
            granularity,
            revenue,
            order_count,
            average_order_value: average(revenue, order_count),
            shipping_collected,
            series: series
                .into_iter()
                .map(|(start, (revenue, order_count))| SeriesPoint {
                    start,
                    revenue,
                    order_count,
                })
                .collect(),
            by_status: by_status
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            by_payment_method: by_method
                .into_iter()
                .map(|(payment_method, (revenue, order_count))| PaymentMethodRevenue {
                    payment_method,
                    revenue,
                    order_count,
                })
                .collect(),
            top_products,
        })
    }
}

/// Compact order row for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentOrder {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Product running low on stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockItem {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,
}

/// Back-office landing page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub product_count: usize,
    pub order_count: usize,
    pub customer_count: usize,
    pub pending_orders: usize,
    pub orders_today: u32,
    pub revenue_today: Money,
    pub revenue_month: Money,
    pub total_revenue: Money,
    pub unread_feedback: usize,
    pub recent_orders: Vec<RecentOrder>,
    pub low_stock: Vec<LowStockItem>,
}

impl DashboardMetrics {
    /// Compute the dashboard as of `now`.
    #[must_use]
    pub fn build(
        products: &[Product],
        orders: &[Order],
        customers: &[Customer],
        feedback: &[Feedback],
        now: DateTime<Utc>,
    ) -> Self {
        let today = now.date_naive();
        let month = Granularity::Month.bucket_of(today);

        let mut orders_today = 0_u32;
        let mut revenue_today = Money::ZERO;
        let mut revenue_month = Money::ZERO;
        let mut total_revenue = Money::ZERO;
        for order in orders.iter().filter(|o| o.status.counts_as_revenue()) {
            let day = order.created_at.date_naive();
            total_revenue = total_revenue + order.total;
            if day == today {
                orders_today += 1;
                revenue_today = revenue_today + order.total;
            }
            if Granularity::Month.bucket_of(day) == month {
                revenue_month = revenue_month + order.total;
            }
        }

        let mut recent: Vec<&Order> = orders.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            product_count: products.len(),
            order_count: orders.len(),
            customer_count: customers.len(),
            pending_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count(),
            orders_today,
            revenue_today,
            revenue_month,
            total_revenue,
            unread_feedback: feedback
                .iter()
                .filter(|f| f.status == FeedbackStatus::New)
                .count(),
            recent_orders: recent
                .into_iter()
                .take(RECENT_ORDERS)
                .map(|o| RecentOrder {
                    id: o.id.clone(),
                    order_number: o.order_number.clone(),
                    customer_name: o.customer.name.clone(),
                    total: o.total,
                    status: o.status,
                    created_at: o.created_at,
                })
                .collect(),
            low_stock: low_stock(products, LOW_STOCK_THRESHOLD)
                .into_iter()
                .map(|p| LowStockItem {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    stock: p.stock,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::tests::product;
    use crate::order::tests::placed_order;

    fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, month, day, hour, 0, 0).unwrap()
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    #[test]
    fn test_period_is_half_open() {
        let period = ReportPeriod::from_dates(date(3, 1), date(3, 31)).unwrap();
        assert!(period.contains(at(3, 1, 0)));
        assert!(period.contains(at(3, 31, 23)));
        assert!(!period.contains(at(4, 1, 0)));
        assert_eq!(
            ReportPeriod::from_dates(date(3, 2), date(3, 1)),
            Err(FinanceError::EmptyPeriod)
        );
    }

    #[test]
    fn test_report_totals_skip_cancelled() {
        // Each order: one item at $20.00 plus $5.00 shipping.
        let a = placed_order(2000, 1, at(3, 2, 9));
        let b = placed_order(2000, 2, at(3, 2, 15));
        let mut c = placed_order(2000, 1, at(3, 4, 9));
        c.set_status(OrderStatus::Cancelled, at(3, 4, 10));
        let outside = placed_order(2000, 1, at(4, 1, 0));

        let period = ReportPeriod::from_dates(date(3, 1), date(3, 5)).unwrap();
        let report =
            FinanceReport::build(&[a, b, c, outside], period, Granularity::Day).unwrap();

        assert_eq!(report.order_count, 2);
        assert_eq!(report.revenue, Money::from_cents(2500 + 4500));
        assert_eq!(report.average_order_value, Money::from_cents(3500));
        assert_eq!(report.shipping_collected, Money::from_cents(1000));

        assert_eq!(report.series.len(), 5);
        assert_eq!(report.series[1].start, date(3, 2));
        assert_eq!(report.series[1].order_count, 2);
        assert_eq!(report.series[3].revenue, Money::ZERO);

        let cancelled = report
            .by_status
            .iter()
            .find(|s| s.status == OrderStatus::Cancelled)
            .unwrap();
        assert_eq!(cancelled.count, 1);
        assert_eq!(report.by_status.len(), OrderStatus::ALL.len());

        assert_eq!(report.top_products.len(), 1);
        assert_eq!(report.top_products[0].quantity, 3);
        assert_eq!(report.top_products[0].revenue, Money::from_cents(6000));
    }

    #[test]
    fn test_monthly_series_includes_empty_months() {
        let orders = [placed_order(1000, 1, at(1, 15, 12)), placed_order(1000, 1, at(3, 3, 12))];
        let period = ReportPeriod::from_dates(date(1, 10), date(3, 31)).unwrap();
        let report = FinanceReport::build(&orders, period, Granularity::Month).unwrap();
        let starts: Vec<NaiveDate> = report.series.iter().map(|p| p.start).collect();
        assert_eq!(starts, vec![date(1, 1), date(2, 1), date(3, 1)]);
        assert_eq!(report.series[1].order_count, 0);
    }

    #[test]
    fn test_report_rejects_huge_daily_series() {
        let period = ReportPeriod::new(at(1, 1, 0), at(1, 1, 0) + chrono::Duration::days(4000)).unwrap();
        assert_eq!(
            FinanceReport::build(&[], period, Granularity::Day),
            Err(FinanceError::PeriodTooLong(Granularity::Day))
        );
    }

    #[test]
    fn test_dashboard_metrics() {
        let now = at(3, 8, 18);
        let today = placed_order(2000, 1, at(3, 8, 9));
        let earlier = placed_order(2000, 1, at(3, 1, 9));
        let mut last_month = placed_order(2000, 1, at(2, 20, 9));
        last_month.set_status(OrderStatus::Delivered, at(2, 21, 9));
        let products = [
            product("Roses", "bouquets", 2000, 3),
            product("Tulips", "bouquets", 1500, 40),
        ];

        let metrics = DashboardMetrics::build(
            &products,
            &[earlier, today, last_month],
            &[],
            &[],
            now,
        );
        assert_eq!(metrics.order_count, 3);
        assert_eq!(metrics.pending_orders, 2);
        assert_eq!(metrics.orders_today, 1);
        assert_eq!(metrics.revenue_today, Money::from_cents(2500));
        assert_eq!(metrics.revenue_month, Money::from_cents(5000));
        assert_eq!(metrics.total_revenue, Money::from_cents(7500));
        assert_eq!(metrics.recent_orders[0].created_at, at(3, 8, 9));
        assert_eq!(metrics.low_stock.len(), 1);
        assert_eq!(metrics.low_stock[0].name, "Roses");
    }
}

//! Customer maintenance.

use bloom_store::{CustomerRepository, OrderRepository};
use chrono::Utc;

use super::{CommandError, open_store};

/// Recompute order counts, totals and last-order times for every customer.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or written.
pub async fn recompute() -> Result<(), CommandError> {
    let store = open_store().await?;
    let orders = OrderRepository::new(&store).all().await?;
    let changed = CustomerRepository::new(&store)
        .recompute_all(&orders, Utc::now())
        .await?;
    tracing::info!(orders = orders.len(), changed, "Customer aggregates recomputed");
    Ok(())
}

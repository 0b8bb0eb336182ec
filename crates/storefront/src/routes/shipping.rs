//! Delivery fee estimate.

use axum::{Json, extract::State};
use bloom_core::Money;
use bloom_core::shipping::{Coordinates, ShippingQuote};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::session::load_cart;
use crate::routes::cart::price_cart;
use crate::services::Destination;
use crate::state::AppState;

/// Estimate request. Coordinates win over an address; the subtotal
/// defaults to the session cart's.
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub subtotal: Option<Money>,
}

impl EstimateRequest {
    fn destination(&self) -> Option<Destination> {
        if let Some(coords) = self.coordinates {
            return Some(Destination::Coordinates(coords));
        }
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| Destination::Address(a.to_string()))
    }
}

/// Quote delivery to a point or address.
#[instrument(skip(state, session))]
pub async fn estimate(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<ShippingQuote>> {
    let destination = request
        .destination()
        .ok_or_else(|| AppError::BadRequest("coordinates or address is required".to_string()))?;

    let subtotal = match request.subtotal {
        Some(subtotal) => subtotal,
        None => {
            let cart = load_cart(&session).await?;
            price_cart(&state, &cart).await?.subtotal
        }
    };

    Ok(Json(state.delivery().estimate(destination, subtotal).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_prefers_coordinates() {
        let request: EstimateRequest = serde_json::from_value(serde_json::json!({
            "coordinates": {"lat": 10.8, "lon": 106.7},
            "address": "12 Le Loi"
        }))
        .unwrap();
        assert!(matches!(
            request.destination(),
            Some(Destination::Coordinates(_))
        ));
    }

    #[test]
    fn test_blank_address_is_no_destination() {
        let request: EstimateRequest =
            serde_json::from_value(serde_json::json!({"address": "   "})).unwrap();
        assert!(request.destination().is_none());
    }
}

//! Delivery distance and fee estimation.
//!
//! Deliveries go out from a single shop location. The fee is a flat base
//! plus a per-kilometre rate over the great-circle distance, waived once the
//! order subtotal reaches the free-shipping threshold.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Money;

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Shipping estimation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShippingError {
    #[error("latitude must be within [-90, 90], got {0}")]
    InvalidLatitude(f64),
    #[error("longitude must be within [-180, 180], got {0}")]
    InvalidLongitude(f64),
    #[error("address is {distance_km:.1} km away; we deliver up to {max_km:.1} km")]
    OutOfRange { distance_km: f64, max_km: f64 },
}

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Create validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error when latitude or longitude is out of range or not finite.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ShippingError> {
        let coords = Self { lat, lon };
        coords.validate()?;
        Ok(coords)
    }

    /// Check the ranges of an already-built value (e.g. deserialized input).
    ///
    /// # Errors
    ///
    /// Returns an error when latitude or longitude is out of range or not finite.
    pub fn validate(&self) -> Result<(), ShippingError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(ShippingError::InvalidLatitude(self.lat));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(ShippingError::InvalidLongitude(self.lon));
        }
        Ok(())
    }
}

/// Great-circle distance between two points, in kilometres (haversine).
#[must_use]
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Delivery pricing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRates {
    pub base_fee: Money,
    pub per_km_fee: Money,
    /// Orders with a subtotal at or above this ship free.
    pub free_shipping_threshold: Option<Money>,
    pub max_distance_km: u32,
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            base_fee: Money::from_cents(500),
            per_km_fee: Money::from_cents(50),
            free_shipping_threshold: Some(Money::from_cents(10_000)),
            max_distance_km: 50,
        }
    }
}

impl ShippingRates {
    /// Fee for a delivery of `distance_km`, before any free-shipping waiver.
    #[must_use]
    pub fn fee_for_distance(&self, distance_km: f64) -> Money {
        let distance = Decimal::from_f64(distance_km.max(0.0)).unwrap_or_default();
        let variable = (self.per_km_fee.amount() * distance)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Money::new(self.base_fee.amount() + variable)
    }

    /// Whether a subtotal qualifies for free shipping.
    #[must_use]
    pub fn is_free_for(&self, subtotal: Money) -> bool {
        self.free_shipping_threshold
            .is_some_and(|threshold| subtotal >= threshold)
    }
}

/// A delivery fee estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingQuote {
    /// Distance rounded to 0.1 km.
    pub distance_km: f64,
    pub fee: Money,
    pub free_shipping: bool,
}

/// Quote delivery from `origin` to `destination` for a cart `subtotal`.
///
/// # Errors
///
/// Returns [`ShippingError::OutOfRange`] beyond the delivery radius, or a
/// coordinate error for invalid input.
pub fn quote(
    rates: &ShippingRates,
    origin: Coordinates,
    destination: Coordinates,
    subtotal: Money,
) -> Result<ShippingQuote, ShippingError> {
    destination.validate()?;
    let distance_km = (haversine_km(origin, destination) * 10.0).round() / 10.0;
    let max_km = f64::from(rates.max_distance_km);
    if distance_km > max_km {
        return Err(ShippingError::OutOfRange {
            distance_km,
            max_km,
        });
    }

    let free_shipping = rates.is_free_for(subtotal);
    let fee = if free_shipping {
        Money::ZERO
    } else {
        rates.fee_for_distance(distance_km)
    };

    Ok(ShippingQuote {
        distance_km,
        fee,
        free_shipping,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHOP: Coordinates = Coordinates {
        lat: 10.7769,
        lon: 106.7009,
    };

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London is roughly 343.5 km.
        let paris = Coordinates::new(48.8566, 2.3522).unwrap();
        let london = Coordinates::new(51.5074, -0.1278).unwrap();
        let d = haversine_km(paris, london);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_haversine_zero_and_symmetric() {
        let other = Coordinates::new(10.8231, 106.6297).unwrap();
        assert!(haversine_km(SHOP, SHOP).abs() < f64::EPSILON);
        assert!((haversine_km(SHOP, other) - haversine_km(other, SHOP)).abs() < 1e-9);
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(matches!(
            Coordinates::new(91.0, 0.0),
            Err(ShippingError::InvalidLatitude(_))
        ));
        assert!(matches!(
            Coordinates::new(0.0, f64::NAN),
            Err(ShippingError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_fee_is_linear_in_distance() {
        let rates = ShippingRates::default();
        assert_eq!(rates.fee_for_distance(0.0), Money::from_cents(500));
        assert_eq!(rates.fee_for_distance(10.0), Money::from_cents(1000));
        assert_eq!(rates.fee_for_distance(3.3), Money::from_cents(665));
    }

    #[test]
    fn test_quote_free_over_threshold() {
        let rates = ShippingRates::default();
        let dest = Coordinates::new(10.8231, 106.6297).unwrap();

        let paid = quote(&rates, SHOP, dest, Money::from_cents(2000)).unwrap();
        assert!(!paid.free_shipping);
        assert!(paid.fee > rates.base_fee);

        let free = quote(&rates, SHOP, dest, Money::from_cents(10_000)).unwrap();
        assert!(free.free_shipping);
        assert_eq!(free.fee, Money::ZERO);
        assert!((free.distance_km - paid.distance_km).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quote_out_of_range() {
        let rates = ShippingRates::default();
        let hanoi = Coordinates::new(21.0285, 105.8542).unwrap();
        assert!(matches!(
            quote(&rates, SHOP, hanoi, Money::ZERO),
            Err(ShippingError::OutOfRange { .. })
        ));
    }
}

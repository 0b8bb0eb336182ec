//! Delivery fee estimation from the shop's location.

use bloom_core::Money;
use bloom_core::shipping::{Coordinates, ShippingError, ShippingQuote, quote};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::config::ShopConfig;
use crate::services::geocoder::{GeocodeError, Geocoder};

/// Where a delivery goes: exact coordinates or an address to geocode.
#[derive(Debug, Clone)]
pub enum Destination {
    Coordinates(Coordinates),
    Address(String),
}

/// Errors from delivery estimation.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Shipping(#[from] ShippingError),
}

/// Fee charged at checkout plus the coordinates it was computed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutFee {
    pub fee: Money,
    pub coordinates: Option<Coordinates>,
}

/// Quotes deliveries from the shop.
#[derive(Clone)]
pub struct DeliveryService {
    geocoder: Geocoder,
    shop: ShopConfig,
}

impl DeliveryService {
    #[must_use]
    pub const fn new(geocoder: Geocoder, shop: ShopConfig) -> Self {
        Self { geocoder, shop }
    }

    /// Shop settings in use.
    #[must_use]
    pub const fn shop(&self) -> &ShopConfig {
        &self.shop
    }

    async fn locate(&self, destination: Destination) -> Result<Coordinates, DeliveryError> {
        match destination {
            Destination::Coordinates(coords) => Ok(coords),
            Destination::Address(address) => Ok(self.geocoder.geocode(&address).await?),
        }
    }

    /// Quote a delivery for a cart subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be located or lies outside
    /// the delivery radius.
    #[instrument(skip(self))]
    pub async fn estimate(
        &self,
        destination: Destination,
        subtotal: Money,
    ) -> Result<ShippingQuote, DeliveryError> {
        let coords = self.locate(destination).await?;
        Ok(quote(&self.shop.rates, self.shop.location, coords, subtotal)?)
    }

    /// Fee for a checkout.
    ///
    /// Without usable coordinates the flat base fee applies (or nothing,
    /// above the free-shipping threshold).
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::OutOfRange` when the located address is too far.
    #[instrument(skip(self))]
    pub async fn checkout_fee(
        &self,
        coordinates: Option<Coordinates>,
        address: &str,
        subtotal: Money,
    ) -> Result<CheckoutFee, ShippingError> {
        let coordinates = match coordinates {
            Some(coords) => Some(coords),
            None => match self.geocoder.geocode(address).await {
                Ok(coords) => Some(coords),
                Err(e) => {
                    warn!(error = %e, "Geocoding failed, charging the base delivery fee");
                    None
                }
            },
        };

        let fee = match coordinates {
            Some(coords) => quote(&self.shop.rates, self.shop.location, coords, subtotal)?.fee,
            None => self.flat_fee(subtotal),
        };
        Ok(CheckoutFee { fee, coordinates })
    }

    fn flat_fee(&self, subtotal: Money) -> Money {
        if self.shop.rates.is_free_for(subtotal) {
            Money::ZERO
        } else {
            self.shop.rates.base_fee
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SHOP_LOCATION, GeocoderConfig};

    /// Geocoder pointed at a closed local port so lookups fail fast.
    fn service() -> DeliveryService {
        let geocoder = Geocoder::new(&GeocoderConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "bloom-test".to_string(),
        })
        .unwrap();
        DeliveryService::new(geocoder, ShopConfig::default())
    }

    #[tokio::test]
    async fn test_estimate_with_coordinates() {
        let q = service()
            .estimate(
                Destination::Coordinates(DEFAULT_SHOP_LOCATION),
                Money::from_cents(2_000),
            )
            .await
            .unwrap();
        assert!(q.distance_km.abs() < f64::EPSILON);
        assert_eq!(q.fee, Money::from_cents(500));
    }

    #[tokio::test]
    async fn test_estimate_out_of_range() {
        let hanoi = Coordinates::new(21.0285, 105.8542).unwrap();
        let err = service()
            .estimate(Destination::Coordinates(hanoi), Money::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Shipping(ShippingError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_checkout_fee_falls_back_to_base_fee() {
        let svc = service();
        let fee = svc
            .checkout_fee(None, "12 Le Loi, District 1", Money::from_cents(2_000))
            .await
            .unwrap();
        assert_eq!(fee.fee, Money::from_cents(500));
        assert!(fee.coordinates.is_none());

        let free = svc
            .checkout_fee(None, "12 Le Loi, District 1", Money::from_cents(15_000))
            .await
            .unwrap();
        assert_eq!(free.fee, Money::ZERO);
    }
}

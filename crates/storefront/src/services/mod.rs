//! Services used by the storefront handlers.

pub mod delivery;
pub mod geocoder;

pub use delivery::{CheckoutFee, DeliveryError, DeliveryService, Destination};
pub use geocoder::{GeocodeError, Geocoder};

//! Session-related types.
//!
//! The shopper's cart, favorites and chat conversation live in the
//! server-side session; only the session id travels in the cookie.

/// Session keys for shopper state.
pub mod keys {
    /// Key for the shopper's [`bloom_core::cart::Cart`].
    pub const CART: &str = "cart";

    /// Key for the shopper's [`bloom_core::cart::Favorites`].
    pub const FAVORITES: &str = "favorites";

    /// Key for the chat widget's conversation id.
    pub const CONVERSATION_ID: &str = "conversation_id";
}

//! Session middleware configuration and shopper-state helpers.
//!
//! Sessions are `PostgreSQL`-backed in database mode and held in memory when
//! the storefront runs on local files.

use bloom_core::cart::{Cart, Favorites};
use bloom_core::types::ConversationId;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bloom_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer over any session store.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Load the shopper's cart, empty if none was saved.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Save the shopper's cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Load the shopper's favorites.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load_favorites(
    session: &Session,
) -> Result<Favorites, tower_sessions::session::Error> {
    Ok(session
        .get::<Favorites>(session_keys::FAVORITES)
        .await?
        .unwrap_or_default())
}

/// Save the shopper's favorites.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_favorites(
    session: &Session,
    favorites: &Favorites,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FAVORITES, favorites).await
}

/// The chat conversation this session started, if any.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn conversation_id(
    session: &Session,
) -> Result<Option<ConversationId>, tower_sessions::session::Error> {
    session.get(session_keys::CONVERSATION_ID).await
}

/// Remember the chat conversation for this session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_conversation_id(
    session: &Session,
    id: &ConversationId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CONVERSATION_ID, id).await
}

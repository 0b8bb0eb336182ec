//! Login, logout and session identity.

use axum::{Json, Router, extract::State, http::StatusCode, routing::{get, post}};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    RequireAdminAuth, auth_rate_limiter, clear_current_admin, set_current_admin,
};
use crate::models::CurrentAdmin;
use crate::services::{AdminAuthError, verify_credentials};
use crate::state::AppState;

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Auth routes, mounted at `/auth`. Login attempts are throttled per client IP.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login).layer(auth_rate_limiter()))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Check credentials and start an admin session.
#[instrument(skip(state, session, input), fields(email = %input.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let credentials = &state.config().credentials;
    match verify_credentials(credentials, &input.email, &input.password) {
        Ok(()) => {}
        Err(AdminAuthError::InvalidCredentials) => {
            tracing::warn!("Failed admin login");
            return Err(AppError::Unauthorized(
                "invalid email or password".to_string(),
            ));
        }
        Err(e) => return Err(AppError::Internal(e.to_string())),
    }

    let admin = CurrentAdmin {
        email: credentials.email.clone(),
        logged_in_at: Utc::now(),
    };
    set_current_admin(&session, &admin).await?;
    set_sentry_user(admin.email.as_str());
    tracing::info!("Admin logged in");

    Ok(Json(admin))
}

/// End the admin session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin.
pub async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}

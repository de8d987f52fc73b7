use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// Authorized admin, extracted from the `Authorization: Bearer <token>`
/// header by comparing against the configured admin token.
///
/// Add this as a handler parameter to gate an endpoint. Account management
/// lives outside this service; as far as the core is concerned this is an
/// opaque "is this caller authorized" predicate.
pub struct AdminUser;

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let expected = &state.config.auth.admin_token;
        // An unset token means the admin surface is disabled, not open.
        if expected.is_empty() || token != expected {
            return Err(AppError::TokenInvalid);
        }

        Ok(AdminUser)
    }
}

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::{AuthError, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// The caller identified by the session gate.
/// Rejects with a login redirect when the route is not behind the gate.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or(AppError::Auth(AuthError::MissingToken))?;

        Ok(CurrentUser {
            id: claims.user_id.clone(),
            email: claims.email.clone(),
        })
    }
}

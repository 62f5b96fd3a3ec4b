use serde::Deserialize;

use crate::auth::{AuthError, Claims};
use crate::db::models::{NewUser, User};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub age: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Create an identity and open a session for it.
/// The password is hashed before the user row exists, and the token is only
/// issued once the row is stored.
pub async fn register(state: &AppState, form: Registration) -> AppResult<(User, String)> {
    if state.users.find_by_email(&form.email)?.is_some() {
        return Err(AppError::AlreadyRegistered);
    }

    let password_hash = state.hasher.hash_blocking(form.password).await?;

    let user = state.users.insert(NewUser {
        username: form.username,
        name: form.name,
        age: form.age,
        email: form.email,
        password_hash,
    })?;

    let token = issue_for(state, &user)?;
    tracing::info!("Registered user {}", user.id);
    Ok((user, token))
}

/// Check a password and issue a fresh session token.
pub async fn login(state: &AppState, credentials: Credentials) -> AppResult<String> {
    let user = state
        .users
        .find_by_email(&credentials.email)?
        .ok_or(AuthError::NotFound)?;

    let matches = state
        .hasher
        .verify_blocking(credentials.password, user.password_hash.clone())
        .await?;
    if !matches {
        return Err(AuthError::BadCredentials.into());
    }

    let token = issue_for(state, &user)?;
    tracing::info!("User {} logged in", user.id);
    Ok(token)
}

fn issue_for(state: &AppState, user: &User) -> AppResult<String> {
    let claims = Claims {
        email: user.email.clone(),
        user_id: user.id.clone(),
    };
    state
        .tokens
        .issue(&claims)
        .map_err(|e| AppError::Internal(format!("Failed to issue session token: {}", e)))
}

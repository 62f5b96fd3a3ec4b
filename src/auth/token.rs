use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub user_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("session expiry is past the representable date range")]
    ExpiryOverflow,

    #[error("failed to sign session token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Wire form of [`Claims`] with issue and expiry times (Unix seconds).
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    email: String,
    user_id: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies HS256 session tokens with a server-held secret.
///
/// The payload is only encoded, not encrypted, so it must never carry
/// anything beyond the identity's email and id.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, IssueError> {
        self.issue_at(claims, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        claims: &Claims,
        issued_at: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(IssueError::ExpiryOverflow)?;
        let wire = TokenClaims {
            email: claims.email.clone(),
            user_id: claims.user_id.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &wire, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            },
        )?;

        Ok(Claims {
            email: data.claims.email,
            user_id: data.claims.user_id,
        })
    }
}

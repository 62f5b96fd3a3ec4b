pub mod accounts;
pub mod gate;
pub mod handlers;
pub mod password;
pub mod token;

pub use gate::require_session;
pub use password::PasswordHasher;
pub use token::{Claims, IssueError, SessionCodec};

/// Why a caller could not be authenticated. Every variant ends the request
/// with a redirect to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no session token")]
    MissingToken,

    #[error("malformed session token")]
    Malformed,

    #[error("session token signature mismatch")]
    BadSignature,

    #[error("session token expired")]
    Expired,

    #[error("no such user")]
    NotFound,

    #[error("wrong password")]
    BadCredentials,
}

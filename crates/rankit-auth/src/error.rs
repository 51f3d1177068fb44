//! Authentication error types.

use rankit_core::error::RankError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for RankError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => RankError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => RankError::Crypto(msg),
        }
    }
}

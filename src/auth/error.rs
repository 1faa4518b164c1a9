use thiserror::Error;

pub type CryptResult<T> = std::result::Result<T, CryptError>;

/// Failures of password hashing and session tokens. A wrong password is not
/// an error, see [`crate::auth::verify_password`].
#[derive(Debug, Error)]
pub enum CryptError {
    #[error("password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session token error: {0}")]
    SessionToken(#[from] jsonwebtoken::errors::Error),
}

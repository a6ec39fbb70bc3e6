//! Token error types.

use identify_identity::IdentityError;
use identify_storage::StorageError;
use thiserror::Error;

/// Token and token store errors
///
/// The verification failures stay distinct here; the HTTP boundary collapses them into
/// a single "unauthorized".
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature does not verify under the claimed identity's key
    #[error("Invalid token signature")]
    SignatureInvalid,

    /// Header names a signing algorithm other than EdDSA
    #[error("Invalid algorithm: found {found}, expected EdDSA")]
    AlgorithmMismatch {
        /// Algorithm named in the header
        found: String,
    },

    /// Not a well-formed token
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Authentic but past its `exp`
    #[error("Token expired")]
    TokenExpired,

    /// Unknown token or claimed identity
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token belongs to another identity
    #[error("Token belongs to another identity")]
    AuthorizationFailure,

    /// Authentic and unexpired but deleted from the store
    #[error("Token revoked")]
    Revoked,

    /// Token signing failed
    #[error("Token encoding error: {0}")]
    Encoding(String),

    /// Identity error
    #[error("Identity error: {0}")]
    Identity(IdentityError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<IdentityError> for TokenError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(what) => TokenError::NotFound(what),
            IdentityError::Storage(e) => TokenError::Storage(e),
            other => TokenError::Identity(other),
        }
    }
}

/// Result type for token operations
pub type Result<T> = std::result::Result<T, TokenError>;

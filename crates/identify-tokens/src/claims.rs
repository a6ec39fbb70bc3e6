//! Token claim set.

use serde::{Deserialize, Serialize};

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Token id (UUID v4)
    pub jti: String,
    /// Id of the identity the token was issued to
    pub identity: String,
    /// Issued at, Unix seconds
    pub iat: u64,
    /// Expires at, Unix seconds
    pub exp: u64,
    /// Whitespace-separated permission names
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub permissions: String,
}

impl TokenClaims {
    /// True if `name` is one of the granted permissions.
    ///
    /// An empty name never matches.
    pub fn has_permission(&self, name: &str) -> bool {
        !name.is_empty() && self.permissions.split_whitespace().any(|p| p == name)
    }
}

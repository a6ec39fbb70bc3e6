//! # identify-tokens
//!
//! Bearer tokens signed by the identity they are issued to.
//!
//! There is no server-wide signing secret. A token is an EdDSA JWT signed with the issuing
//! identity's Ed25519 key and carries only that identity's id; verification looks the
//! public key up in the identity store. [`TokenStore`] records issued tokens so they can be
//! revoked, and sweeps expired ones in the background.

#![warn(clippy::all)]

pub mod claims;
pub mod errors;
pub mod store;
pub mod token;
pub mod traits;

pub use claims::TokenClaims;
pub use errors::{Result, TokenError};
pub use store::{LocalTokenStore, TokenStoreConfig};
pub use token::Token;
pub use traits::TokenStore;

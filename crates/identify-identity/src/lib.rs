//! # identify-identity
//!
//! Cryptographic identities and their store.
//!
//! An identity has a public view ([`PublicIdentity`]) that is persisted and shared, and a
//! private view ([`PrivateIdentity`]) that only exists after a successful
//! [`PublicIdentity::authenticate`]. The private view is never persisted directly; its key
//! material lives in the public record as a bundle sealed under the passphrase.
//!
//! [`IdentityStore`] persists public records, aliases and sealed secrets.

#![warn(clippy::all)]

pub mod bundle;
pub mod errors;
pub mod identity;
pub mod store;
pub mod traits;

pub use errors::{IdentityError, Result};
pub use identity::{PrivateIdentity, PublicIdentity};
pub use store::LocalIdentityStore;
pub use traits::IdentityStore;

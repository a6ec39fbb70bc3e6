//! # identify-crypto
//!
//! Cryptographic primitives for the identify service.
//!
//! This crate wraps the small set of operations the identity and token layers are built on:
//!
//! - Ed25519 detached signatures
//! - X25519 + XChaCha20-Poly1305 authenticated boxes between two keypairs
//! - Anonymous boxes sealed with an ephemeral sender key
//! - Symmetric sealing of private key bundles under a passphrase-derived key
//!
//! ## Security Properties
//!
//! - Secret key material is zeroized on drop and never printed by `Debug`
//! - Open failures carry no detail about which check failed
//! - No unsafe code

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod derivation;
pub mod encryption;
pub mod errors;
pub mod hashing;
pub mod keys;
pub mod signatures;
pub mod utils;

pub use constants::*;
pub use derivation::*;
pub use encryption::*;
pub use errors::{CryptoError, Result};
pub use hashing::*;
pub use keys::*;
pub use signatures::*;
pub use utils::*;

//! Token issuance and verification.
//!
//! Wire format: `base64url(header).base64url(claims).base64url(signature)` with header
//! `{"typ":"JWT","alg":"EdDSA"}`, signed by the issuing identity's Ed25519 key.

use crate::{
    claims::TokenClaims,
    errors::{Result, TokenError},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use identify_crypto::{current_timestamp, PUBLIC_KEY_SIZE};
use identify_identity::PrivateIdentity;
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::Deserialize;
use std::{future::Future, time::Duration};
use uuid::Uuid;
use zeroize::Zeroizing;

const PKCS8_ED25519_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// Whole seconds a token issued with `max_age` stays valid for, rounded up.
///
/// `exp` has second resolution and [`Token::valid`] accepts the `exp` second itself, so a
/// token lives at least `max_age` and at most one second longer than this.
pub fn lifetime_secs(max_age: Duration) -> u64 {
    max_age
        .as_secs()
        .saturating_add(u64::from(max_age.subsec_nanos() > 0))
}

/// A signed bearer token and its decoded claims.
///
/// A `Token` only exists after it was signed by, or verified against, the key of the
/// identity it names. Expiry is checked by [`valid`](Token::valid) on every call.
#[derive(Debug, Clone)]
pub struct Token {
    raw: String,
    claims: TokenClaims,
    jti: Uuid,
    identity: Uuid,
}

/// The one claim read before the signature is checked
#[derive(Deserialize)]
struct UnverifiedClaims {
    identity: String,
}

impl Token {
    /// Issue a token for `identity`, valid for `max_age` from now.
    pub fn issue(identity: &PrivateIdentity, max_age: Duration) -> Result<Token> {
        Self::issue_with_permissions(identity, max_age, &[])
    }

    /// Issue a token carrying `permissions`.
    ///
    /// Permission names travel space-separated, so a name that is empty or contains
    /// whitespace is rejected as `Malformed`.
    pub fn issue_with_permissions(
        identity: &PrivateIdentity,
        max_age: Duration,
        permissions: &[String],
    ) -> Result<Token> {
        if let Some(bad) = permissions
            .iter()
            .find(|name| name.is_empty() || name.chars().any(char::is_whitespace))
        {
            return Err(TokenError::Malformed(format!(
                "permission name must be non-empty without whitespace: {:?}",
                bad
            )));
        }

        let jti = Uuid::new_v4();
        let now = current_timestamp();

        let claims = TokenClaims {
            jti: jti.to_string(),
            identity: identity.id().to_string(),
            iat: now,
            exp: now.saturating_add(lifetime_secs(max_age)),
            permissions: permissions.join(" "),
        };

        let seed = identity.signing_keypair().seed_bytes();
        let mut pkcs8_der = Zeroizing::new(Vec::with_capacity(48));
        pkcs8_der.extend_from_slice(&PKCS8_ED25519_PREFIX);
        pkcs8_der.extend_from_slice(&seed[..]);

        let encoding_key = EncodingKey::from_ed_der(&pkcs8_der);
        let raw = encode(&Header::new(Algorithm::EdDSA), &claims, &encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(Token {
            raw,
            claims,
            jti,
            identity: identity.id(),
        })
    }

    /// Parse and verify `raw`.
    ///
    /// The `identity` claim is read without trusting it, `resolve` maps it to that
    /// identity's Ed25519 public key, and the signature is then checked against that key.
    /// An expired token parses; check [`valid`](Token::valid).
    pub async fn parse<F, Fut>(raw: &str, resolve: F) -> Result<Token>
    where
        F: FnOnce(Uuid) -> Fut,
        Fut: Future<Output = Result<[u8; PUBLIC_KEY_SIZE]>>,
    {
        let header =
            decode_header(raw).map_err(|e| TokenError::Malformed(format!("header: {}", e)))?;
        if header.alg != Algorithm::EdDSA {
            return Err(TokenError::AlgorithmMismatch {
                found: format!("{:?}", header.alg),
            });
        }

        let identity = Self::claimed_identity(raw)?;
        let public_key = resolve(identity).await?;

        Self::verify_with_key(raw, identity, &public_key)
    }

    /// Verify `raw` against a known public key
    pub fn verify_with_key(
        raw: &str,
        identity: Uuid,
        public_key: &[u8; PUBLIC_KEY_SIZE],
    ) -> Result<Token> {
        let decoding_key = DecodingKey::from_ed_components(&URL_SAFE_NO_PAD.encode(public_key))
            .map_err(|_| TokenError::SignatureInvalid)?;

        // Expiry is not a parse failure here; `valid()` reports it.
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<TokenClaims>(raw, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch {
                    found: "unknown".to_string(),
                },
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        let claims = data.claims;
        let jti = Uuid::parse_str(&claims.jti)
            .map_err(|_| TokenError::Malformed("jti is not a UUID".to_string()))?;
        if Uuid::parse_str(&claims.identity).ok() != Some(identity) {
            return Err(TokenError::Malformed("identity claim mismatch".to_string()));
        }

        Ok(Token {
            raw: raw.to_string(),
            claims,
            jti,
            identity,
        })
    }

    fn claimed_identity(raw: &str) -> Result<Uuid> {
        let mut segments = raw.split('.');
        let (Some(_), Some(payload), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed(
                "expected three segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed("claims are not base64url".to_string()))?;
        let claims: UnverifiedClaims = serde_json::from_slice(&bytes)
            .map_err(|_| TokenError::Malformed("missing identity claim".to_string()))?;

        Uuid::parse_str(&claims.identity)
            .map_err(|_| TokenError::Malformed("identity is not a UUID".to_string()))
    }

    /// True until the clock has passed the `exp` second.
    ///
    /// Re-evaluated against the clock on every call.
    pub fn valid(&self) -> bool {
        current_timestamp() <= self.claims.exp
    }

    /// `Ok` if [`valid`](Token::valid), `TokenExpired` otherwise
    pub fn ensure_valid(&self) -> Result<()> {
        if self.valid() {
            Ok(())
        } else {
            Err(TokenError::TokenExpired)
        }
    }

    /// Token id
    pub fn id(&self) -> Uuid {
        self.jti
    }

    /// Id of the identity the token was issued to
    pub fn identity(&self) -> Uuid {
        self.identity
    }

    /// Decoded claims
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// True if the token grants `name`
    pub fn has_permission(&self, name: &str) -> bool {
        self.claims.has_permission(name)
    }

    /// Encoded token
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

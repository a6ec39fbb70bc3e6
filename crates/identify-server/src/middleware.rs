//! Authentication gates.
//!
//! Both gates only read from the stores. On success they put the authenticated identity in
//! the request extensions; on failure they answer `401` without saying which check failed.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use identify_identity::{IdentityStore, PrivateIdentity, PublicIdentity};
use identify_tokens::{Token, TokenStore};
use std::sync::Arc;

use crate::{error::ApiError, state::AppState};

/// Name of the cookie carrying a bearer token
pub const AUTH_COOKIE: &str = "Authorization";

/// Identity unlocked with its passphrase
#[derive(Clone)]
pub struct AuthenticatedIdentity(pub PrivateIdentity);

/// Identity vouched for by a bearer token
#[derive(Clone)]
pub struct TokenIdentity {
    pub identity: PublicIdentity,
    pub token: Token,
}

/// Require `Authorization: Basic base64(id:passphrase)`.
///
/// `id` may be an identity id or an alias.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some((id, passphrase)) = basic_credentials(req.headers()) else {
        tracing::debug!("Missing or unreadable basic credentials");
        return challenge(&state.config.realm);
    };

    match unlock(state.identities.get_identity(&id).await, &passphrase) {
        Ok(private) => {
            tracing::debug!(identity_id = %private.id(), "Basic authentication succeeded");
            req.extensions_mut().insert(AuthenticatedIdentity(private));
            next.run(req).await
        }
        Err(e) => {
            tracing::info!(error = %e, "Basic authentication failed");
            challenge(&state.config.realm)
        }
    }
}

/// Require a bearer token from the `Authorization` cookie or header.
pub async fn require_token_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(raw) = bearer_token(req.headers()) else {
        tracing::debug!("No bearer token provided");
        return ApiError::Unauthorized.into_response();
    };

    let token = match state.tokens.verify(&raw).await {
        Ok(token) => token,
        Err(e) => {
            tracing::info!(error = %e, "Token rejected");
            return ApiError::Unauthorized.into_response();
        }
    };

    let identity = match state.identities.get_identity_by_id(token.identity()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(error = %e, "Token identity could not be resolved");
            return ApiError::Unauthorized.into_response();
        }
    };

    tracing::debug!(identity_id = %identity.id(), jti = %token.id(), "Token authentication succeeded");
    req.extensions_mut().insert(TokenIdentity { identity, token });
    next.run(req).await
}

/// Unlock the looked-up identity. A failed lookup still pays for one unlock attempt,
/// against [`PublicIdentity::decoy`], so response timing does not reveal which ids exist.
fn unlock(
    lookup: identify_identity::Result<PublicIdentity>,
    passphrase: &str,
) -> identify_identity::Result<PrivateIdentity> {
    match lookup {
        Ok(public) => public.authenticate(passphrase),
        Err(e) => {
            let _ = PublicIdentity::decoy().authenticate(passphrase);
            Err(e)
        }
    }
}

fn challenge(realm: &str) -> Response {
    let mut response = ApiError::Unauthorized.into_response();
    if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;

    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (id, passphrase) = decoded.split_once(':')?;
    Some((id.to_string(), passphrase.to_string()))
}

/// Cookie first, then the `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.to_string());

    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value carrying `token`
pub fn token_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        AUTH_COOKIE, token, max_age_secs
    )
}

//! JSON API.

pub mod health;
pub mod identities;
pub mod messages;
pub mod secrets;
pub mod tokens;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{
    middleware::{require_basic_auth, require_token_auth},
    state::AppState,
};

/// Routes, each behind the gate it needs
pub fn router(state: Arc<AppState>) -> Router {
    let basic = from_fn_with_state(Arc::clone(&state), require_basic_auth);
    let bearer = from_fn_with_state(Arc::clone(&state), require_token_auth);

    Router::new()
        // Health checks
        .route("/health", get(health::health_check))
        // Identities
        .route("/identities", post(identities::create_identity))
        .route("/identities/:id", get(identities::get_identity))
        // Tokens
        .route(
            "/tokens",
            post(tokens::new_token).route_layer(basic.clone()),
        )
        .route(
            "/tokens/:jti",
            delete(tokens::delete_token).route_layer(bearer.clone()),
        )
        // Secrets
        .route(
            "/secrets/:key",
            get(secrets::get_secret)
                .route_layer(basic.clone())
                .merge(put(secrets::put_secret).route_layer(bearer)),
        )
        // Messages
        .route(
            "/messages/open",
            post(messages::open_message).route_layer(basic),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, HeaderMap, Request, StatusCode},
        response::Response,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use identify_identity::IdentityStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn basic(id: &str, passphrase: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", id, passphrase)))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn issue_token(app: &Router, id: &str, passphrase: &str) -> (StatusCode, HeaderMap, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::post("/tokens")
                    .header(header::AUTHORIZATION, basic(id, passphrase))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        (status, headers, body_json(response).await)
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_and_get_identity() {
        let (state, _dir) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::post("/identities")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"passphrase": "pw", "aliases": ["carol"]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;

        let response = app
            .clone()
            .oneshot(Request::get("/identities/carol").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], created["id"]);

        // Same alias again
        let response = app
            .oneshot(
                Request::post("/identities")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"passphrase": "pw", "aliases": ["carol"]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_identity_is_not_found() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(Request::get("/identities/nobody").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_token_issue_use_and_revoke() {
        let (state, _dir) = test_state();
        let (public, _) = state.identities.new_identity("pw", &[]).await.unwrap();
        let app = router(state);

        let (status, headers, issued) = issue_token(&app, &public.id().to_string(), "pw").await;
        assert_eq!(status, StatusCode::CREATED);
        let cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("Authorization="));
        assert!(cookie.contains("HttpOnly"));

        let token = issued["token"].as_str().unwrap();
        let jti = issued["jti"].as_str().unwrap();
        let bearer = format!("Bearer {}", token);

        let response = app
            .clone()
            .oneshot(
                Request::put("/secrets/k1")
                    .header(header::AUTHORIZATION, &bearer)
                    .body(Body::from("v1"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(
                Request::delete(format!("/tokens/{}", jti))
                    .header(header::AUTHORIZATION, &bearer)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Revoked tokens no longer open the gate.
        let response = app
            .oneshot(
                Request::put("/secrets/k1")
                    .header(header::AUTHORIZATION, &bearer)
                    .body(Body::from("v2"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_permission_with_whitespace_is_bad_request() {
        let (state, _dir) = test_state();
        let (public, _) = state.identities.new_identity("pw", &[]).await.unwrap();
        let app = router(state);

        let response = app
            .oneshot(
                Request::post("/tokens")
                    .header(header::AUTHORIZATION, basic(&public.id().to_string(), "pw"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"permissions": ["secrets:read secrets:write"]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_passphrase_gets_challenge() {
        let (state, _dir) = test_state();
        let (public, _) = state.identities.new_identity("pw", &[]).await.unwrap();
        let app = router(state);

        let (status, headers, body) = issue_token(&app, &public.id().to_string(), "nope").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(headers.contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(body["error"]["message"], "unauthorized");
    }

    #[tokio::test]
    async fn test_cannot_revoke_another_identitys_token() {
        let (state, _dir) = test_state();
        let (alice, _) = state.identities.new_identity("a", &[]).await.unwrap();
        let (bob, _) = state.identities.new_identity("b", &[]).await.unwrap();
        let app = router(state);

        let (_, _, alice_token) = issue_token(&app, &alice.id().to_string(), "a").await;
        let (_, _, bob_token) = issue_token(&app, &bob.id().to_string(), "b").await;

        let response = app
            .oneshot(
                Request::delete(format!("/tokens/{}", alice_token["jti"].as_str().unwrap()))
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", bob_token["token"].as_str().unwrap()),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_secret_round_trip_and_isolation() {
        let (state, _dir) = test_state();
        let (u1, _) = state
            .identities
            .new_identity("correct-horse-battery", &[])
            .await
            .unwrap();
        let (u2, _) = state.identities.new_identity("other", &[]).await.unwrap();
        let app = router(state);
        let u1_id = u1.id().to_string();

        let get = |id: &str, passphrase: &str| {
            Request::get("/secrets/k1")
                .header(header::AUTHORIZATION, basic(id, passphrase))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(get(&u1_id, "correct-horse-battery")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (_, _, issued) = issue_token(&app, &u1_id, "correct-horse-battery").await;
        app.clone()
            .oneshot(
                Request::put("/secrets/k1")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", issued["token"].as_str().unwrap()),
                    )
                    .body(Body::from("v1"))
                    .unwrap(),
            )
            .await
            .unwrap();

        let response = app.clone().oneshot(get(&u1_id, "correct-horse-battery")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"v1");

        let response = app.oneshot(get(&u2.id().to_string(), "other")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_open_anonymous_message() {
        let (state, _dir) = test_state();
        let (public, _) = state.identities.new_identity("pw", &[]).await.unwrap();
        let sealed = public.seal_anonymous(b"hello").unwrap();
        let app = router(state);

        let response = app
            .oneshot(
                Request::post("/messages/open")
                    .header(header::AUTHORIZATION, basic(&public.id().to_string(), "pw"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"sealed": STANDARD.encode(&sealed)}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let message = body_json(response).await["message"].as_str().unwrap().to_string();
        assert_eq!(STANDARD.decode(message).unwrap(), b"hello");
    }
}

//! HTTP contract tests for the `/auth` routes.

use redclass_auth::api::v1::{recover_error, routes};
use redclass_auth::server::Server;
use redclass_auth::settings::*;
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::{Response, StatusCode};

fn settings() -> Settings {
    Settings {
        http: Http {
            address: "127.0.0.1:0".to_string(),
            cert_path: None,
            key_path: None,
        },
        log: Log {
            filter: "info".to_string(),
        },
        jwt: Jwt {
            access_secret: "access_secret".to_string(),
            refresh_secret: "refresh_secret".to_string(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 7 * 24 * 3600,
            issuer: "redclass".to_string(),
        },
        password: Password {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        session: Session {
            backend: "memory".to_string(),
            redis_url: None,
            key_prefix: "test".to_string(),
        },
        user: User {
            backend: "memory".to_string(),
            database_url: None,
        },
    }
}

async fn api() -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone
{
    let server = Arc::new(Server::try_new(&settings()).await.unwrap());
    routes(server).recover(recover_error)
}

fn body(resp: &Response<impl AsRef<[u8]>>) -> Value {
    serde_json::from_slice(resp.body().as_ref()).unwrap()
}

fn error_code(resp: &Response<impl AsRef<[u8]>>) -> String {
    body(resp)["error"]["code"].as_str().unwrap().to_string()
}

fn register_body() -> Value {
    json!({
        "email": "ann@example.com",
        "password": "hunter22",
        "display_name": "Ann",
    })
}

#[tokio::test]
async fn register_returns_user_and_tokens() {
    let api = api().await;

    let resp = warp::test::request()
        .method("POST")
        .path("/auth/register")
        .json(&register_body())
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body(&resp);
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert_eq!(body["user"]["display_name"], "Ann");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert!(body["refresh_token_expires_at"].is_string());
}

#[tokio::test]
async fn register_accepts_camel_case_display_name() {
    let api = api().await;

    let resp = warp::test::request()
        .method("POST")
        .path("/auth/register")
        .json(&json!({
            "email": "bob@example.com",
            "password": "hunter22",
            "displayName": "Bob",
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body(&resp)["user"]["display_name"], "Bob");
}

#[tokio::test]
async fn duplicate_register_conflicts() {
    let api = api().await;
    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let resp = warp::test::request()
            .method("POST")
            .path("/auth/register")
            .json(&register_body())
            .reply(&api)
            .await;
        assert_eq!(resp.status(), expected);
    }
}

#[tokio::test]
async fn bad_input_is_400() {
    let api = api().await;

    let resp = warp::test::request()
        .method("POST")
        .path("/auth/register")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&resp), "invalid_input");

    let resp = warp::test::request()
        .method("POST")
        .path("/auth/register")
        .json(&json!({"email": "ann@example.com", "password": "123", "display_name": "Ann"}))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_401_and_identical() {
    let api = api().await;
    warp::test::request()
        .method("POST")
        .path("/auth/register")
        .json(&register_body())
        .reply(&api)
        .await;

    let wrong_password = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&json!({"email": "ann@example.com", "password": "nope-nope"}))
        .reply(&api)
        .await;
    let unknown_email = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&json!({"email": "who@example.com", "password": "hunter22"}))
        .reply(&api)
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body(), unknown_email.body());

    let ok = warp::test::request()
        .method("POST")
        .path("/auth/login")
        .json(&json!({"email": "ann@example.com", "password": "hunter22"}))
        .reply(&api)
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rotates_and_rejects_replay() {
    let api = api().await;
    let registered = warp::test::request()
        .method("POST")
        .path("/auth/register")
        .json(&register_body())
        .reply(&api)
        .await;
    let refresh_token = body(&registered)["refresh_token"].clone();

    let first = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .reply(&api)
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_ne!(body(&first)["refresh_token"], refresh_token);

    let replay = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .reply(&api)
        .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&replay), "token_invalid");
}

#[tokio::test]
async fn logout_requires_bearer_and_revokes_refresh() {
    let api = api().await;
    let registered = body(
        &warp::test::request()
            .method("POST")
            .path("/auth/register")
            .json(&register_body())
            .reply(&api)
            .await,
    );
    let access = registered["access_token"].as_str().unwrap().to_string();
    let refresh = registered["refresh_token"].clone();

    let missing = warp::test::request()
        .method("POST")
        .path("/auth/logout")
        .json(&json!({ "refresh_token": refresh }))
        .reply(&api)
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&missing), "unauthorized");

    let malformed = warp::test::request()
        .method("POST")
        .path("/auth/logout")
        .header("authorization", format!("Token {access}"))
        .json(&json!({ "refresh_token": refresh }))
        .reply(&api)
        .await;
    assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);

    let bad_token = warp::test::request()
        .method("POST")
        .path("/auth/logout")
        .header("authorization", "Bearer not.a.token")
        .json(&json!({ "refresh_token": refresh }))
        .reply(&api)
        .await;
    assert_eq!(bad_token.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&bad_token), "token_invalid");

    let logout = warp::test::request()
        .method("POST")
        .path("/auth/logout")
        .header("authorization", format!("Bearer {access}"))
        .json(&json!({ "refresh_token": refresh }))
        .reply(&api)
        .await;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let after = warp::test::request()
        .method("POST")
        .path("/auth/refresh")
        .json(&json!({ "refresh_token": refresh }))
        .reply(&api)
        .await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);

    // The access token keeps working until it expires.
    let whoami = warp::test::request()
        .method("GET")
        .path("/auth/whoami")
        .header("authorization", format!("Bearer {access}"))
        .reply(&api)
        .await;
    assert_eq!(body(&whoami)["authenticated"], true);
}

#[tokio::test]
async fn whoami_is_optional_auth() {
    let api = api().await;
    let registered = body(
        &warp::test::request()
            .method("POST")
            .path("/auth/register")
            .json(&register_body())
            .reply(&api)
            .await,
    );
    let access = registered["access_token"].as_str().unwrap();

    let anonymous = warp::test::request()
        .method("GET")
        .path("/auth/whoami")
        .reply(&api)
        .await;
    assert_eq!(anonymous.status(), StatusCode::OK);
    assert_eq!(body(&anonymous), json!({ "authenticated": false }));

    let garbage = warp::test::request()
        .method("GET")
        .path("/auth/whoami")
        .header("authorization", "Bearer garbage")
        .reply(&api)
        .await;
    assert_eq!(garbage.status(), StatusCode::OK);
    assert_eq!(body(&garbage)["authenticated"], false);

    let known = warp::test::request()
        .method("GET")
        .path("/auth/whoami")
        .header("authorization", format!("Bearer {access}"))
        .reply(&api)
        .await;
    let known = body(&known);
    assert_eq!(known["authenticated"], true);
    assert_eq!(known["email"], "ann@example.com");
    assert_eq!(known["user_id"], registered["user"]["id"]);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let api = api().await;
    let resp = warp::test::request()
        .method("GET")
        .path("/auth/nope")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&resp), "not_found");
}

#[tokio::test]
async fn wrong_method_is_405() {
    let api = api().await;
    let resp = warp::test::request()
        .method("GET")
        .path("/auth/login")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_backend_fails_startup() {
    let mut s = settings();
    s.session.backend = "memcached".to_string();
    assert!(Server::try_new(&s).await.is_err());
}

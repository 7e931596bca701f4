use super::error::*;
use super::handler::{self, Authenticated};
use crate::application_port::AuthService;
use crate::domain_model::AuthIdentity;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;
const AUTHORIZATION: &str = "authorization";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::path!("auth" / "register")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(with_verification(server.auth_service.clone()))
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let whoami = warp::path!("auth" / "whoami")
        .and(warp::get())
        .and(with_optional_verification(server.auth_service.clone()))
        .and_then(handler::whoami);

    register.or(login).or(refresh).or(logout).or(whoami)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// Require `Authorization: Bearer <access token>`.
fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (Authenticated,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(AUTHORIZATION).and_then(move |header: Option<String>| {
        let auth_service = auth_service.clone();
        async move {
            let header = header.ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;
            let token =
                bearer_token(&header).ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;
            let claims = auth_service
                .validate_token(token)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)?;
            Ok::<_, warp::Rejection>(Authenticated {
                token: token.to_string(),
                identity: claims.into(),
            })
        }
    })
}

/// Like [`with_verification`] but never rejects: a missing or bad token
/// just yields `None`.
fn with_optional_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (Option<AuthIdentity>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(AUTHORIZATION).and_then(move |header: Option<String>| {
        let auth_service = auth_service.clone();
        async move {
            let identity = match header.as_deref().and_then(bearer_token) {
                Some(token) => auth_service
                    .validate_token(token)
                    .await
                    .ok()
                    .map(AuthIdentity::from),
                None => None,
            };
            Ok::<_, warp::Rejection>(identity)
        }
    })
}

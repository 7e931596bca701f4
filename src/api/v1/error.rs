use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiErrorCode::InvalidInput(e.to_string())
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        ApiErrorCode::internal(format!("unhandled rejection: {:?}", err))
    };

    let body = ErrorBody {
        error: ApiError {
            code: code.as_str(),
            message: code.to_string(),
        },
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&body),
        code.status(),
    ))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    AlreadyExists,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Bearer token required")]
    Unauthorized,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::UserNotFound
            | ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ApiErrorCode::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidCredentials => "invalid_credentials",
            ApiErrorCode::AlreadyExists => "already_exists",
            ApiErrorCode::InvalidToken => "token_invalid",
            ApiErrorCode::UserNotFound => "user_not_found",
            ApiErrorCode::Unauthorized => "unauthorized",
            ApiErrorCode::InvalidInput(_) => "invalid_input",
            ApiErrorCode::NotFound => "not_found",
            ApiErrorCode::MethodNotAllowed => "method_not_allowed",
            ApiErrorCode::InternalError => "internal_error",
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::AlreadyExists => ApiErrorCode::AlreadyExists,
            AuthError::TokenInvalid => ApiErrorCode::InvalidToken,
            AuthError::UserNotFound => ApiErrorCode::UserNotFound,
            AuthError::Unauthorized => ApiErrorCode::Unauthorized,
            AuthError::InvalidInput(msg) => ApiErrorCode::InvalidInput(msg),
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::Internal(e) => ApiErrorCode::internal(e),
        }
    }
}

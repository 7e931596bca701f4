use crate::domain_model::{Claims, TokenKind, User, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    AlreadyExists,
    #[error("user not found")]
    UserNotFound,
    /// Bad signature, wrong algorithm, expired, blacklisted or no live session.
    /// Callers never learn which.
    #[error("token invalid")]
    TokenInvalid,
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// A freshly signed token with its expiry and, for refresh tokens, its id.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub jti: Option<String>,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait TokenCodec: Send + Sync {
    fn issue(&self, user_id: UserId, email: &str, kind: TokenKind)
    -> Result<IssuedToken, AuthError>;
    fn parse(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    /// Never fails on user input: a malformed hash is simply a mismatch.
    async fn verify_password(&self, password: &str, password_hash: &str) -> bool;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<AuthResult, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<AuthResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    async fn logout(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: UserId,
    ) -> Result<(), AuthError>;
    async fn validate_token(&self, access_token: &str) -> Result<Claims, AuthError>;
}

use super::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which secret a token is signed with. Access and refresh tokens never share
/// a key, so a token of one kind never parses as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Decoded payload of a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: UserId,
    pub email: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Present on refresh tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// The identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    pub user_id: UserId,
    pub email: String,
}

impl From<Claims> for AuthIdentity {
    fn from(claims: Claims) -> Self {
        AuthIdentity {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

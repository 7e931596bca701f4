use crate::application_port::{AuthError, Clock, IssuedToken, TokenCodec};
use crate::domain_model::{Claims, TokenKind, UserId};
use chrono::{DateTime, TimeDelta};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtConfig {
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        KeyPair {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 codec with one secret per token kind.
pub struct JwtCodec {
    cfg: JwtConfig,
    access: KeyPair,
    refresh: KeyPair,
    clock: Arc<dyn Clock>,
}

impl JwtCodec {
    const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        JwtCodec {
            access: KeyPair::from_secret(&cfg.access_secret),
            refresh: KeyPair::from_secret(&cfg.refresh_secret),
            cfg,
            clock,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.cfg
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Self::ALGORITHM);
        // Expiry is checked against the injected clock after decoding.
        v.validate_exp = false;
        v.leeway = 0;
        v.set_issuer(&[self.cfg.issuer.as_str()]);
        v.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        v
    }
}

impl TokenCodec for JwtCodec {
    fn issue(
        &self,
        user_id: UserId,
        email: &str,
        kind: TokenKind,
    ) -> Result<IssuedToken, AuthError> {
        let ttl = TimeDelta::from_std(self.cfg.ttl(kind))
            .map_err(|e| AuthError::Internal(format!("{kind} ttl out of range: {e}")))?;
        // Claims carry whole seconds; `expires_at` must match `exp` exactly.
        let iat_dt = DateTime::from_timestamp(self.clock.now().timestamp(), 0)
            .ok_or_else(|| AuthError::Internal("clock out of range".to_string()))?;
        let exp_dt = iat_dt
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Internal(format!("{kind} ttl out of range")))?;
        let jti = match kind {
            TokenKind::Access => None,
            TokenKind::Refresh => Some(Self::gen_jti()),
        };

        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            iss: self.cfg.issuer.clone(),
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
            jti: jti.clone(),
        };
        let token = encode(
            &Header::new(Self::ALGORITHM),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|e| AuthError::Internal(format!("signing {kind} token: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at: exp_dt,
            jti,
        })
    }

    fn parse(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation())
            .map_err(|e| {
                debug!(%kind, "token rejected: {:?}", e.kind());
                AuthError::TokenInvalid
            })?;
        let claims = data.claims;

        if self.clock.now().timestamp() >= claims.exp {
            debug!(%kind, user_id = %claims.user_id, "token rejected: expired");
            return Err(AuthError::TokenInvalid);
        }
        if claims.sub != claims.user_id.to_string() {
            debug!(%kind, "token rejected: subject does not match user id");
            return Err(AuthError::TokenInvalid);
        }
        if kind == TokenKind::Refresh && claims.jti.is_none() {
            debug!(%kind, "token rejected: missing token id");
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }
}

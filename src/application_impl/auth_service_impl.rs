use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Cache TTLs applied to session records, taken from the configured token
/// lifetimes rather than from any individual token's remaining life.
#[derive(Debug, Clone, Copy)]
pub struct SessionTtl {
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl SessionTtl {
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        SessionTtl {
            access_ttl_secs: access_ttl.as_secs().max(1),
            refresh_ttl_secs: refresh_ttl.as_secs().max(1),
        }
    }
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    session_cache: Arc<dyn SessionCache>,
    clock: Arc<dyn Clock>,
    ttl: SessionTtl,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        session_cache: Arc<dyn SessionCache>,
        clock: Arc<dyn Clock>,
        ttl: SessionTtl,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_codec,
            session_cache,
            clock,
            ttl,
            min_password_len: 6,
        }
    }

    fn validate_register(&self, input: &RegisterInput) -> Result<(), AuthError> {
        let email = input.email.as_str();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("email is not valid".to_string()));
        }
        if input.password.chars().count() < self.min_password_len {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters",
                self.min_password_len
            )));
        }
        if input.display_name.trim().is_empty() {
            return Err(AuthError::InvalidInput(
                "display name is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Sign a fresh pair and point the user's session slot at the new
    /// refresh token, replacing whatever it held.
    async fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self
            .token_codec
            .issue(user.id, &user.email, TokenKind::Access)?;
        let refresh = self
            .token_codec
            .issue(user.id, &user.email, TokenKind::Refresh)?;

        let jti = refresh
            .jti
            .as_deref()
            .ok_or_else(|| AuthError::Internal("refresh token issued without id".to_string()))?;
        self.session_cache
            .put_refresh_id(user.id, jti, self.ttl.refresh_ttl_secs)
            .await?;

        Ok(TokenPair {
            access_token: AccessToken(access.token),
            refresh_token: RefreshToken(refresh.token),
            access_token_expires_at: access.expires_at,
            refresh_token_expires_at: refresh.expires_at,
        })
    }
}

/// Emails are stored and looked up in one canonical form.
fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, mut request: RegisterInput) -> Result<AuthResult, AuthError> {
        request.email = normalize_email(&request.email);
        self.validate_register(&request)?;
        let RegisterInput {
            email,
            password,
            display_name,
        } = request;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = self
            .user_repo
            .create(NewUser {
                id: UserId::new_v4(),
                email,
                password_hash,
                display_name,
                created_at: self.clock.now(),
            })
            .await?;

        let tokens = self.issue_pair(&user).await?;
        info!(user_id = %user.id, "user registered");

        Ok(AuthResult { user, tokens })
    }

    async fn login(&self, request: LoginInput) -> Result<AuthResult, AuthError> {
        let LoginInput { email, password } = request;
        let email = normalize_email(&email);

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await
        {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&user).await?;
        info!(user_id = %user.id, "user logged in");

        Ok(AuthResult { user, tokens })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        if self.session_cache.is_blacklisted(refresh_token).await? {
            debug!("refresh rejected: token is blacklisted");
            return Err(AuthError::TokenInvalid);
        }

        let claims = self.token_codec.parse(refresh_token, TokenKind::Refresh)?;
        let user_id = claims.user_id;

        // Only the presence of a live slot is checked, not that it holds
        // this token's id.
        if self.session_cache.get_refresh_id(user_id).await?.is_none() {
            debug!(%user_id, "refresh rejected: no active session");
            return Err(AuthError::TokenInvalid);
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let tokens = self.issue_pair(&user).await?;

        // Not atomic with the slot overwrite above.
        self.session_cache
            .blacklist(refresh_token, self.ttl.refresh_ttl_secs)
            .await?;
        info!(%user_id, "tokens refreshed");

        Ok(tokens)
    }

    async fn logout(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: UserId,
    ) -> Result<(), AuthError> {
        self.session_cache
            .blacklist(access_token, self.ttl.access_ttl_secs)
            .await?;
        self.session_cache
            .blacklist(refresh_token, self.ttl.refresh_ttl_secs)
            .await?;
        self.session_cache.delete_refresh_id(user_id).await?;
        info!(%user_id, "user logged out");
        Ok(())
    }

    async fn validate_token(&self, access_token: &str) -> Result<Claims, AuthError> {
        // Signature and expiry only; the blacklist is enforced for refresh
        // tokens alone.
        self.token_codec.parse(access_token, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_never_zero() {
        let ttl = SessionTtl::new(Duration::from_millis(10), Duration::from_secs(0));
        assert_eq!(ttl.access_ttl_secs, 1);
        assert_eq!(ttl.refresh_ttl_secs, 1);

        let ttl = SessionTtl::new(Duration::from_secs(86400), Duration::from_secs(604800));
        assert_eq!(ttl.access_ttl_secs, 86400);
        assert_eq!(ttl.refresh_ttl_secs, 604800);
    }
}

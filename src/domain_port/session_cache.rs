use crate::application_port::*;
use crate::domain_model::*;

/// TTL-keyed session state: one refresh-token id slot per user plus a
/// revocation set of token strings.
#[async_trait::async_trait]
pub trait SessionCache: Send + Sync {
    /// Overwrite the refresh-token id slot for a user.
    async fn put_refresh_id(
        &self,
        user_id: UserId,
        token_id: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError>;

    async fn get_refresh_id(&self, user_id: UserId) -> Result<Option<String>, AuthError>;

    async fn delete_refresh_id(&self, user_id: UserId) -> Result<(), AuthError>;

    /// Mark a token as revoked until `ttl_secs` have passed.
    async fn blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), AuthError>;

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError>;
}

pub(crate) fn refresh_slot_key(prefix: &str, user_id: UserId) -> String {
    format!("{}:refresh_token:{}", prefix, user_id)
}

/// Blacklist keys carry a digest of the token rather than the token itself.
pub(crate) fn blacklist_key(prefix: &str, token: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(token.as_bytes());
    format!("{}:blacklisted_token:{}", prefix, hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_key_does_not_embed_token() {
        let key = blacklist_key("redclass", "eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert!(key.starts_with("redclass:blacklisted_token:"));
        assert!(!key.contains("payload"));
        assert_eq!(key.len(), "redclass:blacklisted_token:".len() + 64);
    }

    #[test]
    fn blacklist_key_is_stable_per_token() {
        assert_eq!(blacklist_key("p", "a"), blacklist_key("p", "a"));
        assert_ne!(blacklist_key("p", "a"), blacklist_key("p", "b"));
    }

    #[test]
    fn refresh_slot_key_is_per_user() {
        let id: UserId = "8b2f1a52-5d0f-4f7e-9c1a-1f4b8f6d2e10".parse().unwrap();
        assert_eq!(
            refresh_slot_key("redclass", id),
            "redclass:refresh_token:8b2f1a52-5d0f-4f7e-9c1a-1f4b8f6d2e10"
        );
    }
}

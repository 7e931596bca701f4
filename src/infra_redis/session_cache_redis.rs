use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

/// Value stored in a user's refresh slot.
#[derive(Debug, Serialize, Deserialize)]
struct RefreshSlot {
    token_id: String,
    user_id: UserId,
}

pub struct RedisSessionCache {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionCache {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionCache {
            conn,
            prefix: prefix.into(),
        }
    }

    fn slot_key(&self, user_id: UserId) -> String {
        refresh_slot_key(&self.prefix, user_id)
    }

    fn blacklist_key(&self, token: &str) -> String {
        blacklist_key(&self.prefix, token)
    }
}

#[async_trait::async_trait]
impl SessionCache for RedisSessionCache {
    async fn put_refresh_id(
        &self,
        user_id: UserId,
        token_id: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        let slot = serde_json::to_string(&RefreshSlot {
            token_id: token_id.to_string(),
            user_id,
        })
        .map_err(|e| AuthError::Internal(e.to_string()))?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.slot_key(user_id), slot, ttl_secs.max(1))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get_refresh_id(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.slot_key(user_id))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        raw.map(|raw| {
            serde_json::from_str::<RefreshSlot>(&raw)
                .map(|slot| slot.token_id)
                .map_err(|e| AuthError::Store(format!("corrupt refresh slot: {e}")))
        })
        .transpose()
    }

    async fn delete_refresh_id(&self, user_id: UserId) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(self.slot_key(user_id))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.blacklist_key(token), "1", ttl_secs.max(1))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(self.blacklist_key(token))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_value_round_trips_through_json() {
        let user_id = UserId::new_v4();
        let raw = serde_json::to_string(&RefreshSlot {
            token_id: "abc".to_string(),
            user_id,
        })
        .unwrap();

        assert!(raw.contains("\"token_id\":\"abc\""));
        let slot: RefreshSlot = serde_json::from_str(&raw).unwrap();
        assert_eq!(slot.user_id, user_id);
    }
}

use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// Credential store kept in process memory. Emails stay reserved after
/// deactivation, mirroring the unique index of the SQL schema.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of stored rows, active or not.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let Some(user_id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };
        self.find_by_id(user_id).await
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .get(&user_id)
            .filter(|user| user.is_active)
            .map(|user| user.value().clone()))
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let mut claimed = false;
        self.emails.entry(user.email.clone()).or_insert_with(|| {
            claimed = true;
            user.id
        });
        if !claimed {
            return Err(AuthError::AlreadyExists);
        }

        let user = user.into_user();
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn deactivate(&self, user_id: UserId) -> Result<bool, AuthError> {
        match self.users.get_mut(&user_id) {
            Some(mut user) if user.is_active => {
                user.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            id: UserId::new_v4(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            display_name: "Ann".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = MemoryUserRepo::new();
        let created = repo.create(new_user("ann@example.com")).await.unwrap();
        assert!(created.is_active);

        let by_email = repo.find_by_email("ann@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ann@example.com");
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let repo = MemoryUserRepo::new();
        repo.create(new_user("ann@example.com")).await.unwrap();

        let err = repo.create(new_user("ann@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn deactivated_users_are_hidden() {
        let repo = MemoryUserRepo::new();
        let user = repo.create(new_user("ann@example.com")).await.unwrap();

        assert!(repo.deactivate(user.id).await.unwrap());
        assert!(!repo.deactivate(user.id).await.unwrap());
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
        assert!(repo.find_by_email("ann@example.com").await.unwrap().is_none());

        let err = repo.create(new_user("ann@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
    }
}

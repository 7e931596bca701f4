use crate::application_port::*;
use crate::domain_model::*;

/// Credential store. Every lookup is scoped to active users; a deactivated
/// user is indistinguishable from a missing one.
#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError>;

    /// Fails with [`AuthError::AlreadyExists`] when the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    /// Soft delete. Returns whether an active user was found.
    async fn deactivate(&self, user_id: UserId) -> Result<bool, AuthError>;
}

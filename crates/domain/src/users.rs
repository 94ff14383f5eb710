use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::User;
use crate::ports::users::UserRepository;

/// Mirrored-user operations. Relation changes are read-modify-write of
/// the relevant set; re-applying one is a no-op, which is what makes
/// at-least-once event delivery safe.
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn find(&self, user_id: &str) -> DomainResult<User> {
        self.users.get(user_id).await?.ok_or(DomainError::NotFound)
    }

    pub async fn save(&self, user: &User) -> DomainResult<User> {
        self.users.save(user).await
    }

    pub async fn follow(&self, user_id: &str, target_id: &str) -> DomainResult<()> {
        let mut user = self.find(user_id).await?;
        user.following.insert(target_id.to_string());
        self.users.save(&user).await?;
        Ok(())
    }

    pub async fn unfollow(&self, user_id: &str, target_id: &str) -> DomainResult<()> {
        let mut user = self.find(user_id).await?;
        user.following.remove(target_id);
        self.users.save(&user).await?;
        Ok(())
    }

    pub async fn mute(&self, user_id: &str, target_id: &str) -> DomainResult<()> {
        let mut user = self.find(user_id).await?;
        user.muted.insert(target_id.to_string());
        self.users.save(&user).await?;
        Ok(())
    }

    pub async fn unmute(&self, user_id: &str, target_id: &str) -> DomainResult<()> {
        let mut user = self.find(user_id).await?;
        user.muted.remove(target_id);
        self.users.save(&user).await?;
        Ok(())
    }

    pub async fn block(&self, user_id: &str, target_id: &str) -> DomainResult<()> {
        let mut user = self.find(user_id).await?;
        user.blocked.insert(target_id.to_string());
        self.users.save(&user).await?;
        Ok(())
    }

    pub async fn unblock(&self, user_id: &str, target_id: &str) -> DomainResult<()> {
        let mut user = self.find(user_id).await?;
        user.blocked.remove(target_id);
        self.users.save(&user).await?;
        Ok(())
    }
}

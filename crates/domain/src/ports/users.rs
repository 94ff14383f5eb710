use crate::DomainResult;
use crate::identity::User;
use crate::ports::BoxFuture;

/// Identity-store contract. Users are owned upstream; this core only
/// mirrors them and mutates the relation sets on change events.
pub trait UserRepository: Send + Sync {
    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>>;

    fn get_by_ids(&self, user_ids: &[String]) -> BoxFuture<'_, DomainResult<Vec<User>>>;

    fn get_by_usernames(&self, usernames: &[String]) -> BoxFuture<'_, DomainResult<Vec<User>>>;

    fn save(&self, user: &User) -> BoxFuture<'_, DomainResult<User>>;

    /// Ids of every public account, backed by the public-flag index.
    fn public_poster_ids(&self) -> BoxFuture<'_, DomainResult<Vec<String>>>;
}

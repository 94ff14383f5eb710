use crate::DomainResult;
use crate::posts::Post;
use crate::ports::BoxFuture;
use crate::query::PostSearch;

/// Document-store contract for post documents. `multi_search` runs the
/// given searches independently and concurrently; the result vector is
/// positionally aligned with the input and the call fails as a whole if
/// any sub-search fails.
pub trait PostStore: Send + Sync {
    fn get(&self, post_id: &str) -> BoxFuture<'_, DomainResult<Option<Post>>>;

    fn save(&self, post: &Post) -> BoxFuture<'_, DomainResult<Post>>;

    fn save_all(&self, posts: &[Post]) -> BoxFuture<'_, DomainResult<()>>;

    fn search(&self, search: &PostSearch) -> BoxFuture<'_, DomainResult<Vec<Post>>>;

    fn multi_search(&self, searches: &[PostSearch])
    -> BoxFuture<'_, DomainResult<Vec<Vec<Post>>>>;
}

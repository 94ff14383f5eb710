//! In-memory port implementations for unit tests.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::User;
use crate::ports::BoxFuture;
use crate::ports::posts::PostStore;
use crate::ports::users::UserRepository;
use crate::posts::Post;
use crate::query::{PostSearch, SortOrder};

#[derive(Default)]
pub struct MemoryUsers {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

impl UserRepository for MemoryUsers {
    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>> {
        let user_id = user_id.to_string();
        Box::pin(async move { Ok(self.users.read().await.get(&user_id).cloned()) })
    }

    fn get_by_ids(&self, user_ids: &[String]) -> BoxFuture<'_, DomainResult<Vec<User>>> {
        let user_ids = user_ids.to_vec();
        Box::pin(async move {
            let users = self.users.read().await;
            Ok(user_ids
                .iter()
                .filter_map(|id| users.get(id).cloned())
                .collect())
        })
    }

    fn get_by_usernames(&self, usernames: &[String]) -> BoxFuture<'_, DomainResult<Vec<User>>> {
        let usernames = usernames.to_vec();
        Box::pin(async move {
            let users = self.users.read().await;
            Ok(users
                .values()
                .filter(|user| usernames.contains(&user.username))
                .cloned()
                .collect())
        })
    }

    fn save(&self, user: &User) -> BoxFuture<'_, DomainResult<User>> {
        let user = user.clone();
        Box::pin(async move {
            self.users
                .write()
                .await
                .insert(user.id.clone(), user.clone());
            Ok(user)
        })
    }

    fn public_poster_ids(&self) -> BoxFuture<'_, DomainResult<Vec<String>>> {
        Box::pin(async move {
            let users = self.users.read().await;
            Ok(users
                .values()
                .filter(|user| user.public_account)
                .map(|user| user.id.clone())
                .collect())
        })
    }
}

#[derive(Default)]
pub struct MemoryPosts {
    posts: RwLock<HashMap<String, Post>>,
}

impl MemoryPosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, post: Post) {
        self.posts.write().await.insert(post.id.clone(), post);
    }

    pub async fn get_unchecked(&self, post_id: &str) -> Post {
        self.posts
            .read()
            .await
            .get(post_id)
            .cloned()
            .expect("post present")
    }

    async fn run_search(&self, search: &PostSearch) -> Vec<Post> {
        let posts = self.posts.read().await;
        let mut hits: Vec<Post> = posts
            .values()
            .filter(|post| search.query.matches_post(post))
            .cloned()
            .collect();
        match search.sort {
            SortOrder::PostedAtAsc => hits.sort_by_key(|post| post.posted_at_ms),
            SortOrder::PostedAtDesc => hits.sort_by_key(|post| std::cmp::Reverse(post.posted_at_ms)),
        }
        if let Some(page) = search.page {
            hits = hits
                .into_iter()
                .skip(page.offset())
                .take(page.size)
                .collect();
        }
        hits
    }
}

impl PostStore for MemoryPosts {
    fn get(&self, post_id: &str) -> BoxFuture<'_, DomainResult<Option<Post>>> {
        let post_id = post_id.to_string();
        Box::pin(async move { Ok(self.posts.read().await.get(&post_id).cloned()) })
    }

    fn save(&self, post: &Post) -> BoxFuture<'_, DomainResult<Post>> {
        let post = post.clone();
        Box::pin(async move {
            self.posts
                .write()
                .await
                .insert(post.id.clone(), post.clone());
            Ok(post)
        })
    }

    fn save_all(&self, posts: &[Post]) -> BoxFuture<'_, DomainResult<()>> {
        let posts = posts.to_vec();
        Box::pin(async move {
            let mut store = self.posts.write().await;
            for post in posts {
                store.insert(post.id.clone(), post);
            }
            Ok(())
        })
    }

    fn search(&self, search: &PostSearch) -> BoxFuture<'_, DomainResult<Vec<Post>>> {
        let search = search.clone();
        Box::pin(async move { Ok(self.run_search(&search).await) })
    }

    fn multi_search(
        &self,
        searches: &[PostSearch],
    ) -> BoxFuture<'_, DomainResult<Vec<Vec<Post>>>> {
        let searches = searches.to_vec();
        Box::pin(async move {
            let mut results = Vec::with_capacity(searches.len());
            for search in &searches {
                results.push(self.run_search(search).await);
            }
            Ok(results)
        })
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: RwLock<Vec<(String, Vec<String>)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl crate::ports::events::TagActivityPublisher for RecordingPublisher {
    fn publish(&self, poster_id: &str, tags: &[String]) -> BoxFuture<'_, DomainResult<()>> {
        let poster_id = poster_id.to_string();
        let tags = tags.to_vec();
        Box::pin(async move {
            self.published.write().await.push((poster_id, tags));
            Ok(())
        })
    }
}

/// Publisher that fails every publish, for fire-and-forget tests.
pub struct FailingPublisher;

impl crate::ports::events::TagActivityPublisher for FailingPublisher {
    fn publish(&self, _poster_id: &str, _tags: &[String]) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move { Err(DomainError::Validation("pipeline down".to_string())) })
    }
}

/// Post store that fails every call, for failure-policy tests.
pub struct FailingPosts;

impl PostStore for FailingPosts {
    fn get(&self, _post_id: &str) -> BoxFuture<'_, DomainResult<Option<Post>>> {
        Box::pin(async move { Err(DomainError::Validation("store down".to_string())) })
    }

    fn save(&self, _post: &Post) -> BoxFuture<'_, DomainResult<Post>> {
        Box::pin(async move { Err(DomainError::Validation("store down".to_string())) })
    }

    fn save_all(&self, _posts: &[Post]) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move { Err(DomainError::Validation("store down".to_string())) })
    }

    fn search(&self, _search: &PostSearch) -> BoxFuture<'_, DomainResult<Vec<Post>>> {
        Box::pin(async move { Err(DomainError::Validation("store down".to_string())) })
    }

    fn multi_search(
        &self,
        _searches: &[PostSearch],
    ) -> BoxFuture<'_, DomainResult<Vec<Vec<Post>>>> {
        Box::pin(async move { Err(DomainError::Validation("store down".to_string())) })
    }
}

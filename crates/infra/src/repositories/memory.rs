use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::RwLock;

use lensa_domain::DomainResult;
use lensa_domain::identity::User;
use lensa_domain::ports::BoxFuture;
use lensa_domain::ports::posts::PostStore;
use lensa_domain::ports::users::UserRepository;
use lensa_domain::posts::Post;
use lensa_domain::query::{PostSearch, SortOrder};

/// Identity-store mirror backed by a process-local map. The default
/// backend for development and tests.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>> {
        let user_id = user_id.to_string();
        Box::pin(async move { Ok(self.store.read().await.get(&user_id).cloned()) })
    }

    fn get_by_ids(&self, user_ids: &[String]) -> BoxFuture<'_, DomainResult<Vec<User>>> {
        let user_ids = user_ids.to_vec();
        Box::pin(async move {
            let store = self.store.read().await;
            Ok(user_ids
                .iter()
                .filter_map(|id| store.get(id).cloned())
                .collect())
        })
    }

    fn get_by_usernames(&self, usernames: &[String]) -> BoxFuture<'_, DomainResult<Vec<User>>> {
        let usernames = usernames.to_vec();
        Box::pin(async move {
            let store = self.store.read().await;
            let mut users: Vec<User> = store
                .values()
                .filter(|user| usernames.contains(&user.username))
                .cloned()
                .collect();
            users.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(users)
        })
    }

    fn save(&self, user: &User) -> BoxFuture<'_, DomainResult<User>> {
        let user = user.clone();
        Box::pin(async move {
            self.store
                .write()
                .await
                .insert(user.id.clone(), user.clone());
            Ok(user)
        })
    }

    fn public_poster_ids(&self) -> BoxFuture<'_, DomainResult<Vec<String>>> {
        Box::pin(async move {
            let store = self.store.read().await;
            let mut ids: Vec<String> = store
                .values()
                .filter(|user| user.public_account)
                .map(|user| user.id.clone())
                .collect();
            ids.sort();
            Ok(ids)
        })
    }
}

/// Post index backed by a process-local map, evaluating queries with the
/// domain's reference matcher. `multi_search` runs its sub-searches
/// concurrently and fails as a whole when any of them fails.
#[derive(Default)]
pub struct InMemoryPostStore {
    store: Arc<RwLock<HashMap<String, Post>>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run_search(&self, search: &PostSearch) -> DomainResult<Vec<Post>> {
        let store = self.store.read().await;
        let mut hits: Vec<Post> = store
            .values()
            .filter(|post| search.query.matches_post(post))
            .cloned()
            .collect();
        match search.sort {
            SortOrder::PostedAtAsc => hits.sort_by_key(|post| post.posted_at_ms),
            SortOrder::PostedAtDesc => {
                hits.sort_by_key(|post| std::cmp::Reverse(post.posted_at_ms))
            }
        }
        if let Some(page) = search.page {
            hits = hits
                .into_iter()
                .skip(page.offset())
                .take(page.size)
                .collect();
        }
        Ok(hits)
    }
}

impl PostStore for InMemoryPostStore {
    fn get(&self, post_id: &str) -> BoxFuture<'_, DomainResult<Option<Post>>> {
        let post_id = post_id.to_string();
        Box::pin(async move { Ok(self.store.read().await.get(&post_id).cloned()) })
    }

    fn save(&self, post: &Post) -> BoxFuture<'_, DomainResult<Post>> {
        let post = post.clone();
        Box::pin(async move {
            self.store
                .write()
                .await
                .insert(post.id.clone(), post.clone());
            Ok(post)
        })
    }

    fn save_all(&self, posts: &[Post]) -> BoxFuture<'_, DomainResult<()>> {
        let posts = posts.to_vec();
        Box::pin(async move {
            let mut store = self.store.write().await;
            for post in posts {
                store.insert(post.id.clone(), post);
            }
            Ok(())
        })
    }

    fn search(&self, search: &PostSearch) -> BoxFuture<'_, DomainResult<Vec<Post>>> {
        let search = search.clone();
        Box::pin(async move { self.run_search(&search).await })
    }

    fn multi_search(
        &self,
        searches: &[PostSearch],
    ) -> BoxFuture<'_, DomainResult<Vec<Vec<Post>>>> {
        let searches = searches.to_vec();
        Box::pin(async move {
            try_join_all(searches.iter().map(|search| self.run_search(search))).await
        })
    }
}

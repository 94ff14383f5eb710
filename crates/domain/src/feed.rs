use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::Viewer;
use crate::ports::posts::PostStore;
use crate::ports::users::UserRepository;
use crate::posts::Post;
use crate::query::{overview_search, posts_by_poster_query};

/// Hard cap on feed length, an inclusive slice of exactly this many.
pub const MAX_FEED_POSTS: usize = 20;

/// Builds the home feed by fanning one poster query out per followed,
/// unmuted poster, merging the hits and keeping the newest. Per-poster
/// queries bound each sub-query's selectivity; a failing sub-query fails
/// the whole feed request. Blocked posters are not subtracted here: the
/// feed walks the follow set as-is, so a blocked-but-followed poster
/// still shows up.
pub struct FeedAggregator {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostStore>,
}

impl FeedAggregator {
    pub fn new(users: Arc<dyn UserRepository>, posts: Arc<dyn PostStore>) -> Self {
        Self { users, posts }
    }

    pub async fn get_feed(&self, viewer: &Viewer) -> DomainResult<Vec<Post>> {
        let viewer_id = viewer.require_user()?;
        let user = self
            .users
            .get(viewer_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut unmuted: Vec<&String> = user
            .following
            .iter()
            .filter(|poster_id| !user.muted.contains(*poster_id))
            .collect();
        if unmuted.is_empty() {
            return Ok(Vec::new());
        }
        unmuted.sort();

        let searches: Vec<_> = unmuted
            .iter()
            .map(|poster_id| overview_search(posts_by_poster_query(poster_id), None))
            .collect();
        let results = self.posts.multi_search(&searches).await?;

        let mut feed: Vec<Post> = results.into_iter().flatten().collect();
        feed.sort_by_key(|post| std::cmp::Reverse(post.posted_at_ms));
        feed.truncate(MAX_FEED_POSTS);
        Ok(feed)
    }
}

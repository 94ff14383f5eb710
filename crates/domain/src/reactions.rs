use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::Viewer;
use crate::ports::posts::PostStore;
use crate::posts::Post;
use crate::visibility::VisibilityResolver;

/// Like/dislike/favorite transitions on a post. Like and dislike are
/// mutually exclusive per user; favorite is an orthogonal flag. Every
/// operation resolves the post, checks visibility for the caller,
/// mutates the reaction sets and writes the whole document back.
pub struct ReactionStateMachine {
    posts: Arc<dyn PostStore>,
    visibility: Arc<VisibilityResolver>,
}

impl ReactionStateMachine {
    pub fn new(posts: Arc<dyn PostStore>, visibility: Arc<VisibilityResolver>) -> Self {
        Self { posts, visibility }
    }

    pub async fn like(&self, viewer: &Viewer, post_id: &str) -> DomainResult<()> {
        let (mut post, user_id) = self.load_authorized(viewer, post_id).await?;
        post.dislikes.remove(&user_id);
        post.likes.insert(user_id);
        self.posts.save(&post).await?;
        Ok(())
    }

    pub async fn remove_like(&self, viewer: &Viewer, post_id: &str) -> DomainResult<()> {
        let (mut post, user_id) = self.load_authorized(viewer, post_id).await?;
        post.likes.remove(&user_id);
        self.posts.save(&post).await?;
        Ok(())
    }

    pub async fn dislike(&self, viewer: &Viewer, post_id: &str) -> DomainResult<()> {
        let (mut post, user_id) = self.load_authorized(viewer, post_id).await?;
        post.likes.remove(&user_id);
        post.dislikes.insert(user_id);
        self.posts.save(&post).await?;
        Ok(())
    }

    pub async fn remove_dislike(&self, viewer: &Viewer, post_id: &str) -> DomainResult<()> {
        let (mut post, user_id) = self.load_authorized(viewer, post_id).await?;
        post.dislikes.remove(&user_id);
        self.posts.save(&post).await?;
        Ok(())
    }

    pub async fn favorite(&self, viewer: &Viewer, post_id: &str) -> DomainResult<()> {
        let (mut post, user_id) = self.load_authorized(viewer, post_id).await?;
        post.favorites.insert(user_id);
        self.posts.save(&post).await?;
        Ok(())
    }

    pub async fn unfavorite(&self, viewer: &Viewer, post_id: &str) -> DomainResult<()> {
        let (mut post, user_id) = self.load_authorized(viewer, post_id).await?;
        post.favorites.remove(&user_id);
        self.posts.save(&post).await?;
        Ok(())
    }

    async fn load_authorized(
        &self,
        viewer: &Viewer,
        post_id: &str,
    ) -> DomainResult<(Post, String)> {
        let user_id = viewer.require_user()?.to_string();
        let post = self
            .posts
            .get(post_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !self.visibility.is_visible(post.poster_id(), viewer).await? {
            return Err(DomainError::Forbidden("denied".to_string()));
        }
        Ok((post, user_id))
    }
}

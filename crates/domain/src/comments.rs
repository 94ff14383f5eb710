use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::{UserSnapshot, Viewer};
use crate::ports::posts::PostStore;
use crate::ports::users::UserRepository;
use crate::posts::Comment;
use crate::util::now_ms;
use crate::visibility::VisibilityResolver;

/// Appends comments to posts. Comment ids are caller-supplied and unique
/// per post; a duplicate id fails rather than deduplicating. Comments
/// are stored in append order and carry a snapshot of the commenter
/// taken at append time.
pub struct CommentAppender {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostStore>,
    visibility: Arc<VisibilityResolver>,
}

impl CommentAppender {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostStore>,
        visibility: Arc<VisibilityResolver>,
    ) -> Self {
        Self {
            users,
            posts,
            visibility,
        }
    }

    pub async fn add_comment(
        &self,
        viewer: &Viewer,
        post_id: &str,
        comment_id: &str,
        body: &str,
    ) -> DomainResult<()> {
        let user_id = viewer.require_user()?;
        if comment_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "comment id must not be empty".to_string(),
            ));
        }
        if body.trim().is_empty() {
            return Err(DomainError::Validation(
                "comment body must not be empty".to_string(),
            ));
        }

        let commenter = self
            .users
            .get(user_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut post = self
            .posts
            .get(post_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !self.visibility.is_visible(post.poster_id(), viewer).await? {
            return Err(DomainError::Forbidden("denied".to_string()));
        }

        if post.comments.iter().any(|comment| comment.id == comment_id) {
            return Err(DomainError::Conflict);
        }
        post.comments.push(Comment {
            id: comment_id.to_string(),
            commenter: UserSnapshot::of(&commenter),
            commented_at_ms: now_ms(),
            body: body.to_string(),
        });
        self.posts.save(&post).await?;
        Ok(())
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::{UserSnapshot, Viewer};
use crate::ports::events::TagActivityPublisher;
use crate::ports::posts::PostStore;
use crate::ports::users::UserRepository;
use crate::query::{
    BoolQuery, PageRequest, overview_search, posts_by_poster_query, posts_by_tags_query,
    visible_posters_query,
};
use crate::util::now_ms;
use crate::visibility::VisibilityResolver;

/// A stored post document. The poster, tagged users and comment authors
/// are embedded [`UserSnapshot`]s rather than references into the user
/// store; the sync service keeps those copies current. Reactions are
/// plain user-id sets. Comments are kept in append order; presentation
/// reverses them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub image_url: String,
    pub description: String,
    pub poster: UserSnapshot,
    pub posted_at_ms: i64,
    pub tags: HashSet<String>,
    pub user_tags: HashSet<UserSnapshot>,
    pub likes: HashSet<String>,
    pub dislikes: HashSet<String>,
    pub favorites: HashSet<String>,
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new(
        id: impl Into<String>,
        image_url: impl Into<String>,
        description: impl Into<String>,
        poster: UserSnapshot,
        posted_at_ms: i64,
        tags: HashSet<String>,
        user_tags: HashSet<UserSnapshot>,
    ) -> Self {
        Self {
            id: id.into(),
            image_url: image_url.into(),
            description: description.into(),
            poster,
            posted_at_ms,
            tags,
            user_tags,
            likes: HashSet::new(),
            dislikes: HashSet::new(),
            favorites: HashSet::new(),
            comments: Vec::new(),
        }
    }

    pub fn poster_id(&self) -> &str {
        &self.poster.id
    }
}

/// A comment embedded in its post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub commenter: UserSnapshot,
    pub commented_at_ms: i64,
    pub body: String,
}

/// Listing shape: reaction and comment detail collapsed to counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostOverview {
    pub id: String,
    pub image_url: String,
    pub description: String,
    pub poster: UserSnapshot,
    pub posted_at_ms: i64,
    pub tags: Vec<String>,
    pub user_tags: Vec<UserSnapshot>,
    pub like_count: usize,
    pub dislike_count: usize,
    pub favorite_count: usize,
    pub comment_count: usize,
}

impl From<&Post> for PostOverview {
    fn from(post: &Post) -> Self {
        let mut tags: Vec<String> = post.tags.iter().cloned().collect();
        tags.sort();
        let mut user_tags: Vec<UserSnapshot> = post.user_tags.iter().cloned().collect();
        user_tags.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            id: post.id.clone(),
            image_url: post.image_url.clone(),
            description: post.description.clone(),
            poster: post.poster.clone(),
            posted_at_ms: post.posted_at_ms,
            tags,
            user_tags,
            like_count: post.likes.len(),
            dislike_count: post.dislikes.len(),
            favorite_count: post.favorites.len(),
            comment_count: post.comments.len(),
        }
    }
}

/// Single-post shape: full reaction membership and the comment thread,
/// newest comment first. Storage keeps append order; the reversal
/// happens here, at presentation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: String,
    pub image_url: String,
    pub description: String,
    pub poster: UserSnapshot,
    pub posted_at_ms: i64,
    pub tags: Vec<String>,
    pub user_tags: Vec<UserSnapshot>,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub favorites: Vec<String>,
    pub comments: Vec<Comment>,
}

impl From<&Post> for PostDetail {
    fn from(post: &Post) -> Self {
        let sorted_ids = |set: &HashSet<String>| {
            let mut out: Vec<String> = set.iter().cloned().collect();
            out.sort();
            out
        };
        let mut tags: Vec<String> = post.tags.iter().cloned().collect();
        tags.sort();
        let mut user_tags: Vec<UserSnapshot> = post.user_tags.iter().cloned().collect();
        user_tags.sort_by(|a, b| a.id.cmp(&b.id));
        let mut comments = post.comments.clone();
        comments.reverse();
        Self {
            id: post.id.clone(),
            image_url: post.image_url.clone(),
            description: post.description.clone(),
            poster: post.poster.clone(),
            posted_at_ms: post.posted_at_ms,
            tags,
            user_tags,
            likes: sorted_ids(&post.likes),
            dislikes: sorted_ids(&post.dislikes),
            favorites: sorted_ids(&post.favorites),
            comments,
        }
    }
}

/// Input for post creation. Tagged users arrive as usernames and are
/// resolved to snapshots at create time.
#[derive(Clone, Debug)]
pub struct NewPost {
    pub id: String,
    pub image_url: String,
    pub description: String,
    pub tags: HashSet<String>,
    pub user_tag_usernames: Vec<String>,
}

/// Create, direct-read and search operations on posts, all gated by the
/// visibility resolver.
pub struct PostService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostStore>,
    visibility: Arc<VisibilityResolver>,
    tag_activity: Arc<dyn TagActivityPublisher>,
}

impl PostService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostStore>,
        visibility: Arc<VisibilityResolver>,
        tag_activity: Arc<dyn TagActivityPublisher>,
    ) -> Self {
        Self {
            users,
            posts,
            visibility,
            tag_activity,
        }
    }

    /// Creates a post once per id. With at least one tag the post is
    /// announced to the interest pipeline, fire-and-forget.
    pub async fn create(&self, viewer: &Viewer, new_post: NewPost) -> DomainResult<Post> {
        let poster_id = viewer.require_user()?;
        if new_post.id.trim().is_empty() {
            return Err(DomainError::Validation("post id must not be empty".to_string()));
        }
        if new_post.image_url.trim().is_empty() {
            return Err(DomainError::Validation(
                "image url must not be empty".to_string(),
            ));
        }

        if self.posts.get(&new_post.id).await?.is_some() {
            return Err(DomainError::Conflict);
        }
        let poster = self
            .users
            .get(poster_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let tagged_users = self
            .users
            .get_by_usernames(&new_post.user_tag_usernames)
            .await?;
        let user_tags: HashSet<UserSnapshot> =
            tagged_users.iter().map(UserSnapshot::of).collect();

        let post = Post::new(
            new_post.id,
            new_post.image_url,
            new_post.description,
            UserSnapshot::of(&poster),
            now_ms(),
            new_post.tags,
            user_tags,
        );
        let created = self.posts.save(&post).await?;

        if !created.tags.is_empty() {
            let mut tags: Vec<String> = created.tags.iter().cloned().collect();
            tags.sort();
            // fire-and-forget: a failed publish never fails the create
            let _ = self.tag_activity.publish(&created.poster.id, &tags).await;
        }
        Ok(created)
    }

    /// Direct read by id, visibility-gated.
    pub async fn get(&self, viewer: &Viewer, post_id: &str) -> DomainResult<Post> {
        let post = self
            .posts
            .get(post_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !self.visibility.is_visible(post.poster_id(), viewer).await? {
            return Err(DomainError::Forbidden("denied".to_string()));
        }
        Ok(post)
    }

    /// All of one poster's posts, oldest first. The poster must be
    /// visible to the viewer; the result itself is a plain poster
    /// filter.
    pub async fn posts_by_poster(
        &self,
        viewer: &Viewer,
        poster_id: &str,
        page: PageRequest,
    ) -> DomainResult<Vec<Post>> {
        if !self.visibility.is_visible(poster_id, viewer).await? {
            return Err(DomainError::Forbidden("denied".to_string()));
        }
        let query = BoolQuery::new()
            .must(posts_by_poster_query(poster_id))
            .build();
        self.posts
            .search(&overview_search(query, Some(page)))
            .await
    }

    /// Tag search intersected with the viewer's unmuted visibility set.
    /// Independent of the follow relation beyond what visibility itself
    /// encodes; an empty tag list matches nothing.
    pub async fn posts_by_tags(
        &self,
        viewer: &Viewer,
        tags: &[String],
        page: PageRequest,
    ) -> DomainResult<Vec<Post>> {
        let mut visible: Vec<String> = self
            .visibility
            .viewable_unmuted_poster_ids(viewer)
            .await?
            .into_iter()
            .collect();
        visible.sort();

        let query = BoolQuery::new()
            .must(visible_posters_query(&visible))
            .must(posts_by_tags_query(tags))
            .build();
        self.posts
            .search(&overview_search(query, Some(page)))
            .await
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::{User, UserSnapshot};
use crate::ports::posts::PostStore;
use crate::posts::Post;
use crate::query::{mentions_query, overview_search, posts_by_poster_query};
use crate::users::UserService;

/// Identity-change notifications from the upstream identity service.
/// For the relation variants `applied: true` applies the relation and
/// `false` removes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityEvent {
    UserChanged {
        id: String,
        username: String,
        avatar_url: String,
        public_account: bool,
    },
    FollowChanged {
        follower_id: String,
        target_id: String,
        applied: bool,
    },
    MuteChanged {
        muter_id: String,
        target_id: String,
        applied: bool,
    },
    BlockChanged {
        blocker_id: String,
        target_id: String,
        applied: bool,
    },
}

/// Rewrites every stale embedded snapshot of a changed user across the
/// post index. Two passes, each a bulk overwrite keyed by id, so the
/// whole thing is idempotent: re-running the same change converges to
/// the same documents. Not transactional; readers can observe a
/// half-propagated state between the passes.
pub struct DenormalizationSync {
    posts: Arc<dyn PostStore>,
}

impl DenormalizationSync {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    pub async fn on_identity_changed(&self, snapshot: &UserSnapshot) -> DomainResult<()> {
        self.rewrite_authored_posts(snapshot).await?;
        self.rewrite_mentions(snapshot).await?;
        Ok(())
    }

    async fn rewrite_authored_posts(&self, snapshot: &UserSnapshot) -> DomainResult<()> {
        let mut authored = self
            .posts
            .search(&overview_search(posts_by_poster_query(&snapshot.id), None))
            .await?;
        if authored.is_empty() {
            return Ok(());
        }
        for post in &mut authored {
            post.poster = snapshot.clone();
        }
        self.posts.save_all(&authored).await
    }

    async fn rewrite_mentions(&self, snapshot: &UserSnapshot) -> DomainResult<()> {
        let mut mentioned = self
            .posts
            .search(&overview_search(mentions_query(&snapshot.id), None))
            .await?;
        if mentioned.is_empty() {
            return Ok(());
        }
        for post in &mut mentioned {
            Self::rewrite_user_tag(snapshot, post);
            Self::rewrite_comments(snapshot, post);
        }
        self.posts.save_all(&mentioned).await
    }

    // snapshot equality is id-based, so remove-then-insert replaces the
    // stale entry in place
    fn rewrite_user_tag(snapshot: &UserSnapshot, post: &mut Post) {
        if post.user_tags.contains(snapshot) {
            post.user_tags.remove(snapshot);
            post.user_tags.insert(snapshot.clone());
        }
    }

    fn rewrite_comments(snapshot: &UserSnapshot, post: &mut Post) {
        for comment in &mut post.comments {
            if comment.commenter.id == snapshot.id {
                comment.commenter = snapshot.clone();
            }
        }
    }
}

/// Entry point for the event intake loop: applies each accepted event to
/// the mirrored user set and, for profile changes to a known user, kicks
/// off snapshot propagation.
pub struct IdentityEventHandler {
    users: Arc<UserService>,
    sync: Arc<DenormalizationSync>,
}

impl IdentityEventHandler {
    pub fn new(users: Arc<UserService>, sync: Arc<DenormalizationSync>) -> Self {
        Self { users, sync }
    }

    pub async fn handle(&self, event: IdentityEvent) -> DomainResult<()> {
        match event {
            IdentityEvent::UserChanged {
                id,
                username,
                avatar_url,
                public_account,
            } => {
                self.on_user_changed(id, username, avatar_url, public_account)
                    .await
            }
            IdentityEvent::FollowChanged {
                follower_id,
                target_id,
                applied,
            } => {
                if applied {
                    self.users.follow(&follower_id, &target_id).await
                } else {
                    self.users.unfollow(&follower_id, &target_id).await
                }
            }
            IdentityEvent::MuteChanged {
                muter_id,
                target_id,
                applied,
            } => {
                if applied {
                    self.users.mute(&muter_id, &target_id).await
                } else {
                    self.users.unmute(&muter_id, &target_id).await
                }
            }
            IdentityEvent::BlockChanged {
                blocker_id,
                target_id,
                applied,
            } => {
                if applied {
                    self.users.block(&blocker_id, &target_id).await
                } else {
                    self.users.unblock(&blocker_id, &target_id).await
                }
            }
        }
    }

    /// A first sighting creates the mirrored user with empty relation
    /// sets; an update rewrites the profile fields and propagates the
    /// new snapshot into the post index.
    async fn on_user_changed(
        &self,
        id: String,
        username: String,
        avatar_url: String,
        public_account: bool,
    ) -> DomainResult<()> {
        match self.users.find(&id).await {
            Ok(mut user) => {
                user.username = username;
                user.avatar_url = avatar_url;
                user.public_account = public_account;
                let saved = self.users.save(&user).await?;
                self.sync.on_identity_changed(&UserSnapshot::of(&saved)).await
            }
            Err(DomainError::NotFound) => {
                let user = User::new(id, username, avatar_url, public_account);
                self.users.save(&user).await?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::identity::Viewer;
    use crate::posts::Comment;
    use crate::testing::{MemoryPosts, MemoryUsers};
    use crate::util::now_ms;

    fn post_by(id: &str, poster: UserSnapshot) -> Post {
        Post::new(
            id,
            "images/x.png",
            "a post",
            poster,
            now_ms(),
            HashSet::new(),
            HashSet::new(),
        )
    }

    fn handler(
        users: Arc<MemoryUsers>,
        posts: Arc<MemoryPosts>,
    ) -> IdentityEventHandler {
        IdentityEventHandler::new(
            Arc::new(UserService::new(users)),
            Arc::new(DenormalizationSync::new(posts)),
        )
    }

    fn renamed(id: &str) -> IdentityEvent {
        IdentityEvent::UserChanged {
            id: id.to_string(),
            username: "renamed".to_string(),
            avatar_url: "avatars/new.png".to_string(),
            public_account: true,
        }
    }

    #[tokio::test]
    async fn profile_change_rewrites_every_embedded_snapshot() {
        let users = Arc::new(MemoryUsers::new());
        users.insert(User::new("user-1", "old", "avatars/old.png", true)).await;
        users.insert(User::new("user-2", "two", "", true)).await;

        let posts = Arc::new(MemoryPosts::new());
        let stale = UserSnapshot::new("user-1", "old", "avatars/old.png");
        posts.insert(post_by("authored", stale.clone())).await;

        let mut tagged = post_by("tagged", UserSnapshot::new("user-2", "two", ""));
        tagged.user_tags.insert(stale.clone());
        posts.insert(tagged).await;

        let mut commented = post_by("commented", UserSnapshot::new("user-2", "two", ""));
        commented.comments.push(Comment {
            id: "comment-1".to_string(),
            commenter: stale.clone(),
            commented_at_ms: 1_000,
            body: "hi".to_string(),
        });
        commented.comments.push(Comment {
            id: "comment-2".to_string(),
            commenter: UserSnapshot::new("user-2", "two", ""),
            commented_at_ms: 2_000,
            body: "yo".to_string(),
        });
        posts.insert(commented).await;

        handler(users, posts.clone())
            .handle(renamed("user-1"))
            .await
            .unwrap();

        let authored = posts.get_unchecked("authored").await;
        assert_eq!(authored.poster.username, "renamed");

        let tagged = posts.get_unchecked("tagged").await;
        let tag = tagged.user_tags.iter().next().unwrap();
        assert_eq!(tag.username, "renamed");
        assert_eq!(tag.avatar_url, "avatars/new.png");

        let commented = posts.get_unchecked("commented").await;
        assert_eq!(commented.comments[0].commenter.username, "renamed");
        assert_eq!(commented.comments[1].commenter.username, "two");
    }

    #[tokio::test]
    async fn reapplying_the_same_change_converges_to_the_same_state() {
        let users = Arc::new(MemoryUsers::new());
        users.insert(User::new("user-1", "old", "", true)).await;
        let posts = Arc::new(MemoryPosts::new());
        posts
            .insert(post_by("authored", UserSnapshot::new("user-1", "old", "")))
            .await;

        let handler = handler(users, posts.clone());
        handler.handle(renamed("user-1")).await.unwrap();
        let once = posts.get_unchecked("authored").await;
        handler.handle(renamed("user-1")).await.unwrap();
        let twice = posts.get_unchecked("authored").await;

        assert_eq!(once.poster.username, twice.poster.username);
        assert_eq!(once.poster.avatar_url, twice.poster.avatar_url);
    }

    #[tokio::test]
    async fn first_sighting_creates_the_user_with_empty_relations() {
        let users = Arc::new(MemoryUsers::new());
        let posts = Arc::new(MemoryPosts::new());
        let handler = handler(users.clone(), posts);

        handler.handle(renamed("user-9")).await.unwrap();

        let service = UserService::new(users);
        let user = service.find("user-9").await.unwrap();
        assert_eq!(user.username, "renamed");
        assert!(user.following.is_empty());
        assert!(user.blocked.is_empty());
    }

    #[tokio::test]
    async fn relation_events_feed_the_visibility_resolver() {
        let users = Arc::new(MemoryUsers::new());
        users.insert(User::new("viewer", "viewer", "", false)).await;
        users.insert(User::new("user-1", "one", "", false)).await;
        let posts = Arc::new(MemoryPosts::new());
        let handler = handler(users.clone(), posts);

        handler
            .handle(IdentityEvent::FollowChanged {
                follower_id: "viewer".to_string(),
                target_id: "user-1".to_string(),
                applied: true,
            })
            .await
            .unwrap();

        let resolver = crate::visibility::VisibilityResolver::new(users);
        assert!(resolver
            .is_visible("user-1", &Viewer::user("viewer"))
            .await
            .unwrap());
    }

    #[test]
    fn events_round_trip_through_their_wire_shape() {
        let event = IdentityEvent::BlockChanged {
            blocker_id: "user-1".to_string(),
            target_id: "user-2".to_string(),
            applied: false,
        };
        let encoded = serde_json::to_string(&event).unwrap();
        assert!(encoded.contains("\"kind\":\"block_changed\""));
        let decoded: IdentityEvent = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, event);
    }
}

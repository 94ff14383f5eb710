use std::collections::HashSet;
use std::sync::Arc;

use lensa_domain::feed::FeedAggregator;
use lensa_domain::identity::{User, UserSnapshot, Viewer};
use lensa_domain::posts::{Post, PostService};
use lensa_domain::query::PageRequest;
use lensa_domain::visibility::VisibilityResolver;
use lensa_infra::repositories::{InMemoryPostStore, InMemoryUserRepository};

use lensa_domain::DomainResult;
use lensa_domain::ports::BoxFuture;
use lensa_domain::ports::events::TagActivityPublisher;
use lensa_domain::ports::posts::PostStore;
use lensa_domain::ports::users::UserRepository;

struct NullPublisher;

impl TagActivityPublisher for NullPublisher {
    fn publish(&self, _poster_id: &str, _tags: &[String]) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

fn post(id: &str, poster_id: &str, tags: &[&str], posted_at_ms: i64) -> Post {
    Post::new(
        id,
        "images/x.png",
        "a post",
        UserSnapshot::new(poster_id, poster_id, ""),
        posted_at_ms,
        tags.iter().map(|tag| tag.to_string()).collect(),
        HashSet::new(),
    )
}

// Viewer follows private poster A and has no relation to public poster
// B. The feed only walks the follow set, so it returns A's post; tag
// search only consults visibility, so it returns B's.
#[tokio::test]
async fn feed_follows_the_follow_set_and_tag_search_follows_visibility() {
    let users = Arc::new(InMemoryUserRepository::new());
    let posts = Arc::new(InMemoryPostStore::new());

    let mut viewer = User::new("viewer", "viewer", "", false);
    viewer.following.insert("poster-a".to_string());
    for user in [
        viewer,
        User::new("poster-a", "a", "", false),
        User::new("poster-b", "b", "", true),
    ] {
        users.save(&user).await.unwrap();
    }
    posts.save(&post("post-a", "poster-a", &[], 1_000)).await.unwrap();
    posts
        .save(&post("post-b", "poster-b", &["x"], 2_000))
        .await
        .unwrap();

    let visibility = Arc::new(VisibilityResolver::new(users.clone()));
    let feed = FeedAggregator::new(users.clone(), posts.clone());
    let service = PostService::new(
        users.clone(),
        posts.clone(),
        visibility,
        Arc::new(NullPublisher),
    );

    let viewer = Viewer::user("viewer");

    let feed_posts = feed.get_feed(&viewer).await.unwrap();
    let feed_ids: Vec<&str> = feed_posts.iter().map(|post| post.id.as_str()).collect();
    assert_eq!(feed_ids, vec!["post-a"]);

    let tag_hits = service
        .posts_by_tags(&viewer, &["x".to_string()], PageRequest::default())
        .await
        .unwrap();
    let tag_ids: Vec<&str> = tag_hits.iter().map(|post| post.id.as_str()).collect();
    assert_eq!(tag_ids, vec!["post-b"]);
}

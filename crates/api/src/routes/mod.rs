use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use lensa_domain::comments::CommentAppender;
use lensa_domain::error::DomainError;
use lensa_domain::feed::FeedAggregator;
use lensa_domain::posts::{NewPost, PostDetail, PostOverview, PostService};
use lensa_domain::query::PageRequest;
use lensa_domain::reactions::ReactionStateMachine;

use crate::middleware::AuthContext;
use crate::{error::ApiError, middleware as app_middleware, state::AppState, validation};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/posts", post(create_post))
        .route("/v1/posts/feed", get(get_feed))
        .route("/v1/posts/:post_id/comments", post(comment_on_post))
        .route(
            "/v1/posts/:post_id/likes",
            post(like_post).delete(remove_like),
        )
        .route(
            "/v1/posts/:post_id/dislikes",
            post(dislike_post).delete(remove_dislike),
        )
        .route(
            "/v1/posts/:post_id/favorites",
            post(favorite_post).delete(unfavorite_post),
        )
        .route_layer(middleware::from_fn(app_middleware::require_auth_middleware));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/v1/posts/tags", get(search_posts_by_tags))
        .route("/v1/posts/poster/:poster_id", get(search_posts_by_poster))
        .route("/v1/posts/:post_id", get(get_post))
        .merge(protected)
        .layer(app_middleware::timeout_layer(
            state.config.request_timeout_secs,
        ))
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer(
            state.config.rate_limit_per_second,
            state.config.rate_limit_burst,
        ));
    }

    app.with_state(state)
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(
        state.users.clone(),
        state.posts.clone(),
        state.visibility(),
        state.tag_activity.clone(),
    )
}

fn reactions(state: &AppState) -> ReactionStateMachine {
    ReactionStateMachine::new(state.posts.clone(), state.visibility())
}

fn map_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation(message) => ApiError::Validation(message),
        DomainError::NotFound => ApiError::NotFound,
        DomainError::Conflict => ApiError::Conflict,
        DomainError::Forbidden(_) => ApiError::Forbidden,
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

#[derive(Debug, Deserialize, Validate)]
struct CreatePostRequest {
    #[validate(length(min = 1, max = 128))]
    id: String,
    #[validate(length(min = 1, max = 512))]
    image_url: String,
    #[validate(length(max = 2048))]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    user_tags: Vec<String>,
}

async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Response, ApiError> {
    validation::validate(&payload)?;
    let input = NewPost {
        id: payload.id,
        image_url: payload.image_url,
        description: payload.description,
        tags: payload.tags.into_iter().collect(),
        user_tag_usernames: payload.user_tags,
    };
    let created = post_service(&state)
        .create(&auth.viewer(), input)
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(PostDetail::from(&created))).into_response())
}

async fn get_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<Json<PostDetail>, ApiError> {
    let post = post_service(&state)
        .get(&auth.viewer(), &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(PostDetail::from(&post)))
}

async fn get_feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<PostOverview>>, ApiError> {
    let feed = FeedAggregator::new(state.users.clone(), state.posts.clone());
    let posts = feed
        .get_feed(&auth.viewer())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(posts.iter().map(PostOverview::from).collect()))
}

#[derive(Debug, Deserialize)]
struct TagSearchQuery {
    tags: String,
    page: Option<usize>,
    size: Option<usize>,
}

async fn search_posts_by_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TagSearchQuery>,
) -> Result<Json<Vec<PostOverview>>, ApiError> {
    let tags: Vec<String> = query
        .tags
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    let page = PageRequest::new(query.page.unwrap_or(0), query.size.unwrap_or(20));
    let hits = post_service(&state)
        .posts_by_tags(&auth.viewer(), &tags, page)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(hits.iter().map(PostOverview::from).collect()))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
    size: Option<usize>,
}

async fn search_posts_by_poster(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(poster_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<PostOverview>>, ApiError> {
    let page = PageRequest::new(query.page.unwrap_or(0), query.size.unwrap_or(20));
    let hits = post_service(&state)
        .posts_by_poster(&auth.viewer(), &poster_id, page)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(hits.iter().map(PostOverview::from).collect()))
}

#[derive(Debug, Deserialize, Validate)]
struct CommentRequest {
    #[validate(length(min = 1, max = 128))]
    comment_id: String,
    #[validate(length(min = 1, max = 1024))]
    body: String,
}

async fn comment_on_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<StatusCode, ApiError> {
    validation::validate(&payload)?;
    let appender = CommentAppender::new(
        state.users.clone(),
        state.posts.clone(),
        state.visibility(),
    );
    appender
        .add_comment(&auth.viewer(), &post_id, &payload.comment_id, &payload.body)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::CREATED)
}

async fn like_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    reactions(&state)
        .like(&auth.viewer(), &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    reactions(&state)
        .remove_like(&auth.viewer(), &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn dislike_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    reactions(&state)
        .dislike(&auth.viewer(), &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_dislike(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    reactions(&state)
        .remove_dislike(&auth.viewer(), &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn favorite_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    reactions(&state)
        .favorite(&auth.viewer(), &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unfavorite_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    reactions(&state)
        .unfavorite(&auth.viewer(), &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

use std::sync::Arc;

use anyhow::bail;

use lensa_domain::ports::events::TagActivityPublisher;
use lensa_domain::ports::posts::PostStore;
use lensa_domain::ports::users::UserRepository;
use lensa_domain::visibility::VisibilityResolver;
use lensa_infra::config::AppConfig;
use lensa_infra::events::RedisTagActivityPublisher;
use lensa_infra::repositories::{InMemoryPostStore, InMemoryUserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostStore>,
    pub tag_activity: Arc<dyn TagActivityPublisher>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        if !config.data_backend.eq_ignore_ascii_case("memory") {
            bail!("unsupported data backend: {}", config.data_backend);
        }
        let tag_activity = RedisTagActivityPublisher::connect_with_key(
            &config.redis_url,
            config.tag_activity_key.clone(),
        )
        .await?;
        Ok(Self {
            config,
            users: Arc::new(InMemoryUserRepository::new()),
            posts: Arc::new(InMemoryPostStore::new()),
            tag_activity: Arc::new(tag_activity),
        })
    }

    #[allow(dead_code)]
    pub fn with_stores(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostStore>,
        tag_activity: Arc<dyn TagActivityPublisher>,
    ) -> Self {
        Self {
            config,
            users,
            posts,
            tag_activity,
        }
    }

    pub fn visibility(&self) -> Arc<VisibilityResolver> {
        Arc::new(VisibilityResolver::new(self.users.clone()))
    }
}

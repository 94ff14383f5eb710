use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use tracing::{info, warn};

use lensa_domain::ports::events::IdentityEventQueue;
use lensa_domain::sync::{DenormalizationSync, IdentityEventHandler};
use lensa_domain::users::UserService;
use lensa_infra::config::AppConfig;
use lensa_infra::events::RedisIdentityEventQueue;
use lensa_infra::logging::init_tracing;
use lensa_infra::repositories::{InMemoryPostStore, InMemoryUserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config)?;

    if !config.data_backend.eq_ignore_ascii_case("memory") {
        bail!("unsupported data backend: {}", config.data_backend);
    }

    let queue = RedisIdentityEventQueue::connect_with_key(
        &config.redis_url,
        config.identity_events_key.clone(),
    )
    .await?;
    let users = Arc::new(InMemoryUserRepository::new());
    let posts = Arc::new(InMemoryPostStore::new());
    let handler = IdentityEventHandler::new(
        Arc::new(UserService::new(users)),
        Arc::new(DenormalizationSync::new(posts)),
    );

    info!("worker starting");
    let poll_timeout = Duration::from_secs(config.worker_poll_timeout_secs.max(1));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            dequeued = queue.dequeue(poll_timeout) => match dequeued {
                Ok(Some(event)) => {
                    if let Err(err) = handler.handle(event).await {
                        warn!(error = %err, "identity event rejected");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "event dequeue failed");
                    tokio::time::sleep(poll_timeout).await;
                }
            },
        }
    }

    info!("worker shutdown");
    Ok(())
}

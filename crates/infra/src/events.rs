use std::time::Duration;

use redis::aio::ConnectionManager;
use tracing::warn;

use lensa_domain::DomainResult;
use lensa_domain::error::DomainError;
use lensa_domain::ports::BoxFuture;
use lensa_domain::ports::events::{EventQueueError, IdentityEventQueue, TagActivityPublisher};
use lensa_domain::sync::IdentityEvent;

const DEFAULT_EVENTS_KEY: &str = "lensa:identity-events";
const DEFAULT_ACTIVITY_KEY: &str = "lensa:tag-activity";

/// Identity-change intake over a redis list: producers RPUSH JSON
/// envelopes, the worker BLPOPs them off.
#[derive(Clone)]
pub struct RedisIdentityEventQueue {
    manager: ConnectionManager,
    events_key: String,
}

impl RedisIdentityEventQueue {
    pub async fn connect(redis_url: &str) -> Result<Self, EventQueueError> {
        Self::connect_with_key(redis_url, DEFAULT_EVENTS_KEY).await
    }

    pub async fn connect_with_key(
        redis_url: &str,
        events_key: impl Into<String>,
    ) -> Result<Self, EventQueueError> {
        let client = redis::Client::open(redis_url)
            .map_err(|err| EventQueueError::Unavailable(err.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| EventQueueError::Unavailable(err.to_string()))?;
        Ok(Self {
            manager,
            events_key: events_key.into(),
        })
    }

    fn serialize(event: &IdentityEvent) -> Result<String, EventQueueError> {
        serde_json::to_string(event).map_err(|err| EventQueueError::Serialization(err.to_string()))
    }

    fn deserialize(payload: &str) -> Result<IdentityEvent, EventQueueError> {
        serde_json::from_str(payload)
            .map_err(|err| EventQueueError::Serialization(err.to_string()))
    }
}

impl IdentityEventQueue for RedisIdentityEventQueue {
    fn enqueue(&self, event: &IdentityEvent) -> BoxFuture<'_, Result<(), EventQueueError>> {
        let payload = match Self::serialize(event) {
            Ok(payload) => payload,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        let events_key = self.events_key.clone();
        Box::pin(async move {
            let mut conn = self.manager.clone();
            let _: i64 = redis::cmd("RPUSH")
                .arg(&events_key)
                .arg(payload)
                .query_async(&mut conn)
                .await
                .map_err(|err| EventQueueError::Operation(err.to_string()))?;
            Ok(())
        })
    }

    fn dequeue(
        &self,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<Option<IdentityEvent>, EventQueueError>> {
        let events_key = self.events_key.clone();
        let timeout_secs = timeout.as_secs();
        Box::pin(async move {
            let mut conn = self.manager.clone();
            let result: Option<(String, String)> = redis::cmd("BLPOP")
                .arg(&events_key)
                .arg(timeout_secs)
                .query_async(&mut conn)
                .await
                .map_err(|err| EventQueueError::Operation(err.to_string()))?;
            match result {
                Some((_, payload)) => Ok(Some(Self::deserialize(&payload)?)),
                None => Ok(None),
            }
        })
    }
}

/// Outbound interest/history pipeline over a redis list. Failures are
/// logged here; callers treat publishes as fire-and-forget.
#[derive(Clone)]
pub struct RedisTagActivityPublisher {
    manager: ConnectionManager,
    activity_key: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct TagActivityRecord {
    poster_id: String,
    tags: Vec<String>,
}

impl RedisTagActivityPublisher {
    pub async fn connect(redis_url: &str) -> Result<Self, EventQueueError> {
        Self::connect_with_key(redis_url, DEFAULT_ACTIVITY_KEY).await
    }

    pub async fn connect_with_key(
        redis_url: &str,
        activity_key: impl Into<String>,
    ) -> Result<Self, EventQueueError> {
        let client = redis::Client::open(redis_url)
            .map_err(|err| EventQueueError::Unavailable(err.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| EventQueueError::Unavailable(err.to_string()))?;
        Ok(Self {
            manager,
            activity_key: activity_key.into(),
        })
    }
}

impl TagActivityPublisher for RedisTagActivityPublisher {
    fn publish(&self, poster_id: &str, tags: &[String]) -> BoxFuture<'_, DomainResult<()>> {
        let record = TagActivityRecord {
            poster_id: poster_id.to_string(),
            tags: tags.to_vec(),
        };
        let activity_key = self.activity_key.clone();
        Box::pin(async move {
            let payload = serde_json::to_string(&record).map_err(|err| {
                DomainError::Validation(format!("invalid tag activity record: {err}"))
            })?;
            let mut conn = self.manager.clone();
            let result: Result<i64, redis::RedisError> = redis::cmd("RPUSH")
                .arg(&activity_key)
                .arg(payload)
                .query_async(&mut conn)
                .await;
            match result {
                Ok(_) => Ok(()),
                Err(err) => {
                    warn!(poster_id = %record.poster_id, error = %err, "tag activity publish failed");
                    Err(DomainError::Validation(format!(
                        "tag activity publish failed: {err}"
                    )))
                }
            }
        })
    }
}

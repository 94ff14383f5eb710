use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub identity_events_key: String,
    pub tag_activity_key: String,
    pub worker_poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("redis_url", "redis://127.0.0.1:6379")?
            .set_default("jwt_secret", "dev-secret")?
            .set_default("identity_events_key", "lensa:identity-events")?
            .set_default("tag_activity_key", "lensa:tag-activity")?
            .set_default("worker_poll_timeout_secs", 5)?
            .set_default("request_timeout_secs", 30)?
            .set_default("rate_limit_per_second", 10)?
            .set_default("rate_limit_burst", 20)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

use std::sync::Arc;
use transita_core::events::EventSink;
use transita_store::app_config::BusinessRules;
use transita_store::{DbClient, RedisClient};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub redis: Arc<RedisClient>,
    pub events: Arc<dyn EventSink>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub seeds_path: PathBuf,
    pub maintenance_token: Option<String>,
    pub companies_house_api_key: Option<String>,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_api_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub registry_request_timeout_secs: u64,
    pub registry_max_retries: u32,
    pub registry_backoff_base_ms: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub news_request_timeout_secs: u64,
    pub staleness_threshold_days: i64,
    pub maintenance_batch_limit: i64,
    pub maintenance_inter_record_delay_ms: u64,
    pub queue_lease_secs: i64,
    pub queue_max_attempts: i32,
    pub worker_count: usize,
    pub worker_batch_size: i64,
    pub worker_poll_interval_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("seeds_path", &self.seeds_path)
            .field("database_url", &"[redacted]")
            .field(
                "maintenance_token",
                &self.maintenance_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "companies_house_api_key",
                &self.companies_house_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("ai_base_url", &self.ai_base_url)
            .field("ai_model", &self.ai_model)
            .field(
                "ai_api_key",
                &self.ai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "registry_request_timeout_secs",
                &self.registry_request_timeout_secs,
            )
            .field("registry_max_retries", &self.registry_max_retries)
            .field("registry_backoff_base_ms", &self.registry_backoff_base_ms)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("news_request_timeout_secs", &self.news_request_timeout_secs)
            .field("staleness_threshold_days", &self.staleness_threshold_days)
            .field("maintenance_batch_limit", &self.maintenance_batch_limit)
            .field(
                "maintenance_inter_record_delay_ms",
                &self.maintenance_inter_record_delay_ms,
            )
            .field("queue_lease_secs", &self.queue_lease_secs)
            .field("queue_max_attempts", &self.queue_max_attempts)
            .field("worker_count", &self.worker_count)
            .field("worker_batch_size", &self.worker_batch_size)
            .field("worker_poll_interval_secs", &self.worker_poll_interval_secs)
            .finish()
    }
}

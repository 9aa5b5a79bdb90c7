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
    pub seed_path: PathBuf,
    pub harvest_api_key: Option<String>,
    pub reach_api_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub harvest_request_timeout_secs: u64,
    pub harvest_max_retries: u32,
    pub harvest_retry_backoff_base_ms: u64,
    pub scan_max_concurrent_monitors: usize,
    pub monitor_lock_stale_mins: i64,
    pub push_batch_size: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("seed_path", &self.seed_path)
            .field("database_url", &"[redacted]")
            .field(
                "harvest_api_key",
                &self.harvest_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reach_api_key",
                &self.reach_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "harvest_request_timeout_secs",
                &self.harvest_request_timeout_secs,
            )
            .field("harvest_max_retries", &self.harvest_max_retries)
            .field(
                "harvest_retry_backoff_base_ms",
                &self.harvest_retry_backoff_base_ms,
            )
            .field(
                "scan_max_concurrent_monitors",
                &self.scan_max_concurrent_monitors,
            )
            .field("monitor_lock_stale_mins", &self.monitor_lock_stale_mins)
            .field("push_batch_size", &self.push_batch_size)
            .finish()
    }
}

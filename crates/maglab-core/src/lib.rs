use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod monitors;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use monitors::{load_seed_config, MonitorSeed, OwnerSeed, SeedFile};
pub use types::{
    Engagement, IcpFilters, MonitorKind, ProfileSnapshot, Seniority, Sentiment, SignalType,
    SizeRange,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seed config at {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed config: {0}")]
    SeedFileParse(#[from] serde_yaml::Error),

    #[error("seed config validation failed: {0}")]
    Validation(String),
}

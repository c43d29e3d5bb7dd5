pub mod app_config;
pub mod codes;
pub mod config;
pub mod coords;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use codes::{AreaCode, ContentType, SortMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use coords::{classify, convert, normalize, CoordinateFormat, Coordinates};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

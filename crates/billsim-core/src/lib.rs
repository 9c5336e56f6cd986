pub mod app_config;
pub mod config;
pub mod glossary;
pub mod identifier;

pub use app_config::{AppConfig, Environment, PathLayout, ScoreMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use glossary::{describe_stage, BILL_TYPES};
pub use identifier::{parse_billnumber_version, BillnumberVersionParts};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("validation error: {0}")]
    Validation(String),
}

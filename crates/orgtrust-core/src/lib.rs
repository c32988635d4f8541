pub mod app_config;
pub mod config;
pub mod domain;
pub mod quality;
pub mod seeds;
pub mod trust;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{
    CompanyStatus, NewsSignal, RegistryAddress, RegistryRecord, VerificationStatus,
};
pub use quality::{AnalysisStatus, QualityAnalysis, AI_UNAVAILABLE_FLAG};
pub use seeds::{load_seeds, SeedEntry, SeedsFile};
pub use trust::{compute_trust_score, TrustScore, TrustScoreBreakdown};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seeds file {path}: {source}")]
    SeedsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seeds file: {0}")]
    SeedsFileParse(#[from] serde_yaml::Error),

    #[error("seeds validation failed: {0}")]
    Validation(String),
}

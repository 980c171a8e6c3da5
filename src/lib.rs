//! Page Inspector: single-page structure and link analysis
//!
//! This crate fetches one web page, extracts its structural metadata (title,
//! HTML version, heading distribution), classifies and validates the links it
//! contains, detects login forms, and reports the outcome through a pollable
//! job lifecycle.

pub mod analyzer;
pub mod config;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Page Inspector operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("target unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("target returned HTTP {code}")]
    HttpStatus { url: String, code: u16 },

    #[error("target is not parseable HTML: {message}")]
    Parse { url: String, message: String },

    #[error("cancelled by request")]
    Cancelled,

    #[error("invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("job {job_id} already has an active run")]
    AlreadyRunning { job_id: String },

    #[error("invalid job status transition: {from} -> {to}")]
    InvalidTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Page Inspector operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use analyzer::{Engine, PageReport, RunHandle};
pub use config::Config;
pub use state::{AnalysisJob, JobStatus};

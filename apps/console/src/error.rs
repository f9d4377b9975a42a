//! # Console Error Type
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Console                            │
//! │                                                                         │
//! │  config load ─── io / toml / invalid value ──┐                          │
//! │                                              │                          │
//! │  scenario ────── CoreError ──────────────────┼──► AppError ──► main    │
//! │                                              │        │                 │
//! │  narrate ─────── serde_json ─────────────────┘        ▼                 │
//! │                                              "[INVALID_STATE] ..."      │
//! │                                              exit code 1                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bistro_core::{CoreError, ErrorCategory};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for console operations.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A config value is out of range or unparseable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Runtime Errors
    // =========================================================================
    /// A domain command failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Journal rendering failed.
    #[error("Failed to render events: {0}")]
    Render(#[from] serde_json::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::ConfigSaveFailed(err.to_string())
    }
}

/// Machine-readable error code printed alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    InvalidState,
    NotFound,
    Cycle,
    DuplicateKey,
    ConfigError,
    Internal,
}

impl From<ErrorCategory> for ErrorCode {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::InvalidArgument => ErrorCode::InvalidArgument,
            ErrorCategory::InvalidState => ErrorCode::InvalidState,
            ErrorCategory::NotFound => ErrorCode::NotFound,
            ErrorCategory::Cycle => ErrorCode::Cycle,
            ErrorCategory::DuplicateKey => ErrorCode::DuplicateKey,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Cycle => "CYCLE",
            ErrorCode::DuplicateKey => "DUPLICATE_KEY",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(code)
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Core(err) => err.category().into(),
            AppError::InvalidConfig(_)
            | AppError::ConfigLoadFailed(_)
            | AppError::ConfigSaveFailed(_) => ErrorCode::ConfigError,
            AppError::Render(_) => ErrorCode::Internal,
        }
    }
}

//! Centralized error types and handling

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Scheduled task error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Session (login/logout) errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unable to connect to host {host} with supplied credentials for user {user}")]
    AuthenticationFailed { host: String, user: String },

    #[error("Failed to connect to {host}:{port}: {reason}")]
    ConnectionFailed {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Failed to close session: {0}")]
    DisconnectFailed(String),
}

/// Inventory lookup errors
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("VM not found: {name}")]
    VmNotFound { name: String },

    #[error("Inventory unavailable: {0}")]
    Unavailable(String),
}

/// Scheduled task errors
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Unrecognized date format '{input}': expected d/m/Y H:M ({reason})")]
    InvalidDate { input: String, reason: String },

    #[error("Scheduled task not found: {key}")]
    TaskNotFound { key: String },

    #[error("Scheduled task rejected: {0}")]
    Rejected(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("Missing required configuration: {field}")]
    MissingRequired { field: String },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

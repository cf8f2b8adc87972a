//! Error types for E2E testing

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Invalid base URI '{uri}': {reason}")]
    InvalidBaseUri { uri: String, reason: String },

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    #[error("Failed to issue nonce for user '{username}': {reason}")]
    Nonce { username: String, reason: String },

    #[error("Timeout waiting for {what} after {timeout:?}")]
    Timeout { what: String, timeout: Duration },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Attribute {name} has unexpected value '{value}'")]
    InvalidAttribute { name: String, value: String },

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("WebDriver session error: {0}")]
    NewSession(#[from] fantoccini::error::NewSessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        E2eError::Timeout {
            what: what.into(),
            timeout,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, E2eError::Timeout { .. })
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

//! Defines the custom error types for the resume-contacts application.

use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for everything around the extraction pipeline.
///
/// The pipeline itself never surfaces these to its caller; they appear at the
/// configuration, file and network boundaries and are degraded there.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The language model provider answered with a non-success status.
    #[error("Model API Error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The message returned by the provider.
        message: String,
    },

    /// The language model returned no text content.
    #[error("Model returned empty content")]
    EmptyResponse,

    /// Error related to concurrency or task execution.
    #[error("Task Execution Error: {0}")]
    Task(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;

//! Error types and utilities for dlgraph

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dlgraph operations
pub type Result<T> = std::result::Result<T, DlGraphError>;

/// Main error type for dlgraph operations
#[derive(Error, Debug)]
pub enum DlGraphError {
    /// A statistics endpoint answered with a non-success status
    #[error("Fetch error: {url} returned HTTP {status}: {body}")]
    Fetch {
        url: String,
        status: u16,
        /// Response body, kept as diagnostic context
        body: String,
    },

    /// Malformed timestamp, version string, asset file name or document shape
    #[error("Format error: {message}")]
    Format { message: String },

    /// No local snapshot matches the expected file pattern
    #[error("No snapshot for '{subject}' found in {}", .dir.display())]
    NoSnapshot { subject: String, dir: PathBuf },

    /// Snapshots exist but none of them is older than the current one
    #[error("Not enough snapshot history for '{subject}': found {found} snapshot(s)")]
    InsufficientHistory { subject: String, found: usize },

    /// A provided input file does not exist
    #[error("Provided file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    /// A snapshot with the same timestamp was already written
    #[error("Snapshot already exists: {}", .0.display())]
    SnapshotExists(PathBuf),

    /// A version whose platforms sum to zero cannot be normalized to percentages
    #[error("Cannot normalize version {version}: total downloads is zero")]
    ZeroTotal { version: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for configuration values or input data
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Transport level network errors (connect, timeout, body read)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Graph generation and plotting errors
    #[error("Graph error: {message}")]
    Graph {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV snapshot reading or writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DlGraphError {
    /// Create a new fetch error for a non-success response
    pub fn fetch(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format {
            message: msg.into(),
        }
    }

    /// Create a new missing snapshot error
    pub fn no_snapshot(subject: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::NoSnapshot {
            subject: subject.into(),
            dir: dir.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new graph error
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new graph error with source
    pub fn graph_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Graph {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error only means "no local data to work with".
    ///
    /// Such errors abort a single view with a diagnostic; they do not fail the run.
    pub fn is_missing_snapshot(&self) -> bool {
        matches!(
            self,
            Self::NoSnapshot { .. } | Self::InsufficientHistory { .. }
        )
    }
}

/// Convert from reqwest::Error to DlGraphError
impl From<reqwest::Error> for DlGraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_decode() {
            Self::network_with_source("Failed to decode response body", err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to DlGraphError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for DlGraphError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::graph_with_source("Graph rendering failed", err)
    }
}

//! Unified error type hierarchy for rtkernel
//!
//! Provides structured error handling with VersionError, CatalogError, LinkError,
//! PatchError, ConfigError, and the AppError umbrella used by the orchestrator and CLI.

use std::io;
use thiserror::Error;

use crate::kernel::version::VersionKind;

/// A version identifier violated the grammar of its kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed {kind} version: '{input}'")]
    Malformed { kind: VersionKind, input: String },
}

impl VersionError {
    pub fn malformed(kind: VersionKind, input: impl Into<String>) -> Self {
        VersionError::Malformed {
            kind,
            input: input.into(),
        }
    }
}

/// Remote listing retrieval and extraction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Transport failure or non-success status. May be transient.
    #[error("Source unavailable at {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    /// The listing was fetched but nothing matched the extraction grammar.
    #[error("No candidates found at {url}")]
    NoCandidates { url: String },
}

/// Download link construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Link construction failed for '{url}': {reason}")]
    Construction { url: String, reason: String },
}

/// Build configuration edit errors.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Key not found in configuration: {key}")]
    KeyNotFound { key: String },

    #[error("Key '{key}' has multiple active definitions (lines {lines:?})")]
    AmbiguousKey { key: String, lines: Vec<usize> },

    #[error("IO error during config patching: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to persist patched configuration: {0}")]
    Persist(String),
}

/// Settings file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Global error type for the resolve / link / patch flow
///
/// Selection cancellation is deliberately absent: it travels as
/// [`crate::models::Selection::Cancelled`], not as a failure.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Settings(#[from] ConfigError),

    /// The selector returned an id that was never offered
    #[error("Selector returned unknown candidate '{0}'")]
    InvalidSelection(String),

    /// The terminal could not be read from or written to while prompting
    #[error("Selection prompt failed: {0}")]
    Prompt(#[source] io::Error),
}

impl AppError {
    /// Get a user-facing error message suitable for terminal output
    pub fn user_message(&self) -> String {
        match self {
            AppError::Catalog(CatalogError::SourceUnavailable { url, reason }) => {
                format!("Could not reach {} ({}). Check the network and retry.", url, reason)
            }
            AppError::Catalog(CatalogError::NoCandidates { url }) => {
                format!("No compatible releases are listed at {}", url)
            }
            AppError::Version(e) => {
                format!("Unexpected version format: {}", e)
            }
            AppError::Link(e) => format!("Refusing to download: {}", e),
            AppError::Patch(PatchError::KeyNotFound { key }) => {
                format!("Setting {} is not present in the configuration file", key)
            }
            AppError::Patch(PatchError::AmbiguousKey { key, lines }) => format!(
                "Setting {} is defined more than once (lines {:?}); file left untouched",
                key, lines
            ),
            AppError::Patch(e) => format!("Configuration file was not changed: {}", e),
            AppError::Settings(e) => format!("Settings error: {}", e),
            AppError::InvalidSelection(id) => format!("Invalid selection: {}", id),
            AppError::Prompt(e) => format!("Could not read the selection from the terminal: {}", e),
        }
    }
}

/// Top-level result type for the library surface.
pub type Result<T> = std::result::Result<T, AppError>;

//! rtkernel Rust Backend
//!
//! Resolves which PREEMPT_RT patch and base kernel release belong together, builds
//! the exact download links for both, and applies small idempotent edits to a
//! kernel build configuration before compilation.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Candidate sets, selections and download links
//! - **kernel**: Version grammars, remote catalog, link builder, config patcher
//! - **system**: OS abstraction (running kernel release)
//! - **config**: Persisted settings
//! - **ui**: Selector contract and terminal / scripted selectors
//! - **orchestrator**: Resolve flow coordination
//! - **log_collector**: Session log file behind the `log` facade

// Core foundational modules
pub mod error;
pub mod models;

// Version resolution, links and config patching
pub mod kernel;

// OS abstraction
pub mod system;

// Settings management
pub mod config;

// Selection contract
pub mod ui;

// Session logging
pub mod log_collector;

// Resolve flow coordination
pub mod orchestrator;

// Re-export the log crate for macro usage
pub use log;

pub use log_collector::{LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{
    AppError, CatalogError, ConfigError, LinkError, PatchError, Result, VersionError,
};

pub use models::{ArtifactKind, CandidateSet, Choice, DownloadLink, LinkSet, Selection};

pub use kernel::version::{
    kernel_from_patch, major_tag_from_minor, minor_from_kernel, trim_trailing_segment,
};
pub use kernel::{FullKernel, FullPatch, MajorTag, MinorKernel, VersionIdentifier, VersionKind};

pub use config::Settings;
pub use orchestrator::{CandidateQuery, Candidates, ResolveOrchestrator, ResolvedRelease};
pub use ui::{ScriptedSelector, Selector, TerminalSelector};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

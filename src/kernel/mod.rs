//! Kernel Release Resolution Module
//!
//! Everything that turns remote listings into a concrete, downloadable RT kernel:
//! - Version grammars and derivations between granularities
//! - Remote catalog listing and extraction
//! - Mirror link construction
//! - Build configuration patching

pub mod version;

pub mod catalog;

pub mod sources;

pub mod patcher;

pub use catalog::{HttpFetcher, TextFetcher, VersionCatalog};
pub use patcher::{apply_config_edit, apply_config_edits, ConfigDocument, ConfigEdit, EditOp};
pub use sources::{check_link, extract_filename, LinkBuilder};
pub use version::{FullKernel, FullPatch, MajorTag, MinorKernel, VersionIdentifier, VersionKind};

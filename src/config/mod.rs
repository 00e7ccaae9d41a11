//! Configuration module for the resolver.
//!
//! Holds the persisted [`Settings`]: mirror bases, the Debian release and
//! architecture used for package lookups, and fetch / logging knobs. Settings live in
//! `~/.config/rtkernel/settings.json`; a missing file means defaults, a present but
//! invalid one is an error.
//!
//! # Module Structure
//!
//! - `loader`: path resolution, JSON load / save, path validation

pub mod loader;

use std::time::Duration;

use crate::error::ConfigError;
use crate::kernel::sources::{
    check_link, path_token, LinkBuilder, DEFAULT_DEBIAN_PACKAGES, DEFAULT_KERNEL_MIRROR,
    DEFAULT_RT_MIRROR,
};

pub use loader::{
    get_global_settings_path, load_config_from_file, load_or_default, save_config_to_file,
};

/// Persisted resolver settings
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    // Mirrors
    pub kernel_mirror: String,
    pub rt_mirror: String,
    pub debian_packages_mirror: String,

    // Debian lookups
    pub debian_codename: String,
    pub arch: String,

    /// Per-request timeout for listing fetches
    pub fetch_timeout_secs: u64,

    // Debug Settings
    pub debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            kernel_mirror: DEFAULT_KERNEL_MIRROR.to_string(),
            rt_mirror: DEFAULT_RT_MIRROR.to_string(),
            debian_packages_mirror: DEFAULT_DEBIAN_PACKAGES.to_string(),
            debian_codename: "trixie".to_string(),
            arch: "amd64".to_string(),
            fetch_timeout_secs: 30,
            debug_logging: false,
        }
    }
}

impl Settings {
    /// Reject values that could never produce a valid link
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, mirror) in [
            ("kernel_mirror", &self.kernel_mirror),
            ("rt_mirror", &self.rt_mirror),
            ("debian_packages_mirror", &self.debian_packages_mirror),
        ] {
            check_link(mirror, None)
                .map_err(|e| ConfigError::ValidationFailed(format!("{}: {}", name, e)))?;
        }

        path_token(&self.debian_codename, "codename")
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;
        path_token(&self.arch, "architecture")
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn link_builder(&self) -> LinkBuilder {
        LinkBuilder::new(
            &self.kernel_mirror,
            &self.rt_mirror,
            &self.debian_packages_mirror,
        )
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug_logging {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

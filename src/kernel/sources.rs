//! Mirror URL Management
//!
//! Builds every remote location the resolver reads from or hands to a downloader:
//! kernel.org tarballs and signatures, PREEMPT_RT patches and signatures, the RT
//! project index pages, and the Debian package index / download-mirror pages.
//! Construction is pure string templating over the configured mirror bases; every
//! produced URL is checked before it leaves this module.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::error::LinkError;
use crate::kernel::version::{FullKernel, FullPatch, MajorTag, MinorKernel, VersionIdentifier};
use crate::models::{ArtifactKind, DownloadLink, LinkSet};

/// Default kernel.org mirror for release tarballs
pub const DEFAULT_KERNEL_MIRROR: &str = "https://mirrors.edge.kernel.org/pub/linux/kernel";
/// Default kernel.org mirror for the PREEMPT_RT project
pub const DEFAULT_RT_MIRROR: &str = "https://mirrors.edge.kernel.org/pub/linux/kernel/projects/rt";
/// Default Debian package browser
pub const DEFAULT_DEBIAN_PACKAGES: &str = "https://packages.debian.org";

static PATH_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9.+\-]*$").expect("Invalid path token regex"));

/// Check that `url` is an absolute http(s) URL with a host and, when `expected` is
/// given, that its path ends in that artifact's extension.
pub fn check_link(url: &str, expected: Option<ArtifactKind>) -> Result<Url, LinkError> {
    let fail = |reason: String| LinkError::Construction {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| fail(format!("not an absolute URL ({})", e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(fail(format!("unsupported scheme '{}'", parsed.scheme())));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(fail("missing host".to_string()));
    }

    if let Some(kind) = expected {
        if !parsed.path().ends_with(kind.extension()) {
            return Err(fail(format!(
                "{} must end in '{}'",
                kind,
                kind.extension()
            )));
        }
    }

    Ok(parsed)
}

/// Final path segment of a URL, e.g. the `.deb` file name of a pool link
pub fn extract_filename(url: &str) -> Result<String, LinkError> {
    let parsed = check_link(url, None)?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .ok_or_else(|| LinkError::Construction {
            url: url.to_string(),
            reason: "URL has no file name".to_string(),
        })
}

/// Mirror bases plus the templating rules for each artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    kernel_mirror: String,
    rt_mirror: String,
    debian_packages: String,
}

impl LinkBuilder {
    /// Create a builder over explicit mirror bases (trailing slashes are ignored)
    pub fn new(kernel_mirror: &str, rt_mirror: &str, debian_packages: &str) -> Self {
        LinkBuilder {
            kernel_mirror: kernel_mirror.trim_end_matches('/').to_string(),
            rt_mirror: rt_mirror.trim_end_matches('/').to_string(),
            debian_packages: debian_packages.trim_end_matches('/').to_string(),
        }
    }

    /// Kernel release tarball and its detached signature
    ///
    /// `<kernel_mirror>/v5.x/linux-5.10.78.tar.xz` and `.tar.sign`
    pub fn kernel_links(
        &self,
        major: &MajorTag,
        kernel: &FullKernel,
    ) -> Result<(DownloadLink, DownloadLink), LinkError> {
        let expected = kernel.minor().major_tag();
        if &expected != major {
            return Err(LinkError::Construction {
                url: format!("{}/{}/", self.kernel_mirror, major),
                reason: format!("kernel {} belongs under {}, not {}", kernel, expected, major),
            });
        }

        let stem = format!("{}/{}/linux-{}", self.kernel_mirror, major, kernel);
        let derived: Vec<VersionIdentifier> = vec![major.clone().into(), kernel.clone().into()];

        let tarball = DownloadLink::new(
            &format!("{}.tar.xz", stem),
            ArtifactKind::KernelTarball,
            derived.clone(),
        )?;
        let signature = DownloadLink::new(
            &format!("{}.tar.sign", stem),
            ArtifactKind::KernelSignature,
            derived,
        )?;
        Ok((tarball, signature))
    }

    /// RT patch and its detached signature
    ///
    /// `<rt_mirror>/5.10/older/patch-5.10.78-rt55.patch.xz` and `.patch.sign`.
    /// `older/` carries every revision of a line, including the current one.
    pub fn patch_links(
        &self,
        minor: &MinorKernel,
        patch: &FullPatch,
    ) -> Result<(DownloadLink, DownloadLink), LinkError> {
        if &patch.minor() != minor {
            return Err(LinkError::Construction {
                url: format!("{}/{}/older/", self.rt_mirror, minor),
                reason: format!("patch {} is not part of the {} line", patch, minor),
            });
        }

        let stem = format!("{}/{}/older/patch-{}", self.rt_mirror, minor, patch);
        let derived: Vec<VersionIdentifier> = vec![minor.clone().into(), patch.clone().into()];

        let file = DownloadLink::new(
            &format!("{}.patch.xz", stem),
            ArtifactKind::PatchFile,
            derived.clone(),
        )?;
        let signature = DownloadLink::new(
            &format!("{}.patch.sign", stem),
            ArtifactKind::PatchSignature,
            derived,
        )?;
        Ok((file, signature))
    }

    /// Derive every identifier from the patch and build all four links
    pub fn build_links(&self, patch: &FullPatch) -> Result<LinkSet, LinkError> {
        let kernel = patch.kernel();
        let minor = kernel.minor();
        let major = minor.major_tag();

        let (kernel_link, kernel_signature) = self.kernel_links(&major, &kernel)?;
        let (patch_link, patch_signature) = self.patch_links(&minor, patch)?;

        log::debug!(
            "[Sources] Built links for {} (kernel {}, line {}, {})",
            patch,
            kernel,
            minor,
            major
        );

        Ok(LinkSet {
            kernel: kernel_link,
            kernel_signature,
            patch: patch_link,
            patch_signature,
        })
    }

    /// Index of RT kernel lines, one directory per minor version
    pub fn rt_index_url(&self) -> Result<Url, LinkError> {
        check_link(&format!("{}/", self.rt_mirror), None)
    }

    /// Listing of every patch revision for one minor line
    pub fn rt_patches_index_url(&self, minor: &MinorKernel) -> Result<Url, LinkError> {
        check_link(&format!("{}/{}/older/", self.rt_mirror, minor), None)
    }

    /// Debian kernel section index for a release codename and architecture
    pub fn debian_index_url(&self, codename: &str, arch: &str) -> Result<Url, LinkError> {
        let codename = path_token(codename, "codename")?;
        let arch = path_token(arch, "architecture")?;
        check_link(
            &format!("{}/{}/{}/kernel/", self.debian_packages, codename, arch),
            None,
        )
    }

    /// Per-package page listing the download mirrors for one `.deb`
    pub fn debian_download_page_url(
        &self,
        codename: &str,
        arch: &str,
        package: &str,
    ) -> Result<Url, LinkError> {
        let codename = path_token(codename, "codename")?;
        let arch = path_token(arch, "architecture")?;
        let package = path_token(package, "package")?;
        check_link(
            &format!(
                "{}/{}/{}/{}/download",
                self.debian_packages, codename, arch, package
            ),
            None,
        )
    }
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_KERNEL_MIRROR, DEFAULT_RT_MIRROR, DEFAULT_DEBIAN_PACKAGES)
    }
}

pub(crate) fn path_token<'a>(value: &'a str, what: &str) -> Result<&'a str, LinkError> {
    if PATH_TOKEN_REGEX.is_match(value) {
        Ok(value)
    } else {
        Err(LinkError::Construction {
            url: value.to_string(),
            reason: format!("invalid {} path segment", what),
        })
    }
}

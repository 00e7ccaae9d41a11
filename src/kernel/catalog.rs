//! RT Version Catalog
//!
//! Fetches the remote listings that say which PREEMPT_RT patches and Debian RT
//! kernel packages exist, and extracts candidate versions from them with fixed
//! regex grammars (one per listing layout).
//!
//! Every call re-fetches; nothing is cached. A fetch that fails is reported as
//! `SourceUnavailable`, a fetch that succeeds but matches nothing as `NoCandidates`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::error::{AppError, CatalogError, Result};
use crate::kernel::sources::LinkBuilder;
use crate::kernel::version::{FullKernel, FullPatch, MinorKernel, VersionIdentifier};
use crate::models::{ArtifactKind, CandidateSet, DownloadLink};

/// `href="5.10/"` entries of the RT project index
static MINOR_DIR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="(\d+\.\d+)/""#).expect("Invalid minor dir regex"));
/// `href="patch-5.10.78-rt55.patch.xz"` entries of an `older/` listing
static PATCH_FILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="patch-(\d+\.\d+\.\d+-rt\d+)\.patch\.xz""#)
        .expect("Invalid patch file regex")
});
/// Absolute `.deb` links on a Debian download-mirror page
static DEB_URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^"'\s<>]+\.deb"#).expect("Invalid deb url regex"));

/// Default timeout for a single listing fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Text-fetch capability used by the catalog
///
/// Abstracted so tests can serve fixture listings without the network.
pub trait TextFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, std::result::Result<String, CatalogError>>;
}

/// `reqwest`-backed fetcher
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rtkernel/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("[Catalog] Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        HttpFetcher { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl TextFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, std::result::Result<String, CatalogError>> {
        async move {
            log::debug!("[Catalog] Fetching: {}", url);

            let unavailable = |reason: String| CatalogError::SourceUnavailable {
                url: url.to_string(),
                reason,
            };

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| unavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(unavailable(format!("HTTP {}", status)));
            }

            let content = response
                .text()
                .await
                .map_err(|e| unavailable(format!("Failed to read response body: {}", e)))?;

            log::debug!("[Catalog] Fetched {} bytes from {}", content.len(), url);
            Ok(content)
        }
        .boxed()
    }
}

/// Extract RT minor lines from the RT project index, in listing order
pub fn extract_minor_versions(listing: &str) -> CandidateSet<MinorKernel> {
    MINOR_DIR_REGEX
        .captures_iter(listing)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Extract full patch versions belonging to `minor` from an `older/` listing
pub fn extract_patch_versions(listing: &str, minor: &MinorKernel) -> CandidateSet<FullPatch> {
    PATCH_FILE_REGEX
        .captures_iter(listing)
        .filter_map(|caps| caps[1].parse::<FullPatch>().ok())
        .filter(|patch| &patch.minor() == minor)
        .collect()
}

/// Extract `linux-image-<version>-rt-<arch>` package names from a Debian index page.
///
/// `<version>` is either an ABI name (`6.1.0-13`) or a release-tagged one
/// (`6.12.48+deb13`). Debug and unsigned flavours (`...-rt-amd64-dbg`) are skipped.
pub fn extract_debian_packages(listing: &str, arch: &str) -> CandidateSet<String> {
    let pattern = format!(
        r"linux-image-\d+\.\d+(?:\.\d+)?(?:-\d+)?(?:\+[a-z]+\d*)?-rt-{}(-[a-z0-9]+)?",
        regex::escape(arch)
    );
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(e) => {
            log::error!("[Catalog] Failed to compile package regex: {}", e);
            return CandidateSet::new();
        }
    };

    regex
        .captures_iter(listing)
        .filter(|caps| caps.get(1).is_none())
        .map(|caps| caps[0].to_string())
        .collect()
}

/// First `.deb` link on a Debian download-mirror page
pub fn extract_deb_url(page: &str) -> Option<String> {
    DEB_URL_REGEX.find(page).map(|m| m.as_str().to_string())
}

/// Remote RT version catalog
#[derive(Clone)]
pub struct VersionCatalog {
    fetcher: Arc<dyn TextFetcher>,
    links: LinkBuilder,
}

impl VersionCatalog {
    pub fn new(fetcher: Arc<dyn TextFetcher>, links: LinkBuilder) -> Self {
        VersionCatalog { fetcher, links }
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    async fn fetch_listing(&self, url: &Url) -> std::result::Result<String, CatalogError> {
        self.fetcher.fetch(url.as_str()).await
    }

    /// RT kernel lines currently published, e.g. `6.6`, `6.1`, `5.15`
    pub async fn list_minor_patch_versions(&self) -> Result<CandidateSet<MinorKernel>> {
        let url = self.links.rt_index_url()?;
        let listing = self.fetch_listing(&url).await?;
        let candidates = extract_minor_versions(&listing);
        log::info!(
            "[Catalog] [MINOR] {} RT kernel lines listed at {}",
            candidates.len(),
            url
        );
        non_empty(candidates, &url)
    }

    /// Every RT patch revision published for one kernel line
    pub async fn list_full_patch_versions(
        &self,
        minor: &MinorKernel,
    ) -> Result<CandidateSet<FullPatch>> {
        let url = self.links.rt_patches_index_url(minor)?;
        let listing = self.fetch_listing(&url).await?;
        let candidates = extract_patch_versions(&listing, minor);
        log::info!(
            "[Catalog] [PATCH] {} patch revisions for {} listed at {}",
            candidates.len(),
            minor,
            url
        );
        non_empty(candidates, &url)
    }

    /// Kernel release of the running system
    pub fn current_system_kernel_version(&self) -> Result<FullKernel> {
        let release = crate::system::running_kernel_release().map_err(|reason| {
            CatalogError::SourceUnavailable {
                url: "uname -r".to_string(),
                reason,
            }
        })?;
        let kernel = FullKernel::from_release(&release)?;
        log::info!("[Catalog] [SYSTEM] Running kernel {} ({})", kernel, release.trim());
        Ok(kernel)
    }

    /// RT kernel image packages offered by a Debian release for one architecture
    pub async fn list_debian_rt_packages(
        &self,
        codename: &str,
        arch: &str,
    ) -> Result<CandidateSet<String>> {
        let url = self.links.debian_index_url(codename, arch)?;
        let listing = self.fetch_listing(&url).await?;
        let candidates = extract_debian_packages(&listing, arch);
        log::info!(
            "[Catalog] [DEBIAN] {} RT packages for {}/{} listed at {}",
            candidates.len(),
            codename,
            arch,
            url
        );
        non_empty(candidates, &url)
    }

    /// Resolve the `.deb` download link of one package from its mirror page
    pub async fn resolve_debian_package(
        &self,
        codename: &str,
        arch: &str,
        package: &str,
    ) -> Result<DownloadLink> {
        let url = self.links.debian_download_page_url(codename, arch, package)?;
        let page = self.fetch_listing(&url).await?;
        let deb = extract_deb_url(&page).ok_or_else(|| CatalogError::NoCandidates {
            url: url.to_string(),
        })?;

        let derived: Vec<VersionIdentifier> = package
            .strip_prefix("linux-image-")
            .and_then(|rest| FullKernel::from_release(rest).ok())
            .map(|kernel| vec![kernel.into()])
            .unwrap_or_default();

        let link = DownloadLink::new(&deb, ArtifactKind::DebianPackage, derived)?;
        log::info!("[Catalog] [DEBIAN] {} -> {}", package, link);
        Ok(link)
    }
}

fn non_empty<T: PartialEq>(candidates: CandidateSet<T>, url: &Url) -> Result<CandidateSet<T>> {
    if candidates.is_empty() {
        log::warn!("[Catalog] Listing at {} yielded no candidates", url);
        return Err(AppError::Catalog(CatalogError::NoCandidates {
            url: url.to_string(),
        }));
    }
    Ok(candidates)
}

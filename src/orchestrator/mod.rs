//! Resolve orchestration: kernel line -> RT patch -> download links, plus the
//! follow-up configuration edits.
//!
//! The orchestrator owns no I/O of its own. Listings come from the
//! [`VersionCatalog`], choices go through a [`Selector`], URLs come from the
//! [`LinkBuilder`], and file edits from the config patcher.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::kernel::catalog::{HttpFetcher, VersionCatalog};
use crate::kernel::patcher::{self, ConfigEdit, EditOp};
use crate::kernel::sources::LinkBuilder;
use crate::kernel::version::{FullKernel, FullPatch, MinorKernel};
use crate::models::{CandidateSet, Choice, DownloadLink, LinkSet, Selection};
use crate::ui::Selector;

/// What to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateQuery {
    /// RT kernel lines, e.g. `6.6`
    MinorLines,
    /// RT patch revisions of one line
    Patches(MinorKernel),
    /// Debian RT kernel image packages
    DebianPackages { codename: String, arch: String },
}

/// Candidates answering a [`CandidateQuery`]
#[derive(Debug, Clone, PartialEq)]
pub enum Candidates {
    MinorLines(CandidateSet<MinorKernel>),
    Patches(CandidateSet<FullPatch>),
    DebianPackages(CandidateSet<String>),
}

impl Candidates {
    pub fn choices(&self) -> Vec<Choice> {
        match self {
            Candidates::MinorLines(set) => set.choices(),
            Candidates::Patches(set) => set.choices(),
            Candidates::DebianPackages(set) => set.choices(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Candidates::MinorLines(set) => set.len(),
            Candidates::Patches(set) => set.len(),
            Candidates::DebianPackages(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully resolved RT release: the patch, its base kernel and every download link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub patch: FullPatch,
    pub kernel: FullKernel,
    pub links: LinkSet,
}

impl fmt::Display for ResolvedRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RT patch:    {}", self.patch)?;
        writeln!(f, "Base kernel: {}", self.kernel)?;
        for link in self.links.iter() {
            writeln!(f, "{:<18} {}", format!("{}:", link.kind()), link)?;
        }
        Ok(())
    }
}

/// Drives the resolve flow on top of a catalog
#[derive(Clone)]
pub struct ResolveOrchestrator {
    catalog: VersionCatalog,
    /// Used only to mark the matching line in prompts
    running_kernel: Option<FullKernel>,
}

impl ResolveOrchestrator {
    pub fn new(catalog: VersionCatalog) -> Self {
        ResolveOrchestrator {
            catalog,
            running_kernel: None,
        }
    }

    /// Orchestrator over the real mirrors configured in `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        let fetcher = Arc::new(HttpFetcher::new(settings.fetch_timeout()));
        Self::new(VersionCatalog::new(fetcher, settings.link_builder()))
    }

    pub fn with_running_kernel(mut self, kernel: Option<FullKernel>) -> Self {
        self.running_kernel = kernel;
        self
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub fn links(&self) -> &LinkBuilder {
        self.catalog.links()
    }

    pub async fn resolve_candidates(&self, query: &CandidateQuery) -> Result<Candidates> {
        log::debug!("[Orchestrator] [QUERY] {:?}", query);
        let candidates = match query {
            CandidateQuery::MinorLines => {
                Candidates::MinorLines(self.catalog.list_minor_patch_versions().await?)
            }
            CandidateQuery::Patches(minor) => {
                Candidates::Patches(self.catalog.list_full_patch_versions(minor).await?)
            }
            CandidateQuery::DebianPackages { codename, arch } => Candidates::DebianPackages(
                self.catalog.list_debian_rt_packages(codename, arch).await?,
            ),
        };
        Ok(candidates)
    }

    pub fn build_links(&self, patch: &FullPatch) -> Result<ResolvedRelease> {
        let links = self.links().build_links(patch)?;
        Ok(ResolvedRelease {
            patch: patch.clone(),
            kernel: patch.kernel(),
            links,
        })
    }

    /// Interactive flow: pick a kernel line, then a patch revision, then build links.
    ///
    /// Cancelling at either prompt ends the flow with `Selection::Cancelled` and
    /// nothing resolved.
    pub async fn select_release<S>(&self, selector: &mut S) -> Result<Selection<ResolvedRelease>>
    where
        S: Selector + ?Sized,
    {
        let minors = self.catalog.list_minor_patch_versions().await?;
        let minor_choices = self.mark_running_line(&minors);
        let minor = match choose(selector, "RT kernel line", &minors, minor_choices)? {
            Selection::Chosen(minor) => minor,
            Selection::Cancelled => {
                log::info!("[Orchestrator] Selection cancelled at kernel line");
                return Ok(Selection::Cancelled);
            }
        };

        let patches = self.catalog.list_full_patch_versions(&minor).await?;
        let patch_choices = patches.choices();
        let title = format!("RT patch for {}", minor);
        let patch = match choose(selector, &title, &patches, patch_choices)? {
            Selection::Chosen(patch) => patch,
            Selection::Cancelled => {
                log::info!("[Orchestrator] Selection cancelled at patch revision");
                return Ok(Selection::Cancelled);
            }
        };

        let release = self.build_links(&patch)?;
        log::info!(
            "[Orchestrator] [RESOLVED] {} on {} ({} links)",
            release.patch,
            release.kernel,
            release.links.iter().count()
        );
        Ok(Selection::Chosen(release))
    }

    /// Interactive Debian flow: pick an RT image package and resolve its `.deb` link
    pub async fn select_debian_package<S>(
        &self,
        selector: &mut S,
        codename: &str,
        arch: &str,
    ) -> Result<Selection<DownloadLink>>
    where
        S: Selector + ?Sized,
    {
        let packages = self.catalog.list_debian_rt_packages(codename, arch).await?;
        let title = format!("Debian {} RT package ({})", codename, arch);
        let choices = packages.choices();
        match choose(selector, &title, &packages, choices)? {
            Selection::Chosen(package) => Ok(Selection::Chosen(
                self.catalog
                    .resolve_debian_package(codename, arch, &package)
                    .await?,
            )),
            Selection::Cancelled => {
                log::info!("[Orchestrator] Debian package selection cancelled");
                Ok(Selection::Cancelled)
            }
        }
    }

    pub fn apply_config_edit(&self, path: &Path, key: &str, op: EditOp) -> Result<bool> {
        Ok(patcher::apply_config_edit(path, key, op)?)
    }

    pub fn apply_config_edits(&self, path: &Path, edits: &[ConfigEdit]) -> Result<bool> {
        Ok(patcher::apply_config_edits(path, edits)?)
    }

    fn mark_running_line(&self, minors: &CandidateSet<MinorKernel>) -> Vec<Choice> {
        let running = self.running_kernel.as_ref().map(FullKernel::minor);
        minors
            .iter()
            .map(|minor| {
                if running.as_ref() == Some(minor) {
                    Choice::new(minor.as_str(), format!("{} (running)", minor))
                } else {
                    Choice::new(minor.as_str(), minor.as_str())
                }
            })
            .collect()
    }
}

/// Ask `selector` and map the returned id back onto the candidate it names
fn choose<S, T>(
    selector: &mut S,
    title: &str,
    candidates: &CandidateSet<T>,
    choices: Vec<Choice>,
) -> Result<Selection<T>>
where
    S: Selector + ?Sized,
    T: Clone + PartialEq + fmt::Display,
{
    match selector.choose(title, &choices) {
        Selection::Cancelled => Ok(Selection::Cancelled),
        Selection::Chosen(id) => candidates
            .find(&id)
            .cloned()
            .map(Selection::Chosen)
            .ok_or(AppError::InvalidSelection(id)),
    }
}

//! Core data structures shared by the resolver, link builder, selector and orchestrator.

use std::fmt;

use reqwest::Url;

use crate::error::LinkError;
use crate::kernel::sources::check_link;
use crate::kernel::version::VersionIdentifier;

/// Ordered candidates offered for selection.
///
/// Listing order is kept exactly as the source presented it; a repeated entry is
/// dropped at its second occurrence. There is no sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet<T> {
    items: Vec<T>,
}

impl<T: PartialEq> CandidateSet<T> {
    pub fn new() -> Self {
        CandidateSet { items: Vec::new() }
    }

    /// Append `item` unless an equal item is already present
    pub fn push(&mut self, item: T) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: PartialEq + fmt::Display> CandidateSet<T> {
    /// Selector entries, using the display text as both id and label
    pub fn choices(&self) -> Vec<Choice> {
        self.items
            .iter()
            .map(|item| Choice::new(item.to_string(), item.to_string()))
            .collect()
    }

    /// Look up the candidate whose display text equals `id`
    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.to_string() == id)
    }
}

impl<T: PartialEq> Default for CandidateSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> FromIterator<T> for CandidateSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for item in iter {
            set.push(item);
        }
        set
    }
}

impl<T> IntoIterator for CandidateSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// One entry presented by an interactive selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Choice {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Outcome of a selection: exactly one value, or an explicit cancellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T = String> {
    Chosen(T),
    Cancelled,
}

impl<T> Selection<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Selection::Cancelled)
    }

    pub fn chosen(&self) -> Option<&T> {
        match self {
            Selection::Chosen(value) => Some(value),
            Selection::Cancelled => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Selection<U> {
        match self {
            Selection::Chosen(value) => Selection::Chosen(f(value)),
            Selection::Cancelled => Selection::Cancelled,
        }
    }
}

/// What a download link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    KernelTarball,
    KernelSignature,
    PatchFile,
    PatchSignature,
    DebianPackage,
}

impl ArtifactKind {
    /// File extension every URL of this kind must end with
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::KernelTarball => ".tar.xz",
            ArtifactKind::KernelSignature => ".tar.sign",
            ArtifactKind::PatchFile => ".patch.xz",
            ArtifactKind::PatchSignature => ".patch.sign",
            ArtifactKind::DebianPackage => ".deb",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::KernelTarball => "kernel tarball",
            ArtifactKind::KernelSignature => "kernel signature",
            ArtifactKind::PatchFile => "patch file",
            ArtifactKind::PatchSignature => "patch signature",
            ArtifactKind::DebianPackage => "debian package",
        };
        f.write_str(name)
    }
}

/// A validated download location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    url: Url,
    kind: ArtifactKind,
    derived_from: Vec<VersionIdentifier>,
}

impl DownloadLink {
    /// Validate `url` for `kind`; an invalid URL never becomes a link
    pub fn new(
        url: &str,
        kind: ArtifactKind,
        derived_from: Vec<VersionIdentifier>,
    ) -> Result<Self, LinkError> {
        let url = check_link(url, Some(kind))?;
        Ok(DownloadLink {
            url,
            kind,
            derived_from,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn derived_from(&self) -> &[VersionIdentifier] {
        &self.derived_from
    }
}

impl fmt::Display for DownloadLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Every artifact needed to build one RT kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSet {
    pub kernel: DownloadLink,
    pub kernel_signature: DownloadLink,
    pub patch: DownloadLink,
    pub patch_signature: DownloadLink,
}

impl LinkSet {
    pub fn iter(&self) -> impl Iterator<Item = &DownloadLink> {
        [
            &self.kernel,
            &self.kernel_signature,
            &self.patch,
            &self.patch_signature,
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::version::MinorKernel;

    #[test]
    fn test_candidate_set_keeps_listing_order() {
        let set: CandidateSet<&str> = ["5.10", "4.19", "6.6", "4.19"].into_iter().collect();
        assert_eq!(set.as_slice(), &["5.10", "4.19", "6.6"]);
    }

    #[test]
    fn test_candidate_set_find_by_id() {
        let set: CandidateSet<MinorKernel> = ["5.10", "6.6"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(set.find("6.6").map(|m| m.as_str()), Some("6.6"));
        assert!(set.find("6.7").is_none());
        assert_eq!(set.choices()[0], Choice::new("5.10", "5.10"));
    }

    #[test]
    fn test_selection_map() {
        let chosen: Selection<&str> = Selection::Chosen("5.10");
        assert_eq!(chosen.map(|s| s.len()), Selection::Chosen(4));
        let cancelled: Selection<&str> = Selection::Cancelled;
        assert!(cancelled.map(|s| s.len()).is_cancelled());
    }

    #[test]
    fn test_download_link_requires_matching_extension() {
        let ok = DownloadLink::new(
            "https://mirrors.edge.kernel.org/pub/linux/kernel/v5.x/linux-5.10.78.tar.xz",
            ArtifactKind::KernelTarball,
            Vec::new(),
        );
        assert!(ok.is_ok());

        let wrong = DownloadLink::new(
            "https://mirrors.edge.kernel.org/pub/linux/kernel/v5.x/linux-5.10.78.tar.xz",
            ArtifactKind::PatchFile,
            Vec::new(),
        );
        assert!(wrong.is_err());
    }
}

//! Kernel and PREEMPT_RT version identifiers.
//!
//! Four granularities are in play when matching an RT patch to its base kernel:
//! - minor kernel (`5.10`)
//! - full kernel (`5.10.78`)
//! - full patch (`5.10.78-rt55`)
//! - major tag (`v5.x`), the directory segment used by kernel.org mirrors
//!
//! Each granularity is a validated newtype. A value only exists if its text matched
//! the grammar, so the derivations between them are infallible; the `&str` entry
//! points below are where malformed input is rejected.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::VersionError;

static MINOR_KERNEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+$").expect("Invalid minor kernel regex"));
static FULL_KERNEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("Invalid full kernel regex"));
static FULL_PATCH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+\.\d+\.\d+)-rt(\d+)$").expect("Invalid full patch regex")
});
static MAJOR_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v(\d+)\.x$").expect("Invalid major tag regex"));
static KERNEL_RELEASE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?").expect("Invalid kernel release regex")
});

/// Granularity tag of a [`VersionIdentifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionKind {
    MinorKernel,
    FullKernel,
    FullPatch,
    MajorTag,
}

impl fmt::Display for VersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionKind::MinorKernel => "minor kernel",
            VersionKind::FullKernel => "full kernel",
            VersionKind::FullPatch => "full patch",
            VersionKind::MajorTag => "major tag",
        };
        f.write_str(name)
    }
}

/// Two-component kernel line, e.g. `5.10`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MinorKernel(String);

/// Three-component kernel release, e.g. `5.10.78`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullKernel(String);

/// Kernel release plus RT revision, e.g. `5.10.78-rt55`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullPatch(String);

/// Mirror directory for a kernel major line, e.g. `v5.x`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MajorTag(String);

impl MinorKernel {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `5.10` -> `v5.x`
    pub fn major_tag(&self) -> MajorTag {
        let major = self.0.split('.').next().unwrap_or_default();
        MajorTag(format!("v{}.x", major))
    }
}

impl FullKernel {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `5.10.78` -> `5.10`
    pub fn minor(&self) -> MinorKernel {
        let minor = trim_trailing_segment(&self.0);
        MinorKernel(minor.to_string())
    }

    /// Parse the leading numeric part of a running kernel release string.
    ///
    /// `uname -r` reports things like `6.1.0-13-amd64` or `5.10.78-rt55`; only the
    /// `X.Y[.Z]` prefix is kept. A release without a patch level is taken as `X.Y.0`.
    pub fn from_release(release: &str) -> Result<Self, VersionError> {
        let trimmed = release.trim();
        let caps = KERNEL_RELEASE_REGEX
            .captures(trimmed)
            .ok_or_else(|| VersionError::malformed(VersionKind::FullKernel, trimmed))?;
        let patch_level = caps.get(3).map_or("0", |m| m.as_str());
        Ok(FullKernel(format!("{}.{}.{}", &caps[1], &caps[2], patch_level)))
    }
}

impl FullPatch {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `5.10.78-rt55` -> `5.10.78`
    pub fn kernel(&self) -> FullKernel {
        let kernel = self.0.split("-rt").next().unwrap_or_default();
        FullKernel(kernel.to_string())
    }

    pub fn minor(&self) -> MinorKernel {
        self.kernel().minor()
    }

    /// RT revision number as written, e.g. `55`
    pub fn rt_revision(&self) -> &str {
        self.0.rsplit("-rt").next().unwrap_or_default()
    }
}

impl MajorTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_version_text {
    ($ty:ident, $kind:expr, $regex:ident) => {
        impl FromStr for $ty {
            type Err = VersionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if $regex.is_match(s) {
                    Ok($ty(s.to_string()))
                } else {
                    Err(VersionError::malformed($kind, s))
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_version_text!(MinorKernel, VersionKind::MinorKernel, MINOR_KERNEL_REGEX);
impl_version_text!(FullKernel, VersionKind::FullKernel, FULL_KERNEL_REGEX);
impl_version_text!(FullPatch, VersionKind::FullPatch, FULL_PATCH_REGEX);
impl_version_text!(MajorTag, VersionKind::MajorTag, MAJOR_TAG_REGEX);

/// A version identifier of any granularity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionIdentifier {
    MinorKernel(MinorKernel),
    FullKernel(FullKernel),
    FullPatch(FullPatch),
    MajorTag(MajorTag),
}

impl VersionIdentifier {
    /// Parse `text` against the grammar of `kind`
    pub fn parse(kind: VersionKind, text: &str) -> Result<Self, VersionError> {
        Ok(match kind {
            VersionKind::MinorKernel => VersionIdentifier::MinorKernel(text.parse()?),
            VersionKind::FullKernel => VersionIdentifier::FullKernel(text.parse()?),
            VersionKind::FullPatch => VersionIdentifier::FullPatch(text.parse()?),
            VersionKind::MajorTag => VersionIdentifier::MajorTag(text.parse()?),
        })
    }

    pub fn kind(&self) -> VersionKind {
        match self {
            VersionIdentifier::MinorKernel(_) => VersionKind::MinorKernel,
            VersionIdentifier::FullKernel(_) => VersionKind::FullKernel,
            VersionIdentifier::FullPatch(_) => VersionKind::FullPatch,
            VersionIdentifier::MajorTag(_) => VersionKind::MajorTag,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VersionIdentifier::MinorKernel(v) => v.as_str(),
            VersionIdentifier::FullKernel(v) => v.as_str(),
            VersionIdentifier::FullPatch(v) => v.as_str(),
            VersionIdentifier::MajorTag(v) => v.as_str(),
        }
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MinorKernel> for VersionIdentifier {
    fn from(v: MinorKernel) -> Self {
        VersionIdentifier::MinorKernel(v)
    }
}

impl From<FullKernel> for VersionIdentifier {
    fn from(v: FullKernel) -> Self {
        VersionIdentifier::FullKernel(v)
    }
}

impl From<FullPatch> for VersionIdentifier {
    fn from(v: FullPatch) -> Self {
        VersionIdentifier::FullPatch(v)
    }
}

impl From<MajorTag> for VersionIdentifier {
    fn from(v: MajorTag) -> Self {
        VersionIdentifier::MajorTag(v)
    }
}

/// Strip the `-rtN` suffix from a full patch version.
///
/// Fails with `MalformedVersion` unless the input is `X.Y.Z-rt<digits>`.
pub fn kernel_from_patch(patch: &str) -> Result<FullKernel, VersionError> {
    Ok(patch.parse::<FullPatch>()?.kernel())
}

/// Keep the first two components of a full kernel version.
pub fn minor_from_kernel(kernel: &str) -> Result<MinorKernel, VersionError> {
    Ok(kernel.parse::<FullKernel>()?.minor())
}

/// Format the leading component of a minor version as a mirror major tag.
pub fn major_tag_from_minor(minor: &str) -> Result<MajorTag, VersionError> {
    Ok(minor.parse::<MinorKernel>()?.major_tag())
}

/// Remove everything from the last `.` onward.
///
/// Text without a `.` comes back unchanged.
pub fn trim_trailing_segment(text: &str) -> &str {
    match text.rfind('.') {
        Some(pos) => &text[..pos],
        None => text,
    }
}

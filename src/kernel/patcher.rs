//! Build configuration patching for `KEY="VALUE"` style files.
//!
//! A [`ConfigDocument`] is an ordered list of lines, each classified as an active
//! assignment, a commented-out assignment (`#KEY=...`, or the kconfig form
//! `# KEY is not set`), or opaque text. Edits are pure: they return a new document
//! and leave the input alone, so a rejected edit never reaches disk.
//!
//! [`ConfigPatcher`] wraps the file round-trip: whole-file read, in-memory edit,
//! write to a temporary sibling, atomic rename over the original, all under an
//! exclusive lock.

mod persist;


use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PatchError;

/// Result type for patching operations
pub type PatchResult<T> = std::result::Result<T, PatchError>;

// Pre-compiled line grammars
static ASSIGNMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(#\s*)?([A-Za-z_][A-Za-z0-9_]*)=(.*)$").expect("Invalid assignment regex")
});
static NOT_SET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)#\s*([A-Za-z_][A-Za-z0-9_]*) is not set\s*$").expect("Invalid not-set regex")
});

/// Classification of a single configuration line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `KEY=VALUE`
    Assignment { key: String },
    /// `#KEY=VALUE` or `# KEY is not set`
    Commented { key: String },
    Opaque,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        if let Some(caps) = ASSIGNMENT_REGEX.captures(line) {
            let key = caps[3].to_string();
            return if caps.get(2).is_some() {
                LineKind::Commented { key }
            } else {
                LineKind::Assignment { key }
            };
        }
        if let Some(caps) = NOT_SET_REGEX.captures(line) {
            return LineKind::Commented {
                key: caps[2].to_string(),
            };
        }
        LineKind::Opaque
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            LineKind::Assignment { key } | LineKind::Commented { key } => Some(key),
            LineKind::Opaque => None,
        }
    }
}

/// What to do with a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Replace the value token verbatim (quotes included, e.g. `"\"\""`)
    Replace(String),
    CommentOut,
}

/// One keyed edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEdit {
    pub key: String,
    pub op: EditOp,
}

impl ConfigEdit {
    pub fn replace(key: impl Into<String>, value: impl Into<String>) -> Self {
        ConfigEdit {
            key: key.into(),
            op: EditOp::Replace(value.into()),
        }
    }

    pub fn comment_out(key: impl Into<String>) -> Self {
        ConfigEdit {
            key: key.into(),
            op: EditOp::CommentOut,
        }
    }
}

impl fmt::Display for ConfigEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            EditOp::Replace(value) => write!(f, "{}={}", self.key, value),
            EditOp::CommentOut => write!(f, "#{}", self.key),
        }
    }
}

/// Edits applied to a distribution kernel config before building an RT kernel.
///
/// Distribution configs reference signing keys that only exist on the
/// distribution's build hosts; a local build fails until they are cleared.
pub fn rt_build_preset() -> Vec<ConfigEdit> {
    vec![
        ConfigEdit::replace("CONFIG_SYSTEM_TRUSTED_KEYS", "\"\""),
        ConfigEdit::replace("CONFIG_SYSTEM_REVOCATION_KEYS", "\"\""),
        ConfigEdit::comment_out("CONFIG_MODULE_SIG_KEY"),
    ]
}

/// Where a key lives in a document
enum Location {
    Active(usize),
    Commented(usize),
}

/// An ordered configuration file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<String>,
    /// Terminator of each line: `"\r\n"`, `"\n"`, or `""` for an unterminated last line
    endings: Vec<&'static str>,
}

impl ConfigDocument {
    /// Split `text` into lines, remembering each line's own terminator
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut endings = Vec::new();
        for raw in text.split_inclusive('\n') {
            let (body, ending) = if let Some(body) = raw.strip_suffix("\r\n") {
                (body, "\r\n")
            } else if let Some(body) = raw.strip_suffix('\n') {
                (body, "\n")
            } else {
                (raw, "")
            };
            lines.push(body.to_string());
            endings.push(ending);
        }
        ConfigDocument { lines, endings }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .zip(&self.endings)
            .fold(String::new(), |mut out, (line, ending)| {
                out.push_str(line);
                out.push_str(ending);
                out
            })
    }

    /// Current line for `key`: the active definition if any, else the first commented one
    pub fn line_for(&self, key: &str) -> PatchResult<&str> {
        let idx = match self.locate(key)? {
            Location::Active(idx) | Location::Commented(idx) => idx,
        };
        Ok(&self.lines[idx])
    }

    fn locate(&self, key: &str) -> PatchResult<Location> {
        let mut active = Vec::new();
        let mut first_commented = None;

        for (idx, line) in self.lines.iter().enumerate() {
            match LineKind::classify(line) {
                LineKind::Assignment { key: k } if k == key => active.push(idx),
                LineKind::Commented { key: k } if k == key && first_commented.is_none() => {
                    first_commented = Some(idx)
                }
                _ => {}
            }
        }

        match active.as_slice() {
            [idx] => Ok(Location::Active(*idx)),
            [] => first_commented
                .map(Location::Commented)
                .ok_or_else(|| PatchError::KeyNotFound {
                    key: key.to_string(),
                }),
            _ => Err(PatchError::AmbiguousKey {
                key: key.to_string(),
                lines: active.iter().map(|idx| idx + 1).collect(),
            }),
        }
    }

    /// Replace the value of `key` with `new_value`.
    ///
    /// Indentation and anything after the value token (an inline comment, say) are
    /// kept. A key that is only present commented out is re-activated.
    pub fn find_and_replace(&self, key: &str, new_value: &str) -> PatchResult<Self> {
        let idx = match self.locate(key)? {
            Location::Active(idx) | Location::Commented(idx) => idx,
        };

        let line = &self.lines[idx];
        let replaced = match ASSIGNMENT_REGEX.captures(line) {
            Some(caps) => {
                let (_, rest) = split_value(&caps[4]);
                format!("{}{}={}{}", &caps[1], key, new_value, rest)
            }
            // `# KEY is not set`
            None => {
                let indent = NOT_SET_REGEX
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .map_or("", |m| m.as_str());
                format!("{}{}={}", indent, key, new_value)
            }
        };

        log::debug!("[Patcher] [REPLACE] line {}: '{}' -> '{}'", idx + 1, line, replaced);

        let mut next = self.clone();
        next.lines[idx] = replaced;
        Ok(next)
    }

    /// Comment out the active definition of `key`; no-op if it is already commented
    pub fn comment_out(&self, key: &str) -> PatchResult<Self> {
        match self.locate(key)? {
            Location::Commented(_) => Ok(self.clone()),
            Location::Active(idx) => {
                let mut next = self.clone();
                next.lines[idx] = format!("#{}", self.lines[idx]);
                log::debug!("[Patcher] [COMMENT] line {}: '{}'", idx + 1, next.lines[idx]);
                Ok(next)
            }
        }
    }

    pub fn apply(&self, edit: &ConfigEdit) -> PatchResult<Self> {
        match &edit.op {
            EditOp::Replace(value) => self.find_and_replace(&edit.key, value),
            EditOp::CommentOut => self.comment_out(&edit.key),
        }
    }

    /// Apply `edits` in order; the first failure aborts the whole batch
    pub fn apply_all(&self, edits: &[ConfigEdit]) -> PatchResult<Self> {
        edits
            .iter()
            .try_fold(self.clone(), |doc, edit| doc.apply(edit))
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Split the right-hand side of an assignment into its value token and the rest
fn split_value(rhs: &str) -> (&str, &str) {
    if let Some(quote) = rhs.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let mut escaped = false;
        for (pos, ch) in rhs[1..].char_indices() {
            match ch {
                // Shell single quotes have no escapes
                '\\' if !escaped && quote == '"' => escaped = true,
                c if c == quote && !escaped => return rhs.split_at(pos + 2),
                _ => escaped = false,
            }
        }
        return (rhs, "");
    }
    match rhs.find(char::is_whitespace) {
        Some(pos) => rhs.split_at(pos),
        None => (rhs, ""),
    }
}

/// File-backed configuration patcher
#[derive(Debug, Clone)]
pub struct ConfigPatcher {
    path: PathBuf,
}

impl ConfigPatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigPatcher { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file into a document
    pub fn load(&self) -> PatchResult<ConfigDocument> {
        let text = fs::read_to_string(&self.path)?;
        Ok(ConfigDocument::parse(&text))
    }

    /// Apply a batch of edits all-or-nothing.
    ///
    /// # Returns
    /// `true` if the file was rewritten, `false` if every edit was already in place
    pub fn apply_edits(&self, edits: &[ConfigEdit]) -> PatchResult<bool> {
        let target = fs::canonicalize(&self.path)?;
        let _lock = persist::EditLock::acquire(&target)?;

        let original = self.load()?;
        let patched = original.apply_all(edits)?;

        if patched == original {
            log::info!(
                "[Patcher] {} already up to date ({} edits)",
                self.path.display(),
                edits.len()
            );
            return Ok(false);
        }

        persist::write_atomic(&target, &patched.render())?;
        log::info!(
            "[Patcher] Applied {} edits to {}",
            edits.len(),
            self.path.display()
        );
        Ok(true)
    }

    pub fn apply_edit(&self, edit: &ConfigEdit) -> PatchResult<bool> {
        self.apply_edits(std::slice::from_ref(edit))
    }
}

/// Apply one edit to the configuration file at `path`
pub fn apply_config_edit(path: &Path, key: &str, op: EditOp) -> PatchResult<bool> {
    ConfigPatcher::new(path).apply_edit(&ConfigEdit {
        key: key.to_string(),
        op,
    })
}

/// Apply a batch of edits to the configuration file at `path`; nothing is written
/// unless every edit succeeds
pub fn apply_config_edits(path: &Path, edits: &[ConfigEdit]) -> PatchResult<bool> {
    ConfigPatcher::new(path).apply_edits(edits)
}

//! Mapping reference strings to files on disk.
//!
//! Resolution is tiered and the first tier that finds a file wins:
//!
//! 1. **Absolute** - the reference is an existing absolute path
//! 2. **Anchor-relative** - the reference joined onto the anchor directory exists
//! 3. **Path suffix** - the reference's segments are a trailing run of an
//!    indexed file's path relative to the anchor
//! 4. **File name** - an indexed file has the same name (allow-listed
//!    extensions only); ties go to the longest shared directory suffix
//! 5. **Fuzzy** - same extension and same stem once case and `-_ .` are
//!    ignored
//!
//! The tiers first run against the container's own directory subtree and
//! then against the whole project. A project-wide hit outside the
//! container's subtree is a cross-directory reference.

use super::scope::{clean_reference, has_separator, in_scope, normalize_path, relative_unix};
use super::{ReferenceCandidate, ResolutionStatus, ResolvedReference};
use crate::discovery::{IndexEntry, ProjectIndex};
use crate::extract::{token_extension, ExtensionSet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// The tier that produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Absolute,
    AnchorRelative,
    PathSuffix,
    FileName,
    Fuzzy,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Absolute => "absolute",
            ResolutionTier::AnchorRelative => "anchor-relative",
            ResolutionTier::PathSuffix => "path-suffix",
            ResolutionTier::FileName => "file-name",
            ResolutionTier::Fuzzy => "fuzzy",
        }
    }
}

/// A file found for a reference, before any scope decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub tier: ResolutionTier,
}

/// Resolves references against a prebuilt project index
pub struct ReferenceResolver<'a> {
    index: &'a ProjectIndex,
    /// Extensions eligible for name and fuzzy matching
    allowed: ExtensionSet,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(index: &'a ProjectIndex, allowed: ExtensionSet) -> Self {
        Self { index, allowed }
    }

    /// Resolve `reference` near `anchor_dir`, falling back to the whole
    /// project under `project_root`. `None` is the normal outcome for
    /// dangling references.
    pub fn resolve(&self, reference: &str, anchor_dir: &Path, project_root: &Path) -> Option<Resolution> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        if let Some(found) = self.resolve_absolute(reference) {
            return Some(found);
        }
        if let Some(found) = self.resolve_within(reference, anchor_dir) {
            return Some(found);
        }
        if normalize_path(anchor_dir) != normalize_path(project_root) {
            return self.resolve_within(reference, project_root);
        }
        None
    }

    /// Resolve a candidate and classify it against its container's scope.
    pub fn resolve_candidate(&self, candidate: &ReferenceCandidate) -> ResolvedReference {
        let anchor = candidate
            .container
            .parent()
            .unwrap_or_else(|| Path::new(""));

        match self.resolve(&candidate.text, anchor, self.index.root()) {
            Some(found) if in_scope(&candidate.container, &found.path) => {
                trace!(
                    "{} -> {} ({})",
                    candidate.text,
                    found.path.display(),
                    found.tier.as_str()
                );
                ResolvedReference::new(
                    candidate.clone(),
                    ResolutionStatus::InScope(found.path),
                    Some(found.tier),
                )
            }
            Some(found) => {
                info!(
                    "Cross-directory reference ignored: {} in {} -> {}",
                    candidate.text,
                    candidate.container.display(),
                    found.path.display()
                );
                ResolvedReference::new(
                    candidate.clone(),
                    ResolutionStatus::CrossDirectory(found.path),
                    Some(found.tier),
                )
            }
            None => {
                debug!(
                    "Unresolved reference: {} in {}",
                    candidate.text,
                    candidate.container.display()
                );
                ResolvedReference::new(candidate.clone(), ResolutionStatus::Unresolved, None)
            }
        }
    }

    /// Tiers 2-5 restricted to files under `dir`.
    fn resolve_within(&self, reference: &str, dir: &Path) -> Option<Resolution> {
        let found = self
            .resolve_anchor_relative(reference, dir)
            .map(|path| (path, ResolutionTier::AnchorRelative))
            .or_else(|| {
                self.resolve_path_suffix(reference, dir)
                    .map(|path| (path, ResolutionTier::PathSuffix))
            })
            .or_else(|| {
                self.resolve_file_name(reference, dir)
                    .map(|path| (path, ResolutionTier::FileName))
            })
            .or_else(|| {
                self.resolve_fuzzy(reference, dir)
                    .map(|path| (path, ResolutionTier::Fuzzy))
            })?;

        Some(Resolution {
            path: normalize_path(&found.0),
            tier: found.1,
        })
    }

    fn resolve_absolute(&self, reference: &str) -> Option<Resolution> {
        let path = Path::new(reference);
        if path.is_absolute() && path.is_file() {
            return Some(Resolution {
                path: normalize_path(path),
                tier: ResolutionTier::Absolute,
            });
        }
        None
    }

    fn resolve_anchor_relative(&self, reference: &str, dir: &Path) -> Option<PathBuf> {
        let joined = normalize_path(&dir.join(clean_reference(reference)));
        joined.is_file().then_some(joined)
    }

    fn resolve_path_suffix(&self, reference: &str, dir: &Path) -> Option<PathBuf> {
        if !has_separator(reference) {
            return None;
        }
        let wanted: Vec<String> = clean_reference(reference)
            .to_lowercase()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        // A trailing-segment match implies an equal file name
        let last = wanted.last()?;

        self.index
            .by_name(last)
            .filter(|entry| entry.path.starts_with(dir))
            .find(|entry| {
                let Some(relative) = relative_unix(&entry.path, dir) else {
                    return false;
                };
                let relative = relative.to_lowercase();
                let segments: Vec<&str> = relative.split('/').collect();
                segments.len() >= wanted.len()
                    && segments[segments.len() - wanted.len()..]
                        .iter()
                        .zip(&wanted)
                        .all(|(a, b)| *a == b.as_str())
            })
            .map(|entry| entry.path.clone())
    }

    fn resolve_file_name(&self, reference: &str, dir: &Path) -> Option<PathBuf> {
        let extension = token_extension(reference)?;
        if !self.allowed.contains(&extension) {
            return None;
        }
        let name = basename(reference)?;
        let matches: Vec<&IndexEntry> = self
            .index
            .by_name(name)
            .filter(|e| e.path.starts_with(dir))
            .collect();

        match matches.as_slice() {
            [] => None,
            [only] => Some(only.path.clone()),
            [first, ..] => {
                if has_separator(reference) {
                    if let Some(best) = best_directory_match(reference, &matches, dir) {
                        return Some(best.path.clone());
                    }
                }
                Some(first.path.clone())
            }
        }
    }

    fn resolve_fuzzy(&self, reference: &str, dir: &Path) -> Option<PathBuf> {
        let extension = token_extension(reference)?;
        if !self.allowed.contains(&extension) {
            return None;
        }
        let name = basename(reference)?;
        self.index
            .by_fuzzy_name(name)
            .find(|e| e.path.starts_with(dir) && e.extension.as_deref() == Some(extension.as_str()))
            .map(|e| e.path.clone())
    }
}

fn basename(reference: &str) -> Option<&str> {
    reference.rsplit(['/', '\\']).next().filter(|n| !n.is_empty())
}

/// Candidate whose directory segments share the longest trailing run with
/// the reference's directory segments. Only a strictly longer run replaces
/// the current best, so the first of equals wins; zero shared segments is
/// no match at all.
fn best_directory_match<'e>(
    reference: &str,
    matches: &[&'e IndexEntry],
    dir: &Path,
) -> Option<&'e IndexEntry> {
    let cleaned = clean_reference(reference).to_lowercase();
    let mut wanted: Vec<&str> = cleaned.split('/').collect();
    wanted.pop();

    let mut best: Option<&'e IndexEntry> = None;
    let mut best_common = 0;
    for &entry in matches {
        let relative = relative_unix(&entry.path, dir).unwrap_or_default().to_lowercase();
        let mut segments: Vec<&str> = relative.split('/').collect();
        segments.pop();

        let common = wanted
            .iter()
            .rev()
            .zip(segments.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        if common > best_common {
            best_common = common;
            best = Some(entry);
        }
    }
    best
}

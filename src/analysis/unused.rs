//! Universe minus everything an in-scope reference reaches.

use super::scope::{clean_reference, in_scope, normalize_path, relative_unix};
use super::ResolvedReference;
use crate::discovery::AssetFile;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output of the unused-set calculation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnusedSet {
    /// Unused assets, path-sorted
    pub unused: Vec<AssetFile>,
    /// Every in-scope resolved path
    pub referenced: BTreeSet<PathBuf>,
}

impl UnusedSet {
    pub fn total_bytes(&self) -> u64 {
        self.unused.iter().map(|a| a.size).sum()
    }
}

/// An asset counts as referenced when any of these hold:
///
/// - its path was resolved in scope by some reference
/// - a referenced file with the same name (ignoring case) lives in the
///   asset's directory subtree
/// - its project-relative path equals a raw reference text (ignoring case
///   and separator style) from a container whose scope covers it
pub fn compute_unused(
    universe: &[AssetFile],
    resolved: &[ResolvedReference],
    project_root: &Path,
) -> UnusedSet {
    let referenced: BTreeSet<PathBuf> = resolved
        .iter()
        .filter_map(|r| r.resolved())
        .map(normalize_path)
        .collect();

    let mut by_name: HashMap<String, Vec<&Path>> = HashMap::new();
    for path in &referenced {
        if let Some(name) = path.file_name() {
            by_name
                .entry(name.to_string_lossy().to_lowercase())
                .or_default()
                .push(path);
        }
    }

    let mut by_text: HashMap<String, Vec<&Path>> = HashMap::new();
    for reference in resolved {
        by_text
            .entry(clean_reference(&reference.candidate.text).to_lowercase())
            .or_default()
            .push(&reference.candidate.container);
    }

    let mut unused: Vec<AssetFile> = universe
        .iter()
        .filter(|asset| {
            let path = normalize_path(&asset.path);
            if referenced.contains(&path) {
                return false;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if let Some(paths) = by_name.get(&name) {
                if paths.iter().any(|r| in_scope(&path, r)) {
                    debug!("{} kept by same-name reference", path.display());
                    return false;
                }
            }

            if let Some(relative) = relative_unix(&path, project_root) {
                if let Some(containers) = by_text.get(&relative.to_lowercase()) {
                    if containers.iter().any(|c| in_scope(c, &path)) {
                        debug!("{} kept by project-relative reference", path.display());
                        return false;
                    }
                }
            }

            true
        })
        .cloned()
        .collect();

    unused.sort_by(|a, b| a.path.cmp(&b.path));
    unused.dedup_by(|a, b| a.path == b.path);

    UnusedSet { unused, referenced }
}

//! Project-wide file index, built once per scan from the discovery walk.

use super::file_finder::Inventory;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One indexed file
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub path: PathBuf,
    /// Lowercase file name
    pub name: String,
    /// Lowercase extension without the dot
    pub extension: Option<String>,
}

/// Lookup tables over every discovered file, in path order
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    root: PathBuf,
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, Vec<usize>>,
    by_fuzzy: HashMap<String, Vec<usize>>,
}

impl ProjectIndex {
    pub fn build(inventory: &Inventory) -> Self {
        Self::from_paths(&inventory.root, inventory.files.iter().map(|f| f.path.clone()))
    }

    pub fn from_paths(root: &Path, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        paths.sort();
        paths.dedup();

        let mut index = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let name = name.to_lowercase();
            let extension = Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_string);

            let idx = index.entries.len();
            index.by_name.entry(name.clone()).or_default().push(idx);
            if let Some(key) = fuzzy_key(&name) {
                index.by_fuzzy.entry(key).or_default().push(idx);
            }
            index.entries.push(IndexEntry {
                path,
                name,
                extension,
            });
        }

        index
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Entries whose file name equals `name`, ignoring case
    pub fn by_name(&self, name: &str) -> impl Iterator<Item = &IndexEntry> {
        self.lookup(&self.by_name, &name.to_lowercase())
    }

    /// Entries sharing the fuzzy key of `name`
    pub fn by_fuzzy_name(&self, name: &str) -> impl Iterator<Item = &IndexEntry> {
        let key = fuzzy_key(name).unwrap_or_default();
        self.lookup(&self.by_fuzzy, &key)
    }

    fn lookup<'a>(
        &'a self,
        table: &'a HashMap<String, Vec<usize>>,
        key: &str,
    ) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        table
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.entries[idx])
    }
}

/// Lowercase stem with `-`, `_`, space and `.` removed, joined to the
/// lowercase extension. `None` for stems of two characters or fewer.
pub fn fuzzy_key(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.to_lowercase();
    let dot = name.rfind('.')?;
    let (stem, ext) = (&name[..dot], &name[dot + 1..]);
    if stem.chars().count() <= 2 || ext.is_empty() {
        return None;
    }
    let squashed: String = stem
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .collect();
    if squashed.is_empty() {
        return None;
    }
    Some(format!("{}.{}", squashed, ext))
}

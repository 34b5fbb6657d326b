use crate::config::{Config, DiscoveryConfig, LimitsConfig, PathFilter};
use crate::error::ConfigError;
use crate::extract::ExtensionSet;
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Kind of container file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// `.efk` effect
    Effect,
    /// `.efkmat` effect material
    EffectMaterial,
    /// `.efkmodel` effect model
    EffectModel,
    /// `.c3b` binary 3D model
    C3bModel,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 4] = [
        ContainerKind::Effect,
        ContainerKind::EffectMaterial,
        ContainerKind::EffectModel,
        ContainerKind::C3bModel,
    ];

    /// Determine container kind from path
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "efk" => Some(ContainerKind::Effect),
            "efkmat" => Some(ContainerKind::EffectMaterial),
            "efkmodel" => Some(ContainerKind::EffectModel),
            "c3b" => Some(ContainerKind::C3bModel),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContainerKind::Effect => "efk",
            ContainerKind::EffectMaterial => "efkmat",
            ContainerKind::EffectModel => "efkmodel",
            ContainerKind::C3bModel => "c3b",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ContainerKind::Effect => "effect",
            ContainerKind::EffectMaterial => "effect material",
            ContainerKind::EffectModel => "effect model",
            ContainerKind::C3bModel => "c3b model",
        }
    }

    /// Extensions a reference recovered from this kind may carry
    pub fn allowed_extensions(&self) -> ExtensionSet {
        match self {
            ContainerKind::Effect | ContainerKind::EffectMaterial => ExtensionSet::effect(),
            ContainerKind::EffectModel => ExtensionSet::effect_model(),
            ContainerKind::C3bModel => ExtensionSet::images(),
        }
    }

    /// Byte ceiling above which a container is skipped
    pub fn size_limit(&self, limits: &LimitsConfig) -> u64 {
        match self {
            ContainerKind::Effect => limits.effect_max_bytes,
            ContainerKind::EffectMaterial => limits.material_max_bytes,
            ContainerKind::EffectModel => limits.model_max_bytes,
            ContainerKind::C3bModel => limits.c3b_max_bytes,
        }
    }
}

/// A container file discovered during the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFile {
    pub path: PathBuf,
    pub kind: ContainerKind,
    pub size: u64,
}

impl ContainerFile {
    pub fn new(path: PathBuf, kind: ContainerKind, size: u64) -> Self {
        Self { path, kind, size }
    }

    /// Directory the container lives in; the anchor for its references
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// A member of the asset universe
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetFile {
    pub path: PathBuf,
    /// Lowercase extension without the dot
    pub extension: String,
    pub size: u64,
}

/// A regular file seen by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Everything one walk of the project produced, path-sorted
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub root: PathBuf,
    pub files: Vec<FoundFile>,
}

impl Inventory {
    /// Files whose extension names a container kind
    pub fn containers(&self) -> Vec<ContainerFile> {
        self.files
            .iter()
            .filter_map(|f| {
                let kind = ContainerKind::from_path(&f.path)?;
                Some(ContainerFile::new(f.path.clone(), kind, f.size))
            })
            .collect()
    }

    /// Files whose extension is one of `targets`
    pub fn assets(&self, targets: &ExtensionSet) -> Vec<AssetFile> {
        self.files
            .iter()
            .filter(|f| targets.matches_path(&f.path))
            .filter_map(|f| {
                let extension = f.path.extension()?.to_str()?.to_ascii_lowercase();
                Some(AssetFile {
                    path: f.path.clone(),
                    extension,
                    size: f.size,
                })
            })
            .collect()
    }
}

/// File finder for walking a project tree
pub struct FileFinder {
    options: DiscoveryConfig,
    filter: PathFilter,
}

impl FileFinder {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            options: config.discovery.clone(),
            filter: PathFilter::from_config(config)?,
        })
    }

    pub fn with_filter(options: DiscoveryConfig, filter: PathFilter) -> Self {
        Self { options, filter }
    }

    /// Find every regular, non-excluded file under `root`
    pub fn find_files(&self, root: &Path) -> Inventory {
        debug!("Scanning for files in: {}", root.display());

        let mut files = if self.options.respect_ignore_files {
            self.walk_with_ignore(root)
        } else {
            self.walk(root)
        };
        files.sort_by(|a, b| a.path.cmp(&b.path));

        debug!("Found {} files", files.len());
        Inventory {
            root: root.to_path_buf(),
            files,
        }
    }

    fn walk(&self, root: &Path) -> Vec<FoundFile> {
        let skip_hidden = self.options.skip_hidden;
        WalkDir::new(root)
            .follow_links(self.options.follow_links)
            .into_iter()
            .filter_entry(|entry| !(skip_hidden && entry.depth() > 0 && is_hidden(entry.file_name())))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                self.accept(root, entry.path(), size)
            })
            .collect()
    }

    fn walk_with_ignore(&self, root: &Path) -> Vec<FoundFile> {
        let walker = WalkBuilder::new(root)
            .hidden(self.options.skip_hidden)
            .git_ignore(true)       // Respect .gitignore
            .git_global(true)       // Respect global gitignore
            .git_exclude(true)      // Respect .git/info/exclude
            .ignore(true)           // Respect .ignore files
            .parents(true)          // Check parent directories for ignore files
            .require_git(false)
            .follow_links(self.options.follow_links)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                self.accept(root, entry.path(), size)
            })
            .collect()
    }

    fn accept(&self, root: &Path, path: &Path, size: u64) -> Option<FoundFile> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if self.filter.is_excluded(relative) {
            trace!("Excluding: {}", path.display());
            return None;
        }
        Some(FoundFile {
            path: path.to_path_buf(),
            size,
        })
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// Counts of discovered containers per kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerCounts {
    pub effect: usize,
    pub effect_material: usize,
    pub effect_model: usize,
    pub c3b_model: usize,
}

impl ContainerCounts {
    pub fn from_containers(containers: &[ContainerFile]) -> Self {
        let mut counts = Self::default();
        for container in containers {
            counts.add(container.kind);
        }
        counts
    }

    pub fn add(&mut self, kind: ContainerKind) {
        match kind {
            ContainerKind::Effect => self.effect += 1,
            ContainerKind::EffectMaterial => self.effect_material += 1,
            ContainerKind::EffectModel => self.effect_model += 1,
            ContainerKind::C3bModel => self.c3b_model += 1,
        }
    }

    pub fn get(&self, kind: ContainerKind) -> usize {
        match kind {
            ContainerKind::Effect => self.effect,
            ContainerKind::EffectMaterial => self.effect_material,
            ContainerKind::EffectModel => self.effect_model,
            ContainerKind::C3bModel => self.c3b_model,
        }
    }

    pub fn total(&self) -> usize {
        self.effect + self.effect_material + self.effect_model + self.c3b_model
    }
}

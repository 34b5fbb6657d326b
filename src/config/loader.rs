use crate::error::ConfigError;
use crate::extract::extensions::{ExtensionSet, DEFAULT_TARGET_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File names probed in the project root, in order
pub const DEFAULT_CONFIG_NAMES: &[&str] = &[
    ".assetsweep.yml",
    ".assetsweep.yaml",
    ".assetsweep.toml",
    "assetsweep.yml",
    "assetsweep.yaml",
    "assetsweep.toml",
];

const MB: u64 = 1024 * 1024;

/// Configuration for an asset scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob patterns excluded from discovery
    pub exclude: Vec<String>,

    /// Glob patterns for assets that are never reported as unused
    pub retain_patterns: Vec<String>,

    /// Universe configuration
    pub assets: AssetsConfig,

    /// Per-kind container size ceilings
    pub limits: LimitsConfig,

    /// Directory walk configuration
    pub discovery: DiscoveryConfig,

    /// Container analysis configuration
    pub scan: ScanConfig,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Extensions that make up the universe of candidate assets
    pub target_extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub effect_max_bytes: u64,
    pub material_max_bytes: u64,
    pub model_max_bytes: u64,
    pub c3b_max_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Skip dot-files and dot-directories
    pub skip_hidden: bool,

    /// Honor .gitignore / .ignore files
    pub respect_ignore_files: bool,

    /// Follow symbolic links
    pub follow_links: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Analyze containers on a worker pool
    pub parallel: bool,

    /// Worker count; 0 lets the pool decide
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,

    /// List the references recovered from each container
    pub show_references: bool,

    /// List references that resolved outside their container's directory
    pub show_cross_directory: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: vec![
                "**/.git/**".to_string(),
                "**/.svn/**".to_string(),
                "**/node_modules/**".to_string(),
            ],
            retain_patterns: vec![],
            assets: AssetsConfig::default(),
            limits: LimitsConfig::default(),
            discovery: DiscoveryConfig::default(),
            scan: ScanConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            target_extensions: DEFAULT_TARGET_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            effect_max_bytes: 10 * MB,
            material_max_bytes: 10 * MB,
            model_max_bytes: 50 * MB,
            c3b_max_bytes: 50 * MB,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
            show_references: false,
            show_cross_directory: true,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parse_yaml = |contents: &str| {
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        };
        let parse_toml = |contents: &str| {
            toml::from_str(contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        };

        match extension {
            "yml" | "yaml" => parse_yaml(&contents),
            "toml" => parse_toml(&contents),
            // Try YAML first, then TOML
            _ => parse_yaml(&contents).or_else(|_| parse_toml(&contents)),
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self, ConfigError> {
        for name in DEFAULT_CONFIG_NAMES {
            let path = project_root.join(name);
            if path.is_file() {
                debug!("Loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// The configured universe extensions
    pub fn target_extensions(&self) -> ExtensionSet {
        ExtensionSet::new(&self.assets.target_extensions)
    }
}

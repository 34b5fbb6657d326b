use crate::error::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::Config;

/// Compiled exclude / retain globs.
///
/// Patterns are matched against the project-relative path (with `/`
/// separators) and, for patterns without a directory part, the file name.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    exclude: Option<GlobSet>,
    retain: Option<GlobSet>,
}

impl PathFilter {
    pub fn new(exclude: &[String], retain: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            exclude: build_globset(exclude)?,
            retain: build_globset(retain)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.exclude, &config.retain_patterns)
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        matches(&self.exclude, relative)
    }

    pub fn is_retained(&self, relative: &Path) -> bool {
        matches(&self.retain, relative)
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;
    for pat in patterns {
        let pat = pat.trim();
        if pat.is_empty() {
            continue;
        }
        let glob = Glob::new(pat).map_err(|source| ConfigError::Glob {
            pattern: pat.to_string(),
            source,
        })?;
        builder.add(glob);
        added = true;
    }
    if !added {
        return Ok(None);
    }
    builder
        .build()
        .map(Some)
        .map_err(|source| ConfigError::Glob {
            pattern: patterns.join(", "),
            source,
        })
}

fn matches(set: &Option<GlobSet>, relative: &Path) -> bool {
    let Some(set) = set else {
        return false;
    };
    let unixy = relative.to_string_lossy().replace('\\', "/");
    if set.is_match(&unixy) {
        return true;
    }
    relative
        .file_name()
        .map(|name| set.is_match(name))
        .unwrap_or(false)
}

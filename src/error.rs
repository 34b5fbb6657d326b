//! Error types for the library.
//!
//! Only `ScanError` can abort a scan. Per-container problems are
//! `AnalyzeError`s that the analyzer turns into skip/failure outcomes.

use std::path::PathBuf;
use thiserror::Error;

/// Scan-wide preconditions that stop a scan before it starts
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("project root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("project root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("failed to resolve project root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid extension pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Problems with one container file. Never escapes the analyzer.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: bad header, expected {expected:?}")]
    BadHeader { path: PathBuf, expected: &'static [u8] },

    #[error("{path}: truncated at offset {offset}")]
    Truncated { path: PathBuf, offset: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {path} to backup: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

//! Watch mode: re-run the scan whenever a container or candidate asset
//! changes under the project root.

use crate::config::{Config, PathFilter};
use crate::discovery::ContainerKind;
use crate::error::ConfigError;
use crate::extract::ExtensionSet;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Watch mode errors
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    WatcherError(#[from] notify::Error),
    #[error("Failed to receive events: {0}")]
    RecvError(#[from] std::sync::mpsc::RecvError),
}

/// File watcher for continuous scanning
pub struct FileWatcher {
    root: PathBuf,
    /// Debounce duration in milliseconds
    debounce_ms: u64,
    /// Container and target extensions
    extensions: ExtensionSet,
    filter: PathFilter,
}

impl FileWatcher {
    /// Watch containers and the configured target extensions, skipping
    /// excluded paths.
    pub fn new(root: &Path, config: &Config) -> Result<Self, ConfigError> {
        let extensions = ExtensionSet::new(
            ContainerKind::ALL
                .iter()
                .map(|k| k.extension().to_string())
                .chain(config.target_extensions().iter().map(str::to_string)),
        );
        Ok(Self {
            root: root.to_path_buf(),
            debounce_ms: 500,
            extensions,
            filter: PathFilter::from_config(config)?,
        })
    }

    /// Set debounce duration
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Check if a path should trigger a rescan
    fn should_trigger(&self, path: &Path) -> bool {
        if !self.extensions.matches_path(path) {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        !self.filter.is_excluded(relative)
    }

    /// Start watching and call `on_change` once up front and after every
    /// relevant batch of changes. `on_change` returns false to stop.
    pub fn watch<F>(&self, mut on_change: F) -> Result<(), WatchError>
    where
        F: FnMut() -> bool,
    {
        let (tx, rx) = channel();

        let mut debouncer = new_debouncer(Duration::from_millis(self.debounce_ms), tx)?;
        debouncer
            .watcher()
            .watch(&self.root, RecursiveMode::Recursive)?;

        println!();
        println!("{}", "Watch mode active. Press Ctrl+C to stop.".cyan().bold());
        println!("{}", format!("   Watching: {}", self.root.display()).dimmed());
        println!();

        if !on_change() {
            return Ok(());
        }

        loop {
            match rx.recv()? {
                Ok(events) => {
                    let relevant: Vec<_> = events
                        .iter()
                        .filter(|e| {
                            matches!(e.kind, DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous)
                                && self.should_trigger(&e.path)
                        })
                        .collect();
                    debug!("{} events, {} relevant", events.len(), relevant.len());

                    if relevant.is_empty() {
                        continue;
                    }

                    println!();
                    println!(
                        "{}",
                        format!("Changes detected in {} file(s), rescanning...", relevant.len()).yellow()
                    );
                    for event in relevant.iter().take(5) {
                        if let Some(name) = event.path.file_name() {
                            println!("   • {}", name.to_string_lossy().dimmed());
                        }
                    }
                    if relevant.len() > 5 {
                        println!("   • ... and {} more", relevant.len() - 5);
                    }
                    println!();

                    if !on_change() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("{}: {:?}", "Watch error".red(), e);
                }
            }
        }

        Ok(())
    }
}

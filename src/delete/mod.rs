//! Safe removal of unused assets, with confirmation prompts and an
//! optional backup directory.

use crate::discovery::AssetFile;
use crate::error::DeleteError;
use crate::report::format_size;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(PathBuf),
    /// Moved into the backup directory
    Moved { from: PathBuf, to: PathBuf },
    /// Dry run: would have been removed
    WouldDelete(PathBuf),
    /// Vanished between classification and deletion
    AlreadyGone(PathBuf),
    Failed { path: PathBuf, error: String },
}

impl DeleteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DeleteOutcome::Deleted(p) | DeleteOutcome::WouldDelete(p) | DeleteOutcome::AlreadyGone(p) => p,
            DeleteOutcome::Moved { from, .. } => from,
            DeleteOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted(_) | DeleteOutcome::Moved { .. })
    }
}

/// Deletes or backs up unused assets after user confirmation
pub struct SafeDeleter {
    root: PathBuf,
    interactive: bool,
    dry_run: bool,
    backup_dir: Option<PathBuf>,
}

impl SafeDeleter {
    pub fn new(root: &Path, interactive: bool, dry_run: bool, backup_dir: Option<PathBuf>) -> Self {
        Self {
            root: root.to_path_buf(),
            interactive,
            dry_run,
            backup_dir,
        }
    }

    /// Prompt for a selection, then remove it
    pub fn delete(&self, unused: &[AssetFile]) -> Result<Vec<DeleteOutcome>, DeleteError> {
        if unused.is_empty() {
            println!("{}", "No unused assets to delete.".green());
            return Ok(Vec::new());
        }

        if self.dry_run {
            println!();
            println!("{}", "Dry run - would delete:".yellow().bold());
            for asset in unused {
                println!("  {} ({})", asset.path.display(), format_size(asset.size));
            }
            println!();
            println!(
                "{}",
                format!("Total: {} files would be deleted", unused.len()).dimmed()
            );
            return Ok(unused
                .iter()
                .map(|a| DeleteOutcome::WouldDelete(a.path.clone()))
                .collect());
        }

        if !console::user_attended() {
            warn!("stdout is not a terminal; refusing to prompt for deletion");
            return Ok(Vec::new());
        }

        let selected = if self.interactive {
            self.interactive_select(unused)?
        } else {
            self.batch_confirm(unused)?
        };

        if selected.is_empty() {
            println!("{}", "No files selected for deletion.".yellow());
            return Ok(Vec::new());
        }

        println!();
        println!("{}", "Deleting unused assets...".cyan().bold());
        let outcomes = self.remove_all(&selected);
        for outcome in &outcomes {
            match outcome {
                DeleteOutcome::Deleted(path) => println!("  {} Deleted {}", "✓".green(), path.display()),
                DeleteOutcome::Moved { from, to } => println!(
                    "  {} Moved {} to {}",
                    "✓".green(),
                    from.display(),
                    to.display()
                ),
                DeleteOutcome::AlreadyGone(path) => println!(
                    "  {} {} is already gone",
                    "-".dimmed(),
                    path.display()
                ),
                DeleteOutcome::Failed { path, error } => println!(
                    "  {} Failed to delete {}: {}",
                    "✗".red(),
                    path.display(),
                    error
                ),
                DeleteOutcome::WouldDelete(_) => {}
            }
        }

        Ok(outcomes)
    }

    /// Remove every file without prompting
    pub fn remove_all(&self, assets: &[&AssetFile]) -> Vec<DeleteOutcome> {
        assets
            .iter()
            .map(|asset| {
                if self.dry_run {
                    return DeleteOutcome::WouldDelete(asset.path.clone());
                }
                match self.remove_one(&asset.path) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("{}", e);
                        DeleteOutcome::Failed {
                            path: asset.path.clone(),
                            error: e.to_string(),
                        }
                    }
                }
            })
            .collect()
    }

    /// The file may vanish at any point before the remove or move; that
    /// surfaces as `NotFound` and is reported as `AlreadyGone`.
    fn remove_one(&self, path: &Path) -> Result<DeleteOutcome, DeleteError> {
        match &self.backup_dir {
            Some(backup) => {
                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                let relative = relative.strip_prefix("/").unwrap_or(relative);
                let target = backup.join(relative);
                match move_file(path, &target) {
                    Ok(()) => Ok(DeleteOutcome::Moved {
                        from: path.to_path_buf(),
                        to: target,
                    }),
                    Err(e) if vanished(path, &e) => Ok(already_gone(path)),
                    Err(source) => Err(DeleteError::Backup {
                        path: path.to_path_buf(),
                        source,
                    }),
                }
            }
            None => match fs::remove_file(path) {
                Ok(()) => Ok(DeleteOutcome::Deleted(path.to_path_buf())),
                Err(e) if vanished(path, &e) => Ok(already_gone(path)),
                Err(source) => Err(DeleteError::Remove {
                    path: path.to_path_buf(),
                    source,
                }),
            },
        }
    }

    /// Interactive selection mode - confirm each file
    fn interactive_select<'a>(&self, unused: &'a [AssetFile]) -> Result<Vec<&'a AssetFile>, DeleteError> {
        let mut selected = Vec::new();

        println!();
        println!("{}", "Interactive mode - confirm each deletion:".cyan().bold());
        println!();

        for asset in unused {
            let prompt = format!("Delete {} ({})?", asset.path.display(), format_size(asset.size));
            if Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(&prompt)
                .default(false)
                .interact()?
            {
                selected.push(asset);
            }
        }

        Ok(selected)
    }

    /// Batch confirmation - select multiple at once
    fn batch_confirm<'a>(&self, unused: &'a [AssetFile]) -> Result<Vec<&'a AssetFile>, DeleteError> {
        let items: Vec<String> = unused
            .iter()
            .map(|a| format!("{} ({})", a.path.display(), format_size(a.size)))
            .collect();

        println!();
        println!("{}", "Select files to delete:".cyan().bold());
        println!("{}", "(Space to toggle, Enter to confirm)".dimmed());
        println!();

        let selections = MultiSelect::with_theme(&ColorfulTheme::default())
            .items(&items)
            .interact()?;

        let selected: Vec<&AssetFile> = selections.into_iter().map(|i| &unused[i]).collect();

        if !selected.is_empty() {
            println!();
            let confirm = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Delete {} files?", selected.len()))
                .default(false)
                .interact()?;

            if !confirm {
                return Ok(Vec::new());
            }
        }

        Ok(selected)
    }
}

/// `NotFound` caused by the source itself, not by the backup side
fn vanished(path: &Path, error: &std::io::Error) -> bool {
    error.kind() == ErrorKind::NotFound && !path.exists()
}

fn already_gone(path: &Path) -> DeleteOutcome {
    debug!("{} vanished before deletion", path.display());
    DeleteOutcome::AlreadyGone(path.to_path_buf())
}

/// Rename when possible, copy and remove across filesystems
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

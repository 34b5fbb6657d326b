use super::{display_relative, format_size};
use crate::analysis::ResolutionStatus;
use crate::discovery::AssetFile;
use crate::scan::{ContainerIssue, ScanSession, Statistics};
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// List the references recovered from each container
    show_references: bool,
    /// List references that resolved outside their container's directory
    show_cross_directory: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            show_references: false,
            show_cross_directory: true,
        }
    }

    pub fn with_references(mut self, show: bool) -> Self {
        self.show_references = show;
        self
    }

    pub fn with_cross_directory(mut self, show: bool) -> Self {
        self.show_cross_directory = show;
        self
    }

    pub fn report(&self, session: &ScanSession) -> Result<()> {
        print!("{}", self.render(session));
        Ok(())
    }

    /// The full report as it would be printed
    pub fn render(&self, session: &ScanSession) -> String {
        let mut out = String::new();
        let stats = session.statistics();
        let unused = session.compute_unused();

        if self.show_references {
            self.write_references(&mut out, session);
        }
        if self.show_cross_directory {
            self.write_cross_directory(&mut out, session);
        }
        self.write_issues(&mut out, session);

        let _ = writeln!(out);
        if session.is_cancelled() {
            let _ = writeln!(
                out,
                "{}",
                "Scan cancelled: unused assets were not computed".yellow().bold()
            );
        } else if unused.is_empty() {
            let _ = writeln!(out, "{}", "No unused assets found!".green().bold());
        } else {
            self.write_unused(&mut out, session, &unused, &stats);
        }

        self.write_summary(&mut out, &stats);
        out
    }

    fn write_unused(&self, out: &mut String, session: &ScanSession, unused: &[AssetFile], stats: &Statistics) {
        let _ = writeln!(
            out,
            "{}",
            format!(
                "Found {} unused assets ({}):",
                unused.len(),
                format_size(stats.unused_bytes)
            )
            .yellow()
            .bold()
        );
        let _ = writeln!(out);

        // Group by directory
        let mut by_dir: BTreeMap<String, Vec<&AssetFile>> = BTreeMap::new();
        for asset in unused {
            let dir = asset
                .path
                .parent()
                .map(|p| display_relative(p, session.root()))
                .unwrap_or_else(|| ".".to_string());
            by_dir.entry(dir).or_default().push(asset);
        }

        for (dir, assets) in &by_dir {
            let total: u64 = assets.iter().map(|a| a.size).sum();
            let _ = writeln!(
                out,
                "{} {}",
                format!("{}/", dir).cyan().bold(),
                format!("({} files, {})", assets.len(), format_size(total)).dimmed()
            );
            for asset in assets {
                let name = asset
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {} {}",
                    name,
                    format_size(asset.size).dimmed()
                );
            }
            let _ = writeln!(out);
        }
    }

    fn write_references(&self, out: &mut String, session: &ScanSession) {
        if session.result().is_empty() {
            return;
        }
        let _ = writeln!(out, "{}", "References by container:".bold());
        for (container, references) in session.result().iter() {
            let _ = writeln!(
                out,
                "{}",
                display_relative(container, session.root()).cyan()
            );
            for reference in references {
                let _ = writeln!(out, "  {} {}", "→".dimmed(), reference);
            }
        }
        let _ = writeln!(out);
    }

    fn write_cross_directory(&self, out: &mut String, session: &ScanSession) {
        let cross: Vec<_> = session.cross_directory().collect();
        if cross.is_empty() {
            return;
        }
        let _ = writeln!(
            out,
            "{}",
            format!("{} cross-directory references (not counted as used):", cross.len()).yellow()
        );
        for reference in cross {
            if let ResolutionStatus::CrossDirectory(path) = &reference.status {
                let _ = writeln!(
                    out,
                    "  {} {} {} {}",
                    display_relative(&reference.candidate.container, session.root()).dimmed(),
                    reference.candidate.text,
                    "→".dimmed(),
                    display_relative(path, session.root())
                );
            }
        }
        let _ = writeln!(out);
    }

    fn write_issues(&self, out: &mut String, session: &ScanSession) {
        for (path, issue) in session.issues() {
            let path = display_relative(path, session.root());
            let _ = match issue {
                ContainerIssue::Skipped(reason) => {
                    writeln!(out, "{} {}: {}", "skipped".yellow().bold(), path, reason)
                }
                ContainerIssue::Failed(message) => {
                    writeln!(out, "{} {}: {}", "failed".red().bold(), path, message)
                }
            };
        }
    }

    fn write_summary(&self, out: &mut String, stats: &Statistics) {
        let _ = writeln!(out, "{}", "─".repeat(60).dimmed());
        let c = &stats.containers;
        let _ = writeln!(
            out,
            "Containers: {} ({} effect, {} material, {} model, {} c3b)",
            c.total(),
            c.effect,
            c.effect_material,
            c.effect_model,
            c.c3b_model
        );

        let mut parts = vec![format!("{} analyzed", stats.analyzed).green().to_string()];
        if stats.skipped > 0 {
            parts.push(format!("{} skipped", stats.skipped).yellow().to_string());
        }
        if stats.failed > 0 {
            parts.push(format!("{} failed", stats.failed).red().to_string());
        }
        let _ = writeln!(out, "Analysis: {}", parts.join(", "));

        let _ = writeln!(
            out,
            "References: {} found, {} in scope, {} cross-directory, {} unresolved",
            stats.total_references, stats.resolved_in_scope, stats.cross_directory, stats.unresolved
        );
        let _ = writeln!(
            out,
            "Assets: {} scanned, {} retained, {} unused ({})",
            stats.universe,
            stats.retained,
            stats.unused,
            format_size(stats.unused_bytes)
        );
        if stats.unused > 0 {
            let _ = writeln!(
                out,
                "{}",
                "Tip: Run with --delete to remove unused assets".dimmed()
            );
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

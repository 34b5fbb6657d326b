//! Scan reports: a colored terminal listing and a JSON document.

mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::config::ReportConfig;
use crate::scan::ScanSession;
use miette::Result;
use std::path::{Path, PathBuf};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl ReportFormat {
    /// Parse the `report.format` config value
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "terminal" | "text" => Some(ReportFormat::Terminal),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Reporter for a finished scan session
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_references: bool,
    show_cross_directory: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_references: false,
            show_cross_directory: true,
        }
    }

    pub fn with_options(mut self, options: &ReportConfig) -> Self {
        self.show_references = options.show_references;
        self.show_cross_directory = options.show_cross_directory;
        self
    }

    pub fn report(&self, session: &ScanSession) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => TerminalReporter::new()
                .with_references(self.show_references)
                .with_cross_directory(self.show_cross_directory)
                .report(session),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(session),
        }
    }
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}

/// `path` relative to `root` with forward slashes, or the full path when
/// it lies outside the root.
pub(crate) fn display_relative(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Ok(_) => ".".to_string(),
        Err(_) => path.display().to_string(),
    }
}

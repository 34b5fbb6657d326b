use super::display_relative;
use crate::analysis::ResolutionStatus;
use crate::scan::{ScanSession, Statistics};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, session: &ScanSession) -> Result<()> {
        let json = self.render(session)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(&self, session: &ScanSession) -> Result<String> {
        let report = JsonReport::from_session(session);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    root: String,
    statistics: Statistics,
    /// Container (project-relative) to the references recovered from it
    results: BTreeMap<String, Vec<String>>,
    unused: Vec<JsonAsset>,
    cross_directory: Vec<JsonReference>,
    unresolved: Vec<JsonReference>,
}

#[derive(Serialize)]
struct JsonAsset {
    path: String,
    extension: String,
    size: u64,
}

#[derive(Serialize)]
struct JsonReference {
    container: String,
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<&'static str>,
}

impl JsonReport {
    fn from_session(session: &ScanSession) -> Self {
        let root = session.root();

        let results = session
            .result()
            .iter()
            .map(|(container, refs)| (display_relative(container, root), refs.clone()))
            .collect();

        let unused = session
            .compute_unused()
            .into_iter()
            .map(|asset| JsonAsset {
                path: display_relative(&asset.path, root),
                extension: asset.extension,
                size: asset.size,
            })
            .collect();

        let reference = |r: &crate::analysis::ResolvedReference| JsonReference {
            container: display_relative(&r.candidate.container, root),
            reference: r.candidate.text.clone(),
            resolved: match &r.status {
                ResolutionStatus::CrossDirectory(path) | ResolutionStatus::InScope(path) => {
                    Some(display_relative(path, root))
                }
                ResolutionStatus::Unresolved => None,
            },
            tier: r.tier.map(|t| t.as_str()),
        };

        Self {
            version: env!("CARGO_PKG_VERSION"),
            root: root.display().to_string(),
            statistics: session.statistics(),
            results,
            unused,
            cross_directory: session.cross_directory().map(reference).collect(),
            unresolved: session.unresolved().map(reference).collect(),
        }
    }
}

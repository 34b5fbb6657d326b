//! The state of one scan, owned by the aggregating thread and handed back
//! to the caller when the scan ends.

use super::progress::ScanPhase;
use crate::analysis::{
    compute_unused, ContainerOutcome, ReferenceCandidate, ResolvedReference, SkipReason,
};
use crate::discovery::{AssetFile, ContainerCounts, ContainerFile};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Container path to the reference strings recovered from it.
///
/// Keys are unique and path-ordered; containers that produced nothing have
/// no entry. Entries only grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult(BTreeMap<PathBuf, Vec<String>>);

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append references for a container, skipping case-insensitive repeats.
    pub fn record(&mut self, container: &Path, references: impl IntoIterator<Item = String>) {
        let mut references = references.into_iter().peekable();
        if references.peek().is_none() {
            return;
        }
        let entry = self.0.entry(container.to_path_buf()).or_default();
        for reference in references {
            if !entry.iter().any(|r| r.eq_ignore_ascii_case(&reference)) {
                entry.push(reference);
            }
        }
    }

    pub fn get(&self, container: &Path) -> Option<&[String]> {
        self.0.get(container).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_references(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Counters derived from a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub containers: ContainerCounts,
    pub analyzed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_references: usize,
    pub universe: usize,
    pub retained: usize,
    pub resolved_in_scope: usize,
    pub cross_directory: usize,
    pub unresolved: usize,
    pub unused: usize,
    pub unused_bytes: u64,
    pub cancelled: bool,
}

/// A container that could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerIssue {
    Skipped(SkipReason),
    Failed(String),
}

/// Everything one scan produced
#[derive(Debug, Clone)]
pub struct ScanSession {
    root: PathBuf,
    pub(crate) phase: ScanPhase,
    pub(crate) cancelled: bool,
    pub(crate) containers: Vec<ContainerFile>,
    pub(crate) universe: Vec<AssetFile>,
    pub(crate) retained: BTreeSet<PathBuf>,
    result: ScanResult,
    candidates: BTreeMap<PathBuf, Vec<ReferenceCandidate>>,
    issues: BTreeMap<PathBuf, ContainerIssue>,
    analyzed: usize,
    pub(crate) resolved: Vec<ResolvedReference>,
}

impl ScanSession {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            phase: ScanPhase::Idle,
            cancelled: false,
            containers: Vec::new(),
            universe: Vec::new(),
            retained: BTreeSet::new(),
            result: ScanResult::new(),
            candidates: BTreeMap::new(),
            issues: BTreeMap::new(),
            analyzed: 0,
            resolved: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn containers(&self) -> &[ContainerFile] {
        &self.containers
    }

    pub fn universe(&self) -> &[AssetFile] {
        &self.universe
    }

    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    /// Containers that were skipped or failed, path-ordered
    pub fn issues(&self) -> impl Iterator<Item = (&PathBuf, &ContainerIssue)> {
        self.issues.iter()
    }

    /// Every candidate, container by container in path order
    pub fn candidates(&self) -> impl Iterator<Item = &ReferenceCandidate> {
        self.candidates.values().flatten()
    }

    pub fn resolved(&self) -> &[ResolvedReference] {
        &self.resolved
    }

    pub fn cross_directory(&self) -> impl Iterator<Item = &ResolvedReference> {
        self.resolved.iter().filter(|r| r.is_cross_directory())
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ResolvedReference> {
        self.resolved.iter().filter(|r| r.is_unresolved())
    }

    /// Fold one container's outcome into the session.
    pub(crate) fn record_outcome(&mut self, container: &ContainerFile, outcome: ContainerOutcome) {
        match outcome {
            ContainerOutcome::Analyzed(candidates) => {
                self.analyzed += 1;
                self.result
                    .record(&container.path, candidates.iter().map(|c| c.text.clone()));
                if !candidates.is_empty() {
                    self.candidates.insert(container.path.clone(), candidates);
                }
            }
            ContainerOutcome::Skipped(reason) => {
                self.issues
                    .insert(container.path.clone(), ContainerIssue::Skipped(reason));
            }
            ContainerOutcome::Failed(message) => {
                self.issues
                    .insert(container.path.clone(), ContainerIssue::Failed(message));
            }
        }
    }

    /// Universe members no in-scope reference reaches, minus retained
    /// assets, path-sorted. Empty until resolution has run, and for a
    /// cancelled scan.
    pub fn compute_unused(&self) -> Vec<AssetFile> {
        if self.cancelled || self.phase != ScanPhase::Done {
            return Vec::new();
        }
        compute_unused(&self.universe, &self.resolved, &self.root)
            .unused
            .into_iter()
            .filter(|a| !self.retained.contains(&a.path))
            .collect()
    }

    pub fn statistics(&self) -> Statistics {
        let unused = self.compute_unused();
        let count = |pred: fn(&ContainerIssue) -> bool| self.issues.values().filter(|i| pred(i)).count();

        Statistics {
            containers: ContainerCounts::from_containers(&self.containers),
            analyzed: self.analyzed,
            failed: count(|i| matches!(i, ContainerIssue::Failed(_))),
            skipped: count(|i| matches!(i, ContainerIssue::Skipped(_))),
            total_references: self.result.total_references(),
            universe: self.universe.len(),
            retained: self.retained.len(),
            resolved_in_scope: self.resolved.iter().filter(|r| r.resolved().is_some()).count(),
            cross_directory: self.cross_directory().count(),
            unresolved: self.unresolved().count(),
            unused: unused.len(),
            unused_bytes: unused.iter().map(|a| a.size).sum(),
            cancelled: self.cancelled,
        }
    }
}

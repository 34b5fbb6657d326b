//! Reference analysis: per-container extraction, resolution against the
//! project index, and the unused-set calculation.

mod container;
mod resolver;
pub mod scope;
mod unused;

pub use container::{ContainerAnalyzer, ContainerOutcome, SkipReason, C3B_MAGIC};
pub use resolver::{ReferenceResolver, Resolution, ResolutionTier};
pub use scope::{in_scope, normalize_path};
pub use unused::{compute_unused, UnusedSet};

use std::path::{Path, PathBuf};

/// A reference string recovered from one container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceCandidate {
    /// Extracted text, as found
    pub text: String,

    /// Container the text came from
    pub container: PathBuf,

    /// Position within the source string when several paths were split
    /// out of one concatenated string
    pub sub_index: Option<usize>,
}

impl ReferenceCandidate {
    pub fn new(text: impl Into<String>, container: &Path) -> Self {
        Self {
            text: text.into(),
            container: container.to_path_buf(),
            sub_index: None,
        }
    }

    pub fn with_sub_index(mut self, sub_index: usize) -> Self {
        self.sub_index = Some(sub_index);
        self
    }
}

/// Where a reference ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// Resolved to a file inside the container's directory scope
    InScope(PathBuf),
    /// Resolved, but outside the container's directory scope
    CrossDirectory(PathBuf),
    /// No file found
    Unresolved,
}

/// A candidate together with its resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub candidate: ReferenceCandidate,
    pub status: ResolutionStatus,
    pub tier: Option<ResolutionTier>,
}

impl ResolvedReference {
    pub fn new(candidate: ReferenceCandidate, status: ResolutionStatus, tier: Option<ResolutionTier>) -> Self {
        Self {
            candidate,
            status,
            tier,
        }
    }

    /// The resolved path, only when it is in scope for the container
    pub fn resolved(&self) -> Option<&Path> {
        match &self.status {
            ResolutionStatus::InScope(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_cross_directory(&self) -> bool {
        matches!(self.status, ResolutionStatus::CrossDirectory(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.status, ResolutionStatus::Unresolved)
    }
}

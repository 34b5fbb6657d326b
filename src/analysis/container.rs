//! Per-container reference extraction.
//!
//! Every kind runs the string-table scanner and the path extractor. Effect
//! materials and models add the whole-buffer pattern search, models also
//! add the byte-string and raw backward passes. C3B models are read as
//! their own length-prefixed string table.

use super::ReferenceCandidate;
use crate::config::LimitsConfig;
use crate::discovery::{ContainerFile, ContainerKind};
use crate::error::AnalyzeError;
use crate::extract::strings::{self, StringCandidate};
use crate::extract::{is_valid_file_path, ExtensionSet, PathExtractor, PathLimit, PatternSearch};
use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use tracing::{debug, warn};

/// Magic bytes at the start of every C3B file
pub const C3B_MAGIC: &[u8] = b"C3B\0";

/// Magic plus a u32 version
const C3B_HEADER_LEN: usize = 8;

const C3B_MAX_STRING_LEN: usize = 1024;

/// Why a container was not analyzed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooLarge { size: u64, limit: u64 },
    Missing,
    PermissionDenied,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooLarge { size, limit } => {
                write!(f, "too large ({} bytes, limit {})", size, limit)
            }
            SkipReason::Missing => write!(f, "file no longer exists"),
            SkipReason::PermissionDenied => write!(f, "permission denied"),
        }
    }
}

/// Result of analyzing one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerOutcome {
    Analyzed(Vec<ReferenceCandidate>),
    Skipped(SkipReason),
    Failed(String),
}

impl ContainerOutcome {
    pub fn references(&self) -> Vec<String> {
        match self {
            ContainerOutcome::Analyzed(candidates) => {
                candidates.iter().map(|c| c.text.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Extraction tables for one extension allow-list
#[derive(Debug, Clone)]
struct KindTables {
    allowed: ExtensionSet,
    extractor: PathExtractor,
    search: PatternSearch,
}

impl KindTables {
    fn new(allowed: ExtensionSet) -> Result<Self, regex::Error> {
        Ok(Self {
            extractor: PathExtractor::new(&allowed),
            search: PatternSearch::new(&allowed)?,
            allowed,
        })
    }
}

/// Extracts reference strings from container files.
///
/// Never fails past its own boundary: every problem with a single file
/// becomes a [`ContainerOutcome::Skipped`] or [`ContainerOutcome::Failed`].
#[derive(Debug, Clone)]
pub struct ContainerAnalyzer {
    limits: LimitsConfig,
    effect: KindTables,
    model: KindTables,
    c3b: KindTables,
}

impl ContainerAnalyzer {
    pub fn new(limits: LimitsConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            limits,
            effect: KindTables::new(ContainerKind::Effect.allowed_extensions())?,
            model: KindTables::new(ContainerKind::EffectModel.allowed_extensions())?,
            c3b: KindTables::new(ContainerKind::C3bModel.allowed_extensions())?,
        })
    }

    /// Reference strings for one container; empty when it was skipped or
    /// could not be read.
    pub fn analyze_references(&self, container: &ContainerFile) -> Vec<String> {
        self.analyze(container).references()
    }

    pub fn analyze(&self, container: &ContainerFile) -> ContainerOutcome {
        let limit = container.kind.size_limit(&self.limits);
        let size = match std::fs::metadata(&container.path) {
            Ok(meta) => meta.len(),
            Err(e) => return self.io_outcome(container, e),
        };
        if size > limit {
            warn!(
                "Skipping {} ({}): {} bytes exceeds {} byte limit",
                container.path.display(),
                container.kind.display_name(),
                size,
                limit
            );
            return ContainerOutcome::Skipped(SkipReason::TooLarge { size, limit });
        }

        // Whole file in memory before any parsing
        let buffer = match std::fs::read(&container.path) {
            Ok(buffer) => buffer,
            Err(e) => return self.io_outcome(container, e),
        };

        match self.analyze_bytes(container, &buffer) {
            Ok(candidates) => {
                debug!(
                    "{}: {} references",
                    container.path.display(),
                    candidates.len()
                );
                ContainerOutcome::Analyzed(candidates)
            }
            Err(e) => {
                warn!("Failed to analyze {}: {}", container.path.display(), e);
                ContainerOutcome::Failed(e.to_string())
            }
        }
    }

    /// Run the kind's extraction steps over an in-memory buffer.
    pub fn analyze_bytes(
        &self,
        container: &ContainerFile,
        buffer: &[u8],
    ) -> Result<Vec<ReferenceCandidate>, AnalyzeError> {
        let mut collector = Collector::new(container);

        match container.kind {
            ContainerKind::Effect => {
                self.string_table(&self.effect, &strings::scan(buffer), &mut collector);
            }
            ContainerKind::EffectMaterial => {
                self.string_table(&self.effect, &strings::scan(buffer), &mut collector);
                collector.extend(self.effect.search.search(buffer));
            }
            ContainerKind::EffectModel => {
                self.string_table(&self.model, &strings::scan(buffer), &mut collector);
                collector.extend(self.model.search.search(buffer));
                let byte_strings = strings::length_prefixed_bytes(buffer, 0);
                self.string_table(&self.model, &byte_strings, &mut collector);
                collector.extend(self.model.search.search_raw(buffer));
            }
            ContainerKind::C3bModel => {
                for text in c3b_strings(container, buffer)? {
                    if is_valid_file_path(&text, &self.c3b.allowed, PathLimit::Filesystem) {
                        collector.push(text, None);
                    } else if self.c3b.allowed.mentioned_in(&text) {
                        collector.extend(self.c3b.extractor.extract_paths(&text));
                    }
                }
            }
        }

        Ok(collector.finish())
    }

    /// Feed every candidate that mentions an allowed extension through the
    /// path extractor.
    fn string_table(&self, tables: &KindTables, candidates: &[StringCandidate], collector: &mut Collector) {
        for candidate in candidates {
            if !tables.allowed.mentioned_in(&candidate.text) {
                continue;
            }
            let tokens: Vec<String> = tables
                .extractor
                .extract_paths(&candidate.text)
                .into_iter()
                .filter(|t| is_valid_file_path(t, &tables.allowed, PathLimit::Filesystem))
                .collect();
            let split = tokens.len() > 1;
            for (i, token) in tokens.into_iter().enumerate() {
                collector.push(token, split.then_some(i));
            }
        }
    }

    fn io_outcome(&self, container: &ContainerFile, error: std::io::Error) -> ContainerOutcome {
        match error.kind() {
            ErrorKind::NotFound => {
                warn!("Skipping {}: file no longer exists", container.path.display());
                ContainerOutcome::Skipped(SkipReason::Missing)
            }
            ErrorKind::PermissionDenied => {
                warn!("Skipping {}: permission denied", container.path.display());
                ContainerOutcome::Skipped(SkipReason::PermissionDenied)
            }
            _ => {
                let error = AnalyzeError::Io {
                    path: container.path.clone(),
                    source: error,
                };
                warn!("{}", error);
                ContainerOutcome::Failed(error.to_string())
            }
        }
    }
}

/// Accumulates candidates, dropping case-insensitive duplicates
struct Collector<'a> {
    container: &'a ContainerFile,
    seen: HashSet<String>,
    out: Vec<ReferenceCandidate>,
}

impl<'a> Collector<'a> {
    fn new(container: &'a ContainerFile) -> Self {
        Self {
            container,
            seen: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn push(&mut self, text: String, sub_index: Option<usize>) {
        let text = text.trim().to_string();
        if text.is_empty() || !self.seen.insert(text.to_lowercase()) {
            return;
        }
        let mut candidate = ReferenceCandidate::new(text, &self.container.path);
        candidate.sub_index = sub_index;
        self.out.push(candidate);
    }

    fn extend(&mut self, texts: impl IntoIterator<Item = String>) {
        for text in texts {
            self.push(text, None);
        }
    }

    fn finish(self) -> Vec<ReferenceCandidate> {
        self.out
    }
}

/// Length-prefixed UTF-8 strings after the C3B header: a u32 LE byte count
/// in `1..=1024` at any offset, one trailing NUL stripped.
fn c3b_strings(container: &ContainerFile, buffer: &[u8]) -> Result<Vec<String>, AnalyzeError> {
    if buffer.len() < C3B_HEADER_LEN {
        return Err(AnalyzeError::Truncated {
            path: container.path.clone(),
            offset: buffer.len(),
        });
    }
    if &buffer[..C3B_MAGIC.len()] != C3B_MAGIC {
        return Err(AnalyzeError::BadHeader {
            path: container.path.clone(),
            expected: C3B_MAGIC,
        });
    }

    let mut out = Vec::new();
    let mut pos = C3B_HEADER_LEN;
    while pos + 4 < buffer.len() {
        let len = u32::from_le_bytes([buffer[pos], buffer[pos + 1], buffer[pos + 2], buffer[pos + 3]]) as usize;
        let start = pos + 4;
        if (1..=C3B_MAX_STRING_LEN).contains(&len) && start + len <= buffer.len() {
            let mut data = &buffer[start..start + len];
            if let Some((&0, rest)) = data.split_last() {
                data = rest;
            }
            if let Ok(text) = std::str::from_utf8(data) {
                let length = text.chars().count();
                if (3..=256).contains(&length) {
                    out.push(text.to_string());
                }
            }
        }
        pos += 1;
    }
    Ok(out)
}

//! Drives a scan through discovery, container analysis and resolution.
//!
//! Analysis may run on a rayon pool. Workers never touch the session:
//! each sends `(index, outcome)` over a channel and the calling thread,
//! the only owner of the session, folds outcomes in and reports progress.

use super::progress::{CancelFlag, ScanPhase, ScanProgress};
use super::session::ScanSession;
use crate::analysis::{ContainerAnalyzer, ContainerOutcome, ReferenceResolver};
use crate::config::{Config, PathFilter};
use crate::discovery::{ContainerFile, FileFinder, ProjectIndex};
use crate::error::ScanError;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, warn};

/// Runs scans for one configuration
pub struct ScanOrchestrator {
    config: Config,
    cancel: CancelFlag,
}

impl ScanOrchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flag that stops the current scan between containers. It is cleared
    /// when the next scan starts.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn scan(&self, root: &Path) -> Result<ScanSession, ScanError> {
        self.scan_with_progress(root, |_| {})
    }

    /// Run a full scan, calling `on_progress` at every phase boundary and
    /// after every container.
    pub fn scan_with_progress<F>(&self, root: &Path, mut on_progress: F) -> Result<ScanSession, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        match self.run(root, &mut on_progress) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!("Scan failed: {}", e);
                on_progress(&ScanProgress::new(ScanPhase::Failed, 0, 0, e.to_string()));
                Err(e)
            }
        }
    }

    fn run(&self, root: &Path, on_progress: &mut dyn FnMut(&ScanProgress)) -> Result<ScanSession, ScanError> {
        self.cancel.reset();
        let root = validate_root(root)?;
        let mut session = ScanSession::new(&root);

        // Discovering
        session.phase = ScanPhase::Discovering;
        on_progress(&ScanProgress::new(ScanPhase::Discovering, 0, 1, "Discovering files"));

        let filter = PathFilter::from_config(&self.config)?;
        let finder = FileFinder::with_filter(self.config.discovery.clone(), filter.clone());
        let inventory = finder.find_files(&root);
        let targets = self.config.target_extensions();

        session.containers = inventory.containers();
        session.universe = inventory.assets(&targets);
        session.retained = session
            .universe
            .iter()
            .filter(|a| filter.is_retained(a.path.strip_prefix(&root).unwrap_or(&a.path)))
            .map(|a| a.path.clone())
            .collect();
        let index = ProjectIndex::build(&inventory);

        info!(
            "Found {} containers and {} candidate assets",
            session.containers.len(),
            session.universe.len()
        );
        on_progress(&ScanProgress::new(
            ScanPhase::Discovering,
            1,
            1,
            format!(
                "Found {} containers, {} assets",
                session.containers.len(),
                session.universe.len()
            ),
        ));

        // Analyzing
        session.phase = ScanPhase::Analyzing;
        let analyzer = ContainerAnalyzer::new(self.config.limits)?;
        let containers = session.containers.clone();
        if self.config.scan.parallel {
            self.analyze_parallel(&analyzer, &containers, &mut session, on_progress)?;
        } else {
            self.analyze_sequential(&analyzer, &containers, &mut session, on_progress);
        }

        if self.cancel.is_cancelled() {
            info!("Scan cancelled; keeping {} analyzed containers", session.result().len());
            session.cancelled = true;
            session.phase = ScanPhase::Done;
            on_progress(&ScanProgress::new(ScanPhase::Done, 0, 0, "Cancelled"));
            return Ok(session);
        }

        // Resolving
        session.phase = ScanPhase::Resolving;
        let resolver = ReferenceResolver::new(&index, targets);
        let candidates: Vec<_> = session.candidates().cloned().collect();
        let total = candidates.len();
        on_progress(&ScanProgress::new(ScanPhase::Resolving, 0, total, "Resolving references"));

        let mut resolved = Vec::with_capacity(total);
        for (i, candidate) in candidates.iter().enumerate() {
            resolved.push(resolver.resolve_candidate(candidate));
            if (i + 1) % 64 == 0 || i + 1 == total {
                on_progress(&ScanProgress::new(
                    ScanPhase::Resolving,
                    i + 1,
                    total,
                    candidate.text.clone(),
                ));
            }
        }
        session.resolved = resolved;

        session.phase = ScanPhase::Done;
        let stats = session.statistics();
        info!(
            "Scan complete: {} analyzed, {} skipped, {} failed, {} unused",
            stats.analyzed, stats.skipped, stats.failed, stats.unused
        );
        on_progress(&ScanProgress::new(
            ScanPhase::Done,
            total,
            total,
            format!("{} unused assets", stats.unused),
        ));

        Ok(session)
    }

    fn analyze_sequential(
        &self,
        analyzer: &ContainerAnalyzer,
        containers: &[ContainerFile],
        session: &mut ScanSession,
        on_progress: &mut dyn FnMut(&ScanProgress),
    ) {
        let total = containers.len();
        on_progress(&ScanProgress::new(ScanPhase::Analyzing, 0, total, "Analyzing containers"));

        for (i, container) in containers.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            let outcome = analyzer.analyze(container);
            session.record_outcome(container, outcome);
            on_progress(&ScanProgress::new(
                ScanPhase::Analyzing,
                i + 1,
                total,
                display_name(&container.path),
            ));
        }
    }

    fn analyze_parallel(
        &self,
        analyzer: &ContainerAnalyzer,
        containers: &[ContainerFile],
        session: &mut ScanSession,
        on_progress: &mut dyn FnMut(&ScanProgress),
    ) -> Result<(), ScanError> {
        let total = containers.len();
        on_progress(&ScanProgress::new(ScanPhase::Analyzing, 0, total, "Analyzing containers"));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.scan.threads)
            .build()?;
        debug!("Analyzing on {} threads", pool.current_num_threads());

        let (tx, rx) = mpsc::channel::<(usize, ContainerOutcome)>();
        let cancel = &self.cancel;

        std::thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    containers
                        .par_iter()
                        .enumerate()
                        .for_each_with(tx, |tx, (i, container)| {
                            if cancel.is_cancelled() {
                                return;
                            }
                            // The receiver only goes away once every sender is gone
                            let _ = tx.send((i, analyzer.analyze(container)));
                        });
                });
            });

            // Single consumer: the only writer of the session
            let mut completed = 0;
            for (i, outcome) in rx {
                let container = &containers[i];
                session.record_outcome(container, outcome);
                completed += 1;
                on_progress(&ScanProgress::new(
                    ScanPhase::Analyzing,
                    completed,
                    total,
                    display_name(&container.path),
                ));
            }
        });

        Ok(())
    }
}

/// The root must exist and be a directory; it is canonicalized so every
/// discovered path shares one absolute prefix.
fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootMissing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }
    root.canonicalize().map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

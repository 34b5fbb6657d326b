//! assetsweep - Find game assets no effect container references
//!
//! This library recovers texture, model and sub-effect references from
//! undocumented binary containers (`.efk`, `.efkmat`, `.efkmodel`, `.c3b`)
//! and reports the images and effect files nothing points at.
//!
//! # Architecture
//!
//! The scan pipeline consists of:
//! 1. **File Discovery** - Walk the project for containers and candidate assets
//! 2. **Extraction** - Recover plausible reference strings from each container
//! 3. **Resolution** - Map every reference to a real file under directory-scope rules
//! 4. **Unused Set** - Universe minus everything an in-scope reference reaches
//! 5. **Reporting** - Output results in various formats

pub mod analysis;
pub mod config;
pub mod delete;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod report;
pub mod scan;
pub mod watch;

pub use analysis::{ContainerAnalyzer, ContainerOutcome, ReferenceResolver, ResolutionStatus, ResolvedReference};
pub use config::Config;
pub use delete::{DeleteOutcome, SafeDeleter};
pub use discovery::{AssetFile, ContainerFile, ContainerKind, FileFinder};
pub use error::{AnalyzeError, ConfigError, DeleteError, ScanError};
pub use report::{ReportFormat, Reporter};
pub use scan::{CancelFlag, ScanOrchestrator, ScanPhase, ScanProgress, ScanResult, ScanSession, Statistics};

//! Scan orchestration: discovery, analysis and resolution, with progress
//! reporting and cooperative cancellation.

mod orchestrator;
mod progress;
mod session;

pub use orchestrator::ScanOrchestrator;
pub use progress::{CancelFlag, ScanPhase, ScanProgress};
pub use session::{ContainerIssue, ScanResult, ScanSession, Statistics};

//! hrvault antivirus scanning
//!
//! Fail-closed scan facade over pluggable backends (clamd over TCP, an
//! external HTTP scan API, or both), plus the quarantine store for
//! rejected bytes. No error path in this crate ever reports a file as
//! clean.

pub mod backends;
pub mod metrics;
pub mod outcome;
pub mod quarantine;
pub mod scanner;

pub use metrics::{ScanMetrics, ScanMetricsSnapshot};
pub use outcome::ScanOutcome;
pub use quarantine::{QuarantineRecord, QuarantineStore};
pub use scanner::{ScanBackend, ScanError, Scanner};

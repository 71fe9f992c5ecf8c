//! Campaign performance tracking and AI-assisted reporting.

pub mod report;
pub mod tracker;

pub use report::ReportGenerator;
pub use tracker::{compute_performance, PerformanceTracker, TrackingOutcome};

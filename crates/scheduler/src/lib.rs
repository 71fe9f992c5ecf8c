//! Batch execution and the periodic jobs that keep influencer metrics and
//! campaign performance current.

pub mod batch;
pub mod jobs;
pub mod scheduler;

pub use batch::{BatchRunner, BatchSummary};
pub use jobs::{Job, RefreshInfluencerMetricsJob, TrackActiveCampaignsJob};
pub use scheduler::JobScheduler;

//! Influencer discovery: matching, content analysis, performance prediction,
//! shortlisting and the metrics refresh job.

pub mod analyzer;
pub mod matcher;
pub mod predictor;
pub mod prompt;
pub mod refresh;
pub mod shortlist;

pub use analyzer::{EngagementAnalyzer, InfluencerAnalysis};
pub use matcher::{InfluencerMatcher, RecommendationRequest, SearchCriteria, SortBy};
pub use predictor::{PerformancePrediction, PerformancePredictor};
pub use refresh::MetricsRefresher;
pub use shortlist::CandidateShortlister;

//! The daily batch jobs: influencer metrics refresh and performance tracking.

use crate::batch::{BatchRunner, BatchSummary};
use async_trait::async_trait;
use influencer_core::store::{CampaignOrder, CampaignQuery, DocumentStore, InfluencerOrder, InfluencerQuery};
use influencer_core::types::{CampaignStatus, InfluencerStatus};
use influencer_core::EngineResult;
use influencer_discovery::MetricsRefresher;
use influencer_reporting::PerformanceTracker;
use std::sync::Arc;
use std::time::Duration;

pub const REFRESH_INFLUENCER_METRICS: &str = "refresh_influencer_metrics";
pub const TRACK_ACTIVE_CAMPAIGNS: &str = "track_active_campaigns";

/// A periodic batch job.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    fn interval(&self) -> Duration;

    /// Runs one pass. Errors only when the work list cannot be loaded;
    /// per-item failures are counted in the summary.
    async fn run(&self) -> EngineResult<BatchSummary>;
}

pub struct RefreshInfluencerMetricsJob {
    store: Arc<dyn DocumentStore>,
    refresher: MetricsRefresher,
    runner: BatchRunner,
    interval: Duration,
}

impl RefreshInfluencerMetricsJob {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sample_limit: usize,
        runner: BatchRunner,
        interval: Duration,
    ) -> Self {
        Self {
            refresher: MetricsRefresher::new(store.clone(), sample_limit),
            store,
            runner,
            interval,
        }
    }
}

#[async_trait]
impl Job for RefreshInfluencerMetricsJob {
    fn name(&self) -> &'static str {
        REFRESH_INFLUENCER_METRICS
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> EngineResult<BatchSummary> {
        let ids: Vec<_> = self
            .store
            .query_influencers(&InfluencerQuery {
                status: Some(InfluencerStatus::Active),
                order: InfluencerOrder::StalestMetricsFirst,
                ..Default::default()
            })
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();

        Ok(self
            .runner
            .run(self.name(), ids, |id| async move {
                self.refresher.update_influencer_metrics(id).await.map(|_| ())
            })
            .await)
    }
}

pub struct TrackActiveCampaignsJob {
    store: Arc<dyn DocumentStore>,
    tracker: PerformanceTracker,
    runner: BatchRunner,
    interval: Duration,
}

impl TrackActiveCampaignsJob {
    pub fn new(store: Arc<dyn DocumentStore>, runner: BatchRunner, interval: Duration) -> Self {
        Self {
            tracker: PerformanceTracker::new(store.clone()),
            store,
            runner,
            interval,
        }
    }
}

#[async_trait]
impl Job for TrackActiveCampaignsJob {
    fn name(&self) -> &'static str {
        TRACK_ACTIVE_CAMPAIGNS
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> EngineResult<BatchSummary> {
        let mut campaigns = self
            .store
            .query_campaigns(&CampaignQuery {
                status: Some(CampaignStatus::InProgress),
                order: CampaignOrder::StalestPerformanceFirst,
                ..Default::default()
            })
            .await?;
        // Campaigns without approved content are never stamped, so they go
        // last to keep them from holding the cap every run.
        campaigns.sort_by_key(|c| c.approved_content.is_empty());
        let ids: Vec<_> = campaigns.into_iter().map(|c| c.id).collect();

        Ok(self
            .runner
            .run(self.name(), ids, |id| async move {
                self.tracker.track_campaign_performance(id).await.map(|_| ())
            })
            .await)
    }
}

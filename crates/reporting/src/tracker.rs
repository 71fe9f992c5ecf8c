//! Campaign performance tracking: aggregates approved content metrics into
//! a regenerable performance snapshot.

use chrono::Utc;
use influencer_core::store::DocumentStore;
use influencer_core::types::{
    Campaign, CampaignContent, CampaignPatch, CampaignPerformance, ContentStatus, GoalMetric,
    InfluencerPerformance, PerformanceSnapshot,
};
use influencer_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackingOutcome {
    /// The campaign has no approved content; nothing was written.
    NoContent,
    Tracked { performance: CampaignPerformance },
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn realized(performance: &CampaignPerformance, metric: GoalMetric) -> f64 {
    match metric {
        GoalMetric::Reach => performance.total_reach as f64,
        GoalMetric::Engagement => performance.total_engagement as f64,
        GoalMetric::Clicks => performance.total_clicks as f64,
        GoalMetric::Conversions => performance.total_conversions as f64,
        GoalMetric::EngagementRate => performance.engagement_rate,
        GoalMetric::ClickThroughRate => performance.click_through_rate,
        GoalMetric::ConversionRate => performance.conversion_rate,
        GoalMetric::Roi => performance.roi,
    }
}

/// Aggregates the metrics of a campaign's approved content. Pure: the same
/// content always yields the same snapshot.
pub fn compute_performance(campaign: &Campaign, contents: &[CampaignContent]) -> CampaignPerformance {
    let mut perf = CampaignPerformance::default();

    for content in contents.iter().filter(|c| c.status == ContentStatus::Approved) {
        let metrics = content.performance_metrics.unwrap_or_default();
        let engagement = metrics.engagement();

        perf.total_reach += metrics.reach;
        perf.total_engagement += engagement;
        perf.total_clicks += metrics.clicks;
        perf.total_conversions += metrics.conversions;

        let entry = perf
            .performance_by_influencer
            .entry(content.influencer_id)
            .or_insert_with(InfluencerPerformance::default);
        entry.reach += metrics.reach;
        entry.engagement += engagement;
        entry.clicks += metrics.clicks;
        entry.conversions += metrics.conversions;
        entry.content_count += 1;
    }

    for entry in perf.performance_by_influencer.values_mut() {
        entry.engagement_rate = ratio(entry.engagement, entry.reach);
    }

    perf.engagement_rate = ratio(perf.total_engagement, perf.total_reach);
    perf.click_through_rate = ratio(perf.total_clicks, perf.total_engagement);
    perf.conversion_rate = ratio(perf.total_conversions, perf.total_clicks);

    if campaign.budget > 0.0 && campaign.conversion_value > 0.0 {
        let value = perf.total_conversions as f64 * campaign.conversion_value;
        perf.roi = (value - campaign.budget) / campaign.budget;
    }

    if !campaign.goals.is_empty() {
        let met = campaign
            .goals
            .iter()
            .filter(|(metric, target)| realized(&perf, **metric) >= **target)
            .count();
        perf.goal_completion = met as f64 / campaign.goals.len() as f64;
    }

    perf
}

pub struct PerformanceTracker {
    store: Arc<dyn DocumentStore>,
}

impl PerformanceTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Recomputes the campaign's performance, records a snapshot and caches
    /// it on the campaign. Concurrent calls race benignly: each writes the
    /// same value.
    pub async fn track_campaign_performance(&self, campaign_id: Uuid) -> EngineResult<TrackingOutcome> {
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| EngineError::not_found("campaign", campaign_id))?;

        if campaign.approved_content.is_empty() {
            debug!(campaign_id = %campaign_id, "No approved content to track");
            return Ok(TrackingOutcome::NoContent);
        }

        let contents = self.store.get_campaign_contents(&campaign.approved_content).await?;
        let performance = compute_performance(&campaign, &contents);

        self.store
            .insert_performance_snapshot(PerformanceSnapshot {
                id: Uuid::new_v4(),
                campaign_id,
                performance: performance.clone(),
                recorded_at: Utc::now(),
            })
            .await?;
        self.store
            .update_campaign(
                campaign_id,
                CampaignPatch {
                    performance: Some(performance.clone()),
                    ..Default::default()
                },
            )
            .await?;

        metrics::counter!("reporting.performance_tracked").increment(1);
        info!(
            campaign_id = %campaign_id,
            content = contents.len(),
            reach = performance.total_reach,
            roi = performance.roi,
            goal_completion = performance.goal_completion,
            "Campaign performance tracked"
        );
        Ok(TrackingOutcome::Tracked { performance })
    }
}

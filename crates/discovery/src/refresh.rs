//! Influencer metrics refresh: engagement rate and campaign history.

use crate::predictor::sample_engagement_rate;
use chrono::Utc;
use influencer_core::store::{CampaignQuery, DocumentStore};
use influencer_core::types::{
    Campaign, CampaignHistoryEntry, CampaignStatus, HistoricalPerformance, Influencer,
};
use influencer_core::{EngineError, EngineResult};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct MetricsRefresher {
    store: Arc<dyn DocumentStore>,
    sample_limit: usize,
}

fn history_entry(campaign: &Campaign, influencer_id: Uuid) -> CampaignHistoryEntry {
    let performance = campaign.performance.as_ref().map(|p| HistoricalPerformance {
        goal_completion_rate: p.goal_completion,
        roi: p.roi,
        engagement_rate: p
            .performance_by_influencer
            .get(&influencer_id)
            .map(|ip| ip.engagement_rate),
    });
    CampaignHistoryEntry {
        campaign_id: campaign.id,
        campaign_name: campaign.name.clone(),
        collaboration_type: campaign.collaboration_type,
        status: campaign.status,
        goal_achieved: campaign.status == CampaignStatus::Completed
            && performance
                .as_ref()
                .map_or(false, |p| p.goal_completion_rate >= 1.0),
        performance,
        completed_at: (campaign.status == CampaignStatus::Completed).then_some(campaign.updated_at),
    }
}

impl MetricsRefresher {
    pub fn new(store: Arc<dyn DocumentStore>, sample_limit: usize) -> Self {
        Self { store, sample_limit }
    }

    /// Recomputes the stored engagement rate and rebuilds the campaign
    /// history of one influencer.
    pub async fn update_influencer_metrics(&self, influencer_id: Uuid) -> EngineResult<Influencer> {
        let mut influencer: Influencer = self
            .store
            .get_influencer(influencer_id)
            .await?
            .ok_or_else(|| EngineError::not_found("influencer", influencer_id))?;

        let samples = self
            .store
            .recent_content_samples(influencer_id, self.sample_limit)
            .await?;
        if !samples.is_empty() {
            influencer.engagement_rate = sample_engagement_rate(&influencer, &samples);
        }

        let campaigns = self
            .store
            .query_campaigns(&CampaignQuery {
                accepted_influencer: Some(influencer_id),
                ..Default::default()
            })
            .await?;
        influencer.campaign_history = campaigns
            .iter()
            .map(|c| history_entry(c, influencer_id))
            .collect();
        influencer.metrics_updated_at = Some(Utc::now());

        self.store.put_influencer(influencer.clone()).await?;
        metrics::counter!("discovery.metrics_refreshed").increment(1);
        info!(
            influencer_id = %influencer_id,
            samples = samples.len(),
            campaigns = influencer.campaign_history.len(),
            engagement_rate = influencer.engagement_rate,
            "Influencer metrics refreshed"
        );
        Ok(influencer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use influencer_core::types::{
        CampaignLink, CampaignPatch, CampaignPerformance, CollaborationType, ContentSample,
        EngagementMetrics, InfluencerPerformance,
    };
    use influencer_core::MemoryStore;
    use std::collections::BTreeMap;

    fn campaign(name: &str) -> Campaign {
        let mut campaign = Campaign::draft(Uuid::new_v4(), name, "brief");
        campaign.collaboration_type = Some(CollaborationType::ProductReview);
        campaign.status = CampaignStatus::Completed;
        campaign
    }

    #[tokio::test]
    async fn test_refresh_rebuilds_rate_and_history() {
        let store = Arc::new(MemoryStore::new());
        let mut influencer = Influencer::new("Ivy");
        influencer.follower_count = 2_000;
        influencer.engagement_rate = 0.01;
        let id = influencer.id;
        store.put_influencer(influencer).await.unwrap();
        store
            .insert_content_sample(ContentSample {
                id: Uuid::new_v4(),
                influencer_id: id,
                caption: None,
                description: None,
                content_type: None,
                posted_at: None,
                reach: Some(1_000),
                engagement_metrics: Some(EngagementMetrics {
                    likes: 80,
                    comments: 15,
                    shares: 5,
                }),
            })
            .await
            .unwrap();

        let achieved = campaign("achieved");
        let achieved_id = achieved.id;
        store.insert_campaign(achieved).await.unwrap();
        store
            .add_campaign_link(achieved_id, CampaignLink::AcceptedInfluencer, id)
            .await
            .unwrap();
        let mut by_influencer = BTreeMap::new();
        by_influencer.insert(
            id,
            InfluencerPerformance {
                engagement_rate: 0.08,
                ..Default::default()
            },
        );
        store
            .update_campaign(
                achieved_id,
                CampaignPatch {
                    performance: Some(CampaignPerformance {
                        goal_completion: 1.0,
                        roi: 0.5,
                        performance_by_influencer: by_influencer,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // A campaign the influencer never joined stays out of the history.
        store.insert_campaign(campaign("unrelated")).await.unwrap();

        let refresher = MetricsRefresher::new(store.clone(), 20);
        let refreshed = refresher.update_influencer_metrics(id).await.unwrap();

        assert!((refreshed.engagement_rate - 0.1).abs() < 1e-9);
        assert_eq!(refreshed.campaign_history.len(), 1);
        let entry = &refreshed.campaign_history[0];
        assert_eq!(entry.campaign_id, achieved_id);
        assert!(entry.goal_achieved);
        assert!(entry.completed_at.is_some());
        let perf = entry.performance.as_ref().unwrap();
        assert_eq!(perf.roi, 0.5);
        assert_eq!(perf.engagement_rate, Some(0.08));

        let stored = store.get_influencer(id).await.unwrap().unwrap();
        assert!(stored.metrics_updated_at.is_some());
    }

    #[tokio::test]
    async fn test_running_campaign_is_not_achieved_yet() {
        let store = Arc::new(MemoryStore::new());
        let influencer = Influencer::new("Ivy");
        let id = influencer.id;
        store.put_influencer(influencer).await.unwrap();

        let mut running = campaign("running");
        running.status = CampaignStatus::InProgress;
        running.performance = Some(CampaignPerformance {
            goal_completion: 1.0,
            ..Default::default()
        });
        let running_id = running.id;
        store.insert_campaign(running).await.unwrap();
        store
            .add_campaign_link(running_id, CampaignLink::AcceptedInfluencer, id)
            .await
            .unwrap();

        let refreshed = MetricsRefresher::new(store, 20)
            .update_influencer_metrics(id)
            .await
            .unwrap();
        let entry = &refreshed.campaign_history[0];
        assert_eq!(entry.status, CampaignStatus::InProgress);
        assert!(!entry.goal_achieved);
        assert!(entry.completed_at.is_none());
        assert_eq!(entry.performance.as_ref().unwrap().goal_completion_rate, 1.0);
    }

    #[tokio::test]
    async fn test_refresh_without_samples_keeps_rate() {
        let store = Arc::new(MemoryStore::new());
        let mut influencer = Influencer::new("Ivy");
        influencer.engagement_rate = 0.033;
        let id = influencer.id;
        store.put_influencer(influencer).await.unwrap();

        let refreshed = MetricsRefresher::new(store, 20)
            .update_influencer_metrics(id)
            .await
            .unwrap();
        assert_eq!(refreshed.engagement_rate, 0.033);
        assert!(refreshed.campaign_history.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_unknown_influencer() {
        let refresher = MetricsRefresher::new(Arc::new(MemoryStore::new()), 20);
        let err = refresher.update_influencer_metrics(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}

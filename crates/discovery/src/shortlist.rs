//! Candidate shortlisting: recommendations ranked with a performance forecast.

use crate::matcher::{InfluencerMatcher, RecommendationRequest};
use crate::predictor::{CollaborationForecast, PerformancePredictor};
use futures::future::join_all;
use influencer_core::store::DocumentStore;
use influencer_core::types::Campaign;
use influencer_core::EngineResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortlistedCandidate {
    pub influencer_id: Uuid,
    pub name: String,
    pub relevance_score: f64,
    pub estimated_reach: u64,
    pub estimated_engagement: u64,
    pub predicted_engagement_rate: f64,
    pub forecast: CollaborationForecast,
}

pub struct CandidateShortlister {
    matcher: Arc<InfluencerMatcher>,
    store: Arc<dyn DocumentStore>,
    predictor: PerformancePredictor,
    sample_limit: usize,
}

impl CandidateShortlister {
    pub fn new(matcher: Arc<InfluencerMatcher>, store: Arc<dyn DocumentStore>, sample_limit: usize) -> Self {
        Self {
            matcher,
            store,
            predictor: PerformancePredictor,
            sample_limit,
        }
    }

    pub async fn shortlist_influencers(
        &self,
        campaign: &Campaign,
        count: usize,
    ) -> EngineResult<Vec<ShortlistedCandidate>> {
        let recommendations = self
            .matcher
            .recommend_influencers(&RecommendationRequest::from(campaign), count)
            .await?;

        let samples = join_all(
            recommendations
                .iter()
                .map(|r| self.store.recent_content_samples(r.influencer.id, self.sample_limit)),
        )
        .await;

        let mut shortlist = Vec::with_capacity(recommendations.len());
        for (rec, samples) in recommendations.into_iter().zip(samples) {
            let samples = samples?;
            let prediction = self.predictor.predict(&rec.influencer, &samples);
            shortlist.push(ShortlistedCandidate {
                influencer_id: rec.influencer.id,
                name: rec.influencer.name,
                relevance_score: rec.relevance_score,
                estimated_reach: rec.estimated_reach,
                estimated_engagement: rec.estimated_engagement,
                predicted_engagement_rate: prediction.average_engagement_rate,
                forecast: prediction.forecast_for(campaign.collaboration_type),
            });
        }

        shortlist.sort_by(|a, b| {
            b.relevance_score.total_cmp(&a.relevance_score).then_with(|| {
                b.forecast
                    .expected_goal_completion
                    .total_cmp(&a.forecast.expected_goal_completion)
            })
        });

        info!(campaign_id = %campaign.id, candidates = shortlist.len(), "Shortlist ready");
        Ok(shortlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use influencer_core::types::{
        CampaignHistoryEntry, CampaignStatus, CollaborationType, HistoricalPerformance, Influencer,
    };
    use influencer_core::MemoryStore;

    fn campaign(collaboration_type: Option<CollaborationType>) -> Campaign {
        let mut campaign = Campaign::draft(Uuid::new_v4(), "Spring drop", "New trainers");
        campaign.categories = vec!["fitness".into()];
        campaign.platforms = vec!["instagram".into()];
        campaign.collaboration_type = collaboration_type;
        campaign
    }

    fn fitness(name: &str, followers: u64, giveaway_goal: Option<f64>) -> Influencer {
        let mut influencer = Influencer::new(name);
        influencer.categories = vec!["fitness".into()];
        influencer.platforms = vec!["instagram".into()];
        influencer.follower_count = followers;
        influencer.engagement_rate = 0.06;
        if let Some(goal) = giveaway_goal {
            influencer.campaign_history = vec![CampaignHistoryEntry {
                campaign_id: Uuid::new_v4(),
                campaign_name: "past".into(),
                collaboration_type: Some(CollaborationType::Giveaway),
                status: CampaignStatus::Completed,
                // Not achieved, so the relevance history bonus stays equal.
                goal_achieved: false,
                performance: Some(HistoricalPerformance {
                    goal_completion_rate: goal,
                    roi: 0.1,
                    engagement_rate: None,
                }),
                completed_at: None,
            }];
        }
        influencer
    }

    #[tokio::test]
    async fn test_equal_relevance_ordered_by_forecast() {
        let store = Arc::new(MemoryStore::new());
        let weak = fitness("weak", 50_000, Some(0.2));
        let strong = fitness("strong", 10_000, Some(0.9));
        let strong_id = strong.id;
        store.put_influencer(weak).await.unwrap();
        store.put_influencer(strong).await.unwrap();

        let matcher = Arc::new(InfluencerMatcher::new(store.clone(), 50));
        let shortlister = CandidateShortlister::new(matcher, store, 20);
        let shortlist = shortlister
            .shortlist_influencers(&campaign(Some(CollaborationType::Giveaway)), 5)
            .await
            .unwrap();

        assert_eq!(shortlist.len(), 2);
        assert_eq!(shortlist[0].relevance_score, shortlist[1].relevance_score);
        assert_eq!(shortlist[0].influencer_id, strong_id);
        assert_eq!(shortlist[0].forecast.campaigns_considered, 1);
        assert_eq!(shortlist[0].forecast.confidence_score, 20.0);
    }

    #[tokio::test]
    async fn test_no_type_uses_overall_forecast() {
        let store = Arc::new(MemoryStore::new());
        store.put_influencer(fitness("solo", 1_000, Some(0.4))).await.unwrap();
        let matcher = Arc::new(InfluencerMatcher::new(store.clone(), 50));
        let shortlister = CandidateShortlister::new(matcher, store, 20);

        let shortlist = shortlister.shortlist_influencers(&campaign(None), 5).await.unwrap();
        assert_eq!(shortlist.len(), 1);
        assert_eq!(shortlist[0].forecast.confidence_score, 10.0);
        assert!((shortlist[0].forecast.expected_goal_completion - 0.4).abs() < 1e-9);
        // No samples: the profile engagement rate stands in.
        assert_eq!(shortlist[0].predicted_engagement_rate, 0.06);
    }
}

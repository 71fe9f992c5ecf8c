//! Performance prediction from an influencer's content and campaign history.

use influencer_core::types::{
    CampaignHistoryEntry, CampaignStatus, CollaborationType, ContentSample, HistoricalPerformance,
    Influencer,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confidence given to a collaboration type with no history of its own.
pub const FALLBACK_TYPE_CONFIDENCE: f64 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationForecast {
    pub expected_goal_completion: f64,
    pub expected_roi: f64,
    pub confidence_score: f64,
    /// Completed campaigns of this type the forecast is based on.
    pub campaigns_considered: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePrediction {
    pub average_engagement_rate: f64,
    pub average_goal_completion: f64,
    pub average_roi: f64,
    pub confidence_score: f64,
    pub completed_campaigns: usize,
    pub by_collaboration_type: BTreeMap<CollaborationType, CollaborationForecast>,
}

impl PerformancePrediction {
    /// Forecast for a collaboration type, or the overall averages when no
    /// type is given.
    pub fn forecast_for(&self, collaboration_type: Option<CollaborationType>) -> CollaborationForecast {
        collaboration_type
            .and_then(|t| self.by_collaboration_type.get(&t).cloned())
            .unwrap_or(CollaborationForecast {
                expected_goal_completion: self.average_goal_completion,
                expected_roi: self.average_roi,
                confidence_score: self.confidence_score,
                campaigns_considered: self.completed_campaigns,
            })
    }
}

fn completed(history: &[CampaignHistoryEntry]) -> Vec<(&CampaignHistoryEntry, &HistoricalPerformance)> {
    history
        .iter()
        .filter(|e| e.status == CampaignStatus::Completed)
        .filter_map(|e| e.performance.as_ref().map(|p| (e, p)))
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Engagement over reach across the samples. A sample without reach counts
/// the influencer's follower count; with no reach at all the profile rate
/// is returned.
pub fn sample_engagement_rate(influencer: &Influencer, samples: &[ContentSample]) -> f64 {
    let mut engagement = 0u64;
    let mut reach = 0u64;
    for sample in samples {
        engagement += sample.engagement();
        reach += sample.reach.unwrap_or(influencer.follower_count);
    }
    if reach == 0 {
        influencer.engagement_rate
    } else {
        engagement as f64 / reach as f64
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerformancePredictor;

impl PerformancePredictor {
    pub fn predict(&self, influencer: &Influencer, samples: &[ContentSample]) -> PerformancePrediction {
        let history = completed(&influencer.campaign_history);
        let average_goal_completion = mean(history.iter().map(|(_, p)| p.goal_completion_rate));
        let average_roi = mean(history.iter().map(|(_, p)| p.roi));

        let by_collaboration_type = CollaborationType::ALL
            .iter()
            .map(|&kind| {
                let of_kind: Vec<_> = history
                    .iter()
                    .filter(|(e, _)| e.collaboration_type == Some(kind))
                    .map(|(_, p)| *p)
                    .collect();
                let forecast = if of_kind.is_empty() {
                    CollaborationForecast {
                        expected_goal_completion: average_goal_completion,
                        expected_roi: average_roi,
                        confidence_score: FALLBACK_TYPE_CONFIDENCE,
                        campaigns_considered: 0,
                    }
                } else {
                    CollaborationForecast {
                        expected_goal_completion: mean(of_kind.iter().map(|p| p.goal_completion_rate)),
                        expected_roi: mean(of_kind.iter().map(|p| p.roi)),
                        confidence_score: (of_kind.len() as f64 * 20.0).min(100.0),
                        campaigns_considered: of_kind.len(),
                    }
                };
                (kind, forecast)
            })
            .collect();

        metrics::counter!("discovery.predictions").increment(1);

        PerformancePrediction {
            average_engagement_rate: sample_engagement_rate(influencer, samples),
            average_goal_completion,
            average_roi,
            confidence_score: (history.len() as f64 * 10.0).min(100.0),
            completed_campaigns: history.len(),
            by_collaboration_type,
        }
    }
}

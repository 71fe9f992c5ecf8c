//! Influencer matching: criteria filtering, relevance scoring and
//! campaign-driven recommendations.

use influencer_core::store::{DocumentStore, InfluencerQuery};
use influencer_core::types::{same_tag, Campaign, Influencer, InfluencerStatus, TargetAudience};
use influencer_core::EngineResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const BASE_SCORE: f64 = 50.0;
const CATEGORY_WEIGHT: f64 = 20.0;
const PLATFORM_WEIGHT: f64 = 15.0;
const MAX_HISTORY_BONUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    FollowerCount,
    EngagementRate,
    RelevanceScore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Country the influencer is based in.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_followers: Option<u64>,
    #[serde(default)]
    pub max_followers: Option<u64>,
    #[serde(default)]
    pub min_engagement_rate: Option<f64>,
    /// Upper bound on the influencer's average post rate.
    #[serde(default)]
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub audience_age_range: Option<String>,
    #[serde(default)]
    pub audience_gender: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedInfluencer {
    #[serde(flatten)]
    pub influencer: Influencer,
    /// Present when the search was sorted by relevance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
}

/// Campaign fields that drive recommendations. Usable before the campaign
/// is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub budget: f64,
}

impl From<&Campaign> for RecommendationRequest {
    fn from(campaign: &Campaign) -> Self {
        Self {
            categories: campaign.categories.clone(),
            platforms: campaign.platforms.clone(),
            target_audience: campaign.target_audience.clone(),
            budget: campaign.budget,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerRecommendation {
    pub influencer: Influencer,
    pub relevance_score: f64,
    pub estimated_reach: u64,
    pub estimated_engagement: u64,
}

fn overlap_ratio(wanted: &[String], have: &[String]) -> f64 {
    if wanted.is_empty() {
        return 0.0;
    }
    let hits = wanted
        .iter()
        .filter(|w| have.iter().any(|h| same_tag(w, h)))
        .count();
    hits as f64 / wanted.len() as f64
}

/// Weighted match quality between criteria and an influencer, in [0, 100].
pub fn relevance_score(criteria: &SearchCriteria, influencer: &Influencer) -> f64 {
    let mut score = BASE_SCORE;

    if !criteria.categories.is_empty() {
        score += CATEGORY_WEIGHT * overlap_ratio(&criteria.categories, &influencer.categories);
    }
    if !criteria.platforms.is_empty() {
        score += PLATFORM_WEIGHT * overlap_ratio(&criteria.platforms, &influencer.platforms);
    }

    if influencer.engagement_rate > 0.05 {
        score += 10.0;
    } else if influencer.engagement_rate > 0.03 {
        score += 5.0;
    }

    let demographics = &influencer.audience_demographics;
    if let (Some(want), Some(have)) = (&criteria.audience_age_range, &demographics.primary_age_range) {
        if same_tag(want, have) {
            score += 10.0;
        }
    }
    if let (Some(want), Some(have)) = (&criteria.audience_gender, &demographics.primary_gender) {
        if same_tag(want, have) {
            score += 5.0;
        }
    }

    let achieved = influencer
        .campaign_history
        .iter()
        .filter(|h| h.goal_achieved)
        .count();
    score += (2.0 * achieved as f64).min(MAX_HISTORY_BONUS);

    score.clamp(0.0, 100.0)
}

/// Whether an influencer satisfies every hard constraint in `criteria`.
/// Numeric bounds are inclusive on both ends.
pub fn passes_filters(criteria: &SearchCriteria, influencer: &Influencer) -> bool {
    if !influencer.is_active() {
        return false;
    }
    if !criteria.categories.is_empty()
        && overlap_ratio(&criteria.categories, &influencer.categories) == 0.0
    {
        return false;
    }
    if !criteria.platforms.is_empty()
        && overlap_ratio(&criteria.platforms, &influencer.platforms) == 0.0
    {
        return false;
    }
    if let Some(country) = &criteria.location {
        match &influencer.location.country {
            Some(have) if same_tag(country, have) => {}
            _ => return false,
        }
    }
    if criteria.min_followers.is_some_and(|min| influencer.follower_count < min) {
        return false;
    }
    if criteria.max_followers.is_some_and(|max| influencer.follower_count > max) {
        return false;
    }
    if criteria
        .min_engagement_rate
        .is_some_and(|min| influencer.engagement_rate < min)
    {
        return false;
    }
    if let (Some(max), Some(rate)) = (criteria.max_budget, influencer.rate_card.average_post_rate) {
        if rate > max {
            return false;
        }
    }
    let demographics = &influencer.audience_demographics;
    if let Some(want) = &criteria.audience_age_range {
        if !demographics
            .primary_age_range
            .as_deref()
            .is_some_and(|have| same_tag(want, have))
        {
            return false;
        }
    }
    if let Some(want) = &criteria.audience_gender {
        if !demographics
            .primary_gender
            .as_deref()
            .is_some_and(|have| same_tag(want, have))
        {
            return false;
        }
    }
    true
}

pub struct InfluencerMatcher {
    store: Arc<dyn DocumentStore>,
    max_results: usize,
}

impl InfluencerMatcher {
    pub fn new(store: Arc<dyn DocumentStore>, max_results: usize) -> Self {
        Self { store, max_results }
    }

    /// Active influencers matching `criteria`, ordered by `criteria.sort_by`.
    pub async fn search(&self, criteria: &SearchCriteria) -> EngineResult<Vec<MatchedInfluencer>> {
        metrics::counter!("discovery.searches").increment(1);
        let candidates = self
            .store
            .query_influencers(&InfluencerQuery {
                status: Some(InfluencerStatus::Active),
                categories_any: criteria.categories.clone(),
                min_followers: criteria.min_followers,
                max_followers: criteria.max_followers,
                ..Default::default()
            })
            .await?;
        let fetched = candidates.len();

        let mut results: Vec<MatchedInfluencer> = candidates
            .into_iter()
            .filter(|i| passes_filters(criteria, i))
            .map(|influencer| {
                let relevance_score = (criteria.sort_by == SortBy::RelevanceScore)
                    .then(|| relevance_score(criteria, &influencer));
                MatchedInfluencer {
                    influencer,
                    relevance_score,
                }
            })
            .collect();

        match criteria.sort_by {
            SortBy::FollowerCount => results.sort_by(|a, b| {
                b.influencer.follower_count.cmp(&a.influencer.follower_count)
            }),
            SortBy::EngagementRate => results.sort_by(|a, b| {
                b.influencer
                    .engagement_rate
                    .total_cmp(&a.influencer.engagement_rate)
            }),
            SortBy::RelevanceScore => results.sort_by(|a, b| {
                b.relevance_score
                    .unwrap_or(0.0)
                    .total_cmp(&a.relevance_score.unwrap_or(0.0))
            }),
        }
        results.truncate(criteria.limit.unwrap_or(self.max_results).min(self.max_results));

        debug!(fetched, returned = results.len(), sort_by = ?criteria.sort_by, "Influencer search");
        Ok(results)
    }

    /// Top `count` influencers for a campaign by relevance. When the strict
    /// search comes up short, a second pass without location and audience
    /// constraints tops the list up.
    pub async fn recommend_influencers(
        &self,
        request: &RecommendationRequest,
        count: usize,
    ) -> EngineResult<Vec<InfluencerRecommendation>> {
        let strict = SearchCriteria {
            categories: request.categories.clone(),
            platforms: request.platforms.clone(),
            location: request.target_audience.location.clone(),
            max_budget: (request.budget > 0.0).then_some(request.budget),
            audience_age_range: request.target_audience.age_range.clone(),
            audience_gender: request.target_audience.gender.clone(),
            sort_by: SortBy::RelevanceScore,
            ..Default::default()
        };

        let mut matches = self.search(&strict).await?;
        if matches.len() < count {
            let relaxed = SearchCriteria {
                location: None,
                audience_age_range: None,
                audience_gender: None,
                ..strict.clone()
            };
            let mut seen: HashSet<Uuid> = matches.iter().map(|m| m.influencer.id).collect();
            let extra: Vec<MatchedInfluencer> = self
                .search(&relaxed)
                .await?
                .into_iter()
                .filter(|m| seen.insert(m.influencer.id))
                .collect();
            debug!(strict = matches.len(), added = extra.len(), "Relaxed recommendation search");
            matches.extend(extra);
        }

        // Score everything against the strict criteria so relaxed matches
        // don't get credit for the audience fields they were excused from.
        let mut recommendations: Vec<InfluencerRecommendation> = matches
            .into_iter()
            .map(|m| {
                let score = relevance_score(&strict, &m.influencer);
                let followers = m.influencer.follower_count;
                let estimated_engagement =
                    (followers as f64 * m.influencer.engagement_rate).round() as u64;
                InfluencerRecommendation {
                    influencer: m.influencer,
                    relevance_score: score,
                    estimated_reach: followers,
                    estimated_engagement,
                }
            })
            .collect();
        recommendations.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        recommendations.truncate(count);

        info!(requested = count, returned = recommendations.len(), "Influencer recommendations ready");
        Ok(recommendations)
    }
}

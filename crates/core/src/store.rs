//! Document store seam and its in-memory implementation.
//!
//! Components receive an `Arc<dyn DocumentStore>` built once at process
//! start. `MemoryStore` backs development and tests; a managed document
//! database plugs in behind the same trait.

use crate::error::{EngineError, EngineResult};
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::cmp::Reverse;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InfluencerOrder {
    /// Largest follower count first.
    #[default]
    FollowersDesc,
    /// Never-refreshed first, then oldest `metricsUpdatedAt`.
    StalestMetricsFirst,
}

/// Filter for the `influencers` collection. Empty fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct InfluencerQuery {
    pub status: Option<InfluencerStatus>,
    /// Array-contains-any over `categories`, compared with [`same_tag`].
    pub categories_any: Vec<String>,
    pub min_followers: Option<u64>,
    pub max_followers: Option<u64>,
    pub order: InfluencerOrder,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CampaignOrder {
    /// Newest `createdAt` first.
    #[default]
    NewestFirst,
    /// Never-tracked first, then oldest `performanceUpdatedAt`.
    StalestPerformanceFirst,
}

/// Filter for the `influencerCampaigns` collection.
#[derive(Debug, Clone, Default)]
pub struct CampaignQuery {
    pub status: Option<CampaignStatus>,
    pub brand_id: Option<Uuid>,
    pub accepted_influencer: Option<Uuid>,
    pub order: CampaignOrder,
    pub limit: Option<usize>,
}

/// A single-document change to a collaboration request, applied by the store
/// under its own lock.
#[derive(Debug, Clone)]
pub enum RequestChange {
    /// Appends to the negotiation history and moves the request to
    /// `negotiating`.
    CounterOffer { offer: CounterOffer, at: DateTime<Utc> },
    /// Records the influencer's accept or decline.
    Decision {
        status: RequestStatus,
        message: Option<String>,
        at: DateTime<Utc>,
    },
}

impl RequestChange {
    pub fn target_status(&self) -> RequestStatus {
        match self {
            Self::CounterOffer { .. } => RequestStatus::Negotiating,
            Self::Decision { status, .. } => *status,
        }
    }

    fn apply(self, request: &mut CollaborationRequest) {
        match self {
            Self::CounterOffer { offer, at } => {
                request.negotiation_history.push(NegotiationEntry {
                    timestamp: at,
                    offered_by: offer.offered_by,
                    terms: offer.terms.clone(),
                });
                request.status = RequestStatus::Negotiating;
                request.counter_offer = Some(offer);
                request.updated_at = at;
            }
            Self::Decision { status, message, at } => {
                request.status = status;
                request.message = message;
                request.responded_at = Some(at);
                request.updated_at = at;
            }
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // influencers
    async fn get_influencer(&self, id: Uuid) -> EngineResult<Option<Influencer>>;
    async fn put_influencer(&self, influencer: Influencer) -> EngineResult<()>;
    /// Ordered by `query.order`.
    async fn query_influencers(&self, query: &InfluencerQuery) -> EngineResult<Vec<Influencer>>;

    // influencerContent
    async fn insert_content_sample(&self, sample: ContentSample) -> EngineResult<()>;
    /// Most recent first; samples without `postedAt` sort last.
    async fn recent_content_samples(
        &self,
        influencer_id: Uuid,
        limit: usize,
    ) -> EngineResult<Vec<ContentSample>>;

    // influencerCampaigns
    async fn insert_campaign(&self, campaign: Campaign) -> EngineResult<()>;
    async fn get_campaign(&self, id: Uuid) -> EngineResult<Option<Campaign>>;
    /// Merges `patch` into the campaign. When `patch.expected_status` is set
    /// and no longer matches, fails with `InvalidTransition` without writing.
    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> EngineResult<Campaign>;
    /// Ordered by `query.order`.
    async fn query_campaigns(&self, query: &CampaignQuery) -> EngineResult<Vec<Campaign>>;
    /// Adds a join row. Returns `false` when the row already existed.
    async fn add_campaign_link(
        &self,
        campaign_id: Uuid,
        link: CampaignLink,
        target: Uuid,
    ) -> EngineResult<bool>;
    /// Removes a join row. Returns `false` when there was nothing to remove.
    async fn remove_campaign_link(
        &self,
        campaign_id: Uuid,
        link: CampaignLink,
        target: Uuid,
    ) -> EngineResult<bool>;

    // collaborationRequests
    async fn insert_collaboration_request(&self, request: CollaborationRequest) -> EngineResult<()>;
    async fn get_collaboration_request(&self, id: Uuid) -> EngineResult<Option<CollaborationRequest>>;
    async fn put_collaboration_request(&self, request: CollaborationRequest) -> EngineResult<()>;
    /// Applies `change` only while the stored status is still `expected`.
    /// Otherwise fails with `InvalidTransition` and leaves the request as is.
    async fn update_collaboration_request(
        &self,
        id: Uuid,
        expected: RequestStatus,
        change: RequestChange,
    ) -> EngineResult<CollaborationRequest>;

    // campaignContent
    async fn insert_campaign_content(&self, content: CampaignContent) -> EngineResult<()>;
    async fn get_campaign_content(&self, id: Uuid) -> EngineResult<Option<CampaignContent>>;
    async fn put_campaign_content(&self, content: CampaignContent) -> EngineResult<()>;
    /// Fetches the given ids in order, skipping ids with no document.
    async fn get_campaign_contents(&self, ids: &[Uuid]) -> EngineResult<Vec<CampaignContent>>;

    // campaignPerformance
    async fn insert_performance_snapshot(&self, snapshot: PerformanceSnapshot) -> EngineResult<()>;
    async fn performance_snapshots(&self, campaign_id: Uuid) -> EngineResult<Vec<PerformanceSnapshot>>;

    // campaignReports
    async fn insert_report(&self, report: CampaignReport) -> EngineResult<()>;
    async fn get_report(&self, id: Uuid) -> EngineResult<Option<CampaignReport>>;
    async fn reports_for_campaign(&self, campaign_id: Uuid) -> EngineResult<Vec<CampaignReport>>;

    // influencerNotifications / brandNotifications
    async fn insert_notification(&self, notification: Notification) -> EngineResult<()>;
    async fn notifications_for(&self, recipient: Party, recipient_id: Uuid) -> EngineResult<Vec<Notification>>;
}

/// Join rows for one campaign, one ordered set per link kind.
#[derive(Debug, Clone, Default)]
struct CampaignLinks {
    collaboration_requests: Vec<Uuid>,
    accepted_influencers: Vec<Uuid>,
    content_submissions: Vec<Uuid>,
    approved_content: Vec<Uuid>,
}

impl CampaignLinks {
    fn list_mut(&mut self, link: CampaignLink) -> &mut Vec<Uuid> {
        match link {
            CampaignLink::CollaborationRequest => &mut self.collaboration_requests,
            CampaignLink::AcceptedInfluencer => &mut self.accepted_influencers,
            CampaignLink::ContentSubmission => &mut self.content_submissions,
            CampaignLink::ApprovedContent => &mut self.approved_content,
        }
    }

    fn hydrate(&self, campaign: &mut Campaign) {
        campaign.collaboration_requests = self.collaboration_requests.clone();
        campaign.accepted_influencers = self.accepted_influencers.clone();
        campaign.content_submissions = self.content_submissions.clone();
        campaign.approved_content = self.approved_content.clone();
    }
}

/// Thread-safe in-memory document store backed by DashMap.
pub struct MemoryStore {
    influencers: DashMap<Uuid, Influencer>,
    content_samples: DashMap<Uuid, ContentSample>,
    campaigns: DashMap<Uuid, Campaign>,
    campaign_links: DashMap<Uuid, CampaignLinks>,
    requests: DashMap<Uuid, CollaborationRequest>,
    contents: DashMap<Uuid, CampaignContent>,
    snapshots: DashMap<Uuid, PerformanceSnapshot>,
    reports: DashMap<Uuid, CampaignReport>,
    influencer_notifications: DashMap<Uuid, Notification>,
    brand_notifications: DashMap<Uuid, Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("Document store initialized (in-memory)");
        Self {
            influencers: DashMap::new(),
            content_samples: DashMap::new(),
            campaigns: DashMap::new(),
            campaign_links: DashMap::new(),
            requests: DashMap::new(),
            contents: DashMap::new(),
            snapshots: DashMap::new(),
            reports: DashMap::new(),
            influencer_notifications: DashMap::new(),
            brand_notifications: DashMap::new(),
        }
    }

    fn hydrated(&self, mut campaign: Campaign) -> Campaign {
        if let Some(links) = self.campaign_links.get(&campaign.id) {
            links.hydrate(&mut campaign);
        }
        campaign
    }

    fn notifications(&self, recipient: Party) -> &DashMap<Uuid, Notification> {
        match recipient {
            Party::Influencer => &self.influencer_notifications,
            Party::Brand => &self.brand_notifications,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_influencer(&self, id: Uuid) -> EngineResult<Option<Influencer>> {
        Ok(self.influencers.get(&id).map(|r| r.value().clone()))
    }

    async fn put_influencer(&self, influencer: Influencer) -> EngineResult<()> {
        self.influencers.insert(influencer.id, influencer);
        Ok(())
    }

    async fn query_influencers(&self, query: &InfluencerQuery) -> EngineResult<Vec<Influencer>> {
        let mut matches: Vec<Influencer> = self
            .influencers
            .iter()
            .filter(|r| {
                let i = r.value();
                query.status.map_or(true, |s| i.status == s)
                    && (query.categories_any.is_empty()
                        || i.categories
                            .iter()
                            .any(|c| query.categories_any.iter().any(|q| same_tag(c, q))))
                    && query.min_followers.map_or(true, |min| i.follower_count >= min)
                    && query.max_followers.map_or(true, |max| i.follower_count <= max)
            })
            .map(|r| r.value().clone())
            .collect();
        match query.order {
            InfluencerOrder::FollowersDesc => {
                matches.sort_by_key(|i| (Reverse(i.follower_count), i.id))
            }
            // `None` sorts below every `Some`.
            InfluencerOrder::StalestMetricsFirst => matches.sort_by_key(|i| (i.metrics_updated_at, i.id)),
        }
        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        debug!(results = matches.len(), "Influencer query");
        Ok(matches)
    }

    async fn insert_content_sample(&self, sample: ContentSample) -> EngineResult<()> {
        if self.content_samples.contains_key(&sample.id) {
            return Err(EngineError::Persistence(format!(
                "content sample {} already exists",
                sample.id
            )));
        }
        self.content_samples.insert(sample.id, sample);
        Ok(())
    }

    async fn recent_content_samples(
        &self,
        influencer_id: Uuid,
        limit: usize,
    ) -> EngineResult<Vec<ContentSample>> {
        let mut samples: Vec<ContentSample> = self
            .content_samples
            .iter()
            .filter(|r| r.value().influencer_id == influencer_id)
            .map(|r| r.value().clone())
            .collect();
        // `None` sorts below every `Some`, so undated samples land last.
        samples.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then(a.id.cmp(&b.id)));
        samples.truncate(limit);
        Ok(samples)
    }

    async fn insert_campaign(&self, campaign: Campaign) -> EngineResult<()> {
        let id = campaign.id;
        let mut links = CampaignLinks::default();
        for (link, ids) in [
            (CampaignLink::CollaborationRequest, &campaign.collaboration_requests),
            (CampaignLink::AcceptedInfluencer, &campaign.accepted_influencers),
            (CampaignLink::ContentSubmission, &campaign.content_submissions),
            (CampaignLink::ApprovedContent, &campaign.approved_content),
        ] {
            let list = links.list_mut(link);
            for target in ids {
                if !list.contains(target) {
                    list.push(*target);
                }
            }
        }
        self.campaign_links.insert(id, links);
        self.campaigns.insert(id, campaign);
        Ok(())
    }

    async fn get_campaign(&self, id: Uuid) -> EngineResult<Option<Campaign>> {
        let campaign = self.campaigns.get(&id).map(|r| r.value().clone());
        Ok(campaign.map(|c| self.hydrated(c)))
    }

    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> EngineResult<Campaign> {
        let updated = {
            let mut entry = self
                .campaigns
                .get_mut(&id)
                .ok_or_else(|| EngineError::not_found("campaign", id))?;
            let c = entry.value_mut();
            if let Some(expected) = patch.expected_status {
                if c.status != expected {
                    return Err(EngineError::InvalidTransition {
                        entity: "campaign",
                        from: c.status.to_string(),
                        to: patch.status.unwrap_or(c.status).to_string(),
                    });
                }
            }
            if let Some(status) = patch.status {
                c.status = status;
            }
            if let Some(performance) = patch.performance {
                c.performance = Some(performance);
                c.performance_updated_at = Some(Utc::now());
            }
            if let Some(report_id) = patch.report_id {
                c.report_id = Some(report_id);
            }
            c.updated_at = Utc::now();
            c.clone()
        };
        Ok(self.hydrated(updated))
    }

    async fn query_campaigns(&self, query: &CampaignQuery) -> EngineResult<Vec<Campaign>> {
        let mut matches: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| {
                let c = r.value();
                query.status.map_or(true, |s| c.status == s)
                    && query.brand_id.map_or(true, |b| c.brand_id == b)
            })
            .map(|r| self.hydrated(r.value().clone()))
            .filter(|c| {
                query
                    .accepted_influencer
                    .map_or(true, |i| c.accepted_influencers.contains(&i))
            })
            .collect();
        match query.order {
            CampaignOrder::NewestFirst => {
                matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)))
            }
            CampaignOrder::StalestPerformanceFirst => {
                matches.sort_by_key(|c| (c.performance_updated_at, c.id))
            }
        }
        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn add_campaign_link(
        &self,
        campaign_id: Uuid,
        link: CampaignLink,
        target: Uuid,
    ) -> EngineResult<bool> {
        if !self.campaigns.contains_key(&campaign_id) {
            return Err(EngineError::not_found("campaign", campaign_id));
        }
        let mut links = self.campaign_links.entry(campaign_id).or_default();
        let list = links.list_mut(link);
        if list.contains(&target) {
            return Ok(false);
        }
        list.push(target);
        Ok(true)
    }

    async fn remove_campaign_link(
        &self,
        campaign_id: Uuid,
        link: CampaignLink,
        target: Uuid,
    ) -> EngineResult<bool> {
        let Some(mut links) = self.campaign_links.get_mut(&campaign_id) else {
            return Ok(false);
        };
        let list = links.list_mut(link);
        let before = list.len();
        list.retain(|id| *id != target);
        Ok(list.len() != before)
    }

    async fn insert_collaboration_request(&self, request: CollaborationRequest) -> EngineResult<()> {
        self.requests.insert(request.id, request);
        Ok(())
    }

    async fn get_collaboration_request(&self, id: Uuid) -> EngineResult<Option<CollaborationRequest>> {
        Ok(self.requests.get(&id).map(|r| r.value().clone()))
    }

    async fn put_collaboration_request(&self, request: CollaborationRequest) -> EngineResult<()> {
        self.requests.insert(request.id, request);
        Ok(())
    }

    async fn update_collaboration_request(
        &self,
        id: Uuid,
        expected: RequestStatus,
        change: RequestChange,
    ) -> EngineResult<CollaborationRequest> {
        let mut entry = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("collaboration request", id))?;
        let request = entry.value_mut();
        if request.status != expected {
            return Err(EngineError::InvalidTransition {
                entity: "collaboration request",
                from: request.status.to_string(),
                to: change.target_status().to_string(),
            });
        }
        change.apply(request);
        Ok(request.clone())
    }

    async fn insert_campaign_content(&self, content: CampaignContent) -> EngineResult<()> {
        self.contents.insert(content.id, content);
        Ok(())
    }

    async fn get_campaign_content(&self, id: Uuid) -> EngineResult<Option<CampaignContent>> {
        Ok(self.contents.get(&id).map(|r| r.value().clone()))
    }

    async fn put_campaign_content(&self, content: CampaignContent) -> EngineResult<()> {
        self.contents.insert(content.id, content);
        Ok(())
    }

    async fn get_campaign_contents(&self, ids: &[Uuid]) -> EngineResult<Vec<CampaignContent>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.contents.get(id).map(|r| r.value().clone()))
            .collect())
    }

    async fn insert_performance_snapshot(&self, snapshot: PerformanceSnapshot) -> EngineResult<()> {
        self.snapshots.insert(snapshot.id, snapshot);
        Ok(())
    }

    async fn performance_snapshots(&self, campaign_id: Uuid) -> EngineResult<Vec<PerformanceSnapshot>> {
        let mut snapshots: Vec<PerformanceSnapshot> = self
            .snapshots
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        snapshots.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(snapshots)
    }

    async fn insert_report(&self, report: CampaignReport) -> EngineResult<()> {
        self.reports.insert(report.id, report);
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> EngineResult<Option<CampaignReport>> {
        Ok(self.reports.get(&id).map(|r| r.value().clone()))
    }

    async fn reports_for_campaign(&self, campaign_id: Uuid) -> EngineResult<Vec<CampaignReport>> {
        let mut reports: Vec<CampaignReport> = self
            .reports
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        reports.sort_by(|a, b| a.generated_at.cmp(&b.generated_at));
        Ok(reports)
    }

    async fn insert_notification(&self, notification: Notification) -> EngineResult<()> {
        self.notifications(notification.recipient)
            .insert(notification.id, notification);
        Ok(())
    }

    async fn notifications_for(&self, recipient: Party, recipient_id: Uuid) -> EngineResult<Vec<Notification>> {
        let mut list: Vec<Notification> = self
            .notifications(recipient)
            .iter()
            .filter(|r| r.value().recipient_id == recipient_id)
            .map(|r| r.value().clone())
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn campaign(brand_id: Uuid) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            brand_id,
            name: "Spring launch".into(),
            brief: "Launch the spring line".into(),
            categories: vec!["fitness".into()],
            platforms: vec!["instagram".into()],
            target_audience: TargetAudience::default(),
            budget: 1000.0,
            conversion_value: 50.0,
            goals: Default::default(),
            collaboration_type: None,
            status: CampaignStatus::Draft,
            collaboration_requests: Vec::new(),
            accepted_influencers: Vec::new(),
            content_submissions: Vec::new(),
            approved_content: Vec::new(),
            performance: None,
            performance_updated_at: None,
            report_id: None,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_campaign_links_have_set_semantics() {
        let store = MemoryStore::new();
        let c = campaign(Uuid::new_v4());
        let id = c.id;
        store.insert_campaign(c).await.unwrap();

        let content = Uuid::new_v4();
        assert!(store
            .add_campaign_link(id, CampaignLink::ApprovedContent, content)
            .await
            .unwrap());
        assert!(!store
            .add_campaign_link(id, CampaignLink::ApprovedContent, content)
            .await
            .unwrap());

        let loaded = store.get_campaign(id).await.unwrap().unwrap();
        assert_eq!(loaded.approved_content, vec![content]);

        assert!(store
            .remove_campaign_link(id, CampaignLink::ApprovedContent, content)
            .await
            .unwrap());
        let loaded = store.get_campaign(id).await.unwrap().unwrap();
        assert!(loaded.approved_content.is_empty());
    }

    #[tokio::test]
    async fn test_link_on_missing_campaign_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .add_campaign_link(Uuid::new_v4(), CampaignLink::AcceptedInfluencer, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_patch_merges_fields() {
        let store = MemoryStore::new();
        let c = campaign(Uuid::new_v4());
        let id = c.id;
        store.insert_campaign(c).await.unwrap();
        store
            .add_campaign_link(id, CampaignLink::AcceptedInfluencer, Uuid::new_v4())
            .await
            .unwrap();

        let updated = store
            .update_campaign(
                id,
                CampaignPatch {
                    status: Some(CampaignStatus::PendingApproval),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, CampaignStatus::PendingApproval);
        assert_eq!(updated.budget, 1000.0);
        assert_eq!(updated.accepted_influencers.len(), 1);
        assert!(updated.performance.is_none());
    }

    #[tokio::test]
    async fn test_query_influencers_filters_and_orders() {
        let store = MemoryStore::new();
        let mut small = Influencer::new("small");
        small.follower_count = 1_000;
        small.categories = vec!["beauty".into()];
        let mut big = Influencer::new("big");
        big.follower_count = 90_000;
        big.categories = vec!["fitness".into(), "food".into()];
        let mut inactive = Influencer::new("inactive");
        inactive.status = InfluencerStatus::Inactive;
        inactive.categories = vec!["fitness".into()];
        for i in [small, big, inactive] {
            store.put_influencer(i).await.unwrap();
        }

        let all_active = store
            .query_influencers(&InfluencerQuery {
                status: Some(InfluencerStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all_active.len(), 2);
        assert_eq!(all_active[0].name, "big");

        let fitness = store
            .query_influencers(&InfluencerQuery {
                status: Some(InfluencerStatus::Active),
                categories_any: vec!["fitness".into(), "travel".into()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(fitness.len(), 1);
        assert_eq!(fitness[0].name, "big");
    }

    #[tokio::test]
    async fn test_recent_samples_newest_first() {
        let store = MemoryStore::new();
        let influencer_id = Uuid::new_v4();
        let now = Utc::now();
        for (days, caption) in [(3, "old"), (1, "new"), (2, "mid")] {
            store
                .insert_content_sample(ContentSample {
                    id: Uuid::new_v4(),
                    influencer_id,
                    caption: Some(caption.into()),
                    description: None,
                    content_type: Some(ContentType::Photo),
                    posted_at: Some(now - Duration::days(days)),
                    reach: None,
                    engagement_metrics: None,
                })
                .await
                .unwrap();
        }
        let samples = store.recent_content_samples(influencer_id, 2).await.unwrap();
        let captions: Vec<_> = samples.iter().filter_map(|s| s.caption.as_deref()).collect();
        assert_eq!(captions, vec!["new", "mid"]);
    }

    #[tokio::test]
    async fn test_campaign_query_by_accepted_influencer() {
        let store = MemoryStore::new();
        let influencer = Uuid::new_v4();
        let a = campaign(Uuid::new_v4());
        let b = campaign(Uuid::new_v4());
        let a_id = a.id;
        store.insert_campaign(a).await.unwrap();
        store.insert_campaign(b).await.unwrap();
        store
            .add_campaign_link(a_id, CampaignLink::AcceptedInfluencer, influencer)
            .await
            .unwrap();

        let found = store
            .query_campaigns(&CampaignQuery {
                accepted_influencer: Some(influencer),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a_id);
    }
    #[tokio::test]
    async fn test_category_filter_ignores_case() {
        let store = MemoryStore::new();
        let mut tagged = Influencer::new("tagged");
        tagged.categories = vec!["Fitness ".into()];
        store.put_influencer(tagged).await.unwrap();

        let found = store
            .query_influencers(&InfluencerQuery {
                categories_any: vec!["fitness".into()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_stalest_influencers_first() {
        let store = MemoryStore::new();
        let mut fresh = Influencer::new("fresh");
        fresh.follower_count = 50_000;
        fresh.metrics_updated_at = Some(Utc::now());
        let mut stale = Influencer::new("stale");
        stale.follower_count = 20_000;
        stale.metrics_updated_at = Some(Utc::now() - Duration::days(2));
        let mut never = Influencer::new("never");
        never.follower_count = 10;
        for i in [fresh, stale, never] {
            store.put_influencer(i).await.unwrap();
        }

        let ordered = store
            .query_influencers(&InfluencerQuery {
                order: InfluencerOrder::StalestMetricsFirst,
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = ordered.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["never", "stale", "fresh"]);
    }

    #[tokio::test]
    async fn test_campaign_patch_checks_expected_status() {
        let store = MemoryStore::new();
        let c = campaign(Uuid::new_v4());
        let id = c.id;
        store.insert_campaign(c).await.unwrap();

        let err = store
            .update_campaign(
                id,
                CampaignPatch {
                    expected_status: Some(CampaignStatus::InProgress),
                    status: Some(CampaignStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        let stored = store.get_campaign(id).await.unwrap().unwrap();
        assert_eq!(stored.status, CampaignStatus::Draft);

        let updated = store
            .update_campaign(
                id,
                CampaignPatch {
                    expected_status: Some(CampaignStatus::Draft),
                    status: Some(CampaignStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, CampaignStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_request_change_is_compare_and_set() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let request = CollaborationRequest {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            influencer_id: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            status: RequestStatus::Pending,
            compensation: None,
            requirements: None,
            deadline: None,
            counter_offer: None,
            negotiation_history: Vec::new(),
            message: None,
            created_at: now,
            updated_at: now,
            responded_at: None,
        };
        let id = request.id;
        store.insert_collaboration_request(request).await.unwrap();

        let offer = CounterOffer {
            offered_by: Party::Brand,
            terms: Default::default(),
        };
        let updated = store
            .update_collaboration_request(
                id,
                RequestStatus::Pending,
                RequestChange::CounterOffer { offer, at: now },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Negotiating);
        assert_eq!(updated.negotiation_history.len(), 1);

        // A writer still holding the `pending` read is refused.
        let err = store
            .update_collaboration_request(
                id,
                RequestStatus::Pending,
                RequestChange::Decision {
                    status: RequestStatus::Declined,
                    message: None,
                    at: now,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        let stored = store.get_collaboration_request(id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Negotiating);
        assert!(stored.responded_at.is_none());
    }
}

//! Store wrapper that suspends after every campaign and request read, so
//! `tokio::join!`ed operations interleave between read and write.

use async_trait::async_trait;
use influencer_core::store::{CampaignQuery, DocumentStore, InfluencerQuery, RequestChange};
use influencer_core::types::*;
use influencer_core::{EngineResult, MemoryStore};
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct YieldingStore(pub MemoryStore);

#[async_trait]
impl DocumentStore for YieldingStore {
    async fn get_influencer(&self, id: Uuid) -> EngineResult<Option<Influencer>> {
        self.0.get_influencer(id).await
    }

    async fn put_influencer(&self, influencer: Influencer) -> EngineResult<()> {
        self.0.put_influencer(influencer).await
    }

    async fn query_influencers(&self, query: &InfluencerQuery) -> EngineResult<Vec<Influencer>> {
        self.0.query_influencers(query).await
    }

    async fn insert_content_sample(&self, sample: ContentSample) -> EngineResult<()> {
        self.0.insert_content_sample(sample).await
    }

    async fn recent_content_samples(
        &self,
        influencer_id: Uuid,
        limit: usize,
    ) -> EngineResult<Vec<ContentSample>> {
        self.0.recent_content_samples(influencer_id, limit).await
    }

    async fn insert_campaign(&self, campaign: Campaign) -> EngineResult<()> {
        self.0.insert_campaign(campaign).await
    }

    async fn get_campaign(&self, id: Uuid) -> EngineResult<Option<Campaign>> {
        let campaign = self.0.get_campaign(id).await;
        tokio::task::yield_now().await;
        campaign
    }

    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> EngineResult<Campaign> {
        self.0.update_campaign(id, patch).await
    }

    async fn query_campaigns(&self, query: &CampaignQuery) -> EngineResult<Vec<Campaign>> {
        self.0.query_campaigns(query).await
    }

    async fn add_campaign_link(
        &self,
        campaign_id: Uuid,
        link: CampaignLink,
        target: Uuid,
    ) -> EngineResult<bool> {
        self.0.add_campaign_link(campaign_id, link, target).await
    }

    async fn remove_campaign_link(
        &self,
        campaign_id: Uuid,
        link: CampaignLink,
        target: Uuid,
    ) -> EngineResult<bool> {
        self.0.remove_campaign_link(campaign_id, link, target).await
    }

    async fn insert_collaboration_request(&self, request: CollaborationRequest) -> EngineResult<()> {
        self.0.insert_collaboration_request(request).await
    }

    async fn get_collaboration_request(&self, id: Uuid) -> EngineResult<Option<CollaborationRequest>> {
        let request = self.0.get_collaboration_request(id).await;
        tokio::task::yield_now().await;
        request
    }

    async fn put_collaboration_request(&self, request: CollaborationRequest) -> EngineResult<()> {
        self.0.put_collaboration_request(request).await
    }

    async fn update_collaboration_request(
        &self,
        id: Uuid,
        expected: RequestStatus,
        change: RequestChange,
    ) -> EngineResult<CollaborationRequest> {
        self.0.update_collaboration_request(id, expected, change).await
    }

    async fn insert_campaign_content(&self, content: CampaignContent) -> EngineResult<()> {
        self.0.insert_campaign_content(content).await
    }

    async fn get_campaign_content(&self, id: Uuid) -> EngineResult<Option<CampaignContent>> {
        self.0.get_campaign_content(id).await
    }

    async fn put_campaign_content(&self, content: CampaignContent) -> EngineResult<()> {
        self.0.put_campaign_content(content).await
    }

    async fn get_campaign_contents(&self, ids: &[Uuid]) -> EngineResult<Vec<CampaignContent>> {
        self.0.get_campaign_contents(ids).await
    }

    async fn insert_performance_snapshot(&self, snapshot: PerformanceSnapshot) -> EngineResult<()> {
        self.0.insert_performance_snapshot(snapshot).await
    }

    async fn performance_snapshots(&self, campaign_id: Uuid) -> EngineResult<Vec<PerformanceSnapshot>> {
        self.0.performance_snapshots(campaign_id).await
    }

    async fn insert_report(&self, report: CampaignReport) -> EngineResult<()> {
        self.0.insert_report(report).await
    }

    async fn get_report(&self, id: Uuid) -> EngineResult<Option<CampaignReport>> {
        self.0.get_report(id).await
    }

    async fn reports_for_campaign(&self, campaign_id: Uuid) -> EngineResult<Vec<CampaignReport>> {
        self.0.reports_for_campaign(campaign_id).await
    }

    async fn insert_notification(&self, notification: Notification) -> EngineResult<()> {
        self.0.insert_notification(notification).await
    }

    async fn notifications_for(&self, recipient: Party, recipient_id: Uuid) -> EngineResult<Vec<Notification>> {
        self.0.notifications_for(recipient, recipient_id).await
    }
}

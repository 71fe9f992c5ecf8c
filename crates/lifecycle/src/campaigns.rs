//! Campaign lifecycle: campaign creation, collaboration requests, content
//! submission and review, and campaign status transitions.

use crate::state_machine::{apply_request_change, check_campaign_transition};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use influencer_core::event_bus::{DomainEvent, EventSink};
use influencer_core::store::{DocumentStore, RequestChange};
use influencer_core::types::{
    Campaign, CampaignContent, CampaignLink, CampaignPatch, CampaignStatus, CollaborationRequest,
    CollaborationType, ContentStatus, ContentType, GoalMetric, RequestStatus, TargetAudience,
};
use influencer_core::{EngineError, EngineResult};
use influencer_reporting::ReportGenerator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

// ─── Inputs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCampaign {
    pub brand_id: Option<Uuid>,
    pub name: Option<String>,
    pub brief: Option<String>,
    pub categories: Vec<String>,
    pub platforms: Vec<String>,
    pub target_audience: TargetAudience,
    pub budget: f64,
    pub conversion_value: f64,
    pub goals: BTreeMap<GoalMetric, f64>,
    pub collaboration_type: Option<CollaborationType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Influencers to invite right away, one request each.
    pub influencers: Vec<Uuid>,
    pub compensation: Option<f64>,
    pub requirements: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCollaborationRequest {
    pub campaign_id: Option<Uuid>,
    pub influencer_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub compensation: Option<f64>,
    pub requirements: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewContent {
    pub content_url: Option<String>,
    pub content_type: Option<ContentType>,
    pub caption: Option<String>,
}

/// A created campaign and the invitations that could not be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCreated {
    pub campaign: Campaign,
    pub failed_invitations: Vec<Uuid>,
}

fn required<T>(value: Option<T>, field: &str) -> EngineResult<T> {
    value.ok_or_else(|| EngineError::missing_field(field))
}

fn required_text(value: Option<String>, field: &str) -> EngineResult<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(EngineError::missing_field(field)),
    }
}

// ─── Manager ────────────────────────────────────────────────────────────────

pub struct CampaignManager {
    store: Arc<dyn DocumentStore>,
    events: Arc<dyn EventSink>,
    reporter: Arc<ReportGenerator>,
}

impl CampaignManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        events: Arc<dyn EventSink>,
        reporter: Arc<ReportGenerator>,
    ) -> Self {
        Self {
            store,
            events,
            reporter,
        }
    }

    async fn load_campaign(&self, id: Uuid) -> EngineResult<Campaign> {
        self.store
            .get_campaign(id)
            .await?
            .ok_or_else(|| EngineError::not_found("campaign", id))
    }

    /// Creates a draft campaign and invites the listed influencers. The
    /// invitations run concurrently; one failing leaves the others in place.
    pub async fn create_campaign(&self, input: NewCampaign) -> EngineResult<CampaignCreated> {
        let brand_id = required(input.brand_id, "brandId")?;
        let name = required_text(input.name, "name")?;
        let brief = required_text(input.brief, "brief")?;

        let mut campaign = Campaign::draft(brand_id, name, brief);
        campaign.categories = input.categories;
        campaign.platforms = input.platforms;
        campaign.target_audience = input.target_audience;
        campaign.budget = input.budget;
        campaign.conversion_value = input.conversion_value;
        campaign.goals = input.goals;
        campaign.collaboration_type = input.collaboration_type;
        campaign.start_date = input.start_date;
        campaign.end_date = input.end_date;
        let campaign_id = campaign.id;

        self.store.insert_campaign(campaign).await?;
        metrics::counter!("lifecycle.campaigns_created").increment(1);
        info!(campaign_id = %campaign_id, brand_id = %brand_id, invitations = input.influencers.len(), "Campaign created");

        let results = join_all(input.influencers.iter().map(|influencer_id| {
            self.create_collaboration_request(NewCollaborationRequest {
                campaign_id: Some(campaign_id),
                influencer_id: Some(*influencer_id),
                brand_id: Some(brand_id),
                compensation: input.compensation,
                requirements: input.requirements.clone(),
                deadline: input.deadline,
            })
        }))
        .await;

        let mut failed_invitations = Vec::new();
        for (influencer_id, result) in input.influencers.iter().zip(results) {
            if let Err(e) = result {
                warn!(campaign_id = %campaign_id, influencer_id = %influencer_id, error = %e, "Invitation failed");
                failed_invitations.push(*influencer_id);
            }
        }

        Ok(CampaignCreated {
            campaign: self.load_campaign(campaign_id).await?,
            failed_invitations,
        })
    }

    pub async fn create_collaboration_request(
        &self,
        input: NewCollaborationRequest,
    ) -> EngineResult<CollaborationRequest> {
        let campaign_id = required(input.campaign_id, "campaignId")?;
        let influencer_id = required(input.influencer_id, "influencerId")?;
        let brand_id = required(input.brand_id, "brandId")?;

        self.load_campaign(campaign_id).await?;
        if self.store.get_influencer(influencer_id).await?.is_none() {
            return Err(EngineError::not_found("influencer", influencer_id));
        }

        let now = Utc::now();
        let request = CollaborationRequest {
            id: Uuid::new_v4(),
            campaign_id,
            influencer_id,
            brand_id,
            status: RequestStatus::Pending,
            compensation: input.compensation,
            requirements: input.requirements,
            deadline: input.deadline,
            counter_offer: None,
            negotiation_history: Vec::new(),
            message: None,
            created_at: now,
            updated_at: now,
            responded_at: None,
        };
        self.store.insert_collaboration_request(request.clone()).await?;
        self.store
            .add_campaign_link(campaign_id, CampaignLink::CollaborationRequest, request.id)
            .await?;

        self.events.emit(DomainEvent::CollaborationRequested {
            request_id: request.id,
            campaign_id,
            influencer_id,
            brand_id,
        });
        info!(request_id = %request.id, campaign_id = %campaign_id, influencer_id = %influencer_id, "Collaboration requested");
        Ok(request)
    }

    /// Records the influencer's decision. Only `accepted` and `declined` are
    /// accepted here; `negotiating` is reached through a counter-offer.
    pub async fn update_collaboration_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
        message: Option<String>,
    ) -> EngineResult<CollaborationRequest> {
        if !matches!(status, RequestStatus::Accepted | RequestStatus::Declined) {
            return Err(EngineError::Validation(format!(
                "request status must be accepted or declined, got {status}"
            )));
        }
        let request = apply_request_change(
            self.store.as_ref(),
            request_id,
            RequestChange::Decision {
                status,
                message: message.clone(),
                at: Utc::now(),
            },
        )
        .await?;

        if status == RequestStatus::Accepted {
            self.store
                .add_campaign_link(request.campaign_id, CampaignLink::AcceptedInfluencer, request.influencer_id)
                .await?;
        }

        self.events.emit(DomainEvent::CollaborationResponded {
            request_id,
            campaign_id: request.campaign_id,
            influencer_id: request.influencer_id,
            brand_id: request.brand_id,
            status,
            message,
        });
        metrics::counter!("lifecycle.requests_decided", "status" => status.as_str()).increment(1);
        info!(request_id = %request_id, status = %status, "Collaboration request decided");
        Ok(request)
    }

    /// Submits content for brand approval. Only accepted influencers of the
    /// campaign may submit.
    pub async fn submit_campaign_content(
        &self,
        campaign_id: Uuid,
        influencer_id: Uuid,
        input: NewContent,
    ) -> EngineResult<CampaignContent> {
        let content_url = required_text(input.content_url, "contentUrl")?;
        let campaign = self.load_campaign(campaign_id).await?;
        if !campaign.accepted_influencers.contains(&influencer_id) {
            return Err(EngineError::Permission(format!(
                "influencer {influencer_id} is not part of campaign {campaign_id}"
            )));
        }

        let content = CampaignContent {
            id: Uuid::new_v4(),
            campaign_id,
            influencer_id,
            content_url,
            content_type: input.content_type,
            caption: input.caption,
            status: ContentStatus::PendingApproval,
            feedback: None,
            performance_metrics: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
        };
        self.store.insert_campaign_content(content.clone()).await?;
        self.store
            .add_campaign_link(campaign_id, CampaignLink::ContentSubmission, content.id)
            .await?;

        self.events.emit(DomainEvent::ContentSubmitted {
            content_id: content.id,
            campaign_id,
            influencer_id,
            brand_id: campaign.brand_id,
        });
        metrics::counter!("lifecycle.content_submitted").increment(1);
        info!(content_id = %content.id, campaign_id = %campaign_id, influencer_id = %influencer_id, "Content submitted");
        Ok(content)
    }

    /// Approves or rejects submitted content. Approval links the content to
    /// the campaign's approved set; rejection unlinks it.
    pub async fn review_campaign_content(
        &self,
        content_id: Uuid,
        status: ContentStatus,
        feedback: Option<String>,
    ) -> EngineResult<CampaignContent> {
        if status == ContentStatus::PendingApproval {
            return Err(EngineError::Validation(
                "review status must be approved or rejected".to_string(),
            ));
        }
        let mut content = self
            .store
            .get_campaign_content(content_id)
            .await?
            .ok_or_else(|| EngineError::not_found("campaign content", content_id))?;

        content.status = status;
        content.feedback = feedback.clone();
        content.reviewed_at = Some(Utc::now());
        self.store.put_campaign_content(content.clone()).await?;

        match status {
            ContentStatus::Approved => {
                self.store
                    .add_campaign_link(content.campaign_id, CampaignLink::ApprovedContent, content_id)
                    .await?;
            }
            _ => {
                self.store
                    .remove_campaign_link(content.campaign_id, CampaignLink::ApprovedContent, content_id)
                    .await?;
            }
        }

        self.events.emit(DomainEvent::ContentReviewed {
            content_id,
            campaign_id: content.campaign_id,
            influencer_id: content.influencer_id,
            status,
            feedback,
        });
        metrics::counter!("lifecycle.content_reviewed", "status" => status.as_str()).increment(1);
        info!(content_id = %content_id, status = status.as_str(), "Content reviewed");
        Ok(content)
    }

    /// Moves a campaign along its lifecycle. Completing a campaign generates
    /// its report; a report failure leaves the campaign completed.
    pub async fn transition_campaign_status(
        &self,
        campaign_id: Uuid,
        to: CampaignStatus,
    ) -> EngineResult<Campaign> {
        let campaign = self.load_campaign(campaign_id).await?;
        let from = campaign.status;
        check_campaign_transition(from, to)?;

        let mut updated = self
            .store
            .update_campaign(
                campaign_id,
                CampaignPatch {
                    expected_status: Some(from),
                    status: Some(to),
                    ..Default::default()
                },
            )
            .await?;

        self.events.emit(DomainEvent::CampaignStatusChanged {
            campaign_id,
            brand_id: campaign.brand_id,
            from,
            to,
        });
        metrics::counter!("lifecycle.transitions", "to" => to.as_str()).increment(1);
        info!(campaign_id = %campaign_id, from = %from, to = %to, "Campaign status changed");

        if to == CampaignStatus::Completed {
            match self.reporter.generate_campaign_report(campaign_id).await {
                Ok(report) => updated.report_id = Some(report.id),
                Err(e) => {
                    warn!(campaign_id = %campaign_id, error = %e, "Report generation after completion failed")
                }
            }
        }
        Ok(updated)
    }
}

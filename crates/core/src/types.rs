//! Domain model shared by every engine component.
//!
//! Documents serialize with camelCase field names so they round-trip
//! through the document store unchanged; status enums use snake_case.

use crate::textgen::Placeholder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Category, platform and audience tags compare trimmed and ASCII
/// case-insensitive everywhere.
pub fn same_tag(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

// ─── Influencer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InfluencerStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudienceDemographics {
    #[serde(default)]
    pub primary_age_range: Option<String>,
    #[serde(default)]
    pub primary_gender: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateCard {
    #[serde(default)]
    pub average_post_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Influencer {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub engagement_rate: f64,
    #[serde(default)]
    pub audience_demographics: AudienceDemographics,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub rate_card: RateCard,
    #[serde(default)]
    pub status: InfluencerStatus,
    #[serde(default)]
    pub content_tone: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    /// Denormalized summaries, rebuilt by the metrics refresh job.
    #[serde(default)]
    pub campaign_history: Vec<CampaignHistoryEntry>,
    #[serde(default)]
    pub metrics_updated_at: Option<DateTime<Utc>>,
}

impl Influencer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            categories: Vec::new(),
            platforms: Vec::new(),
            follower_count: 0,
            engagement_rate: 0.0,
            audience_demographics: AudienceDemographics::default(),
            location: Location::default(),
            rate_card: RateCard::default(),
            status: InfluencerStatus::Active,
            content_tone: None,
            values: Vec::new(),
            campaign_history: Vec::new(),
            metrics_updated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == InfluencerStatus::Active
    }
}

/// The eight collaboration formats a campaign can run with an influencer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationType {
    SponsoredPost,
    ProductReview,
    BrandAmbassador,
    Affiliate,
    Giveaway,
    EventCoverage,
    ContentCreation,
    AccountTakeover,
}

impl CollaborationType {
    pub const ALL: [CollaborationType; 8] = [
        CollaborationType::SponsoredPost,
        CollaborationType::ProductReview,
        CollaborationType::BrandAmbassador,
        CollaborationType::Affiliate,
        CollaborationType::Giveaway,
        CollaborationType::EventCoverage,
        CollaborationType::ContentCreation,
        CollaborationType::AccountTakeover,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPerformance {
    pub goal_completion_rate: f64,
    pub roi: f64,
    #[serde(default)]
    pub engagement_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignHistoryEntry {
    pub campaign_id: Uuid,
    #[serde(default)]
    pub campaign_name: String,
    #[serde(default)]
    pub collaboration_type: Option<CollaborationType>,
    pub status: CampaignStatus,
    #[serde(default)]
    pub goal_achieved: bool,
    #[serde(default)]
    pub performance: Option<HistoricalPerformance>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

// ─── Content samples ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Photo,
    Video,
    Carousel,
    Text,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Photo,
        ContentType::Video,
        ContentType::Carousel,
        ContentType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Photo => "photo",
            ContentType::Video => "video",
            ContentType::Carousel => "carousel",
            ContentType::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
}

impl EngagementMetrics {
    pub fn total(&self) -> u64 {
        self.likes + self.comments + self.shares
    }
}

/// A historical post ingested for an influencer. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSample {
    pub id: Uuid,
    pub influencer_id: Uuid,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reach: Option<u64>,
    #[serde(default)]
    pub engagement_metrics: Option<EngagementMetrics>,
}

impl ContentSample {
    /// Caption, falling back to the description.
    pub fn text(&self) -> Option<&str> {
        let non_blank = |s: &&str| !s.trim().is_empty();
        self.caption
            .as_deref()
            .filter(non_blank)
            .or(self.description.as_deref().filter(non_blank))
    }

    pub fn engagement(&self) -> u64 {
        self.engagement_metrics.map(|m| m.total()).unwrap_or(0)
    }
}

// ─── Campaign ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    PendingApproval,
    Approved,
    InProgress,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::PendingApproval => "pending_approval",
            CampaignStatus::Approved => "approved",
            CampaignStatus::InProgress => "in_progress",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Metrics a campaign goal can target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum GoalMetric {
    Reach,
    Engagement,
    Clicks,
    Conversions,
    EngagementRate,
    ClickThroughRate,
    ConversionRate,
    Roi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub brief: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub conversion_value: f64,
    #[serde(default)]
    pub goals: BTreeMap<GoalMetric, f64>,
    #[serde(default)]
    pub collaboration_type: Option<CollaborationType>,
    pub status: CampaignStatus,
    /// Link fields are hydrated from the store's join rows on read.
    #[serde(default)]
    pub collaboration_requests: Vec<Uuid>,
    #[serde(default)]
    pub accepted_influencers: Vec<Uuid>,
    #[serde(default)]
    pub content_submissions: Vec<Uuid>,
    #[serde(default)]
    pub approved_content: Vec<Uuid>,
    #[serde(default)]
    pub performance: Option<CampaignPerformance>,
    #[serde(default)]
    pub performance_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub report_id: Option<Uuid>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// A fresh campaign in `draft` with no links or performance.
    pub fn draft(brand_id: Uuid, name: impl Into<String>, brief: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            brand_id,
            name: name.into(),
            brief: brief.into(),
            categories: Vec::new(),
            platforms: Vec::new(),
            target_audience: TargetAudience::default(),
            budget: 0.0,
            conversion_value: 0.0,
            goals: BTreeMap::new(),
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
}

/// The relational link lists a campaign owns. Each list is a set keyed by
/// target id; the store keeps them as join rows rather than inline arrays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CampaignLink {
    CollaborationRequest,
    AcceptedInfluencer,
    ContentSubmission,
    ApprovedContent,
}

/// Partial update of a campaign document. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CampaignPatch {
    /// Compare-and-set guard on the stored status.
    pub expected_status: Option<CampaignStatus>,
    pub status: Option<CampaignStatus>,
    pub performance: Option<CampaignPerformance>,
    pub report_id: Option<Uuid>,
}

// ─── Collaboration requests ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Negotiating,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Accepted | RequestStatus::Declined)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Negotiating => "negotiating",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A side of a collaboration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Brand,
    Influencer,
}

impl Party {
    pub fn counterpart(&self) -> Party {
        match self {
            Party::Brand => Party::Influencer,
            Party::Influencer => Party::Brand,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferTerms {
    #[serde(default)]
    pub compensation: Option<f64>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CounterOffer {
    pub offered_by: Party,
    pub terms: OfferTerms,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationEntry {
    pub timestamp: DateTime<Utc>,
    pub offered_by: Party,
    pub terms: OfferTerms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationRequest {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub brand_id: Uuid,
    pub status: RequestStatus,
    #[serde(default)]
    pub compensation: Option<f64>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub counter_offer: Option<CounterOffer>,
    #[serde(default)]
    pub negotiation_history: Vec<NegotiationEntry>,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

// ─── Campaign content ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    PendingApproval,
    Approved,
    Rejected,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::PendingApproval => "pending_approval",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
        }
    }
}

/// Post-publication metrics of a sponsored content item.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentPerformanceMetrics {
    #[serde(default)]
    pub reach: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: u64,
}

impl ContentPerformanceMetrics {
    pub fn engagement(&self) -> u64 {
        self.likes + self.comments + self.shares
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignContent {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub content_url: String,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub caption: Option<String>,
    pub status: ContentStatus,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub performance_metrics: Option<ContentPerformanceMetrics>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

// ─── Performance ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerPerformance {
    pub reach: u64,
    pub engagement: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub content_count: u64,
    pub engagement_rate: f64,
}

/// Derived campaign metrics. Always regenerable from the approved content's
/// performance metrics, so it carries no timestamp of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformance {
    pub total_reach: u64,
    pub total_engagement: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub engagement_rate: f64,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub roi: f64,
    pub goal_completion: f64,
    pub performance_by_influencer: BTreeMap<Uuid, InfluencerPerformance>,
}

/// A persisted row of the `campaignPerformance` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub performance: CampaignPerformance,
    pub recorded_at: DateTime<Utc>,
}

// ─── Reports ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub content_id: Uuid,
    pub influencer_id: Uuid,
    pub content_url: String,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub caption: Option<String>,
    pub metrics: ContentPerformanceMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerSummary {
    pub influencer_id: Uuid,
    pub name: String,
    pub follower_count: u64,
    pub performance: InfluencerPerformance,
}

/// Model-written narrative for a campaign report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportInsights {
    pub key_highlights: Vec<String>,
    pub top_performing_influencers: Vec<String>,
    pub top_performing_content: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Placeholder for ReportInsights {
    fn placeholder() -> Self {
        let unavailable = || vec!["Unable to generate insights".to_string()];
        Self {
            key_highlights: unavailable(),
            top_performing_influencers: Vec::new(),
            top_performing_content: Vec::new(),
            areas_for_improvement: unavailable(),
            recommendations: unavailable(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignReport {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub date_range: DateRange,
    pub performance: CampaignPerformance,
    pub content_summary: Vec<ContentSummary>,
    pub influencer_summary: Vec<InfluencerSummary>,
    pub insights: ReportInsights,
    /// True when `insights` is the placeholder rather than model output.
    #[serde(default)]
    pub insights_fallback: bool,
    pub generated_at: DateTime<Utc>,
}

// ─── Notifications ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CollaborationRequest,
    CollaborationAccepted,
    CollaborationDeclined,
    CounterOffer,
    ContentSubmitted,
    ContentApproved,
    ContentRejected,
    CampaignStatusChanged,
    ReportReady,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Party,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
    #[serde(default)]
    pub related_id: Option<Uuid>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

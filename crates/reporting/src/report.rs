//! Campaign report generation with model-written insights.

use crate::tracker::{PerformanceTracker, TrackingOutcome};
use chrono::Utc;
use influencer_core::config::TextGenerationConfig;
use influencer_core::event_bus::{DomainEvent, EventSink};
use influencer_core::store::DocumentStore;
use influencer_core::textgen::{generate_structured, GenerationOptions, TextGenerator};
use influencer_core::types::{
    Campaign, CampaignPatch, CampaignPerformance, CampaignReport, ContentStatus, ContentSummary,
    DateRange, InfluencerSummary, ReportInsights,
};
use influencer_core::{EngineError, EngineResult};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Content items listed individually in the prompt.
const PROMPT_CONTENT_LIMIT: usize = 10;

pub struct ReportGenerator {
    store: Arc<dyn DocumentStore>,
    tracker: PerformanceTracker,
    generator: Arc<dyn TextGenerator>,
    events: Arc<dyn EventSink>,
    options: GenerationOptions,
}

fn report_prompt(
    campaign: &Campaign,
    performance: &CampaignPerformance,
    content: &[ContentSummary],
    influencers: &[InfluencerSummary],
) -> String {
    let mut prompt = format!(
        "Write an executive analysis of an influencer marketing campaign.\n\
         Campaign: {}\nBrief: {}\nBudget: {:.2}\n\n\
         Results: reach {}, engagement {}, clicks {}, conversions {}, \
         engagement rate {:.4}, click-through rate {:.4}, conversion rate {:.4}, \
         ROI {:.4}, goal completion {:.0}%\n",
        campaign.name,
        campaign.brief,
        campaign.budget,
        performance.total_reach,
        performance.total_engagement,
        performance.total_clicks,
        performance.total_conversions,
        performance.engagement_rate,
        performance.click_through_rate,
        performance.conversion_rate,
        performance.roi,
        performance.goal_completion * 100.0,
    );

    if !influencers.is_empty() {
        prompt.push_str("\nInfluencers:\n");
        for i in influencers {
            let _ = writeln!(
                prompt,
                "- {} ({} followers): reach {}, engagement {}, conversions {}",
                i.name, i.follower_count, i.performance.reach, i.performance.engagement, i.performance.conversions
            );
        }
    }
    if !content.is_empty() {
        prompt.push_str("\nTop content:\n");
        for c in content.iter().take(PROMPT_CONTENT_LIMIT) {
            let _ = writeln!(
                prompt,
                "- {} [{}]: reach {}, engagement {}, clicks {}",
                c.content_url,
                c.content_type.map_or("unknown", |t| t.as_str()),
                c.metrics.reach,
                c.metrics.engagement(),
                c.metrics.clicks
            );
        }
    }

    prompt.push_str(
        "\nRespond with a JSON object with exactly these fields, each a list of strings:\n\
         {\"keyHighlights\", \"topPerformingInfluencers\", \"topPerformingContent\", \
         \"areasForImprovement\", \"recommendations\"}",
    );
    prompt
}

impl ReportGenerator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn TextGenerator>,
        events: Arc<dyn EventSink>,
        config: &TextGenerationConfig,
    ) -> Self {
        Self {
            tracker: PerformanceTracker::new(store.clone()),
            store,
            generator,
            events,
            options: GenerationOptions::json(config.report_max_tokens, config.temperature),
        }
    }

    /// Builds and persists a new report and points the campaign at it.
    /// Every call creates a fresh report record.
    pub async fn generate_campaign_report(&self, campaign_id: Uuid) -> EngineResult<CampaignReport> {
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| EngineError::not_found("campaign", campaign_id))?;

        let performance = match self.tracker.track_campaign_performance(campaign_id).await? {
            TrackingOutcome::Tracked { performance } => performance,
            TrackingOutcome::NoContent => campaign.performance.clone().unwrap_or_default(),
        };

        let mut content_summary: Vec<ContentSummary> = self
            .store
            .get_campaign_contents(&campaign.approved_content)
            .await?
            .into_iter()
            .filter(|c| c.status == ContentStatus::Approved)
            .map(|c| ContentSummary {
                content_id: c.id,
                influencer_id: c.influencer_id,
                content_url: c.content_url,
                content_type: c.content_type,
                caption: c.caption,
                metrics: c.performance_metrics.unwrap_or_default(),
            })
            .collect();
        content_summary.sort_by(|a, b| b.metrics.engagement().cmp(&a.metrics.engagement()));

        let mut influencer_summary = Vec::with_capacity(campaign.accepted_influencers.len());
        for influencer_id in &campaign.accepted_influencers {
            let Some(profile) = self.store.get_influencer(*influencer_id).await? else {
                warn!(campaign_id = %campaign_id, influencer_id = %influencer_id, "Accepted influencer has no profile");
                continue;
            };
            influencer_summary.push(InfluencerSummary {
                influencer_id: *influencer_id,
                name: profile.name,
                follower_count: profile.follower_count,
                performance: performance
                    .performance_by_influencer
                    .get(influencer_id)
                    .cloned()
                    .unwrap_or_default(),
            });
        }
        influencer_summary.sort_by(|a, b| b.performance.engagement.cmp(&a.performance.engagement));

        let prompt = report_prompt(&campaign, &performance, &content_summary, &influencer_summary);
        let insights =
            generate_structured::<ReportInsights>(self.generator.as_ref(), "report_insights", &prompt, &self.options)
                .await;

        let now = Utc::now();
        let report = CampaignReport {
            id: Uuid::new_v4(),
            campaign_id,
            date_range: DateRange {
                start: campaign.start_date.unwrap_or(campaign.created_at),
                end: campaign.end_date.unwrap_or(now),
            },
            performance,
            content_summary,
            influencer_summary,
            insights_fallback: insights.is_fallback(),
            insights: insights.into_inner(),
            generated_at: now,
        };

        self.store.insert_report(report.clone()).await?;
        self.store
            .update_campaign(
                campaign_id,
                CampaignPatch {
                    report_id: Some(report.id),
                    ..Default::default()
                },
            )
            .await?;

        self.events.emit(DomainEvent::ReportGenerated {
            report_id: report.id,
            campaign_id,
            brand_id: campaign.brand_id,
        });
        metrics::counter!("reporting.reports_generated").increment(1);
        info!(
            campaign_id = %campaign_id,
            report_id = %report.id,
            insights_fallback = report.insights_fallback,
            "Campaign report generated"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use influencer_core::event_bus::capture_sink;
    use influencer_core::textgen::{Placeholder, ScriptedGenerator};
    use influencer_core::types::{
        CampaignContent, CampaignLink, CampaignStatus, ContentPerformanceMetrics, ContentType, Influencer,
    };
    use influencer_core::MemoryStore;

    const INSIGHTS: &str = r#"```json
    {"keyHighlights":["Beat reach goal"],"topPerformingInfluencers":["Mia"],
     "topPerformingContent":["Reel"],"areasForImprovement":["CTR"],"recommendations":["More reels"]}
    ```"#;

    async fn seeded() -> (Arc<MemoryStore>, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let mut campaign = Campaign::draft(Uuid::new_v4(), "Launch", "New blender");
        campaign.status = CampaignStatus::InProgress;
        campaign.budget = 1_000.0;
        campaign.conversion_value = 50.0;
        let campaign_id = campaign.id;
        store.insert_campaign(campaign).await.unwrap();

        let mut influencer = Influencer::new("Mia");
        influencer.follower_count = 40_000;
        let influencer_id = influencer.id;
        store.put_influencer(influencer).await.unwrap();
        store
            .add_campaign_link(campaign_id, CampaignLink::AcceptedInfluencer, influencer_id)
            .await
            .unwrap();

        let content = CampaignContent {
            id: Uuid::new_v4(),
            campaign_id,
            influencer_id,
            content_url: "https://example.com/reel/1".into(),
            content_type: Some(ContentType::Video),
            caption: Some("Smoothie time".into()),
            status: ContentStatus::Approved,
            feedback: None,
            performance_metrics: Some(ContentPerformanceMetrics {
                reach: 20_000,
                likes: 900,
                comments: 80,
                shares: 20,
                clicks: 300,
                conversions: 30,
            }),
            submitted_at: Utc::now(),
            reviewed_at: Some(Utc::now()),
        };
        let content_id = content.id;
        store.insert_campaign_content(content).await.unwrap();
        store
            .add_campaign_link(campaign_id, CampaignLink::ApprovedContent, content_id)
            .await
            .unwrap();
        (store, campaign_id, influencer_id)
    }

    #[tokio::test]
    async fn test_report_with_parsed_insights() {
        let (store, campaign_id, influencer_id) = seeded().await;
        let generator = Arc::new(ScriptedGenerator::new().with_response(INSIGHTS));
        let events = capture_sink();
        let reporter = ReportGenerator::new(
            store.clone(),
            generator.clone(),
            events.clone(),
            &TextGenerationConfig::default(),
        );

        let report = reporter.generate_campaign_report(campaign_id).await.unwrap();
        assert!(!report.insights_fallback);
        assert_eq!(report.insights.key_highlights, vec!["Beat reach goal".to_string()]);
        assert!((report.performance.roi - 0.5).abs() < 1e-9);
        assert_eq!(report.content_summary.len(), 1);
        assert_eq!(report.influencer_summary[0].influencer_id, influencer_id);
        assert_eq!(report.influencer_summary[0].performance.engagement, 1_000);

        let prompts = generator.prompts();
        let prompt = &prompts[0];
        assert!(prompt.contains("Campaign: Launch"));
        assert!(prompt.contains("Mia (40000 followers)"));

        let campaign = store.get_campaign(campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.report_id, Some(report.id));
        assert_eq!(events.count_named("report_generated"), 1);
    }

    #[tokio::test]
    async fn test_malformed_insights_use_placeholder() {
        let (store, campaign_id, _) = seeded().await;
        let generator = Arc::new(ScriptedGenerator::new().with_response("Great campaign overall!"));
        let reporter = ReportGenerator::new(
            store,
            generator,
            capture_sink(),
            &TextGenerationConfig::default(),
        );

        let report = reporter.generate_campaign_report(campaign_id).await.unwrap();
        assert!(report.insights_fallback);
        assert_eq!(report.insights, ReportInsights::placeholder());
    }

    #[tokio::test]
    async fn test_repeated_reports_create_new_records() {
        let (store, campaign_id, _) = seeded().await;
        let generator = Arc::new(
            ScriptedGenerator::new()
                .with_response(INSIGHTS)
                .with_failure("HTTP 503"),
        );
        let reporter = ReportGenerator::new(
            store.clone(),
            generator,
            capture_sink(),
            &TextGenerationConfig::default(),
        );

        let first = reporter.generate_campaign_report(campaign_id).await.unwrap();
        let second = reporter.generate_campaign_report(campaign_id).await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.insights_fallback);
        assert_eq!(first.performance, second.performance);
        assert_eq!(store.reports_for_campaign(campaign_id).await.unwrap().len(), 2);
        let campaign = store.get_campaign(campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.report_id, Some(second.id));
    }

    #[tokio::test]
    async fn test_report_without_content_uses_empty_performance() {
        let store = Arc::new(MemoryStore::new());
        let campaign = Campaign::draft(Uuid::new_v4(), "Quiet", "Nothing posted");
        let campaign_id = campaign.id;
        store.insert_campaign(campaign).await.unwrap();
        let reporter = ReportGenerator::new(
            store.clone(),
            Arc::new(ScriptedGenerator::new()),
            capture_sink(),
            &TextGenerationConfig::default(),
        );

        let report = reporter.generate_campaign_report(campaign_id).await.unwrap();
        assert_eq!(report.performance, CampaignPerformance::default());
        assert!(report.content_summary.is_empty());
        assert!(store.performance_snapshots(campaign_id).await.unwrap().is_empty());
    }
}

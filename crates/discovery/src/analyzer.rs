//! Engagement analysis: content themes, posting patterns and brand fit for
//! a single influencer.

use crate::prompt;
use chrono::{DateTime, Datelike, Timelike, Utc};
use influencer_core::config::TextGenerationConfig;
use influencer_core::store::DocumentStore;
use influencer_core::textgen::{generate_structured, Decoded, GenerationOptions, Placeholder, TextGenerator};
use influencer_core::types::{ContentSample, ContentType, Influencer};
use influencer_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const UNABLE: &str = "Unable to analyze";
const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentThemes {
    pub themes: Vec<String>,
    pub style: String,
    pub recurring_elements: Vec<String>,
    pub high_engagement_content: Vec<String>,
}

impl Placeholder for ContentThemes {
    fn placeholder() -> Self {
        Self {
            themes: vec![UNABLE.to_string()],
            style: UNABLE.to_string(),
            recurring_elements: vec![UNABLE.to_string()],
            high_engagement_content: vec![UNABLE.to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrandAlignment {
    pub aligned_brand_categories: Vec<String>,
    pub brand_categories_to_avoid: Vec<String>,
    /// 0 to 10.
    pub authenticity_score: f64,
    pub expressed_values: Vec<String>,
    pub potential_red_flags: Vec<String>,
}

impl Placeholder for BrandAlignment {
    fn placeholder() -> Self {
        Self {
            aligned_brand_categories: vec![UNABLE.to_string()],
            brand_categories_to_avoid: vec![UNABLE.to_string()],
            authenticity_score: 0.0,
            expressed_values: vec![UNABLE.to_string()],
            potential_red_flags: vec![UNABLE.to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementPatterns {
    pub best_day: Option<String>,
    /// 12-hour clock, e.g. "3 PM".
    pub best_hour: Option<String>,
    pub best_content_type: Option<ContentType>,
    /// Keyed by day of week, 0 = Sunday.
    pub day_averages: BTreeMap<u32, f64>,
    /// Keyed by hour of day, 0-23 UTC.
    pub hour_averages: BTreeMap<u32, f64>,
    pub content_type_averages: BTreeMap<ContentType, f64>,
    pub samples_analyzed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerAnalysis {
    pub influencer_id: Uuid,
    pub content_themes: ContentThemes,
    pub engagement_patterns: EngagementPatterns,
    pub brand_alignment: BrandAlignment,
    /// True when the section is the placeholder rather than model output.
    pub content_themes_fallback: bool,
    pub brand_alignment_fallback: bool,
    pub samples_considered: usize,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Default)]
struct Bucket {
    count: u64,
    engagement: u64,
}

impl Bucket {
    fn add(&mut self, engagement: u64) {
        self.count += 1;
        self.engagement += engagement;
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.engagement as f64 / self.count as f64
        }
    }
}

fn averages<K: Ord + Copy>(buckets: &BTreeMap<K, Bucket>) -> BTreeMap<K, f64> {
    buckets.iter().map(|(k, b)| (*k, b.average())).collect()
}

/// Key with the highest average; the lowest key wins ties.
fn best<K: Ord + Copy>(averages: &BTreeMap<K, f64>) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (k, avg) in averages {
        if best.map_or(true, |(_, top)| *avg > top) {
            best = Some((*k, *avg));
        }
    }
    best.map(|(k, _)| k)
}

pub fn format_hour_12(hour: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display} {suffix}")
}

/// Buckets samples that carry both a timestamp and metrics by weekday, hour
/// and content type, and reports the best bucket of each.
pub fn engagement_patterns(samples: &[ContentSample]) -> EngagementPatterns {
    let mut days: BTreeMap<u32, Bucket> = BTreeMap::new();
    let mut hours: BTreeMap<u32, Bucket> = BTreeMap::new();
    let mut types: BTreeMap<ContentType, Bucket> = BTreeMap::new();
    let mut analyzed = 0;

    for sample in samples {
        let (Some(posted_at), Some(metrics)) = (sample.posted_at, sample.engagement_metrics) else {
            continue;
        };
        analyzed += 1;
        let engagement = metrics.total();
        days.entry(posted_at.weekday().num_days_from_sunday())
            .or_default()
            .add(engagement);
        hours.entry(posted_at.hour()).or_default().add(engagement);
        if let Some(content_type) = sample.content_type {
            types.entry(content_type).or_default().add(engagement);
        }
    }

    let day_averages = averages(&days);
    let hour_averages = averages(&hours);
    let content_type_averages = averages(&types);

    EngagementPatterns {
        best_day: best(&day_averages).map(|d| DAY_NAMES[d as usize].to_string()),
        best_hour: best(&hour_averages).map(format_hour_12),
        best_content_type: best(&content_type_averages),
        day_averages,
        hour_averages,
        content_type_averages,
        samples_analyzed: analyzed,
    }
}

pub struct EngagementAnalyzer {
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    sample_limit: usize,
}

impl EngagementAnalyzer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn TextGenerator>,
        config: &TextGenerationConfig,
        sample_limit: usize,
    ) -> Self {
        Self {
            store,
            generator,
            options: GenerationOptions::json(config.analysis_max_tokens, config.temperature),
            sample_limit,
        }
    }

    /// Full analysis of an influencer's recent content.
    pub async fn analyze_influencer(&self, influencer_id: Uuid) -> EngineResult<InfluencerAnalysis> {
        let influencer = self
            .store
            .get_influencer(influencer_id)
            .await?
            .ok_or_else(|| EngineError::not_found("influencer", influencer_id))?;
        let samples = self
            .store
            .recent_content_samples(influencer_id, self.sample_limit)
            .await?;

        let (themes, alignment) = tokio::join!(
            self.analyze_content_themes(&samples),
            self.analyze_brand_alignment(&influencer, &samples)
        );
        let patterns = engagement_patterns(&samples);

        metrics::counter!("discovery.analyses").increment(1);
        info!(
            influencer_id = %influencer_id,
            samples = samples.len(),
            themes_fallback = themes.is_fallback(),
            alignment_fallback = alignment.is_fallback(),
            "Influencer analysis complete"
        );

        Ok(InfluencerAnalysis {
            influencer_id,
            content_themes_fallback: themes.is_fallback(),
            brand_alignment_fallback: alignment.is_fallback(),
            content_themes: themes.into_inner(),
            engagement_patterns: patterns,
            brand_alignment: alignment.into_inner(),
            samples_considered: samples.len(),
            analyzed_at: Utc::now(),
        })
    }

    pub async fn analyze_content_themes(&self, samples: &[ContentSample]) -> Decoded<ContentThemes> {
        let corpus = prompt::caption_corpus(samples);
        if corpus.is_empty() {
            return Decoded::Fallback {
                value: ContentThemes::placeholder(),
                reason: "no caption text".to_string(),
            };
        }
        let prompt = prompt::content_themes_prompt(&corpus);
        generate_structured(self.generator.as_ref(), "content_themes", &prompt, &self.options).await
    }

    pub async fn analyze_brand_alignment(
        &self,
        influencer: &Influencer,
        samples: &[ContentSample],
    ) -> Decoded<BrandAlignment> {
        let corpus = prompt::caption_corpus(samples);
        let prompt = prompt::brand_alignment_prompt(influencer, &corpus);
        match generate_structured::<BrandAlignment>(
            self.generator.as_ref(),
            "brand_alignment",
            &prompt,
            &self.options,
        )
        .await
        {
            Decoded::Parsed(mut alignment) => {
                alignment.authenticity_score = alignment.authenticity_score.clamp(0.0, 10.0);
                Decoded::Parsed(alignment)
            }
            fallback => fallback,
        }
    }
}

//! Prompt builders for the content analyses.

use influencer_core::types::{ContentSample, Influencer};

/// Caption corpus is capped so a chatty influencer can't blow the context.
const MAX_CORPUS_CHARS: usize = 12_000;

/// Joins sample captions (or descriptions) one per line.
pub fn caption_corpus(samples: &[ContentSample]) -> String {
    let mut corpus = String::new();
    for text in samples.iter().filter_map(|s| s.text()).map(str::trim) {
        if corpus.len() + text.len() + 1 > MAX_CORPUS_CHARS {
            // A lone oversized caption is cut rather than dropped.
            if corpus.is_empty() {
                corpus.push_str(truncate_at_char(text, MAX_CORPUS_CHARS - 1));
                corpus.push('\n');
            }
            break;
        }
        corpus.push_str(text);
        corpus.push('\n');
    }
    corpus
}

/// Longest prefix of `text` no longer than `max_bytes` that ends on a char
/// boundary.
fn truncate_at_char(text: &str, max_bytes: usize) -> &str {
    let end = text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    &text[..end]
}

pub fn content_themes_prompt(corpus: &str) -> String {
    format!(
        "Analyze the following social media captions from a single influencer.\n\
         Identify the main content themes, the overall content style, recurring \
         elements, and the kinds of content that appear to drive the most engagement.\n\n\
         Captions:\n{corpus}\n\
         Respond with a JSON object with exactly these fields:\n\
         {{\"themes\": [string], \"style\": string, \"recurringElements\": [string], \
         \"highEngagementContent\": [string]}}"
    )
}

pub fn brand_alignment_prompt(influencer: &Influencer, corpus: &str) -> String {
    let categories = if influencer.categories.is_empty() {
        "unspecified".to_string()
    } else {
        influencer.categories.join(", ")
    };
    let values = if influencer.values.is_empty() {
        "unspecified".to_string()
    } else {
        influencer.values.join(", ")
    };
    let tone = influencer.content_tone.as_deref().unwrap_or("unspecified");
    format!(
        "Assess brand partnership fit for an influencer.\n\
         Categories: {categories}\n\
         Tone: {tone}\n\
         Stated values: {values}\n\n\
         Recent captions:\n{corpus}\n\
         Respond with a JSON object with exactly these fields:\n\
         {{\"alignedBrandCategories\": [string], \"brandCategoriesToAvoid\": [string], \
         \"authenticityScore\": number from 0 to 10, \"expressedValues\": [string], \
         \"potentialRedFlags\": [string]}}"
    )
}

//! Loads a JSON fixture of influencers and campaigns into the document store.

use anyhow::Context;
use influencer_core::store::DocumentStore;
use influencer_core::types::{Campaign, CampaignContent, ContentSample, Influencer};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedData {
    pub influencers: Vec<Influencer>,
    pub content_samples: Vec<ContentSample>,
    pub campaigns: Vec<Campaign>,
    pub campaign_contents: Vec<CampaignContent>,
}

impl SeedData {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
    }

    pub async fn load_into(self, store: &dyn DocumentStore) -> anyhow::Result<()> {
        for influencer in self.influencers {
            store.put_influencer(influencer).await?;
        }
        for sample in self.content_samples {
            store.insert_content_sample(sample).await?;
        }
        for campaign in self.campaigns {
            store.insert_campaign(campaign).await?;
        }
        for content in self.campaign_contents {
            store.insert_campaign_content(content).await?;
        }
        Ok(())
    }
}

//! Hugging Face Hub adapters (trending models and trending spaces).
//!
//! Both use the public Hub JSON API; no credential is needed for listings.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use aitracker_shared::{CandidateRecord, Result, SourceTag, SourcesConfig, text::truncate_chars};

use super::{FetchQuery, SourceAdapter};
use crate::http::{build_client, get_json};

const MAX_DESCRIPTION_CHARS: usize = 500;
const DEFAULT_DESCRIPTION: &str = "AI model from Hugging Face";

/// One entry of `/api/models` or `/api/spaces`. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct HubEntry {
    id: String,
    description: Option<String>,
    #[serde(rename = "cardData")]
    card_data: Option<Value>,
    likes: Option<u64>,
    downloads: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    pipeline_tag: Option<String>,
    sdk: Option<String>,
}

impl HubEntry {
    fn description(&self) -> String {
        let text = self
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| {
                self.card_data
                    .as_ref()
                    .and_then(|c| c.get("description"))
                    .and_then(Value::as_str)
                    .filter(|d| !d.trim().is_empty())
            })
            .unwrap_or(DEFAULT_DESCRIPTION);

        truncate_chars(text, MAX_DESCRIPTION_CHARS).to_string()
    }
}

/// Shared listing call: decode each entry on its own so one malformed item
/// does not sink the batch.
async fn fetch_listing(
    client: &Client,
    api_url: &str,
    kind: &str,
    limit: usize,
) -> Result<Vec<HubEntry>> {
    let url = format!("{api_url}/{kind}");
    let query = [
        ("sort", "trending".to_string()),
        ("limit", limit.to_string()),
        ("full", "true".to_string()),
    ];

    let raw: Vec<Value> = get_json(client, &url, &query).await?;

    let mut entries = Vec::with_capacity(raw.len());
    for (idx, item) in raw.into_iter().enumerate() {
        match serde_json::from_value::<HubEntry>(item) {
            Ok(entry) => entries.push(entry),
            Err(e) => error!(kind, idx, error = %e, "skipping malformed hub entry"),
        }
    }
    debug!(kind, count = entries.len(), "hub listing decoded");
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Trending models from `huggingface.co/api/models`.
pub struct HuggingFaceModelsAdapter {
    client: Client,
    api_url: String,
    site_url: String,
}

impl HuggingFaceModelsAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.fetch_timeout())?,
            api_url: config.huggingface_api_url.trim_end_matches('/').to_string(),
            site_url: config.huggingface_site_url.trim_end_matches('/').to_string(),
        })
    }

    fn to_record(&self, entry: HubEntry) -> CandidateRecord {
        let description = entry.description();
        CandidateRecord {
            likes: entry.likes,
            downloads: entry.downloads,
            pipeline_tag: entry.pipeline_tag,
            tags: entry.tags,
            ..CandidateRecord::new(
                entry.id.clone(),
                description,
                format!("{}/{}", self.site_url, entry.id),
                SourceTag::HuggingFace,
            )
        }
    }
}

#[async_trait]
impl SourceAdapter for HuggingFaceModelsAdapter {
    fn tag(&self) -> SourceTag {
        SourceTag::HuggingFace
    }

    async fn fetch_candidates(&self, query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        let entries = fetch_listing(&self.client, &self.api_url, "models", query.limit).await?;
        Ok(entries.into_iter().map(|e| self.to_record(e)).collect())
    }
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

/// Trending Spaces (demo apps) from `huggingface.co/api/spaces`.
pub struct HuggingFaceSpacesAdapter {
    client: Client,
    api_url: String,
    site_url: String,
}

impl HuggingFaceSpacesAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.fetch_timeout())?,
            api_url: config.huggingface_api_url.trim_end_matches('/').to_string(),
            site_url: config.huggingface_site_url.trim_end_matches('/').to_string(),
        })
    }

    fn to_record(&self, entry: HubEntry) -> CandidateRecord {
        let description = entry.description();
        CandidateRecord {
            likes: entry.likes,
            sdk: entry.sdk,
            tags: entry.tags,
            ..CandidateRecord::new(
                entry.id.clone(),
                description,
                format!("{}/spaces/{}", self.site_url, entry.id),
                SourceTag::HuggingFaceSpace,
            )
        }
    }
}

#[async_trait]
impl SourceAdapter for HuggingFaceSpacesAdapter {
    fn tag(&self) -> SourceTag {
        SourceTag::HuggingFaceSpace
    }

    async fn fetch_candidates(&self, query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        let entries = fetch_listing(&self.client, &self.api_url, "spaces", query.limit).await?;
        Ok(entries.into_iter().map(|e| self.to_record(e)).collect())
    }
}

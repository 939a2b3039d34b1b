//! Source adapter trait and the built-in adapters.
//!
//! Each adapter pulls one public listing (trending repos, trending models,
//! AI launches), converts it to [`CandidateRecord`]s, and drops records that
//! do not look AI-related. Network and parse failures never escape
//! [`SourceAdapter::fetch`]; they come back as an empty [`SourceBatch`] with
//! a failure reason.

mod github;
mod huggingface;
mod producthunt;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use aitracker_shared::{CandidateRecord, Result, SourceTag, SourcesConfig, TrackerError};

pub use github::{GitHubTrendingAdapter, parse_star_count};
pub use huggingface::{HuggingFaceModelsAdapter, HuggingFaceSpacesAdapter};
pub use producthunt::ProductHuntAdapter;

/// Keywords marking a repository or model as AI-related.
pub(crate) const AI_KEYWORDS: &[&str] = &[
    "ai",
    "ml",
    "machine learning",
    "deep learning",
    "neural",
    "llm",
    "gpt",
    "chatbot",
    "transformer",
    "nlp",
    "computer vision",
    "opencv",
    "tensorflow",
    "pytorch",
    "model",
    "diffusion",
    "stable diffusion",
    "huggingface",
    "langchain",
    "agent",
    "rag",
];

/// Keywords marking a consumer product launch as AI-related.
pub(crate) const PRODUCT_KEYWORDS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "ml",
    "machine learning",
    "chatbot",
    "gpt",
    "llm",
    "neural",
    "deep learning",
    "automation",
    "smart",
    "intelligent",
    "assistant",
    "generative",
    "model",
    "nlp",
    "computer vision",
];

// ---------------------------------------------------------------------------
// Query / batch
// ---------------------------------------------------------------------------

/// Parameters for one fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchQuery {
    /// Maximum number of records returned.
    pub limit: usize,
    /// Adapter-specific knobs (e.g. `language`, `since` for GitHub).
    pub filters: HashMap<String, String>,
}

impl FetchQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            filters: HashMap::new(),
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }
}

/// Result of one adapter fetch.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: SourceTag,
    /// Relevant records in source order, at most `limit`.
    pub records: Vec<CandidateRecord>,
    /// Why the source delivered nothing, when it failed as a whole.
    pub failure: Option<String>,
}

impl SourceBatch {
    pub fn ok(source: SourceTag, records: Vec<CandidateRecord>) -> Self {
        Self {
            source,
            records,
            failure: None,
        }
    }

    pub fn failed(source: SourceTag, reason: impl Into<String>) -> Self {
        Self {
            source,
            records: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

/// Case-insensitive substring match of any keyword against `name + " " + description`.
pub fn is_relevant(record: &CandidateRecord, keywords: &[&str]) -> bool {
    let text = format!("{} {}", record.name, record.description).to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A source of candidate AI tools.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Tag stamped on every record this adapter produces.
    fn tag(&self) -> SourceTag;

    /// Keywords used by the relevance filter.
    fn keywords(&self) -> &'static [&'static str] {
        AI_KEYWORDS
    }

    /// Pull raw records from the source. May fail on network or parse errors.
    async fn fetch_candidates(&self, query: &FetchQuery) -> Result<Vec<CandidateRecord>>;

    /// Fetch, filter for relevance, and cap at `query.limit`.
    ///
    /// Never fails: a source-level error yields an empty batch with the
    /// reason recorded.
    async fn fetch(&self, query: &FetchQuery) -> SourceBatch {
        let tag = self.tag();
        match self.fetch_candidates(query).await {
            Ok(records) => {
                let fetched = records.len();
                let keywords = self.keywords();
                let mut relevant: Vec<CandidateRecord> = records
                    .into_iter()
                    .filter(|r| is_relevant(r, keywords))
                    .collect();
                relevant.truncate(query.limit);

                info!(source = %tag, fetched, relevant = relevant.len(), "source fetched");
                SourceBatch::ok(tag, relevant)
            }
            Err(e) => {
                let reason = TrackerError::source_unavailable(tag.as_str(), e.to_string());
                warn!(source = %tag, error = %e, "source unavailable");
                SourceBatch::failed(tag, reason.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the adapter for a single source.
pub fn build_adapter(tag: SourceTag, config: &SourcesConfig) -> Result<Arc<dyn SourceAdapter>> {
    let adapter: Arc<dyn SourceAdapter> = match tag {
        SourceTag::GitHub => Arc::new(GitHubTrendingAdapter::new(config)?),
        SourceTag::HuggingFace => Arc::new(HuggingFaceModelsAdapter::new(config)?),
        SourceTag::HuggingFaceSpace => Arc::new(HuggingFaceSpacesAdapter::new(config)?),
        SourceTag::ProductHunt => Arc::new(ProductHuntAdapter::new(config)?),
    };
    Ok(adapter)
}

/// Build every adapter in `tags`, in order.
///
/// Returns the adapters that could be built and the errors for those that
/// could not.
pub fn build_adapters(
    tags: &[SourceTag],
    config: &SourcesConfig,
) -> (Vec<Arc<dyn SourceAdapter>>, Vec<TrackerError>) {
    let mut adapters = Vec::new();
    let mut errors = Vec::new();

    for &tag in tags {
        match build_adapter(tag, config) {
            Ok(adapter) => adapters.push(adapter),
            Err(e) => {
                warn!(source = %tag, error = %e, "failed to initialize source adapter");
                errors.push(e);
            }
        }
    }

    (adapters, errors)
}

//! In-memory doubles for pipeline tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use aitracker_shared::{
    CandidateRecord, EnrichedRecord, NewTool, PersistedTool, Pricing, Result, SourceTag,
    ToolUpdate, TrackerError,
};
use aitracker_sources::{FetchQuery, SourceAdapter};
use aitracker_storage::{ToolFilter, ToolOrder, ToolStore};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// `ToolStore` backed by a vector, with per-URL failure injection.
#[derive(Default)]
pub(crate) struct MemoryStore {
    tools: Mutex<Vec<PersistedTool>>,
    failing_urls: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
}

impl MemoryStore {
    /// Make every insert of `url` fail with a storage error.
    pub fn fail_on(&self, url: &str) {
        self.failing_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn tools(&self) -> Vec<PersistedTool> {
        self.tools.lock().unwrap().clone()
    }

    pub fn seed(&self, tool: PersistedTool) {
        self.tools.lock().unwrap().push(tool);
    }
}

#[async_trait]
impl ToolStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<PersistedTool>> {
        Ok(self.tools.lock().unwrap().iter().find(|t| t.url == url).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<PersistedTool>> {
        Ok(self.tools.lock().unwrap().iter().find(|t| t.name == name).cloned())
    }

    async fn find_by_name_and_source(
        &self,
        name: &str,
        source: SourceTag,
    ) -> Result<Option<PersistedTool>> {
        Ok(self
            .tools
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name && t.source == source)
            .cloned())
    }

    async fn insert(&self, tool: &NewTool) -> Result<PersistedTool> {
        if self.failing_urls.lock().unwrap().contains(&tool.url) {
            return Err(TrackerError::Storage(format!("injected failure for {}", tool.url)));
        }

        let mut tools = self.tools.lock().unwrap();
        if tools.iter().any(|t| t.url == tool.url) {
            return Err(TrackerError::Storage("UNIQUE constraint failed: ai_tools.url".into()));
        }

        let now = Utc::now();
        let id = format!("tool-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let persisted = PersistedTool {
            id,
            name: tool.name.clone(),
            description: tool.description.clone(),
            url: tool.url.clone(),
            source: tool.source,
            summary: Some(tool.summary.clone()),
            use_cases: tool.use_cases.clone(),
            category: Some(tool.category.clone()),
            pricing: Some(tool.pricing),
            hype_score: Some(tool.hype_score),
            stars: tool.stars,
            today_stars: tool.today_stars,
            likes: tool.likes,
            downloads: tool.downloads,
            upvotes: tool.upvotes,
            tags: tool.tags.clone(),
            pipeline_tag: tool.pipeline_tag.clone(),
            sdk: tool.sdk.clone(),
            discovered_date: tool.discovered_date,
            created_at: now,
            updated_at: now,
        };
        tools.push(persisted.clone());
        Ok(persisted)
    }

    async fn update(&self, id: &str, update: &ToolUpdate) -> Result<PersistedTool> {
        let mut tools = self.tools.lock().unwrap();
        let tool = tools
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TrackerError::Storage(format!("tool {id} not found")))?;

        tool.updated_at = update.updated_at;
        if let Some(d) = &update.description {
            tool.description = d.clone();
        }
        if let Some(score) = update.hype_score {
            tool.hype_score = Some(score);
        }
        if let Some(s) = &update.summary {
            tool.summary = Some(s.clone());
        }
        if let Some(u) = &update.use_cases {
            tool.use_cases = u.clone();
        }
        if let Some(c) = &update.category {
            tool.category = Some(c.clone());
        }
        if let Some(p) = update.pricing {
            tool.pricing = Some(p);
        }
        Ok(tool.clone())
    }

    async fn list(
        &self,
        filter: &ToolFilter,
        _order: ToolOrder,
        limit: u32,
    ) -> Result<Vec<PersistedTool>> {
        Ok(self
            .tools
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                filter
                    .discovered_since
                    .is_none_or(|since| t.discovered_date >= since)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Returns a fixed list of records.
pub(crate) struct StaticAdapter {
    pub tag: SourceTag,
    pub records: Vec<CandidateRecord>,
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn fetch_candidates(&self, _query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        Ok(self.records.clone())
    }
}

/// Always fails with a network error.
pub(crate) struct FailingAdapter(pub SourceTag);

#[async_trait]
impl SourceAdapter for FailingAdapter {
    fn tag(&self) -> SourceTag {
        self.0
    }

    async fn fetch_candidates(&self, _query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        Err(TrackerError::Network("HTTP 503".into()))
    }
}

/// Sleeps far longer than any test timeout.
pub(crate) struct StuckAdapter(pub SourceTag);

#[async_trait]
impl SourceAdapter for StuckAdapter {
    fn tag(&self) -> SourceTag {
        self.0
    }

    async fn fetch_candidates(&self, _query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Panics inside its fetch task.
pub(crate) struct PanickingAdapter(pub SourceTag);

#[async_trait]
impl SourceAdapter for PanickingAdapter {
    fn tag(&self) -> SourceTag {
        self.0
    }

    async fn fetch_candidates(&self, _query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        panic!("adapter blew up");
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An AI-relevant candidate with a valid URL.
pub(crate) fn candidate(name: &str, url: &str, source: SourceTag) -> CandidateRecord {
    CandidateRecord::new(name, format!("{name} is an LLM toolkit"), url, source)
}

pub(crate) fn enriched(name: &str, url: &str, source: SourceTag) -> EnrichedRecord {
    EnrichedRecord {
        record: candidate(name, url, source),
        summary: format!("{name} summary"),
        use_cases: vec!["Text Generation".into()],
        category: "NLP".into(),
        pricing: Pricing::Free,
        hype_score: 55,
    }
}

//! Core domain types for discovered AI tools and scan runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

// ---------------------------------------------------------------------------
// SourceTag
// ---------------------------------------------------------------------------

/// Origin of a candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceTag {
    /// GitHub trending repositories.
    #[serde(rename = "github")]
    GitHub,
    /// Hugging Face trending models.
    #[serde(rename = "huggingface")]
    HuggingFace,
    /// Hugging Face trending spaces (demo apps).
    #[serde(rename = "huggingface-space")]
    HuggingFaceSpace,
    /// Product Hunt AI launches.
    #[serde(rename = "producthunt")]
    ProductHunt,
}

impl SourceTag {
    /// Every known source, in default scan order.
    pub const ALL: [SourceTag; 4] = [
        SourceTag::HuggingFace,
        SourceTag::HuggingFaceSpace,
        SourceTag::GitHub,
        SourceTag::ProductHunt,
    ];

    /// Stable tag used in storage, config and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::HuggingFace => "huggingface",
            Self::HuggingFaceSpace => "huggingface-space",
            Self::ProductHunt => "producthunt",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceTag {
    type Err = TrackerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "github" => Ok(Self::GitHub),
            "huggingface" => Ok(Self::HuggingFace),
            "huggingface-space" => Ok(Self::HuggingFaceSpace),
            "producthunt" => Ok(Self::ProductHunt),
            other => Err(TrackerError::validation(format!("unknown source tag '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Pricing tier detected from a tool description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pricing {
    Free,
    Freemium,
    Paid,
    Unknown,
}

impl Pricing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Freemium => "freemium",
            Self::Paid => "paid",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Pricing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Pricing {
    type Err = TrackerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "freemium" => Ok(Self::Freemium),
            "paid" => Ok(Self::Paid),
            "unknown" => Ok(Self::Unknown),
            other => Err(TrackerError::validation(format!("unknown pricing '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// CandidateRecord
// ---------------------------------------------------------------------------

/// A raw tool observation produced by a source adapter.
///
/// Source-specific fields the pipeline does not use are dropped at the
/// adapter boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Source-local identifier (repo path, model id, product name).
    pub name: String,
    /// Free-text description, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Absolute URL once normalized; may be empty or malformed before that.
    #[serde(default)]
    pub url: String,
    /// Where the record came from.
    pub source: SourceTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_stars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<u64>,
    /// Source tags, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Hugging Face pipeline tag (e.g. `text-generation`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_tag: Option<String>,
    /// Hugging Face Space SDK (e.g. `gradio`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,
    /// Primary programming language (GitHub).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CandidateRecord {
    /// Create a record with only the required fields set.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        source: SourceTag,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            source,
            stars: None,
            today_stars: None,
            likes: None,
            downloads: None,
            upvotes: None,
            tags: Vec::new(),
            pipeline_tag: None,
            sdk: None,
            language: None,
        }
    }

    /// First non-empty type hint the source provided.
    pub fn type_hint(&self) -> Option<&str> {
        self.pipeline_tag
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.sdk.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

impl From<&PersistedTool> for CandidateRecord {
    fn from(tool: &PersistedTool) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            url: tool.url.clone(),
            source: tool.source,
            stars: tool.stars,
            today_stars: tool.today_stars,
            likes: tool.likes,
            downloads: tool.downloads,
            upvotes: tool.upvotes,
            tags: tool.tags.clone(),
            pipeline_tag: tool.pipeline_tag.clone(),
            sdk: tool.sdk.clone(),
            language: None,
        }
    }
}

// ---------------------------------------------------------------------------
// EnrichedRecord
// ---------------------------------------------------------------------------

/// A candidate plus everything the enrichment engine derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: CandidateRecord,
    pub summary: String,
    pub use_cases: Vec<String>,
    pub category: String,
    pub pricing: Pricing,
    /// Heuristic popularity score in `0..=100`.
    pub hype_score: u8,
}

// ---------------------------------------------------------------------------
// PersistedTool
// ---------------------------------------------------------------------------

/// A tool row as stored by the storage layer. Identity is `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTool {
    /// Storage-assigned identifier (UUID v7).
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub source: SourceTag,
    pub summary: Option<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
    pub category: Option<String>,
    pub pricing: Option<Pricing>,
    pub hype_score: Option<u8>,
    pub stars: Option<u64>,
    pub today_stars: Option<u64>,
    pub likes: Option<u64>,
    pub downloads: Option<u64>,
    pub upvotes: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub pipeline_tag: Option<String>,
    pub sdk: Option<String>,
    /// Set once on first insert.
    pub discovered_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a tool seen for the first time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTool {
    pub name: String,
    pub description: String,
    pub url: String,
    pub source: SourceTag,
    pub summary: String,
    pub use_cases: Vec<String>,
    pub category: String,
    pub pricing: Pricing,
    pub hype_score: u8,
    pub stars: Option<u64>,
    pub today_stars: Option<u64>,
    pub likes: Option<u64>,
    pub downloads: Option<u64>,
    pub upvotes: Option<u64>,
    pub tags: Vec<String>,
    pub pipeline_tag: Option<String>,
    pub sdk: Option<String>,
    pub discovered_date: DateTime<Utc>,
}

impl NewTool {
    /// Build an insert payload, stamping `discovered_date`.
    pub fn from_enriched(enriched: &EnrichedRecord, discovered_date: DateTime<Utc>) -> Self {
        let r = &enriched.record;
        Self {
            name: r.name.clone(),
            description: r.description.clone(),
            url: r.url.clone(),
            source: r.source,
            summary: enriched.summary.clone(),
            use_cases: enriched.use_cases.clone(),
            category: enriched.category.clone(),
            pricing: enriched.pricing,
            hype_score: enriched.hype_score,
            stars: r.stars,
            today_stars: r.today_stars,
            likes: r.likes,
            downloads: r.downloads,
            upvotes: r.upvotes,
            tags: r.tags.clone(),
            pipeline_tag: r.pipeline_tag.clone(),
            sdk: r.sdk.clone(),
            discovered_date,
        }
    }
}

/// Partial update payload. `None` fields are left untouched.
///
/// `id` and `discovered_date` are deliberately not representable here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUpdate {
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hype_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
}

impl ToolUpdate {
    /// An update that only refreshes `updated_at`.
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            description: None,
            hype_score: None,
            summary: None,
            use_cases: None,
            category: None,
            pricing: None,
        }
    }

    /// Volatile fields refreshed when a known tool is seen again.
    pub fn resighting(enriched: &EnrichedRecord, updated_at: DateTime<Utc>) -> Self {
        Self {
            description: Some(enriched.record.description.clone()),
            hype_score: Some(enriched.hype_score),
            ..Self::touch(updated_at)
        }
    }

    /// All enrichment-derived fields, used by re-analysis.
    pub fn enrichment(enriched: &EnrichedRecord, updated_at: DateTime<Utc>) -> Self {
        Self {
            summary: Some(enriched.summary.clone()),
            use_cases: Some(enriched.use_cases.clone()),
            category: Some(enriched.category.clone()),
            pricing: Some(enriched.pricing),
            hype_score: Some(enriched.hype_score),
            ..Self::touch(updated_at)
        }
    }
}

// ---------------------------------------------------------------------------
// Run statistics
// ---------------------------------------------------------------------------

/// Run-level outcome vocabulary shared by the CLI and any API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Warning,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phases of a scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    Idle,
    Scraping,
    Analyzing,
    Persisting,
    Reporting,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Scraping => "scraping",
            Self::Analyzing => "analyzing",
            Self::Persisting => "persisting",
            Self::Reporting => "reporting",
        };
        f.write_str(s)
    }
}

/// Per-source counters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub source: SourceTag,
    pub scraped: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Duplicates that were neither inserted nor updated.
    pub skipped: usize,
    /// Record-level failures (normalization or storage).
    pub failed: usize,
    /// Why the source delivered nothing, if it failed as a whole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SourceStats {
    pub fn new(source: SourceTag) -> Self {
        Self {
            source,
            scraped: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            failure: None,
        }
    }
}

/// Aggregate report for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub status: RunStatus,
    /// Per-source counters, in adapter order.
    pub sources: Vec<SourceStats>,
    pub total_scraped: usize,
    pub total_enriched: usize,
    pub total_inserted: usize,
    pub total_updated: usize,
    pub total_skipped: usize,
    pub total_failed: usize,
    /// Phases visited, in order.
    pub phases: Vec<ScanPhase>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl RunStatistics {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            status: RunStatus::Success,
            sources: Vec::new(),
            total_scraped: 0,
            total_enriched: 0,
            total_inserted: 0,
            total_updated: 0,
            total_skipped: 0,
            total_failed: 0,
            phases: Vec::new(),
            started_at,
            elapsed_ms: 0,
        }
    }

    /// Counters for `source`, if that source took part in the run.
    pub fn source(&self, source: SourceTag) -> Option<&SourceStats> {
        self.sources.iter().find(|s| s.source == source)
    }

    /// Recompute run totals from the per-source counters.
    ///
    /// `total_enriched` is tracked by the orchestrator and left as is.
    pub fn recompute_totals(&mut self) {
        self.total_scraped = self.sources.iter().map(|s| s.scraped).sum();
        self.total_inserted = self.sources.iter().map(|s| s.inserted).sum();
        self.total_updated = self.sources.iter().map(|s| s.updated).sum();
        self.total_skipped = self.sources.iter().map(|s| s.skipped).sum();
        self.total_failed = self.sources.iter().map(|s| s.failed).sum();
    }

    /// Whether the run went through the given phase.
    pub fn visited(&self, phase: ScanPhase) -> bool {
        self.phases.contains(&phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tag_roundtrip() {
        for tag in SourceTag::ALL {
            let parsed: SourceTag = tag.as_str().parse().expect("parse tag");
            assert_eq!(parsed, tag);

            let json = serde_json::to_string(&tag).expect("serialize");
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
        assert!("gitlab".parse::<SourceTag>().is_err());
    }

    #[test]
    fn pricing_parses_case_insensitively() {
        assert_eq!("Freemium".parse::<Pricing>().unwrap(), Pricing::Freemium);
        assert_eq!(Pricing::Paid.to_string(), "paid");
        assert!("cheap".parse::<Pricing>().is_err());
    }

    #[test]
    fn type_hint_prefers_pipeline_tag() {
        let mut record = CandidateRecord::new("m", "", "", SourceTag::HuggingFace);
        assert_eq!(record.type_hint(), None);

        record.sdk = Some("gradio".into());
        assert_eq!(record.type_hint(), Some("gradio"));

        record.pipeline_tag = Some("text-generation".into());
        assert_eq!(record.type_hint(), Some("text-generation"));

        record.pipeline_tag = Some("  ".into());
        assert_eq!(record.type_hint(), Some("gradio"));
    }

    #[test]
    fn enriched_record_serializes_flat() {
        let enriched = EnrichedRecord {
            record: CandidateRecord::new(
                "org/model",
                "A model",
                "https://huggingface.co/org/model",
                SourceTag::HuggingFace,
            ),
            summary: "A model".into(),
            use_cases: vec!["Text Generation".into()],
            category: "NLP".into(),
            pricing: Pricing::Unknown,
            hype_score: 55,
        };

        let value = serde_json::to_value(&enriched).expect("serialize");
        assert_eq!(value["name"], "org/model");
        assert_eq!(value["source"], "huggingface");
        assert_eq!(value["pricing"], "unknown");
        assert_eq!(value["hype_score"], 55);
    }

    #[test]
    fn resighting_update_only_touches_volatile_fields() {
        let enriched = EnrichedRecord {
            record: CandidateRecord::new("x", "new text", "https://x.dev", SourceTag::GitHub),
            summary: "s".into(),
            use_cases: vec![],
            category: "Code".into(),
            pricing: Pricing::Free,
            hype_score: 70,
        };
        let now = Utc::now();
        let update = ToolUpdate::resighting(&enriched, now);
        assert_eq!(update.description.as_deref(), Some("new text"));
        assert_eq!(update.hype_score, Some(70));
        assert!(update.summary.is_none());
        assert!(update.category.is_none());
        assert!(update.pricing.is_none());
        assert_eq!(update.updated_at, now);
    }

    #[test]
    fn run_statistics_totals() {
        let mut stats = RunStatistics::new(Utc::now());
        let mut gh = SourceStats::new(SourceTag::GitHub);
        gh.scraped = 4;
        gh.inserted = 2;
        gh.failed = 1;
        gh.skipped = 1;
        let mut hf = SourceStats::new(SourceTag::HuggingFace);
        hf.scraped = 3;
        hf.updated = 3;
        stats.sources = vec![gh, hf];
        stats.recompute_totals();

        assert_eq!(stats.total_scraped, 7);
        assert_eq!(stats.total_inserted, 2);
        assert_eq!(stats.total_updated, 3);
        assert_eq!(stats.total_failed, 1);
        assert_eq!(stats.source(SourceTag::HuggingFace).unwrap().updated, 3);
        assert!(stats.source(SourceTag::ProductHunt).is_none());
    }
}

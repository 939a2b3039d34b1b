//! Enrichment engine: summary, use cases, pricing, category and hype score.
//!
//! Every step is deterministic except the optional remote summary, which
//! degrades to truncation on any failure. [`Analyzer::enrich`] never fails.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use aitracker_shared::{
    CandidateRecord, EnrichedRecord, Pricing, ScoringConfig,
    text::{title_case, truncate_chars},
};

use crate::summarizer::SummaryBackend;

/// Descriptions shorter than this are used verbatim as the summary.
const MIN_SUMMARIZE_CHARS: usize = 50;
/// Input sent to the remote summarizer is capped at this many characters.
const MAX_SUMMARY_INPUT_CHARS: usize = 1000;
/// Deterministic fallback keeps this many characters.
const FALLBACK_SUMMARY_CHARS: usize = 200;
const MAX_USE_CASES: usize = 5;
const TAGS_AS_USE_CASES: usize = 3;
const BASE_HYPE: f64 = 50.0;
const DEFAULT_CATEGORY: &str = "General AI";

/// Keyword → use case, scanned in order.
const USE_CASE_TABLE: &[(&str, &str)] = &[
    ("chat", "Conversational AI"),
    ("image", "Image Generation/Processing"),
    ("video", "Video Editing/Generation"),
    ("code", "Code Generation"),
    ("text", "Text Generation"),
    ("translation", "Language Translation"),
    ("speech", "Speech Recognition/Synthesis"),
    ("search", "Intelligent Search"),
    ("automation", "Workflow Automation"),
    ("analysis", "Data Analysis"),
    ("writing", "Content Writing"),
    ("design", "Design Assistance"),
    ("research", "Research Assistant"),
];

/// Category → keywords. The first category with any match wins.
const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    ("NLP", &["nlp", "text", "language", "chat", "gpt", "translation"]),
    (
        "Computer Vision",
        &["vision", "image", "video", "object detection", "ocr"],
    ),
    ("Audio", &["speech", "audio", "voice", "music", "sound"]),
    ("Code", &["code", "programming", "developer", "github copilot"]),
    (
        "Generative AI",
        &["generate", "creation", "diffusion", "stable diffusion"],
    ),
    ("Data Science", &["data", "analysis", "ml", "machine learning"]),
    ("Automation", &["automation", "workflow", "agent", "autonomous"]),
];

const FREE_MARKERS: &[&str] = &["free", "open source", "open-source", "no cost"];
const PREMIUM_MARKERS: &[&str] = &["premium", "pro", "paid", "subscription"];
const PAID_MARKERS: &[&str] = &["paid", "subscription", "pricing", "$"];

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Derives enrichment fields for candidate records.
pub struct Analyzer {
    backend: Option<Arc<dyn SummaryBackend>>,
    scoring: ScoringConfig,
    summary_timeout: Duration,
    max_summary_tokens: u32,
}

impl Analyzer {
    pub fn new(backend: Option<Arc<dyn SummaryBackend>>, scoring: ScoringConfig) -> Self {
        Self {
            backend,
            scoring,
            summary_timeout: Duration::from_secs(10),
            max_summary_tokens: 150,
        }
    }

    /// Override the remote summary bounds (timeout and max tokens).
    pub fn with_summary_limits(mut self, timeout: Duration, max_tokens: u32) -> Self {
        self.summary_timeout = timeout;
        self.max_summary_tokens = max_tokens;
        self
    }

    /// Enrich a normalized candidate.
    #[instrument(skip_all, fields(name = %record.name, source = %record.source))]
    pub async fn enrich(&self, record: CandidateRecord) -> EnrichedRecord {
        let summary = self.summarize(&record.description).await;
        let use_cases = extract_use_cases(&record.description, &record.tags);
        let pricing = detect_pricing(&record.description);
        let category = categorize(&record);
        let hype_score = hype_score(&record, self.scoring.bonus_for(record.source));

        debug!(%category, %pricing, hype_score, "record enriched");

        EnrichedRecord {
            record,
            summary,
            use_cases,
            category,
            pricing,
            hype_score,
        }
    }

    /// Short summary of `description`, remote when possible.
    pub async fn summarize(&self, description: &str) -> String {
        if description.chars().count() < MIN_SUMMARIZE_CHARS {
            return description.to_string();
        }

        let Some(backend) = &self.backend else {
            return fallback_summary(description);
        };

        let input = truncate_chars(description, MAX_SUMMARY_INPUT_CHARS);
        let call = backend.summarize(input, self.max_summary_tokens);

        match tokio::time::timeout(self.summary_timeout, call).await {
            Ok(Ok(summary)) if !summary.trim().is_empty() => summary,
            Ok(Ok(_)) => {
                warn!("summarizer returned an empty summary, using fallback");
                fallback_summary(description)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "summarizer failed, using fallback");
                fallback_summary(description)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.summary_timeout.as_millis() as u64,
                    "summarizer timed out, using fallback"
                );
                fallback_summary(description)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Deterministic steps
// ---------------------------------------------------------------------------

/// First 200 characters plus `...`; shorter text is returned unchanged.
pub fn fallback_summary(text: &str) -> String {
    if text.chars().count() <= FALLBACK_SUMMARY_CHARS {
        text.to_string()
    } else {
        format!("{}...", truncate_chars(text, FALLBACK_SUMMARY_CHARS))
    }
}

/// Keyword-table matches in table order, then up to three title-cased tags.
/// At most five entries, no duplicates.
pub fn extract_use_cases(description: &str, tags: &[String]) -> Vec<String> {
    let text = description.to_lowercase();

    let mut use_cases: Vec<String> = USE_CASE_TABLE
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, case)| case.to_string())
        .collect();

    for tag in tags.iter().take(TAGS_AS_USE_CASES) {
        let candidate = title_case(tag);
        if !use_cases.contains(&candidate) {
            use_cases.push(candidate);
        }
    }

    use_cases.truncate(MAX_USE_CASES);
    use_cases
}

/// Pricing tier from marker words in the description.
pub fn detect_pricing(description: &str) -> Pricing {
    let text = description.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| text.contains(m));

    if has_any(FREE_MARKERS) {
        if has_any(PREMIUM_MARKERS) {
            Pricing::Freemium
        } else {
            Pricing::Free
        }
    } else if has_any(PAID_MARKERS) {
        Pricing::Paid
    } else {
        Pricing::Unknown
    }
}

/// Category from the keyword table, else the source's type hint, else `General AI`.
pub fn categorize(record: &CandidateRecord) -> String {
    let text = record.description.to_lowercase();

    CATEGORY_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| category.to_string())
        .or_else(|| {
            record
                .type_hint()
                .map(|hint| title_case(&hint.trim().replace('-', " ")))
        })
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Popularity heuristic in `0..=100`.
pub fn hype_score(record: &CandidateRecord, source_bonus: i64) -> u8 {
    fn term(metric: Option<u64>, divisor: f64, cap: f64) -> f64 {
        match metric {
            Some(v) if v > 0 => (v as f64 / divisor).min(cap),
            _ => 0.0,
        }
    }

    let score = BASE_HYPE
        + term(record.stars, 1000.0, 30.0)
        + term(record.today_stars, 100.0, 20.0)
        + term(record.likes, 100.0, 10.0)
        + term(record.downloads, 10_000.0, 10.0)
        + term(record.upvotes, 50.0, 15.0)
        + source_bonus as f64;

    (score.trunc() as i64).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use aitracker_shared::{Result, SourceTag, TrackerError};
    use async_trait::async_trait;

    const LONG_DESCRIPTION: &str = "An open-source framework for building retrieval augmented \
        generation pipelines over your own documents, with connectors for every major vector \
        database, streaming responses, evaluation tooling, and first class observability hooks \
        so that teams can ship reliable assistants quickly.";

    struct FixedBackend(&'static str);

    #[async_trait]
    impl SummaryBackend for FixedBackend {
        async fn summarize(&self, _text: &str, _max_len: u32) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl SummaryBackend for FailingBackend {
        async fn summarize(&self, _text: &str, _max_len: u32) -> Result<String> {
            Err(TrackerError::Enrichment("HTTP 500".into()))
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl SummaryBackend for SlowBackend {
        async fn summarize(&self, _text: &str, _max_len: u32) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".into())
        }
    }

    /// Records the input length it was given.
    struct CountingBackend(AtomicUsize);

    #[async_trait]
    impl SummaryBackend for CountingBackend {
        async fn summarize(&self, text: &str, _max_len: u32) -> Result<String> {
            self.0.store(text.chars().count(), Ordering::SeqCst);
            Ok("ok".into())
        }
    }

    fn record(description: &str, source: SourceTag) -> CandidateRecord {
        CandidateRecord::new("tool", description, "https://example.com/tool", source)
    }

    fn analyzer(backend: Option<Arc<dyn SummaryBackend>>) -> Analyzer {
        Analyzer::new(backend, ScoringConfig::default())
    }

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn short_description_is_its_own_summary() {
        let a = analyzer(Some(Arc::new(FixedBackend("remote"))));
        assert_eq!(a.summarize("A tiny CLI").await, "A tiny CLI");
        assert_eq!(a.summarize("").await, "");
    }

    #[tokio::test]
    async fn remote_summary_is_used() {
        let a = analyzer(Some(Arc::new(FixedBackend("Framework for RAG pipelines."))));
        assert_eq!(a.summarize(LONG_DESCRIPTION).await, "Framework for RAG pipelines.");
    }

    #[tokio::test]
    async fn absent_backend_falls_back() {
        let a = analyzer(None);
        let summary = a.summarize(LONG_DESCRIPTION).await;
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), 203);
    }

    #[tokio::test]
    async fn backend_error_falls_back() {
        let a = analyzer(Some(Arc::new(FailingBackend)));
        assert_eq!(a.summarize(LONG_DESCRIPTION).await, fallback_summary(LONG_DESCRIPTION));
    }

    #[tokio::test]
    async fn empty_remote_summary_falls_back() {
        let a = analyzer(Some(Arc::new(FixedBackend("   "))));
        assert_eq!(a.summarize(LONG_DESCRIPTION).await, fallback_summary(LONG_DESCRIPTION));
    }

    #[tokio::test]
    async fn backend_timeout_falls_back() {
        let a = analyzer(Some(Arc::new(SlowBackend)))
            .with_summary_limits(Duration::from_millis(50), 150);
        assert_eq!(a.summarize(LONG_DESCRIPTION).await, fallback_summary(LONG_DESCRIPTION));
    }

    #[tokio::test]
    async fn remote_input_is_capped() {
        let backend = Arc::new(CountingBackend(AtomicUsize::new(0)));
        let a = analyzer(Some(backend.clone()));
        a.summarize(&"word ".repeat(400)).await;
        assert_eq!(backend.0.load(Ordering::SeqCst), MAX_SUMMARY_INPUT_CHARS);
    }

    #[test]
    fn fallback_keeps_short_text() {
        let text = "x".repeat(200);
        assert_eq!(fallback_summary(&text), text);
        assert_eq!(fallback_summary(&"x".repeat(201)), format!("{}...", "x".repeat(200)));
    }

    // -----------------------------------------------------------------------
    // Use cases / pricing / category
    // -----------------------------------------------------------------------

    #[test]
    fn use_cases_from_keywords_then_tags() {
        let tags: Vec<String> = ["text-generation", "pytorch", "en", "ignored"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let cases = extract_use_cases("A chat assistant", &tags);
        assert_eq!(
            cases,
            vec!["Conversational AI", "Text-Generation", "Pytorch", "En"]
        );
    }

    #[test]
    fn use_cases_are_capped_and_unique() {
        let description = "chat image video code text translation speech search";
        let tags = vec!["Conversational AI".to_string()];
        let cases = extract_use_cases(description, &tags);
        assert_eq!(cases.len(), MAX_USE_CASES);
        assert_eq!(cases[0], "Conversational AI");

        let duplicate_tags = vec!["nlp".to_string(), "NLP".to_string()];
        let cases = extract_use_cases("chat", &duplicate_tags);
        assert_eq!(cases, vec!["Conversational AI", "Nlp"]);
    }

    #[test]
    fn pricing_detection() {
        assert_eq!(detect_pricing("Totally FREE forever"), Pricing::Free);
        assert_eq!(detect_pricing("Open source core with a premium cloud"), Pricing::Freemium);
        assert_eq!(detect_pricing("Plans from $10/month"), Pricing::Paid);
        assert_eq!(detect_pricing("A tool for writers"), Pricing::Unknown);
    }

    #[test]
    fn freemium_chatbot_scenario() {
        let description =
            "A free open-source chatbot for conversational AI with pro subscription tier";
        let r = record(description, SourceTag::ProductHunt);

        assert_eq!(detect_pricing(description), Pricing::Freemium);
        assert_eq!(categorize(&r), "NLP");
        assert!(extract_use_cases(description, &[]).contains(&"Conversational AI".to_string()));
    }

    #[test]
    fn category_table_order_wins() {
        // Matches both Computer Vision (image) and Code (code).
        let r = record("Turn code screenshots into image captions", SourceTag::GitHub);
        assert_eq!(categorize(&r), "Computer Vision");
    }

    #[test]
    fn category_falls_back_to_hints() {
        let mut r = record("Weights for a small model", SourceTag::HuggingFace);
        r.pipeline_tag = Some("zero-shot-classification".into());
        assert_eq!(categorize(&r), "Zero Shot Classification");

        let mut space = record("Weights for a small model", SourceTag::HuggingFaceSpace);
        space.sdk = Some("gradio".into());
        assert_eq!(categorize(&space), "Gradio");

        let bare = record("Weights for a small model", SourceTag::HuggingFace);
        assert_eq!(categorize(&bare), DEFAULT_CATEGORY);
    }

    // -----------------------------------------------------------------------
    // Hype score
    // -----------------------------------------------------------------------

    #[test]
    fn stars_with_github_bonus() {
        let mut r = record("x", SourceTag::GitHub);
        r.stars = Some(5000);
        r.today_stars = Some(0);
        assert_eq!(hype_score(&r, ScoringConfig::default().bonus_for(SourceTag::GitHub)), 60);
    }

    #[test]
    fn hype_uses_real_division_and_truncates() {
        let mut r = record("x", SourceTag::HuggingFace);
        r.likes = Some(150); // +1.5
        r.downloads = Some(25_000); // +2.5
        assert_eq!(hype_score(&r, 0), 54);
    }

    #[test]
    fn hype_is_bounded() {
        let mut r = record("x", SourceTag::ProductHunt);
        r.stars = Some(u64::MAX);
        r.today_stars = Some(u64::MAX);
        r.likes = Some(u64::MAX);
        r.downloads = Some(u64::MAX);
        r.upvotes = Some(u64::MAX);
        assert_eq!(hype_score(&r, 10), 100);

        let plain = record("x", SourceTag::HuggingFace);
        assert_eq!(hype_score(&plain, 0), 50);
        assert_eq!(hype_score(&plain, -500), 0);
    }

    #[tokio::test]
    async fn enrich_fills_every_field() {
        let mut r = record("A free text summarization model", SourceTag::HuggingFace);
        r.likes = Some(1000);
        r.tags = vec!["summarization".into()];

        let enriched = analyzer(None).enrich(r).await;
        assert_eq!(enriched.summary, "A free text summarization model");
        assert_eq!(enriched.pricing, Pricing::Free);
        assert_eq!(enriched.category, "NLP");
        assert_eq!(enriched.use_cases, vec!["Text Generation", "Summarization"]);
        assert_eq!(enriched.hype_score, 60);
        assert_eq!(enriched.record.name, "tool");
    }
}

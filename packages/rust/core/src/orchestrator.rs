//! Scan orchestration: scrape → analyze → persist → report.
//!
//! A scan walks the [`ScanPhase`] state machine once. Adapters run
//! concurrently, each in its own task under a timeout; records are then
//! normalized, enriched and persisted sequentially by a single writer.
//! Per-source and per-record problems are counted, never raised.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use aitracker_shared::{
    AppConfig, CandidateRecord, EnrichedRecord, Result, RunStatistics, RunStatus, ScanPhase,
    SourceStats, SourceTag, SourcesConfig, TrackerError,
};
use aitracker_sources::{FetchQuery, SourceAdapter, SourceBatch, build_adapters};
use aitracker_storage::{ToolFilter, ToolOrder, ToolStore};

use crate::analyzer::Analyzer;
use crate::normalizer::normalize;
use crate::summarizer::SummaryBackend;
use crate::upsert::{UpsertCoordinator, UpsertOutcome};

/// A smoke-test scan touches at most this many sources.
const MAX_TEST_SOURCES: usize = 2;

/// Outcome of [`Orchestrator::reanalyze_since`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReanalysisReport {
    pub examined: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Drives scans over a fixed set of adapters.
pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    test_adapters: Vec<Arc<dyn SourceAdapter>>,
    store: Arc<dyn ToolStore>,
    analyzer: Analyzer,
    upserts: UpsertCoordinator,
    sources: SourcesConfig,
    adapter_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        store: Arc<dyn ToolStore>,
        analyzer: Analyzer,
        sources: SourcesConfig,
    ) -> Self {
        Self {
            adapters,
            test_adapters: Vec::new(),
            upserts: UpsertCoordinator::new(Arc::clone(&store)),
            store,
            analyzer,
            adapter_timeout: sources.adapter_timeout(),
            sources,
        }
    }

    /// Adapters used by [`run_test_scan`](Self::run_test_scan). Only the first two are kept.
    pub fn with_test_adapters(mut self, mut adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        adapters.truncate(MAX_TEST_SOURCES);
        self.test_adapters = adapters;
        self
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// Build adapters, analyzer and upsert path from configuration.
    ///
    /// Fails when sources are enabled but none of them could be initialized.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn ToolStore>,
        backend: Option<Arc<dyn SummaryBackend>>,
    ) -> Result<Self> {
        let (adapters, errors) = build_adapters(&config.sources.enabled, &config.sources);
        if adapters.is_empty() && !errors.is_empty() {
            return Err(TrackerError::orchestration(format!(
                "all {} source adapters failed to initialize",
                errors.len()
            )));
        }

        let test_tags: Vec<SourceTag> = config
            .sources
            .test_sources
            .iter()
            .copied()
            .take(MAX_TEST_SOURCES)
            .collect();
        let (test_adapters, _) = build_adapters(&test_tags, &config.sources);

        let analyzer = Analyzer::new(backend, config.scoring.clone()).with_summary_limits(
            config.summarizer.timeout(),
            config.summarizer.max_summary_tokens,
        );

        Ok(Self::new(adapters, store, analyzer, config.sources.clone())
            .with_test_adapters(test_adapters))
    }

    // -----------------------------------------------------------------------
    // Full scan
    // -----------------------------------------------------------------------

    /// Run one full scan over every configured source.
    ///
    /// Only fails when the scan cannot start at all.
    #[instrument(skip_all, fields(sources = self.adapters.len()))]
    pub async fn run_scan(&self) -> Result<RunStatistics> {
        let clock = Instant::now();
        let mut stats = RunStatistics::new(Utc::now());
        let mut batches: Vec<SourceBatch> = Vec::new();
        let mut enriched: Vec<(usize, EnrichedRecord)> = Vec::new();
        let mut phase = ScanPhase::Idle;

        loop {
            stats.phases.push(phase);

            phase = match phase {
                ScanPhase::Idle => {
                    if self.adapters.is_empty() {
                        error!("no source adapters configured, scan aborted");
                        return Err(TrackerError::orchestration(
                            "no source adapters configured",
                        ));
                    }
                    info!("scan started");
                    ScanPhase::Scraping
                }

                ScanPhase::Scraping => {
                    batches = self
                        .scrape(&self.adapters, |tag| self.sources.limit_for(tag))
                        .await;

                    stats.sources = batches
                        .iter()
                        .map(|batch| SourceStats {
                            scraped: batch.records.len(),
                            failure: batch.failure.clone(),
                            ..SourceStats::new(batch.source)
                        })
                        .collect();
                    stats.total_scraped = stats.sources.iter().map(|s| s.scraped).sum();

                    ScanPhase::Analyzing
                }

                ScanPhase::Analyzing => {
                    let mut failed = vec![0usize; batches.len()];
                    enriched = self
                        .analyze(std::mem::take(&mut batches), &mut failed)
                        .await;
                    for (source, count) in stats.sources.iter_mut().zip(failed) {
                        source.failed += count;
                    }
                    stats.total_enriched = enriched.len();

                    if stats.total_scraped == 0 || enriched.is_empty() {
                        warn!(
                            scraped = stats.total_scraped,
                            enriched = enriched.len(),
                            "nothing to persist"
                        );
                        ScanPhase::Reporting
                    } else {
                        ScanPhase::Persisting
                    }
                }

                ScanPhase::Persisting => {
                    for (idx, record) in std::mem::take(&mut enriched) {
                        let outcome = self.upserts.upsert(record).await;
                        let source = &mut stats.sources[idx];
                        match outcome {
                            UpsertOutcome::Inserted => source.inserted += 1,
                            UpsertOutcome::Updated => source.updated += 1,
                            UpsertOutcome::Skipped => source.skipped += 1,
                            UpsertOutcome::Failed => source.failed += 1,
                        }
                    }
                    ScanPhase::Reporting
                }

                ScanPhase::Reporting => {
                    stats.recompute_totals();
                    stats.status = if stats.total_scraped == 0 || stats.total_enriched == 0 {
                        RunStatus::Warning
                    } else {
                        RunStatus::Success
                    };
                    stats.elapsed_ms = clock.elapsed().as_millis() as u64;
                    log_report(&stats);
                    return Ok(stats);
                }
            };
        }
    }

    // -----------------------------------------------------------------------
    // Test scan
    // -----------------------------------------------------------------------

    /// Bounded smoke test: scrape and enrich a few records from at most two
    /// sources without persisting anything.
    #[instrument(skip_all, fields(sources = self.test_adapters.len()))]
    pub async fn run_test_scan(&self) -> Result<Vec<EnrichedRecord>> {
        if self.test_adapters.is_empty() {
            return Err(TrackerError::orchestration(
                "no test source adapters configured",
            ));
        }

        let limit = self.sources.test_limit;
        let batches = self.scrape(&self.test_adapters, |_| limit).await;
        let mut failed = vec![0usize; batches.len()];
        let enriched = self.analyze(batches, &mut failed).await;

        info!(
            enriched = enriched.len(),
            failed = failed.iter().sum::<usize>(),
            "test scan complete"
        );
        Ok(enriched.into_iter().map(|(_, record)| record).collect())
    }

    // -----------------------------------------------------------------------
    // Re-analysis
    // -----------------------------------------------------------------------

    /// Re-run enrichment for tools discovered at or after `since` and store
    /// the refreshed analysis. Per-tool failures are counted, not raised.
    #[instrument(skip_all, fields(since = %since))]
    pub async fn reanalyze_since(&self, since: DateTime<Utc>) -> Result<ReanalysisReport> {
        let filter = ToolFilter {
            discovered_since: Some(since),
            ..Default::default()
        };
        let tools = self.store.list(&filter, ToolOrder::Newest, u32::MAX).await?;

        let mut report = ReanalysisReport {
            examined: tools.len(),
            ..Default::default()
        };

        for tool in &tools {
            let record = self.analyzer.enrich(CandidateRecord::from(tool)).await;
            match self.upserts.apply_enrichment(&tool.id, &record).await {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    warn!(name = %tool.name, id = %tool.id, error = %e, "re-analysis failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            updated = report.updated,
            failed = report.failed,
            "re-analysis complete"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    /// Fetch from every adapter concurrently. Batches come back in adapter order.
    async fn scrape(
        &self,
        adapters: &[Arc<dyn SourceAdapter>],
        limit_for: impl Fn(SourceTag) -> usize,
    ) -> Vec<SourceBatch> {
        let timeout = self.adapter_timeout;

        let handles: Vec<_> = adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let tag = adapter.tag();
                let query = FetchQuery::new(limit_for(tag));
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(timeout, adapter.fetch(&query)).await
                });
                (tag, handle)
            })
            .collect();

        let mut batches = Vec::with_capacity(handles.len());
        for (tag, handle) in handles {
            let batch = match handle.await {
                Ok(Ok(batch)) => batch,
                Ok(Err(_)) => {
                    warn!(source = %tag, timeout_ms = timeout.as_millis() as u64, "source timed out");
                    SourceBatch::failed(tag, format!("timed out after {}ms", timeout.as_millis()))
                }
                Err(e) => {
                    error!(source = %tag, error = %e, "source task aborted");
                    SourceBatch::failed(tag, format!("adapter task failed: {e}"))
                }
            };
            batches.push(batch);
        }
        batches
    }

    /// Normalize and enrich every record. Returns each survivor with the
    /// index of its batch; normalization failures are counted in `failed`.
    async fn analyze(
        &self,
        batches: Vec<SourceBatch>,
        failed: &mut [usize],
    ) -> Vec<(usize, EnrichedRecord)> {
        let mut out = Vec::new();

        for (idx, batch) in batches.into_iter().enumerate() {
            for record in batch.records {
                match normalize(record) {
                    Ok(record) => out.push((idx, self.analyzer.enrich(record).await)),
                    Err(e) => {
                        warn!(source = %batch.source, error = %e, "dropping invalid record");
                        failed[idx] += 1;
                    }
                }
            }
        }
        out
    }
}

fn log_report(stats: &RunStatistics) {
    for source in &stats.sources {
        info!(
            source = %source.source,
            scraped = source.scraped,
            inserted = source.inserted,
            updated = source.updated,
            skipped = source.skipped,
            failed = source.failed,
            failure = source.failure.as_deref().unwrap_or(""),
            "source summary"
        );
    }
    info!(
        status = %stats.status,
        scraped = stats.total_scraped,
        enriched = stats.total_enriched,
        inserted = stats.total_inserted,
        updated = stats.total_updated,
        skipped = stats.total_skipped,
        failed = stats.total_failed,
        elapsed_ms = stats.elapsed_ms,
        "scan complete"
    );
}

//! Deduplication and persistence of enriched records.
//!
//! Identity is the canonical URL. A same-named tool from the same source is
//! treated as a duplicate whose URL form changed; a same-named tool from a
//! different source is a distinct tool.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use aitracker_shared::{EnrichedRecord, NewTool, PersistedTool, Result, ToolUpdate};
use aitracker_storage::ToolStore;

use crate::normalizer::ensure_url;

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Duplicate of an existing tool; nothing written.
    Skipped,
    /// Storage error; the record was not committed.
    Failed,
}

/// Writes enriched records through a [`ToolStore`].
pub struct UpsertCoordinator {
    store: Arc<dyn ToolStore>,
}

impl UpsertCoordinator {
    pub fn new(store: Arc<dyn ToolStore>) -> Self {
        Self { store }
    }

    /// Insert or refresh a record. Storage errors are logged and reported as
    /// [`UpsertOutcome::Failed`], never propagated.
    pub async fn upsert(&self, mut record: EnrichedRecord) -> UpsertOutcome {
        ensure_url(&mut record.record);

        match self.try_upsert(&record).await {
            Ok(outcome) => {
                debug!(name = %record.record.name, ?outcome, "record persisted");
                outcome
            }
            Err(e) => {
                error!(
                    name = %record.record.name,
                    url = %record.record.url,
                    error = %e,
                    "failed to persist record"
                );
                UpsertOutcome::Failed
            }
        }
    }

    async fn try_upsert(&self, record: &EnrichedRecord) -> Result<UpsertOutcome> {
        let now = Utc::now();

        if let Some(existing) = self.store.find_by_url(&record.record.url).await? {
            self.store
                .update(&existing.id, &ToolUpdate::resighting(record, now))
                .await?;
            return Ok(UpsertOutcome::Updated);
        }

        if let Some(existing) = self
            .store
            .find_by_name_and_source(&record.record.name, record.record.source)
            .await?
        {
            debug!(
                name = %record.record.name,
                stored_url = %existing.url,
                url = %record.record.url,
                "same-named tool from the same source, skipping"
            );
            return Ok(UpsertOutcome::Skipped);
        }

        self.store
            .insert(&NewTool::from_enriched(record, now))
            .await?;
        Ok(UpsertOutcome::Inserted)
    }

    /// Overwrite the enrichment fields of an existing tool (re-analysis).
    pub async fn apply_enrichment(
        &self,
        id: &str,
        record: &EnrichedRecord,
    ) -> Result<PersistedTool> {
        self.store
            .update(id, &ToolUpdate::enrichment(record, Utc::now()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, enriched};
    use aitracker_shared::{Pricing, SourceTag};

    fn coordinator() -> (Arc<MemoryStore>, UpsertCoordinator) {
        let store = Arc::new(MemoryStore::default());
        let coordinator = UpsertCoordinator::new(store.clone());
        (store, coordinator)
    }

    #[tokio::test]
    async fn identical_record_twice_is_one_tool() {
        let (store, coordinator) = coordinator();
        let record = enriched("org-repo", "https://github.com/org/repo", SourceTag::GitHub);

        assert_eq!(coordinator.upsert(record.clone()).await, UpsertOutcome::Inserted);
        assert_eq!(coordinator.upsert(record).await, UpsertOutcome::Updated);
        assert_eq!(store.tools().len(), 1);
    }

    #[tokio::test]
    async fn update_refreshes_volatile_fields_only() {
        let (store, coordinator) = coordinator();
        let first = enriched("org-repo", "https://github.com/org/repo", SourceTag::GitHub);
        coordinator.upsert(first).await;
        let before = store.tools()[0].clone();

        let mut again = enriched("org-repo", "https://github.com/org/repo", SourceTag::GitHub);
        again.record.description = "Now with agents".into();
        again.hype_score = 91;
        again.category = "Automation".into();
        again.pricing = Pricing::Paid;
        coordinator.upsert(again).await;

        let after = store.tools()[0].clone();
        assert_eq!(after.id, before.id);
        assert_eq!(after.description, "Now with agents");
        assert_eq!(after.hype_score, Some(91));
        assert_eq!(after.category, before.category);
        assert_eq!(after.pricing, before.pricing);
        assert_eq!(after.discovered_date, before.discovered_date);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn same_name_same_source_is_skipped() {
        let (store, coordinator) = coordinator();
        coordinator
            .upsert(enriched("My Tool", "https://www.producthunt.com/posts/my-tool", SourceTag::ProductHunt))
            .await;

        let moved = enriched("My Tool", "https://www.producthunt.com/products/my-tool", SourceTag::ProductHunt);
        assert_eq!(coordinator.upsert(moved).await, UpsertOutcome::Skipped);
        assert_eq!(store.tools().len(), 1);
    }

    #[tokio::test]
    async fn same_name_other_source_is_distinct() {
        let (store, coordinator) = coordinator();
        coordinator
            .upsert(enriched("whisper", "https://github.com/openai/whisper", SourceTag::GitHub))
            .await;

        let other = enriched("whisper", "https://huggingface.co/whisper", SourceTag::HuggingFace);
        assert_eq!(coordinator.upsert(other).await, UpsertOutcome::Inserted);
        assert_eq!(store.tools().len(), 2);
    }

    #[tokio::test]
    async fn same_source_duplicate_behind_other_source_is_skipped() {
        let (store, coordinator) = coordinator();
        coordinator
            .upsert(enriched("whisper", "https://github.com/openai/whisper", SourceTag::GitHub))
            .await;
        coordinator
            .upsert(enriched("whisper", "https://huggingface.co/openai/whisper", SourceTag::HuggingFace))
            .await;

        let moved = enriched("whisper", "https://huggingface.co/whisper", SourceTag::HuggingFace);
        assert_eq!(coordinator.upsert(moved).await, UpsertOutcome::Skipped);
        assert_eq!(store.tools().len(), 2);
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_storage() {
        let (store, coordinator) = coordinator();
        let record = enriched("Odd Tool", "not-a-url", SourceTag::GitHub);

        assert_eq!(coordinator.upsert(record).await, UpsertOutcome::Inserted);
        assert_eq!(store.tools()[0].url, "https://placeholder/github/odd-tool");
    }

    #[tokio::test]
    async fn storage_error_is_failed_outcome() {
        let (store, coordinator) = coordinator();
        store.fail_on("https://github.com/org/broken");

        let outcome = coordinator
            .upsert(enriched("broken", "https://github.com/org/broken", SourceTag::GitHub))
            .await;
        assert_eq!(outcome, UpsertOutcome::Failed);
        assert!(store.tools().is_empty());
    }

    #[tokio::test]
    async fn apply_enrichment_overwrites_analysis() {
        let (store, coordinator) = coordinator();
        coordinator
            .upsert(enriched("m", "https://huggingface.co/m", SourceTag::HuggingFace))
            .await;
        let id = store.tools()[0].id.clone();

        let mut refreshed = enriched("m", "https://huggingface.co/m", SourceTag::HuggingFace);
        refreshed.summary = "new summary".into();
        refreshed.category = "Audio".into();
        refreshed.use_cases = vec!["Speech Recognition/Synthesis".into()];

        let updated = coordinator.apply_enrichment(&id, &refreshed).await.unwrap();
        assert_eq!(updated.summary.as_deref(), Some("new summary"));
        assert_eq!(updated.category.as_deref(), Some("Audio"));
        assert_eq!(updated.use_cases, vec!["Speech Recognition/Synthesis"]);
    }
}

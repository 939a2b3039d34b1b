//! Core ingestion pipeline for the AI tool tracker.
//!
//! This crate ties source adapters, enrichment and storage together:
//! - [`normalizer`]: cleans raw candidates and guarantees a usable URL
//! - [`analyzer`]: summary, use cases, pricing, category, hype score
//! - [`summarizer`]: optional remote summarization backend
//! - [`upsert`]: URL-keyed deduplication and persistence
//! - [`orchestrator`]: the scan state machine (`run_scan`, `run_test_scan`, `reanalyze_since`)

pub mod analyzer;
pub mod normalizer;
pub mod orchestrator;
pub mod summarizer;
pub mod upsert;

#[cfg(test)]
mod test_support;

pub use analyzer::Analyzer;
pub use orchestrator::{Orchestrator, ReanalysisReport};
pub use summarizer::{HuggingFaceSummarizer, SummaryBackend};
pub use upsert::{UpsertCoordinator, UpsertOutcome};

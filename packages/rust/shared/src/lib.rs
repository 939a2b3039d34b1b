//! Shared types, error model, and configuration for the AI tool tracker.
//!
//! This crate is the foundation depended on by all other tracker crates.
//! It provides:
//! - [`TrackerError`]: the unified error type
//! - Domain types ([`CandidateRecord`], [`EnrichedRecord`], [`PersistedTool`], [`RunStatistics`])
//! - Configuration ([`AppConfig`], [`SourcesConfig`], config loading)
//! - Text helpers used on both sides of the pipeline ([`text`])

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ScoringConfig, SourcesConfig, SummarizerConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from,
};
pub use error::{Result, TrackerError};
pub use types::{
    CandidateRecord, EnrichedRecord, NewTool, PersistedTool, Pricing, RunStatistics, RunStatus,
    ScanPhase, SourceStats, SourceTag, ToolUpdate,
};

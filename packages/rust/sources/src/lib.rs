//! Source adapters that discover candidate AI tools.
//!
//! This crate provides:
//! - [`SourceAdapter`]: the fetch contract consumed by the scan orchestrator
//! - [`adapters`]: GitHub trending, Hugging Face models/spaces, Product Hunt
//! - [`build_adapters`]: constructs the enabled adapters from configuration

pub mod adapters;
mod http;

pub use adapters::{
    FetchQuery, GitHubTrendingAdapter, HuggingFaceModelsAdapter, HuggingFaceSpacesAdapter,
    ProductHuntAdapter, SourceAdapter, SourceBatch, build_adapter, build_adapters, is_relevant,
    parse_star_count,
};

//! Remote summarization backend.
//!
//! The enrichment engine only depends on the [`SummaryBackend`] trait; the
//! built-in implementation calls the Hugging Face Inference API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use aitracker_shared::{Result, SummarizerConfig, TrackerError};

/// Lower bound requested from the model, clamped to `max_len`.
const MIN_SUMMARY_TOKENS: u32 = 50;

/// Something that can condense a description into a short summary.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Summarize `text` in at most `max_len` tokens.
    async fn summarize(&self, text: &str, max_len: u32) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: SummarizeParameters,
}

#[derive(Debug, Serialize)]
struct SummarizeParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary_text: Option<String>,
}

/// Hugging Face Inference API summarizer (`POST {api_url}/{model}`).
pub struct HuggingFaceSummarizer {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HuggingFaceSummarizer {
    pub fn new(api_url: &str, model: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/{model}", api_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Build from config. Returns `None` when the credential env var is unset,
    /// which disables the remote path.
    pub fn from_config(config: &SummarizerConfig) -> Result<Option<Self>> {
        match config.api_key() {
            Some(key) => Ok(Some(Self::new(
                &config.api_url,
                &config.model,
                key,
                config.timeout(),
            )?)),
            None => {
                debug!(env = %config.api_key_env, "no summarizer credential, remote summaries disabled");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SummaryBackend for HuggingFaceSummarizer {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, chars = text.len()))]
    async fn summarize(&self, text: &str, max_len: u32) -> Result<String> {
        let body = SummarizeRequest {
            inputs: text,
            parameters: SummarizeParameters {
                max_length: max_len,
                min_length: MIN_SUMMARY_TOKENS.min(max_len),
                do_sample: false,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::Enrichment(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Enrichment(format!(
                "summarizer returned HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: Vec<SummarizeResponse> = response
            .json()
            .await
            .map_err(|e| TrackerError::Enrichment(format!("invalid response: {e}")))?;

        parsed
            .into_iter()
            .next()
            .and_then(|r| r.summary_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrackerError::Enrichment("empty summary".into()))
    }
}

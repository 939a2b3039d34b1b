//! Application configuration for the AI tool tracker.
//!
//! User config lives at `~/.aitracker/aitracker.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::types::SourceTag;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "aitracker.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".aitracker";

// ---------------------------------------------------------------------------
// Config structs (matching aitracker.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Remote summarization backend.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Source adapters.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Hype score tuning.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path of the libSQL database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.aitracker/tools.db".into()
}

/// `[summarizer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Inference API base URL; the model id is appended.
    #[serde(default = "default_summarizer_url")]
    pub api_url: String,

    /// Summarization model id.
    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// Timeout for one summarization call.
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on the generated summary length, in tokens.
    #[serde(default = "default_max_summary_tokens")]
    pub max_summary_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_url: default_summarizer_url(),
            model: default_summarizer_model(),
            timeout_secs: default_summarizer_timeout(),
            max_summary_tokens: default_max_summary_tokens(),
        }
    }
}

impl SummarizerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured env var, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

fn default_api_key_env() -> String {
    "HUGGINGFACE_API_KEY".into()
}
fn default_summarizer_url() -> String {
    "https://api-inference.huggingface.co/models".into()
}
fn default_summarizer_model() -> String {
    "facebook/bart-large-cnn".into()
}
fn default_summarizer_timeout() -> u64 {
    10
}
fn default_max_summary_tokens() -> u32 {
    150
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Sources used by a full scan, in scan order.
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<SourceTag>,

    /// Sources used by a smoke-test scan (at most two are used).
    #[serde(default = "default_test_sources")]
    pub test_sources: Vec<SourceTag>,

    /// Per-source limit for a smoke-test scan.
    #[serde(default = "default_test_limit")]
    pub test_limit: usize,

    /// Timeout for a single outbound HTTP request.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Timeout for one adapter's whole fetch.
    #[serde(default = "default_adapter_timeout")]
    pub adapter_timeout_secs: u64,

    /// Politeness delay between page fetches within one source.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// User-Agent sent to HTML sources.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// GitHub trending language filter.
    #[serde(default = "default_github_language")]
    pub github_language: String,

    #[serde(default = "default_github_limit")]
    pub github_limit: usize,
    #[serde(default = "default_huggingface_limit")]
    pub huggingface_limit: usize,
    #[serde(default = "default_huggingface_space_limit")]
    pub huggingface_space_limit: usize,
    #[serde(default = "default_producthunt_limit")]
    pub producthunt_limit: usize,

    #[serde(default = "default_github_base_url")]
    pub github_base_url: String,
    #[serde(default = "default_huggingface_api_url")]
    pub huggingface_api_url: String,
    #[serde(default = "default_huggingface_site_url")]
    pub huggingface_site_url: String,
    #[serde(default = "default_producthunt_base_url")]
    pub producthunt_base_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
            test_sources: default_test_sources(),
            test_limit: default_test_limit(),
            fetch_timeout_secs: default_fetch_timeout(),
            adapter_timeout_secs: default_adapter_timeout(),
            request_delay_ms: default_request_delay(),
            user_agent: default_user_agent(),
            github_language: default_github_language(),
            github_limit: default_github_limit(),
            huggingface_limit: default_huggingface_limit(),
            huggingface_space_limit: default_huggingface_space_limit(),
            producthunt_limit: default_producthunt_limit(),
            github_base_url: default_github_base_url(),
            huggingface_api_url: default_huggingface_api_url(),
            huggingface_site_url: default_huggingface_site_url(),
            producthunt_base_url: default_producthunt_base_url(),
        }
    }
}

impl SourcesConfig {
    /// Configured batch limit for `source`.
    pub fn limit_for(&self, source: SourceTag) -> usize {
        match source {
            SourceTag::GitHub => self.github_limit,
            SourceTag::HuggingFace => self.huggingface_limit,
            SourceTag::HuggingFaceSpace => self.huggingface_space_limit,
            SourceTag::ProductHunt => self.producthunt_limit,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn default_enabled_sources() -> Vec<SourceTag> {
    // Product Hunt blocks unauthenticated scrapers most of the time.
    vec![
        SourceTag::HuggingFace,
        SourceTag::HuggingFaceSpace,
        SourceTag::GitHub,
    ]
}
fn default_test_sources() -> Vec<SourceTag> {
    vec![SourceTag::HuggingFace, SourceTag::GitHub]
}
fn default_test_limit() -> usize {
    3
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_adapter_timeout() -> u64 {
    60
}
fn default_request_delay() -> u64 {
    1000
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
}
fn default_github_language() -> String {
    "python".into()
}
fn default_github_limit() -> usize {
    20
}
fn default_huggingface_limit() -> usize {
    20
}
fn default_huggingface_space_limit() -> usize {
    10
}
fn default_producthunt_limit() -> usize {
    10
}
fn default_github_base_url() -> String {
    "https://github.com".into()
}
fn default_huggingface_api_url() -> String {
    "https://huggingface.co/api".into()
}
fn default_huggingface_site_url() -> String {
    "https://huggingface.co".into()
}
fn default_producthunt_base_url() -> String {
    "https://www.producthunt.com".into()
}

/// `[scoring]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Flat hype bonus per source tag (`[scoring.source_bonus]`).
    #[serde(default = "default_source_bonus")]
    pub source_bonus: BTreeMap<String, i64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            source_bonus: default_source_bonus(),
        }
    }
}

impl ScoringConfig {
    /// Bonus for `source`, zero when the table has no entry.
    pub fn bonus_for(&self, source: SourceTag) -> i64 {
        self.source_bonus
            .get(source.as_str())
            .copied()
            .unwrap_or(0)
    }
}

fn default_source_bonus() -> BTreeMap<String, i64> {
    BTreeMap::from([
        (SourceTag::GitHub.as_str().to_string(), 5),
        (SourceTag::ProductHunt.as_str().to_string(), 10),
    ])
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.aitracker/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TrackerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.aitracker/aitracker.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TrackerError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TrackerError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TrackerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TrackerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TrackerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| TrackerError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("HUGGINGFACE_API_KEY"));
        assert!(toml_str.contains("source_bonus"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.summarizer.timeout_secs, 10);
        assert_eq!(parsed.sources.enabled.len(), 3);
        assert_eq!(parsed.scoring.bonus_for(SourceTag::ProductHunt), 10);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[sources]
enabled = ["github", "producthunt"]
github_limit = 5

[scoring.source_bonus]
github = 7
huggingface = 2
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(
            config.sources.enabled,
            vec![SourceTag::GitHub, SourceTag::ProductHunt]
        );
        assert_eq!(config.sources.limit_for(SourceTag::GitHub), 5);
        assert_eq!(config.sources.limit_for(SourceTag::HuggingFace), 20);
        assert_eq!(config.scoring.bonus_for(SourceTag::GitHub), 7);
        assert_eq!(config.scoring.bonus_for(SourceTag::HuggingFace), 2);
        // A table given in the file replaces the default table entirely.
        assert_eq!(config.scoring.bonus_for(SourceTag::ProductHunt), 0);
        assert_eq!(config.defaults.db_path, "~/.aitracker/tools.db");
    }

    #[test]
    fn unknown_source_tag_is_rejected() {
        let toml_str = r#"
[sources]
enabled = ["gitlab"]
"#;
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }

    #[test]
    fn missing_api_key_disables_backend() {
        let config = SummarizerConfig {
            // Use a unique env var name to avoid interfering with other tests
            api_key_env: "AIT_TEST_NONEXISTENT_KEY_12345".into(),
            ..SummarizerConfig::default()
        };
        assert!(config.api_key().is_none());
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/tmp/tools.db").unwrap(), PathBuf::from("/tmp/tools.db"));
        let expanded = expand_home("~/x.db").unwrap();
        assert!(expanded.ends_with("x.db"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}

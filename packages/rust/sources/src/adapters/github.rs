//! GitHub trending adapter.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use aitracker_shared::{CandidateRecord, Result, SourceTag, SourcesConfig};

use super::{FetchQuery, SourceAdapter};
use crate::http::{build_client, get_text};

/// Only the top of the trending page is considered.
const MAX_CARDS: usize = 20;

const DEFAULT_SINCE: &str = "daily";
const NO_DESCRIPTION: &str = "No description";

/// Scrapes `github.com/trending/<language>` for AI repositories.
pub struct GitHubTrendingAdapter {
    client: Client,
    base_url: String,
    language: String,
}

impl GitHubTrendingAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.fetch_timeout())?,
            base_url: config.github_base_url.trim_end_matches('/').to_string(),
            language: config.github_language.clone(),
        })
    }

    /// Parse repository cards out of a trending page.
    pub fn parse_trending(&self, html: &str) -> Vec<CandidateRecord> {
        let doc = Html::parse_document(html);
        let card_sel = Selector::parse("article.Box-row").unwrap();

        let cards: Vec<ElementRef> = doc.select(&card_sel).collect();
        if cards.is_empty() {
            warn!("no repository cards found, trending page structure may have changed");
        }
        debug!(cards = cards.len(), "parsed trending page");

        cards
            .into_iter()
            .take(MAX_CARDS)
            .map(|card| self.parse_card(card))
            .collect()
    }

    fn parse_card(&self, card: ElementRef) -> CandidateRecord {
        let link_sel = Selector::parse("h2 a").unwrap();
        let desc_sel = Selector::parse("p.col-9").unwrap();
        let star_sel = Selector::parse(r#"svg[aria-label="star"]"#).unwrap();
        let lang_sel = Selector::parse(r#"span[itemprop="programmingLanguage"]"#).unwrap();
        let today_sel = Selector::parse("span.float-sm-right").unwrap();

        let href = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or("")
            .trim();

        // Without a repo link the url stays empty and gets a placeholder downstream.
        let (name, url) = if href.is_empty() {
            ("Unknown".to_string(), String::new())
        } else {
            (
                href.trim_matches('/').replace('/', "-"),
                format!("{}{href}", self.base_url),
            )
        };

        let description = card
            .select(&desc_sel)
            .next()
            .map(|p| collapse_text(p))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let stars = card
            .select(&star_sel)
            .next()
            .and_then(|svg| svg.parent())
            .and_then(ElementRef::wrap)
            .map(|link| parse_star_count(&collapse_text(link)));

        let language = card
            .select(&lang_sel)
            .next()
            .map(collapse_text)
            .filter(|l| !l.is_empty());

        let today_stars = card.select(&today_sel).next().map(|span| {
            let text = collapse_text(span);
            parse_star_count(text.split_whitespace().next().unwrap_or(""))
        });

        let mut tags = Vec::with_capacity(3);
        if let Some(lang) = &language {
            tags.push(lang.clone());
        }
        tags.push("ai".to_string());
        tags.push("github".to_string());

        CandidateRecord {
            stars,
            today_stars,
            tags,
            language,
            ..CandidateRecord::new(name, description, url, SourceTag::GitHub)
        }
    }
}

#[async_trait]
impl SourceAdapter for GitHubTrendingAdapter {
    fn tag(&self) -> SourceTag {
        SourceTag::GitHub
    }

    async fn fetch_candidates(&self, query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        let language = query.filter("language").unwrap_or(&self.language);
        let since = query.filter("since").unwrap_or(DEFAULT_SINCE);
        let url = format!("{}/trending/{language}?since={since}", self.base_url);

        let html = get_text(&self.client, &url).await?;
        Ok(self.parse_trending(&html))
    }
}

/// Parse a star count such as `1,234`, `523` or `1.2k`. Unparsable input is 0.
pub fn parse_star_count(text: &str) -> u64 {
    let cleaned = text.trim().replace(',', "").to_lowercase();

    if cleaned.contains('k') {
        cleaned
            .replace('k', "")
            .parse::<f64>()
            .map(|v| (v * 1000.0) as u64)
            .unwrap_or(0)
    } else {
        cleaned.parse::<u64>().unwrap_or(0)
    }
}

/// Concatenate an element's text nodes with whitespace collapsed.
fn collapse_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn adapter_for(base_url: &str) -> GitHubTrendingAdapter {
        let config = SourcesConfig {
            github_base_url: base_url.to_string(),
            ..SourcesConfig::default()
        };
        GitHubTrendingAdapter::new(&config).unwrap()
    }

    #[test]
    fn star_counts() {
        assert_eq!(parse_star_count("1,234"), 1234);
        assert_eq!(parse_star_count(" 523 "), 523);
        assert_eq!(parse_star_count("1.2k"), 1200);
        assert_eq!(parse_star_count("15K"), 15000);
        assert_eq!(parse_star_count("lots"), 0);
        assert_eq!(parse_star_count(""), 0);
    }

    #[test]
    fn parses_trending_cards() {
        let adapter = adapter_for("https://github.com");
        let records = adapter.parse_trending(&load_fixture("github_trending.html"));
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.name, "acme-llm-runner");
        assert_eq!(first.url, "https://github.com/acme/llm-runner");
        assert_eq!(first.description, "Run LLM inference locally with a single binary");
        assert_eq!(first.stars, Some(12345));
        assert_eq!(first.today_stars, Some(321));
        assert_eq!(first.language.as_deref(), Some("Python"));
        assert_eq!(first.tags, vec!["Python", "ai", "github"]);
        assert_eq!(first.source, SourceTag::GitHub);

        let second = &records[1];
        assert_eq!(second.name, "someone-webkit");
        assert_eq!(second.stars, Some(1500));

        // Card without description or language
        let third = &records[2];
        assert_eq!(third.description, NO_DESCRIPTION);
        assert_eq!(third.language, None);
        assert_eq!(third.tags, vec!["ai", "github"]);
    }

    #[test]
    fn card_without_repo_link_has_no_url() {
        let adapter = adapter_for("https://github.com");
        let html = r#"<html><body>
            <article class="Box-row"><h2><span>mystery</span></h2>
              <p class="col-9">An LLM agent</p></article>
            <article class="Box-row"><h2><a>broken</a></h2>
              <p class="col-9">Another AI tool</p></article>
        </body></html>"#;

        let records = adapter.parse_trending(html);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.name, "Unknown");
            assert!(record.url.is_empty());
        }
    }

    #[test]
    fn empty_page_yields_no_records() {
        let adapter = adapter_for("https://github.com");
        assert!(adapter.parse_trending("<html><body></body></html>").is_empty());
    }

    #[tokio::test]
    async fn fetch_applies_relevance() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/trending/python"))
            .and(wiremock::matchers::query_param("since", "daily"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(load_fixture("github_trending.html")),
            )
            .mount(&server)
            .await;

        let adapter = adapter_for(&server.uri());
        let batch = adapter.fetch(&FetchQuery::new(10)).await;

        assert!(batch.failure.is_none());
        let names: Vec<&str> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["acme-llm-runner", "lab-agentkit"]);
        assert!(batch.records[0].url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn http_error_becomes_failed_batch() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server.uri());
        let batch = adapter.fetch(&FetchQuery::new(10)).await;

        assert!(batch.records.is_empty());
        assert!(batch.failure.unwrap().contains("503"));
    }
}

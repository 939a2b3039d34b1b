//! Product Hunt adapter.
//!
//! The topic page lists recent AI launches; each `/posts/<slug>` link is
//! visited individually to read its description. Product Hunt blocks most
//! unauthenticated scrapers, so this source is disabled by default.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use aitracker_shared::{CandidateRecord, Result, SourceTag, SourcesConfig, text::title_case};

use super::{FetchQuery, PRODUCT_KEYWORDS, SourceAdapter, is_relevant};
use crate::http::{build_client, get_text};

const TOPIC_PATH: &str = "/topics/artificial-intelligence";
const POSTS_MARKER: &str = "/posts/";
/// Only the first links of the topic page are examined.
const MAX_LINKS: usize = 30;
const DEFAULT_DESCRIPTION: &str = "AI product from Product Hunt";

/// Scrapes Product Hunt's AI topic for new launches.
pub struct ProductHuntAdapter {
    client: Client,
    base_url: String,
    request_delay: Duration,
}

impl ProductHuntAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.fetch_timeout())?,
            base_url: config.producthunt_base_url.trim_end_matches('/').to_string(),
            request_delay: config.request_delay(),
        })
    }

    async fn fetch_product(&self, href: &str) -> Result<CandidateRecord> {
        let url = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{href}", self.base_url)
        };

        let html = get_text(&self.client, &url).await?;
        let description = parse_product_description(&html);

        Ok(CandidateRecord::new(
            product_name(href),
            description,
            url,
            SourceTag::ProductHunt,
        ))
    }
}

#[async_trait]
impl SourceAdapter for ProductHuntAdapter {
    fn tag(&self) -> SourceTag {
        SourceTag::ProductHunt
    }

    fn keywords(&self) -> &'static [&'static str] {
        PRODUCT_KEYWORDS
    }

    async fn fetch_candidates(&self, query: &FetchQuery) -> Result<Vec<CandidateRecord>> {
        let topic_url = format!("{}{TOPIC_PATH}", self.base_url);
        let html = get_text(&self.client, &topic_url).await?;
        let links = product_links(&html);
        debug!(links = links.len(), "product links found");

        let mut products = Vec::new();
        for href in links {
            match self.fetch_product(&href).await {
                Ok(record) if is_relevant(&record, PRODUCT_KEYWORDS) => {
                    info!(name = %record.name, "AI product found");
                    products.push(record);
                }
                Ok(record) => debug!(name = %record.name, "skipped, not AI-related"),
                Err(e) => warn!(%href, error = %e, "failed to fetch product page"),
            }

            if products.len() >= query.limit {
                break;
            }
            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        Ok(products)
    }
}

/// Distinct `/posts/` hrefs among the first links of the topic page, in page order.
fn product_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").unwrap();

    let mut seen = HashSet::new();
    doc.select(&link_sel)
        .take(MAX_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(POSTS_MARKER))
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

/// `/posts/voice-notes-ai` becomes `Voice Notes Ai`.
fn product_name(href: &str) -> String {
    let slug = href
        .split(POSTS_MARKER)
        .nth(1)
        .unwrap_or("unknown")
        .trim_end_matches('/');
    title_case(&slug.replace('-', " "))
}

/// Meta description, else the first heading, else a generic label.
fn parse_product_description(html: &str) -> String {
    let doc = Html::parse_document(html);
    let meta_sel = Selector::parse(r#"meta[name="description"]"#).unwrap();
    let h1_sel = Selector::parse("h1").unwrap();

    let meta = doc
        .select(&meta_sel)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    meta.or_else(|| {
        doc.select(&h1_sel)
            .next()
            .map(|h| h.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    })
    .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
}

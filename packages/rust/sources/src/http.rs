//! Outbound HTTP helpers shared by the adapters.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use aitracker_shared::{Result, TrackerError};

/// Build a client with a bounded per-request timeout.
pub(crate) fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
        .build()
        .map_err(|e| TrackerError::Network(format!("failed to build HTTP client: {e}")))
}

async fn get(client: &Client, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
    debug!(%url, "fetching");

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| TrackerError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TrackerError::Network(format!(
            "{url}: HTTP {}",
            status.as_u16()
        )));
    }
    Ok(response)
}

/// GET `url` and return the body as text.
pub(crate) async fn get_text(client: &Client, url: &str) -> Result<String> {
    get(client, url, &[])
        .await?
        .text()
        .await
        .map_err(|e| TrackerError::Network(format!("{url}: failed to read body: {e}")))
}

/// GET `url` with query parameters and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    get(client, url, query)
        .await?
        .json::<T>()
        .await
        .map_err(|e| TrackerError::parse(format!("{url}: invalid JSON: {e}")))
}

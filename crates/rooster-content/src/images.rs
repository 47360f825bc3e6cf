//! Image enrichment — best-effort lookup against the Pixabay search API.
//!
//! Any transport failure, API error, or empty hit list degrades to "no
//! image"; the caller sends text-only and moves on.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;

use rooster_core::error::{Result, RoosterError};
use rooster_core::traits::ImageSearch;

const PIXABAY_URL: &str = "https://pixabay.com/api/";

/// Pixabay image search client.
pub struct PixabayClient {
    api_key: String,
    client: reqwest::Client,
}

impl PixabayClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Rooster/0.3")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| RoosterError::Enrichment(format!("HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    #[serde(rename = "webformatURL")]
    webformat_url: String,
}

#[async_trait]
impl ImageSearch for PixabayClient {
    async fn search(&self, topic: &str) -> Result<Vec<String>> {
        let url = format!(
            "{PIXABAY_URL}?key={}&q={}&image_type=photo&safesearch=true",
            self.api_key,
            urlencoding::encode(topic)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RoosterError::Enrichment(format!("image search failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RoosterError::Enrichment(format!(
                "image search returned {}",
                response.status()
            )));
        }

        let body: PixabayResponse = response
            .json()
            .await
            .map_err(|e| RoosterError::Enrichment(format!("invalid search response: {e}")))?;

        Ok(body.hits.into_iter().map(|h| h.webformat_url).collect())
    }
}

/// Pick one image URL for a topic, best-effort. Errors and empty results
/// both come back as `None` — absence of an image never blocks a send.
pub async fn next_image(search: &dyn ImageSearch, topic: &str) -> Option<String> {
    match search.search(topic).await {
        Ok(urls) => {
            let picked = urls.choose(&mut rand::thread_rng()).cloned();
            if picked.is_none() {
                tracing::debug!("no images found for topic '{topic}'");
            }
            picked
        }
        Err(e) => {
            tracing::warn!("image enrichment unavailable: {e}");
            None
        }
    }
}

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::retry::{RetryPolicy, with_retry};

const SERVICE: &str = "image search";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// One search hit. At least one of the two URLs is present.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageEntry {
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl ImageEntry {
    /// Full-size URL, falling back to the thumbnail
    pub fn url(&self) -> &str {
        self.image_url
            .as_deref()
            .or(self.thumbnail_url.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub images: Vec<ImageEntry>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    content_url: Option<String>,
    thumbnail_url: Option<String>,
}

/// Bing image search client bound to one subscription key
pub struct ImageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl ImageClient {
    pub fn new(base_url: &str, api_key: String, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry,
        }
    }

    /// Search photos for a free-text query like "clear sky in Boise, US"
    pub async fn search(&self, query: &str) -> Result<ImageResult, ApiError> {
        debug!("Searching images for '{}'", query);
        with_retry(&self.retry, ApiError::is_transient, || self.fetch(query)).await
    }

    async fn fetch(&self, query: &str) -> Result<ImageResult, ApiError> {
        let response = self
            .client
            .get(format!("{}/images/search", self.base_url))
            .query(&[("q", query), ("imageType", "photo")])
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                service: SERVICE,
                status,
            });
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| ApiError::decode(SERVICE, e.without_url()))?;
        collect_images(search.value)
    }
}

fn collect_images(hits: Vec<SearchHit>) -> Result<ImageResult, ApiError> {
    if hits.is_empty() {
        return Err(ApiError::domain(SERVICE, "no images found"));
    }

    let images: Vec<ImageEntry> = hits
        .into_iter()
        .filter_map(|hit| {
            if hit.content_url.is_none() && hit.thumbnail_url.is_none() {
                warn!("Skipping image result without image or thumbnail URL");
                return None;
            }
            Some(ImageEntry {
                image_url: hit.content_url,
                thumbnail_url: hit.thumbnail_url,
            })
        })
        .collect();

    if images.is_empty() {
        return Err(ApiError::domain(SERVICE, "no usable images found"));
    }
    Ok(ImageResult { images })
}

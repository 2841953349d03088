use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::domain::{ApiKey, ImageType, Query, SearchHit, lenient_hits};
use crate::error::HarvestError;

pub const DEFAULT_API_BASE_URL: &str = "https://pixabay.com/api/";
/// Largest `per_page` the API accepts.
pub const PER_PAGE_CAP: usize = 200;
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFilters {
    pub image_type: ImageType,
    pub lang: String,
    pub safe_search: bool,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            image_type: ImageType::Photo,
            lang: "en".to_string(),
            safe_search: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub per_page: usize,
    pub page: u32,
    pub filters: SearchFilters,
}

impl SearchRequest {
    /// Only the first page is ever requested, so `per_page` is capped at [`PER_PAGE_CAP`].
    pub fn first_page(query: &Query, per_query_limit: usize, filters: &SearchFilters) -> Self {
        Self {
            query: query.as_str().to_string(),
            per_page: per_query_limit.min(PER_PAGE_CAP),
            page: 1,
            filters: filters.clone(),
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query.clone()),
            ("image_type", self.filters.image_type.to_string()),
            ("lang", self.filters.lang.clone()),
            ("safesearch", self.filters.safe_search.to_string()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default, rename = "totalHits")]
    pub total_hits: u64,
    #[serde(default, deserialize_with = "lenient_hits")]
    pub hits: Vec<SearchHit>,
}

pub trait SearchClient: Send + Sync {
    fn search(&self, request: &SearchRequest) -> Result<SearchResponse, HarvestError>;
}

#[derive(Clone)]
pub struct PixabayHttpClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl PixabayHttpClient {
    pub fn new(
        api_key: ApiKey,
        base_url: &str,
        user_agent: Option<&str>,
    ) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .default_headers(default_headers(user_agent)?)
            .timeout(SEARCH_TIMEOUT)
            .build()
            .map_err(|err| HarvestError::SearchHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, HarvestError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "search request failed".to_string());
        Err(HarvestError::SearchStatus {
            status,
            message: message.trim().to_string(),
        })
    }
}

impl SearchClient for PixabayHttpClient {
    fn search(&self, request: &SearchRequest) -> Result<SearchResponse, HarvestError> {
        tracing::debug!(
            "GET {} q={:?} per_page={} page={}",
            self.base_url,
            request.query,
            request.per_page,
            request.page
        );
        // reqwest errors embed the request URL, which carries the key.
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", self.api_key.expose())])
            .query(&request.params())
            .timeout(SEARCH_TIMEOUT)
            .send()
            .map_err(|err| HarvestError::SearchHttp(err.without_url().to_string()))?;
        let response = Self::handle_status(response)?;
        let body = response
            .text()
            .map_err(|err| HarvestError::SearchHttp(err.without_url().to_string()))?;
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|err| HarvestError::SearchParse(err.to_string()))?;
        if parsed.hits.is_empty() && parsed.total_hits > 0 {
            tracing::debug!("empty page despite totalHits={}: {body}", parsed.total_hits);
        }
        Ok(parsed)
    }
}

pub(crate) fn default_headers(user_agent: Option<&str>) -> Result<HeaderMap, HarvestError> {
    let value = match user_agent {
        Some(agent) => agent.to_string(),
        None => format!("dish-harvester/{}", env!("CARGO_PKG_VERSION")),
    };
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&value)
            .map_err(|err| HarvestError::InvalidConfig(format!("user_agent: {err}")))?,
    );
    Ok(headers)
}

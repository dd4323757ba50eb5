//! HTTP client for the Google search engine endpoint of SerpApi.

use std::time::Duration;

use pricenest_core::AppConfig;
use reqwest::{Client, Url};

use crate::assemble::build_search_query;
use crate::error::ScraperError;
use crate::types::SearchPayload;

/// Results requested per search.
const RESULTS_PER_PAGE: u32 = 60;

/// Provider message for an empty result set. Reported inside the `error`
/// field, but it is a valid "no results" answer.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

/// Search provider client. Cheap to clone; the underlying connection pool is
/// shared.
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    location: String,
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[redacted]")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SearchClient {
    /// Creates a client with a request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidEndpoint`] if `endpoint` is not an absolute URL.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        endpoint: &str,
        api_key: &str,
        location: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ScraperError::InvalidEndpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_owned(),
            location: location.to_owned(),
        })
    }

    /// Builds a client from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::MissingApiKey`] when `SERPAPI_KEY` is unset,
    /// otherwise the same errors as [`SearchClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let api_key = config
            .serpapi_key
            .as_deref()
            .ok_or(ScraperError::MissingApiKey)?;
        Self::new(
            &config.search_url,
            api_key,
            &config.search_location,
            config.fetch_timeout_secs,
            &config.user_agent,
        )
    }

    /// Runs one search for a user's product query and decodes the payload.
    ///
    /// An empty result set is `Ok` with an empty payload, never an error.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] on HTTP 429.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on network or TLS failure, including the
    ///   client-level request timeout.
    /// - [`ScraperError::Deserialize`] if the body is not JSON.
    /// - [`ScraperError::Provider`] if the provider reports an error and
    ///   returns no results.
    pub async fn search(&self, query: &str) -> Result<SearchPayload, ScraperError> {
        let search_query = build_search_query(query);
        let num = RESULTS_PER_PAGE.to_string();

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("engine", "google"),
                ("q", search_query.as_str()),
                ("location", self.location.as_str()),
                ("hl", "en"),
                ("gl", "in"),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited { retry_after_secs });
        }

        // The request URL carries the API key; only the bare endpoint is reported.
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        let body = response.text().await?;
        let payload = serde_json::from_str::<SearchPayload>(&body).map_err(|e| {
            ScraperError::Deserialize {
                context: format!("search results for \"{query}\""),
                source: e,
            }
        })?;

        if let Some(message) = payload.error.as_deref() {
            if message.contains(NO_RESULTS_MARKER) {
                tracing::debug!(query, "search provider returned no results");
                return Ok(SearchPayload::default());
            }
            if payload.record_count() == 0 {
                return Err(ScraperError::Provider(message.to_owned()));
            }
            tracing::warn!(query, error = message, "search provider reported an error alongside results");
        }

        tracing::debug!(query, records = payload.record_count(), "search payload decoded");
        Ok(payload)
    }
}

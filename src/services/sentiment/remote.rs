//! HTTP sentiment backend
//!
//! Posts a review to `{api_url}/polarity` and expects `{"polarity": <f64>}`
//! back. Results are cached in Redis by trimmed review text, so a review
//! that many users share is only ever sent once.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    services::sentiment::SentimentAnalyzer,
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

const SENTIMENT_CACHE_TTL: u64 = 2_592_000; // 30 days

#[derive(Serialize)]
struct PolarityRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct PolarityResponse {
    polarity: f64,
}

#[derive(Clone)]
pub struct RemoteAnalyzer {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    cache: Cache,
}

impl RemoteAnalyzer {
    pub fn new(cache: Cache, api_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            cache,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/polarity", self.api_url)
    }

    async fn request_polarity(&self, text: &str) -> AppResult<f64> {
        let mut request = self
            .http_client
            .post(self.endpoint())
            .json(&PolarityRequest { text });

        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Sentiment API returned status {}: {}",
                status, body
            )));
        }

        let body: PolarityResponse = response.json().await?;
        let polarity = check_polarity(body.polarity)?;

        tracing::debug!(polarity = polarity, analyzer = "remote", "Sentiment resolved");

        Ok(polarity)
    }
}

fn check_polarity(polarity: f64) -> AppResult<f64> {
    if (-1.0..=1.0).contains(&polarity) {
        Ok(polarity)
    } else {
        Err(AppError::ExternalApi(format!(
            "Sentiment API returned polarity {} outside [-1, 1]",
            polarity
        )))
    }
}

#[async_trait::async_trait]
impl SentimentAnalyzer for RemoteAnalyzer {
    async fn polarity(&self, text: &str) -> AppResult<f64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput(
                "Review text cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Sentiment(text.to_string()),
            SENTIMENT_CACHE_TTL,
            async move { self.request_polarity(text).await }
        )
    }

    fn clone_for_task(&self) -> Box<dyn SentimentAnalyzer> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

use std::time::Duration;

use serde::Deserialize;

use crate::services::affinity::{
    ScorerConfig, ScoringPolicy, SharedItemFilter, DEFAULT_RATING_SCALE, DEFAULT_SENTIMENT_SHIFT,
};

/// Which sentiment analyzer backs the matcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentBackend {
    #[default]
    Lexicon,
    Remote,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// PostgreSQL connection URL; profiles stay in memory when unset
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Redis connection URL, only used by the remote sentiment backend
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default)]
    pub sentiment_backend: SentimentBackend,

    /// Sentiment API base URL, required for the remote backend
    #[serde(default)]
    pub sentiment_api_url: Option<String>,

    #[serde(default)]
    pub sentiment_api_key: Option<String>,

    /// Per-review sentiment lookup timeout
    #[serde(default = "default_sentiment_timeout_ms")]
    pub sentiment_timeout_ms: u64,

    #[serde(default = "default_rating_scale")]
    pub rating_scale: f64,

    #[serde(default = "default_sentiment_shift")]
    pub sentiment_shift: f64,

    /// Upper bound on matches returned per request
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    #[serde(default)]
    pub shared_item_filter: SharedItemFilter,

    #[serde(default)]
    pub scoring_policy: ScoringPolicy,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_sentiment_timeout_ms() -> u64 {
    2000
}

fn default_rating_scale() -> f64 {
    DEFAULT_RATING_SCALE
}

fn default_sentiment_shift() -> f64 {
    DEFAULT_SENTIMENT_SHIFT
}

fn default_max_matches() -> usize {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.sentiment_backend == SentimentBackend::Remote && self.sentiment_api_url.is_none() {
            anyhow::bail!("SENTIMENT_API_URL is required when SENTIMENT_BACKEND=remote");
        }
        if self.max_matches == 0 {
            anyhow::bail!("MAX_MATCHES must be at least 1");
        }
        self.scorer_config().validate()?;
        Ok(())
    }

    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            rating_scale: self.rating_scale,
            sentiment_shift: self.sentiment_shift,
            shared_item_filter: self.shared_item_filter,
            scoring_policy: self.scoring_policy,
        }
    }

    pub fn sentiment_timeout(&self) -> Duration {
        Duration::from_millis(self.sentiment_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use shelfmate_api::{
    api::{create_router, AppState},
    config::{Config, SentimentBackend},
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle},
    services::{
        profiles::{InMemoryProfileStore, PostgresProfileStore, ProfileStore},
        sentiment::{LexiconAnalyzer, RemoteAnalyzer, SentimentAnalyzer},
        AffinityScorer, MatchService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shelfmate_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let profiles: Arc<dyn ProfileStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections).await?;
            Arc::new(PostgresProfileStore::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set, keeping profiles in memory");
            Arc::new(InMemoryProfileStore::new())
        }
    };

    let (analyzer, cache_writer) = build_analyzer(&config)?;
    tracing::info!(analyzer = analyzer.name(), "Sentiment analyzer ready");

    let matcher = MatchService::new(
        AffinityScorer::new(config.scorer_config())?,
        analyzer,
        config.sentiment_timeout(),
        config.max_matches,
    );

    let app = create_router(AppState::new(profiles, matcher));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn build_analyzer(
    config: &Config,
) -> anyhow::Result<(Arc<dyn SentimentAnalyzer>, Option<CacheWriterHandle>)> {
    match config.sentiment_backend {
        SentimentBackend::Lexicon => Ok((Arc::new(LexiconAnalyzer::new()), None)),
        SentimentBackend::Remote => {
            let api_url = config
                .sentiment_api_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SENTIMENT_API_URL is not set"))?;
            let (cache, writer) = Cache::new(create_redis_client(&config.redis_url)?);
            let analyzer = RemoteAnalyzer::new(cache, api_url, config.sentiment_api_key.clone());
            Ok((Arc::new(analyzer), Some(writer)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

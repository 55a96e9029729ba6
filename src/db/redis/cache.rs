use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Polarity of one review text
    Sentiment(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Sentiment(text) => write!(f, "sentiment:{}", text.trim()),
        }
    }
}

/// Opens a Redis client; no connection is made until first use
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// A pending write for the background writer
struct PendingWrite {
    key: String,
    value: String,
    ttl_secs: u64,
}

/// JSON cache on top of Redis
///
/// Reads go straight to Redis. Writes are queued to a background task so
/// callers never wait on them.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once queued writes are flushed
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown requested");
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::run_writer(redis_client.clone(), write_rx, shutdown_rx));

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");
        let mut failed = 0u64;

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::write(&client, write).await {
                        failed += 1;
                        tracing::error!(error = %e, failed = failed, "Cache write failed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    while let Some(write) = write_rx.recv().await {
                        if let Err(e) = Self::write(&client, write).await {
                            tracing::error!(error = %e, "Cache write failed during shutdown flush");
                        }
                    }
                    tracing::info!(failed = failed, "Cache writer stopped");
                    break;
                }
            }
        }
    }

    async fn write(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(write.key, write.value, write.ttl_secs).await?;
        Ok(())
    }

    /// Reads and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| AppError::Internal(format!("Cache deserialization error: {}", e)))
            })
            .transpose()
    }

    /// Queues a value for writing; errors are logged, never returned
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl_secs,
        };

        if self.write_tx.send(write).is_err() {
            tracing::error!(key = %key, "Cache writer is gone, dropping write");
        }
    }
}

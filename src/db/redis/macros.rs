/// Read-through caching around an async computation.
///
/// Expands to an expression of type `AppResult<T>`: a hit returns the cached
/// value, a miss awaits `$compute`, queues the result for writing with
/// `$ttl` seconds to live and returns it. A failed cache read is logged and
/// treated as a miss. Errors from the computation propagate with `?`, so the
/// macro is only usable inside a function returning `AppResult`.
///
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Sentiment(text.to_string()), TTL, async move {
///     self.request_polarity(text).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $compute:expr) => {{
        let key = $key;
        let lookup = match $cache.get_from_cache(&key).await {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, bypassing cache");
                None
            }
        };
        match lookup {
            Some(hit) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(hit)
            }
            None => {
                tracing::debug!(key = %key, "Cache miss");
                let value = $compute.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}

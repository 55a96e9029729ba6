use sqlx::{postgres::PgPoolOptions, PgPool};

/// Creates a PostgreSQL connection pool for the profile store
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    tracing::info!(max_connections = max_connections, "PostgreSQL pool ready");

    Ok(pool)
}

//! Store construction from configuration

use crate::config::StorageConfig;
use gtss_store::{EntityStore, InMemoryEntityStore, SqliteEntityStore, StoreResult};
use std::sync::Arc;

/// Open the configured backend. Called once at startup; the returned handle is
/// shared by every request.
pub async fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn EntityStore>> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Ok(Arc::new(InMemoryEntityStore::new()))
        }
        StorageConfig::Sqlite {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            if is_memory_url(url) {
                // Each connection to `:memory:` is its own database; pin a single one.
                tracing::warn!(url = %url, "In-memory SQLite; data is lost on shutdown");
                return Ok(Arc::new(SqliteEntityStore::in_memory().await?));
            }
            tracing::info!(url = %url, "Opening SQLite storage");
            let store =
                SqliteEntityStore::connect_with_options(url, *max_connections, *connect_timeout_secs)
                    .await?;
            Ok(Arc::new(store))
        }
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

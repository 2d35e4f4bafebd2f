//! Conversation store implementations for Parlor.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use std::sync::Arc;

use parlor_config::AppConfig;
use parlor_core::error::StoreError;
use parlor_core::store::ConversationStore;

/// Open the backend named by `config.store.backend`.
pub async fn open_from_config(
    config: &AppConfig,
) -> Result<Arc<dyn ConversationStore>, StoreError> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.database_path();
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    StoreError::Storage(format!("Cannot create {}: {e}", dir.display()))
                })?;
            }
            let url = format!("sqlite://{}", path.display());
            Ok(Arc::new(SqliteStore::new(&url).await?))
        }
        other => Err(StoreError::Storage(format!(
            "Store backend '{other}' is not available in this build"
        ))),
    }
}

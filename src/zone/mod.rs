pub mod errors;
pub mod parser;
pub mod record;
pub mod resolver;
pub mod sql;
pub mod store;
#[allow(clippy::module_inception)]
pub mod zone;

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{BackendKind, ServerConfig};
use crate::error::StoreError;

pub use errors::ZoneFileError;
pub use parser::{ParsedZone, ZoneParser};
pub use record::decode_row;
pub use resolver::ZoneResolver;
pub use sql::SqliteStore;
pub use store::{MemoryStore, StoreRow, ZoneBackend};
pub use zone::Zone;

/// Zone constants
pub mod constants {
    /// Default TTL if not specified (1 hour)
    pub const DEFAULT_TTL: u32 = 3600;

    /// Maximum zone file size (10MB)
    pub const MAX_ZONE_FILE_SIZE: usize = 10 * 1024 * 1024;

    /// Maximum `$INCLUDE` nesting
    pub const MAX_INCLUDE_DEPTH: usize = 8;
}

/// Failure to open the configured record store
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    ZoneFile(#[from] ZoneFileError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Missing database URL for the sqlite backend")]
    MissingDatabaseUrl,
}

/// Open the store selected by `config`
pub async fn open_backend(config: &ServerConfig) -> Result<Arc<dyn ZoneBackend>, BackendError> {
    let backend: Arc<dyn ZoneBackend> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryStore::new()),
        BackendKind::ZoneFiles => {
            let store = MemoryStore::from_zone_files(&config.zone_files)?;
            info!("Loaded {} zones from master files", store.zone_count());
            Arc::new(store)
        }
        BackendKind::Sqlite => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(BackendError::MissingDatabaseUrl)?;
            Arc::new(SqliteStore::connect(url, config.max_connections).await?)
        }
    };
    info!("Opened {} record store", config.backend);
    Ok(backend)
}

/// Resolver over the configured store, bounded by the configured timeout
pub async fn open_resolver(config: &ServerConfig) -> Result<ZoneResolver, BackendError> {
    let backend = open_backend(config).await?;
    Ok(ZoneResolver::with_timeout(backend, config.timeout()))
}

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{DatabaseError, MemoryStore, PgStore, RestStore, Store};
use crate::config::{StoreBackend, StoreConfig};

/// Builds the configured store backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect the backend selected in `config`. With `migrate` set, the
    /// Postgres backend applies the bundled migrations before returning.
    pub async fn connect(config: &StoreConfig, migrate: bool) -> Result<Arc<dyn Store>, DatabaseError> {
        match config.backend {
            StoreBackend::Postgres => {
                let store = Self::postgres(config).await?;
                if migrate {
                    store.migrate().await?;
                    info!("Applied database migrations");
                }
                Ok(Arc::new(store))
            }
            StoreBackend::Rest => {
                let base = config
                    .rest_url
                    .as_deref()
                    .ok_or(DatabaseError::ConfigMissing("SUPABASE_URL"))?;
                let key = config
                    .service_key
                    .as_deref()
                    .ok_or(DatabaseError::ConfigMissing("SUPABASE_SERVICE_ROLE_KEY"))?;
                let store = RestStore::new(base, key, Duration::from_secs(config.connection_timeout))?;
                info!("Using REST store at {}", base);
                Ok(Arc::new(store))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store; data is lost on restart");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    async fn postgres(config: &StoreConfig) -> Result<PgStore, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(PgStore::new(pool))
    }

    fn build_connection_string(config: &StoreConfig) -> Result<String, DatabaseError> {
        let base = config
            .database_url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }
}

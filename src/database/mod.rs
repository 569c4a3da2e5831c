pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Operation, Table};
use models::{Consultation, Property, PropertyDraft, RecordId};

pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use rest::RestStore;

/// Errors from the table store backends
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Query error: {0}")]
    QueryError(String),

    /// The hosted store answered with an error status
    #[error("{operation} on {table} rejected ({status}): {message}")]
    Rejected {
        table: Table,
        operation: Operation,
        status: u16,
        message: String,
    },

    #[error("Unexpected row shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Single-table operations the handlers need. Every method is one round trip;
/// update and delete are conditional on the id and return `None` when no row
/// matched, so a concurrent delete surfaces as "not found" rather than a
/// partially written record.
#[async_trait]
pub trait Store: Send + Sync {
    /// All properties, newest `created_at` first
    async fn list_properties(&self) -> Result<Vec<Property>, DatabaseError>;

    async fn find_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError>;

    async fn insert_property(&self, draft: &PropertyDraft) -> Result<Property, DatabaseError>;

    /// Write `draft` over the row; images are only touched when the draft
    /// carries them
    async fn update_property(
        &self,
        id: &RecordId,
        draft: &PropertyDraft,
    ) -> Result<Option<Property>, DatabaseError>;

    /// Remove the row and return what it held
    async fn delete_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError>;

    /// All consultations, newest `created_at` first
    async fn list_consultations(&self) -> Result<Vec<Consultation>, DatabaseError>;

    async fn update_consultation_status(
        &self,
        id: &RecordId,
        status: &str,
    ) -> Result<Option<Consultation>, DatabaseError>;

    /// Returns whether a row was removed
    async fn delete_consultation(&self, id: &RecordId) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::models::{Consultation, Property, PropertyDraft, RecordId};
use super::{DatabaseError, Store};

// Rows come back through row_to_json so both tables decode with serde. Keys
// are uuid; ids are bound as Uuid so lookups stay on the primary key index.

const LIST_PROPERTIES: &str =
    "SELECT row_to_json(p) AS row FROM properties p ORDER BY p.created_at DESC";

const FIND_PROPERTY: &str = "SELECT row_to_json(p) AS row FROM properties p WHERE p.id = $1";

const INSERT_PROPERTY: &str = r#"
WITH inserted AS (
    INSERT INTO properties
        (title, location, full_address, price, "type", status, beds, baths, sqft, garage,
         description, is_rental, image_url, image)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    RETURNING *
)
SELECT row_to_json(inserted) AS row FROM inserted"#;

const UPDATE_PROPERTY: &str = r#"
WITH updated AS (
    UPDATE properties SET
        title = $2, location = $3, full_address = $4, price = $5, "type" = $6, status = $7,
        beds = $8, baths = $9, sqft = $10, garage = $11, description = $12, is_rental = $13,
        image_url = COALESCE($14, image_url), image = COALESCE($15, image)
    WHERE id = $1
    RETURNING *
)
SELECT row_to_json(updated) AS row FROM updated"#;

const DELETE_PROPERTY: &str = r#"
WITH deleted AS (DELETE FROM properties WHERE id = $1 RETURNING *)
SELECT row_to_json(deleted) AS row FROM deleted"#;

const LIST_CONSULTATIONS: &str =
    "SELECT row_to_json(c) AS row FROM consultations c ORDER BY c.created_at DESC";

const UPDATE_CONSULTATION_STATUS: &str = r#"
WITH updated AS (UPDATE consultations SET status = $2 WHERE id = $1 RETURNING *)
SELECT row_to_json(updated) AS row FROM updated"#;

const DELETE_CONSULTATION: &str = "DELETE FROM consultations WHERE id = $1";

/// Store backed by a direct Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Primary key for `id`. Anything that is not a uuid cannot match a row.
fn key(id: &RecordId) -> Option<Uuid> {
    match id {
        RecordId::Text(text) => Uuid::parse_str(text).ok(),
        RecordId::Int(_) => None,
    }
}

fn decode<T: DeserializeOwned>(row: &PgRow) -> Result<T, DatabaseError> {
    let value: Value = row.try_get("row")?;
    Ok(serde_json::from_value(value)?)
}

fn decode_all<T: DeserializeOwned>(rows: &[PgRow]) -> Result<Vec<T>, DatabaseError> {
    rows.iter().map(decode).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn list_properties(&self) -> Result<Vec<Property>, DatabaseError> {
        let rows = sqlx::query(LIST_PROPERTIES).fetch_all(&self.pool).await?;
        debug!("Fetched {} property rows", rows.len());
        decode_all(&rows)
    }

    async fn find_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        let Some(key) = key(id) else {
            return Ok(None);
        };
        sqlx::query(FIND_PROPERTY)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    async fn insert_property(&self, draft: &PropertyDraft) -> Result<Property, DatabaseError> {
        let row = sqlx::query(INSERT_PROPERTY)
            .bind(&draft.title)
            .bind(&draft.location)
            .bind(&draft.full_address)
            .bind(draft.price)
            .bind(draft.kind.as_str())
            .bind(&draft.status)
            .bind(draft.beds)
            .bind(draft.baths)
            .bind(draft.sqft)
            .bind(draft.garage)
            .bind(&draft.description)
            .bind(draft.is_rental)
            .bind(&draft.image_url)
            .bind(&draft.image)
            .fetch_one(&self.pool)
            .await?;
        decode(&row)
    }

    async fn update_property(
        &self,
        id: &RecordId,
        draft: &PropertyDraft,
    ) -> Result<Option<Property>, DatabaseError> {
        let Some(key) = key(id) else {
            return Ok(None);
        };
        sqlx::query(UPDATE_PROPERTY)
            .bind(key)
            .bind(&draft.title)
            .bind(&draft.location)
            .bind(&draft.full_address)
            .bind(draft.price)
            .bind(draft.kind.as_str())
            .bind(&draft.status)
            .bind(draft.beds)
            .bind(draft.baths)
            .bind(draft.sqft)
            .bind(draft.garage)
            .bind(&draft.description)
            .bind(draft.is_rental)
            .bind(&draft.image_url)
            .bind(&draft.image)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    async fn delete_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        let Some(key) = key(id) else {
            return Ok(None);
        };
        sqlx::query(DELETE_PROPERTY)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    async fn list_consultations(&self) -> Result<Vec<Consultation>, DatabaseError> {
        let rows = sqlx::query(LIST_CONSULTATIONS).fetch_all(&self.pool).await?;
        debug!("Fetched {} consultation rows", rows.len());
        decode_all(&rows)
    }

    async fn update_consultation_status(
        &self,
        id: &RecordId,
        status: &str,
    ) -> Result<Option<Consultation>, DatabaseError> {
        let Some(key) = key(id) else {
            return Ok(None);
        };
        sqlx::query(UPDATE_CONSULTATION_STATUS)
            .bind(key)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    async fn delete_consultation(&self, id: &RecordId) -> Result<bool, DatabaseError> {
        let Some(key) = key(id) else {
            return Ok(false);
        };
        let result = sqlx::query(DELETE_CONSULTATION)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

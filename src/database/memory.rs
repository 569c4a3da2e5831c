use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Consultation, Property, PropertyDraft, RecordId};
use super::{DatabaseError, Store};

#[derive(Default)]
struct Tables {
    properties: Vec<Property>,
    consultations: Vec<Consultation>,
}

/// Process-local store for development and tests. Each operation holds the
/// table lock for its whole read-modify-write, matching the single-statement
/// semantics of the SQL backends.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a consultation row as the public site would. Missing `id`,
    /// `status` and `created_at` columns are filled in.
    pub async fn seed_consultation(&self, mut row: Map<String, Value>) -> Consultation {
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("status")
            .or_insert_with(|| Value::String("pending".to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let consultation = Consultation(row);
        self.tables.write().await.consultations.push(consultation.clone());
        consultation
    }

    pub async fn property_count(&self) -> usize {
        self.tables.read().await.properties.len()
    }
}

/// Ids are matched on their text form so `7` and `"7"` address the same row
fn same_id(stored: &RecordId, wanted: &RecordId) -> bool {
    stored.to_string() == wanted.to_string()
}

fn consultation_has_id(row: &Consultation, wanted: &RecordId) -> bool {
    row.id().map_or(false, |stored| same_id(&stored, wanted))
}

fn newest_first<T, F>(rows: &[T], created_at: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    // Stable sort over the reversed insertion order keeps later inserts first on ties
    let mut sorted: Vec<T> = rows.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    sorted
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_properties(&self) -> Result<Vec<Property>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.properties, |p| Some(p.created_at)))
    }

    async fn find_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .properties
            .iter()
            .find(|p| same_id(&p.id, id))
            .cloned())
    }

    async fn insert_property(&self, draft: &PropertyDraft) -> Result<Property, DatabaseError> {
        let property = draft
            .clone()
            .into_property(RecordId::Text(Uuid::new_v4().to_string()), Utc::now());
        self.tables.write().await.properties.push(property.clone());
        Ok(property)
    }

    async fn update_property(
        &self,
        id: &RecordId,
        draft: &PropertyDraft,
    ) -> Result<Option<Property>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(slot) = tables
            .properties
            .iter_mut()
            .find(|p| same_id(&p.id, id)) else {
            return Ok(None);
        };
        *slot = draft.clone().apply_to(slot);
        Ok(Some(slot.clone()))
    }

    async fn delete_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let position = tables
            .properties
            .iter()
            .position(|p| same_id(&p.id, id));
        Ok(position.map(|index| tables.properties.remove(index)))
    }

    async fn list_consultations(&self) -> Result<Vec<Consultation>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.consultations, Consultation::created_at))
    }

    async fn update_consultation_status(
        &self,
        id: &RecordId,
        status: &str,
    ) -> Result<Option<Consultation>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .consultations
            .iter_mut()
            .find(|c| consultation_has_id(c, id));
        Ok(row.map(|row| {
            row.set_status(status);
            row.clone()
        }))
    }

    async fn delete_consultation(&self, id: &RecordId) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.consultations.len();
        tables
            .consultations
            .retain(|c| !consultation_has_id(c, id));
        Ok(tables.consultations.len() != before)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

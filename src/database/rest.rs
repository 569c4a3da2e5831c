use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::models::{Consultation, Property, PropertyDraft, RecordId};
use super::{DatabaseError, Store};
use crate::types::{Operation, Table};

/// Store backed by the hosted database's REST query API
/// (`<base>/rest/v1/<table>` with `eq.` filters), authenticated with the
/// service credential.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: Url,
    service_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, DatabaseError> {
        let mut base_url = Url::parse(base_url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            service_key: service_key.to_string(),
        })
    }

    fn table_url(&self, table: Table) -> Result<Url, DatabaseError> {
        self.base_url
            .join(&format!("rest/v1/{}", table.name()))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)
    }

    fn by_id(&self, table: Table, id: &RecordId) -> Result<Url, DatabaseError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id))
            .append_pair("select", "*");
        Ok(url)
    }

    fn newest_first(&self, table: Table) -> Result<Url, DatabaseError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Like `request`, asking the store to echo the affected rows back
    fn returning(&self, method: Method, url: Url) -> RequestBuilder {
        self.request(method, url).header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(
        &self,
        table: Table,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, DatabaseError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(DatabaseError::Rejected {
                table,
                operation,
                status: status.as_u16(),
                message,
            });
        }

        debug!("{} on {} answered {}", operation, table, status);
        Ok(response.json::<T>().await?)
    }

    async fn first<T: DeserializeOwned>(
        &self,
        table: Table,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<Option<T>, DatabaseError> {
        let rows: Vec<T> = self.send(table, operation, request).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl Store for RestStore {
    async fn list_properties(&self) -> Result<Vec<Property>, DatabaseError> {
        let url = self.newest_first(Table::Properties)?;
        self.send(Table::Properties, Operation::Select, self.request(Method::GET, url))
            .await
    }

    async fn find_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        let url = self.by_id(Table::Properties, id)?;
        self.first(Table::Properties, Operation::Select, self.request(Method::GET, url))
            .await
    }

    async fn insert_property(&self, draft: &PropertyDraft) -> Result<Property, DatabaseError> {
        let url = self.table_url(Table::Properties)?;
        let request = self.returning(Method::POST, url).json(&[draft]);
        self.first(Table::Properties, Operation::Insert, request)
            .await?
            .ok_or_else(|| DatabaseError::QueryError("insert returned no row".to_string()))
    }

    async fn update_property(
        &self,
        id: &RecordId,
        draft: &PropertyDraft,
    ) -> Result<Option<Property>, DatabaseError> {
        let url = self.by_id(Table::Properties, id)?;
        let request = self.returning(Method::PATCH, url).json(draft);
        self.first(Table::Properties, Operation::Update, request).await
    }

    async fn delete_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        let url = self.by_id(Table::Properties, id)?;
        let request = self.returning(Method::DELETE, url);
        self.first(Table::Properties, Operation::Delete, request).await
    }

    async fn list_consultations(&self) -> Result<Vec<Consultation>, DatabaseError> {
        let url = self.newest_first(Table::Consultations)?;
        self.send(Table::Consultations, Operation::Select, self.request(Method::GET, url))
            .await
    }

    async fn update_consultation_status(
        &self,
        id: &RecordId,
        status: &str,
    ) -> Result<Option<Consultation>, DatabaseError> {
        let url = self.by_id(Table::Consultations, id)?;
        let request = self
            .returning(Method::PATCH, url)
            .json(&json!({ "status": status }));
        self.first(Table::Consultations, Operation::Update, request).await
    }

    async fn delete_consultation(&self, id: &RecordId) -> Result<bool, DatabaseError> {
        let url = self.by_id(Table::Consultations, id)?;
        let request = self.returning(Method::DELETE, url);
        let removed: Option<Consultation> = self
            .first(Table::Consultations, Operation::Delete, request)
            .await?;
        Ok(removed.is_some())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        let mut url = self.table_url(Table::Properties)?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("limit", "1");
        let _: Vec<Value> = self
            .send(Table::Properties, Operation::Select, self.request(Method::GET, url))
            .await?;
        Ok(())
    }
}

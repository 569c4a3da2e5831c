#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{redirect, StatusCode};
use serde_json::{Map, Value};

use estate_admin::auth::{AuthError, AuthProvider, SessionUser};
use estate_admin::config::AppConfig;
use estate_admin::database::models::{Consultation, Property, PropertyDraft, RecordId};
use estate_admin::database::{DatabaseError, MemoryStore, Store};
use estate_admin::listing::PropertyType;
use estate_admin::{app, AppState};

pub const SERVICE_KEY: &str = "test-service-key";
pub const AGENT_EMAIL: &str = "agent@example.com";
pub const AGENT_PASSWORD: &str = "correct horse battery";
pub const DEMO_EMAIL: &str = "admin@gmail.com";
pub const DEMO_PASSWORD: &str = "admin123";

/// Auth service stand-in that knows exactly one account
pub struct ScriptedAuth;

#[async_trait]
impl AuthProvider for ScriptedAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        if email == AGENT_EMAIL && password == AGENT_PASSWORD {
            Ok(SessionUser {
                id: "agent-1".to_string(),
                email: email.to_string(),
                app_metadata: Map::new(),
                user_metadata: Map::new(),
                aud: "authenticated".to_string(),
                created_at: Utc::now(),
            })
        } else {
            Err(AuthError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })
        }
    }
}

pub const STORE_FAILURE: &str = "relation \"properties\" does not exist";

/// Store whose every call fails the way a broken database would. With
/// `rows_found`, single-row lookups succeed so the write that follows is
/// the call that fails.
pub struct FailingStore {
    rows_found: bool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self { rows_found: false }
    }

    pub fn with_rows_found() -> Self {
        Self { rows_found: true }
    }

    fn failure() -> DatabaseError {
        DatabaseError::QueryError(STORE_FAILURE.to_string())
    }
}

pub fn stored_property(id: &RecordId) -> Property {
    Property {
        id: id.clone(),
        title: "Harbor View".to_string(),
        location: "Bayside".to_string(),
        full_address: "1 Pier Rd".to_string(),
        price: 450_000,
        kind: PropertyType::Condo,
        status: "For Sale".to_string(),
        beds: 3,
        baths: 2,
        sqft: 1400,
        garage: 1,
        description: "Sea views".to_string(),
        is_rental: false,
        image_url: None,
        image: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn list_properties(&self) -> Result<Vec<Property>, DatabaseError> {
        Err(Self::failure())
    }

    async fn find_property(&self, id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        if self.rows_found {
            Ok(Some(stored_property(id)))
        } else {
            Err(Self::failure())
        }
    }

    async fn insert_property(&self, _draft: &PropertyDraft) -> Result<Property, DatabaseError> {
        Err(Self::failure())
    }

    async fn update_property(
        &self,
        _id: &RecordId,
        _draft: &PropertyDraft,
    ) -> Result<Option<Property>, DatabaseError> {
        Err(Self::failure())
    }

    async fn delete_property(&self, _id: &RecordId) -> Result<Option<Property>, DatabaseError> {
        Err(Self::failure())
    }

    async fn list_consultations(&self) -> Result<Vec<Consultation>, DatabaseError> {
        Err(Self::failure())
    }

    async fn update_consultation_status(
        &self,
        _id: &RecordId,
        _status: &str,
    ) -> Result<Option<Consultation>, DatabaseError> {
        Err(Self::failure())
    }

    async fn delete_consultation(&self, _id: &RecordId) -> Result<bool, DatabaseError> {
        Err(Self::failure())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Err(Self::failure())
    }
}

/// In-process server on its own port. Servers started with `start` or
/// `start_with` run on a fresh in-memory store reachable through `store()`.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    memory: Option<Arc<MemoryStore>>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.store.service_key = Some(SERVICE_KEY.to_string());
    config.api.enable_request_logging = false;
    config
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        let memory = Arc::new(MemoryStore::new());
        Self::launch(config, memory.clone(), Some(memory)).await
    }

    /// Server over an arbitrary store backend
    pub async fn start_with_store(store: Arc<dyn Store>) -> Result<Self> {
        Self::launch(test_config(), store, None).await
    }

    async fn launch(
        config: AppConfig,
        store: Arc<dyn Store>,
        memory: Option<Arc<MemoryStore>>,
    ) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(config, store, Arc::new(ScriptedAuth));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            memory,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            // `/` answers without touching the store, so failing backends come up too
            if let Ok(resp) = client.get(self.url("/")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn store(&self) -> &MemoryStore {
        self.memory
            .as_deref()
            .expect("server was started on a custom store")
    }

    /// Insert a consultation the way the public site would
    pub async fn seed_consultation(&self, row: Value) -> Consultation {
        let row = row.as_object().cloned().expect("consultation row must be an object");
        self.store().seed_consultation(row).await
    }
}

/// Client that reports redirects instead of following them
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("failed to build client")
}

/// `name=value` part of a Set-Cookie header
pub fn cookie_pair(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(reqwest::header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

/// Which table store the handlers talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    /// Direct connection to the Postgres database behind the hosted store
    Postgres,
    /// The hosted store's REST query API (`/rest/v1/<table>`)
    Rest,
    /// Process-local tables, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "rest" | "supabase" => Ok(StoreBackend::Rest),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}' (expected postgres, rest or memory)", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Rest => "rest",
            StoreBackend::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub rest_url: Option<String>,
    #[serde(skip_serializing)]
    pub service_key: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_expiry_hours: u64,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoCredentials {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl DemoCredentials {
    fn default_pair() -> Self {
        Self {
            email: DEMO_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
        }
    }

    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Base URL of the hosted auth service; defaults to the store's REST URL
    pub auth_url: Option<String>,
    #[serde(skip_serializing)]
    pub auth_key: Option<String>,
    pub demo_login: Option<DemoCredentials>,
    pub home_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

const DEMO_EMAIL: &str = "admin@gmail.com";
const DEMO_PASSWORD: &str = "admin123";
const DEVELOPMENT_JWT_SECRET: &str = "estate-admin-development-secret";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the process
    /// environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Store overrides
        self.store.database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        self.store.rest_url = lookup("SUPABASE_URL").filter(|v| !v.is_empty());
        self.store.service_key = lookup("SUPABASE_SERVICE_ROLE_KEY").filter(|v| !v.is_empty());
        self.store.backend = match lookup("STORE_BACKEND") {
            Some(v) => v.parse().map_err(|message| ConfigError::Invalid {
                key: "STORE_BACKEND",
                message,
            })?,
            None if self.store.database_url.is_some() => StoreBackend::Postgres,
            None if self.store.rest_url.is_some() => StoreBackend::Rest,
            None => StoreBackend::Memory,
        };
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.store.connection_timeout = v.parse().unwrap_or(self.store.connection_timeout);
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s != "*")
                .collect();
        }
        if let Some(v) = lookup("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        // Admin overrides
        self.admin.auth_url = lookup("SUPABASE_AUTH_URL")
            .filter(|v| !v.is_empty())
            .or_else(|| self.store.rest_url.clone());
        self.admin.auth_key = lookup("SUPABASE_ANON_KEY")
            .filter(|v| !v.is_empty())
            .or_else(|| self.store.service_key.clone());
        if let Some(v) = lookup("ADMIN_HOME_PATH") {
            self.admin.home_path = v;
        }

        let demo_flag = lookup("ADMIN_DEMO_LOGIN").and_then(|v| v.parse::<bool>().ok());
        let explicit_demo = match (lookup("ADMIN_DEMO_EMAIL"), lookup("ADMIN_DEMO_PASSWORD")) {
            (Some(email), Some(password)) => Some(DemoCredentials { email, password }),
            _ => None,
        };
        self.admin.demo_login = match demo_flag {
            Some(false) => None,
            Some(true) => explicit_demo
                .or_else(|| self.admin.demo_login.take())
                .or_else(|| Some(DemoCredentials::default_pair())),
            None => explicit_demo.or_else(|| self.admin.demo_login.take()),
        };

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Development && self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        match self.store.backend {
            StoreBackend::Postgres if self.store.database_url.is_none() => {
                Err(ConfigError::Missing("DATABASE_URL"))
            }
            StoreBackend::Rest if self.store.rest_url.is_none() => Err(ConfigError::Missing("SUPABASE_URL")),
            StoreBackend::Rest if self.store.service_key.is_none() => {
                Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))
            }
            _ => Ok(()),
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 3000,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                rest_url: None,
                service_key: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                cors_origins: Vec::new(),
                secure_cookies: false,
            },
            admin: AdminConfig {
                auth_url: None,
                auth_key: None,
                demo_login: Some(DemoCredentials::default_pair()),
                home_path: "/admin".to_string(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.store.max_connections = 20;
        config.store.connection_timeout = 10;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.security.jwt_secret = String::new();
        config.security.session_expiry_hours = 24;
        config.security.secure_cookies = true;
        config.admin.demo_login = None;
        config
    }

    fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.store.max_connections = 50;
        config.store.connection_timeout = 5;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config.security.session_expiry_hours = 8;
        config
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

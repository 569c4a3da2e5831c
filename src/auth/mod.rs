pub mod provider;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::SecurityConfig;

pub use provider::{
    authenticate, provider_from_config, AuthProvider, GoTrueProvider, LoginOutcome,
    UnavailableProvider,
};

pub const SESSION_COOKIE: &str = "estate_admin_session";
pub const AUDIENCE: &str = "authenticated";
pub const DEMO_USER_ID: &str = "demo-admin-user";

/// Signed admin session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub aud: String,
    /// Issued through the demo credential fallback
    #[serde(default)]
    pub demo: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &SessionUser, demo: bool, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            aud: AUDIENCE.to_string(),
            demo,
            iat: now.timestamp(),
            exp,
        }
    }
}

/// Admin user as reported to the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub app_metadata: Map<String, Value>,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
    #[serde(default = "default_audience")]
    pub aud: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_audience() -> String {
    AUDIENCE.to_string()
}

impl SessionUser {
    /// The fixed user the demo fallback signs in as
    pub fn demo(email: &str) -> Self {
        Self {
            id: DEMO_USER_ID.to_string(),
            email: email.to_string(),
            app_metadata: Map::new(),
            user_metadata: Map::new(),
            aud: AUDIENCE.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The auth service answered with an error
    #[error("Auth service rejected sign-in ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Auth service not configured")]
    Unavailable,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Invalid session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub fn issue_token(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    Ok(encode(&Header::default(), claims, &encoding_key)?)
}

pub fn verify_token(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_audience(&[AUDIENCE]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}

// -- Cookie helpers --

pub fn session_cookie(token: &str, security: &SecurityConfig) -> String {
    let max_age_secs = security.session_expiry_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        max_age_secs,
        secure_flag(security)
    )
}

pub fn clear_session_cookie(security: &SecurityConfig) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{}",
        SESSION_COOKIE,
        secure_flag(security)
    )
}

fn secure_flag(security: &SecurityConfig) -> &'static str {
    if security.secure_cookies {
        "; Secure"
    } else {
        ""
    }
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

/// Claims from the session cookie, if it holds a valid token
pub fn session_from_cookie(headers: &HeaderMap, security: &SecurityConfig) -> Option<Claims> {
    let token = get_cookie_value(headers, SESSION_COOKIE)?;
    verify_token(token, security).ok()
}

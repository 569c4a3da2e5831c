use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::{AuthError, SessionUser};
use crate::config::{AdminConfig, DemoCredentials};

/// Password sign-in against the hosted auth service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;
}

/// GoTrue-style password grant: `POST <base>/auth/v1/token?grant_type=password`
pub struct GoTrueProvider {
    client: reqwest::Client,
    token_url: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    user: SessionUser,
}

impl GoTrueProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let mut token_url = Url::parse(base_url).map_err(|_| AuthError::Unavailable)?;
        let path = format!("{}/auth/v1/token", token_url.path().trim_end_matches('/'));
        token_url.set_path(&path);
        token_url
            .query_pairs_mut()
            .append_pair("grant_type", "password");

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            token_url,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl AuthProvider for GoTrueProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str))
                .unwrap_or("sign-in failed")
                .to_string();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.user)
    }
}

/// Provider for the configured auth service, or `UnavailableProvider` when
/// none is configured (only the demo pair can sign in then)
pub fn provider_from_config(
    admin: &AdminConfig,
    timeout: Duration,
) -> Result<Arc<dyn AuthProvider>, AuthError> {
    match (admin.auth_url.as_deref(), admin.auth_key.as_deref()) {
        (Some(url), Some(key)) => {
            info!("Using auth service at {}", url);
            Ok(Arc::new(GoTrueProvider::new(url, key, timeout)?))
        }
        _ => {
            warn!("No auth service configured; only the demo login can sign in");
            Ok(Arc::new(UnavailableProvider))
        }
    }
}

/// Used when no auth service is configured; every sign-in fails
pub struct UnavailableProvider;

#[async_trait]
impl AuthProvider for UnavailableProvider {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<SessionUser, AuthError> {
        Err(AuthError::Unavailable)
    }
}

/// Result of a successful admin login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: SessionUser,
    pub demo: bool,
}

/// Try the auth service first. Only when it fails, and only for the exact
/// demo pair, sign in as the demo user. Every other failure is
/// `InvalidCredentials`; the cause is logged.
pub async fn authenticate(
    provider: &dyn AuthProvider,
    demo: Option<&DemoCredentials>,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, AuthError> {
    match provider.sign_in(email, password).await {
        Ok(user) => {
            info!("Admin {} signed in", user.email);
            Ok(LoginOutcome { user, demo: false })
        }
        Err(err) => match demo {
            Some(pair) if pair.matches(email, password) => {
                warn!("Auth service sign-in failed ({}); using demo login", err);
                Ok(LoginOutcome {
                    user: SessionUser::demo(email),
                    demo: true,
                })
            }
            _ => {
                warn!("Admin sign-in for {} failed: {}", email, err);
                Err(AuthError::InvalidCredentials)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEMO_USER_ID;
    use chrono::Utc;
    use serde_json::Map;

    struct Accepts(&'static str, &'static str);

    #[async_trait]
    impl AuthProvider for Accepts {
        async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
            if email == self.0 && password == self.1 {
                Ok(SessionUser {
                    id: "user-1".into(),
                    email: email.into(),
                    app_metadata: Map::new(),
                    user_metadata: Map::new(),
                    aud: "authenticated".into(),
                    created_at: Utc::now(),
                })
            } else {
                Err(AuthError::Rejected {
                    status: 400,
                    message: "Invalid login credentials".into(),
                })
            }
        }
    }

    fn demo_pair() -> DemoCredentials {
        DemoCredentials {
            email: "admin@gmail.com".into(),
            password: "admin123".into(),
        }
    }

    #[tokio::test]
    async fn provider_success_is_not_demo() {
        let provider = Accepts("real@example.com", "pw");
        let outcome = authenticate(&provider, Some(&demo_pair()), "real@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(outcome.user.id, "user-1");
        assert!(!outcome.demo);
    }

    #[tokio::test]
    async fn demo_pair_used_only_after_provider_failure() {
        let outcome = authenticate(&UnavailableProvider, Some(&demo_pair()), "admin@gmail.com", "admin123")
            .await
            .unwrap();
        assert_eq!(outcome.user.id, DEMO_USER_ID);
        assert!(outcome.demo);
    }

    #[tokio::test]
    async fn near_miss_of_demo_pair_is_rejected() {
        for (email, password) in [
            ("admin@gmail.com", "admin1234"),
            ("Admin@gmail.com", "admin123"),
            ("admin@gmail.com ", "admin123"),
        ] {
            let result = authenticate(&UnavailableProvider, Some(&demo_pair()), email, password).await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn demo_disabled_rejects_demo_pair() {
        let result = authenticate(&UnavailableProvider, None, "admin@gmail.com", "admin123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn token_url_keeps_base_path() {
        let provider =
            GoTrueProvider::new("https://abc.supabase.co/", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(
            provider.token_url.as_str(),
            "https://abc.supabase.co/auth/v1/token?grant_type=password"
        );
    }
}

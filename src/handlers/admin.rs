// handlers/admin.rs - server-rendered admin pages
//
//   GET  /admin/login   form, or straight to the admin home when signed in
//   POST /admin/login   auth service first, demo pair as fallback
//   GET  /admin         landing page for a signed-in admin
//   POST /admin/logout  clear the session cookie

use askama::Template;
use axum::extract::{rejection::FormRejection, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::{TimeZone, Utc};
use serde::Deserialize;

use super::auth::token_error;
use crate::auth::{
    authenticate, clear_session_cookie, issue_token, session_cookie, session_from_cookie, Claims,
};
use crate::config::DemoCredentials;
use crate::error::ApiError;
use crate::state::AppState;

const LOGIN_PATH: &str = "/admin/login";

// -- Templates --

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub password: String,
    pub demo: Option<DemoCredentials>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/home.html")]
pub struct HomeTemplate {
    pub email: String,
    pub demo: bool,
    pub expires_at: String,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// -- Handlers --

/// GET /admin/login
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if session_from_cookie(&headers, &state.config.security).is_some() {
        return Redirect::to(&state.config.admin.home_path).into_response();
    }

    let demo = state.config.admin.demo_login.clone();
    let (email, password) = match &demo {
        Some(pair) => (pair.email.clone(), pair.password.clone()),
        None => (String::new(), String::new()),
    };

    Html(LoginTemplate {
        email,
        password,
        demo,
        error: None,
    })
    .into_response()
}

/// POST /admin/login
pub async fn login_submit(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    let config = &state.config;

    let outcome = match authenticate(
        state.auth.as_ref(),
        config.admin.demo_login.as_ref(),
        &form.email,
        &form.password,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            let page = Html(LoginTemplate {
                email: form.email,
                password: String::new(),
                demo: config.admin.demo_login.clone(),
                error: Some("Invalid credentials".to_string()),
            });
            return Ok((StatusCode::UNAUTHORIZED, page).into_response());
        }
    };

    let claims = Claims::new(&outcome.user, outcome.demo, config.security.session_expiry_hours);
    let token = issue_token(&claims, &config.security).map_err(token_error)?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token, &config.security))]),
        Redirect::to(&config.admin.home_path),
    )
        .into_response())
}

/// GET /admin
pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(claims) = session_from_cookie(&headers, &state.config.security) else {
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    Html(HomeTemplate {
        email: claims.email,
        demo: claims.demo,
        expires_at,
    })
    .into_response()
}

/// POST /admin/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie(&state.config.security))]),
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

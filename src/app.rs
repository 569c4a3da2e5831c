use std::any::Any;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{self, admin, auth, consultations, properties, system};
use crate::middleware::require_admin;
use crate::state::AppState;

/// The full HTTP surface
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(admin_routes())
        .route("/auth/login", post(auth::login))
        // Admin credential required
        .merge(crud_routes(&state))
        .fallback(route_not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(&config.security))
        .layer(middleware::from_fn(preflight_ok));

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::home))
        .route("/admin/login", get(admin::login_page).post(admin::login_submit))
        .route("/admin/logout", post(admin::logout))
}

fn crud_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/manage-properties",
            get(properties::list_properties)
                .post(properties::create_property)
                .put(properties::update_property)
                .delete(properties::delete_property)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/manage-consultations",
            get(consultations::list_consultations)
                .put(consultations::update_consultation)
                .delete(consultations::delete_consultation)
                .fallback(handlers::method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(AnyOrigin)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

/// The CORS layer answers every OPTIONS request itself with an empty 200;
/// give those answers the `ok` body browsers and dashboards expect.
async fn preflight_ok(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let response = next.run(request).await;
    if !is_options || !response.status().is_success() {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from("ok"))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!("Handler panicked: {}", detail);

    ApiError::internal_server_error("Internal server error").into_response()
}

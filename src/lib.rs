//! Carsline API library
//!
//! Appointments, work orders, purchased parts, next-service reminders and
//! work-order reports for an automotive repair shop.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod reports;
pub mod services;
pub mod tracing;

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use utoipa::ToSchema;

use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: crate::config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: crate::config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Every `/api/v1` resource.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/appointments", handlers::appointments::appointments_routes())
        .nest("/orders", handlers::work_orders::work_orders_routes())
        .nest("/parts", handlers::parts::parts_routes())
        .nest("/reminders", handlers::reminders::reminders_routes())
        .nest("/reports", handlers::reports::reports_routes())
}

fn cors_layer(cfg: &crate::config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}

/// The full HTTP application: health, API v1, Swagger UI and the shared layers.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    async fn preflight(cfg: &crate::config::AppConfig, origin: &str) -> Option<String> {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        let router = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(cfg));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ping")
            .header("origin", origin)
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        response
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    fn test_config() -> crate::config::AppConfig {
        crate::config::AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        )
    }

    #[tokio::test]
    async fn configured_origins_are_allowed_and_others_are_not() {
        let mut cfg = test_config();
        cfg.cors_allowed_origins = Some(" https://shop.example , ,https://desk.example".into());

        assert_eq!(
            preflight(&cfg, "https://desk.example").await.as_deref(),
            Some("https://desk.example")
        );
        assert_eq!(
            preflight(&cfg, "https://shop.example").await.as_deref(),
            Some("https://shop.example")
        );
        assert_eq!(preflight(&cfg, "https://elsewhere.example").await, None);
    }

    #[tokio::test]
    async fn unset_origins_fall_back_to_permissive() {
        let cfg = test_config();
        assert_eq!(
            preflight(&cfg, "https://elsewhere.example").await.as_deref(),
            Some("*")
        );
    }
}

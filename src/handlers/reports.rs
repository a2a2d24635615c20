use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::common::ok;
use crate::{
    errors::ServiceError,
    reports::{ReportPreview, SavedReport},
    ApiResponse, AppState,
};

pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/:id/download", get(download_report))
        .route("/orders/:id/preview", post(preview_report))
        .route("/orders/:id/save", post(save_report))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/orders/{id}/download",
    summary = "Download work-order report",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Rendering failed", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let report = state.services.reports.download(id).await?;
    let disposition = format!("attachment; filename=\"{}\"", report.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, report.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/reports/orders/{id}/preview",
    summary = "Preview work-order report",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Base64-encoded PDF", body = ApiResponse<ReportPreview>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn preview_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ReportPreview>>, ServiceError> {
    let preview = state.services.reports.preview(id).await?;
    Ok(ok(preview))
}

#[utoipa::path(
    post,
    path = "/api/v1/reports/orders/{id}/save",
    summary = "Save work-order report",
    description = "Writes the PDF under the configured output directory.",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Report written", body = ApiResponse<SavedReport>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn save_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SavedReport>>, ServiceError> {
    let saved = state.services.reports.save(id).await?;
    Ok(ok(saved))
}

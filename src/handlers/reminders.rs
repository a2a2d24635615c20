use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};

use super::common::ok;
use crate::{
    errors::ServiceError,
    services::reminders::{
        MarkSentRequest, MarkSentResult, PendingReminder, ReminderDetail, ReminderSummary,
    },
    ApiResponse, AppState,
};

pub fn reminders_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/stage/:stage", get(list_pending))
        .route("/mark-sent", put(mark_sent))
        .route("/:id", get(get_reminder))
}

#[utoipa::path(
    get,
    path = "/api/v1/reminders/summary",
    summary = "Pending reminder counts",
    responses(
        (status = 200, description = "Counts per stage within the summary horizon", body = ApiResponse<ReminderSummary>),
    ),
    tag = "reminders"
)]
pub async fn summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReminderSummary>>, ServiceError> {
    let result = state.services.reminders.summary().await?;
    Ok(ok(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/reminders/stage/{stage}",
    summary = "Reminders due at a stage",
    params(("stage" = u8, Path, description = "1, 2 or 3")),
    responses(
        (status = 200, description = "Pending reminders, soonest service first", body = ApiResponse<Vec<PendingReminder>>),
        (status = 400, description = "Unknown stage", body = crate::errors::ErrorResponse),
    ),
    tag = "reminders"
)]
pub async fn list_pending(
    State(state): State<AppState>,
    Path(stage): Path<u8>,
) -> Result<Json<ApiResponse<Vec<PendingReminder>>>, ServiceError> {
    let result = state.services.reminders.list_pending(stage).await?;
    Ok(ok(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/reminders/{id}",
    summary = "Get reminder",
    params(("id" = i32, Path, description = "Reminder id")),
    responses(
        (status = 200, description = "Reminder with customer and vehicle contact data", body = ApiResponse<ReminderDetail>),
        (status = 404, description = "Reminder not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reminders"
)]
pub async fn get_reminder(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ReminderDetail>>, ServiceError> {
    let result = state.services.reminders.get_detail(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/reminders/mark-sent",
    summary = "Mark a reminder notice as sent",
    request_body = MarkSentRequest,
    responses(
        (status = 200, description = "Stage recorded", body = ApiResponse<MarkSentResult>),
        (status = 400, description = "Unknown stage or earlier stage not sent", body = crate::errors::ErrorResponse),
        (status = 404, description = "Reminder not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reminders"
)]
pub async fn mark_sent(
    State(state): State<AppState>,
    Json(request): Json<MarkSentRequest>,
) -> Result<Json<ApiResponse<MarkSentResult>>, ServiceError> {
    let result = state.services.reminders.mark_sent(request).await?;
    Ok(ok(result))
}

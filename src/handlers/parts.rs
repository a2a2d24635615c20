use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

use super::common::{created, ok, OwnerQuery};
use crate::{
    errors::ServiceError,
    services::parts::{
        AddPartsRequest, AppointmentParts, PartRemoved, PartView, PartsAdded, PartsReady,
        SalePriceRequest, WorkItemParts,
    },
    ApiResponse, AppState,
};

pub fn parts_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add_parts))
        .route("/work-items/:id", get(list_for_work_item))
        .route("/work-items/:id/ready", put(mark_ready))
        .route("/appointments/:id", get(list_for_appointment))
        .route("/:id", delete(remove_part))
        .route("/:id/sale-price", put(update_sale_price))
}

#[utoipa::path(
    post,
    path = "/api/v1/parts",
    summary = "Record purchased parts",
    description = "Adds a batch of parts to an appointment or order work item.",
    request_body = AddPartsRequest,
    responses(
        (status = 201, description = "Parts recorded", body = ApiResponse<PartsAdded>),
        (status = 400, description = "Invalid parts or closed owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Work item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn add_parts(
    State(state): State<AppState>,
    Json(request): Json<AddPartsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PartsAdded>>), ServiceError> {
    let result = state.services.parts.add_to_work_item(request).await?;
    Ok(created(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/parts/work-items/{id}/ready",
    summary = "Mark parts ready",
    params(("id" = i32, Path, description = "Work item id"), OwnerQuery),
    responses(
        (status = 200, description = "Parts-ready flag set", body = ApiResponse<PartsReady>),
        (status = 404, description = "Work item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn mark_ready(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<PartsReady>>, ServiceError> {
    let result = state
        .services
        .parts
        .mark_ready(id, owner.order_scoped)
        .await?;
    Ok(ok(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/work-items/{id}",
    summary = "List parts of a work item",
    params(("id" = i32, Path, description = "Work item id"), OwnerQuery),
    responses(
        (status = 200, description = "Parts with totals", body = ApiResponse<WorkItemParts>),
        (status = 404, description = "Work item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn list_for_work_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<WorkItemParts>>, ServiceError> {
    let result = state
        .services
        .parts
        .list_for_work_item(id, owner.order_scoped)
        .await?;
    Ok(ok(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/appointments/{id}",
    summary = "List parts of an appointment",
    params(("id" = i32, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Parts grouped by work item", body = ApiResponse<AppointmentParts>),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn list_for_appointment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AppointmentParts>>, ServiceError> {
    let result = state.services.parts.list_for_appointment(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    delete,
    path = "/api/v1/parts/{id}",
    summary = "Remove a part",
    params(("id" = i32, Path, description = "Part id")),
    responses(
        (status = 200, description = "Part removed", body = ApiResponse<PartRemoved>),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Part already transferred to an order", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn remove_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PartRemoved>>, ServiceError> {
    let result = state.services.parts.remove(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/parts/{id}/sale-price",
    summary = "Update sale price",
    params(("id" = i32, Path, description = "Part id")),
    request_body = SalePriceRequest,
    responses(
        (status = 200, description = "Sale price updated", body = ApiResponse<PartView>),
        (status = 400, description = "Price must be positive", body = crate::errors::ErrorResponse),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Part already transferred to an order", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn update_sale_price(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<SalePriceRequest>,
) -> Result<Json<ApiResponse<PartView>>, ServiceError> {
    let result = state
        .services
        .parts
        .update_sale_price(id, request)
        .await?;
    Ok(ok(result))
}

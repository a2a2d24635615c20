use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use super::common::{created, ok, DateQuery, StaffId};
use crate::{
    errors::ServiceError,
    services::appointments::{
        AppointmentCancelled, AppointmentCreated, AppointmentDetail, AppointmentSummary,
        CreateAppointmentRequest, RescheduleRequest, Rescheduled,
    },
    ApiResponse, AppState,
};

pub fn appointments_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_appointment).get(list_appointments))
        .route("/:id", get(get_appointment))
        .route("/:id/reschedule", put(reschedule_appointment))
        .route("/:id/cancel", put(cancel_appointment))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    summary = "Create appointment",
    description = "Books a visit with its work items. A service visit clears the vehicle's next-service reminder.",
    request_body = CreateAppointmentRequest,
    params(("X-User-Id" = i32, Header, description = "Scheduler staff id")),
    responses(
        (status = 201, description = "Appointment created", body = ApiResponse<AppointmentCreated>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced record not found", body = crate::errors::ErrorResponse),
    ),
    tag = "appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    StaffId(scheduler_id): StaffId,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentCreated>>), ServiceError> {
    let result = state
        .services
        .appointments
        .create(scheduler_id, request)
        .await?;
    Ok(created(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    summary = "List appointments for a day",
    params(DateQuery),
    responses(
        (status = 200, description = "Active appointments ordered by time", body = ApiResponse<Vec<AppointmentSummary>>),
    ),
    tag = "appointments"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ApiResponse<Vec<AppointmentSummary>>>, ServiceError> {
    let appointments = state
        .services
        .appointments
        .list_by_date(query.date)
        .await?;
    Ok(ok(appointments))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    summary = "Get appointment",
    params(("id" = i32, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment with its work items", body = ApiResponse<AppointmentDetail>),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AppointmentDetail>>, ServiceError> {
    let detail = state.services.appointments.get_detail(id).await?;
    Ok(ok(detail))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}/reschedule",
    summary = "Reschedule appointment",
    params(("id" = i32, Path, description = "Appointment id")),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Appointment moved", body = ApiResponse<Rescheduled>),
        (status = 400, description = "Time is not in the future", body = crate::errors::ErrorResponse),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slot already taken", body = crate::errors::ErrorResponse),
    ),
    tag = "appointments"
)]
pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<ApiResponse<Rescheduled>>, ServiceError> {
    let result = state
        .services
        .appointments
        .reschedule(id, request)
        .await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}/cancel",
    summary = "Cancel appointment",
    params(("id" = i32, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = ApiResponse<AppointmentCancelled>),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "appointments"
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AppointmentCancelled>>, ServiceError> {
    let result = state.services.appointments.cancel(id).await?;
    Ok(ok(result))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use super::common::{created, ok, DateQuery, StaffId};
use crate::{
    errors::ServiceError,
    services::work_orders::{
        AddOrderPartsRequest, AssignTechnicianRequest, ChecklistRequest, ChecklistView,
        CommentsRequest, CompleteWorkRequest, CostsFinalized, CreateOrderRequest,
        LaborCostRequest, OrderCancelled, OrderCreated, OrderDelivered, OrderDetail,
        OrderPartsAdded, OrderSummary, TechnicianWorkItem, WorkItemProgress,
    },
    ApiResponse, AppState,
};

type Progress = Result<Json<ApiResponse<WorkItemProgress>>, ServiceError>;

pub fn work_orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/advisor/:order_type_id", get(list_for_advisor))
        .route("/shop-manager/:order_type_id", get(list_for_shop_manager))
        .route("/work-items", get(list_technician_work))
        .route("/:id", get(get_order))
        .route("/:id/cancel", put(cancel_order))
        .route("/:id/deliver", put(deliver_order))
        .route("/:id/finalize-costs", put(finalize_costs))
        .route("/:id/checklist", put(upsert_checklist))
        .route("/work-items/:id/parts", post(add_parts))
        .route("/work-items/:id/assign", put(assign_technician))
        .route("/work-items/:id/start", put(start_work))
        .route("/work-items/:id/pause", put(pause_work))
        .route("/work-items/:id/resume", put(resume_work))
        .route("/work-items/:id/complete", put(complete_work))
        .route("/work-items/:id/labor-cost", put(set_labor_cost))
        .route(
            "/work-items/:id/shop-manager-comments",
            put(set_shop_manager_comments),
        )
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create work order",
    description = "Opens an order and numbers it with the prefix of its order type.",
    request_body = CreateOrderRequest,
    params(("X-User-Id" = i32, Header, description = "Advisor staff id")),
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderCreated>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced record not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    StaffId(advisor_id): StaffId,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderCreated>>), ServiceError> {
    let result = state.services.work_orders.create(advisor_id, request).await?;
    Ok(created(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/advisor/{order_type_id}",
    summary = "Advisor board",
    params(
        ("order_type_id" = i32, Path, description = "Order type"),
        ("X-User-Id" = i32, Header, description = "Advisor staff id"),
    ),
    responses(
        (status = 200, description = "Open orders of the advisor", body = ApiResponse<Vec<OrderSummary>>),
    ),
    tag = "orders"
)]
pub async fn list_for_advisor(
    State(state): State<AppState>,
    StaffId(advisor_id): StaffId,
    Path(order_type_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<OrderSummary>>>, ServiceError> {
    let orders = state
        .services
        .work_orders
        .list_for_advisor(order_type_id, advisor_id)
        .await?;
    Ok(ok(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/shop-manager/{order_type_id}",
    summary = "Shop-manager board",
    params(("order_type_id" = i32, Path, description = "Order type")),
    responses(
        (status = 200, description = "Open orders across advisors", body = ApiResponse<Vec<OrderSummary>>),
    ),
    tag = "orders"
)]
pub async fn list_for_shop_manager(
    State(state): State<AppState>,
    Path(order_type_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<OrderSummary>>>, ServiceError> {
    let orders = state
        .services
        .work_orders
        .list_for_shop_manager(order_type_id)
        .await?;
    Ok(ok(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/work-items",
    summary = "Technician board",
    params(DateQuery),
    responses(
        (status = 200, description = "Work in hand plus work completed that day", body = ApiResponse<Vec<TechnicianWorkItem>>),
    ),
    tag = "orders"
)]
pub async fn list_technician_work(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ApiResponse<Vec<TechnicianWorkItem>>>, ServiceError> {
    let items = state
        .services
        .work_orders
        .list_technician_work(query.date)
        .await?;
    Ok(ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get work order",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with work items and checklist", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDetail>>, ServiceError> {
    let detail = state.services.work_orders.get_detail(id).await?;
    Ok(ok(detail))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/cancel",
    summary = "Cancel work order",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<OrderCancelled>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already delivered", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderCancelled>>, ServiceError> {
    let result = state.services.work_orders.cancel(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/deliver",
    summary = "Deliver work order",
    description = "Requires every work item completed and, except for warranty orders, finalized costs.",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", body = ApiResponse<OrderDelivered>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already delivered", body = crate::errors::ErrorResponse),
        (status = 422, description = "Work pending or costs not finalized", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn deliver_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDelivered>>, ServiceError> {
    let result = state.services.work_orders.deliver(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/finalize-costs",
    summary = "Finalize order costs",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Totals computed and stored", body = ApiResponse<CostsFinalized>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already delivered", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn finalize_costs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CostsFinalized>>, ServiceError> {
    let result = state.services.work_orders.finalize_costs(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/checklist",
    summary = "Record inspection checklist",
    params(("id" = i32, Path, description = "Order id")),
    request_body = ChecklistRequest,
    responses(
        (status = 200, description = "Checklist stored", body = ApiResponse<ChecklistView>),
        (status = 400, description = "Invalid checklist", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn upsert_checklist(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ChecklistRequest>,
) -> Result<Json<ApiResponse<ChecklistView>>, ServiceError> {
    let result = state
        .services
        .work_orders
        .upsert_checklist(id, request)
        .await?;
    Ok(ok(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/work-items/{id}/parts",
    summary = "Add parts to an order work item",
    params(("id" = i32, Path, description = "Order work item id")),
    request_body = AddOrderPartsRequest,
    responses(
        (status = 201, description = "Parts recorded as transferred", body = ApiResponse<OrderPartsAdded>),
        (status = 400, description = "Invalid parts or cancelled work item", body = crate::errors::ErrorResponse),
        (status = 404, description = "Work item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn add_parts(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AddOrderPartsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderPartsAdded>>), ServiceError> {
    let result = state.services.work_orders.add_parts(id, request).await?;
    Ok(created(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/work-items/{id}/assign",
    summary = "Assign technician",
    params(("id" = i32, Path, description = "Order work item id")),
    request_body = AssignTechnicianRequest,
    responses(
        (status = 200, description = "Technician assigned", body = ApiResponse<WorkItemProgress>),
        (status = 404, description = "Work item or technician not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Work item already started", body = crate::errors::ErrorResponse),
    ),
    tag = "technician workflow"
)]
pub async fn assign_technician(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AssignTechnicianRequest>,
) -> Progress {
    let result = state
        .services
        .work_orders
        .assign_technician(id, request)
        .await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/work-items/{id}/start",
    summary = "Start work",
    params(("id" = i32, Path, description = "Order work item id")),
    responses(
        (status = 200, description = "Work started", body = ApiResponse<WorkItemProgress>),
        (status = 404, description = "Work item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Work item is not assigned", body = crate::errors::ErrorResponse),
    ),
    tag = "technician workflow"
)]
pub async fn start_work(State(state): State<AppState>, Path(id): Path<i32>) -> Progress {
    let result = state.services.work_orders.start_work(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/work-items/{id}/pause",
    summary = "Pause work",
    params(("id" = i32, Path, description = "Order work item id")),
    responses(
        (status = 200, description = "Work paused", body = ApiResponse<WorkItemProgress>),
        (status = 409, description = "Work item is not in progress", body = crate::errors::ErrorResponse),
    ),
    tag = "technician workflow"
)]
pub async fn pause_work(State(state): State<AppState>, Path(id): Path<i32>) -> Progress {
    let result = state.services.work_orders.pause_work(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/work-items/{id}/resume",
    summary = "Resume work",
    params(("id" = i32, Path, description = "Order work item id")),
    responses(
        (status = 200, description = "Work resumed", body = ApiResponse<WorkItemProgress>),
        (status = 409, description = "Work item is not paused", body = crate::errors::ErrorResponse),
    ),
    tag = "technician workflow"
)]
pub async fn resume_work(State(state): State<AppState>, Path(id): Path<i32>) -> Progress {
    let result = state.services.work_orders.resume_work(id).await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/work-items/{id}/complete",
    summary = "Complete work",
    params(("id" = i32, Path, description = "Order work item id")),
    request_body = CompleteWorkRequest,
    responses(
        (status = 200, description = "Work completed and order progress updated", body = ApiResponse<WorkItemProgress>),
        (status = 409, description = "Work item is not in progress", body = crate::errors::ErrorResponse),
    ),
    tag = "technician workflow"
)]
pub async fn complete_work(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    request: Option<Json<CompleteWorkRequest>>,
) -> Progress {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let result = state
        .services
        .work_orders
        .complete_work(id, request)
        .await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/work-items/{id}/labor-cost",
    summary = "Set labor cost",
    params(("id" = i32, Path, description = "Order work item id")),
    request_body = LaborCostRequest,
    responses(
        (status = 200, description = "Labor cost stored", body = ApiResponse<WorkItemProgress>),
        (status = 400, description = "Negative amount", body = crate::errors::ErrorResponse),
    ),
    tag = "technician workflow"
)]
pub async fn set_labor_cost(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<LaborCostRequest>,
) -> Progress {
    let result = state
        .services
        .work_orders
        .set_labor_cost(id, request)
        .await?;
    Ok(ok(result))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/work-items/{id}/shop-manager-comments",
    summary = "Set shop-manager comments",
    params(("id" = i32, Path, description = "Order work item id")),
    request_body = CommentsRequest,
    responses(
        (status = 200, description = "Comments stored", body = ApiResponse<WorkItemProgress>),
    ),
    tag = "technician workflow"
)]
pub async fn set_shop_manager_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<CommentsRequest>,
) -> Progress {
    let result = state
        .services
        .work_orders
        .set_shop_manager_comments(id, request)
        .await?;
    Ok(ok(result))
}

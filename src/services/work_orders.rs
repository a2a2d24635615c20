use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveEnum, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::ReminderSettings,
    db::{self, DbPool},
    entities::{order_work_item, service_checklist, work_order},
    errors::ServiceError,
    models::{order_kind, OrderStatus, PartOwner, WorkStatus},
    services::{
        day_bounds, local_now, local_today, lookups,
        parts::{self, NewPart, PartView},
        reminders,
    },
};

const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewOrderWorkItem {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(range(min = 1))]
    pub order_type_id: i32,
    #[validate(range(min = 1))]
    pub customer_id: i32,
    #[validate(range(min = 1))]
    pub vehicle_id: i32,
    pub service_type_id: Option<i32>,
    #[validate(range(min = 0))]
    pub odometer: i32,
    #[schema(value_type = String, example = "2025-01-10T18:00:00")]
    pub promised_delivery_at: NaiveDateTime,
    #[validate(length(max = 2000))]
    pub advisor_notes: Option<String>,
    #[validate(length(min = 1, message = "At least one work item is required"))]
    pub work_items: Vec<NewOrderWorkItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderCreated {
    pub order_id: i32,
    pub order_number: String,
    pub work_item_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BoardWorkItem {
    pub id: i32,
    pub description: String,
    pub technician: Option<String>,
    pub status: WorkStatus,
    #[schema(value_type = Option<String>)]
    pub started_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub finished_at: Option<NaiveDateTime>,
}

/// One card on the advisor or shop-manager board.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub order_number: String,
    pub order_type: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_type: Option<String>,
    pub vehicle: String,
    pub vin: String,
    pub plates: Option<String>,
    #[schema(value_type = String)]
    pub promised_delivery_at: NaiveDateTime,
    #[schema(value_type = Option<String>)]
    pub delivered_at: Option<NaiveDateTime>,
    pub status: OrderStatus,
    pub total_work_items: i32,
    pub completed_work_items: i32,
    #[schema(value_type = f64)]
    pub progress: Decimal,
    #[schema(value_type = f64)]
    pub cost_total: Decimal,
    pub has_evidence: bool,
    pub work_items: Vec<BoardWorkItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderWorkItemDetail {
    pub id: i32,
    pub description: String,
    pub instructions: Option<String>,
    pub technician_id: Option<i32>,
    pub technician: Option<String>,
    #[schema(value_type = Option<String>)]
    pub assigned_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub started_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub finished_at: Option<NaiveDateTime>,
    pub technician_comments: Option<String>,
    pub shop_manager_comments: Option<String>,
    pub parts_ready: bool,
    #[schema(value_type = f64)]
    pub labor_cost: Decimal,
    #[schema(value_type = f64)]
    pub parts_total: Decimal,
    pub status: WorkStatus,
    pub status_name: String,
    pub status_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChecklistRequest {
    #[validate(length(min = 1, max = 100))]
    pub steering: String,
    #[validate(length(min = 1, max = 100))]
    pub suspension: String,
    #[validate(length(min = 1, max = 100))]
    pub tires: String,
    #[validate(length(min = 1, max = 100))]
    pub lights: String,
    #[validate(length(min = 1, max = 100))]
    pub brakes: String,
    #[serde(default)]
    pub parts_replaced: bool,
    #[serde(default)]
    pub work_performed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChecklistView {
    pub order_id: i32,
    pub steering: String,
    pub suspension: String,
    pub tires: String,
    pub lights: String,
    pub brakes: String,
    pub parts_replaced: bool,
    pub work_performed: bool,
    #[schema(value_type = String)]
    pub updated_at: NaiveDateTime,
}

impl From<service_checklist::Model> for ChecklistView {
    fn from(c: service_checklist::Model) -> Self {
        Self {
            order_id: c.work_order_id,
            steering: c.steering,
            suspension: c.suspension,
            tires: c.tires,
            lights: c.lights,
            brakes: c.brakes,
            parts_replaced: c.parts_replaced,
            work_performed: c.work_performed,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: i32,
    pub order_number: String,
    pub order_type_id: i32,
    pub order_type: String,
    pub service_type_id: Option<i32>,
    pub service_type: Option<String>,
    pub status: OrderStatus,
    pub status_name: String,
    pub customer_id: i32,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub vehicle_id: i32,
    pub vehicle: String,
    pub vin: String,
    pub plates: Option<String>,
    pub advisor_id: i32,
    pub advisor: Option<String>,
    pub odometer: i32,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String)]
    pub promised_delivery_at: NaiveDateTime,
    #[schema(value_type = Option<String>)]
    pub finished_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub delivered_at: Option<NaiveDateTime>,
    pub advisor_notes: Option<String>,
    pub shop_manager_notes: Option<String>,
    #[schema(value_type = f64)]
    pub cost_total: Decimal,
    #[schema(value_type = f64)]
    pub cost_total_with_tax: Decimal,
    pub total_work_items: i32,
    pub completed_work_items: i32,
    #[schema(value_type = f64)]
    pub progress: Decimal,
    pub has_evidence: bool,
    pub work_items: Vec<OrderWorkItemDetail>,
    pub checklist: Option<ChecklistView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderCancelled {
    pub order_id: i32,
    pub order_number: String,
    pub work_items_cancelled: u64,
    pub reminder_reactivated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDelivered {
    pub order_id: i32,
    pub order_number: String,
    #[schema(value_type = String)]
    pub delivered_at: NaiveDateTime,
    /// False when the next-service reminder could not be recorded; the
    /// delivery itself stands either way.
    pub reminder_recorded: bool,
}

/// Row of the cross-order technician board.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TechnicianWorkItem {
    pub work_item_id: i32,
    pub description: String,
    pub order_id: i32,
    pub order_number: String,
    #[schema(value_type = String)]
    pub promised_delivery_at: NaiveDateTime,
    pub technician: String,
    pub status: WorkStatus,
    pub status_name: String,
    #[schema(value_type = Option<String>)]
    pub assigned_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub started_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub finished_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddOrderPartsRequest {
    pub parts: Vec<NewPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderPartsAdded {
    pub work_item_id: i32,
    pub parts: Vec<PartView>,
    /// Running parts total of the work item after the insert.
    #[schema(value_type = f64)]
    pub parts_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignTechnicianRequest {
    #[validate(range(min = 1))]
    pub technician_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompleteWorkRequest {
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LaborCostRequest {
    #[schema(value_type = f64, example = 300.0)]
    pub labor_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CommentsRequest {
    #[validate(length(max = 2000))]
    pub comments: String,
}

/// A work item after a workflow step, with its order's roll-up.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkItemProgress {
    pub work_item_id: i32,
    pub status: WorkStatus,
    pub status_name: String,
    #[schema(value_type = f64)]
    pub labor_cost: Decimal,
    #[schema(value_type = f64)]
    pub parts_total: Decimal,
    pub order_id: i32,
    pub order_status: OrderStatus,
    pub completed_work_items: i32,
    pub total_work_items: i32,
    #[schema(value_type = f64)]
    pub progress: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CostsFinalized {
    pub order_id: i32,
    #[schema(value_type = f64)]
    pub cost_total: Decimal,
    #[schema(value_type = f64)]
    pub tax_rate: Decimal,
    #[schema(value_type = f64)]
    pub cost_total_with_tax: Decimal,
}

/// `round(completed * 100 / total)`; zero for an order without items.
pub fn progress_percent(completed: i32, total: i32) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(completed) * Decimal::ONE_HUNDRED / Decimal::from(total)).round()
}

/// Order status implied by the state of its work items, for open orders.
pub fn rolled_up_status(items: &[order_work_item::Model]) -> OrderStatus {
    let live = || items.iter().filter(|i| i.status != WorkStatus::Cancelled);
    if live().any(|i| {
        matches!(
            i.status,
            WorkStatus::InProgress | WorkStatus::Paused | WorkStatus::Completed
        )
    }) {
        OrderStatus::InProgress
    } else if live().any(|i| i.status == WorkStatus::Assigned) {
        OrderStatus::Assigned
    } else {
        OrderStatus::Pending
    }
}

/// Pre-tax and taxed totals over billable items.
pub fn cost_totals(items: &[order_work_item::Model], tax_rate: Decimal) -> (Decimal, Decimal) {
    let total: Decimal = items
        .iter()
        .filter(|i| i.active && i.status != WorkStatus::Cancelled)
        .map(|i| i.labor_cost + i.parts_total)
        .sum();
    let total = total.round_dp(2);
    let with_tax = (total * (Decimal::ONE + tax_rate)).round_dp(2);
    (total, with_tax)
}

fn status_style(styles: &HashMap<i32, (String, String)>, status: WorkStatus) -> (String, String) {
    styles
        .get(&status.to_value())
        .cloned()
        .unwrap_or_else(|| (status.label().to_string(), status.color().to_string()))
}

async fn active_items<C>(conn: &C, order_id: i32) -> Result<Vec<order_work_item::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    order_work_item::Entity::find()
        .filter(order_work_item::Column::WorkOrderId.eq(order_id))
        .filter(order_work_item::Column::Active.eq(true))
        .order_by_asc(order_work_item::Column::Id)
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load order work items", e))
}

/// Work orders from creation to delivery, including the technician workflow.
#[derive(Clone)]
pub struct WorkOrderService {
    db: Arc<DbPool>,
    tax_rate: Decimal,
    reminders: ReminderSettings,
}

impl WorkOrderService {
    pub fn new(db: Arc<DbPool>, tax_rate: Decimal, reminders: ReminderSettings) -> Self {
        Self {
            db,
            tax_rate,
            reminders,
        }
    }

    /// Opens an order with its work items and the next number for its type.
    #[instrument(skip(self, request), fields(order_type_id = request.order_type_id, vehicle_id = request.vehicle_id))]
    pub async fn create(
        &self,
        advisor_id: i32,
        request: CreateOrderRequest,
    ) -> Result<OrderCreated, ServiceError> {
        request.validate()?;
        for item in &request.work_items {
            item.validate()?;
        }

        let txn = db::begin(&self.db).await?;

        lookups::require_order_type(&txn, request.order_type_id).await?;
        lookups::require_customer(&txn, request.customer_id).await?;
        lookups::require_vehicle(&txn, request.vehicle_id).await?;
        lookups::require_service_type(&txn, request.service_type_id).await?;
        lookups::require_staff(&txn, advisor_id).await?;

        let prefix = order_kind::order_prefix(request.order_type_id);
        let issued: Vec<String> = work_order::Entity::find()
            .select_only()
            .column(work_order::Column::OrderNumber)
            .filter(work_order::Column::OrderNumber.starts_with(format!("{}-", prefix)))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| ServiceError::db("load issued order numbers", e))?;
        let order_number = order_kind::next_order_number(prefix, issued.iter().map(String::as_str));

        let now = local_now();
        let work_item_count = request.work_items.len();
        let order = work_order::ActiveModel {
            order_number: Set(order_number.clone()),
            order_type_id: Set(request.order_type_id),
            customer_id: Set(request.customer_id),
            vehicle_id: Set(request.vehicle_id),
            service_type_id: Set(request.service_type_id),
            advisor_id: Set(advisor_id),
            odometer: Set(request.odometer),
            status: Set(OrderStatus::Pending),
            promised_delivery_at: Set(request.promised_delivery_at),
            finished_at: Set(None),
            delivered_at: Set(None),
            advisor_notes: Set(request.advisor_notes),
            shop_manager_notes: Set(None),
            cost_total: Set(Decimal::ZERO),
            cost_total_with_tax: Set(Decimal::ZERO),
            total_work_items: Set(work_item_count as i32),
            completed_work_items: Set(0),
            progress: Set(Decimal::ZERO),
            has_evidence: Set(false),
            created_at: Set(now),
            active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::db("insert work order", e))?;

        for item in request.work_items {
            order_work_item::ActiveModel {
                work_order_id: Set(order.id),
                description: Set(item.description),
                instructions: Set(item.instructions),
                technician_id: Set(None),
                assigned_at: Set(None),
                started_at: Set(None),
                finished_at: Set(None),
                technician_comments: Set(None),
                shop_manager_comments: Set(None),
                parts_ready: Set(false),
                labor_cost: Set(Decimal::ZERO),
                parts_total: Set(Decimal::ZERO),
                status: Set(WorkStatus::Pending),
                active: Set(true),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::db("insert order work item", e))?;
        }

        db::commit(txn).await?;

        info!(order_id = order.id, order_number = %order.order_number, work_item_count, "work order created");
        Ok(OrderCreated {
            order_id: order.id,
            order_number,
            work_item_count,
        })
    }

    /// Open orders of one type for the given advisor.
    #[instrument(skip(self))]
    pub async fn list_for_advisor(
        &self,
        order_type_id: i32,
        advisor_id: i32,
    ) -> Result<Vec<OrderSummary>, ServiceError> {
        self.list_board(order_type_id, Some(advisor_id)).await
    }

    /// Open orders of one type across all advisors.
    #[instrument(skip(self))]
    pub async fn list_for_shop_manager(
        &self,
        order_type_id: i32,
    ) -> Result<Vec<OrderSummary>, ServiceError> {
        self.list_board(order_type_id, None).await
    }

    async fn list_board(
        &self,
        order_type_id: i32,
        advisor_id: Option<i32>,
    ) -> Result<Vec<OrderSummary>, ServiceError> {
        let db = &*self.db;

        let mut query = work_order::Entity::find()
            .filter(work_order::Column::Active.eq(true))
            .filter(work_order::Column::OrderTypeId.eq(order_type_id))
            .filter(work_order::Column::Status.is_in(OrderStatus::OPEN));
        if let Some(advisor_id) = advisor_id {
            query = query.filter(work_order::Column::AdvisorId.eq(advisor_id));
        }
        let orders = query
            .order_by_asc(work_order::Column::PromisedDeliveryAt)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("list work orders", e))?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let items = order_work_item::Entity::find()
            .filter(order_work_item::Column::WorkOrderId.is_in(orders.iter().map(|o| o.id)))
            .filter(order_work_item::Column::Active.eq(true))
            .order_by_asc(order_work_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("load board work items", e))?;

        let technicians =
            lookups::staff_names_by_id(db, items.iter().filter_map(|i| i.technician_id)).await?;
        let customers = lookups::customers_by_id(db, orders.iter().map(|o| o.customer_id)).await?;
        let vehicles = lookups::vehicles_by_id(db, orders.iter().map(|o| o.vehicle_id)).await?;
        let order_types = lookups::order_type_names(db).await?;
        let service_types = lookups::service_type_names(db).await?;

        let mut items_by_order: HashMap<i32, Vec<BoardWorkItem>> = HashMap::new();
        for item in items {
            items_by_order
                .entry(item.work_order_id)
                .or_default()
                .push(BoardWorkItem {
                    id: item.id,
                    technician: item
                        .technician_id
                        .and_then(|id| technicians.get(&id).cloned()),
                    description: item.description,
                    status: item.status,
                    started_at: item.started_at,
                    finished_at: item.finished_at,
                });
        }

        Ok(orders
            .into_iter()
            .map(|o| {
                let customer = customers.get(&o.customer_id);
                let vehicle = vehicles.get(&o.vehicle_id);
                OrderSummary {
                    id: o.id,
                    order_type: order_types.get(&o.order_type_id).cloned().unwrap_or_default(),
                    customer_name: customer.map(|c| c.full_name.clone()).unwrap_or_default(),
                    customer_phone: customer
                        .map(|c| c.mobile_phone.clone())
                        .unwrap_or_default(),
                    service_type: o
                        .service_type_id
                        .and_then(|id| service_types.get(&id).cloned()),
                    vehicle: vehicle.map(|v| v.board_description()).unwrap_or_default(),
                    vin: vehicle.map(|v| v.vin.clone()).unwrap_or_default(),
                    plates: vehicle.and_then(|v| v.plates.clone()),
                    promised_delivery_at: o.promised_delivery_at,
                    delivered_at: o.delivered_at,
                    status: o.status,
                    total_work_items: o.total_work_items,
                    completed_work_items: o.completed_work_items,
                    progress: o.progress,
                    cost_total: o.cost_total,
                    has_evidence: o.has_evidence,
                    work_items: items_by_order.remove(&o.id).unwrap_or_default(),
                    order_number: o.order_number,
                }
            })
            .collect())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_detail(&self, order_id: i32) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db;
        let order = self.require_active(db, order_id).await?;

        let customer = lookups::require_customer(db, order.customer_id).await?;
        let vehicle = lookups::require_vehicle(db, order.vehicle_id).await?;
        let advisor = lookups::staff_name(db, Some(order.advisor_id)).await?;
        let order_type = lookups::order_type_name(db, order.order_type_id).await?;
        let service_type = lookups::service_type_name(db, order.service_type_id).await?;
        let styles = lookups::work_status_styles(db).await?;

        let items = active_items(db, order_id).await?;
        let technicians =
            lookups::staff_names_by_id(db, items.iter().filter_map(|i| i.technician_id)).await?;

        let checklist = service_checklist::Entity::find()
            .filter(service_checklist::Column::WorkOrderId.eq(order_id))
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load checklist", e))?
            .map(ChecklistView::from);

        let work_items = items
            .into_iter()
            .map(|item| {
                let (status_name, status_color) = status_style(&styles, item.status);
                OrderWorkItemDetail {
                    id: item.id,
                    technician: item
                        .technician_id
                        .and_then(|id| technicians.get(&id).cloned()),
                    technician_id: item.technician_id,
                    description: item.description,
                    instructions: item.instructions,
                    assigned_at: item.assigned_at,
                    started_at: item.started_at,
                    finished_at: item.finished_at,
                    technician_comments: item.technician_comments,
                    shop_manager_comments: item.shop_manager_comments,
                    parts_ready: item.parts_ready,
                    labor_cost: item.labor_cost,
                    parts_total: item.parts_total,
                    status: item.status,
                    status_name,
                    status_color,
                }
            })
            .collect();

        Ok(OrderDetail {
            id: order.id,
            order_number: order.order_number,
            order_type_id: order.order_type_id,
            order_type,
            service_type_id: order.service_type_id,
            service_type,
            status: order.status,
            status_name: order.status.label().to_string(),
            customer_id: customer.id,
            customer_name: customer.full_name,
            customer_phone: customer.mobile_phone,
            customer_email: customer.email,
            vehicle_id: vehicle.id,
            vehicle: vehicle.board_description(),
            vin: vehicle.vin,
            plates: vehicle.plates,
            advisor_id: order.advisor_id,
            advisor,
            odometer: order.odometer,
            created_at: order.created_at,
            promised_delivery_at: order.promised_delivery_at,
            finished_at: order.finished_at,
            delivered_at: order.delivered_at,
            advisor_notes: order.advisor_notes,
            shop_manager_notes: order.shop_manager_notes,
            cost_total: order.cost_total,
            cost_total_with_tax: order.cost_total_with_tax,
            total_work_items: order.total_work_items,
            completed_work_items: order.completed_work_items,
            progress: order.progress,
            has_evidence: order.has_evidence,
            work_items,
            checklist,
        })
    }

    /// Cancels an undelivered order. Items not yet started are cancelled with
    /// it; a cancelled service visit re-arms the vehicle's reminder.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel(&self, order_id: i32) -> Result<OrderCancelled, ServiceError> {
        let txn = db::begin(&self.db).await?;
        let order = self.require_active(&txn, order_id).await?;

        if order.status == OrderStatus::Delivered {
            return Err(ServiceError::Conflict(format!(
                "Order {} has already been delivered",
                order.order_number
            )));
        }

        let order_number = order.order_number.clone();
        let order_type_id = order.order_type_id;
        let vehicle_id = order.vehicle_id;

        let mut active: work_order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.active = Set(false);
        active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db("cancel work order", e))?;

        let cancelled = order_work_item::Entity::update_many()
            .col_expr(
                order_work_item::Column::Status,
                Expr::value(WorkStatus::Cancelled.to_value()),
            )
            .filter(order_work_item::Column::WorkOrderId.eq(order_id))
            .filter(order_work_item::Column::Status.is_in(WorkStatus::CANCELLABLE))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("cancel order work items", e))?;

        let reminder_reactivated = if order_kind::is_service(order_type_id) {
            reminders::reactivate_on_cancel(&txn, vehicle_id).await?
        } else {
            false
        };

        db::commit(txn).await?;

        info!(
            order_number = %order_number,
            work_items = cancelled.rows_affected,
            reminder_reactivated,
            "work order cancelled"
        );
        Ok(OrderCancelled {
            order_id,
            order_number,
            work_items_cancelled: cancelled.rows_affected,
            reminder_reactivated,
        })
    }

    /// Hands the vehicle back. Every active item must be completed and, except
    /// for warranty work, costs must have been finalized. The reminder update
    /// that follows is best-effort.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn deliver(&self, order_id: i32) -> Result<OrderDelivered, ServiceError> {
        let txn = db::begin(&self.db).await?;
        let order = self.require_active(&txn, order_id).await?;

        match order.status {
            OrderStatus::Delivered => {
                return Err(ServiceError::Conflict(format!(
                    "Order {} has already been delivered",
                    order.order_number
                )))
            }
            OrderStatus::Cancelled => {
                return Err(ServiceError::NotFound(format!("Order {} not found", order_id)))
            }
            _ => {}
        }

        let items = active_items(&txn, order_id).await?;
        let pending = items
            .iter()
            .filter(|i| i.status != WorkStatus::Completed)
            .count();
        if pending > 0 {
            return Err(ServiceError::PreconditionFailed(format!(
                "{} work item(s) of order {} are not completed",
                pending, order.order_number
            )));
        }
        if !order_kind::is_warranty(order.order_type_id) && order.cost_total.is_zero() {
            return Err(ServiceError::PreconditionFailed(format!(
                "Costs of order {} must be finalized before delivery",
                order.order_number
            )));
        }

        let now = local_now();
        let mut active: work_order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Delivered);
        active.delivered_at = Set(Some(now));
        let delivered = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db("deliver work order", e))?;

        db::commit(txn).await?;
        info!(order_number = %delivered.order_number, "work order delivered");

        let reminder_recorded = match self.record_reminder(&delivered, now.date()).await {
            Ok(recorded) => recorded,
            Err(e) => {
                error!(
                    order_number = %delivered.order_number,
                    error = %e,
                    "failed to record next-service reminder after delivery"
                );
                false
            }
        };

        Ok(OrderDelivered {
            order_id,
            order_number: delivered.order_number,
            delivered_at: now,
            reminder_recorded,
        })
    }

    async fn record_reminder(
        &self,
        order: &work_order::Model,
        delivered_on: NaiveDate,
    ) -> Result<bool, ServiceError> {
        let txn = db::begin(&self.db).await?;
        let recorded =
            reminders::upsert_on_delivery(&txn, order, delivered_on, &self.reminders).await?;
        db::commit(txn).await?;
        Ok(recorded.is_some())
    }

    /// Work on the technician board for `date` (default today): everything
    /// assigned, in progress or paused, plus items completed that day.
    #[instrument(skip(self))]
    pub async fn list_technician_work(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<TechnicianWorkItem>, ServiceError> {
        let db = &*self.db;
        let (start, end) = day_bounds(date.unwrap_or_else(local_today));

        let on_board = Condition::any()
            .add(order_work_item::Column::Status.is_in(WorkStatus::ON_BOARD))
            .add(
                Condition::all()
                    .add(order_work_item::Column::Status.eq(WorkStatus::Completed))
                    .add(order_work_item::Column::FinishedAt.gte(start))
                    .add(order_work_item::Column::FinishedAt.lt(end)),
            );

        let items = order_work_item::Entity::find()
            .filter(order_work_item::Column::Active.eq(true))
            .filter(on_board)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("load technician work", e))?;

        if items.is_empty() {
            return Ok(Vec::new());
        }

        let orders: HashMap<i32, work_order::Model> = work_order::Entity::find()
            .filter(work_order::Column::Id.is_in(items.iter().map(|i| i.work_order_id)))
            .filter(work_order::Column::Active.eq(true))
            .all(db)
            .await
            .map_err(|e| ServiceError::db("load technician orders", e))?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();
        let technicians =
            lookups::staff_names_by_id(db, items.iter().filter_map(|i| i.technician_id)).await?;
        let styles = lookups::work_status_styles(db).await?;

        let mut rows: Vec<TechnicianWorkItem> = items
            .into_iter()
            .filter_map(|item| {
                let order = orders.get(&item.work_order_id)?;
                let (status_name, _) = status_style(&styles, item.status);
                Some(TechnicianWorkItem {
                    work_item_id: item.id,
                    order_id: order.id,
                    order_number: order.order_number.clone(),
                    promised_delivery_at: order.promised_delivery_at,
                    technician: item
                        .technician_id
                        .and_then(|id| technicians.get(&id).cloned())
                        .unwrap_or_else(|| UNASSIGNED.to_string()),
                    description: item.description,
                    status: item.status,
                    status_name,
                    assigned_at: item.assigned_at,
                    started_at: item.started_at,
                    finished_at: item.finished_at,
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.status.to_value(), r.promised_delivery_at));
        Ok(rows)
    }

    /// Buys parts straight onto an order work item. They count as transferred
    /// and are immutable from then on.
    #[instrument(skip(self, request), fields(work_item_id = %work_item_id))]
    pub async fn add_parts(
        &self,
        work_item_id: i32,
        request: AddOrderPartsRequest,
    ) -> Result<OrderPartsAdded, ServiceError> {
        parts::validate_parts(&request.parts)?;

        let txn = db::begin(&self.db).await?;
        let item = self.require_item(&txn, work_item_id).await?;
        if item.status == WorkStatus::Cancelled {
            return Err(ServiceError::ValidationError(format!(
                "Work item {} is cancelled",
                work_item_id
            )));
        }

        let owner = PartOwner::OrderScoped(work_item_id);
        let inserted = parts::insert_parts(&txn, owner, request.parts, true).await?;
        let parts_total = order_work_item::Entity::find_by_id(work_item_id)
            .one(&txn)
            .await
            .map_err(|e| ServiceError::db("reload work item", e))?
            .map(|i| i.parts_total)
            .unwrap_or_default();
        db::commit(txn).await?;

        info!(parts = inserted.len(), %parts_total, "parts added to order work item");
        Ok(OrderPartsAdded {
            work_item_id,
            parts: inserted
                .into_iter()
                .map(PartView::from_model)
                .collect::<Result<_, _>>()?,
            parts_total,
        })
    }

    #[instrument(skip(self, request), fields(work_item_id = %work_item_id, technician_id = request.technician_id))]
    pub async fn assign_technician(
        &self,
        work_item_id: i32,
        request: AssignTechnicianRequest,
    ) -> Result<WorkItemProgress, ServiceError> {
        request.validate()?;
        lookups::require_staff(&*self.db, request.technician_id).await?;
        let technician_id = request.technician_id;

        self.transition(
            work_item_id,
            &[WorkStatus::Pending, WorkStatus::Assigned],
            WorkStatus::Assigned,
            move |_, active, now| {
                active.technician_id = Set(Some(technician_id));
                active.assigned_at = Set(Some(now));
            },
        )
        .await
    }

    #[instrument(skip(self), fields(work_item_id = %work_item_id))]
    pub async fn start_work(&self, work_item_id: i32) -> Result<WorkItemProgress, ServiceError> {
        self.transition(
            work_item_id,
            &[WorkStatus::Assigned],
            WorkStatus::InProgress,
            |item, active, now| {
                if item.started_at.is_none() {
                    active.started_at = Set(Some(now));
                }
            },
        )
        .await
    }

    #[instrument(skip(self), fields(work_item_id = %work_item_id))]
    pub async fn pause_work(&self, work_item_id: i32) -> Result<WorkItemProgress, ServiceError> {
        self.transition(
            work_item_id,
            &[WorkStatus::InProgress],
            WorkStatus::Paused,
            |_, _, _| {},
        )
        .await
    }

    #[instrument(skip(self), fields(work_item_id = %work_item_id))]
    pub async fn resume_work(&self, work_item_id: i32) -> Result<WorkItemProgress, ServiceError> {
        self.transition(
            work_item_id,
            &[WorkStatus::Paused],
            WorkStatus::InProgress,
            |_, _, _| {},
        )
        .await
    }

    #[instrument(skip(self, request), fields(work_item_id = %work_item_id))]
    pub async fn complete_work(
        &self,
        work_item_id: i32,
        request: CompleteWorkRequest,
    ) -> Result<WorkItemProgress, ServiceError> {
        let comments = request.comments;
        self.transition(
            work_item_id,
            &[WorkStatus::InProgress],
            WorkStatus::Completed,
            move |_, active, now| {
                active.finished_at = Set(Some(now));
                if comments.is_some() {
                    active.technician_comments = Set(comments);
                }
            },
        )
        .await
    }

    #[instrument(skip(self, request), fields(work_item_id = %work_item_id))]
    pub async fn set_labor_cost(
        &self,
        work_item_id: i32,
        request: LaborCostRequest,
    ) -> Result<WorkItemProgress, ServiceError> {
        if request.labor_cost.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "Labor cost cannot be negative".to_string(),
            ));
        }
        let labor_cost = request.labor_cost.round_dp(2);
        self.edit_item(work_item_id, move |active| {
            active.labor_cost = Set(labor_cost);
        })
        .await
    }

    #[instrument(skip(self, request), fields(work_item_id = %work_item_id))]
    pub async fn set_shop_manager_comments(
        &self,
        work_item_id: i32,
        request: CommentsRequest,
    ) -> Result<WorkItemProgress, ServiceError> {
        request.validate()?;
        let comments = request.comments;
        self.edit_item(work_item_id, move |active| {
            active.shop_manager_comments = Set(Some(comments));
        })
        .await
    }

    /// Computes and stores the order's pre-tax and taxed totals.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn finalize_costs(&self, order_id: i32) -> Result<CostsFinalized, ServiceError> {
        let txn = db::begin(&self.db).await?;
        let order = self.require_active(&txn, order_id).await?;
        if order.status == OrderStatus::Cancelled {
            return Err(ServiceError::NotFound(format!("Order {} not found", order_id)));
        }
        if order.status == OrderStatus::Delivered {
            return Err(ServiceError::Conflict(format!(
                "Order {} has already been delivered",
                order.order_number
            )));
        }

        let items = active_items(&txn, order_id).await?;
        let (cost_total, cost_total_with_tax) = cost_totals(&items, self.tax_rate);

        let mut active: work_order::ActiveModel = order.into();
        active.cost_total = Set(cost_total);
        active.cost_total_with_tax = Set(cost_total_with_tax);
        active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db("store order costs", e))?;
        db::commit(txn).await?;

        info!(%cost_total, %cost_total_with_tax, "order costs finalized");
        Ok(CostsFinalized {
            order_id,
            cost_total,
            tax_rate: self.tax_rate,
            cost_total_with_tax,
        })
    }

    /// Stores the order's inspection checklist, replacing any earlier one.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn upsert_checklist(
        &self,
        order_id: i32,
        request: ChecklistRequest,
    ) -> Result<ChecklistView, ServiceError> {
        request.validate()?;

        let txn = db::begin(&self.db).await?;
        self.require_active(&txn, order_id).await?;

        let existing = service_checklist::Entity::find()
            .filter(service_checklist::Column::WorkOrderId.eq(order_id))
            .one(&txn)
            .await
            .map_err(|e| ServiceError::db("load checklist", e))?;

        let is_new = existing.is_none();
        let mut row: service_checklist::ActiveModel = match existing {
            Some(checklist) => checklist.into(),
            None => service_checklist::ActiveModel {
                work_order_id: Set(order_id),
                ..Default::default()
            },
        };
        row.steering = Set(request.steering);
        row.suspension = Set(request.suspension);
        row.tires = Set(request.tires);
        row.lights = Set(request.lights);
        row.brakes = Set(request.brakes);
        row.parts_replaced = Set(request.parts_replaced);
        row.work_performed = Set(request.work_performed);
        row.updated_at = Set(local_now());

        let saved = if is_new {
            row.insert(&txn).await
        } else {
            row.update(&txn).await
        }
        .map_err(|e| ServiceError::db("save checklist", e))?;
        db::commit(txn).await?;

        info!(created = is_new, "inspection checklist saved");
        Ok(saved.into())
    }

    /// Applies a status change to a work item of an open order and rolls the
    /// order's counters and status up from its items.
    async fn transition<F>(
        &self,
        work_item_id: i32,
        from: &[WorkStatus],
        to: WorkStatus,
        apply: F,
    ) -> Result<WorkItemProgress, ServiceError>
    where
        F: FnOnce(&order_work_item::Model, &mut order_work_item::ActiveModel, NaiveDateTime)
            + Send,
    {
        let txn = db::begin(&self.db).await?;
        let item = self.require_item(&txn, work_item_id).await?;
        let order = self.require_open_order(&txn, item.work_order_id).await?;

        if !from.contains(&item.status) {
            warn!(
                from = %item.status,
                to = %to,
                "rejected work item transition"
            );
            return Err(ServiceError::Conflict(format!(
                "Work item {} cannot move from {} to {}",
                work_item_id,
                item.status.label(),
                to.label()
            )));
        }

        let now = local_now();
        let mut active: order_work_item::ActiveModel = item.clone().into();
        active.status = Set(to);
        apply(&item, &mut active, now);
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db("update work item", e))?;

        let progress = self.roll_up(&txn, order, updated, now).await?;
        db::commit(txn).await?;

        info!(status = %progress.status, order_status = %progress.order_status, "work item updated");
        Ok(progress)
    }

    /// Edits a non-status field of a work item on an open order.
    async fn edit_item<F>(&self, work_item_id: i32, apply: F) -> Result<WorkItemProgress, ServiceError>
    where
        F: FnOnce(&mut order_work_item::ActiveModel) + Send,
    {
        let txn = db::begin(&self.db).await?;
        let item = self.require_item(&txn, work_item_id).await?;
        let order = self.require_open_order(&txn, item.work_order_id).await?;

        let mut active: order_work_item::ActiveModel = item.into();
        apply(&mut active);
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db("update work item", e))?;

        let progress = self.roll_up(&txn, order, updated, local_now()).await?;
        db::commit(txn).await?;
        Ok(progress)
    }

    async fn roll_up(
        &self,
        txn: &DatabaseTransaction,
        order: work_order::Model,
        item: order_work_item::Model,
        now: NaiveDateTime,
    ) -> Result<WorkItemProgress, ServiceError> {
        let items = active_items(txn, order.id).await?;
        let total = items.len() as i32;
        let completed = items
            .iter()
            .filter(|i| i.status == WorkStatus::Completed)
            .count() as i32;
        let status = rolled_up_status(&items);
        let progress = progress_percent(completed, total);
        let all_done = total > 0 && completed == total;

        let mut active: work_order::ActiveModel = order.clone().into();
        active.total_work_items = Set(total);
        active.completed_work_items = Set(completed);
        active.progress = Set(progress);
        active.status = Set(status);
        active.finished_at = Set(if all_done {
            order.finished_at.or(Some(now))
        } else {
            None
        });
        let order = active
            .update(txn)
            .await
            .map_err(|e| ServiceError::db("roll up work order", e))?;

        Ok(WorkItemProgress {
            work_item_id: item.id,
            status: item.status,
            status_name: item.status.label().to_string(),
            labor_cost: item.labor_cost,
            parts_total: item.parts_total,
            order_id: order.id,
            order_status: order.status,
            completed_work_items: order.completed_work_items,
            total_work_items: order.total_work_items,
            progress: order.progress,
        })
    }

    async fn require_active<C>(&self, conn: &C, order_id: i32) -> Result<work_order::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        work_order::Entity::find_by_id(order_id)
            .one(conn)
            .await
            .map_err(|e| ServiceError::db("load work order", e))?
            .filter(|o| o.active)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn require_open_order<C>(
        &self,
        conn: &C,
        order_id: i32,
    ) -> Result<work_order::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let order = self.require_active(conn, order_id).await?;
        if !order.status.is_open() {
            return Err(ServiceError::Conflict(format!(
                "Order {} is {}",
                order.order_number,
                order.status.label().to_lowercase()
            )));
        }
        Ok(order)
    }

    async fn require_item<C>(
        &self,
        conn: &C,
        work_item_id: i32,
    ) -> Result<order_work_item::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        order_work_item::Entity::find_by_id(work_item_id)
            .one(conn)
            .await
            .map_err(|e| ServiceError::db("load work item", e))?
            .filter(|i| i.active)
            .ok_or_else(|| ServiceError::NotFound(format!("Work item {} not found", work_item_id)))
    }
}

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{self, DbPool},
    entities::{appointment, appointment_work_item},
    errors::ServiceError,
    models::order_kind,
    services::{day_bounds, local_now, local_today, lookups, reminders},
};

/// Minimum spacing between two active appointments.
pub const SLOT_MINUTES: i64 = 30;

const SERVICE_TYPE_FALLBACK: &str = "Not specified";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewAppointmentWorkItem {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAppointmentRequest {
    #[validate(range(min = 1))]
    pub order_type_id: i32,
    #[validate(range(min = 1))]
    pub customer_id: i32,
    #[validate(range(min = 1))]
    pub vehicle_id: i32,
    pub service_type_id: Option<i32>,
    #[schema(value_type = String, example = "2025-01-10T09:00:00")]
    pub scheduled_at: NaiveDateTime,
    #[validate(length(min = 1, message = "At least one work item is required"))]
    pub work_items: Vec<NewAppointmentWorkItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentCreated {
    pub appointment_id: i32,
    #[schema(value_type = String)]
    pub scheduled_at: NaiveDateTime,
    pub work_item_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RescheduleRequest {
    #[schema(value_type = String, example = "2025-01-10T11:30:00")]
    pub scheduled_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Rescheduled {
    pub appointment_id: i32,
    #[schema(value_type = String)]
    pub previous_scheduled_at: NaiveDateTime,
    #[schema(value_type = String)]
    pub scheduled_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentCancelled {
    pub appointment_id: i32,
    pub work_items_deactivated: u64,
    pub reminder_reactivated: bool,
}

/// Row of the daily appointment book.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentSummary {
    pub id: i32,
    #[schema(value_type = String)]
    pub scheduled_at: NaiveDateTime,
    pub customer_name: String,
    pub customer_phone: String,
    pub vehicle: String,
    pub order_type: String,
    pub service_type: String,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentWorkItemView {
    pub id: i32,
    pub description: String,
    pub instructions: Option<String>,
    pub parts_ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentDetail {
    pub id: i32,
    #[schema(value_type = String)]
    pub scheduled_at: NaiveDateTime,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
    pub order_type_id: i32,
    pub order_type: String,
    pub service_type: String,
    pub customer_id: i32,
    pub customer_name: String,
    pub customer_phone: String,
    pub vehicle_id: i32,
    pub vehicle: String,
    pub vin: String,
    pub plates: Option<String>,
    pub scheduler: Option<String>,
    pub work_items: Vec<AppointmentWorkItemView>,
}

/// Open interval of start times that would collide with one at `at`.
pub fn conflict_window(at: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let slot = Duration::minutes(SLOT_MINUTES);
    (at - slot, at + slot)
}

/// Scheduling, rescheduling and cancellation of customer visits.
#[derive(Clone)]
pub struct AppointmentService {
    db: Arc<DbPool>,
}

impl AppointmentService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Books an appointment with its work items in one transaction. A service
    /// booking retires the vehicle's pending next-service reminder.
    #[instrument(skip(self, request), fields(vehicle_id = request.vehicle_id))]
    pub async fn create(
        &self,
        scheduler_id: i32,
        request: CreateAppointmentRequest,
    ) -> Result<AppointmentCreated, ServiceError> {
        request.validate()?;
        for item in &request.work_items {
            item.validate()?;
        }

        let txn = db::begin(&self.db).await?;

        lookups::require_order_type(&txn, request.order_type_id).await?;
        lookups::require_customer(&txn, request.customer_id).await?;
        lookups::require_vehicle(&txn, request.vehicle_id).await?;
        lookups::require_service_type(&txn, request.service_type_id).await?;
        lookups::require_staff(&txn, scheduler_id).await?;

        let now = local_now();
        let created = appointment::ActiveModel {
            order_type_id: Set(request.order_type_id),
            customer_id: Set(request.customer_id),
            vehicle_id: Set(request.vehicle_id),
            service_type_id: Set(request.service_type_id),
            scheduler_id: Set(scheduler_id),
            scheduled_at: Set(request.scheduled_at),
            created_at: Set(now),
            active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::db("insert appointment", e))?;

        let work_item_count = request.work_items.len();
        for item in request.work_items {
            appointment_work_item::ActiveModel {
                appointment_id: Set(created.id),
                description: Set(item.description),
                instructions: Set(item.instructions),
                parts_ready: Set(false),
                active: Set(true),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::db("insert appointment work item", e))?;
        }

        if order_kind::is_service(request.order_type_id) {
            reminders::deactivate_for_vehicle(&txn, request.vehicle_id).await?;
        }

        db::commit(txn).await?;

        info!(
            appointment_id = created.id,
            scheduled_at = %created.scheduled_at,
            work_item_count,
            "appointment created"
        );
        Ok(AppointmentCreated {
            appointment_id: created.id,
            scheduled_at: created.scheduled_at,
            work_item_count,
        })
    }

    /// Moves an appointment to a later free slot.
    #[instrument(skip(self), fields(appointment_id = %appointment_id))]
    pub async fn reschedule(
        &self,
        appointment_id: i32,
        request: RescheduleRequest,
    ) -> Result<Rescheduled, ServiceError> {
        let db = &*self.db;
        let current = self.require_active(appointment_id).await?;

        let new_at = request.scheduled_at;
        if new_at <= local_now() {
            return Err(ServiceError::ValidationError(
                "The new appointment time must be in the future".to_string(),
            ));
        }

        let (from, to) = conflict_window(new_at);
        let clash = appointment::Entity::find()
            .filter(appointment::Column::Active.eq(true))
            .filter(appointment::Column::Id.ne(appointment_id))
            .filter(appointment::Column::ScheduledAt.gt(from))
            .filter(appointment::Column::ScheduledAt.lt(to))
            .one(db)
            .await
            .map_err(|e| ServiceError::db("check appointment slot", e))?;

        if let Some(other) = clash {
            warn!(
                other_appointment_id = other.id,
                other_scheduled_at = %other.scheduled_at,
                "reschedule rejected: slot taken"
            );
            return Err(ServiceError::Conflict(format!(
                "Another appointment is already scheduled at {}",
                other.scheduled_at.format("%Y-%m-%d %H:%M")
            )));
        }

        let previous = current.scheduled_at;
        let mut active: appointment::ActiveModel = current.into();
        active.scheduled_at = Set(new_at);
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::db("reschedule appointment", e))?;

        info!(from = %previous, to = %updated.scheduled_at, "appointment rescheduled");
        Ok(Rescheduled {
            appointment_id,
            previous_scheduled_at: previous,
            scheduled_at: updated.scheduled_at,
        })
    }

    /// Deactivates the appointment and its work items. Cancelling a service
    /// visit re-arms the vehicle's reminder.
    #[instrument(skip(self), fields(appointment_id = %appointment_id))]
    pub async fn cancel(&self, appointment_id: i32) -> Result<AppointmentCancelled, ServiceError> {
        let txn = db::begin(&self.db).await?;

        let current = appointment::Entity::find_by_id(appointment_id)
            .one(&txn)
            .await
            .map_err(|e| ServiceError::db("load appointment", e))?
            .filter(|a| a.active)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Appointment {} not found", appointment_id))
            })?;

        let order_type_id = current.order_type_id;
        let vehicle_id = current.vehicle_id;

        let mut active: appointment::ActiveModel = current.into();
        active.active = Set(false);
        active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db("cancel appointment", e))?;

        let deactivated = appointment_work_item::Entity::update_many()
            .col_expr(appointment_work_item::Column::Active, Expr::value(false))
            .filter(appointment_work_item::Column::AppointmentId.eq(appointment_id))
            .filter(appointment_work_item::Column::Active.eq(true))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::db("deactivate appointment work items", e))?;

        let reminder_reactivated = if order_kind::is_service(order_type_id) {
            reminders::reactivate_on_cancel(&txn, vehicle_id).await?
        } else {
            false
        };

        db::commit(txn).await?;

        info!(
            work_items = deactivated.rows_affected,
            reminder_reactivated, "appointment cancelled"
        );
        Ok(AppointmentCancelled {
            appointment_id,
            work_items_deactivated: deactivated.rows_affected,
            reminder_reactivated,
        })
    }

    /// The appointment book for one day, earliest first. Defaults to today.
    #[instrument(skip(self))]
    pub async fn list_by_date(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AppointmentSummary>, ServiceError> {
        let db = &*self.db;
        let (start, end) = day_bounds(date.unwrap_or_else(local_today));

        let rows = appointment::Entity::find()
            .filter(appointment::Column::Active.eq(true))
            .filter(appointment::Column::ScheduledAt.gte(start))
            .filter(appointment::Column::ScheduledAt.lt(end))
            .order_by_asc(appointment::Column::ScheduledAt)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("list appointments", e))?;

        let customers = lookups::customers_by_id(db, rows.iter().map(|a| a.customer_id)).await?;
        let vehicles = lookups::vehicles_by_id(db, rows.iter().map(|a| a.vehicle_id)).await?;
        let order_types = lookups::order_type_names(db).await?;
        let service_types = lookups::service_type_names(db).await?;

        Ok(rows
            .into_iter()
            .map(|a| {
                let customer = customers.get(&a.customer_id);
                AppointmentSummary {
                    id: a.id,
                    scheduled_at: a.scheduled_at,
                    customer_name: customer.map(|c| c.full_name.clone()).unwrap_or_default(),
                    customer_phone: customer
                        .map(|c| c.mobile_phone.clone())
                        .unwrap_or_default(),
                    vehicle: vehicles
                        .get(&a.vehicle_id)
                        .map(|v| v.short_description())
                        .unwrap_or_default(),
                    order_type: order_types
                        .get(&a.order_type_id)
                        .cloned()
                        .unwrap_or_default(),
                    service_type: a
                        .service_type_id
                        .and_then(|id| service_types.get(&id).cloned())
                        .unwrap_or_else(|| SERVICE_TYPE_FALLBACK.to_string()),
                    created_at: a.created_at,
                }
            })
            .collect())
    }

    #[instrument(skip(self), fields(appointment_id = %appointment_id))]
    pub async fn get_detail(&self, appointment_id: i32) -> Result<AppointmentDetail, ServiceError> {
        let db = &*self.db;
        let current = self.require_active(appointment_id).await?;

        let customer = lookups::require_customer(db, current.customer_id).await?;
        let vehicle = lookups::require_vehicle(db, current.vehicle_id).await?;
        let order_type = lookups::order_type_name(db, current.order_type_id).await?;
        let service_type = lookups::service_type_name(db, current.service_type_id)
            .await?
            .unwrap_or_else(|| SERVICE_TYPE_FALLBACK.to_string());
        let scheduler = lookups::staff_name(db, Some(current.scheduler_id)).await?;

        let work_items = appointment_work_item::Entity::find()
            .filter(appointment_work_item::Column::AppointmentId.eq(appointment_id))
            .filter(appointment_work_item::Column::Active.eq(true))
            .order_by_asc(appointment_work_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("load appointment work items", e))?
            .into_iter()
            .map(|item| AppointmentWorkItemView {
                id: item.id,
                description: item.description,
                instructions: item.instructions,
                parts_ready: item.parts_ready,
            })
            .collect();

        Ok(AppointmentDetail {
            id: current.id,
            scheduled_at: current.scheduled_at,
            created_at: current.created_at,
            order_type_id: current.order_type_id,
            order_type,
            service_type,
            customer_id: customer.id,
            customer_name: customer.full_name,
            customer_phone: customer.mobile_phone,
            vehicle_id: vehicle.id,
            vehicle: vehicle.short_description(),
            vin: vehicle.vin,
            plates: vehicle.plates,
            scheduler,
            work_items,
        })
    }

    async fn require_active(&self, appointment_id: i32) -> Result<appointment::Model, ServiceError> {
        appointment::Entity::find_by_id(appointment_id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db("load appointment", e))?
            .filter(|a| a.active)
            .ok_or_else(|| ServiceError::NotFound(format!("Appointment {} not found", appointment_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn collides(existing: NaiveDateTime, requested: NaiveDateTime) -> bool {
        let (from, to) = conflict_window(requested);
        existing > from && existing < to
    }

    #[rstest]
    #[case(at(9, 0), at(9, 15), true)]
    #[case(at(9, 0), at(9, 0), true)]
    #[case(at(9, 20), at(9, 0), true)]
    #[case(at(9, 0), at(9, 30), false)]
    #[case(at(9, 0), at(8, 30), false)]
    #[case(at(9, 0), at(11, 0), false)]
    fn thirty_minute_slots(
        #[case] existing: NaiveDateTime,
        #[case] requested: NaiveDateTime,
        #[case] expected: bool,
    ) {
        assert_eq!(collides(existing, requested), expected);
    }

    #[test]
    fn create_request_requires_work_items() {
        let request = CreateAppointmentRequest {
            order_type_id: 1,
            customer_id: 1,
            vehicle_id: 5,
            service_type_id: Some(1),
            scheduled_at: at(9, 0),
            work_items: vec![],
        };
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().contains_key("work_items"));
    }
}

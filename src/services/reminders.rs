use std::sync::Arc;

use chrono::{Duration, Months, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::ReminderSettings,
    db::DbPool,
    entities::{customer, next_service_reminder, vehicle, work_order},
    errors::ServiceError,
    models::{order_kind, reminder_stage::next_service_label, ReminderStage},
    services::{local_now, local_today, lookups},
};

/// One row of a pending-reminder call list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingReminder {
    pub id: i32,
    pub customer_name: String,
    pub next_service_label: String,
    pub next_service_date: NaiveDate,
    pub stage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReminderDetail {
    pub id: i32,
    pub customer_id: i32,
    pub customer_name: String,
    pub mobile_phone: String,
    pub home_phone: Option<String>,
    pub email: String,
    pub vehicle: String,
    pub vin: String,
    pub plates: String,
    pub last_service_name: String,
    pub last_service_date: NaiveDate,
    pub last_odometer: i32,
    pub next_service_label: String,
    pub next_service_date: NaiveDate,
    pub next_service_odometer: i32,
    pub first_sent: bool,
    pub second_sent: bool,
    pub third_sent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReminderSummary {
    pub first_pending: u64,
    pub second_pending: u64,
    pub third_pending: u64,
    pub total: u64,
    pub horizon_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkSentRequest {
    #[validate(range(min = 1))]
    pub reminder_id: i32,
    pub stage: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkSentResult {
    pub reminder_id: i32,
    pub stage: String,
    pub first_sent: bool,
    pub second_sent: bool,
    pub third_sent: bool,
}

/// Filter selecting rows whose next notice due is `stage`.
fn pending_condition(stage: ReminderStage) -> Condition {
    use next_service_reminder::Column;

    let due = Condition::all().add(Column::Active.eq(true));
    match stage {
        ReminderStage::First => due.add(Column::FirstSent.eq(false)),
        ReminderStage::Second => due
            .add(Column::FirstSent.eq(true))
            .add(Column::SecondSent.eq(false)),
        ReminderStage::Third => due
            .add(Column::FirstSent.eq(true))
            .add(Column::SecondSent.eq(true))
            .add(Column::ThirdSent.eq(false)),
    }
}

/// Target date and odometer for the service after one delivered on `delivered_on`.
pub fn next_service_targets(
    delivered_on: NaiveDate,
    odometer: i32,
    settings: &ReminderSettings,
) -> Result<(NaiveDate, i32), ServiceError> {
    let date = delivered_on
        .checked_add_months(Months::new(settings.service_interval_months))
        .ok_or_else(|| {
            ServiceError::InternalError(format!(
                "next service date overflows from {}",
                delivered_on
            ))
        })?;
    let km = odometer.saturating_add(settings.service_interval_km);
    Ok((date, km))
}

/// Booking a new service visit supersedes the vehicle's pending reminder.
pub(crate) async fn deactivate_for_vehicle<C>(conn: &C, vehicle_id: i32) -> Result<bool, ServiceError>
where
    C: ConnectionTrait,
{
    let existing = next_service_reminder::Entity::find()
        .filter(next_service_reminder::Column::VehicleId.eq(vehicle_id))
        .filter(next_service_reminder::Column::Active.eq(true))
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load reminder for deactivation", e))?;

    let Some(reminder) = existing else {
        return Ok(false);
    };

    let mut active: next_service_reminder::ActiveModel = reminder.into();
    active.active = Set(false);
    active.modified_at = Set(local_now());
    active
        .update(conn)
        .await
        .map_err(|e| ServiceError::db("deactivate reminder", e))?;

    info!(vehicle_id, "next-service reminder deactivated by new service booking");
    Ok(true)
}

/// Re-arms a vehicle's reminder after a service visit was cancelled. The first
/// two notices count as already sent, so only the final one goes out again.
pub(crate) async fn reactivate_on_cancel<C>(conn: &C, vehicle_id: i32) -> Result<bool, ServiceError>
where
    C: ConnectionTrait,
{
    let existing = next_service_reminder::Entity::find()
        .filter(next_service_reminder::Column::VehicleId.eq(vehicle_id))
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load reminder for reactivation", e))?;

    let Some(reminder) = existing else {
        return Ok(false);
    };

    let mut active: next_service_reminder::ActiveModel = reminder.into();
    active.active = Set(true);
    active.first_sent = Set(true);
    active.second_sent = Set(true);
    active.third_sent = Set(false);
    active.modified_at = Set(local_now());
    active
        .update(conn)
        .await
        .map_err(|e| ServiceError::db("reactivate reminder", e))?;

    info!(vehicle_id, "next-service reminder re-armed after cancellation");
    Ok(true)
}

/// Records a delivered service visit against the vehicle's reminder row,
/// creating it on first delivery. Orders that are not service visits with a
/// service type are ignored.
pub(crate) async fn upsert_on_delivery<C>(
    conn: &C,
    order: &work_order::Model,
    delivered_on: NaiveDate,
    settings: &ReminderSettings,
) -> Result<Option<next_service_reminder::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let Some(service_type_id) = order.service_type_id else {
        return Ok(None);
    };
    if !order_kind::is_service(order.order_type_id) {
        return Ok(None);
    }

    let last_service_name = lookups::service_type_name(conn, Some(service_type_id))
        .await?
        .unwrap_or_else(|| format!("Service {}", service_type_id));
    let (next_date, next_odometer) =
        next_service_targets(delivered_on, order.odometer, settings)?;
    let now = local_now();

    let existing = next_service_reminder::Entity::find()
        .filter(next_service_reminder::Column::VehicleId.eq(order.vehicle_id))
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load reminder for upsert", e))?;

    let is_new = existing.is_none();
    let mut row: next_service_reminder::ActiveModel = match existing {
        Some(reminder) => reminder.into(),
        None => next_service_reminder::ActiveModel {
            vehicle_id: Set(order.vehicle_id),
            ..Default::default()
        },
    };
    row.customer_id = Set(order.customer_id);
    row.last_service_name = Set(last_service_name);
    row.next_service_label = Set(next_service_label(service_type_id).to_string());
    row.last_odometer = Set(order.odometer);
    row.last_service_date = Set(delivered_on);
    row.next_service_date = Set(next_date);
    row.next_service_odometer = Set(next_odometer);
    row.first_sent = Set(false);
    row.second_sent = Set(false);
    row.third_sent = Set(false);
    row.active = Set(true);
    row.modified_at = Set(now);

    let stored = if is_new {
        row.insert(conn).await
    } else {
        row.update(conn).await
    }
    .map_err(|e| ServiceError::db("upsert reminder", e))?;

    info!(
        vehicle_id = order.vehicle_id,
        order_number = %order.order_number,
        %next_date,
        "next-service reminder recorded"
    );
    Ok(Some(stored))
}

/// Call lists and notice bookkeeping for next-service reminders.
#[derive(Clone)]
pub struct ReminderService {
    db: Arc<DbPool>,
    settings: ReminderSettings,
}

impl ReminderService {
    pub fn new(db: Arc<DbPool>, settings: ReminderSettings) -> Self {
        Self { db, settings }
    }

    /// Rows whose next notice due is `stage` and whose next service falls
    /// within the list horizon, soonest first.
    #[instrument(skip(self))]
    pub async fn list_pending(&self, stage: u8) -> Result<Vec<PendingReminder>, ServiceError> {
        let stage = ReminderStage::try_from(stage)?;
        let horizon = local_today() + Duration::days(self.settings.list_horizon_days);

        let rows = next_service_reminder::Entity::find()
            .filter(pending_condition(stage))
            .filter(next_service_reminder::Column::NextServiceDate.lte(horizon))
            .order_by_asc(next_service_reminder::Column::NextServiceDate)
            .find_also_related(customer::Entity)
            .all(&*self.db)
            .await
            .map_err(|e| ServiceError::db("list pending reminders", e))?;

        Ok(rows
            .into_iter()
            .map(|(reminder, customer)| PendingReminder {
                id: reminder.id,
                customer_name: customer.map(|c| c.full_name).unwrap_or_default(),
                next_service_label: reminder.next_service_label,
                next_service_date: reminder.next_service_date,
                stage: stage.display_name().to_string(),
            })
            .collect())
    }

    #[instrument(skip(self), fields(reminder_id = %reminder_id))]
    pub async fn get_detail(&self, reminder_id: i32) -> Result<ReminderDetail, ServiceError> {
        let db = &*self.db;
        let reminder = next_service_reminder::Entity::find_by_id(reminder_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load reminder", e))?
            .filter(|r| r.active)
            .ok_or_else(|| ServiceError::NotFound(format!("Reminder {} not found", reminder_id)))?;

        let customer = customer::Entity::find_by_id(reminder.customer_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load reminder customer", e))?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", reminder.customer_id))
            })?;
        let vehicle = vehicle::Entity::find_by_id(reminder.vehicle_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load reminder vehicle", e))?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vehicle {} not found", reminder.vehicle_id))
            })?;

        Ok(ReminderDetail {
            id: reminder.id,
            customer_id: customer.id,
            customer_name: customer.full_name,
            mobile_phone: customer.mobile_phone,
            home_phone: customer.home_phone,
            email: customer
                .email
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "No email on file".to_string()),
            vehicle: vehicle.full_description(),
            vin: vehicle.vin,
            plates: vehicle
                .plates
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "No plates".to_string()),
            last_service_name: reminder.last_service_name,
            last_service_date: reminder.last_service_date,
            last_odometer: reminder.last_odometer,
            next_service_label: reminder.next_service_label,
            next_service_date: reminder.next_service_date,
            next_service_odometer: reminder.next_service_odometer,
            first_sent: reminder.first_sent,
            second_sent: reminder.second_sent,
            third_sent: reminder.third_sent,
        })
    }

    /// Flags `stage` as sent. Notices go out strictly in order.
    #[instrument(skip(self), fields(reminder_id = %request.reminder_id, stage = request.stage))]
    pub async fn mark_sent(&self, request: MarkSentRequest) -> Result<MarkSentResult, ServiceError> {
        request.validate()?;
        let stage = ReminderStage::try_from(request.stage)?;
        let db = &*self.db;

        let reminder = next_service_reminder::Entity::find_by_id(request.reminder_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load reminder", e))?
            .filter(|r| r.active)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Reminder {} not found", request.reminder_id))
            })?;

        let earlier_missing = match stage {
            ReminderStage::First => None,
            ReminderStage::Second if !reminder.first_sent => Some("the first reminder"),
            ReminderStage::Third if !(reminder.first_sent && reminder.second_sent) => {
                Some("the first and second reminders")
            }
            _ => None,
        };
        if let Some(missing) = earlier_missing {
            warn!(reminder_id = reminder.id, "reminder stage requested out of order");
            return Err(ServiceError::ValidationError(format!(
                "{} cannot be marked before {} have been sent",
                stage.display_name(),
                missing
            )));
        }

        let mut active: next_service_reminder::ActiveModel = reminder.into();
        match stage {
            ReminderStage::First => active.first_sent = Set(true),
            ReminderStage::Second => active.second_sent = Set(true),
            ReminderStage::Third => active.third_sent = Set(true),
        }
        active.modified_at = Set(local_now());
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::db("mark reminder sent", e))?;

        info!(reminder_id = updated.id, stage = stage.number(), "reminder marked as sent");
        Ok(MarkSentResult {
            reminder_id: updated.id,
            stage: stage.display_name().to_string(),
            first_sent: updated.first_sent,
            second_sent: updated.second_sent,
            third_sent: updated.third_sent,
        })
    }

    /// Pending counts per stage within the summary horizon.
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<ReminderSummary, ServiceError> {
        let horizon_date = local_today() + Duration::days(self.settings.summary_horizon_days);
        let mut counts = [0u64; 3];

        for (slot, stage) in counts.iter_mut().zip(ReminderStage::ALL) {
            *slot = next_service_reminder::Entity::find()
                .filter(pending_condition(stage))
                .filter(next_service_reminder::Column::NextServiceDate.lte(horizon_date))
                .count(&*self.db)
                .await
                .map_err(|e| ServiceError::db("count pending reminders", e))?;
        }

        let [first_pending, second_pending, third_pending] = counts;
        Ok(ReminderSummary {
            first_pending,
            second_pending,
            third_pending,
            total: counts.iter().sum(),
            horizon_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn settings() -> ReminderSettings {
        ReminderSettings::default()
    }

    #[rstest]
    #[case((2025, 1, 10), (2025, 7, 10))]
    #[case((2025, 8, 31), (2026, 2, 28))]
    fn next_service_is_six_months_out(#[case] from: (i32, u32, u32), #[case] to: (i32, u32, u32)) {
        let delivered = NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap();
        let (date, km) = next_service_targets(delivered, 45_000, &settings()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap());
        assert_eq!(km, 55_000);
    }

    #[test]
    fn odometer_target_saturates() {
        let delivered = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let (_, km) = next_service_targets(delivered, i32::MAX - 5, &settings()).unwrap();
        assert_eq!(km, i32::MAX);
    }
}

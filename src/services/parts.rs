use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    db::{self, DbPool},
    entities::{appointment, appointment_work_item, order_work_item, purchased_part},
    errors::ServiceError,
    models::{PartOwner, WorkStatus},
    services::local_now,
};

fn validate_unit_cost(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::new(1, 2) {
        Ok(())
    } else {
        Err(ValidationError::new("unit_cost_too_low"))
    }
}

fn validate_sale_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("sale_price_not_positive"))
    }
}

/// A part line as entered by the buyer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewPart {
    #[validate(length(min = 1, max = 200))]
    pub description: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom = "validate_unit_cost")]
    #[schema(value_type = f64, example = 12.5)]
    pub unit_cost: Decimal,
    #[validate(custom = "validate_sale_price")]
    #[schema(value_type = Option<f64>, example = 20.0)]
    pub unit_sale_price: Option<Decimal>,
}

/// Checks a non-empty batch of part lines.
pub(crate) fn validate_parts(parts: &[NewPart]) -> Result<(), ServiceError> {
    if parts.is_empty() {
        return Err(ServiceError::ValidationError(
            "At least one part is required".to_string(),
        ));
    }
    for part in parts {
        part.validate()?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartView {
    pub id: i32,
    pub owner: PartOwner,
    pub description: String,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub unit_cost: Decimal,
    #[schema(value_type = Option<f64>)]
    pub unit_sale_price: Option<Decimal>,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    #[schema(value_type = Option<f64>)]
    pub total_sale: Option<Decimal>,
    #[schema(value_type = String)]
    pub purchased_at: chrono::NaiveDateTime,
    pub transferred: bool,
}

impl PartView {
    pub(crate) fn from_model(part: purchased_part::Model) -> Result<Self, ServiceError> {
        let owner = part.owner().ok_or_else(|| {
            ServiceError::InternalError(format!("Part {} has no single owning work item", part.id))
        })?;
        Ok(Self {
            id: part.id,
            owner,
            total_cost: part.total_cost(),
            total_sale: part.total_sale(),
            description: part.description,
            quantity: part.quantity,
            unit_cost: part.unit_cost,
            unit_sale_price: part.unit_sale_price,
            purchased_at: part.purchased_at,
            transferred: part.transferred,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddPartsRequest {
    #[validate(range(min = 1))]
    pub work_item_id: i32,
    #[serde(default)]
    pub order_scoped: bool,
    pub parts: Vec<NewPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartsAdded {
    pub owner: PartOwner,
    pub parts: Vec<PartView>,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartsReady {
    pub owner: PartOwner,
    pub parts_ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkItemParts {
    pub owner: PartOwner,
    pub description: String,
    pub parts_ready: bool,
    pub part_count: usize,
    pub parts: Vec<PartView>,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    /// Present only when every part has a sale price.
    #[schema(value_type = Option<f64>)]
    pub total_sale: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentParts {
    pub appointment_id: i32,
    pub work_items: Vec<WorkItemParts>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartRemoved {
    pub part_id: i32,
    pub owner: PartOwner,
    pub parts_ready_cleared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalePriceRequest {
    #[schema(value_type = f64, example = 25.0)]
    pub unit_sale_price: Decimal,
}

/// Sum of line totals, plus the sale total when every line is priced.
pub fn aggregate(parts: &[purchased_part::Model]) -> (Decimal, Option<Decimal>) {
    let cost = parts.iter().map(purchased_part::Model::total_cost).sum();
    let sale = parts
        .iter()
        .map(purchased_part::Model::total_sale)
        .sum::<Option<Decimal>>();
    (cost, sale)
}

/// The work item a part can hang off, resolved from its owner.
enum OwningItem {
    Appointment(appointment_work_item::Model),
    Order(order_work_item::Model),
}

impl OwningItem {
    fn description(&self) -> &str {
        match self {
            Self::Appointment(item) => &item.description,
            Self::Order(item) => &item.description,
        }
    }

    fn parts_ready(&self) -> bool {
        match self {
            Self::Appointment(item) => item.parts_ready,
            Self::Order(item) => item.parts_ready,
        }
    }
}

async fn load_owner<C>(conn: &C, owner: PartOwner) -> Result<Option<OwningItem>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(match owner {
        PartOwner::AppointmentScoped(id) => appointment_work_item::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| ServiceError::db("load appointment work item", e))?
            .map(OwningItem::Appointment),
        PartOwner::OrderScoped(id) => order_work_item::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| ServiceError::db("load order work item", e))?
            .map(OwningItem::Order),
    })
}

/// Resolves an owner that may still receive parts: the item is active, an
/// appointment item's appointment is active and an order item is not cancelled.
async fn require_open_owner<C>(conn: &C, owner: PartOwner) -> Result<OwningItem, ServiceError>
where
    C: ConnectionTrait,
{
    let not_found = || ServiceError::NotFound(format!("Work item {} not found", owner.work_item_id()));
    let item = load_owner(conn, owner).await?.ok_or_else(|| not_found())?;

    match &item {
        OwningItem::Appointment(work_item) => {
            if !work_item.active {
                return Err(not_found());
            }
            let parent = appointment::Entity::find_by_id(work_item.appointment_id)
                .one(conn)
                .await
                .map_err(|e| ServiceError::db("load owning appointment", e))?;
            if !parent.map(|a| a.active).unwrap_or(false) {
                return Err(ServiceError::ValidationError(format!(
                    "Appointment {} is no longer active",
                    work_item.appointment_id
                )));
            }
        }
        OwningItem::Order(work_item) => {
            if !work_item.active {
                return Err(not_found());
            }
            if work_item.status == WorkStatus::Cancelled {
                return Err(ServiceError::ValidationError(format!(
                    "Work item {} is cancelled",
                    work_item.id
                )));
            }
        }
    }
    Ok(item)
}

async fn parts_of<C>(conn: &C, owner: PartOwner) -> Result<Vec<purchased_part::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let query = match owner {
        PartOwner::AppointmentScoped(id) => purchased_part::Entity::find()
            .filter(purchased_part::Column::AppointmentWorkItemId.eq(id)),
        PartOwner::OrderScoped(id) => {
            purchased_part::Entity::find().filter(purchased_part::Column::OrderWorkItemId.eq(id))
        }
    };
    query
        .order_by_asc(purchased_part::Column::Id)
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load work item parts", e))
}

async fn set_parts_ready<C>(conn: &C, item: OwningItem, ready: bool) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let updated = match item {
        OwningItem::Appointment(item) => {
            let mut active: appointment_work_item::ActiveModel = item.into();
            active.parts_ready = Set(ready);
            active.update(conn).await.map(|_| ())
        }
        OwningItem::Order(item) => {
            let mut active: order_work_item::ActiveModel = item.into();
            active.parts_ready = Set(ready);
            active.update(conn).await.map(|_| ())
        }
    };
    updated.map_err(|e| ServiceError::db("update parts ready flag", e))
}

/// Inserts part lines against `owner`. Order-scoped inserts refresh the
/// work item's parts total before returning.
pub(crate) async fn insert_parts<C>(
    conn: &C,
    owner: PartOwner,
    parts: Vec<NewPart>,
    transferred: bool,
) -> Result<Vec<purchased_part::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let (appointment_item_id, order_item_id) = owner.columns();
    let now = local_now();
    let mut inserted = Vec::with_capacity(parts.len());

    for part in parts {
        let row = purchased_part::ActiveModel {
            appointment_work_item_id: Set(appointment_item_id),
            order_work_item_id: Set(order_item_id),
            description: Set(part.description),
            quantity: Set(part.quantity),
            unit_cost: Set(part.unit_cost.round_dp(2)),
            unit_sale_price: Set(part.unit_sale_price.map(|p| p.round_dp(2))),
            purchased_at: Set(now),
            transferred: Set(transferred),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| ServiceError::db("insert purchased part", e))?;
        inserted.push(row);
    }

    if owner.is_order_scoped() {
        db::refresh_parts_total(conn, owner.work_item_id()).await?;
    }
    Ok(inserted)
}

/// Parts bought against appointment and order work items.
#[derive(Clone)]
pub struct PartsService {
    db: Arc<DbPool>,
}

impl PartsService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(work_item_id = request.work_item_id, order_scoped = request.order_scoped))]
    pub async fn add_to_work_item(&self, request: AddPartsRequest) -> Result<PartsAdded, ServiceError> {
        request.validate()?;
        validate_parts(&request.parts)?;
        let owner = PartOwner::new(request.work_item_id, request.order_scoped);

        let txn = db::begin(&self.db).await?;
        require_open_owner(&txn, owner).await?;
        let inserted = insert_parts(&txn, owner, request.parts, false).await?;
        db::commit(txn).await?;

        let (total_cost, _) = aggregate(&inserted);
        info!(parts = inserted.len(), %total_cost, "parts added to work item");

        Ok(PartsAdded {
            owner,
            parts: inserted
                .into_iter()
                .map(PartView::from_model)
                .collect::<Result<_, _>>()?,
            total_cost,
        })
    }

    #[instrument(skip(self))]
    pub async fn mark_ready(
        &self,
        work_item_id: i32,
        order_scoped: bool,
    ) -> Result<PartsReady, ServiceError> {
        let owner = PartOwner::new(work_item_id, order_scoped);
        let txn = db::begin(&self.db).await?;
        let item = require_open_owner(&txn, owner).await?;
        set_parts_ready(&txn, item, true).await?;
        db::commit(txn).await?;

        info!("work item parts marked ready");
        Ok(PartsReady {
            owner,
            parts_ready: true,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_for_work_item(
        &self,
        work_item_id: i32,
        order_scoped: bool,
    ) -> Result<WorkItemParts, ServiceError> {
        let db = &*self.db;
        let owner = PartOwner::new(work_item_id, order_scoped);
        let item = load_owner(db, owner)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Work item {} not found", work_item_id)))?;
        let parts = parts_of(db, owner).await?;
        work_item_parts(owner, &item, parts)
    }

    #[instrument(skip(self))]
    pub async fn list_for_appointment(
        &self,
        appointment_id: i32,
    ) -> Result<AppointmentParts, ServiceError> {
        let db = &*self.db;
        appointment::Entity::find_by_id(appointment_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load appointment", e))?
            .filter(|a| a.active)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Appointment {} not found", appointment_id))
            })?;

        let items = appointment_work_item::Entity::find()
            .filter(appointment_work_item::Column::AppointmentId.eq(appointment_id))
            .filter(appointment_work_item::Column::Active.eq(true))
            .order_by_asc(appointment_work_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("load appointment work items", e))?;

        let mut work_items = Vec::with_capacity(items.len());
        for item in items {
            let owner = PartOwner::AppointmentScoped(item.id);
            let parts = parts_of(db, owner).await?;
            work_items.push(work_item_parts(owner, &OwningItem::Appointment(item), parts)?);
        }

        Ok(AppointmentParts {
            appointment_id,
            work_items,
        })
    }

    /// Deletes a part that has not been transferred to an order. Removing the
    /// last part of a work item clears its parts-ready flag.
    #[instrument(skip(self), fields(part_id = %part_id))]
    pub async fn remove(&self, part_id: i32) -> Result<PartRemoved, ServiceError> {
        let txn = db::begin(&self.db).await?;
        let part = self.require_mutable(&txn, part_id).await?;
        let owner = part.owner().ok_or_else(|| {
            ServiceError::InternalError(format!("Part {} has no single owning work item", part_id))
        })?;

        part.delete(&txn)
            .await
            .map_err(|e| ServiceError::db("delete purchased part", e))?;

        let remaining = match owner {
            PartOwner::AppointmentScoped(id) => purchased_part::Entity::find()
                .filter(purchased_part::Column::AppointmentWorkItemId.eq(id)),
            PartOwner::OrderScoped(id) => purchased_part::Entity::find()
                .filter(purchased_part::Column::OrderWorkItemId.eq(id)),
        }
        .count(&txn)
        .await
        .map_err(|e| ServiceError::db("count remaining parts", e))?;

        let mut parts_ready_cleared = false;
        if remaining == 0 {
            if let Some(item) = load_owner(&txn, owner).await? {
                if item.parts_ready() {
                    set_parts_ready(&txn, item, false).await?;
                    parts_ready_cleared = true;
                }
            }
        }
        if owner.is_order_scoped() {
            db::refresh_parts_total(&txn, owner.work_item_id()).await?;
        }

        db::commit(txn).await?;

        info!(remaining, parts_ready_cleared, "purchased part removed");
        Ok(PartRemoved {
            part_id,
            owner,
            parts_ready_cleared,
        })
    }

    #[instrument(skip(self), fields(part_id = %part_id))]
    pub async fn update_sale_price(
        &self,
        part_id: i32,
        request: SalePriceRequest,
    ) -> Result<PartView, ServiceError> {
        if validate_sale_price(&request.unit_sale_price).is_err() {
            return Err(ServiceError::ValidationError(
                "Sale price must be greater than zero".to_string(),
            ));
        }

        let db = &*self.db;
        let part = self.require_mutable(db, part_id).await?;
        let mut active: purchased_part::ActiveModel = part.into();
        active.unit_sale_price = Set(Some(request.unit_sale_price.round_dp(2)));
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::db("update sale price", e))?;

        info!(unit_sale_price = %request.unit_sale_price, "part sale price updated");
        PartView::from_model(updated)
    }

    /// Loads a part that can still be edited or deleted.
    async fn require_mutable<C>(&self, conn: &C, part_id: i32) -> Result<purchased_part::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let part = purchased_part::Entity::find_by_id(part_id)
            .one(conn)
            .await
            .map_err(|e| ServiceError::db("load purchased part", e))?
            .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", part_id)))?;

        if part.transferred {
            warn!(part_id, "attempt to modify a transferred part");
            return Err(ServiceError::Conflict(format!(
                "Part {} has been transferred to an order and can no longer be changed",
                part_id
            )));
        }
        Ok(part)
    }
}

fn work_item_parts(
    owner: PartOwner,
    item: &OwningItem,
    parts: Vec<purchased_part::Model>,
) -> Result<WorkItemParts, ServiceError> {
    let (total_cost, total_sale) = aggregate(&parts);
    Ok(WorkItemParts {
        owner,
        description: item.description().to_string(),
        parts_ready: item.parts_ready(),
        part_count: parts.len(),
        parts: parts
            .into_iter()
            .map(PartView::from_model)
            .collect::<Result<_, _>>()?,
        total_cost,
        total_sale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn row(id: i32, quantity: i32, unit_cost: Decimal, sale: Option<Decimal>) -> purchased_part::Model {
        purchased_part::Model {
            id,
            appointment_work_item_id: None,
            order_work_item_id: Some(7),
            description: format!("Part {}", id),
            quantity,
            unit_cost,
            unit_sale_price: sale,
            purchased_at: NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            transferred: false,
        }
    }

    #[test]
    fn sale_total_only_when_every_line_is_priced() {
        let priced = vec![
            row(1, 2, dec!(10), Some(dec!(15))),
            row(2, 1, dec!(4.50), Some(dec!(6))),
        ];
        assert_eq!(aggregate(&priced), (dec!(24.50), Some(dec!(36))));

        let partly = vec![row(1, 2, dec!(10), Some(dec!(15))), row(2, 1, dec!(4.50), None)];
        assert_eq!(aggregate(&partly), (dec!(24.50), None));
    }

    #[test]
    fn part_lines_are_validated() {
        let ok = NewPart {
            description: "Oil filter".into(),
            quantity: 1,
            unit_cost: dec!(8.75),
            unit_sale_price: Some(dec!(12)),
        };
        assert!(validate_parts(std::slice::from_ref(&ok)).is_ok());

        let free = NewPart {
            unit_cost: dec!(0.01),
            ..ok.clone()
        };
        assert_matches!(validate_parts(&[free]), Err(ServiceError::ValidationError(_)));

        let none_ordered = NewPart {
            quantity: 0,
            ..ok.clone()
        };
        assert_matches!(validate_parts(&[none_ordered]), Err(ServiceError::ValidationError(_)));

        let zero_sale = NewPart {
            unit_sale_price: Some(dec!(0)),
            ..ok
        };
        assert_matches!(validate_parts(&[zero_sale]), Err(ServiceError::ValidationError(_)));

        assert_matches!(validate_parts(&[]), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn views_carry_owner_and_totals() {
        let view = PartView::from_model(row(3, 4, dec!(2.50), None)).unwrap();
        assert_eq!(view.owner, PartOwner::OrderScoped(7));
        assert_eq!(view.total_cost, dec!(10.00));
        assert_eq!(view.total_sale, None);
    }
}

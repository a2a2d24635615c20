use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

use crate::models::OrderStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub order_number: String,
    pub order_type_id: i32,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub service_type_id: Option<i32>,
    pub advisor_id: i32,
    pub odometer: i32,
    pub status: OrderStatus,
    pub promised_delivery_at: DateTime,
    /// Set when the last active work item completes
    pub finished_at: Option<DateTime>,
    pub delivered_at: Option<DateTime>,
    pub advisor_notes: Option<String>,
    pub shop_manager_notes: Option<String>,
    /// Pre-tax total; zero until costs are finalized
    pub cost_total: Decimal,
    pub cost_total_with_tax: Decimal,
    pub total_work_items: i32,
    pub completed_work_items: i32,
    pub progress: Decimal,
    pub has_evidence: bool,
    pub created_at: DateTime,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_work_item::Entity")]
    WorkItems,
    #[sea_orm(has_one = "super::service_checklist::Entity")]
    Checklist,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::order_work_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkItems.def()
    }
}

impl Related<super::service_checklist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checklist.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

fn current<T>(value: &ActiveValue<T>) -> Option<&T>
where
    T: Into<sea_orm::Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let (Some(completed), Some(total)) = (
            current(&self.completed_work_items),
            current(&self.total_work_items),
        ) {
            if completed > total {
                return Err(DbErr::Custom(format!(
                    "completed work items ({}) exceed total ({})",
                    completed, total
                )));
            }
        }
        Ok(self)
    }
}

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::WorkStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_work_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_id: i32,
    pub description: String,
    pub instructions: Option<String>,
    pub technician_id: Option<i32>,
    pub assigned_at: Option<DateTime>,
    pub started_at: Option<DateTime>,
    pub finished_at: Option<DateTime>,
    pub technician_comments: Option<String>,
    pub shop_manager_comments: Option<String>,
    pub parts_ready: bool,
    pub labor_cost: Decimal,
    /// Sum of the item's order-scoped parts; written only by `db::refresh_parts_total`
    pub parts_total: Decimal,
    pub status: WorkStatus,
    pub active: bool,
    pub created_at: DateTime,
}

impl Model {
    /// "Xh Ym" between start and end, when both are known.
    pub fn duration_label(&self) -> Option<String> {
        let (start, end) = (self.started_at?, self.finished_at?);
        let minutes = (end - start).num_minutes().max(0);
        Some(format!("{}h {}m", minutes / 60, minutes % 60))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
    #[sea_orm(
        belongs_to = "super::staff_member::Entity",
        from = "Column::TechnicianId",
        to = "super::staff_member::Column::Id"
    )]
    Technician,
    #[sea_orm(has_many = "super::purchased_part::Entity")]
    PurchasedParts,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl Related<super::staff_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::purchased_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchasedParts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn duration_label_formats_hours_and_minutes() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let item = Model {
            id: 1,
            work_order_id: 1,
            description: "Brake pads".into(),
            instructions: None,
            technician_id: Some(3),
            assigned_at: None,
            started_at: day.and_hms_opt(9, 5, 0),
            finished_at: day.and_hms_opt(11, 50, 0),
            technician_comments: None,
            shop_manager_comments: None,
            parts_ready: false,
            labor_cost: dec!(0),
            parts_total: dec!(0),
            status: WorkStatus::Completed,
            active: true,
            created_at: day.and_hms_opt(8, 0, 0).unwrap(),
        };
        assert_eq!(item.duration_label().as_deref(), Some("2h 45m"));

        let unfinished = Model {
            finished_at: None,
            ..item
        };
        assert_eq!(unfinished.duration_label(), None);
    }
}

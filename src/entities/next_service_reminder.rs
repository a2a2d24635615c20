use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::ReminderStage;

/// One row per vehicle tracking the three notices before its next service.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "next_service_reminders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    #[sea_orm(unique)]
    pub vehicle_id: i32,
    pub last_service_name: String,
    pub next_service_label: String,
    pub last_odometer: i32,
    pub last_service_date: Date,
    pub next_service_date: Date,
    pub next_service_odometer: i32,
    pub first_sent: bool,
    pub second_sent: bool,
    pub third_sent: bool,
    pub active: bool,
    pub modified_at: DateTime,
}

impl Model {
    pub fn is_sent(&self, stage: ReminderStage) -> bool {
        match stage {
            ReminderStage::First => self.first_sent,
            ReminderStage::Second => self.second_sent,
            ReminderStage::Third => self.third_sent,
        }
    }

    /// Whether `stage` is the next notice due: every earlier flag set, this one not.
    pub fn is_pending(&self, stage: ReminderStage) -> bool {
        match stage {
            ReminderStage::First => !self.first_sent,
            ReminderStage::Second => self.first_sent && !self.second_sent,
            ReminderStage::Third => self.first_sent && self.second_sent && !self.third_sent,
        }
    }

    /// Flags only ever progress first, then second, then third.
    pub fn flags_are_monotonic(&self) -> bool {
        (!self.third_sent || self.second_sent) && (!self.second_sent || self.first_sent)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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

impl ActiveModelBehavior for ActiveModel {}

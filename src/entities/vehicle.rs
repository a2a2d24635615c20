use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub trim: Option<String>,
    pub vin: String,
    pub plates: Option<String>,
    pub odometer: Option<i32>,
    pub active: bool,
}

impl Model {
    /// "{make} {model} {year}"
    pub fn short_description(&self) -> String {
        format!("{} {} {}", self.make, self.model, self.year)
    }

    /// "{make} {model} {color} / {year}", as shown on order boards
    pub fn board_description(&self) -> String {
        format!(
            "{} {} {} / {}",
            self.make,
            self.model,
            self.color.as_deref().unwrap_or_default(),
            self.year
        )
    }

    /// "{make} {model} {year} {trim}"
    pub fn full_description(&self) -> String {
        format!(
            "{} {} {} {}",
            self.make,
            self.model,
            self.year,
            self.trim.as_deref().unwrap_or_default()
        )
        .trim_end()
        .to_string()
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
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
